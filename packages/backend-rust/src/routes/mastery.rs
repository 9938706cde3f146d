use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::response::{ok, AppError};
use crate::routes::adaptive::UserQuery;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(user_mastery))
}

async fn user_mastery(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, AppError> {
    let records = state.engine().user_mastery(query.user_id).await?;
    Ok(ok(records))
}
