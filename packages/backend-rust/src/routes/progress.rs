use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use mathlingo_algo::{ModuleId, UserId};
use serde::Deserialize;

use crate::response::{ok, AppError};
use crate::routes::adaptive::UserQuery;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_progress).post(add_progress))
        .route("/summary", get(summary))
}

#[derive(Debug, Deserialize)]
struct ProgressRequest {
    user_id: UserId,
    module_id: ModuleId,
    xp: i64,
}

async fn list_progress(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, AppError> {
    let progress = state.engine().module_progress(query.user_id).await?;
    Ok(ok(progress))
}

async fn add_progress(
    State(state): State<AppState>,
    Json(payload): Json<ProgressRequest>,
) -> Result<impl IntoResponse, AppError> {
    let progress = state
        .engine()
        .add_module_xp(payload.user_id, payload.module_id, payload.xp)
        .await?;
    Ok((StatusCode::CREATED, ok(progress)))
}

async fn summary(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, AppError> {
    let summary = state.engine().progress_summary(query.user_id).await?;
    Ok(ok(summary))
}
