use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use mathlingo_algo::TopicDependency;

use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_topics))
        .route("/dependencies", post(add_dependency))
}

async fn list_topics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let topics = state.content().list_topics().await?;
    Ok(ok(topics))
}

async fn add_dependency(
    State(state): State<AppState>,
    Json(edge): Json<TopicDependency>,
) -> Result<impl IntoResponse, AppError> {
    state.content().add_dependency(edge).await?;
    Ok((StatusCode::CREATED, ok(edge)))
}
