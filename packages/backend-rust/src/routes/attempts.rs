use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};
use axum::routing::post;
use mathlingo_algo::{ExerciseId, UserId};
use serde::Deserialize;

use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_attempt))
}

#[derive(Debug, Deserialize)]
struct AttemptRequest {
    user_id: UserId,
    exercise_id: ExerciseId,
    is_correct: bool,
}

async fn create_attempt(
    State(state): State<AppState>,
    Json(payload): Json<AttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state
        .engine()
        .record_attempt_result(payload.user_id, payload.exercise_id, payload.is_correct)
        .await?;
    Ok((StatusCode::CREATED, ok(outcome)))
}
