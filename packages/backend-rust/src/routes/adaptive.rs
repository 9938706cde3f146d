use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use mathlingo_algo::{Exercise, ExerciseId, TopicId, UserId};
use serde::{Deserialize, Serialize};

use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/next_exercise", get(next_exercise))
        .route("/ranking", get(ranking))
        .route("/submit", post(submit))
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserQuery {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
struct SubmitRequest {
    user_id: UserId,
    exercise_id: ExerciseId,
    answer: String,
}

/// Exercise as shown to the learner, without the stored answer.
#[derive(Debug, Serialize)]
pub(crate) struct ExerciseDto {
    id: ExerciseId,
    topic_id: TopicId,
    question: String,
    difficulty: f64,
}

impl From<Exercise> for ExerciseDto {
    fn from(exercise: Exercise) -> Self {
        Self {
            id: exercise.id,
            topic_id: exercise.topic_id,
            question: exercise.question,
            difficulty: exercise.difficulty,
        }
    }
}

async fn next_exercise(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, AppError> {
    let exercise = state
        .engine()
        .select_next_exercise(query.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("No exercise available"))?;
    Ok(ok(ExerciseDto::from(exercise)))
}

async fn ranking(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, AppError> {
    let rankings = state.engine().topic_ranking(query.user_id).await?;
    Ok(ok(rankings))
}

async fn submit(
    State(state): State<AppState>,
    Json(payload): Json<SubmitRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state
        .engine()
        .record_attempt(payload.user_id, payload.exercise_id, &payload.answer)
        .await?;
    Ok(ok(outcome))
}
