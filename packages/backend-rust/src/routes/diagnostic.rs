use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use mathlingo_algo::{TopicId, UserId};
use serde::{Deserialize, Serialize};

use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/branch_level", get(branch_level))
}

#[derive(Debug, Deserialize)]
struct BranchLevelQuery {
    user_id: UserId,
    /// Comma separated; every topic when absent
    topic_ids: Option<String>,
}

#[derive(Debug, Serialize)]
struct BranchLevelResponse {
    user_id: UserId,
    topic_ids: Vec<TopicId>,
    level: u8,
}

async fn branch_level(
    State(state): State<AppState>,
    Query(query): Query<BranchLevelQuery>,
) -> Result<impl IntoResponse, AppError> {
    let topic_ids = match query.topic_ids.as_deref() {
        Some(raw) => parse_topic_ids(raw)?,
        None => state
            .content()
            .list_topics()
            .await?
            .into_iter()
            .map(|overview| overview.topic.id)
            .collect(),
    };

    let level = state
        .engine()
        .calculate_branch_level(query.user_id, &topic_ids)
        .await?;

    Ok(ok(BranchLevelResponse {
        user_id: query.user_id,
        topic_ids,
        level,
    }))
}

fn parse_topic_ids(raw: &str) -> Result<Vec<TopicId>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<TopicId>()
                .map_err(|_| AppError::validation(format!("invalid topic id: {part}")))
        })
        .collect()
}
