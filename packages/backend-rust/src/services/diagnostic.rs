use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mathlingo_algo::{branch_level, LearnerView, TopicId, UserId};

use crate::services::{AdaptationEngine, EngineResult};

impl AdaptationEngine {
    pub async fn calculate_branch_level(
        &self,
        user_id: UserId,
        topic_ids: &[TopicId],
    ) -> EngineResult<u8> {
        self.calculate_branch_level_at(user_id, topic_ids, Utc::now())
            .await
    }

    /// Level 0..=3 from the plain average mastery of `topic_ids`.
    pub async fn calculate_branch_level_at(
        &self,
        user_id: UserId,
        topic_ids: &[TopicId],
        now: DateTime<Utc>,
    ) -> EngineResult<u8> {
        self.require_user(user_id).await?;
        if topic_ids.is_empty() {
            return Ok(0);
        }

        let snapshot = self.load_snapshot(user_id, now).await?;
        let subjects = HashMap::new();
        let view = LearnerView::new(
            &subjects,
            &snapshot,
            now,
            &self.config().adaptation.topic_state,
        );
        let level = branch_level(topic_ids, &view);
        tracing::debug!(user_id, topics = topic_ids.len(), level, "branch level");
        Ok(level)
    }
}
