//! Engine-wide algorithm configuration.

use serde::{Deserialize, Serialize};

use crate::mastery::MasteryParams;
use crate::sanitize::is_invalid;
use crate::selection::SelectionConfig;
use crate::topic_state::TopicStateConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdaptationConfig {
    pub mastery: MasteryParams,
    pub topic_state: TopicStateConfig,
    pub selection: SelectionConfig,
}

impl AdaptationConfig {
    /// Returns the first problem found, if any.
    pub fn validate(&self) -> Result<(), String> {
        if is_invalid(self.mastery.base_alpha) || self.mastery.base_alpha <= 0.0 {
            return Err(format!(
                "base_alpha must be positive, got {}",
                self.mastery.base_alpha
            ));
        }
        if self.topic_state.inactivity_days < 0 {
            return Err("inactivity_days must not be negative".to_string());
        }
        if self.topic_state.revalidation_window_days < 0 {
            return Err("revalidation_window_days must not be negative".to_string());
        }
        if is_invalid(self.selection.review_horizon_days) || self.selection.review_horizon_days <= 0.0
        {
            return Err("review_horizon_days must be positive".to_string());
        }
        Ok(())
    }
}
