//! Branch Level
//!
//! Coarse 0..=3 level for a branch of the topic graph, derived from the plain
//! average mastery of the listed topics.

use crate::sanitize::clamp01;
use crate::topic_state::LearnerView;
use crate::types::{TopicId, EPSILON};

/// Lower bounds for levels 1, 2 and 3.
pub const BRANCH_BREAKPOINTS: [f64; 3] = [0.2, 0.5, 0.8];

pub fn average_mastery(topic_ids: &[TopicId], view: &LearnerView<'_>) -> f64 {
    if topic_ids.is_empty() {
        return 0.0;
    }
    let sum: f64 = topic_ids.iter().map(|&id| view.score(id)).sum();
    sum / topic_ids.len() as f64
}

pub fn level_for_average(average: f64) -> u8 {
    let average = clamp01(average);
    BRANCH_BREAKPOINTS
        .iter()
        .filter(|&&bound| average + EPSILON >= bound)
        .count() as u8
}

pub fn branch_level(topic_ids: &[TopicId], view: &LearnerView<'_>) -> u8 {
    level_for_average(average_mastery(topic_ids, view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic_state::{LearnerSnapshot, TopicStateConfig};
    use crate::types::MasteryRecord;
    use chrono::Utc;
    use std::collections::HashMap;

    #[test]
    fn test_level_breakpoints() {
        assert_eq!(level_for_average(0.0), 0);
        assert_eq!(level_for_average(0.19), 0);
        assert_eq!(level_for_average(0.2), 1);
        assert_eq!(level_for_average(0.49), 1);
        assert_eq!(level_for_average(0.5), 2);
        assert_eq!(level_for_average(0.79), 2);
        assert_eq!(level_for_average(0.8), 3);
        assert_eq!(level_for_average(1.0), 3);
    }

    #[test]
    fn test_branch_level_from_records() {
        let now = Utc::now();
        let records = [(1, 0.9), (2, 0.8), (3, 0.7)]
            .iter()
            .map(|&(topic_id, score)| MasteryRecord {
                user_id: 1,
                topic_id,
                mastery_score: score,
                last_updated: now,
            })
            .collect();
        let snapshot = LearnerSnapshot::from_records(records, HashMap::new());
        let subjects = HashMap::new();
        let config = TopicStateConfig::default();
        let view = LearnerView::new(&subjects, &snapshot, now, &config);

        assert_eq!(branch_level(&[1, 2, 3], &view), 3);
        // Unseen topic drags the average: (0.9 + 0) / 2
        assert_eq!(branch_level(&[1, 42], &view), 1);
        assert_eq!(branch_level(&[], &view), 0);
    }
}
