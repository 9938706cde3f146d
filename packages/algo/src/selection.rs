//! Exercise Selection
//!
//! Two stages:
//!
//! 1. Rank unlocked topics. Topics needing reinforcement (in development, or
//!    stale and not revalidated) take over the candidate set whenever any
//!    exist. Candidates sort incomplete-first, then by descending urgency,
//!    then by topic id.
//! 2. Inside a topic pick the exercise closest to `mastery + 0.15`, biased
//!    toward easier items for weak learners and harder items for strong ones.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::graph::DependencyGraph;
use crate::sanitize::{clamp01, clamp_criticality, clamp_difficulty};
use crate::topic_state::{LearnerView, TopicStatus};
use crate::types::{Exercise, Topic, TopicId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub review_weight: f64,
    pub review_horizon_days: f64,
    pub target_offset: f64,
    /// Below this mastery, prefer exercises not harder than the target
    pub low_mastery: f64,
    /// Above this mastery, prefer exercises not easier than the target
    pub high_mastery: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            review_weight: 0.5,
            review_horizon_days: 7.0,
            target_offset: 0.15,
            low_mastery: 0.3,
            high_mastery: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRanking {
    pub topic_id: TopicId,
    pub score: f64,
    pub threshold: f64,
    pub urgency: f64,
    pub review_priority: f64,
    pub mandatory: bool,
    pub completed: bool,
    pub status: TopicStatus,
}

/// Decay-weighted review pressure. Unseen topics count as fully elapsed.
pub fn review_priority(score: f64, days_since_seen: Option<i64>, config: &SelectionConfig) -> f64 {
    let elapsed = match days_since_seen {
        Some(days) if config.review_horizon_days > 0.0 => {
            1.0 - (-(days.max(0) as f64) / config.review_horizon_days).exp()
        }
        Some(_) => 1.0,
        None => 1.0,
    };
    (1.0 - clamp01(score)) * elapsed
}

pub fn urgency(
    score: f64,
    threshold: f64,
    criticality: i32,
    review_priority: f64,
    config: &SelectionConfig,
) -> f64 {
    let gap = (threshold - clamp01(score)).max(0.0);
    gap * clamp_criticality(criticality) as f64 + config.review_weight * review_priority
}

fn compare_rankings(a: &TopicRanking, b: &TopicRanking) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| b.urgency.total_cmp(&a.urgency))
        .then_with(|| a.topic_id.cmp(&b.topic_id))
}

/// Candidate topics in serving order. Empty only when `topics` is empty.
pub fn rank_topics(
    topics: &[Topic],
    graph: &DependencyGraph,
    view: &LearnerView<'_>,
    config: &SelectionConfig,
) -> Vec<TopicRanking> {
    let by_id: HashMap<TopicId, &Topic> = topics.iter().map(|t| (t.id, t)).collect();

    let mut unlocked = graph.unlocked_topics(topics, |prereq| {
        by_id
            .get(&prereq)
            .map(|t| view.is_ready_for_unlock(t))
            .unwrap_or(false)
    });
    if unlocked.is_empty() {
        unlocked = topics.iter().collect();
    }

    let mandatory: Vec<&Topic> = unlocked
        .iter()
        .copied()
        .filter(|t| view.needs_reinforcement(t))
        .collect();
    let has_mandatory = !mandatory.is_empty();
    let candidates = if has_mandatory { mandatory } else { unlocked };

    let mut rankings: Vec<TopicRanking> = candidates
        .into_iter()
        .map(|topic| {
            let score = view.score(topic.id);
            let threshold = view.threshold_for(topic);
            let review = review_priority(score, view.days_since_seen(topic.id), config);
            TopicRanking {
                topic_id: topic.id,
                score,
                threshold,
                urgency: urgency(score, threshold, topic.criticality_level, review, config),
                review_priority: review,
                mandatory: has_mandatory,
                completed: view.is_completed(topic.id),
                status: view.status(topic),
            }
        })
        .collect();

    rankings.sort_by(compare_rankings);
    rankings
}

pub fn target_difficulty(mastery: f64, config: &SelectionConfig) -> f64 {
    clamp_difficulty(clamp01(mastery) + config.target_offset)
}

/// Best exercise for the given mastery, `None` when the slice is empty.
pub fn pick_exercise<'e>(
    exercises: &'e [Exercise],
    mastery: f64,
    config: &SelectionConfig,
) -> Option<&'e Exercise> {
    let mastery = clamp01(mastery);
    let target = target_difficulty(mastery, config);
    let distance = |e: &Exercise| (e.difficulty - target).abs();

    // Lower side key sorts first; `false` < `true`.
    let side = |e: &Exercise| -> bool {
        if mastery < config.low_mastery {
            e.difficulty > target
        } else if mastery > config.high_mastery {
            e.difficulty < target
        } else {
            false
        }
    };

    exercises.iter().min_by(|a, b| {
        side(a)
            .cmp(&side(b))
            .then_with(|| distance(a).total_cmp(&distance(b)))
            .then_with(|| a.id.cmp(&b.id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic_state::{LearnerSnapshot, TopicStateConfig};
    use crate::types::{MasteryRecord, Subject, SubjectId, TopicDependency};
    use chrono::{Duration, Utc};

    fn topic(id: TopicId, criticality: i32) -> Topic {
        Topic {
            id,
            subject_id: 1,
            module_id: 1,
            name: format!("T{}", id),
            description: None,
            difficulty_level: 1.0,
            criticality_level: criticality,
        }
    }

    fn exercise(id: i64, topic_id: TopicId, difficulty: f64) -> Exercise {
        Exercise {
            id,
            topic_id,
            question: format!("Q{}", id),
            answer: "a".to_string(),
            difficulty,
        }
    }

    fn subjects() -> HashMap<SubjectId, Subject> {
        let mut map = HashMap::new();
        map.insert(1, Subject::with_defaults(1, "Math"));
        map
    }

    fn snapshot(entries: &[(TopicId, f64, i64)]) -> LearnerSnapshot {
        let now = Utc::now();
        let records = entries
            .iter()
            .map(|&(topic_id, score, age)| MasteryRecord {
                user_id: 1,
                topic_id,
                mastery_score: score,
                last_updated: now - Duration::days(age),
            })
            .collect();
        LearnerSnapshot::from_records(records, HashMap::new())
    }

    #[test]
    fn test_target_difficulty_clamps() {
        let config = SelectionConfig::default();
        assert!((target_difficulty(0.4, &config) - 0.55).abs() < 1e-12);
        assert!((target_difficulty(0.0, &config) - 0.15).abs() < 1e-12);
        assert!((target_difficulty(1.0, &config) - 1.15).abs() < 1e-12);
    }

    #[test]
    fn test_pick_exercise_bands() {
        let config = SelectionConfig::default();
        let pool = vec![
            exercise(1, 1, 0.3),
            exercise(2, 1, 0.55),
            exercise(3, 1, 1.1),
        ];
        assert_eq!(pick_exercise(&pool, 0.4, &config).map(|e| e.id), Some(2));

        // target 0.25: 0.3 is closer but harder
        let weak = vec![exercise(1, 1, 0.1), exercise(2, 1, 0.3)];
        assert_eq!(pick_exercise(&weak, 0.1, &config).map(|e| e.id), Some(1));

        // target 0.95: 0.9 is closer but easier.
        let strong = vec![exercise(1, 1, 0.9), exercise(2, 1, 1.3)];
        assert_eq!(pick_exercise(&strong, 0.8, &config).map(|e| e.id), Some(2));

        assert!(pick_exercise(&[], 0.5, &config).is_none());
    }

    #[test]
    fn test_pick_exercise_ties_by_id() {
        let config = SelectionConfig::default();
        let pool = vec![exercise(7, 1, 0.5), exercise(3, 1, 0.5)];
        assert_eq!(pick_exercise(&pool, 0.4, &config).map(|e| e.id), Some(3));
    }

    #[test]
    fn test_rank_prefers_incomplete_dependent() {
        let topics = vec![topic(1, 1), topic(2, 3)];
        let edges = vec![TopicDependency {
            topic_id: 2,
            depends_on_id: 1,
        }];
        let graph = DependencyGraph::from_edges(&topics, &edges);
        let subjects = subjects();
        let snap = snapshot(&[(1, 0.9, 1), (2, 0.4, 1)]);
        let config = TopicStateConfig::default();
        let view = LearnerView::new(&subjects, &snap, Utc::now(), &config);

        let rankings = rank_topics(&topics, &graph, &view, &SelectionConfig::default());
        assert_eq!(rankings.first().map(|r| r.topic_id), Some(2));
        assert!(rankings.iter().any(|r| r.topic_id == 1 && r.completed));
    }

    #[test]
    fn test_rank_locked_dependent_is_excluded() {
        let topics = vec![topic(1, 1), topic(2, 1)];
        let edges = vec![TopicDependency {
            topic_id: 2,
            depends_on_id: 1,
        }];
        let graph = DependencyGraph::from_edges(&topics, &edges);
        let subjects = subjects();
        let snap = snapshot(&[(1, 0.2, 1)]);
        let config = TopicStateConfig::default();
        let view = LearnerView::new(&subjects, &snap, Utc::now(), &config);

        let ids: Vec<_> = rank_topics(&topics, &graph, &view, &SelectionConfig::default())
            .into_iter()
            .map(|r| r.topic_id)
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_mandatory_reinforcement_takes_over() {
        let topics = vec![topic(1, 1), topic(2, 1)];
        let graph = DependencyGraph::from_edges(&topics, &[]);
        let subjects = subjects();
        let snap = snapshot(&[(1, 0.55, 1), (2, 0.1, 1)]);
        let config = TopicStateConfig::default();
        let view = LearnerView::new(&subjects, &snap, Utc::now(), &config);

        let rankings = rank_topics(&topics, &graph, &view, &SelectionConfig::default());
        assert_eq!(rankings.len(), 1);
        assert_eq!(rankings[0].topic_id, 1);
        assert!(rankings[0].mandatory);
    }

    #[test]
    fn test_all_locked_falls_back_to_every_topic() {
        let topics = vec![topic(1, 1), topic(2, 1)];
        let edges = vec![
            TopicDependency {
                topic_id: 1,
                depends_on_id: 99,
            },
            TopicDependency {
                topic_id: 2,
                depends_on_id: 99,
            },
        ];
        let graph = DependencyGraph::from_edges(&topics, &edges);
        let subjects = subjects();
        let snap = LearnerSnapshot::default();
        let config = TopicStateConfig::default();
        let view = LearnerView::new(&subjects, &snap, Utc::now(), &config);

        let rankings = rank_topics(&topics, &graph, &view, &SelectionConfig::default());
        assert_eq!(rankings.len(), 2);
    }

    #[test]
    fn test_review_priority_decays_with_recency() {
        let config = SelectionConfig::default();
        let fresh = review_priority(0.5, Some(0), &config);
        let week = review_priority(0.5, Some(7), &config);
        let never = review_priority(0.5, None, &config);
        assert_eq!(fresh, 0.0);
        assert!(week > fresh && week < never);
        assert!((never - 0.5).abs() < 1e-12);
    }
}
