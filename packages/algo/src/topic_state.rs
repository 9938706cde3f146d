//! Topic State Evaluator
//!
//! Pure predicates over a topic, the learner's mastery record for it and the
//! owning subject's thresholds:
//!
//! - dominated: score reached the subject threshold for the topic's criticality
//! - in development: `0.5 <= score < threshold`, reinforcement is mandatory
//! - inactive: no update for more than 90 days
//! - revalidated: at least 3 correct attempts in the last 30 days
//! - ready for unlock: dominated, not in development, and fresh or revalidated

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::sanitize::{clamp01, clamp_criticality};
use crate::types::{
    MasteryRecord, Subject, SubjectId, Topic, TopicId, DEFAULT_THRESHOLD_C1, DEFAULT_THRESHOLD_C2,
    DEFAULT_THRESHOLD_C3,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicStateConfig {
    /// Lower bound of the in-development band, independent of subject
    pub development_floor: f64,
    /// Fixed completion mark used for ranking tie-breaks
    pub completion_threshold: f64,
    pub inactivity_days: i64,
    pub revalidation_window_days: i64,
    pub revalidation_min_correct: u32,
}

impl Default for TopicStateConfig {
    fn default() -> Self {
        Self {
            development_floor: 0.5,
            completion_threshold: 0.8,
            inactivity_days: 90,
            revalidation_window_days: 30,
            revalidation_min_correct: 3,
        }
    }
}

/// Coarse per-topic status for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicStatus {
    NotStarted,
    Learning,
    InDevelopment,
    Dominated,
    Stale,
}

pub fn threshold(subject: &Subject, criticality: i32) -> f64 {
    if criticality >= 3 {
        subject.threshold_c3
    } else if criticality == 2 {
        subject.threshold_c2
    } else {
        subject.threshold_c1
    }
}

fn default_threshold(criticality: i32) -> f64 {
    match clamp_criticality(criticality) {
        3 => DEFAULT_THRESHOLD_C3,
        2 => DEFAULT_THRESHOLD_C2,
        _ => DEFAULT_THRESHOLD_C1,
    }
}

pub fn is_dominated(score: f64, threshold: f64) -> bool {
    score >= threshold
}

pub fn is_in_development(score: f64, threshold: f64, config: &TopicStateConfig) -> bool {
    score >= config.development_floor && score < threshold
}

pub fn is_completed(score: f64, config: &TopicStateConfig) -> bool {
    score >= config.completion_threshold
}

pub fn days_since(last_updated: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - last_updated).num_days()
}

pub fn is_inactive(record: &MasteryRecord, now: DateTime<Utc>, config: &TopicStateConfig) -> bool {
    days_since(record.last_updated, now) > config.inactivity_days
}

/// Start of the window in which correct attempts count toward revalidation.
pub fn revalidation_since(now: DateTime<Utc>, config: &TopicStateConfig) -> DateTime<Utc> {
    now - Duration::days(config.revalidation_window_days)
}

pub fn has_passed_revalidation(recent_correct: u32, config: &TopicStateConfig) -> bool {
    recent_correct >= config.revalidation_min_correct
}

pub fn is_ready_for_unlock(
    record: Option<&MasteryRecord>,
    threshold: f64,
    recent_correct: u32,
    now: DateTime<Utc>,
    config: &TopicStateConfig,
) -> bool {
    let Some(record) = record else {
        return false;
    };
    let score = clamp01(record.mastery_score);
    is_dominated(score, threshold)
        && !is_in_development(score, threshold, config)
        && (!is_inactive(record, now, config) || has_passed_revalidation(recent_correct, config))
}

/// Stale and not yet re-demonstrated. Only meaningful when a record exists.
pub fn needs_revalidation(
    record: Option<&MasteryRecord>,
    recent_correct: u32,
    now: DateTime<Utc>,
    config: &TopicStateConfig,
) -> bool {
    match record {
        Some(record) => {
            is_inactive(record, now, config) && !has_passed_revalidation(recent_correct, config)
        }
        None => false,
    }
}

pub fn classify(
    record: Option<&MasteryRecord>,
    threshold: f64,
    recent_correct: u32,
    now: DateTime<Utc>,
    config: &TopicStateConfig,
) -> TopicStatus {
    let Some(rec) = record else {
        return TopicStatus::NotStarted;
    };
    if needs_revalidation(record, recent_correct, now, config) {
        return TopicStatus::Stale;
    }
    let score = clamp01(rec.mastery_score);
    if is_dominated(score, threshold) {
        TopicStatus::Dominated
    } else if is_in_development(score, threshold, config) {
        TopicStatus::InDevelopment
    } else {
        TopicStatus::Learning
    }
}

// ==================== Learner snapshot ====================

/// Everything about one learner the engine reads per request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearnerSnapshot {
    pub mastery: HashMap<TopicId, MasteryRecord>,
    /// Correct attempts per topic inside the revalidation window
    pub recent_correct: HashMap<TopicId, u32>,
}

impl LearnerSnapshot {
    pub fn from_records(records: Vec<MasteryRecord>, recent_correct: HashMap<TopicId, u32>) -> Self {
        Self {
            mastery: records.into_iter().map(|r| (r.topic_id, r)).collect(),
            recent_correct,
        }
    }

    pub fn mastery_map(&self) -> HashMap<TopicId, f64> {
        self.mastery
            .iter()
            .map(|(id, record)| (*id, clamp01(record.mastery_score)))
            .collect()
    }
}

/// Binds a snapshot to subjects, a clock and config so callers can ask
/// per-topic questions without threading every argument through.
pub struct LearnerView<'a> {
    subjects: &'a HashMap<SubjectId, Subject>,
    snapshot: &'a LearnerSnapshot,
    now: DateTime<Utc>,
    config: &'a TopicStateConfig,
}

impl<'a> LearnerView<'a> {
    pub fn new(
        subjects: &'a HashMap<SubjectId, Subject>,
        snapshot: &'a LearnerSnapshot,
        now: DateTime<Utc>,
        config: &'a TopicStateConfig,
    ) -> Self {
        Self {
            subjects,
            snapshot,
            now,
            config,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn config(&self) -> &TopicStateConfig {
        self.config
    }

    pub fn record(&self, topic_id: TopicId) -> Option<&MasteryRecord> {
        self.snapshot.mastery.get(&topic_id)
    }

    /// Mastery score, 0 when the learner never attempted the topic.
    pub fn score(&self, topic_id: TopicId) -> f64 {
        self.record(topic_id)
            .map(|r| clamp01(r.mastery_score))
            .unwrap_or(0.0)
    }

    pub fn recent_correct(&self, topic_id: TopicId) -> u32 {
        self.snapshot
            .recent_correct
            .get(&topic_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn threshold_for(&self, topic: &Topic) -> f64 {
        match self.subjects.get(&topic.subject_id) {
            Some(subject) => threshold(subject, topic.criticality_level),
            None => default_threshold(topic.criticality_level),
        }
    }

    pub fn days_since_seen(&self, topic_id: TopicId) -> Option<i64> {
        self.record(topic_id)
            .map(|r| days_since(r.last_updated, self.now).max(0))
    }

    pub fn is_inactive(&self, topic_id: TopicId) -> bool {
        self.record(topic_id)
            .map(|r| is_inactive(r, self.now, self.config))
            .unwrap_or(false)
    }

    pub fn is_ready_for_unlock(&self, topic: &Topic) -> bool {
        is_ready_for_unlock(
            self.record(topic.id),
            self.threshold_for(topic),
            self.recent_correct(topic.id),
            self.now,
            self.config,
        )
    }

    /// In development, or stale without revalidation.
    pub fn needs_reinforcement(&self, topic: &Topic) -> bool {
        let score = self.score(topic.id);
        is_in_development(score, self.threshold_for(topic), self.config)
            || needs_revalidation(
                self.record(topic.id),
                self.recent_correct(topic.id),
                self.now,
                self.config,
            )
    }

    pub fn is_completed(&self, topic_id: TopicId) -> bool {
        is_completed(self.score(topic_id), self.config)
    }

    pub fn status(&self, topic: &Topic) -> TopicStatus {
        classify(
            self.record(topic.id),
            self.threshold_for(topic),
            self.recent_correct(topic.id),
            self.now,
            self.config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> Subject {
        Subject {
            id: 1,
            name: "Math".to_string(),
            description: None,
            threshold_c1: 0.6,
            threshold_c2: 0.7,
            threshold_c3: 0.9,
            certificate_threshold: 0.8,
        }
    }

    fn record(score: f64, age_days: i64, now: DateTime<Utc>) -> MasteryRecord {
        MasteryRecord {
            user_id: 1,
            topic_id: 10,
            mastery_score: score,
            last_updated: now - Duration::days(age_days),
        }
    }

    #[test]
    fn test_threshold_per_criticality() {
        let s = subject();
        assert_eq!(threshold(&s, 1), 0.6);
        assert_eq!(threshold(&s, 2), 0.7);
        assert_eq!(threshold(&s, 3), 0.9);
        assert_eq!(threshold(&s, 5), 0.9);
        assert_eq!(threshold(&s, 0), 0.6);
    }

    #[test]
    fn test_development_band() {
        let config = TopicStateConfig::default();
        assert!(!is_in_development(0.49, 0.75, &config));
        assert!(is_in_development(0.5, 0.75, &config));
        assert!(is_in_development(0.74, 0.75, &config));
        assert!(!is_in_development(0.75, 0.75, &config));
    }

    #[test]
    fn test_inactivity_boundary() {
        let config = TopicStateConfig::default();
        let now = Utc::now();
        assert!(!is_inactive(&record(0.9, 90, now), now, &config));
        assert!(is_inactive(&record(0.9, 91, now), now, &config));
    }

    #[test]
    fn test_ready_for_unlock_requires_record() {
        let config = TopicStateConfig::default();
        let now = Utc::now();
        assert!(!is_ready_for_unlock(None, 0.6, 10, now, &config));
    }

    #[test]
    fn test_ready_for_unlock_fresh_dominated() {
        let config = TopicStateConfig::default();
        let now = Utc::now();
        let rec = record(0.8, 1, now);
        assert!(is_ready_for_unlock(Some(&rec), 0.7, 0, now, &config));
        assert!(!is_ready_for_unlock(Some(&rec), 0.85, 0, now, &config));
    }

    #[test]
    fn test_stale_needs_revalidation() {
        let config = TopicStateConfig::default();
        let now = Utc::now();
        let rec = record(0.95, 95, now);
        assert!(!is_ready_for_unlock(Some(&rec), 0.75, 2, now, &config));
        assert!(is_ready_for_unlock(Some(&rec), 0.75, 3, now, &config));
        assert!(needs_revalidation(Some(&rec), 0, now, &config));
        assert!(!needs_revalidation(Some(&rec), 3, now, &config));
        assert!(!needs_revalidation(None, 0, now, &config));
    }

    #[test]
    fn test_classify() {
        let config = TopicStateConfig::default();
        let now = Utc::now();
        assert_eq!(classify(None, 0.7, 0, now, &config), TopicStatus::NotStarted);
        assert_eq!(
            classify(Some(&record(0.3, 1, now)), 0.7, 0, now, &config),
            TopicStatus::Learning
        );
        assert_eq!(
            classify(Some(&record(0.6, 1, now)), 0.7, 0, now, &config),
            TopicStatus::InDevelopment
        );
        assert_eq!(
            classify(Some(&record(0.8, 1, now)), 0.7, 0, now, &config),
            TopicStatus::Dominated
        );
        assert_eq!(
            classify(Some(&record(0.8, 120, now)), 0.7, 0, now, &config),
            TopicStatus::Stale
        );
    }

    #[test]
    fn test_view_falls_back_to_default_thresholds() {
        let subjects = HashMap::new();
        let snapshot = LearnerSnapshot::default();
        let config = TopicStateConfig::default();
        let view = LearnerView::new(&subjects, &snapshot, Utc::now(), &config);
        let topic = Topic {
            id: 1,
            subject_id: 99,
            module_id: 1,
            name: "Orphan".to_string(),
            description: None,
            difficulty_level: 0.5,
            criticality_level: 3,
        };
        assert_eq!(view.threshold_for(&topic), DEFAULT_THRESHOLD_C3);
        assert_eq!(view.score(topic.id), 0.0);
        assert!(!view.is_ready_for_unlock(&topic));
        assert_eq!(view.status(&topic), TopicStatus::NotStarted);
    }
}
