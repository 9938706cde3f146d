//! Common Types and Constants
//!
//! Shared data structures used across all algorithm modules. Records carry
//! plain foreign-key ids; joins happen explicitly in the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==================== Identifiers ====================

pub type UserId = i64;
pub type SubjectId = i64;
pub type ModuleId = i64;
pub type TopicId = i64;
pub type ExerciseId = i64;
pub type CertificateId = i64;

// ==================== Constants ====================

/// Lowest difficulty an exercise may carry
pub const MIN_DIFFICULTY: f64 = 0.1;

/// Highest difficulty an exercise may carry
pub const MAX_DIFFICULTY: f64 = 2.0;

/// Criticality bucket bounds
pub const MIN_CRITICALITY: i32 = 1;
pub const MAX_CRITICALITY: i32 = 3;

/// Subject defaults used when a subject row does not override them
pub const DEFAULT_THRESHOLD_C1: f64 = 0.65;
pub const DEFAULT_THRESHOLD_C2: f64 = 0.75;
pub const DEFAULT_THRESHOLD_C3: f64 = 0.85;
pub const DEFAULT_CERTIFICATE_THRESHOLD: f64 = 0.80;

/// Numerical tolerance for breakpoint comparisons
pub const EPSILON: f64 = 1e-9;

// ==================== Content ====================

/// Top-level subject (Math, Physics, ...) with per-criticality thresholds.
///
/// Thresholds are expected to grow with criticality but nothing enforces it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub description: Option<String>,
    pub threshold_c1: f64,
    pub threshold_c2: f64,
    pub threshold_c3: f64,
    pub certificate_threshold: f64,
}

impl Subject {
    /// Subject with the default threshold ladder.
    pub fn with_defaults(id: SubjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            threshold_c1: DEFAULT_THRESHOLD_C1,
            threshold_c2: DEFAULT_THRESHOLD_C2,
            threshold_c3: DEFAULT_THRESHOLD_C3,
            certificate_threshold: DEFAULT_CERTIFICATE_THRESHOLD,
        }
    }
}

/// Informational grouping of topics inside a subject.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub subject_id: SubjectId,
    pub name: String,
    pub position: i32,
}

/// Knowledge-graph node. Belongs to exactly one subject.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub subject_id: SubjectId,
    pub module_id: ModuleId,
    pub name: String,
    pub description: Option<String>,
    /// Informational only; selection works on exercise difficulty.
    pub difficulty_level: f64,
    pub criticality_level: i32,
}

/// Directed edge `topic_id -> depends_on_id` (topic requires depends_on).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicDependency {
    pub topic_id: TopicId,
    pub depends_on_id: TopicId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub topic_id: TopicId,
    pub question: String,
    pub answer: String,
    pub difficulty: f64,
}

// ==================== Learner state ====================

/// Per (user, topic) mastery estimate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MasteryRecord {
    pub user_id: UserId,
    pub topic_id: TopicId,
    pub mastery_score: f64,
    pub last_updated: DateTime<Utc>,
}

impl MasteryRecord {
    /// Fresh record as created on the first attempt for a topic.
    pub fn new(user_id: UserId, topic_id: TopicId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            topic_id,
            mastery_score: 0.0,
            last_updated: now,
        }
    }
}

/// Immutable attempt log entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub user_id: UserId,
    pub exercise_id: ExerciseId,
    pub is_correct: bool,
    pub created_at: DateTime<Utc>,
}

// ==================== Certificates ====================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    Valid,
    Revoked,
    Expired,
}

impl CertificateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateStatus::Valid => "valid",
            CertificateStatus::Revoked => "revoked",
            CertificateStatus::Expired => "expired",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "valid" => Some(CertificateStatus::Valid),
            "revoked" => Some(CertificateStatus::Revoked),
            "expired" => Some(CertificateStatus::Expired),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: CertificateId,
    pub user_id: UserId,
    pub subject_id: SubjectId,
    pub avg_mastery: f64,
    pub verification_hash: String,
    pub status: CertificateStatus,
    pub issued_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certificate_status_round_trips_through_text() {
        for status in [
            CertificateStatus::Valid,
            CertificateStatus::Revoked,
            CertificateStatus::Expired,
        ] {
            assert_eq!(CertificateStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(CertificateStatus::parse(" VALID "), Some(CertificateStatus::Valid));
        assert_eq!(CertificateStatus::parse("pending"), None);
    }

    #[test]
    fn subject_defaults_follow_the_threshold_ladder() {
        let subject = Subject::with_defaults(1, "Math");
        assert!(subject.threshold_c1 < subject.threshold_c2);
        assert!(subject.threshold_c2 < subject.threshold_c3);
        assert_eq!(subject.certificate_threshold, DEFAULT_CERTIFICATE_THRESHOLD);
    }
}
