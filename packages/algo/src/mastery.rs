//! Mastery Model
//!
//! Incremental skill estimate per (user, topic). Each attempt moves the score
//! toward 1 (correct) or toward 0 (incorrect) by an effective learning rate:
//!
//! ```text
//! lr      = clamp(base_alpha * clamp(difficulty, 0.1, 2.0) * weight(criticality), 0.001, 1.0)
//! correct = old + lr * (1 - old)
//! wrong   = old - lr * old
//! ```
//!
//! Both directions share the same rate, so harder and more critical exercises
//! move the estimate further either way. The score never leaves `[0, 1]`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sanitize::{clamp01, clamp_criticality, clamp_difficulty, clamp_finite};
use crate::types::MasteryRecord;

pub const DEFAULT_BASE_ALPHA: f64 = 0.2;
pub const MIN_LEARNING_RATE: f64 = 0.001;
pub const MAX_LEARNING_RATE: f64 = 1.0;

/// How criticality scales the learning rate. Both policies are monotonically
/// increasing over the clamped `[1, 3]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalityWeighting {
    /// `ln(1 + c)`: 0.69, 1.10, 1.39
    #[default]
    Logarithmic,
    /// `1 + 0.1 * c`: 1.1, 1.2, 1.3
    Linear,
}

impl CriticalityWeighting {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "log" | "log1p" | "logarithmic" => Some(Self::Logarithmic),
            "linear" => Some(Self::Linear),
            _ => None,
        }
    }

    pub fn weight(&self, criticality: i32) -> f64 {
        let c = clamp_criticality(criticality) as f64;
        match self {
            Self::Logarithmic => c.ln_1p(),
            Self::Linear => 1.0 + 0.1 * c,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasteryParams {
    pub base_alpha: f64,
    pub weighting: CriticalityWeighting,
}

impl Default for MasteryParams {
    fn default() -> Self {
        Self {
            base_alpha: DEFAULT_BASE_ALPHA,
            weighting: CriticalityWeighting::default(),
        }
    }
}

/// Outcome of a single mastery update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MasteryUpdate {
    pub previous: f64,
    pub score: f64,
    pub learning_rate: f64,
}

impl MasteryUpdate {
    pub fn delta(&self) -> f64 {
        self.score - self.previous
    }
}

pub fn learning_rate(difficulty: f64, criticality: i32, params: &MasteryParams) -> f64 {
    let raw = params.base_alpha * clamp_difficulty(difficulty) * params.weighting.weight(criticality);
    clamp_finite(raw, MIN_LEARNING_RATE, MAX_LEARNING_RATE)
}

pub fn update_score(
    old_score: f64,
    is_correct: bool,
    difficulty: f64,
    criticality: i32,
    params: &MasteryParams,
) -> MasteryUpdate {
    let previous = clamp01(old_score);
    let lr = learning_rate(difficulty, criticality, params);

    let raw = if is_correct {
        previous + lr * (1.0 - previous)
    } else {
        previous - lr * previous
    };
    let score = clamp01(raw);
    debug_assert!((0.0..=1.0).contains(&score));

    MasteryUpdate {
        previous,
        score,
        learning_rate: lr,
    }
}

/// Apply an attempt to a stored record, stamping it with `now`.
pub fn apply_attempt(
    record: &mut MasteryRecord,
    is_correct: bool,
    difficulty: f64,
    criticality: i32,
    params: &MasteryParams,
    now: DateTime<Utc>,
) -> MasteryUpdate {
    let update = update_score(record.mastery_score, is_correct, difficulty, criticality, params);
    record.mastery_score = update.score;
    record.last_updated = now;
    update
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_learning_rate_logarithmic() {
        let params = MasteryParams::default();
        let lr = learning_rate(1.7, 3, &params);
        assert!(approx(lr, 0.2 * 1.7 * 3f64.ln_1p()));
    }

    #[test]
    fn test_learning_rate_linear() {
        let params = MasteryParams {
            weighting: CriticalityWeighting::Linear,
            ..Default::default()
        };
        let lr = learning_rate(1.0, 2, &params);
        assert!(approx(lr, 0.2 * 1.2));
    }

    #[test]
    fn test_learning_rate_clamps_inputs() {
        let params = MasteryParams::default();
        assert!(approx(learning_rate(0.0, 1, &params), learning_rate(0.1, 1, &params)));
        assert!(approx(learning_rate(9.0, 3, &params), learning_rate(2.0, 3, &params)));
        assert!(approx(learning_rate(1.0, 0, &params), learning_rate(1.0, 1, &params)));
        assert!(approx(learning_rate(1.0, 10, &params), learning_rate(1.0, 3, &params)));
    }

    #[test]
    fn test_learning_rate_bounds() {
        let tiny = MasteryParams {
            base_alpha: 1e-9,
            ..Default::default()
        };
        assert_eq!(learning_rate(0.1, 1, &tiny), MIN_LEARNING_RATE);

        let huge = MasteryParams {
            base_alpha: 50.0,
            ..Default::default()
        };
        assert_eq!(learning_rate(2.0, 3, &huge), MAX_LEARNING_RATE);
    }

    #[test]
    fn test_correct_then_incorrect_sequence() {
        let params = MasteryParams::default();
        let lr = learning_rate(1.7, 3, &params);

        let first = update_score(0.0, true, 1.7, 3, &params);
        assert!(approx(first.score, lr));

        let second = update_score(first.score, false, 1.7, 3, &params);
        assert!(approx(second.score, lr - lr * lr));
        assert!(second.delta() < 0.0);
    }

    #[test]
    fn test_weighting_is_monotonic() {
        for weighting in [CriticalityWeighting::Logarithmic, CriticalityWeighting::Linear] {
            let w1 = weighting.weight(1);
            let w2 = weighting.weight(2);
            let w3 = weighting.weight(3);
            assert!(w1 < w2 && w2 < w3);
        }
    }

    #[test]
    fn test_nan_score_is_sanitized() {
        let params = MasteryParams::default();
        let update = update_score(f64::NAN, true, 1.0, 1, &params);
        assert!(update.score > 0.0 && update.score <= 1.0);
        assert_eq!(update.previous, 0.0);
    }

    #[test]
    fn test_apply_attempt_stamps_record() {
        let params = MasteryParams::default();
        let created = Utc::now() - chrono::Duration::days(3);
        let mut record = MasteryRecord::new(1, 2, created);
        let now = Utc::now();

        let update = apply_attempt(&mut record, true, 1.0, 2, &params, now);
        assert_eq!(record.mastery_score, update.score);
        assert_eq!(record.last_updated, now);
        assert!(record.mastery_score > 0.0);
    }

    #[test]
    fn test_weighting_parse() {
        assert_eq!(CriticalityWeighting::parse("log1p"), Some(CriticalityWeighting::Logarithmic));
        assert_eq!(CriticalityWeighting::parse("Linear"), Some(CriticalityWeighting::Linear));
        assert_eq!(CriticalityWeighting::parse("cubic"), None);
    }
}
