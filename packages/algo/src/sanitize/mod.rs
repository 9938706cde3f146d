//! Data Sanitization
//!
//! Numerical stability utilities shared by every model. Scores, difficulties
//! and criticality values coming from storage are pulled back into their
//! domains here before any arithmetic happens.

use crate::types::{MAX_CRITICALITY, MAX_DIFFICULTY, MIN_CRITICALITY, MIN_DIFFICULTY};

/// Check whether a value is NaN or infinite
pub fn is_invalid(x: f64) -> bool {
    x.is_nan() || x.is_infinite()
}

/// Clamp to `[min, max]`, mapping NaN to `min`
pub fn clamp_finite(x: f64, min: f64, max: f64) -> f64 {
    if x.is_nan() {
        return min;
    }
    x.clamp(min, max)
}

/// Clamp a score or probability to `[0, 1]`
pub fn clamp01(x: f64) -> f64 {
    clamp_finite(x, 0.0, 1.0)
}

/// Clamp an exercise difficulty to `[0.1, 2.0]`
pub fn clamp_difficulty(difficulty: f64) -> f64 {
    clamp_finite(difficulty, MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Clamp a criticality level to the `{1, 2, 3}` buckets
pub fn clamp_criticality(criticality: i32) -> i32 {
    criticality.clamp(MIN_CRITICALITY, MAX_CRITICALITY)
}

/// Check that a configured threshold is a usable unit-interval value
pub fn is_unit_interval(x: f64) -> bool {
    !is_invalid(x) && (0.0..=1.0).contains(&x)
}

/// Check that an exercise difficulty is inside the accepted range
pub fn is_valid_difficulty(x: f64) -> bool {
    !is_invalid(x) && (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&x)
}
