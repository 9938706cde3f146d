//! Property-Based Tests for the Mastery Model and Selection
//!
//! Invariants:
//! - Bounds: every update stays inside [0, 1]
//! - Direction: correct never lowers, incorrect never raises the score
//! - Criticality: a higher criticality never lowers the learning rate
//! - Selection: the picked exercise always belongs to the input slice

use proptest::prelude::*;

use mathlingo_algo::{
    learning_rate, level_for_average, pick_exercise, update_score, CriticalityWeighting, Exercise,
    MasteryParams, SelectionConfig,
};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_score() -> impl Strategy<Value = f64> {
    (0u64..=1000u64).prop_map(|v| v as f64 / 1000.0)
}

fn arb_difficulty() -> impl Strategy<Value = f64> {
    (0.0f64..=3.0f64)
}

fn arb_weighting() -> impl Strategy<Value = CriticalityWeighting> {
    prop_oneof![
        Just(CriticalityWeighting::Logarithmic),
        Just(CriticalityWeighting::Linear),
    ]
}

fn arb_params() -> impl Strategy<Value = MasteryParams> {
    ((0.01f64..=1.0f64), arb_weighting())
        .prop_map(|(base_alpha, weighting)| MasteryParams { base_alpha, weighting })
}

fn arb_exercises() -> impl Strategy<Value = Vec<Exercise>> {
    prop::collection::vec((1i64..500i64, 0.1f64..=2.0f64), 1..20).prop_map(|items| {
        items
            .into_iter()
            .map(|(id, difficulty)| Exercise {
                id,
                topic_id: 1,
                question: format!("q{}", id),
                answer: "a".to_string(),
                difficulty,
            })
            .collect()
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_update_stays_in_unit_interval(
        score in arb_score(),
        correct in any::<bool>(),
        difficulty in arb_difficulty(),
        criticality in -2i32..=6i32,
        params in arb_params(),
    ) {
        let update = update_score(score, correct, difficulty, criticality, &params);
        prop_assert!((0.0..=1.0).contains(&update.score));
    }

    #[test]
    fn prop_correct_never_lowers_incorrect_never_raises(
        score in arb_score(),
        difficulty in arb_difficulty(),
        criticality in 1i32..=3i32,
        params in arb_params(),
    ) {
        let up = update_score(score, true, difficulty, criticality, &params);
        let down = update_score(score, false, difficulty, criticality, &params);
        prop_assert!(up.score >= score);
        prop_assert!(down.score <= score);
    }

    #[test]
    fn prop_criticality_is_monotonic(
        difficulty in arb_difficulty(),
        low in 0i32..=4i32,
        bump in 0i32..=3i32,
        params in arb_params(),
    ) {
        let lr_low = learning_rate(difficulty, low, &params);
        let lr_high = learning_rate(difficulty, low + bump, &params);
        prop_assert!(lr_high >= lr_low);
    }

    #[test]
    fn prop_pick_returns_member(
        exercises in arb_exercises(),
        mastery in arb_score(),
    ) {
        let config = SelectionConfig::default();
        let picked = pick_exercise(&exercises, mastery, &config);
        prop_assert!(picked.is_some());
        let picked = picked.unwrap();
        prop_assert!(exercises.iter().any(|e| e.id == picked.id));
    }

    #[test]
    fn prop_branch_level_is_monotonic(a in arb_score(), b in arb_score()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(level_for_average(lo) <= level_for_average(hi));
        prop_assert!(level_for_average(hi) <= 3);
    }
}
