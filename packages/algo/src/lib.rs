//! # mathlingo-algo
//!
//! Pure algorithms behind the adaptive learning engine. Nothing here touches
//! storage or the clock; callers pass snapshots and `now` explicitly.
//!
//! ## Modules
//!
//! - [`mastery`] - incremental mastery update per attempt
//! - [`topic_state`] - thresholds, development band, staleness, revalidation
//! - [`graph`] - prerequisite graph, unlock queries, edge validation
//! - [`selection`] - topic ranking and in-topic exercise choice
//! - [`completion`] - weighted subject mastery and certificate eligibility
//! - [`diagnostic`] - branch level
//! - [`sanitize`] - numeric clamping
//! - [`types`] - shared records and constants
//!
//! ## Example
//!
//! ```rust
//! use mathlingo_algo::{update_score, MasteryParams};
//!
//! let params = MasteryParams::default();
//! let update = update_score(0.4, true, 1.0, 2, &params);
//! assert!(update.score > 0.4);
//! ```

pub mod completion;
pub mod config;
pub mod diagnostic;
pub mod graph;
pub mod mastery;
pub mod sanitize;
pub mod selection;
pub mod topic_state;
pub mod types;

pub use types::*;

pub use completion::{
    evaluate_subject, weighted_subject_mastery, CompletionBlocker, CompletionEvaluation,
    TopicCompletion,
};
pub use config::AdaptationConfig;
pub use diagnostic::{average_mastery, branch_level, level_for_average};
pub use graph::{validate_edge, DependencyGraph, GraphError};
pub use mastery::{
    apply_attempt, learning_rate, update_score, CriticalityWeighting, MasteryParams, MasteryUpdate,
};
pub use selection::{pick_exercise, rank_topics, target_difficulty, SelectionConfig, TopicRanking};
pub use topic_state::{LearnerSnapshot, LearnerView, TopicStateConfig, TopicStatus};
