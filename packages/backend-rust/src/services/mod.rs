pub mod adaptation;
pub mod certificate;
pub mod content;
pub mod diagnostic;
pub mod progress;

use thiserror::Error;

pub use adaptation::{AdaptationEngine, AttemptOutcome};
pub use content::ContentService;
pub use progress::ProgressSummary;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("sql error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn not_found(what: &str, id: i64) -> Self {
        Self::NotFound(format!("{what} {id} does not exist"))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
