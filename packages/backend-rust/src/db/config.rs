use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/mathlingo.db?mode=rwc";

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub busy_timeout: Duration,
    pub journal_mode: SqliteJournalMode,
    pub synchronous: SqliteSynchronous,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, DbConfigError> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        if !database_url.starts_with("sqlite:") {
            return Err(DbConfigError::Invalid {
                key: "DATABASE_URL",
                value: database_url,
            });
        }

        let journal_mode = match std::env::var("SQLITE_JOURNAL_MODE").ok().as_deref() {
            Some(raw) => parse_journal_mode(raw).ok_or_else(|| DbConfigError::Invalid {
                key: "SQLITE_JOURNAL_MODE",
                value: raw.to_string(),
            })?,
            None => SqliteJournalMode::Wal,
        };

        Ok(Self {
            database_url,
            max_connections: env_u32("DB_MAX_CONNECTIONS", 5).max(1),
            busy_timeout: Duration::from_millis(env_u64("SQLITE_BUSY_TIMEOUT_MS", 30_000)),
            journal_mode,
            synchronous: SqliteSynchronous::Normal,
        })
    }

    /// Configuration for a database file at `path`, used by tests and tools.
    pub fn for_path(path: &std::path::Path) -> Self {
        Self {
            database_url: format!("sqlite:{}?mode=rwc", path.display()),
            max_connections: 5,
            busy_timeout: Duration::from_secs(30),
            journal_mode: SqliteJournalMode::Wal,
            synchronous: SqliteSynchronous::Normal,
        }
    }

    pub fn connect_options(&self) -> Result<SqliteConnectOptions, sqlx::Error> {
        Ok(SqliteConnectOptions::from_str(&self.database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(self.journal_mode)
            .synchronous(self.synchronous)
            .busy_timeout(self.busy_timeout))
    }
}

fn parse_journal_mode(raw: &str) -> Option<SqliteJournalMode> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "wal" => Some(SqliteJournalMode::Wal),
        "delete" => Some(SqliteJournalMode::Delete),
        "truncate" => Some(SqliteJournalMode::Truncate),
        "memory" => Some(SqliteJournalMode::Memory),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum DbConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}
