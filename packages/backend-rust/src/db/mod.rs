pub mod config;
pub mod operations;
pub mod schema;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::config::{DbConfig, DbConfigError};

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct DatabaseProxy {
    config: DbConfig,
    pool: SqlitePool,
}

impl DatabaseProxy {
    pub async fn from_env() -> Result<Arc<Self>, DbInitError> {
        let config = DbConfig::from_env()?;
        Self::connect(config).await
    }

    pub async fn connect(config: DbConfig) -> Result<Arc<Self>, DbInitError> {
        if let Some(parent) = database_file(&config.database_url).and_then(|p| {
            p.parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(|dir| dir.to_path_buf())
        }) {
            std::fs::create_dir_all(&parent).map_err(|e| DbInitError::Io(e.to_string()))?;
        }

        let options = config.connect_options()?;
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        schema::run_migrations(&pool).await?;
        tracing::info!(url = %config.database_url, "database ready");

        Ok(Arc::new(Self { config, pool }))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn connection_string(&self) -> &str {
        &self.config.database_url
    }

    pub async fn primary_status(&self) -> HealthCheckSnapshot {
        let started = Instant::now();
        let result =
            tokio::time::timeout(HEALTH_CHECK_TIMEOUT, sqlx::query("SELECT 1").execute(&self.pool))
                .await;

        match result {
            Ok(Ok(_)) => HealthCheckSnapshot {
                healthy: true,
                latency_ms: Some(started.elapsed().as_millis() as u64),
                error: None,
            },
            Ok(Err(err)) => HealthCheckSnapshot {
                healthy: false,
                latency_ms: None,
                error: Some(err.to_string()),
            },
            Err(_) => HealthCheckSnapshot {
                healthy: false,
                latency_ms: None,
                error: Some("timeout".to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckSnapshot {
    pub healthy: bool,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

/// File backing a `sqlite:` URL, `None` for in-memory databases.
fn database_file(url: &str) -> Option<PathBuf> {
    let rest = url.strip_prefix("sqlite:")?;
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

pub(crate) fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error(transparent)]
    Config(#[from] DbConfigError),
    #[error("IO error: {0}")]
    Io(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_database_file() {
        assert_eq!(
            database_file("sqlite:./data/mathlingo.db?mode=rwc"),
            Some(PathBuf::from("./data/mathlingo.db"))
        );
        assert_eq!(
            database_file("sqlite:///tmp/a.db"),
            Some(PathBuf::from("/tmp/a.db"))
        );
        assert_eq!(database_file("sqlite::memory:"), None);
        assert_eq!(database_file("postgres://x"), None);
    }

    #[test]
    fn test_timestamps_sort_lexicographically() {
        let early = Utc.with_ymd_and_hms(2025, 1, 9, 23, 59, 59).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        let (a, b) = (format_timestamp(early), format_timestamp(late));
        assert!(a < b);
        assert_eq!(a, "2025-01-09T23:59:59.000Z");
        assert_eq!(parse_timestamp(&b).unwrap(), late);
    }
}
