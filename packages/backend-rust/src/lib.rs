//! Mathlingo adaptive-learning backend: SQLite storage, the adaptation
//! engine, certificate issuance and the HTTP surface.

pub mod config;
pub mod db;
pub mod logging;
pub mod response;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;
pub mod store;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::EngineConfig;
use crate::db::{DatabaseProxy, DbInitError};
use crate::state::AppState;

/// Router with the standard layers over an already-built state.
pub fn build_app(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn create_app() -> Result<axum::Router, DbInitError> {
    let db_proxy: Arc<DatabaseProxy> = DatabaseProxy::from_env().await?;
    let state = AppState::new(db_proxy, EngineConfig::from_env());
    Ok(build_app(state))
}
