use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::config::EngineConfig;
use crate::db::DatabaseProxy;
use crate::services::{AdaptationEngine, ContentService};
use crate::store::LearningStore;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    db_proxy: Arc<DatabaseProxy>,
    engine: Arc<AdaptationEngine>,
    content: Arc<ContentService>,
}

impl AppState {
    pub fn new(db_proxy: Arc<DatabaseProxy>, engine_config: EngineConfig) -> Self {
        let store: Arc<dyn LearningStore> = db_proxy.clone();
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            engine: Arc::new(AdaptationEngine::new(Arc::clone(&store), engine_config)),
            content: Arc::new(ContentService::new(store)),
            db_proxy,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn db_proxy(&self) -> Arc<DatabaseProxy> {
        Arc::clone(&self.db_proxy)
    }

    pub fn engine(&self) -> Arc<AdaptationEngine> {
        Arc::clone(&self.engine)
    }

    pub fn content(&self) -> Arc<ContentService> {
        Arc::clone(&self.content)
    }
}
