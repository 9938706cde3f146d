use chrono::{DateTime, Utc};
use mathlingo_algo::{ModuleId, UserId};
use serde::Serialize;

use crate::db::operations::progress::ModuleProgress;
use crate::services::{AdaptationEngine, EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub user_id: UserId,
    pub total_xp: i64,
    pub modules: usize,
}

impl AdaptationEngine {
    pub async fn add_module_xp(
        &self,
        user_id: UserId,
        module_id: ModuleId,
        xp: i64,
    ) -> EngineResult<ModuleProgress> {
        self.add_module_xp_at(user_id, module_id, xp, Utc::now()).await
    }

    /// Awards `xp` for a module. Repeated awards accumulate.
    pub async fn add_module_xp_at(
        &self,
        user_id: UserId,
        module_id: ModuleId,
        xp: i64,
        now: DateTime<Utc>,
    ) -> EngineResult<ModuleProgress> {
        if xp <= 0 {
            return Err(EngineError::Validation(format!("xp must be positive, got {xp}")));
        }
        self.require_user(user_id).await?;
        if self.store().get_module(module_id).await?.is_none() {
            return Err(EngineError::not_found("module", module_id));
        }

        let progress = self
            .store()
            .add_module_xp(user_id, module_id, xp, now)
            .await?;
        tracing::info!(user_id, module_id, xp, total = progress.xp, "module xp awarded");
        Ok(progress)
    }

    pub async fn module_progress(&self, user_id: UserId) -> EngineResult<Vec<ModuleProgress>> {
        self.require_user(user_id).await?;
        Ok(self.store().get_module_progress(user_id).await?)
    }

    pub async fn progress_summary(&self, user_id: UserId) -> EngineResult<ProgressSummary> {
        self.require_user(user_id).await?;
        let modules = self.store().get_module_progress(user_id).await?.len();
        let total_xp = self.store().total_xp(user_id).await?;
        Ok(ProgressSummary {
            user_id,
            total_xp,
            modules,
        })
    }
}
