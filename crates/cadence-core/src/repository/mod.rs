use crate::auth::{AccessPolicy, Actor, OwnerOrAdmin};
use crate::compositor::Compositor;
use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    EngineConfig, ListScope, Occurrence, OccurrenceEdit, Override, Series, SeriesInput, TimeWindow,
};
use crate::recurrence::RecurrenceEvaluator;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub mod mutations;
pub mod occurrences;
pub(crate) mod rows;
pub mod series;

/// Series lifecycle: create, read, full replacement and delete.
#[async_trait]
pub trait SeriesRepository {
    async fn create_series(&self, actor: &Actor, data: SeriesInput) -> Result<Series, CoreError>;
    async fn find_series_by_id(&self, id: Uuid) -> Result<Option<Series>, CoreError>;
    /// Like `find_series_by_id`, but missing series are an error and the
    /// actor must be allowed to view the series.
    async fn get_series(&self, actor: &Actor, id: Uuid) -> Result<Series, CoreError>;
    async fn list_series(&self, actor: &Actor, scope: ListScope) -> Result<Vec<Series>, CoreError>;
    async fn update_series(&self, actor: &Actor, id: Uuid, data: SeriesInput) -> Result<Series, CoreError>;
    async fn delete_series(&self, actor: &Actor, id: Uuid) -> Result<(), CoreError>;
}

/// Read side of the occurrence engine.
#[async_trait]
pub trait OccurrenceRepository {
    async fn find_occurrences(&self, actor: &Actor, window: TimeWindow) -> Result<Vec<Occurrence>, CoreError>;
    async fn find_overrides(&self, actor: &Actor, series_id: Uuid) -> Result<Vec<Override>, CoreError>;
}

/// Atomic single-occurrence mutations on recurring series.
#[async_trait]
pub trait MutationCoordinator {
    /// Removes the occurrence at `anchor` from base generation. Returns `false`
    /// when it was already excluded.
    async fn exclude_occurrence(&self, actor: &Actor, series_id: Uuid, anchor: DateTime<Utc>) -> Result<bool, CoreError>;
    /// Excludes `anchor` and writes the override that replaces it, as one unit.
    async fn edit_occurrence(
        &self,
        actor: &Actor,
        series_id: Uuid,
        anchor: DateTime<Utc>,
        edit: OccurrenceEdit,
    ) -> Result<Override, CoreError>;
    /// Edits an existing override addressed by its own id.
    async fn edit_override(
        &self,
        actor: &Actor,
        series_id: Uuid,
        override_id: Uuid,
        edit: OccurrenceEdit,
    ) -> Result<Override, CoreError>;
}

/// Main repository trait that composes all domain traits
#[async_trait]
pub trait Repository: SeriesRepository + OccurrenceRepository + MutationCoordinator {}

/// SQLite implementation of the repository pattern
pub struct SqliteRepository {
    pool: DbPool,
    config: EngineConfig,
    policy: Arc<dyn AccessPolicy>,
}

impl SqliteRepository {
    pub fn new(pool: DbPool, config: EngineConfig) -> Self {
        Self::with_policy(pool, config, Arc::new(OwnerOrAdmin))
    }

    pub fn with_policy(pool: DbPool, config: EngineConfig, policy: Arc<dyn AccessPolicy>) -> Self {
        Self { pool, config, policy }
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub(crate) fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn policy(&self) -> &dyn AccessPolicy {
        self.policy.as_ref()
    }

    pub(crate) fn compositor(&self) -> Compositor {
        Compositor::new(RecurrenceEvaluator::new(self.config.iteration_ceiling))
    }

    pub(crate) fn ensure_can_view(&self, actor: &Actor, series: &Series) -> Result<(), CoreError> {
        if self.policy.can_view(actor, series.owner_id) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!("not allowed to view series {}", series.id)))
        }
    }

    pub(crate) fn ensure_can_manage(&self, actor: &Actor, series: &Series) -> Result<(), CoreError> {
        if self.policy.can_manage(actor, series.owner_id) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!("not allowed to modify series {}", series.id)))
        }
    }
}

impl Repository for SqliteRepository {}
