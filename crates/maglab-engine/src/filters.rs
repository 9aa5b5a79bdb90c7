//! Read-through accessor for per-owner ICP filter definitions.
//!
//! Filters are fetched fresh for every scan rather than cached, so a lead's
//! qualification always reflects the latest ICP definition. The trait keeps
//! the scorer pure and lets tests inject fixed filters.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use maglab_core::IcpFilters;
use maglab_db::DbError;

#[async_trait]
pub trait FilterSource: Send + Sync {
    /// Returns the owner's current filters, or `None` when none are
    /// configured — callers treat absence as "match everything".
    async fn filters_for(&self, owner_id: Uuid) -> Result<Option<IcpFilters>, DbError>;
}

/// Postgres-backed filter source reading the `icp_filters` table.
#[derive(Clone)]
pub struct PgFilterSource {
    pool: PgPool,
}

impl PgFilterSource {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FilterSource for PgFilterSource {
    async fn filters_for(&self, owner_id: Uuid) -> Result<Option<IcpFilters>, DbError> {
        maglab_db::get_icp_filters(&self.pool, owner_id).await
    }
}
