//! Lead-store seam for the intake path.
//!
//! The intake functions are generic over this trait so the engager pipeline
//! can be exercised end-to-end against an in-memory store; production code
//! uses [`PgLeadStore`], a thin delegation to `maglab-db`.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use maglab_db::{DbError, NewLeadSnapshot, NewSignalEvent};

/// The slice of a stored lead the intake path needs back from an upsert.
#[derive(Debug, Clone)]
pub struct StoredLead {
    pub id: i64,
    pub public_id: Uuid,
    pub icp_score: i16,
    pub icp_match: bool,
    pub is_new: bool,
}

/// Mutation surface of the lead store used by intake: scored upsert plus
/// append-only event recording.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn upsert_lead(
        &self,
        owner_id: Uuid,
        snapshot: &NewLeadSnapshot,
    ) -> Result<StoredLead, DbError>;

    async fn append_event(&self, event: &NewSignalEvent) -> Result<(), DbError>;
}

/// Postgres-backed store used everywhere outside tests.
#[derive(Clone)]
pub struct PgLeadStore {
    pool: PgPool,
}

impl PgLeadStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn upsert_lead(
        &self,
        owner_id: Uuid,
        snapshot: &NewLeadSnapshot,
    ) -> Result<StoredLead, DbError> {
        let (row, is_new) = maglab_db::upsert_scored_lead(&self.pool, owner_id, snapshot).await?;
        Ok(StoredLead {
            id: row.id,
            public_id: row.public_id,
            icp_score: row.icp_score,
            icp_match: row.icp_match,
            is_new,
        })
    }

    async fn append_event(&self, event: &NewSignalEvent) -> Result<(), DbError> {
        maglab_db::insert_signal_event(&self.pool, event).await?;
        Ok(())
    }
}
