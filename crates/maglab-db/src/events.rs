//! Database operations for the `signal_events` table.
//!
//! Events are append-only: one row per observed engagement, never updated or
//! deleted. A lead row always exists before any event referencing it — the
//! engine records events only after the lead upsert succeeds.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `signal_events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SignalEventRow {
    pub id: i64,
    pub public_id: Uuid,
    pub lead_id: i64,
    pub monitor_id: i64,
    pub signal_type: String,
    pub sentiment: Option<String>,
    pub snippet: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Input for one event append.
#[derive(Debug, Clone)]
pub struct NewSignalEvent {
    pub lead_id: i64,
    pub monitor_id: i64,
    pub signal_type: String,
    pub sentiment: Option<String>,
    pub snippet: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Appends one engagement event and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a foreign-key
/// violation when the referenced lead does not exist).
pub async fn insert_signal_event(
    pool: &PgPool,
    event: &NewSignalEvent,
) -> Result<SignalEventRow, DbError> {
    let row = sqlx::query_as::<_, SignalEventRow>(
        "INSERT INTO signal_events \
           (public_id, lead_id, monitor_id, signal_type, sentiment, snippet, occurred_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, public_id, lead_id, monitor_id, signal_type, sentiment, snippet, \
                   occurred_at, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(event.lead_id)
    .bind(event.monitor_id)
    .bind(&event.signal_type)
    .bind(&event.sentiment)
    .bind(&event.snippet)
    .bind(event.occurred_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
