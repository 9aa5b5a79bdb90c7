//! Database operations for the `signal_monitors` table.
//!
//! The engine mutates only `last_run_at` and the lock column; everything else
//! is owned by seeding.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `signal_monitors` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SignalMonitorRow {
    pub id: i64,
    pub public_id: Uuid,
    pub owner_id: Uuid,
    pub kind: String,
    pub target: String,
    pub cadence_mins: i32,
    pub is_active: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub locked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns active monitors of `kind` that are due for a scan: never run, or
/// last run longer than their cadence ago.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_due_monitors(
    pool: &PgPool,
    kind: &str,
) -> Result<Vec<SignalMonitorRow>, DbError> {
    let rows = sqlx::query_as::<_, SignalMonitorRow>(
        "SELECT id, public_id, owner_id, kind, target, cadence_mins, is_active, \
                last_run_at, locked_at, created_at, updated_at \
         FROM signal_monitors \
         WHERE kind = $1 AND is_active = true \
           AND (last_run_at IS NULL \
                OR last_run_at < NOW() - (cadence_mins * INTERVAL '1 minute')) \
         ORDER BY last_run_at NULLS FIRST",
    )
    .bind(kind)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns all active monitors of `kind`, optionally restricted to one owner.
/// Cadence is ignored — used by CLI-forced scans.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_monitors(
    pool: &PgPool,
    kind: &str,
    owner_id: Option<Uuid>,
) -> Result<Vec<SignalMonitorRow>, DbError> {
    let rows = sqlx::query_as::<_, SignalMonitorRow>(
        "SELECT id, public_id, owner_id, kind, target, cadence_mins, is_active, \
                last_run_at, locked_at, created_at, updated_at \
         FROM signal_monitors \
         WHERE kind = $1 AND is_active = true \
           AND ($2::uuid IS NULL OR owner_id = $2) \
         ORDER BY owner_id, target",
    )
    .bind(kind)
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single monitor by its public id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_monitor_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<SignalMonitorRow>, DbError> {
    let row = sqlx::query_as::<_, SignalMonitorRow>(
        "SELECT id, public_id, owner_id, kind, target, cadence_mins, is_active, \
                last_run_at, locked_at, created_at, updated_at \
         FROM signal_monitors \
         WHERE public_id = $1",
    )
    .bind(public_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Attempts to claim the scan lock on a monitor row.
///
/// Succeeds when the lock is free or stale (held longer than
/// `stale_after_mins`) — stale takeover covers scans killed by the host's
/// wall-clock timeout. Returns `true` when this caller now holds the lock.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn claim_monitor(
    pool: &PgPool,
    monitor_id: i64,
    stale_after_mins: i64,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE signal_monitors \
         SET locked_at = NOW() \
         WHERE id = $1 \
           AND (locked_at IS NULL \
                OR locked_at < NOW() - ($2 * INTERVAL '1 minute'))",
    )
    .bind(monitor_id)
    .bind(stale_after_mins)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Releases the scan lock on a monitor row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn release_monitor(pool: &PgPool, monitor_id: i64) -> Result<(), DbError> {
    sqlx::query("UPDATE signal_monitors SET locked_at = NULL WHERE id = $1")
        .bind(monitor_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Records a completed scan by setting `last_run_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn touch_last_run(pool: &PgPool, monitor_id: i64) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE signal_monitors \
         SET last_run_at = NOW(), updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(monitor_id)
    .execute(pool)
    .await?;
    Ok(())
}
