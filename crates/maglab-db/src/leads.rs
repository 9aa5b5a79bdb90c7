//! Database operations for the `signal_leads` table.
//!
//! One row per `(owner_id, profile_url)` — repeated discovery updates the
//! snapshot and re-scores instead of duplicating. All mutation funnels
//! through the single-statement upsert so concurrent discovery of the same
//! person serializes at the database.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `signal_leads` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SignalLeadRow {
    pub id: i64,
    pub public_id: Uuid,
    pub owner_id: Uuid,
    pub profile_url: String,
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub company_size: Option<i32>,
    pub location: Option<String>,
    pub icp_score: i16,
    pub icp_match: bool,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub pushed_to_outreach: bool,
    pub push_attempted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Scored snapshot handed to the upsert. Scoring happens in the engine
/// against the owner's CURRENT filters before the row is written.
#[derive(Debug, Clone)]
pub struct NewLeadSnapshot {
    pub profile_url: String,
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub company_size: Option<i32>,
    pub location: Option<String>,
    pub icp_score: i16,
    pub icp_match: bool,
}

/// Filters for the read-side lead listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadQuery {
    pub owner_id: Option<Uuid>,
    pub matched: Option<bool>,
    pub limit: i64,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Upserts a scored lead snapshot by `(owner_id, profile_url)`.
///
/// On conflict the snapshot fields, `icp_score`, `icp_match`, and
/// `last_seen_at` are refreshed; `first_seen_at` and push state are
/// preserved. Returns the stored row plus whether it was newly inserted
/// (detected via `xmax = 0`).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn upsert_scored_lead(
    pool: &PgPool,
    owner_id: Uuid,
    snapshot: &NewLeadSnapshot,
) -> Result<(SignalLeadRow, bool), DbError> {
    #[derive(sqlx::FromRow)]
    struct UpsertRow {
        #[sqlx(flatten)]
        lead: SignalLeadRow,
        is_new: bool,
    }

    let row = sqlx::query_as::<_, UpsertRow>(
        "INSERT INTO signal_leads \
           (public_id, owner_id, profile_url, full_name, headline, job_title, company, \
            company_size, location, icp_score, icp_match) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (owner_id, profile_url) DO UPDATE SET \
             full_name    = EXCLUDED.full_name, \
             headline     = EXCLUDED.headline, \
             job_title    = EXCLUDED.job_title, \
             company      = EXCLUDED.company, \
             company_size = EXCLUDED.company_size, \
             location     = EXCLUDED.location, \
             icp_score    = EXCLUDED.icp_score, \
             icp_match    = EXCLUDED.icp_match, \
             last_seen_at = NOW(), \
             updated_at   = NOW() \
         RETURNING id, public_id, owner_id, profile_url, full_name, headline, job_title, \
                   company, company_size, location, icp_score, icp_match, first_seen_at, \
                   last_seen_at, pushed_to_outreach, push_attempted_at, created_at, updated_at, \
                   (xmax = 0) AS is_new",
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(&snapshot.profile_url)
    .bind(&snapshot.full_name)
    .bind(&snapshot.headline)
    .bind(&snapshot.job_title)
    .bind(&snapshot.company)
    .bind(snapshot.company_size)
    .bind(&snapshot.location)
    .bind(snapshot.icp_score)
    .bind(snapshot.icp_match)
    .fetch_one(pool)
    .await?;

    Ok((row.lead, row.is_new))
}

/// Returns up to `limit` qualifying, not-yet-pushed leads for an owner,
/// best scores first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_unpushed_matched_leads(
    pool: &PgPool,
    owner_id: Uuid,
    limit: i64,
) -> Result<Vec<SignalLeadRow>, DbError> {
    let rows = sqlx::query_as::<_, SignalLeadRow>(
        "SELECT id, public_id, owner_id, profile_url, full_name, headline, job_title, \
                company, company_size, location, icp_score, icp_match, first_seen_at, \
                last_seen_at, pushed_to_outreach, push_attempted_at, created_at, updated_at \
         FROM signal_leads \
         WHERE owner_id = $1 AND icp_match = true AND pushed_to_outreach = false \
         ORDER BY icp_score DESC, last_seen_at DESC \
         LIMIT $2",
    )
    .bind(owner_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the distinct owners that currently have qualifying unpushed leads.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_owners_with_unpushed_leads(pool: &PgPool) -> Result<Vec<Uuid>, DbError> {
    let owners = sqlx::query_scalar::<_, Uuid>(
        "SELECT DISTINCT owner_id FROM signal_leads \
         WHERE icp_match = true AND pushed_to_outreach = false",
    )
    .fetch_all(pool)
    .await?;

    Ok(owners)
}

/// Marks the given leads as pushed (`pushed_to_outreach = true`,
/// `push_attempted_at = NOW()`). Returns the number of rows updated.
///
/// Called with exactly the subset the outreach API accepted, so a partial
/// acceptance leaves the rejected leads eligible for the next cycle.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn mark_leads_pushed(pool: &PgPool, lead_ids: &[i64]) -> Result<u64, DbError> {
    if lead_ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        "UPDATE signal_leads \
         SET pushed_to_outreach = true, push_attempted_at = NOW(), updated_at = NOW() \
         WHERE id = ANY($1)",
    )
    .bind(lead_ids)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Read-side listing for the API: newest sightings first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_leads(pool: &PgPool, query: LeadQuery) -> Result<Vec<SignalLeadRow>, DbError> {
    let limit = if query.limit <= 0 { 100 } else { query.limit };

    let rows = sqlx::query_as::<_, SignalLeadRow>(
        "SELECT id, public_id, owner_id, profile_url, full_name, headline, job_title, \
                company, company_size, location, icp_score, icp_match, first_seen_at, \
                last_seen_at, pushed_to_outreach, push_attempted_at, created_at, updated_at \
         FROM signal_leads \
         WHERE ($1::uuid IS NULL OR owner_id = $1) \
           AND ($2::bool IS NULL OR icp_match = $2) \
         ORDER BY last_seen_at DESC \
         LIMIT $3",
    )
    .bind(query.owner_id)
    .bind(query.matched)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Counts leads for an owner, split by match state.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_leads(pool: &PgPool, owner_id: Uuid) -> Result<(i64, i64), DbError> {
    let row: (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE icp_match) \
         FROM signal_leads WHERE owner_id = $1",
    )
    .bind(owner_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
