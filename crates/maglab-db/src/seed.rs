//! Seeding monitors and ICP filters from `config/monitors.yaml`.

use maglab_core::{OwnerSeed, SeedFile};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Upsert owners' ICP filters and monitors from seed config into the database.
///
/// Returns `(monitors, filters)` processed counts. All upserts run inside a
/// single transaction; if any operation fails the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_owners(pool: &PgPool, seed: &SeedFile) -> Result<(usize, usize), DbError> {
    let mut tx = pool.begin().await?;
    let mut monitor_count = 0usize;
    let mut filter_count = 0usize;

    for owner in &seed.owners {
        if let Some(icp) = &owner.icp {
            sqlx::query(
                "INSERT INTO icp_filters \
                   (owner_id, title_keywords, company_size_min, company_size_max, \
                    excluded_companies, required_seniority, industry_keywords) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) \
                 ON CONFLICT (owner_id) DO UPDATE SET \
                     title_keywords     = EXCLUDED.title_keywords, \
                     company_size_min   = EXCLUDED.company_size_min, \
                     company_size_max   = EXCLUDED.company_size_max, \
                     excluded_companies = EXCLUDED.excluded_companies, \
                     required_seniority = EXCLUDED.required_seniority, \
                     industry_keywords  = EXCLUDED.industry_keywords, \
                     updated_at         = NOW()",
            )
            .bind(owner.owner_id)
            .bind(&icp.title_keywords)
            .bind(icp.company_size_range.map(|r| r.min))
            .bind(icp.company_size_range.map(|r| r.max))
            .bind(&icp.excluded_companies)
            .bind(icp.required_seniority.map(maglab_core::Seniority::as_str))
            .bind(&icp.industry_keywords)
            .execute(&mut *tx)
            .await?;
            filter_count += 1;
        }

        monitor_count += seed_monitors(&mut tx, owner).await?;
    }

    tx.commit().await?;
    Ok((monitor_count, filter_count))
}

async fn seed_monitors(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    owner: &OwnerSeed,
) -> Result<usize, DbError> {
    let mut count = 0usize;

    for monitor in &owner.monitors {
        sqlx::query(
            "INSERT INTO signal_monitors \
               (public_id, owner_id, kind, target, cadence_mins, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (owner_id, kind, target) DO UPDATE SET \
                 cadence_mins = EXCLUDED.cadence_mins, \
                 is_active    = EXCLUDED.is_active, \
                 updated_at   = NOW()",
        )
        .bind(Uuid::new_v4())
        .bind(owner.owner_id)
        .bind(monitor.kind.as_str())
        .bind(&monitor.target)
        .bind(monitor.cadence_mins)
        .bind(monitor.active)
        .execute(&mut **tx)
        .await?;
        count += 1;
    }

    Ok(count)
}
