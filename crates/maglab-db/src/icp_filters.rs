//! Database operations for the `icp_filters` table.
//!
//! One row per owner scope. The engine reads filters fresh on every scan so
//! a lead's qualification always reflects the latest ICP definition; a
//! missing row means "unconstrained" and is not an error.

use sqlx::PgPool;
use uuid::Uuid;

use maglab_core::{IcpFilters, Seniority, SizeRange};

use crate::DbError;

#[derive(Debug, sqlx::FromRow)]
struct IcpFilterRow {
    title_keywords: Vec<String>,
    company_size_min: Option<i32>,
    company_size_max: Option<i32>,
    excluded_companies: Vec<String>,
    required_seniority: Option<String>,
    industry_keywords: Vec<String>,
}

impl IcpFilterRow {
    fn into_filters(self) -> IcpFilters {
        let company_size_range = match (self.company_size_min, self.company_size_max) {
            (Some(min), Some(max)) => Some(SizeRange { min, max }),
            _ => None,
        };
        IcpFilters {
            title_keywords: self.title_keywords,
            company_size_range,
            excluded_companies: self.excluded_companies,
            required_seniority: self.required_seniority.as_deref().and_then(Seniority::parse),
            industry_keywords: self.industry_keywords,
        }
    }
}

/// Returns the owner's current ICP filter definition, or `None` when no
/// filters are configured.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_icp_filters(pool: &PgPool, owner_id: Uuid) -> Result<Option<IcpFilters>, DbError> {
    let row = sqlx::query_as::<_, IcpFilterRow>(
        "SELECT title_keywords, company_size_min, company_size_max, excluded_companies, \
                required_seniority, industry_keywords \
         FROM icp_filters \
         WHERE owner_id = $1",
    )
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(IcpFilterRow::into_filters))
}

/// Upserts an owner's ICP filter definition.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn upsert_icp_filters(
    pool: &PgPool,
    owner_id: Uuid,
    filters: &IcpFilters,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO icp_filters \
           (owner_id, title_keywords, company_size_min, company_size_max, excluded_companies, \
            required_seniority, industry_keywords) \
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
    .bind(owner_id)
    .bind(&filters.title_keywords)
    .bind(filters.company_size_range.map(|r| r.min))
    .bind(filters.company_size_range.map(|r| r.max))
    .bind(&filters.excluded_companies)
    .bind(filters.required_seniority.map(Seniority::as_str))
    .bind(&filters.industry_keywords)
    .execute(pool)
    .await?;

    Ok(())
}
