//! Push-to-outreach: forward qualifying leads to the Reach API.
//!
//! Only the subset Reach accepts is marked as pushed; rejected or failed
//! leads remain unpushed and are retried on the next cycle.

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use maglab_outreach::{LeadSummary, ReachClient};

use crate::error::EngineError;

/// Aggregated totals for one push run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PushTotals {
    pub owners: usize,
    pub failed_owners: usize,
    pub pushed: usize,
    pub rejected: usize,
}

/// Push qualifying unpushed leads for every owner that has any.
///
/// Owners are processed sequentially, each as one batch of up to
/// `batch_size` leads (best scores first). A whole-batch failure for one
/// owner is logged and leaves that owner's leads unpushed; other owners
/// proceed. On partial acceptance only the accepted subset is marked.
///
/// # Errors
///
/// Returns [`EngineError::Db`] if run bookkeeping or lead selection fails,
/// or [`EngineError::AllOwnersFailed`] when every owner batch failed.
pub async fn run_push(
    pool: &PgPool,
    reach: &ReachClient,
    batch_size: i64,
    trigger_source: &str,
) -> Result<PushTotals, EngineError> {
    let run = maglab_db::create_scan_run(pool, "outreach_push", trigger_source).await?;
    if let Err(e) = maglab_db::start_scan_run(pool, run.id).await {
        let message = e.to_string();
        if let Err(fail_err) = maglab_db::fail_scan_run(pool, run.id, &message).await {
            tracing::error!(run_id = run.id, error = %fail_err, "failed to mark push run as failed");
        }
        return Err(e.into());
    }

    let owners = maglab_db::list_owners_with_unpushed_leads(pool).await?;

    if owners.is_empty() {
        tracing::info!("no qualifying unpushed leads; completing empty push run");
        maglab_db::complete_scan_run(pool, run.id, 0).await?;
        return Ok(PushTotals::default());
    }

    let mut totals = PushTotals {
        owners: owners.len(),
        ..PushTotals::default()
    };

    for owner_id in &owners {
        match push_owner_batch(pool, reach, *owner_id, batch_size).await {
            Ok((pushed, rejected)) => {
                totals.pushed += pushed;
                totals.rejected += rejected;
            }
            Err(e) => {
                tracing::warn!(
                    owner_id = %owner_id,
                    error = %e,
                    "push batch failed; leads stay unpushed for the next cycle"
                );
                totals.failed_owners += 1;
            }
        }
    }

    if totals.failed_owners == totals.owners {
        let message = format!("all {} owner batches failed", totals.owners);
        if let Err(e) = maglab_db::fail_scan_run(pool, run.id, &message).await {
            tracing::error!(run_id = run.id, error = %e, "failed to mark push run as failed");
        }
        return Err(EngineError::AllOwnersFailed {
            count: totals.owners,
        });
    }

    let records = i32::try_from(totals.pushed).unwrap_or(i32::MAX);
    maglab_db::complete_scan_run(pool, run.id, records).await?;

    tracing::info!(
        owners = totals.owners,
        failed_owners = totals.failed_owners,
        pushed = totals.pushed,
        rejected = totals.rejected,
        "push run complete"
    );

    Ok(totals)
}

/// Push one owner's batch. Returns `(accepted, rejected)` counts.
async fn push_owner_batch(
    pool: &PgPool,
    reach: &ReachClient,
    owner_id: Uuid,
    batch_size: i64,
) -> Result<(usize, usize), EngineError> {
    let leads = maglab_db::list_unpushed_matched_leads(pool, owner_id, batch_size).await?;
    if leads.is_empty() {
        return Ok((0, 0));
    }

    let id_by_public: HashMap<Uuid, i64> =
        leads.iter().map(|lead| (lead.public_id, lead.id)).collect();

    let summaries: Vec<LeadSummary> = leads
        .iter()
        .map(|lead| LeadSummary {
            lead_id: lead.public_id,
            profile_url: lead.profile_url.clone(),
            full_name: lead.full_name.clone(),
            job_title: lead.job_title.clone(),
            company: lead.company.clone(),
            icp_score: lead.icp_score,
        })
        .collect();

    let receipts = reach.push_leads(&summaries).await?;

    let accepted_ids: Vec<i64> = receipts
        .iter()
        .filter(|r| r.accepted)
        .filter_map(|r| id_by_public.get(&r.lead_id).copied())
        .collect();

    for receipt in receipts.iter().filter(|r| !r.accepted) {
        tracing::debug!(
            owner_id = %owner_id,
            lead_id = %receipt.lead_id,
            reason = receipt.reason.as_deref().unwrap_or("unspecified"),
            "lead rejected by outreach"
        );
    }

    let marked = maglab_db::mark_leads_pushed(pool, &accepted_ids).await?;

    tracing::info!(
        owner_id = %owner_id,
        batch = leads.len(),
        accepted = accepted_ids.len(),
        marked,
        "owner push batch complete"
    );

    let rejected = receipts.len().saturating_sub(accepted_ids.len());
    Ok((accepted_ids.len(), rejected))
}
