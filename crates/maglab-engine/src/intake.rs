//! Idempotent ingestion of engager profiles: scored lead upsert plus
//! append-only event recording.

use uuid::Uuid;

use maglab_core::{Engagement, IcpFilters, ProfileSnapshot};
use maglab_db::{NewLeadSnapshot, NewSignalEvent};
use maglab_icp::{compute_icp_score, matches_icp};

use crate::error::EngineError;
use crate::store::{LeadStore, StoredLead};

/// Best-effort counts from one engager batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Engagements whose lead upsert and event append both succeeded.
    pub processed: usize,
    /// Subset of `processed` whose profile matched the owner's ICP.
    pub matched: usize,
    /// Engagements dropped for malformed data or per-item store failures.
    pub skipped: usize,
}

/// Score a profile snapshot against the owner's CURRENT filters and build
/// the row to upsert. Pure — the only scoring entry point the engine uses,
/// so match and score can never disagree with what gets persisted.
///
/// # Errors
///
/// Returns [`EngineError::MissingProfileUrl`] when the snapshot has no
/// usable profile URL — without the natural key there is nothing to upsert.
pub fn score_snapshot(
    profile: &ProfileSnapshot,
    filters: &IcpFilters,
) -> Result<NewLeadSnapshot, EngineError> {
    let profile_url = profile
        .profile_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or(EngineError::MissingProfileUrl)?;

    Ok(NewLeadSnapshot {
        profile_url: profile_url.to_string(),
        full_name: profile.full_name.clone(),
        headline: profile.headline.clone(),
        job_title: profile.job_title.clone(),
        company: profile.company.clone(),
        company_size: profile.company_size,
        location: profile.location.clone(),
        icp_score: compute_icp_score(profile, filters),
        icp_match: matches_icp(profile, filters),
    })
}

/// Upsert one lead from a profile snapshot, scoring against `filters`.
///
/// Existing rows keep `first_seen_at` and push state; snapshot fields,
/// score, match, and `last_seen_at` are refreshed.
///
/// # Errors
///
/// Returns [`EngineError::MissingProfileUrl`] for snapshots without a
/// profile URL, or a wrapped [`maglab_db::DbError`] on store failure.
pub async fn upsert_lead<S: LeadStore>(
    store: &S,
    owner_id: Uuid,
    profile: &ProfileSnapshot,
    filters: &IcpFilters,
) -> Result<StoredLead, EngineError> {
    let snapshot = score_snapshot(profile, filters)?;
    let stored = store.upsert_lead(owner_id, &snapshot).await?;
    Ok(stored)
}

/// Record one engagement event against an already-upserted lead.
///
/// # Errors
///
/// Returns a wrapped [`maglab_db::DbError`] on store failure.
pub async fn record_event<S: LeadStore>(
    store: &S,
    lead_id: i64,
    monitor_id: i64,
    engagement: &Engagement,
) -> Result<(), EngineError> {
    let event = NewSignalEvent {
        lead_id,
        monitor_id,
        signal_type: engagement.signal_type.as_str().to_string(),
        sentiment: engagement.sentiment.map(|s| s.as_str().to_string()),
        snippet: engagement.snippet.clone(),
        occurred_at: engagement.occurred_at,
    };
    store.append_event(&event).await?;
    Ok(())
}

/// Batch entry point used by the scan orchestrators: for each engagement,
/// upsert the lead and append the event.
///
/// One failing item never aborts the batch — malformed profiles and
/// per-item store failures are logged with the profile URL context and
/// skipped, and the function returns best-effort counts. The event is
/// recorded only after the lead upsert succeeds, so a lead row always
/// exists before any event referencing it.
pub async fn process_engagers<S: LeadStore>(
    store: &S,
    owner_id: Uuid,
    monitor_id: i64,
    engagements: &[Engagement],
    filters: &IcpFilters,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for engagement in engagements {
        let stored = match upsert_lead(store, owner_id, &engagement.profile, filters).await {
            Ok(stored) => stored,
            Err(EngineError::MissingProfileUrl) => {
                tracing::debug!(
                    monitor_id,
                    name = engagement.profile.full_name.as_deref().unwrap_or("<unknown>"),
                    "skipping engager without profile URL"
                );
                outcome.skipped += 1;
                continue;
            }
            Err(e) => {
                tracing::warn!(
                    monitor_id,
                    profile_url = engagement.profile.profile_url.as_deref().unwrap_or(""),
                    error = %e,
                    "lead upsert failed; skipping engager"
                );
                outcome.skipped += 1;
                continue;
            }
        };

        if let Err(e) = record_event(store, stored.id, monitor_id, engagement).await {
            tracing::warn!(
                monitor_id,
                lead_id = stored.id,
                profile_url = engagement.profile.profile_url.as_deref().unwrap_or(""),
                error = %e,
                "event append failed; lead remains upserted"
            );
            outcome.skipped += 1;
            continue;
        }

        outcome.processed += 1;
        if stored.icp_match {
            outcome.matched += 1;
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use maglab_core::SizeRange;

    #[test]
    fn score_snapshot_rejects_missing_url() {
        let profile = ProfileSnapshot {
            full_name: Some("Jane Doe".to_string()),
            ..ProfileSnapshot::default()
        };
        let result = score_snapshot(&profile, &IcpFilters::default());
        assert!(matches!(result, Err(EngineError::MissingProfileUrl)));
    }

    #[test]
    fn score_snapshot_rejects_blank_url() {
        let profile = ProfileSnapshot {
            profile_url: Some("   ".to_string()),
            ..ProfileSnapshot::default()
        };
        let result = score_snapshot(&profile, &IcpFilters::default());
        assert!(matches!(result, Err(EngineError::MissingProfileUrl)));
    }

    #[test]
    fn score_snapshot_scores_against_given_filters() {
        let profile = ProfileSnapshot {
            profile_url: Some("https://linkedin.com/in/jane".to_string()),
            headline: Some("Founder at Brightloop".to_string()),
            company_size: Some(40),
            ..ProfileSnapshot::default()
        };
        let filters = IcpFilters {
            title_keywords: vec!["founder".to_string()],
            company_size_range: Some(SizeRange { min: 10, max: 100 }),
            ..IcpFilters::default()
        };
        let snapshot = score_snapshot(&profile, &filters).unwrap();
        assert_eq!(snapshot.icp_score, 100);
        assert!(snapshot.icp_match);
        assert_eq!(snapshot.profile_url, "https://linkedin.com/in/jane");
    }

    #[test]
    fn score_snapshot_unconstrained_filters_match_everything() {
        let profile = ProfileSnapshot {
            profile_url: Some("https://linkedin.com/in/anyone".to_string()),
            ..ProfileSnapshot::default()
        };
        let snapshot = score_snapshot(&profile, &IcpFilters::default()).unwrap();
        assert_eq!(snapshot.icp_score, 100);
        assert!(snapshot.icp_match);
    }
}
