//! Scan orchestrators: periodic entry points that poll Harvest for posts,
//! collect engagers, and feed them through the intake pipeline.
//!
//! Failure isolation is layered: a Harvest search failure skips that monitor
//! for the cycle, a comment/reaction fetch failure skips that post, and a
//! bad profile skips that engager. Other work in the same run proceeds.

use futures::stream::{self, StreamExt};
use sqlx::PgPool;
use uuid::Uuid;

use maglab_core::{Engagement, MonitorKind, SignalType};
use maglab_harvest::{HarvestClient, HarvestPost};
use maglab_icp::comment_sentiment;

use crate::error::EngineError;
use crate::filters::FilterSource;
use crate::intake::process_engagers;
use crate::store::PgLeadStore;

const MAX_SNIPPET_CHARS: usize = 500;

/// Tuning knobs shared by every scan run.
#[derive(Debug, Clone, Copy)]
pub struct ScanSettings {
    pub max_concurrent_monitors: usize,
    pub lock_stale_mins: i64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_concurrent_monitors: 4,
            lock_stale_mins: 30,
        }
    }
}

/// One scan invocation: which kind of monitors to run and how.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub kind: MonitorKind,
    pub trigger_source: String,
    /// When true, cadence gating is ignored (CLI-forced scans). The monitor
    /// row lock is still honored.
    pub force: bool,
    pub owner_id: Option<Uuid>,
}

/// Aggregated totals for one scan run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanTotals {
    pub monitors: usize,
    pub skipped_locked: usize,
    pub failed_monitors: usize,
    pub processed: usize,
    pub matched: usize,
}

enum MonitorOutcome {
    Ok { processed: usize, matched: usize },
    SkippedLocked,
    Err(EngineError),
}

fn run_type(kind: MonitorKind) -> &'static str {
    match kind {
        MonitorKind::Keyword => "keyword_scan",
        MonitorKind::Company => "company_scan",
        MonitorKind::Profile => "profile_scan",
    }
}

/// Drive one full scan cycle for monitors of `request.kind`.
///
/// Opens a `scan_runs` row, loads due (or, when forced, all active)
/// monitors, fans out across them bounded by
/// `settings.max_concurrent_monitors`, and completes the run with the
/// processed count. Individual monitor failures are absorbed; the run is
/// failed only when every monitor in a non-empty set failed.
///
/// # Errors
///
/// Returns [`EngineError::Db`] if run bookkeeping or the monitor listing
/// fails, or [`EngineError::AllMonitorsFailed`] when no monitor succeeded.
pub async fn run_scan(
    pool: &PgPool,
    harvest: &HarvestClient,
    filter_source: &dyn FilterSource,
    settings: ScanSettings,
    request: &ScanRequest,
) -> Result<ScanTotals, EngineError> {
    let run_type = run_type(request.kind);
    let run = maglab_db::create_scan_run(pool, run_type, &request.trigger_source).await?;
    if let Err(e) = maglab_db::start_scan_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, run_type, &e.to_string()).await;
        return Err(e.into());
    }

    let monitors = if request.force {
        maglab_db::list_active_monitors(pool, request.kind.as_str(), request.owner_id).await?
    } else {
        maglab_db::list_due_monitors(pool, request.kind.as_str()).await?
    };

    if monitors.is_empty() {
        tracing::info!(run_type, "no monitors due; completing empty run");
        maglab_db::complete_scan_run(pool, run.id, 0).await?;
        return Ok(ScanTotals::default());
    }

    let store = PgLeadStore::new(pool.clone());
    let max_concurrent = settings.max_concurrent_monitors.max(1);

    let monitor_count = monitors.len();
    let store_ref = &store;
    let scan_futures = monitors.into_iter().map(|monitor| async move {
        scan_and_label(
            pool,
            harvest,
            filter_source,
            store_ref,
            settings,
            request.kind,
            &monitor,
        )
        .await
    });
    let results: Vec<(i64, String, MonitorOutcome)> = stream::iter(scan_futures)
        .buffer_unordered(max_concurrent)
        .collect()
        .await;

    let mut totals = ScanTotals {
        monitors: monitor_count,
        ..ScanTotals::default()
    };

    for (monitor_id, target, outcome) in &results {
        match outcome {
            MonitorOutcome::Ok { processed, matched } => {
                totals.processed += processed;
                totals.matched += matched;
            }
            MonitorOutcome::SkippedLocked => {
                totals.skipped_locked += 1;
            }
            MonitorOutcome::Err(e) => {
                tracing::error!(
                    monitor_id,
                    target = %target,
                    error = %e,
                    "monitor scan failed"
                );
                totals.failed_monitors += 1;
            }
        }
    }

    if totals.failed_monitors == totals.monitors {
        let message = format!("all {} monitors failed", totals.monitors);
        fail_run_best_effort(pool, run.id, run_type, &message).await;
        return Err(EngineError::AllMonitorsFailed {
            run_type: run_type.to_string(),
            count: totals.monitors,
        });
    }

    let records = i32::try_from(totals.processed).unwrap_or(i32::MAX);
    maglab_db::complete_scan_run(pool, run.id, records).await?;

    tracing::info!(
        run_type,
        monitors = totals.monitors,
        skipped_locked = totals.skipped_locked,
        failed = totals.failed_monitors,
        processed = totals.processed,
        matched = totals.matched,
        "scan run complete"
    );

    Ok(totals)
}

/// Scan one monitor and pair its outcome with the monitor's id and target.
#[allow(clippy::too_many_arguments)]
async fn scan_and_label(
    pool: &PgPool,
    harvest: &HarvestClient,
    filter_source: &dyn FilterSource,
    store: &PgLeadStore,
    settings: ScanSettings,
    kind: MonitorKind,
    monitor: &maglab_db::SignalMonitorRow,
) -> (i64, String, MonitorOutcome) {
    let outcome = scan_monitor(pool, harvest, filter_source, store, settings, kind, monitor).await;
    (monitor.id, monitor.target.clone(), outcome)
}

/// Scan one monitor under its row lock.
#[allow(clippy::too_many_arguments)]
async fn scan_monitor(
    pool: &PgPool,
    harvest: &HarvestClient,
    filter_source: &dyn FilterSource,
    store: &PgLeadStore,
    settings: ScanSettings,
    kind: MonitorKind,
    monitor: &maglab_db::SignalMonitorRow,
) -> MonitorOutcome {
    match maglab_db::claim_monitor(pool, monitor.id, settings.lock_stale_mins).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!(
                monitor_id = monitor.id,
                target = %monitor.target,
                "monitor already locked by a concurrent scan; skipping"
            );
            return MonitorOutcome::SkippedLocked;
        }
        Err(e) => return MonitorOutcome::Err(e.into()),
    }

    let outcome = scan_locked_monitor(pool, harvest, filter_source, store, kind, monitor).await;

    if let Err(e) = maglab_db::release_monitor(pool, monitor.id).await {
        tracing::warn!(
            monitor_id = monitor.id,
            error = %e,
            "failed to release monitor lock; stale takeover will recover it"
        );
    }

    outcome
}

async fn scan_locked_monitor(
    pool: &PgPool,
    harvest: &HarvestClient,
    filter_source: &dyn FilterSource,
    store: &PgLeadStore,
    kind: MonitorKind,
    monitor: &maglab_db::SignalMonitorRow,
) -> MonitorOutcome {
    let filters = match filter_source.filters_for(monitor.owner_id).await {
        Ok(Some(filters)) => filters,
        Ok(None) => {
            tracing::debug!(
                owner_id = %monitor.owner_id,
                "no ICP filters configured; treating every engager as a match"
            );
            maglab_core::IcpFilters::default()
        }
        Err(e) => return MonitorOutcome::Err(e.into()),
    };

    let posts = match search_posts(harvest, kind, &monitor.target).await {
        Ok(posts) => posts,
        Err(e) => return MonitorOutcome::Err(e),
    };

    let engagements = collect_post_engagements(harvest, kind, &posts).await;

    let batch = process_engagers(store, monitor.owner_id, monitor.id, &engagements, &filters).await;

    tracing::info!(
        monitor_id = monitor.id,
        target = %monitor.target,
        posts = posts.len(),
        engagements = engagements.len(),
        processed = batch.processed,
        matched = batch.matched,
        skipped = batch.skipped,
        "monitor scan processed"
    );

    if let Err(e) = maglab_db::touch_last_run(pool, monitor.id).await {
        // Processed results stay valid; the monitor just becomes due again
        // sooner than its cadence.
        tracing::warn!(monitor_id = monitor.id, error = %e, "failed to update last_run_at");
    }

    MonitorOutcome::Ok {
        processed: batch.processed,
        matched: batch.matched,
    }
}

async fn search_posts(
    harvest: &HarvestClient,
    kind: MonitorKind,
    target: &str,
) -> Result<Vec<HarvestPost>, EngineError> {
    let posts = match kind {
        MonitorKind::Keyword => harvest.search_posts_by_keyword(target).await?,
        MonitorKind::Company => harvest.search_posts_by_company(target).await?,
        MonitorKind::Profile => harvest.search_posts_by_profile(target).await?,
    };
    Ok(posts)
}

/// Collect engagement tuples for a batch of posts.
///
/// Comments and reactions are fetched per post; a fetch failure is logged
/// and isolated to that post. For profile monitors the post author is also
/// recorded as a `post_authorship` signal.
pub async fn collect_post_engagements(
    harvest: &HarvestClient,
    kind: MonitorKind,
    posts: &[HarvestPost],
) -> Vec<Engagement> {
    let mut engagements = Vec::new();

    for post in posts {
        let post_time = post.posted_at.unwrap_or_else(chrono::Utc::now);

        if kind == MonitorKind::Profile {
            if let Some(author) = &post.author {
                engagements.push(Engagement {
                    profile: author.to_snapshot(),
                    signal_type: SignalType::PostAuthorship,
                    sentiment: None,
                    occurred_at: post_time,
                    snippet: post.text.as_deref().map(truncate_snippet),
                });
            }
        }

        match harvest.get_post_comments(&post.id).await {
            Ok(comments) => {
                for comment in comments {
                    let Some(author) = comment.author else {
                        continue;
                    };
                    let text = comment.text.unwrap_or_default();
                    engagements.push(Engagement {
                        profile: author.to_snapshot(),
                        signal_type: SignalType::Comment,
                        sentiment: Some(comment_sentiment(&text)),
                        occurred_at: comment.commented_at.unwrap_or(post_time),
                        snippet: if text.is_empty() {
                            None
                        } else {
                            Some(truncate_snippet(&text))
                        },
                    });
                }
            }
            Err(e) => {
                tracing::warn!(post_id = %post.id, error = %e, "comment fetch failed; skipping post comments");
            }
        }

        match harvest.get_post_reactions(&post.id).await {
            Ok(reactions) => {
                for profile in reactions {
                    engagements.push(Engagement {
                        profile: profile.to_snapshot(),
                        signal_type: SignalType::Reaction,
                        sentiment: None,
                        occurred_at: post_time,
                        snippet: None,
                    });
                }
            }
            Err(e) => {
                tracing::warn!(post_id = %post.id, error = %e, "reaction fetch failed; skipping post reactions");
            }
        }
    }

    engagements
}

fn truncate_snippet(text: &str) -> String {
    if text.chars().count() <= MAX_SNIPPET_CHARS {
        text.to_string()
    } else {
        text.chars().take(MAX_SNIPPET_CHARS).collect()
    }
}

async fn fail_run_best_effort(pool: &PgPool, run_id: i64, run_type: &str, message: &str) {
    if let Err(e) = maglab_db::fail_scan_run(pool, run_id, message).await {
        tracing::error!(run_id, run_type, error = %e, "failed to mark scan run as failed");
    }
}
