//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the scan
//! tick per monitor kind plus the hourly outreach push. Ticks are staggered
//! so the three scan kinds never start at the same instant; per-monitor
//! cadence gating and the row lock decide what actually runs.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use maglab_core::MonitorKind;
use maglab_engine::{PgFilterSource, ScanRequest, ScanSettings};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<maglab_core::AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_scan_job(
        &scheduler,
        pool.clone(),
        Arc::clone(&config),
        MonitorKind::Keyword,
        "0 0/15 * * * *",
    )
    .await?;
    register_scan_job(
        &scheduler,
        pool.clone(),
        Arc::clone(&config),
        MonitorKind::Company,
        "0 5/15 * * * *",
    )
    .await?;
    register_scan_job(
        &scheduler,
        pool.clone(),
        Arc::clone(&config),
        MonitorKind::Profile,
        "0 10/15 * * * *",
    )
    .await?;
    register_push_job(&scheduler, pool, config).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the recurring scan tick for one monitor kind.
///
/// Every tick runs whatever monitors of that kind are due by cadence; a tick
/// with nothing due completes as an empty run.
async fn register_scan_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<maglab_core::AppConfig>,
    kind: MonitorKind,
    schedule: &str,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::info!(kind = %kind, "scheduler: starting scan tick");
            run_scan_tick(&pool, &config, kind).await;
            tracing::info!(kind = %kind, "scheduler: scan tick complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Drive one due-monitor scan cycle for `kind`.
async fn run_scan_tick(pool: &PgPool, config: &maglab_core::AppConfig, kind: MonitorKind) {
    let Some(api_key) = config.harvest_api_key.as_deref() else {
        tracing::warn!("scheduler: HARVEST_API_KEY not set; skipping scan tick");
        return;
    };

    let harvest =
        match maglab_harvest::HarvestClient::new(api_key, config.harvest_request_timeout_secs) {
            Ok(client) => client.with_retry_policy(
                config.harvest_max_retries,
                config.harvest_retry_backoff_base_ms,
            ),
            Err(e) => {
                tracing::error!(error = %e, "scheduler: failed to build Harvest client");
                return;
            }
        };

    let filter_source = PgFilterSource::new(pool.clone());
    let settings = ScanSettings {
        max_concurrent_monitors: config.scan_max_concurrent_monitors,
        lock_stale_mins: config.monitor_lock_stale_mins,
    };
    let request = ScanRequest {
        kind,
        trigger_source: "scheduler".to_string(),
        force: false,
        owner_id: None,
    };

    match maglab_engine::run_scan(pool, &harvest, &filter_source, settings, &request).await {
        Ok(totals) => {
            tracing::info!(
                kind = %kind,
                monitors = totals.monitors,
                processed = totals.processed,
                matched = totals.matched,
                failed = totals.failed_monitors,
                "scheduler: scan tick processed"
            );
        }
        Err(e) => {
            tracing::error!(kind = %kind, error = %e, "scheduler: scan tick failed");
        }
    }
}

/// Register the hourly outreach push job.
async fn register_push_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<maglab_core::AppConfig>,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async("0 45 * * * *", move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::info!("scheduler: starting outreach push");
            run_push_tick(&pool, &config).await;
            tracing::info!("scheduler: outreach push complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

async fn run_push_tick(pool: &PgPool, config: &maglab_core::AppConfig) {
    let Some(api_key) = config.reach_api_key.as_deref() else {
        tracing::warn!("scheduler: REACH_API_KEY not set; skipping push tick");
        return;
    };

    let reach =
        match maglab_outreach::ReachClient::new(api_key, config.harvest_request_timeout_secs) {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(error = %e, "scheduler: failed to build Reach client");
                return;
            }
        };

    match maglab_engine::run_push(pool, &reach, config.push_batch_size, "scheduler").await {
        Ok(totals) => {
            tracing::info!(
                owners = totals.owners,
                pushed = totals.pushed,
                rejected = totals.rejected,
                failed_owners = totals.failed_owners,
                "scheduler: push tick processed"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "scheduler: push tick failed");
        }
    }
}
