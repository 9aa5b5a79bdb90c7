//! Operator CLI for the MagnetLab signal engine.
//!
//! Per-monitor and per-owner failures are logged and skipped rather than
//! propagated, so a single bad target does not abort a full run; the process
//! exits non-zero only when a whole run fails.

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use maglab_core::MonitorKind;
use maglab_engine::{PgFilterSource, ScanRequest, ScanSettings};

#[derive(Debug, Parser)]
#[command(name = "maglab-cli")]
#[command(about = "MagnetLab signal engine command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScanKind {
    Keyword,
    Company,
    Profile,
    All,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a scan cycle for monitors of one kind (or all kinds)
    Scan {
        kind: ScanKind,

        /// Restrict the scan to a single owner scope
        #[arg(long)]
        owner: Option<Uuid>,

        /// Respect monitor cadence instead of scanning every active monitor
        #[arg(long)]
        due_only: bool,
    },
    /// Push qualifying unpushed leads to the outreach tool
    Push,
    /// Upsert monitors and ICP filters from the seed config
    Seed {
        /// Override the seed config path (default: MAGLAB_SEED_PATH)
        #[arg(long)]
        config: Option<std::path::PathBuf>,
    },
    /// Run pending database migrations
    Migrate,
    /// List recent scan runs
    Runs {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = maglab_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let pool_config = maglab_db::PoolConfig::from_app_config(&config);
    let pool = maglab_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Scan {
            kind,
            owner,
            due_only,
        } => run_scans(&pool, &config, kind, owner, due_only).await?,
        Commands::Push => run_push(&pool, &config).await?,
        Commands::Seed { config: path } => run_seed(&pool, &config, path).await?,
        Commands::Migrate => {
            let applied = maglab_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Runs { limit } => list_runs(&pool, limit).await?,
    }

    Ok(())
}

fn scan_kinds(kind: ScanKind) -> Vec<MonitorKind> {
    match kind {
        ScanKind::Keyword => vec![MonitorKind::Keyword],
        ScanKind::Company => vec![MonitorKind::Company],
        ScanKind::Profile => vec![MonitorKind::Profile],
        ScanKind::All => vec![
            MonitorKind::Keyword,
            MonitorKind::Company,
            MonitorKind::Profile,
        ],
    }
}

async fn run_scans(
    pool: &sqlx::PgPool,
    config: &maglab_core::AppConfig,
    kind: ScanKind,
    owner: Option<Uuid>,
    due_only: bool,
) -> anyhow::Result<()> {
    let api_key = config
        .harvest_api_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("HARVEST_API_KEY is required for scans"))?;
    let harvest = maglab_harvest::HarvestClient::new(api_key, config.harvest_request_timeout_secs)?
        .with_retry_policy(
            config.harvest_max_retries,
            config.harvest_retry_backoff_base_ms,
        );
    let filter_source = PgFilterSource::new(pool.clone());
    let settings = ScanSettings {
        max_concurrent_monitors: config.scan_max_concurrent_monitors,
        lock_stale_mins: config.monitor_lock_stale_mins,
    };

    for monitor_kind in scan_kinds(kind) {
        let request = ScanRequest {
            kind: monitor_kind,
            trigger_source: "cli".to_string(),
            force: !due_only,
            owner_id: owner,
        };
        let totals =
            maglab_engine::run_scan(pool, &harvest, &filter_source, settings, &request).await?;
        println!(
            "{monitor_kind} scan: {} monitors ({} locked, {} failed), {} engagements processed, {} matched",
            totals.monitors,
            totals.skipped_locked,
            totals.failed_monitors,
            totals.processed,
            totals.matched
        );
    }

    Ok(())
}

async fn run_push(pool: &sqlx::PgPool, config: &maglab_core::AppConfig) -> anyhow::Result<()> {
    let api_key = config
        .reach_api_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("REACH_API_KEY is required for pushes"))?;
    let reach = maglab_outreach::ReachClient::new(api_key, config.harvest_request_timeout_secs)?;

    let totals = maglab_engine::run_push(pool, &reach, config.push_batch_size, "cli").await?;
    println!(
        "push: {} owners ({} failed), {} leads pushed, {} rejected",
        totals.owners, totals.failed_owners, totals.pushed, totals.rejected
    );

    Ok(())
}

async fn run_seed(
    pool: &sqlx::PgPool,
    config: &maglab_core::AppConfig,
    path_override: Option<std::path::PathBuf>,
) -> anyhow::Result<()> {
    let path = path_override.unwrap_or_else(|| config.seed_path.clone());
    let seed = maglab_core::load_seed_config(&path)?;

    let (monitors, filters) = maglab_db::seed_owners(pool, &seed).await?;
    println!(
        "seeded {} owner(s): {monitors} monitor(s), {filters} ICP filter(s) from {}",
        seed.owners.len(),
        path.display()
    );

    Ok(())
}

async fn list_runs(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = maglab_db::list_scan_runs(pool, limit).await?;
    if runs.is_empty() {
        println!("no scan runs recorded");
        return Ok(());
    }

    for run in runs {
        let completed = run
            .completed_at
            .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
        println!(
            "#{:<6} {:<14} {:<9} trigger={:<9} records={:<6} completed={completed}{}",
            run.id,
            run.run_type,
            run.status,
            run.trigger_source,
            run.records_processed,
            run.error_message
                .map_or_else(String::new, |e| format!(" error={e}"))
        );
    }

    Ok(())
}
