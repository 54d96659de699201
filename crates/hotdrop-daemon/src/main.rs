//! HotDrop Daemon - Hot-folder ingest service
//!
//! This binary runs as a long-lived user service and handles:
//! - Watching a hot folder (or polling a remote drop) for new files
//! - Forwarding settled, de-duplicated files to the asset service
//! - One-shot mirroring of a local directory tree (`hotdropd sync <dir>`)
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! ```text
//!  FsWatcher / PollingWatcher ──mpsc──→ Intake ──→ UploadQueue ──→ UploadWorker
//!                                                                    │
//!                                          RateLimiter ─────────────┤
//!                                          HttpAssetService ←───────┘
//! ```
//!
//! Every task observes one `CancellationToken` that is triggered on receipt
//! of SIGTERM or SIGINT.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hotdrop_core::config::{Config, LoggingConfig, SourceKind};
use hotdrop_core::domain::ContainerId;
use hotdrop_core::ports::{IAssetService, IRemoteSource};
use hotdrop_pipeline::dedup::DedupIndex;
use hotdrop_pipeline::folder_sync::{FolderSyncPlanner, ServiceTree};
use hotdrop_pipeline::intake::Intake;
use hotdrop_pipeline::poller::PollingWatcher;
use hotdrop_pipeline::queue::{RetryPolicy, UploadQueue};
use hotdrop_pipeline::rate_limit::RateLimiter;
use hotdrop_pipeline::source_dir::DirectorySource;
use hotdrop_pipeline::stability::StabilityDetector;
use hotdrop_pipeline::watcher::FsWatcher;
use hotdrop_pipeline::worker::{JobOutcome, UploadWorker};
use hotdrop_remote::ftp::FtpSource;
use hotdrop_remote::provider::HttpAssetService;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Buffered discoveries between a watcher and the intake
const DISCOVERY_CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// Command line
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "hotdropd", version, about = "Hot-folder ingest daemon")]
struct Cli {
    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Command {
    /// Watch or poll for new files until stopped (default)
    Run,
    /// Mirror a directory tree into the target container, upload it, and exit
    Sync {
        /// Local directory to mirror
        dir: PathBuf,
        /// Container to mirror into (defaults to upload.target_container)
        #[arg(long)]
        target: Option<String>,
    },
}

// ============================================================================
// Configuration and tracing
// ============================================================================

/// Loads the configuration, applies environment overrides and validates it
///
/// An explicitly named file must exist; the default location falls back to
/// built-in defaults.
fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_or_default(&Config::default_path()),
    };

    let mut problems = Vec::new();
    if let Err(errors) = config.apply_env() {
        problems.extend(errors);
    }
    problems.extend(config.validate());

    if !problems.is_empty() {
        let listed: Vec<String> = problems.iter().map(ToString::to_string).collect();
        anyhow::bail!("Invalid configuration:\n  {}", listed.join("\n  "));
    }
    Ok(config)
}

/// `RUST_LOG` wins over the configured level
fn env_filter(logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
}

fn init_tracing(logging: &LoggingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(logging))
        .with_target(true);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Picks the target container: the command-line value, else the config
fn resolve_target(flag: Option<&str>, config: &Config) -> Result<ContainerId> {
    let raw = flag
        .map(str::to_string)
        .or_else(|| config.upload.target_container.clone())
        .context("No target container: set upload.target_container or pass --target")?;
    ContainerId::new(raw).context("Invalid target container")
}

// ============================================================================
// Pipeline wiring
// ============================================================================

/// The shared pieces every mode drives
struct Pipeline {
    dedup: Arc<DedupIndex>,
    queue: Arc<UploadQueue>,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
    detector: StabilityDetector,
    max_attempts: u32,
}

impl Pipeline {
    fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            dedup: Arc::new(DedupIndex::new()),
            queue: Arc::new(UploadQueue::new(config.stable_delay())),
            limiter: Arc::new(
                RateLimiter::per_minute(config.upload.rate_limit_per_minute)
                    .context("Failed to build rate limiter")?,
            ),
            policy: RetryPolicy::from_config(&config.upload),
            detector: StabilityDetector::from_config(&config.stability),
            max_attempts: config.upload.max_attempts,
        })
    }

    fn worker(&self, service: Arc<dyn IAssetService>) -> UploadWorker {
        UploadWorker::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.dedup),
            Arc::clone(&self.limiter),
            service,
            self.policy,
        )
    }

    fn intake(&self, target: ContainerId) -> Intake {
        Intake::new(
            self.detector.clone(),
            Arc::clone(&self.dedup),
            Arc::clone(&self.queue),
            target,
            self.max_attempts,
        )
    }
}

/// Creates `dir` if needed and returns its canonical absolute path
///
/// Jobs only accept absolute paths, so every directory files are discovered
/// in goes through here.
async fn prepare_dir(dir: &Path, what: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {what} {}", dir.display()))?;
    tokio::fs::canonicalize(dir)
        .await
        .with_context(|| format!("Failed to resolve {what} {}", dir.display()))
}

/// Runs the watch or poll pipeline until `shutdown` is cancelled
async fn run_hot_folder(
    config: &Config,
    service: Arc<dyn IAssetService>,
    shutdown: CancellationToken,
) -> Result<()> {
    let target = resolve_target(None, config)?;
    let pipeline = Pipeline::from_config(config)?;
    let (tx, rx) = mpsc::channel(DISCOVERY_CHANNEL_CAPACITY);

    let worker = tokio::spawn(pipeline.worker(service).run(shutdown.clone()));

    // Held until the intake returns; dropping it stops the notify thread.
    let mut _fs_watcher = None;
    let mut poller = None;

    match config.source.kind {
        SourceKind::Watch => {
            let dir = prepare_dir(&config.source.watch_dir, "watch dir").await?;

            let mut watcher = FsWatcher::new(tx).context("Failed to start file watcher")?;
            watcher.watch(&dir)?;
            info!(dir = %dir.display(), target = %target, "Watching hot folder");
            _fs_watcher = Some(watcher);
        }
        SourceKind::Poll => {
            let source = remote_source(config)?;
            let staging = prepare_dir(&config.source.staging_dir, "staging dir").await?;

            info!(
                source = %source.describe(),
                staging_dir = %staging.display(),
                interval_secs = config.source.poll_interval_secs,
                target = %target,
                "Polling remote source"
            );
            let watcher = PollingWatcher::new(
                source,
                staging,
                Duration::from_secs(config.source.poll_interval_secs),
                tx,
            );
            poller = Some(tokio::spawn(watcher.run(shutdown.clone())));
        }
    }

    pipeline.intake(target).run(rx, shutdown.clone()).await;

    if let Some(handle) = poller {
        if let Err(e) = handle.await {
            warn!(error = %e, "Polling task ended abnormally");
        }
    }
    worker.await.context("Upload worker panicked")?;
    Ok(())
}

/// The polled origin: an FTP server or a mounted directory
fn remote_source(config: &Config) -> Result<Arc<dyn IRemoteSource>> {
    if let Some(url) = &config.source.ftp_url {
        let source = FtpSource::from_url(url).context("Invalid source.ftp_url")?;
        return Ok(Arc::new(source));
    }
    let remote_dir = config
        .source
        .remote_dir
        .clone()
        .context("source.remote_dir or source.ftp_url is required in poll mode")?;
    Ok(Arc::new(DirectorySource::new(remote_dir)))
}

/// Totals reported by a one-shot tree sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SyncSummary {
    planned: usize,
    containers_created: usize,
    skipped_subtrees: usize,
    duplicates: usize,
    uploaded: usize,
    failed: usize,
}

/// Mirrors `root` into `target`, uploads every planned file and waits for
/// each to finish
async fn run_tree_sync(
    config: &Config,
    service: Arc<dyn IAssetService>,
    root: &Path,
    target: ContainerId,
    shutdown: CancellationToken,
) -> Result<SyncSummary> {
    let tree = ServiceTree::connect(Arc::clone(&service))
        .await
        .context("Failed to authenticate with the asset service")?;
    let plan = FolderSyncPlanner::new(tree)
        .plan(root, &target)
        .await
        .with_context(|| format!("Failed to plan sync of {}", root.display()))?;

    for skipped in &plan.skipped {
        warn!(path = %skipped.path.display(), reason = %skipped.reason, "Subtree skipped");
    }

    let pipeline = Pipeline::from_config(config)?;
    let (reports_tx, mut reports_rx) = mpsc::unbounded_channel();
    let worker_token = shutdown.child_token();
    let worker = tokio::spawn(
        pipeline
            .worker(service)
            .with_reports(reports_tx)
            .run(worker_token.clone()),
    );

    let admission = pipeline.intake(target).admit_plan(&plan).await;
    let mut summary = SyncSummary {
        planned: plan.files.len(),
        containers_created: plan.created,
        skipped_subtrees: plan.skipped.len(),
        duplicates: admission.duplicates,
        failed: admission.failed,
        ..SyncSummary::default()
    };

    let mut pending = admission.enqueued;
    while pending > 0 {
        tokio::select! {
            _ = shutdown.cancelled() => {
                warn!(pending, "Sync interrupted");
                break;
            }
            report = reports_rx.recv() => {
                let Some(report) = report else { break };
                match report.outcome {
                    JobOutcome::Uploaded(_) => summary.uploaded += 1,
                    JobOutcome::Failed(_) | JobOutcome::Dropped => summary.failed += 1,
                }
                pending -= 1;
            }
        }
    }

    worker_token.cancel();
    worker.await.context("Upload worker panicked")?;
    Ok(summary)
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    info!("HotDrop daemon starting (hotdropd)");

    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let service: Arc<dyn IAssetService> = Arc::new(
        HttpAssetService::from_config(&config.remote).context("Failed to configure asset service")?,
    );

    let result = match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_hot_folder(&config, service, shutdown_token).await,
        Command::Sync { dir, target } => {
            let target = resolve_target(target.as_deref(), &config)?;
            run_tree_sync(&config, service, &dir, target, shutdown_token)
                .await
                .map(|summary| {
                    info!(
                        planned = summary.planned,
                        containers_created = summary.containers_created,
                        skipped_subtrees = summary.skipped_subtrees,
                        duplicates = summary.duplicates,
                        uploaded = summary.uploaded,
                        failed = summary.failed,
                        "Sync finished"
                    );
                })
        }
    };

    match &result {
        Ok(()) => info!("HotDrop daemon shut down gracefully"),
        Err(e) => error!(error = %e, "HotDrop daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
