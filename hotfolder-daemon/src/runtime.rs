use std::path::Path;
use std::sync::Arc;

use hotfolder_core::{FileSystem, FsEvent, MonitorConfig, OsFs};
use hotfolder_sync::{Dispatch, EventProcessor};
use notify::{recommended_watcher, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};

use crate::error::{io_err, DaemonError};
use crate::translate::{translate, PathRebase};

/// Counters for one dispatch loop run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Filesystem events that reached the processor and were applied.
    pub applied: usize,
    /// Notify events that translated to nothing, or were dropped by the processor.
    pub ignored: usize,
    /// Notify errors logged and skipped.
    pub errors: usize,
}

/// Start the monitor and block the current thread until it exits.
pub fn start_blocking(config: MonitorConfig) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config, Arc::new(OsFs)))
}

/// Run the monitor until Ctrl-C or until the subscription ends.
///
/// Missing directories are created before any task starts; failing to create
/// them is returned straight away.
pub async fn run(config: MonitorConfig, fs: Arc<dyn FileSystem>) -> Result<(), DaemonError> {
    ensure_monitor_dirs(fs.as_ref(), &config)?;

    let (shutdown_tx, _) = broadcast::channel::<()>(4);
    // Subscribe before spawning so a shutdown sent by either task is never missed.
    let monitor_rx = shutdown_tx.subscribe();
    let mut signal_rx = shutdown_tx.subscribe();

    let monitor_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let result = monitor(config, fs, monitor_rx).await;
            let _ = shutdown.send(());
            result.map(|_| ())
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = signal_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => match signal {
                    Ok(()) => {
                        tracing::info!("received ctrl-c, stopping monitor");
                        let _ = shutdown.send(());
                        Ok(())
                    }
                    Err(err) => Err(DaemonError::Signal(err)),
                }
            }
        })
    };

    let (monitor_result, signal_result) = tokio::join!(monitor_handle, signal_handle);
    handle_join("monitor", monitor_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(())
}

/// Watch `config.hot_dir` and process events until shutdown or until the
/// notification channels close.
///
/// Creating the directories, the watcher, or the watch itself is fatal. The
/// watcher is dropped on every return path, which ends the subscription.
pub async fn monitor(
    config: MonitorConfig,
    fs: Arc<dyn FileSystem>,
    shutdown_rx: broadcast::Receiver<()>,
) -> Result<LoopStats, DaemonError> {
    ensure_monitor_dirs(fs.as_ref(), &config)?;

    // Backends report canonical paths (e.g. /private/var/... on macOS).
    let watched =
        std::fs::canonicalize(&config.hot_dir).unwrap_or_else(|_| config.hot_dir.clone());

    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();
    let (error_tx, error_rx) = mpsc::unbounded_channel::<notify::Error>();
    let mut watcher: RecommendedWatcher =
        recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let _ = event_tx.send(event);
            }
            Err(err) => {
                let _ = error_tx.send(err);
            }
        })?;
    watcher.watch(&watched, RecursiveMode::NonRecursive)?;
    tracing::info!(hot_dir = %config.hot_dir.display(), "monitoring started");

    let processor = EventProcessor::open(fs.clone(), &config);
    let rebase = PathRebase::new(watched, config.hot_dir.clone());
    let stats = dispatch_loop(processor, fs, rebase, event_rx, error_rx, shutdown_rx).await;

    drop(watcher);
    if let Ok(stats) = &stats {
        tracing::info!(
            applied = stats.applied,
            ignored = stats.ignored,
            errors = stats.errors,
            "monitoring stopped",
        );
    }
    stats
}

/// Feed notifications to `processor` one at a time, in delivery order.
///
/// Each event, including its tracking-state save, completes before the next
/// one is received. Notify errors are logged and skipped.
pub(crate) async fn dispatch_loop(
    mut processor: EventProcessor,
    fs: Arc<dyn FileSystem>,
    rebase: PathRebase,
    mut event_rx: mpsc::UnboundedReceiver<Event>,
    mut error_rx: mpsc::UnboundedReceiver<notify::Error>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<LoopStats, DaemonError> {
    let mut stats = LoopStats::default();

    loop {
        tokio::select! {
            // Shutdown wins, and pending errors are reported before later events.
            biased;
            _ = shutdown_rx.recv() => break,
            err = error_rx.recv() => {
                let Some(err) = err else { break };
                tracing::warn!(error = %err, "watcher event error");
                stats.errors += 1;
            }
            event = event_rx.recv() => {
                let Some(mut event) = event else { break };
                for path in &mut event.paths {
                    *path = rebase.apply(path);
                }
                let batch: Vec<FsEvent> =
                    translate(&event, |path| fs.exists(path).unwrap_or(false));
                if batch.is_empty() {
                    tracing::trace!(kind = ?event.kind, "ignoring notify event");
                    stats.ignored += 1;
                    continue;
                }

                let batch_len = batch.len();
                let (returned, applied) = tokio::task::spawn_blocking(move || {
                    let applied = batch
                        .iter()
                        .filter(|e| matches!(processor.handle(e), Dispatch::Applied(_)))
                        .count();
                    (processor, applied)
                })
                .await
                .map_err(|source| DaemonError::Join { task: "event processor", source })?;

                processor = returned;
                stats.applied += applied;
                stats.ignored += batch_len - applied;
            }
        }
    }

    Ok(stats)
}

fn ensure_monitor_dirs(fs: &dyn FileSystem, config: &MonitorConfig) -> Result<(), DaemonError> {
    for dir in [&config.hot_dir, &config.backup_dir] {
        ensure_dir(fs, dir)?;
    }
    Ok(())
}

fn ensure_dir(fs: &dyn FileSystem, dir: &Path) -> Result<(), DaemonError> {
    if !fs.exists(dir).map_err(|e| io_err(dir, e))? {
        fs.create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        tracing::info!(path = %dir.display(), "created directory");
    }
    Ok(())
}

fn handle_join(
    task: &'static str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(source) => Err(DaemonError::Join { task, source }),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
