//! Supervisor: wires liveness, the worker pool and the watcher, and owns the terminal cleanup.

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, never, select, tick};
use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::engine::LivenessReporter;
use crate::error::{PoolError, WatchError};
use crate::pipeline::pool::WorkerPool;
use crate::pipeline::report::report_outcome;
use crate::pipeline::sweep::SweepBacklog;
use crate::pipeline::watch::DirectoryWatcher;
use crate::store::StoreConnector;
use crate::{Dispatch, Settings, UploadTask};

/// Run until `shutdown` fires or a fatal error occurs.
///
/// Order: clear the marker, start the pool, subscribe, mark ready, sweep (when enabled),
/// dispatch forever. Whatever ends the loop, the pool is drained and the marker set to dead
/// before returning. Per-upload failures are only logged; watch, pool and liveness failures
/// are returned.
pub fn run_supervisor(
    settings: &Settings,
    connector: Arc<dyn StoreConnector>,
    shutdown: &Receiver<()>,
) -> Result<()> {
    let liveness = LivenessReporter::new(&settings.liveness_path);
    liveness
        .mark_starting()
        .context("clear stale liveness marker")?;

    let mut pool = match WorkerPool::spawn(&settings.pool, settings.upload, connector) {
        Ok(pool) => pool,
        Err(e) => {
            error!("{e}");
            let _ = liveness.mark_dead();
            return Err(e).context("start upload workers");
        }
    };

    let outcome = watch_and_dispatch(settings, &pool, &liveness, shutdown);
    if let Err(e) = &outcome {
        error!("Watch loop stopped: {e:#}");
    }

    let remaining = pool.drain();
    debug!("Pool drained; {} outcome(s) left to report", remaining.len());
    for o in &remaining {
        report_outcome(o);
    }
    let dead = liveness.mark_dead();

    outcome?;
    dead.context("mark liveness dead")?;
    Ok(())
}

fn watch_and_dispatch(
    settings: &Settings,
    pool: &WorkerPool,
    liveness: &LivenessReporter,
    shutdown: &Receiver<()>,
) -> Result<()> {
    let watcher = DirectoryWatcher::subscribe(&settings.watch_dir, &settings.bucket)?;
    liveness.mark_ready().context("mark liveness ready")?;
    info!("Watching `{}` for core dumps.", settings.watch_dir.display());

    let mut backlog = SweepBacklog::new(settings.sweep_settle);
    if settings.sweep_existing {
        let existing = watcher.existing_dumps();
        info!("Sweeping {} dump(s) already present", existing.len());
        for task in backlog.admit(existing) {
            dispatch(pool, task)?;
        }
    }

    let recheck = tick(backlog.interval());
    let idle = never();
    loop {
        let settling = if backlog.is_empty() { &idle } else { &recheck };
        select! {
            recv(watcher.events()) -> batch => {
                let batch = batch.map_err(|_| WatchError::Closed {
                    path: watcher.directory().to_path_buf(),
                })?;
                for task in watcher.accept(batch)? {
                    backlog.forget(&task.file_name);
                    dispatch(pool, task)?;
                }
            }
            recv(settling) -> _ => {
                for task in backlog.recheck() {
                    dispatch(pool, task)?;
                }
            }
            recv(pool.completions()) -> outcome => match outcome {
                Ok(outcome) => report_outcome(&outcome),
                // Every slot is gone; nothing could run a new task.
                Err(_) => return Err(PoolError::Closed.into()),
            },
            recv(shutdown) -> _ => {
                info!("Shutdown requested; finishing in-flight uploads");
                return Ok(());
            }
        }
    }
}

fn dispatch(pool: &WorkerPool, task: UploadTask) -> Result<(), PoolError> {
    let name = task.file_name.clone();
    info!("Sending {name} to storage.");
    match pool.submit(task)? {
        Dispatch::Queued => debug!("{name} queued ({} in flight)", pool.in_flight()),
        Dispatch::AlreadyInFlight => warn!("{name} is already being uploaded; event ignored"),
    }
    Ok(())
}
