//! Shutdown signalling for the supervisor loop.

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, bounded};
use log::info;

/// Channel the supervisor watches for a stop request. Keep the sender alive for as long as the
/// loop should run: a dropped sender reads as a stop request.
pub fn shutdown_channel() -> (Sender<()>, Receiver<()>) {
    bounded(1)
}

/// Route SIGINT / SIGTERM to `tx`. Repeated signals while one is pending are ignored.
pub fn install_signal_handler(tx: Sender<()>) -> Result<()> {
    ctrlc::set_handler(move || {
        info!("Termination signal received");
        let _ = tx.try_send(());
    })
    .context("set SIGINT/SIGTERM handler")
}
