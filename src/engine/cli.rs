//! CLI command handler: resolve settings once, install signal handling, run the supervisor.

use anyhow::Result;
use log::debug;
use std::path::Path;
use std::time::Duration;

use crate::Settings;
use crate::engine::arg_parser::Cli;
use crate::error::ConfigError;
use crate::pipeline::{install_signal_handler, run_supervisor, shutdown_channel};
use crate::store::connector_for;
use crate::utils::{
    EnvSnapshot, apply_file_to_settings, load_settings_file, resolve_level, setup_logging,
};

/// Build [`Settings`]: defaults, then the settings file, then the environment, then CLI flags.
pub fn resolve_settings(cli: &Cli, env: &EnvSnapshot) -> Result<Settings, ConfigError> {
    let mut settings = Settings::new(&cli.dir);

    if let Some(path) = &cli.config {
        let file = load_settings_file(path)?;
        apply_file_to_settings(&file, &mut settings);
    }

    if let Some(bucket) = &env.bucket {
        settings.bucket = bucket.clone();
    }
    if env.region.is_some() {
        settings.region = env.region.clone();
    }
    if env.endpoint.is_some() {
        settings.endpoint = env.endpoint.clone();
    }

    if let Some(bucket) = &cli.bucket {
        settings.bucket = bucket.clone();
    }
    if cli.region.is_some() {
        settings.region = cli.region.clone();
    }
    if cli.endpoint.is_some() {
        settings.endpoint = cli.endpoint.clone();
    }
    if cli.local_store.is_some() {
        settings.local_store = cli.local_store.clone();
    }
    if let Some(path) = &cli.liveness_file {
        settings.liveness_path = path.clone();
    }
    if let Some(n) = cli.workers {
        settings.pool.workers = n;
    }
    if let Some(n) = cli.max_tasks_per_worker {
        settings.pool.max_tasks_per_slot = n;
    }
    if let Some(secs) = cli.confirm_delay {
        settings.upload.confirm.delay = Duration::from_secs(secs);
    }
    if let Some(n) = cli.confirm_attempts {
        settings.upload.confirm.max_attempts = n;
    }
    if let Some(sweep) = cli.sweep {
        settings.sweep_existing = sweep;
    }
    if let Some(secs) = cli.sweep_settle {
        settings.sweep_settle = Duration::from_secs(secs);
    }

    settings.validate()?;
    Ok(settings)
}

/// Entry point behind `main`: runs until a termination signal or a fatal error.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let env = EnvSnapshot::capture(Path::new("."));
    setup_logging(resolve_level(
        cli.verbose.unwrap_or(false),
        env.log_level.as_deref(),
    ));

    let settings = resolve_settings(cli, &env)?;
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        settings
    );

    let connector = connector_for(&settings);
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    install_signal_handler(shutdown_tx)?;
    run_supervisor(&settings, connector, &shutdown_rx)
}
