//! Optional TOML settings file (`--config FILE`). Every key is optional; present keys override defaults.
//!
//! ```toml
//! [settings]
//! bucket = "crash-dumps"
//! region = "us-east-1"
//! workers = 4
//! confirm_delay_secs = 5
//! storage_class = "STANDARD_IA"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::{Settings, StorageClass};

#[derive(Debug, Default, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsSection {
    bucket: Option<String>,
    region: Option<String>,
    endpoint: Option<String>,
    local_store: Option<PathBuf>,
    liveness_file: Option<PathBuf>,
    sweep: Option<bool>,
    sweep_settle_secs: Option<u64>,
    workers: Option<usize>,
    max_tasks_per_worker: Option<usize>,
    queue_capacity: Option<usize>,
    confirm_delay_secs: Option<u64>,
    confirm_attempts: Option<u32>,
    multipart_threshold: Option<u64>,
    multipart_concurrency: Option<usize>,
    multipart_part_size: Option<u64>,
    storage_class: Option<StorageClass>,
}

/// Parse settings from TOML text. `path` is only used in the error.
pub fn parse_settings_file(text: &str, path: &Path) -> Result<SettingsFile, ConfigError> {
    toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse the settings file at `path`.
pub fn load_settings_file(path: &Path) -> Result<SettingsFile, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_settings_file(&text, path)
}

/// Overwrite a settings field from the file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $field:ident => $($target:ident).+) => {
        if let Some(v) = $sec.$field.clone() {
            $($target).+ = v;
        }
    };
}

/// Apply file values to `settings` (only fields present in the file). Call before env and CLI.
pub fn apply_file_to_settings(file: &SettingsFile, settings: &mut Settings) {
    let sec = &file.settings;
    apply_file_opt!(sec, bucket => settings.bucket);
    if sec.region.is_some() {
        settings.region = sec.region.clone();
    }
    if sec.endpoint.is_some() {
        settings.endpoint = sec.endpoint.clone();
    }
    if sec.local_store.is_some() {
        settings.local_store = sec.local_store.clone();
    }
    apply_file_opt!(sec, liveness_file => settings.liveness_path);
    apply_file_opt!(sec, sweep => settings.sweep_existing);
    if let Some(secs) = sec.sweep_settle_secs {
        settings.sweep_settle = Duration::from_secs(secs);
    }
    apply_file_opt!(sec, workers => settings.pool.workers);
    apply_file_opt!(sec, max_tasks_per_worker => settings.pool.max_tasks_per_slot);
    apply_file_opt!(sec, queue_capacity => settings.pool.queue_capacity);
    if let Some(secs) = sec.confirm_delay_secs {
        settings.upload.confirm.delay = Duration::from_secs(secs);
    }
    apply_file_opt!(sec, confirm_attempts => settings.upload.confirm.max_attempts);
    apply_file_opt!(sec, multipart_threshold => settings.upload.multipart.threshold);
    apply_file_opt!(sec, multipart_concurrency => settings.upload.multipart.max_concurrency);
    apply_file_opt!(sec, multipart_part_size => settings.upload.multipart.part_size);
    apply_file_opt!(sec, storage_class => settings.upload.storage_class);
}
