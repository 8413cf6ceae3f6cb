//! Environment snapshot: process env, then `.env` in the working directory.

use log::debug;
use std::path::Path;

use crate::utils::config::EnvKeys;

/// Values read from the environment at startup. Nothing reads the environment after this.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub log_level: Option<String>,
}

fn non_empty(key: &str) -> Option<String> {
    let s = std::env::var(key).ok()?;
    let s = s.trim().to_string();
    (!s.is_empty()).then_some(s)
}

impl EnvSnapshot {
    /// Load `.env` from `dir` if present (never overriding variables already set), then read
    /// every key once.
    pub fn capture(dir: &Path) -> Self {
        let env_path = dir.join(".env");
        if env_path.is_file() {
            match dotenvy::from_path(&env_path) {
                Ok(()) => debug!("Loaded {}", env_path.display()),
                Err(e) => log::warn!("{}: {}", env_path.display(), e),
            }
        }
        Self {
            bucket: non_empty(EnvKeys::BUCKET),
            region: non_empty(EnvKeys::REGION),
            endpoint: non_empty(EnvKeys::ENDPOINT),
            log_level: non_empty(EnvKeys::LOG_LEVEL),
        }
    }
}
