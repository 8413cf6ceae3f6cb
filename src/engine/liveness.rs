//! Startup/liveness marker read by the orchestrator's probes.
//!
//! Absent while starting, `started\n` once the watch is live, `dead\n` after the loop ends.

use log::{debug, error};
use std::io;
use std::path::{Path, PathBuf};

use crate::LivenessState;
use crate::error::LivenessError;

pub struct LivenessReporter {
    path: PathBuf,
}

impl LivenessReporter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Clear a marker left by a previous run so probes cannot pass before this run is ready.
    pub fn mark_starting(&self) -> Result<(), LivenessError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Cleared stale liveness marker {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                let err = LivenessError::Clear {
                    path: self.path.clone(),
                    source,
                };
                error!("{err}");
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn mark_ready(&self) -> Result<(), LivenessError> {
        self.write(LivenessState::Ready)
    }

    pub fn mark_dead(&self) -> Result<(), LivenessError> {
        self.write(LivenessState::Dead)
    }

    /// State as currently persisted. Unknown content reads as `None`.
    pub fn current(&self) -> Option<LivenessState> {
        match std::fs::read_to_string(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Some(LivenessState::Starting),
            Err(_) => None,
            Ok(s) => [LivenessState::Ready, LivenessState::Dead]
                .into_iter()
                .find(|state| state.marker() == Some(s.as_str())),
        }
    }

    fn write(&self, state: LivenessState) -> Result<(), LivenessError> {
        let Some(content) = state.marker() else {
            return self.mark_starting();
        };
        std::fs::write(&self.path, content).map_err(|source| {
            let err = LivenessError::Write {
                path: self.path.clone(),
                source,
            };
            error!("{err}");
            err
        })?;
        debug!("Liveness marker {} set to {:?}", self.path.display(), state);
        Ok(())
    }
}
