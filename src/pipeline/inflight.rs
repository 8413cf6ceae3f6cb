//! Registry of dump names currently queued or uploading, so one file is never uploaded twice at
//! once. Names are unique because the watch covers a single directory.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Debug, Default)]
pub struct InFlight {
    names: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked mid-insert.
        self.names.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim `file_name`. `None` when it is already claimed. The claim is released on drop.
    pub fn claim(&self, file_name: &str) -> Option<InFlightClaim> {
        if !self.lock().insert(file_name.to_string()) {
            return None;
        }
        Some(InFlightClaim {
            registry: self.clone(),
            file_name: file_name.to_string(),
        })
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }
}

/// Held by a queued task until it finishes.
#[derive(Debug)]
pub struct InFlightClaim {
    registry: InFlight,
    file_name: String,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.file_name);
    }
}
