//! Completion logging: the supervisor's only use of a task's result.

use log::{error, info};

use crate::TaskOutcome;

/// Log one finished task: the remote URI on success, the error otherwise.
pub fn report_outcome(outcome: &TaskOutcome) {
    match &outcome.result {
        Ok(uri) => info!("{uri}"),
        Err(e) => error!(
            "Upload of {} failed on slot {}: {}",
            outcome.task.file_path().display(),
            outcome.slot,
            e
        ),
    }
}
