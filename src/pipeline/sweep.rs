//! Startup sweep of dumps that were already in the directory when the watch came up.
//!
//! A pre-existing file may still be open for writing by the crashing process, and no event
//! says so. A file is only shipped once it has not been modified for the settle window and
//! its size held steady since the last look. Anything younger is parked here and re-checked;
//! a close event for a parked name hands it back to the normal event path.

use log::{debug, info};
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::UploadTask;

/// Size and age of a dump on disk, or `None` once it is gone.
fn look(path: &Path) -> Option<(u64, Duration)> {
    let meta = fs::metadata(path).ok()?;
    let age = meta
        .modified()
        .ok()
        .and_then(|mtime| SystemTime::now().duration_since(mtime).ok())
        .unwrap_or(Duration::ZERO);
    Some((meta.len(), age))
}

struct Parked {
    task: UploadTask,
    size: u64,
}

/// Swept dumps that were too fresh to ship.
pub struct SweepBacklog {
    settle: Duration,
    parked: Vec<Parked>,
}

impl SweepBacklog {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            parked: Vec::new(),
        }
    }

    /// How often [`recheck`](Self::recheck) is worth calling.
    pub fn interval(&self) -> Duration {
        self.settle.max(Duration::from_millis(100))
    }

    pub fn is_empty(&self) -> bool {
        self.parked.is_empty()
    }

    /// Return the swept dumps that are safe to ship now and park the rest.
    pub fn admit(&mut self, tasks: Vec<UploadTask>) -> Vec<UploadTask> {
        let mut ready = Vec::new();
        for task in tasks {
            let Some((size, age)) = look(&task.file_path()) else {
                continue;
            };
            if age >= self.settle {
                ready.push(task);
            } else {
                info!(
                    "{} was modified {:?} ago; waiting for it to settle",
                    task.file_name, age
                );
                self.parked.push(Parked { task, size });
            }
        }
        ready
    }

    /// Release parked dumps that have settled. Vanished files are dropped.
    pub fn recheck(&mut self) -> Vec<UploadTask> {
        let mut ready = Vec::new();
        let settle = self.settle;
        self.parked.retain_mut(|p| match look(&p.task.file_path()) {
            None => {
                debug!("{} vanished before it settled", p.task.file_name);
                false
            }
            Some((size, age)) if age >= settle && size == p.size => {
                ready.push(p.task.clone());
                false
            }
            Some((size, _)) => {
                p.size = size;
                true
            }
        });
        ready
    }

    /// Stop tracking `file_name`: its write-close event arrived and took over.
    pub fn forget(&mut self, file_name: &str) {
        self.parked.retain(|p| p.task.file_name != file_name);
    }
}
