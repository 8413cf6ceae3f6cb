//! Directory watcher: write-close notifications on one directory, filtered down to dump files.

use crossbeam_channel::{Receiver, unbounded};
use log::{debug, info, warn};
use notify::event::{AccessKind, AccessMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::UploadTask;
use crate::error::WatchError;
use crate::utils::config::DUMP_PREFIX;

/// One message from the notification backend.
pub type WatchBatch = notify::Result<Event>;

/// True only for "a file opened for writing was closed". Anything earlier may still be mid-write.
pub fn is_write_close(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Access(AccessKind::Close(AccessMode::Write)))
}

/// True for names the crash producer uses for dumps.
pub fn is_dump_name(name: &str) -> bool {
    name.starts_with(DUMP_PREFIX)
}

/// Tasks for one event: one per dump path when the event is a write-close, none otherwise.
/// Names that are not valid UTF-8 are skipped.
pub fn tasks_from_event(event: &Event, directory: &Path, bucket: &str) -> Vec<UploadTask> {
    if !is_write_close(&event.kind) {
        return Vec::new();
    }
    event
        .paths
        .iter()
        .filter_map(|p| p.file_name())
        .filter_map(|n| match n.to_str() {
            Some(s) => Some(s),
            None => {
                debug!("Skipping non UTF-8 file name {:?}", n);
                None
            }
        })
        .filter(|n| is_dump_name(n))
        .map(|n| UploadTask::new(n, directory, bucket))
        .collect()
}

/// Live subscription on one directory (non-recursive).
///
/// Used two ways: the supervisor multiplexes [`events`](Self::events) with other channels and
/// feeds each batch to [`accept`](Self::accept); as an [`Iterator`] it is the blocking, lazy
/// task sequence. Either way the first error is terminal: the iterator yields it once and then
/// ends for good.
pub struct DirectoryWatcher {
    directory: PathBuf,
    bucket: String,
    events: Receiver<WatchBatch>,
    pending: VecDeque<UploadTask>,
    finished: bool,
    // Dropping the watcher ends the subscription; keep it for our lifetime.
    _watcher: RecommendedWatcher,
}

impl DirectoryWatcher {
    /// Subscribe to `directory`. Fails when it is missing or unreadable.
    pub fn subscribe(directory: &Path, bucket: &str) -> Result<Self, WatchError> {
        let setup = |source| WatchError::Setup {
            path: directory.to_path_buf(),
            source,
        };
        let (tx, rx) = unbounded::<WatchBatch>();
        let mut watcher = notify::recommended_watcher(move |batch: WatchBatch| {
            let _ = tx.send(batch);
        })
        .map_err(setup)?;
        watcher
            .watch(directory, RecursiveMode::NonRecursive)
            .map_err(setup)?;
        info!("Subscribed to write-close events in {}", directory.display());
        Ok(Self {
            directory: directory.to_path_buf(),
            bucket: bucket.to_string(),
            events: rx,
            pending: VecDeque::new(),
            finished: false,
            _watcher: watcher,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Raw notification stream, for `select!`.
    pub fn events(&self) -> &Receiver<WatchBatch> {
        &self.events
    }

    /// Turn one notification into tasks. A backend error is a [`WatchError::Read`].
    pub fn accept(&self, batch: WatchBatch) -> Result<Vec<UploadTask>, WatchError> {
        let event = batch.map_err(|source| WatchError::Read {
            path: self.directory.clone(),
            source,
        })?;
        Ok(tasks_from_event(&event, &self.directory, &self.bucket))
    }

    /// Dumps already sitting in the directory (regular files only), sorted by name.
    pub fn existing_dumps(&self) -> Vec<UploadTask> {
        let mut tasks = Vec::new();
        for entry in walkdir::WalkDir::new(&self.directory)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Sweep of {} skipped an entry: {}", self.directory.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str()
                && is_dump_name(name)
            {
                tasks.push(UploadTask::new(name, &self.directory, &self.bucket));
            }
        }
        tasks
    }
}

impl Iterator for DirectoryWatcher {
    type Item = Result<UploadTask, WatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(task) = self.pending.pop_front() {
                return Some(Ok(task));
            }
            if self.finished {
                return None;
            }
            let next = match self.events.recv() {
                Ok(batch) => self.accept(batch),
                Err(_) => Err(WatchError::Closed {
                    path: self.directory.clone(),
                }),
            };
            match next {
                Ok(tasks) => self.pending.extend(tasks),
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
