//! Upload worker pool: a fixed set of slot threads fed from one bounded queue, reporting on one
//! completion channel.
//!
//! Each slot owns its store (client, runtime, buffers). After `max_tasks_per_slot` tasks the
//! slot drops that store and builds a fresh one on its next task, so nothing a previous upload
//! allocated outlives it for long.

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use log::{debug, error, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::engine::ObjectUploader;
use crate::error::{PoolError, StoreError, UploadError};
use crate::pipeline::inflight::{InFlight, InFlightClaim};
use crate::pipeline::report::report_outcome;
use crate::store::{ObjectStore, StoreConnector};
use crate::{Dispatch, PoolConfig, TaskOutcome, UploadSettings, UploadTask};

/// A task plus its in-flight claim; the claim is released when the slot finishes with it.
struct QueuedTask {
    task: UploadTask,
    claim: InFlightClaim,
}

/// One execution slot and its recyclable context.
struct Slot {
    id: usize,
    max_tasks: usize,
    tasks_run: usize,
    generation: u64,
    store: Option<Box<dyn ObjectStore>>,
    upload: UploadSettings,
    connector: Arc<dyn StoreConnector>,
}

impl Slot {
    fn new(
        id: usize,
        max_tasks: usize,
        upload: UploadSettings,
        connector: Arc<dyn StoreConnector>,
    ) -> Self {
        Self {
            id,
            max_tasks: max_tasks.max(1),
            tasks_run: 0,
            generation: 0,
            store: None,
            upload,
            connector,
        }
    }

    /// Run tasks until the queue closes and is empty.
    fn run(mut self, tasks: Receiver<QueuedTask>, done: Sender<TaskOutcome>) {
        while let Ok(QueuedTask { task, claim }) = tasks.recv() {
            let result = self.execute(&task);
            drop(claim);
            if done
                .send(TaskOutcome {
                    task,
                    slot: self.id,
                    result,
                })
                .is_err()
            {
                debug!("slot {}: completion receiver gone", self.id);
            }
            self.recycle_if_spent();
        }
        debug!("slot {} exiting after {} generation(s)", self.id, self.generation + 1);
    }

    fn execute(&mut self, task: &UploadTask) -> Result<String, UploadError> {
        let path = task.file_path();
        let settings = self.upload;
        let store = match self.store() {
            Ok(store) => store,
            Err(source) => {
                let err = UploadError::Connect { path, source };
                error!("{err}");
                return Err(err);
            }
        };
        ObjectUploader::new(store, &settings).upload(&path, &task.bucket, None)
    }

    /// Current store, connecting first if this generation has none yet.
    fn store(&mut self) -> Result<&dyn ObjectStore, StoreError> {
        let store = match self.store.take() {
            Some(store) => store,
            None => {
                debug!("slot {}: connecting (generation {})", self.id, self.generation);
                self.connector.connect()?
            }
        };
        Ok(&**self.store.insert(store))
    }

    fn recycle_if_spent(&mut self) {
        self.tasks_run += 1;
        if self.tasks_run < self.max_tasks {
            return;
        }
        self.store = None;
        self.tasks_run = 0;
        self.generation += 1;
        debug!(
            "slot {}: recycled after {} task(s), now generation {}",
            self.id, self.max_tasks, self.generation
        );
    }
}

/// Fixed-size pool of upload slots.
pub struct WorkerPool {
    task_tx: Option<Sender<QueuedTask>>,
    done_rx: Receiver<TaskOutcome>,
    handles: Vec<JoinHandle<()>>,
    in_flight: InFlight,
}

impl WorkerPool {
    /// Start `config.workers` slot threads. Stores are connected lazily, per slot generation.
    pub fn spawn(
        config: &PoolConfig,
        upload: UploadSettings,
        connector: Arc<dyn StoreConnector>,
    ) -> Result<Self, PoolError> {
        let (task_tx, task_rx) = bounded::<QueuedTask>(config.queue_capacity.max(1));
        let (done_tx, done_rx) = unbounded::<TaskOutcome>();
        let mut handles = Vec::with_capacity(config.workers);
        for id in 0..config.workers.max(1) {
            let slot = Slot::new(id, config.max_tasks_per_slot, upload, Arc::clone(&connector));
            let task_rx = task_rx.clone();
            let done_tx = done_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("upload-{id}"))
                .spawn(move || slot.run(task_rx, done_tx))
                .map_err(|source| PoolError::Spawn { slot: id, source })?;
            handles.push(handle);
        }
        debug!(
            "Worker pool up: {} slot(s), {} task(s) per slot generation",
            handles.len(),
            config.max_tasks_per_slot.max(1)
        );
        Ok(Self {
            task_tx: Some(task_tx),
            done_rx,
            handles,
            in_flight: InFlight::new(),
        })
    }

    /// Queue `task` for a slot. Never runs it on the caller's thread; blocks only when the queue
    /// is full. A task whose file is already queued or uploading is dropped.
    pub fn submit(&self, task: UploadTask) -> Result<Dispatch, PoolError> {
        let Some(task_tx) = &self.task_tx else {
            return Err(PoolError::Closed);
        };
        let Some(claim) = self.in_flight.claim(&task.file_name) else {
            return Ok(Dispatch::AlreadyInFlight);
        };
        task_tx
            .send(QueuedTask { task, claim })
            .map_err(|_| PoolError::Closed)?;
        Ok(Dispatch::Queued)
    }

    /// Completion channel: one [`TaskOutcome`] per submitted task.
    pub fn completions(&self) -> &Receiver<TaskOutcome> {
        &self.done_rx
    }

    /// Number of files currently queued or uploading.
    pub fn in_flight(&self) -> usize {
        self.in_flight.count()
    }

    /// Close the queue, wait for every queued and running task, and return the outcomes not yet
    /// taken from [`completions`](Self::completions). Later calls return nothing.
    pub fn drain(&mut self) -> Vec<TaskOutcome> {
        drop(self.task_tx.take());
        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("upload").to_string();
            if handle.join().is_err() {
                warn!("{name} panicked; its task outcome is lost");
            }
        }
        // Every slot has exited, so every completion sender is gone.
        self.done_rx.try_iter().collect()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.task_tx.is_some() {
            for outcome in self.drain() {
                report_outcome(&outcome);
            }
        }
    }
}
