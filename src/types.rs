//! Public types shared by the watcher, the worker pool and the storage backends.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, UploadError};
use crate::utils::config::{
    ConfirmDefaults, DEFAULT_LIVENESS_PATH, MultipartDefaults, PoolDefaults, SweepDefaults,
};

/// One dump to ship. Built by the watcher for each qualifying event; owned by the slot that runs it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadTask {
    /// Base name of the dump inside `directory`.
    pub file_name: String,
    /// Watched directory the dump lives in.
    pub directory: PathBuf,
    /// Destination bucket.
    pub bucket: String,
}

impl UploadTask {
    pub fn new(file_name: impl Into<String>, directory: &Path, bucket: &str) -> Self {
        Self {
            file_name: file_name.into(),
            directory: directory.to_path_buf(),
            bucket: bucket.to_string(),
        }
    }

    /// Full path of the dump on local disk.
    pub fn file_path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Terminal result of one task, pushed by a slot onto the completion channel.
#[derive(Debug)]
pub struct TaskOutcome {
    pub task: UploadTask,
    /// Slot that ran the task.
    pub slot: usize,
    /// Remote URI (`storage://bucket/key`) on success.
    pub result: Result<String, UploadError>,
}

/// What [`WorkerPool::submit`](crate::pipeline::WorkerPool::submit) did with a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Handed to the queue; a slot will run it.
    Queued,
    /// A task for the same file name is queued or running; this one was dropped.
    AlreadyInFlight,
}

/// Storage class attached to uploaded objects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageClass {
    Standard,
    /// Infrequent access; the default for archived dumps.
    #[default]
    StandardIa,
    OnezoneIa,
    GlacierIr,
}

impl StorageClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageClass::Standard => "STANDARD",
            StorageClass::StandardIa => "STANDARD_IA",
            StorageClass::OnezoneIa => "ONEZONE_IA",
            StorageClass::GlacierIr => "GLACIER_IR",
        }
    }

    /// Parse a wire name. Unknown names return `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "STANDARD" => Some(StorageClass::Standard),
            "STANDARD_IA" => Some(StorageClass::StandardIa),
            "ONEZONE_IA" => Some(StorageClass::OnezoneIa),
            "GLACIER_IR" => Some(StorageClass::GlacierIr),
            _ => None,
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a backend knows about a stored object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectInfo {
    pub size: u64,
    pub storage_class: StorageClass,
}

/// Value of the liveness marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LivenessState {
    /// Marker absent; process is still coming up.
    Starting,
    Ready,
    Dead,
}

impl LivenessState {
    /// File content for this state. `Starting` has none: the marker is removed.
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            LivenessState::Starting => None,
            LivenessState::Ready => Some("started\n"),
            LivenessState::Dead => Some("dead\n"),
        }
    }
}

/// Build the URI returned for an uploaded object.
pub fn remote_uri(bucket: &str, key: &str) -> String {
    format!("storage://{bucket}/{key}")
}

/// How long and how often to poll for an uploaded object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfirmPolicy {
    /// Wait between checks. No wait follows the last check.
    pub delay: Duration,
    /// Total checks, at least 1.
    pub max_attempts: u32,
}

impl Default for ConfirmPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(ConfirmDefaults::DELAY_SECS),
            max_attempts: ConfirmDefaults::MAX_ATTEMPTS,
        }
    }
}

/// Multipart transfer tuning for large dumps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MultipartSettings {
    /// Files at or above this size (bytes) go multipart.
    pub threshold: u64,
    /// Parts uploaded concurrently.
    pub max_concurrency: usize,
    /// Minimum part size (bytes).
    pub part_size: u64,
}

impl Default for MultipartSettings {
    fn default() -> Self {
        Self {
            threshold: MultipartDefaults::THRESHOLD,
            max_concurrency: MultipartDefaults::MAX_CONCURRENCY,
            part_size: MultipartDefaults::PART_SIZE,
        }
    }
}

impl MultipartSettings {
    /// Part size for a file of `len` bytes: the configured size, grown so the upload never
    /// needs more than [`MultipartDefaults::MAX_PARTS`] parts.
    pub fn part_size_for(&self, len: u64) -> u64 {
        let floor = len.div_ceil(MultipartDefaults::MAX_PARTS);
        self.part_size.max(floor).max(1)
    }
}

/// What every upload needs besides the store itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UploadSettings {
    pub storage_class: StorageClass,
    pub confirm: ConfirmPolicy,
    pub multipart: MultipartSettings,
}

/// Worker pool sizing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Concurrent slots.
    pub workers: usize,
    /// Tasks a slot runs before its execution context is rebuilt.
    pub max_tasks_per_slot: usize,
    /// Queued tasks before `submit` blocks.
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: PoolDefaults::WORKERS,
            max_tasks_per_slot: PoolDefaults::MAX_TASKS_PER_SLOT,
            queue_capacity: PoolDefaults::QUEUE_CAPACITY,
        }
    }
}

/// Full process configuration, resolved once at startup and passed to each component.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Directory watched for dumps.
    pub watch_dir: PathBuf,
    /// Destination bucket. Required.
    pub bucket: String,
    /// Storage region. When None, the SDK's default chain decides.
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible stores (path-style addressing).
    pub endpoint: Option<String>,
    /// Upload into this directory instead of S3 (buckets are sub-directories).
    pub local_store: Option<PathBuf>,
    /// Liveness marker file.
    pub liveness_path: PathBuf,
    /// Dispatch dumps already in the directory once the watch is up.
    pub sweep_existing: bool,
    /// Swept dumps modified more recently than this wait for their close event or a re-check.
    pub sweep_settle: Duration,
    pub pool: PoolConfig,
    pub upload: UploadSettings,
}

impl Settings {
    /// Defaults for watching `watch_dir`. The bucket is left empty and must be filled in.
    pub fn new(watch_dir: &Path) -> Self {
        Self {
            watch_dir: watch_dir.to_path_buf(),
            bucket: String::new(),
            region: None,
            endpoint: None,
            local_store: None,
            liveness_path: PathBuf::from(DEFAULT_LIVENESS_PATH),
            sweep_existing: false,
            sweep_settle: Duration::from_secs(SweepDefaults::SETTLE_SECS),
            pool: PoolConfig::default(),
            upload: UploadSettings::default(),
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::MissingBucket);
        }
        let checks: [(&'static str, bool); 5] = [
            ("workers", self.pool.workers == 0),
            ("max_tasks_per_worker", self.pool.max_tasks_per_slot == 0),
            ("queue_capacity", self.pool.queue_capacity == 0),
            ("confirm_attempts", self.upload.confirm.max_attempts == 0),
            ("multipart_concurrency", self.upload.multipart.max_concurrency == 0),
        ];
        if let Some(&(field, _)) = checks.iter().find(|(_, zero)| *zero) {
            return Err(ConfigError::Invalid {
                field,
                reason: "must be at least 1",
            });
        }
        if self.upload.multipart.part_size < MultipartDefaults::MIN_PART_SIZE {
            return Err(ConfigError::Invalid {
                field: "multipart_part_size",
                reason: "must be at least 5 MiB",
            });
        }
        Ok(())
    }
}
