//! Error types for coredrain.
//!
//! Per-task failures (`StoreError`, `UploadError`, `ConfirmError`) stay inside the worker that
//! hit them and travel to the supervisor as a task outcome. Loop-level failures (`WatchError`,
//! `LivenessError`, `PoolError`) end the process after the pool has been drained.
//!
//! Messages carry the path, bucket and key involved so that a single log line is enough to
//! find the dump again.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by an [`ObjectStore`](crate::store::ObjectStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Target bucket does not exist (or is not visible with these credentials).
    #[error("bucket {bucket} does not exist")]
    NoSuchBucket { bucket: String },

    /// Local I/O failed while reading the source or writing a local-store object.
    #[error("{operation} {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Remote call failed (credentials, network, service error).
    #[error("{operation} failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },

    /// Runtime for the async storage client could not be built.
    #[error("cannot start storage runtime: {0}")]
    Runtime(#[source] io::Error),
}

/// Confirmation polling failed.
#[derive(Error, Debug)]
pub enum ConfirmError {
    /// Object never became visible within the attempt budget.
    #[error("storage://{bucket}/{key} not visible after {attempts} attempts")]
    Exhausted {
        bucket: String,
        key: String,
        attempts: u32,
    },

    /// Existence check itself failed.
    #[error("existence check for storage://{bucket}/{key} failed: {source}")]
    Check {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },
}

/// Failure of one upload task. The local dump is still on disk for every variant.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("cannot derive an object key from {}", path.display())]
    InvalidPath { path: PathBuf },

    #[error("no storage client for {}: {source}", path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("failed to upload {} to storage://{bucket}/{key}: {source}", path.display())]
    Transfer {
        path: PathBuf,
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("upload of {} not confirmed: {source}", path.display())]
    Confirm {
        path: PathBuf,
        #[source]
        source: ConfirmError,
    },

    /// Object is durable but the local file could not be removed.
    #[error("uploaded {} but could not delete it: {source}", path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Directory watch failures. Both are fatal; there is no resubscription.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("cannot watch {}: {source}", path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("reading watch events for {} failed: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("watch on {} closed unexpectedly", path.display())]
    Closed { path: PathBuf },
}

/// Liveness marker could not be written or cleared.
#[derive(Error, Debug)]
pub enum LivenessError {
    #[error("cannot write liveness marker {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot clear liveness marker {}: {source}", path.display())]
    Clear {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Worker pool errors.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("cannot spawn upload worker {slot}: {source}")]
    Spawn {
        slot: usize,
        #[source]
        source: io::Error,
    },

    /// Task queue has no live workers (pool drained or every slot exited).
    #[error("worker pool is closed")]
    Closed,
}

/// Settings could not be resolved.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no bucket configured: set BUCKET_NAME, --bucket, or `bucket` in the settings file")]
    MissingBucket,

    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },

    #[error("cannot read settings file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse settings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
