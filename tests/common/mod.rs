//! Shared test fixtures: store doubles, dump files, a capturing logger.

#![allow(dead_code)]

use coredrain::error::StoreError;
use coredrain::store::{LocalFsStore, ObjectStore};
use coredrain::{ConfirmPolicy, MultipartSettings, ObjectInfo, StorageClass, UploadSettings};
use crossbeam_channel::Receiver;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// --- fixtures ---

/// Upload settings with a short confirmation delay.
pub fn fast_settings(max_attempts: u32) -> UploadSettings {
    UploadSettings {
        confirm: ConfirmPolicy {
            delay: Duration::from_millis(10),
            max_attempts,
        },
        ..Default::default()
    }
}

/// Local store rooted at `root` with `buckets` created.
pub fn local_store(root: &Path, buckets: &[&str]) -> LocalFsStore {
    let store = LocalFsStore::new(root);
    for bucket in buckets {
        store.create_bucket(bucket).unwrap();
    }
    store
}

pub fn write_dump(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, "test\n").unwrap();
    path
}

/// Set the mtime of `path` to `secs` seconds ago.
pub fn backdate(path: &Path, secs: u64) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(std::time::SystemTime::now() - Duration::from_secs(secs))
        .unwrap();
}

/// Poll `cond` until true or `timeout` passes.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    cond()
}

// --- store doubles ---

/// Accepts every put but never shows the object. Counts existence checks.
pub struct InvisibleStore {
    pub inner: LocalFsStore,
    pub checks: Arc<AtomicUsize>,
}

impl ObjectStore for InvisibleStore {
    fn put_file(
        &self,
        path: &Path,
        bucket: &str,
        key: &str,
        storage_class: StorageClass,
        multipart: &MultipartSettings,
    ) -> Result<(), StoreError> {
        self.inner
            .put_file(path, bucket, key, storage_class, multipart)
    }

    fn stat(&self, _bucket: &str, _key: &str) -> Result<Option<ObjectInfo>, StoreError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.inner.delete_object(bucket, key)
    }
}

/// Object becomes visible on check number `visible_on` (1-based).
pub struct LaggingStore {
    pub inner: LocalFsStore,
    pub checks: Arc<AtomicUsize>,
    pub visible_on: usize,
}

impl ObjectStore for LaggingStore {
    fn put_file(
        &self,
        path: &Path,
        bucket: &str,
        key: &str,
        storage_class: StorageClass,
        multipart: &MultipartSettings,
    ) -> Result<(), StoreError> {
        self.inner
            .put_file(path, bucket, key, storage_class, multipart)
    }

    fn stat(&self, bucket: &str, key: &str) -> Result<Option<ObjectInfo>, StoreError> {
        let n = self.checks.fetch_add(1, Ordering::SeqCst) + 1;
        if n < self.visible_on {
            return Ok(None);
        }
        self.inner.stat(bucket, key)
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.inner.delete_object(bucket, key)
    }
}

/// Existence checks always fail with a backend error.
pub struct BrokenCheckStore {
    pub inner: LocalFsStore,
    pub checks: Arc<AtomicUsize>,
}

impl ObjectStore for BrokenCheckStore {
    fn put_file(
        &self,
        path: &Path,
        bucket: &str,
        key: &str,
        storage_class: StorageClass,
        multipart: &MultipartSettings,
    ) -> Result<(), StoreError> {
        self.inner
            .put_file(path, bucket, key, storage_class, multipart)
    }

    fn stat(&self, _bucket: &str, _key: &str) -> Result<Option<ObjectInfo>, StoreError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Backend {
            operation: "head object",
            message: "connection reset".to_string(),
        })
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.inner.delete_object(bucket, key)
    }
}

/// Blocks each put until a message arrives on `gate`.
pub struct GatedStore {
    pub inner: LocalFsStore,
    pub gate: Receiver<()>,
}

impl ObjectStore for GatedStore {
    fn put_file(
        &self,
        path: &Path,
        bucket: &str,
        key: &str,
        storage_class: StorageClass,
        multipart: &MultipartSettings,
    ) -> Result<(), StoreError> {
        let _ = self.gate.recv_timeout(Duration::from_secs(10));
        self.inner
            .put_file(path, bucket, key, storage_class, multipart)
    }

    fn stat(&self, bucket: &str, key: &str) -> Result<Option<ObjectInfo>, StoreError> {
        self.inner.stat(bucket, key)
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.inner.delete_object(bucket, key)
    }
}

// --- log capture ---

struct CaptureLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    records: Mutex::new(Vec::new()),
};

/// Route `log` records into memory. Safe to call from every test.
pub fn capture_logs() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Trace);
    }
}

/// Captured messages at `level`.
pub fn logged(level: Level) -> Vec<String> {
    LOGGER
        .records
        .lock()
        .map(|r| {
            r.iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, m)| m.clone())
                .collect()
        })
        .unwrap_or_default()
}
