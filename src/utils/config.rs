//! Application configuration constants.
//! Defaults and environment keys in one place.

// ---- Watch ----

/// Only files whose name starts with this are treated as dumps.
pub const DUMP_PREFIX: &str = "core";

/// Where the liveness marker lives unless overridden.
pub const DEFAULT_LIVENESS_PATH: &str = "/coredrain/startupcheck";

// ---- Startup sweep ----

/// Settling of dumps found by the startup sweep.
pub struct SweepDefaults;

impl SweepDefaults {
    /// Seconds a pre-existing dump must go unmodified before it is shipped without a close event.
    pub const SETTLE_SECS: u64 = 30;
}

// ---- Worker pool ----

/// Worker pool sizing.
pub struct PoolDefaults;

impl PoolDefaults {
    /// Concurrent upload slots. Kept small so the sidecar does not starve the host it protects.
    pub const WORKERS: usize = 4;
    /// Tasks a slot runs before its storage client and runtime are rebuilt.
    pub const MAX_TASKS_PER_SLOT: usize = 1;
    /// Tasks that may wait for a free slot before `submit` blocks the watch loop.
    pub const QUEUE_CAPACITY: usize = 1024;
}

// ---- Confirmation ----

/// Existence polling after a transfer.
pub struct ConfirmDefaults;

impl ConfirmDefaults {
    /// Seconds between existence checks.
    pub const DELAY_SECS: u64 = 5;
    pub const MAX_ATTEMPTS: u32 = 5;
}

// ---- Multipart ----

/// Multipart transfer tuning. Only affects throughput for large dumps.
pub struct MultipartDefaults;

impl MultipartDefaults {
    /// Files at or above this size (bytes) use multipart. 100 MB.
    pub const THRESHOLD: u64 = 100 * 1024 * 1024;
    /// Parts in flight at once per upload.
    pub const MAX_CONCURRENCY: usize = 20;
    /// Starting part size (bytes). 8 MB.
    pub const PART_SIZE: u64 = 8 * 1024 * 1024;
    /// Smallest part S3 accepts for every part but the last. 5 MB.
    pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;
    /// Hard S3 limit on parts per upload; part size grows to stay under it.
    pub const MAX_PARTS: u64 = 10_000;
}

// ---- Environment ----

/// Environment variables read once at startup.
pub struct EnvKeys;

impl EnvKeys {
    pub const BUCKET: &'static str = "BUCKET_NAME";
    pub const REGION: &'static str = "REGION";
    pub const ENDPOINT: &'static str = "S3_ENDPOINT";
    pub const LOG_LEVEL: &'static str = "LOGLEVEL";
}
