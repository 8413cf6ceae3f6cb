//! coredrain: watch a directory for finished core dumps, ship each to object storage, and delete
//! it locally only once the store confirms it has the object.
//!
//! - [`pipeline`]: directory watcher, worker pool, supervisor loop
//! - [`engine`]: upload / confirm / liveness operations and the CLI
//! - [`store`]: S3 and local-directory backends

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod store;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

use std::path::Path;

/// Upload one file through `store` with `settings` and return its `storage://` URI.
///
/// Same protocol the workers run: transfer, confirm, then delete the local file.
/// `object_key: None` uses the file's base name.
pub fn upload_file(
    store: &dyn store::ObjectStore,
    settings: &UploadSettings,
    file_path: &Path,
    bucket: &str,
    object_key: Option<&str>,
) -> Result<String, error::UploadError> {
    engine::ObjectUploader::new(store, settings).upload(file_path, bucket, object_key)
}
