//! Object store adapters.
//!
//! Submodules:
//! - `s3`: S3 / S3-compatible backend on `aws-sdk-s3`
//! - `localfs`: directory-tree backend for dry runs and tests
//!
//! The pipeline only needs put / exists / delete. Backends are blocking from the caller's side;
//! each upload slot owns its own store instance, created through a [`StoreConnector`].

pub mod localfs;
pub mod s3;

use std::path::Path;
use std::sync::Arc;

use crate::error::StoreError;
use crate::{MultipartSettings, ObjectInfo, StorageClass};

pub use localfs::LocalFsStore;
pub use s3::{S3Connector, S3Store};

/// Durable blob store as seen by the uploader.
pub trait ObjectStore: Send {
    /// Transfer the whole file at `path` to `(bucket, key)` with `storage_class`.
    /// Returning `Ok` means the store acknowledged the write, not that it is visible yet.
    fn put_file(
        &self,
        path: &Path,
        bucket: &str,
        key: &str,
        storage_class: StorageClass,
        multipart: &MultipartSettings,
    ) -> Result<(), StoreError>;

    /// Metadata for `(bucket, key)`, or `None` if the object is not (yet) visible.
    fn stat(&self, bucket: &str, key: &str) -> Result<Option<ObjectInfo>, StoreError>;

    fn exists(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        Ok(self.stat(bucket, key)?.is_some())
    }

    /// Remove `(bucket, key)`. Removing a missing object is not an error.
    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError>;
}

/// Builds a fresh store for a worker slot. Called once per slot generation.
pub trait StoreConnector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn ObjectStore>, StoreError>;
}

impl<F> StoreConnector for F
where
    F: Fn() -> Result<Box<dyn ObjectStore>, StoreError> + Send + Sync,
{
    fn connect(&self) -> Result<Box<dyn ObjectStore>, StoreError> {
        self()
    }
}

/// Pick the backend for the resolved settings: local directory when configured, S3 otherwise.
pub fn connector_for(settings: &crate::Settings) -> Arc<dyn StoreConnector> {
    match &settings.local_store {
        Some(root) => {
            let root = root.clone();
            Arc::new(move || -> Result<Box<dyn ObjectStore>, StoreError> {
                Ok(Box::new(LocalFsStore::new(&root)))
            })
        }
        None => Arc::new(S3Connector::new(
            settings.region.clone(),
            settings.endpoint.clone(),
        )),
    }
}
