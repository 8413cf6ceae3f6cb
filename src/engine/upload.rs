//! Transfer one dump, confirm it, then remove the local copy.

use log::{error, info, warn};
use std::io;
use std::path::Path;

use crate::engine::confirm::confirm_upload;
use crate::error::UploadError;
use crate::store::ObjectStore;
use crate::{UploadSettings, remote_uri};

/// Object key for `file_path`: `explicit` when given, else the file's base name.
pub fn object_key_for(file_path: &Path, explicit: Option<&str>) -> Option<String> {
    match explicit {
        Some(key) if !key.is_empty() => Some(key.to_string()),
        _ => file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned()),
    }
}

fn fail(err: UploadError) -> Result<String, UploadError> {
    error!("{err}");
    Err(err)
}

/// Uploads files through one store. Cheap to build; a slot makes one per task.
pub struct ObjectUploader<'a> {
    store: &'a dyn ObjectStore,
    settings: &'a UploadSettings,
}

impl<'a> ObjectUploader<'a> {
    pub fn new(store: &'a dyn ObjectStore, settings: &'a UploadSettings) -> Self {
        Self { store, settings }
    }

    /// Upload `file_path` to `bucket` and return `storage://bucket/key`.
    ///
    /// The local file is removed only after the object has been seen in the store. Every
    /// error path leaves it in place. A file that vanished between confirmation and removal
    /// is treated as already removed.
    pub fn upload(
        &self,
        file_path: &Path,
        bucket: &str,
        object_key: Option<&str>,
    ) -> Result<String, UploadError> {
        let Some(key) = object_key_for(file_path, object_key) else {
            return fail(UploadError::InvalidPath {
                path: file_path.to_path_buf(),
            });
        };

        info!("Uploading {} to storage://{}.", file_path.display(), bucket);
        if let Err(source) = self.store.put_file(
            file_path,
            bucket,
            &key,
            self.settings.storage_class,
            &self.settings.multipart,
        ) {
            return fail(UploadError::Transfer {
                path: file_path.to_path_buf(),
                bucket: bucket.to_string(),
                key,
                source,
            });
        }
        info!("{key} upload done.");

        if let Err(source) = confirm_upload(self.store, bucket, &key, &self.settings.confirm) {
            return fail(UploadError::Confirm {
                path: file_path.to_path_buf(),
                source,
            });
        }

        match std::fs::remove_file(file_path) {
            Ok(()) => info!("Deleted {} from the filesystem.", file_path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("{} was already removed", file_path.display());
            }
            Err(source) => {
                return fail(UploadError::Delete {
                    path: file_path.to_path_buf(),
                    source,
                });
            }
        }
        Ok(remote_uri(bucket, &key))
    }
}
