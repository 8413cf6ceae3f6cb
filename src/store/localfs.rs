//! Local directory backend. Buckets are sub-directories of `root` and must already exist,
//! the way a remote bucket must. Objects become visible atomically (write to a temp name, rename);
//! a failed write leaves nothing behind.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::store::ObjectStore;
use crate::{MultipartSettings, ObjectInfo, StorageClass};

/// Per-bucket directory holding one storage-class file per object key.
const META_DIR: &str = ".coredrain-meta";

pub struct LocalFsStore {
    root: PathBuf,
}

fn io_err<'a>(
    operation: &'static str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> StoreError + 'a {
    move |source| StoreError::Io {
        operation,
        path: path.to_path_buf(),
        source,
    }
}

impl LocalFsStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Create `bucket` under the root (setup helper; `put_file` never creates buckets).
    pub fn create_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        let dir = self.root.join(bucket);
        fs::create_dir_all(&dir).map_err(io_err("create bucket", &dir))
    }

    /// Keys stored in `bucket`, sorted. Empty when the bucket does not exist.
    pub fn list(&self, bucket: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.root.join(bucket);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in walkdir::WalkDir::new(&dir).min_depth(1) {
            let entry = entry.map_err(|e| StoreError::Io {
                operation: "list",
                path: dir.clone(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&dir) else {
                continue;
            };
            let key = rel.to_string_lossy().replace('\\', "/");
            if key.starts_with(META_DIR) || key.ends_with(".part") {
                continue;
            }
            keys.push(key);
        }
        keys.sort();
        Ok(keys)
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, StoreError> {
        let dir = self.root.join(bucket);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(StoreError::NoSuchBucket {
                bucket: bucket.to_string(),
            })
        }
    }

    fn meta_path(bucket_dir: &Path, key: &str) -> PathBuf {
        bucket_dir.join(META_DIR).join(key)
    }

    fn copy_into(src: &mut File, tmp: &Path) -> Result<(), StoreError> {
        let mut out = File::create(tmp).map_err(io_err("create", tmp))?;
        io::copy(src, &mut out).map_err(io_err("write", tmp))?;
        out.sync_all().map_err(io_err("sync", tmp))
    }
}

impl ObjectStore for LocalFsStore {
    fn put_file(
        &self,
        path: &Path,
        bucket: &str,
        key: &str,
        storage_class: StorageClass,
        _multipart: &MultipartSettings,
    ) -> Result<(), StoreError> {
        let bucket_dir = self.bucket_dir(bucket)?;
        let mut src = File::open(path).map_err(io_err("open", path))?;

        let dest = bucket_dir.join(key);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(io_err("create", parent))?;
        }
        let tmp = dest.with_file_name(format!(
            "{}.part",
            dest.file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default()
        ));
        let placed = Self::copy_into(&mut src, &tmp)
            .and_then(|()| fs::rename(&tmp, &dest).map_err(io_err("rename", &dest)));
        if let Err(e) = placed {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        // Storage class is recorded only once the object itself is in place.

        let meta = Self::meta_path(&bucket_dir, key);
        if let Some(parent) = meta.parent() {
            fs::create_dir_all(parent).map_err(io_err("create", parent))?;
        }
        fs::write(&meta, storage_class.as_str()).map_err(io_err("write", &meta))?;
        Ok(())
    }

    fn stat(&self, bucket: &str, key: &str) -> Result<Option<ObjectInfo>, StoreError> {
        let bucket_dir = self.root.join(bucket);
        let path = bucket_dir.join(key);
        let meta = match fs::metadata(&path) {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err("stat", &path)(e)),
        };
        let storage_class = fs::read_to_string(Self::meta_path(&bucket_dir, key))
            .ok()
            .and_then(|s| StorageClass::parse(&s))
            .unwrap_or(StorageClass::Standard);
        Ok(Some(ObjectInfo {
            size: meta.len(),
            storage_class,
        }))
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        let bucket_dir = self.bucket_dir(bucket)?;
        for path in [bucket_dir.join(key), Self::meta_path(&bucket_dir, key)] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_err("delete", &path)(e)),
            }
        }
        Ok(())
    }
}
