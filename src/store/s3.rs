//! S3 backend on `aws-sdk-s3`: single-request put for small dumps, concurrent multipart for large ones.
//!
//! The SDK is async; each store owns a current-thread tokio runtime and blocks on it, so one
//! store serves exactly one worker slot and is dropped with it when the slot recycles.

use std::io;
use std::path::Path;

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::{ByteStream, Length};
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use log::{debug, warn};
use tokio::runtime::Runtime;
use tokio::sync::Semaphore;

use crate::error::StoreError;
use crate::store::{ObjectStore, StoreConnector};
use crate::{MultipartSettings, ObjectInfo, StorageClass};

/// Map an SDK failure to a [`StoreError`], recognising a missing bucket.
fn classify<E, R>(operation: &'static str, bucket: &str, err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    if err.as_service_error().and_then(|e| e.code()) == Some("NoSuchBucket") {
        return StoreError::NoSuchBucket {
            bucket: bucket.to_string(),
        };
    }
    StoreError::Backend {
        operation,
        message: DisplayErrorContext(&err).to_string(),
    }
}

fn read_err<E>(operation: &'static str, path: &Path, err: E) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StoreError::Io {
        operation,
        path: path.to_path_buf(),
        source: io::Error::other(err),
    }
}

/// Creates an [`S3Store`] per slot generation.
#[derive(Clone, Debug, Default)]
pub struct S3Connector {
    region: Option<String>,
    endpoint: Option<String>,
}

impl S3Connector {
    pub fn new(region: Option<String>, endpoint: Option<String>) -> Self {
        Self { region, endpoint }
    }
}

impl StoreConnector for S3Connector {
    fn connect(&self) -> Result<Box<dyn ObjectStore>, StoreError> {
        let store = S3Store::connect(self.region.as_deref(), self.endpoint.as_deref())?;
        Ok(Box::new(store))
    }
}

pub struct S3Store {
    runtime: Runtime,
    client: Client,
}

impl S3Store {
    /// Build a runtime and a client. Credentials come from the SDK's default provider chain.
    pub fn connect(region: Option<&str>, endpoint: Option<&str>) -> Result<Self, StoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(StoreError::Runtime)?;
        let client = runtime.block_on(build_client(region, endpoint));
        debug!(
            "S3 client ready (region: {}, endpoint: {})",
            region.unwrap_or("<default>"),
            endpoint.unwrap_or("<default>")
        );
        Ok(Self { runtime, client })
    }

    async fn put_single(
        &self,
        path: &Path,
        bucket: &str,
        key: &str,
        storage_class: StorageClass,
    ) -> Result<(), StoreError> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| read_err("read", path, e))?;
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .storage_class(storage_class.as_str().into())
            .body(body)
            .send()
            .await
            .map_err(|e| classify("put object", bucket, e))?;
        Ok(())
    }

    async fn put_multipart(
        &self,
        path: &Path,
        bucket: &str,
        key: &str,
        storage_class: StorageClass,
        len: u64,
        multipart: &MultipartSettings,
    ) -> Result<(), StoreError> {
        let create = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .storage_class(storage_class.as_str().into())
            .send()
            .await
            .map_err(|e| classify("create multipart upload", bucket, e))?;
        let upload_id = create
            .upload_id()
            .ok_or_else(|| StoreError::Backend {
                operation: "create multipart upload",
                message: "response carried no upload id".to_string(),
            })?
            .to_string();

        let parts = match self
            .upload_parts(path, bucket, key, &upload_id, len, multipart)
            .await
        {
            Ok(parts) => parts,
            Err(e) => {
                // Leave no orphaned parts billing in the bucket.
                if let Err(abort) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    warn!(
                        "Abort of multipart upload {} for storage://{}/{} failed: {}",
                        upload_id,
                        bucket,
                        key,
                        DisplayErrorContext(&abort)
                    );
                }
                return Err(e);
            }
        };

        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();
        self.client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(&upload_id)
            .multipart_upload(completed)
            .send()
            .await
            .map_err(|e| classify("complete multipart upload", bucket, e))?;
        Ok(())
    }

    /// Upload every part, at most `max_concurrency` at a time. Parts come back in order.
    async fn upload_parts(
        &self,
        path: &Path,
        bucket: &str,
        key: &str,
        upload_id: &str,
        len: u64,
        multipart: &MultipartSettings,
    ) -> Result<Vec<CompletedPart>, StoreError> {
        let part_size = multipart.part_size_for(len);
        let limiter = Semaphore::new(multipart.max_concurrency);
        let mut parts = Vec::new();
        let mut offset = 0u64;
        let mut part_number = 1i32;
        while offset < len {
            let size = part_size.min(len - offset);
            parts.push(self.upload_part(
                PartSpec {
                    path,
                    bucket,
                    key,
                    upload_id,
                    part_number,
                    offset,
                    size,
                },
                &limiter,
            ));
            offset += size;
            part_number += 1;
        }
        debug!(
            "Multipart upload of {} to storage://{}/{}: {} parts of {} bytes",
            path.display(),
            bucket,
            key,
            parts.len(),
            part_size
        );
        futures::future::try_join_all(parts).await
    }

    async fn upload_part(
        &self,
        part: PartSpec<'_>,
        limiter: &Semaphore,
    ) -> Result<CompletedPart, StoreError> {
        let _permit = limiter.acquire().await.map_err(|_| StoreError::Backend {
            operation: "upload part",
            message: "part limiter closed".to_string(),
        })?;
        let body = ByteStream::read_from()
            .path(part.path)
            .offset(part.offset)
            .length(Length::Exact(part.size))
            .build()
            .await
            .map_err(|e| read_err("read part", part.path, e))?;
        let resp = self
            .client
            .upload_part()
            .bucket(part.bucket)
            .key(part.key)
            .upload_id(part.upload_id)
            .part_number(part.part_number)
            .body(body)
            .send()
            .await
            .map_err(|e| classify("upload part", part.bucket, e))?;
        Ok(CompletedPart::builder()
            .part_number(part.part_number)
            .set_e_tag(resp.e_tag().map(str::to_string))
            .build())
    }
}

/// One byte range of a multipart upload.
struct PartSpec<'a> {
    path: &'a Path,
    bucket: &'a str,
    key: &'a str,
    upload_id: &'a str,
    part_number: i32,
    offset: u64,
    size: u64,
}

async fn build_client(region: Option<&str>, endpoint: Option<&str>) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    if let Some(url) = endpoint {
        loader = loader.endpoint_url(url);
    }
    let sdk_config = loader.load().await;
    let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
    if endpoint.is_some() {
        // S3-compatible servers rarely support virtual-hosted buckets.
        builder = builder.force_path_style(true);
    }
    Client::from_conf(builder.build())
}

impl ObjectStore for S3Store {
    fn put_file(
        &self,
        path: &Path,
        bucket: &str,
        key: &str,
        storage_class: StorageClass,
        multipart: &MultipartSettings,
    ) -> Result<(), StoreError> {
        let len = std::fs::metadata(path)
            .map_err(|source| StoreError::Io {
                operation: "stat",
                path: path.to_path_buf(),
                source,
            })?
            .len();
        self.runtime.block_on(async {
            if len >= multipart.threshold {
                self.put_multipart(path, bucket, key, storage_class, len, multipart)
                    .await
            } else {
                self.put_single(path, bucket, key, storage_class).await
            }
        })
    }

    fn stat(&self, bucket: &str, key: &str) -> Result<Option<ObjectInfo>, StoreError> {
        self.runtime.block_on(async {
            match self.client.head_object().bucket(bucket).key(key).send().await {
                Ok(out) => Ok(Some(ObjectInfo {
                    size: out.content_length().unwrap_or(0).max(0) as u64,
                    // S3 omits the header for STANDARD objects.
                    storage_class: out
                        .storage_class()
                        .and_then(|c| StorageClass::parse(c.as_str()))
                        .unwrap_or(StorageClass::Standard),
                })),
                Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(None),
                Err(e) => Err(classify("head object", bucket, e)),
            }
        })
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.runtime.block_on(async {
            self.client
                .delete_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| classify("delete object", bucket, e))?;
            Ok(())
        })
    }
}
