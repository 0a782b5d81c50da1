use crate::backend::{bounded, StorageBackend};
use crate::keys::{directory_prefix, endpoint_url, object_key, public_object_url};
use crate::StorageError;
use arstore_config::{BackendKind, ObjectStorageSettings};
use arstore_models::ProvisionedPath;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::{primitives::ByteStream, Client};
use bytes::Bytes;
use std::time::Duration;

const AUTH_ERROR_CODES: &[&str] = &[
    "AccessDenied",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
];
const NOT_FOUND_CODES: &[&str] = &["NoSuchKey", "NotFound"];

/// S3-compatible storage backend
/// Compatible with: MinIO, AWS S3, Cloudflare R2, DigitalOcean Spaces, etc.
pub struct S3Backend {
    client: Client,
    bucket_name: String,
    public_url: String,
    bucket_prefix: String,
    timeout: Duration,
}

impl S3Backend {
    pub async fn new(settings: &ObjectStorageSettings, timeout: Duration) -> Result<Self, StorageError> {
        if settings.bucket.is_empty() {
            return Err(StorageError::ConfigError(
                "object_storage.bucket must not be empty".to_string(),
            ));
        }
        if settings.access_key.is_empty() || settings.secret_key.is_empty() {
            return Err(StorageError::ConfigError(
                "object_storage.access_key and secret_key are required".to_string(),
            ));
        }

        let credentials = Credentials::new(
            settings.access_key.clone(),
            settings.secret_key.clone(),
            None,
            None,
            "arstore-s3",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(settings.region.clone()));
        if !settings.endpoint.is_empty() {
            loader = loader.endpoint_url(endpoint_url(&settings.endpoint, settings.secure));
        }
        let sdk_config = loader.load().await;

        // MinIO and most self-hosted gateways only understand path-style requests
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket_name: settings.bucket.clone(),
            public_url: settings.public_url.clone(),
            bucket_prefix: settings.prefix.clone(),
            timeout,
        })
    }

    async fn head(&self, key: &str) -> Result<bool, StorageError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match classify(key, e) {
                StorageError::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }
}

#[async_trait::async_trait]
impl StorageBackend for S3Backend {
    fn kind(&self) -> BackendKind {
        BackendKind::ObjectStorage
    }

    async fn save(&self, path: &ProvisionedPath, data: Bytes) -> Result<ProvisionedPath, StorageError> {
        let key = object_key(&self.bucket_prefix, path);

        tracing::debug!("Uploading {} to S3 bucket {}", key, self.bucket_name);

        bounded(self.timeout, &key, async {
            self.client
                .put_object()
                .bucket(&self.bucket_name)
                .key(&key)
                .body(ByteStream::from(data))
                .send()
                .await
                .map_err(|e| classify(&key, e))?;
            Ok(path.clone())
        })
        .await
    }

    async fn read(&self, path: &ProvisionedPath) -> Result<Bytes, StorageError> {
        let key = object_key(&self.bucket_prefix, path);
        bounded(self.timeout, &key, async {
            let output = self
                .client
                .get_object()
                .bucket(&self.bucket_name)
                .key(&key)
                .send()
                .await
                .map_err(|e| classify(&key, e))?;

            let body = output
                .body
                .collect()
                .await
                .map_err(|e| StorageError::transport(&key, e))?;
            Ok(body.into_bytes())
        })
        .await
    }

    async fn delete(&self, path: &ProvisionedPath) -> Result<(), StorageError> {
        let key = object_key(&self.bucket_prefix, path);

        tracing::debug!("Deleting {} from S3 bucket {}", key, self.bucket_name);

        bounded(self.timeout, &key, async {
            // DeleteObject succeeds for absent keys
            if !self.head(&key).await? {
                return Err(StorageError::NotFound(key.clone()));
            }
            self.client
                .delete_object()
                .bucket(&self.bucket_name)
                .key(&key)
                .send()
                .await
                .map_err(|e| classify(&key, e))?;
            Ok(())
        })
        .await
    }

    async fn exists(&self, path: &ProvisionedPath) -> Result<bool, StorageError> {
        let key = object_key(&self.bucket_prefix, path);
        bounded(self.timeout, &key, self.head(&key)).await
    }

    fn public_url(&self, path: &ProvisionedPath) -> Option<String> {
        public_object_url(&self.public_url, &object_key(&self.bucket_prefix, path))
    }

    async fn directory_exists(&self, path: &ProvisionedPath) -> Result<bool, StorageError> {
        let prefix = directory_prefix(&self.bucket_prefix, path);
        bounded(self.timeout, &prefix, async {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket_name)
                .prefix(&prefix)
                .max_keys(1)
                .send()
                .await
                .map_err(|e| classify(&prefix, e))?;
            Ok(output.key_count().unwrap_or(0) > 0 || !output.contents().is_empty())
        })
        .await
    }

    async fn create_directory(&self, _path: &ProvisionedPath) -> Result<(), StorageError> {
        // Prefixes come into existence with their first object
        Ok(())
    }
}

fn classify<E>(key: &str, err: SdkError<E, HttpResponse>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            StorageError::transport(key, DisplayErrorContext(&err))
        }
        SdkError::ServiceError(ctx) => {
            let status = ctx.raw().status().as_u16();
            let code = err.code().unwrap_or_default();
            if AUTH_ERROR_CODES.contains(&code) || status == 401 || status == 403 {
                StorageError::auth(key, DisplayErrorContext(&err))
            } else if code == "NoSuchBucket" {
                // A missing bucket is a broken route, not a missing object
                StorageError::ConfigError(format!(
                    "object storage bucket does not exist (while accessing '{}')",
                    key
                ))
            } else if NOT_FOUND_CODES.contains(&code) || status == 404 {
                StorageError::NotFound(key.to_string())
            } else if code == "QuotaExceeded" {
                StorageError::QuotaExceeded(key.to_string())
            } else if status == 429 || status >= 500 {
                StorageError::transport(key, DisplayErrorContext(&err))
            } else {
                StorageError::IoError {
                    path: key.to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::Other,
                        DisplayErrorContext(&err).to_string(),
                    ),
                }
            }
        }
        _ => StorageError::transport(key, DisplayErrorContext(&err)),
    }
}
