//! S3 backend for record storage
//!
//! The bucket is created on `init` when missing, with versioning enabled,
//! server-side encryption and public access blocked.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketVersioningStatus, PublicAccessBlockConfiguration, ServerSideEncryption,
    VersioningConfiguration,
};

use crate::backend::{BackendError, BackendResult, StateBackend};
use crate::lock::LockInfo;
use crate::state::StateFile;

/// S3-based record backend
pub struct S3Backend {
    client: Client,
    bucket: String,
    key: String,
    region: String,
    /// Whether to encrypt the record file
    encrypt: bool,
}

impl S3Backend {
    /// Create a new S3Backend for the given bucket and key
    pub async fn new(bucket: &str, key: &str, encrypt: bool, region: &str) -> Self {
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(region.to_string()))
            .load()
            .await;

        Self {
            client: Client::new(&aws_config),
            bucket: bucket.to_string(),
            key: key.to_string(),
            region: region.to_string(),
            encrypt,
        }
    }

    /// Get the lock file key (record key + ".lock")
    fn lock_key(&self) -> String {
        format!("{}.lock", self.key)
    }

    /// Read the lock file from S3
    async fn read_lock(&self) -> BackendResult<Option<LockInfo>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.lock_key())
            .send()
            .await;

        match result {
            Ok(output) => {
                let body = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| BackendError::Io(e.to_string()))?;
                let lock: LockInfo = serde_json::from_slice(&body.into_bytes())
                    .map_err(|e| BackendError::Serialization(e.to_string()))?;
                Ok(Some(lock))
            }
            Err(err) => {
                if is_not_found_error(&err) {
                    Ok(None)
                } else {
                    Err(BackendError::Aws(err.to_string()))
                }
            }
        }
    }

    /// Write a lock file to S3
    async fn write_lock(&self, lock: &LockInfo) -> BackendResult<()> {
        let body = serde_json::to_vec_pretty(lock)
            .map_err(|e| BackendError::Serialization(e.to_string()))?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(self.lock_key())
            .body(ByteStream::from(body))
            .content_type("application/json");

        if self.encrypt {
            request = request.server_side_encryption(ServerSideEncryption::Aes256);
        }

        request
            .send()
            .await
            .map_err(|e| BackendError::Aws(e.to_string()))?;

        Ok(())
    }

    /// Delete the lock file from S3
    async fn delete_lock(&self) -> BackendResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.lock_key())
            .send()
            .await
            .map_err(|e| BackendError::Aws(e.to_string()))?;

        Ok(())
    }

    async fn bucket_exists(&self) -> BackendResult<bool> {
        let result = self.client.head_bucket().bucket(&self.bucket).send().await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => {
                // HeadBucket returns 404 for non-existent buckets
                if err.as_service_error().is_some() {
                    Ok(false)
                } else {
                    let raw = err.raw_response();
                    if raw.is_some_and(|r| r.status().as_u16() == 404) {
                        Ok(false)
                    } else {
                        Err(BackendError::Aws(err.to_string()))
                    }
                }
            }
        }
    }

    async fn create_bucket(&self) -> BackendResult<()> {
        // us-east-1 rejects an explicit location constraint
        let mut create_request = self.client.create_bucket().bucket(&self.bucket);

        if self.region != "us-east-1" {
            use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};

            let constraint = BucketLocationConstraint::from(self.region.as_str());
            let config = CreateBucketConfiguration::builder()
                .location_constraint(constraint)
                .build();
            create_request = create_request.create_bucket_configuration(config);
        }

        create_request
            .send()
            .await
            .map_err(|e| BackendError::BucketCreationFailed(e.to_string()))?;

        // Enable versioning for record history
        let versioning_config = VersioningConfiguration::builder()
            .status(BucketVersioningStatus::Enabled)
            .build();

        self.client
            .put_bucket_versioning()
            .bucket(&self.bucket)
            .versioning_configuration(versioning_config)
            .send()
            .await
            .map_err(|e| BackendError::Aws(format!("Failed to enable versioning: {}", e)))?;

        // Block public access
        let public_access_block = PublicAccessBlockConfiguration::builder()
            .block_public_acls(true)
            .block_public_policy(true)
            .ignore_public_acls(true)
            .restrict_public_buckets(true)
            .build();

        self.client
            .put_public_access_block()
            .bucket(&self.bucket)
            .public_access_block_configuration(public_access_block)
            .send()
            .await
            .map_err(|e| BackendError::Aws(format!("Failed to block public access: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl StateBackend for S3Backend {
    async fn read_state(&self) -> BackendResult<Option<StateFile>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let body = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| BackendError::Io(e.to_string()))?;
                let state: StateFile = serde_json::from_slice(&body.into_bytes())
                    .map_err(|e| BackendError::InvalidState(e.to_string()))?;
                Ok(Some(state))
            }
            Err(err) => {
                if is_not_found_error(&err) {
                    Ok(None)
                } else {
                    Err(BackendError::Aws(err.to_string()))
                }
            }
        }
    }

    async fn write_state(&self, state: &StateFile) -> BackendResult<()> {
        let body = serde_json::to_vec_pretty(state)
            .map_err(|e| BackendError::Serialization(e.to_string()))?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .body(ByteStream::from(body))
            .content_type("application/json");

        if self.encrypt {
            request = request.server_side_encryption(ServerSideEncryption::Aes256);
        }

        request
            .send()
            .await
            .map_err(|e| BackendError::Aws(e.to_string()))?;

        Ok(())
    }

    async fn acquire_lock(&self, operation: &str) -> BackendResult<LockInfo> {
        if let Some(existing_lock) = self.read_lock().await? {
            if existing_lock.is_expired() {
                self.delete_lock().await?;
            } else {
                return Err(BackendError::locked(&existing_lock));
            }
        }

        let lock = LockInfo::new(operation);
        self.write_lock(&lock).await?;

        // Read it back and check it's ours, in case another run raced us
        if let Some(written_lock) = self.read_lock().await? {
            if written_lock.id == lock.id {
                return Ok(lock);
            } else {
                return Err(BackendError::locked(&written_lock));
            }
        }

        Ok(lock)
    }

    async fn release_lock(&self, lock: &LockInfo) -> BackendResult<()> {
        match self.read_lock().await? {
            Some(existing_lock) if existing_lock.id != lock.id => {
                Err(BackendError::LockMismatch {
                    expected: lock.id.clone(),
                    actual: existing_lock.id,
                })
            }
            Some(_) => self.delete_lock().await,
            None => Err(BackendError::LockNotFound(lock.id.clone())),
        }
    }

    async fn init(&self) -> BackendResult<()> {
        if !self.bucket_exists().await? {
            self.create_bucket().await?;
        }

        // Initialize an empty record if none exists
        if self.read_state().await?.is_none() {
            let state = StateFile::new();
            self.write_state(&state).await?;
        }

        Ok(())
    }
}

/// Check if an S3 error is a "not found" error
fn is_not_found_error<E: std::fmt::Debug>(err: &aws_sdk_s3::error::SdkError<E>) -> bool {
    if let Some(raw) = err.raw_response() {
        return raw.status().as_u16() == 404;
    }
    false
}
