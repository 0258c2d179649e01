//! S3-compatible object store backend.
//!
//! No local caching: every download performs a protocol-level fetch into a
//! per-process scratch directory. Timeouts are whatever the SDK transport
//! defaults to; this layer adds no retry or cancellation of its own.

use super::ArtifactStore;
use crate::connection::S3Handle;
use crate::error::{Result, StoreError};
use crate::settings::S3Settings;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct S3Store {
    client: aws_sdk_s3::Client,
    scratch_dir: PathBuf,
}

impl S3Store {
    /// Store over an explicit handle (injectable for tests and embedders).
    pub fn new(handle: &S3Handle) -> Self {
        Self {
            client: handle.client.clone(),
            scratch_dir: std::env::temp_dir().join("modelstore"),
        }
    }

    /// Store over the process-wide shared handle.
    pub fn shared(settings: &S3Settings) -> Result<Self> {
        Ok(Self::new(S3Handle::shared(settings)?))
    }

    /// Override where downloads are materialized.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    fn local_path_for(&self, location: &str, key: &str) -> PathBuf {
        self.scratch_dir.join(location).join(key)
    }
}

#[async_trait::async_trait]
impl ArtifactStore for S3Store {
    async fn key_exists(&self, location: &str, key: &str) -> bool {
        match self
            .client
            .head_object()
            .bucket(location)
            .key(key)
            .send()
            .await
        {
            Ok(_) => true,
            Err(err) => {
                let missing =
                    matches!(&err, SdkError::ServiceError(se) if se.err().is_not_found());
                if !missing {
                    warn!(location, key, error = %err, "existence check failed, treating as absent");
                }
                false
            }
        }
    }

    async fn upload_file(
        &self,
        local_path: &Path,
        remote_key: &str,
        location: &str,
        remove_local: bool,
    ) -> Result<()> {
        info!(
            "uploading {} -> {}/{}",
            local_path.display(),
            location,
            remote_key
        );

        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| StoreError::io(local_path, e))?;

        self.client
            .put_object()
            .bucket(location)
            .key(remote_key)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StoreError::backend(format!("put_object {location}/{remote_key}"), e))?;

        if remove_local {
            // Only after a confirmed transfer.
            tokio::fs::remove_file(local_path)
                .await
                .map_err(|e| StoreError::io(local_path, e))?;
        }
        Ok(())
    }

    async fn download_to_local(&self, remote_key: &str, location: &str) -> Result<PathBuf> {
        let output = self
            .client
            .get_object()
            .bucket(location)
            .key(remote_key)
            .send()
            .await
            .map_err(|err| match &err {
                SdkError::ServiceError(se) if se.err().is_no_such_key() => {
                    StoreError::not_found(location, remote_key)
                }
                _ => StoreError::backend(format!("get_object {location}/{remote_key}"), err),
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::backend(format!("read body {location}/{remote_key}"), e))?
            .into_bytes();

        let local = self.local_path_for(location, remote_key);
        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }
        tokio::fs::write(&local, &data)
            .await
            .map_err(|e| StoreError::io(&local, e))?;

        info!(
            "downloaded {}/{} ({} bytes) -> {}",
            location,
            remote_key,
            data.len(),
            local.display()
        );
        Ok(local)
    }
}
