//! Hugging Face Hub repository backend.
//!
//! Downloads go through the `hf-hub` content-addressed cache, so repeat
//! downloads of an unchanged object resolve to the cached local path
//! instead of re-transferring. Uploads use the Hub commit HTTP API with an
//! NDJSON payload, since the download client has no write path.

use super::ArtifactStore;
use crate::connection::HubHandle;
use crate::error::{Result, StoreError};
use crate::settings::{HubSettings, RepoKind};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hf_hub::api::tokio::{Api, ApiError, ApiRepo};
use hf_hub::Repo;
use reqwest::header::CONTENT_TYPE;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const HUB_ENDPOINT: &str = "https://huggingface.co";

pub struct HubStore {
    api: Api,
    http: reqwest::Client,
    token: Option<String>,
    repo_type: RepoKind,
}

impl HubStore {
    /// Store over an explicit handle (injectable for tests and embedders).
    pub fn new(handle: &HubHandle) -> Self {
        Self {
            api: handle.api.clone(),
            http: reqwest::Client::new(),
            token: handle.settings().token.clone(),
            repo_type: handle.settings().repo_type,
        }
    }

    /// Store over the process-wide shared handle.
    pub fn shared(settings: &HubSettings) -> Result<Self> {
        Ok(Self::new(HubHandle::shared(settings)?))
    }

    fn repo(&self, location: &str) -> ApiRepo {
        self.api
            .repo(Repo::new(location.to_string(), self.repo_type.as_repo_type()))
    }

    fn commit_url(&self, location: &str) -> String {
        format!(
            "{HUB_ENDPOINT}/api/{}/{location}/commit/main",
            self.repo_type.plural()
        )
    }
}

fn map_download_error(location: &str, key: &str, err: ApiError) -> StoreError {
    // Compare by numeric status: hf-hub's transport may not be the same
    // reqwest version this crate links.
    if let ApiError::RequestError(request_err) = &err {
        if request_err.status().map(|s| s.as_u16()) == Some(404) {
            return StoreError::not_found(location, key);
        }
    }
    StoreError::backend(format!("hub download {location}/{key}"), err)
}

#[async_trait::async_trait]
impl ArtifactStore for HubStore {
    async fn key_exists(&self, location: &str, key: &str) -> bool {
        match self.repo(location).info().await {
            Ok(info) => info.siblings.iter().any(|s| s.rfilename == key),
            Err(err) => {
                warn!(location, key, error = %err, "existence check failed, treating as absent");
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

        // Commit payload: one header line, one base64 file line.
        let header = serde_json::json!({
            "key": "header",
            "value": { "summary": format!("upload {remote_key}"), "description": "" },
        });
        let file = serde_json::json!({
            "key": "file",
            "value": {
                "content": BASE64.encode(&bytes),
                "path": remote_key,
                "encoding": "base64",
            },
        });
        let body = format!("{header}\n{file}");

        let mut request = self
            .http
            .post(self.commit_url(location))
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::backend(format!("hub commit {location}/{remote_key}"), e))?;
        response
            .error_for_status()
            .map_err(|e| StoreError::backend(format!("hub commit {location}/{remote_key}"), e))?;

        if remove_local {
            // Only after a confirmed transfer.
            tokio::fs::remove_file(local_path)
                .await
                .map_err(|e| StoreError::io(local_path, e))?;
        }
        Ok(())
    }

    async fn download_to_local(&self, remote_key: &str, location: &str) -> Result<PathBuf> {
        // Cache hit when the remote object is unchanged; transfer otherwise.
        let local = self
            .repo(location)
            .get(remote_key)
            .await
            .map_err(|err| map_download_error(location, remote_key, err))?;

        info!(
            "resolved {}/{} -> {}",
            location,
            remote_key,
            local.display()
        );
        Ok(local)
    }
}
