//! Process-wide backend connection handles.
//!
//! Each backend family gets at most one handle per process lifetime: the
//! first successful construction wins and every later caller reuses it
//! without re-authenticating. A [`OnceLock`] guards the one-time
//! initialization. Construction performs no network call for either
//! backend; connectivity problems surface on later operations.

use crate::error::{Result, StoreError};
use crate::settings::{HubSettings, S3Settings};
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use hf_hub::api::tokio::{Api, ApiBuilder};
use std::sync::OnceLock;

static S3_HANDLE: OnceLock<S3Handle> = OnceLock::new();
static HUB_HANDLE: OnceLock<HubHandle> = OnceLock::new();

/// Authenticated session against an S3-compatible object store.
#[derive(Debug, Clone)]
pub struct S3Handle {
    pub(crate) client: aws_sdk_s3::Client,
    pub(crate) region: String,
}

impl S3Handle {
    /// Build a fresh handle. Prefer [`S3Handle::shared`] in application code;
    /// this constructor exists so tests and embedders can inject their own.
    pub fn connect(settings: &S3Settings) -> Result<Self> {
        let credentials = Credentials::new(
            settings.access_key.clone(),
            settings.secret_key.clone(),
            None,
            None,
            "modelstore",
        );
        let config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .endpoint_url(&settings.endpoint)
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        tracing::debug!(endpoint = %settings.endpoint, region = %settings.region, "s3 client configured");
        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(config),
            region: settings.region.clone(),
        })
    }

    /// The process-wide handle. Idempotent; concurrent first-time callers
    /// all observe the same handle afterwards.
    pub fn shared(settings: &S3Settings) -> Result<&'static S3Handle> {
        if let Some(handle) = S3_HANDLE.get() {
            return Ok(handle);
        }
        let handle = Self::connect(settings)?;
        // If another thread won the race, our handle is dropped and theirs wins.
        Ok(S3_HANDLE.get_or_init(|| handle))
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

/// Authenticated session against the Hugging Face Hub.
#[derive(Clone)]
pub struct HubHandle {
    pub(crate) api: Api,
    pub(crate) settings: HubSettings,
}

impl HubHandle {
    /// Build a fresh handle. Client instantiation only; no request is made.
    pub fn connect(settings: &HubSettings) -> Result<Self> {
        let api = ApiBuilder::new()
            .with_token(settings.token.clone())
            .build()
            .map_err(|e| StoreError::backend("hub api construction", e))?;

        Ok(Self {
            api,
            settings: settings.clone(),
        })
    }

    /// The process-wide handle. Idempotent; first successful construction wins.
    pub fn shared(settings: &HubSettings) -> Result<&'static HubHandle> {
        if let Some(handle) = HUB_HANDLE.get() {
            return Ok(handle);
        }
        let handle = Self::connect(settings)?;
        Ok(HUB_HANDLE.get_or_init(|| handle))
    }

    pub fn settings(&self) -> &HubSettings {
        &self.settings
    }
}
