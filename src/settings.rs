use crate::error::{Result, StoreError};
use figment::{providers::Env, Figment};
use serde::{Deserialize, Serialize};

/// Environment prefix for all settings (`MODELSTORE_BACKEND`,
/// `MODELSTORE_S3__ACCESS_KEY`, `MODELSTORE_HUB__TOKEN`, ...).
const ENV_PREFIX: &str = "MODELSTORE_";

/// Which backend family a deployment talks to. Selected once at startup,
/// never switched at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// S3-compatible object store (MinIO, AWS S3, ...)
    S3,
    /// Hugging Face Hub repository
    Hub,
}

/// Credentials and target for an S3-compatible object store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct S3Settings {
    pub access_key: String,
    pub secret_key: String,
    /// Endpoint URL, e.g. `http://minio.internal:9000`
    pub endpoint: String,
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Kind of Hugging Face Hub repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoKind {
    #[default]
    Model,
    Dataset,
    Space,
}

impl RepoKind {
    pub(crate) fn as_repo_type(self) -> hf_hub::RepoType {
        match self {
            RepoKind::Model => hf_hub::RepoType::Model,
            RepoKind::Dataset => hf_hub::RepoType::Dataset,
            RepoKind::Space => hf_hub::RepoType::Space,
        }
    }

    /// Path segment used by the Hub HTTP API.
    pub(crate) fn plural(self) -> &'static str {
        match self {
            RepoKind::Model => "models",
            RepoKind::Dataset => "datasets",
            RepoKind::Space => "spaces",
        }
    }
}

/// Credentials and target for a Hugging Face Hub repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HubSettings {
    /// Access token. Optional for public repositories.
    pub token: Option<String>,
    #[serde(default)]
    pub repo_type: RepoKind,
}

/// Backend selection plus per-backend credentials, read from the process
/// environment. Missing required values fail fast with
/// [`StoreError::Configuration`]; they are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageSettings {
    pub backend: BackendKind,
    pub s3: Option<S3Settings>,
    pub hub: Option<HubSettings>,
}

impl StorageSettings {
    /// Load settings from `MODELSTORE_`-prefixed environment variables
    /// (`__` separates nesting, e.g. `MODELSTORE_S3__SECRET_KEY`).
    pub fn from_env() -> Result<Self> {
        let settings: StorageSettings = Figment::new()
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| StoreError::Configuration(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Ensure the section for the selected backend is present and complete.
    pub fn validate(&self) -> Result<()> {
        match self.backend {
            BackendKind::S3 => {
                let s3 = self.s3.as_ref().ok_or_else(|| {
                    StoreError::Configuration("object storage credentials are not set".into())
                })?;
                if s3.access_key.is_empty() || s3.secret_key.is_empty() || s3.endpoint.is_empty() {
                    return Err(StoreError::Configuration(
                        "object storage credentials are not set".into(),
                    ));
                }
            }
            BackendKind::Hub => {
                if self.hub.is_none() {
                    return Err(StoreError::Configuration(
                        "hub repository settings are not set".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Settings for the selected S3 backend, if that is the configured kind.
    pub fn s3(&self) -> Option<&S3Settings> {
        self.s3.as_ref()
    }

    /// Settings for the selected Hub backend, if that is the configured kind.
    pub fn hub(&self) -> Option<&HubSettings> {
        self.hub.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s3_settings_from_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MODELSTORE_BACKEND", "s3");
            jail.set_env("MODELSTORE_S3__ACCESS_KEY", "minio");
            jail.set_env("MODELSTORE_S3__SECRET_KEY", "minio123");
            jail.set_env("MODELSTORE_S3__ENDPOINT", "http://localhost:9000");

            let settings = StorageSettings::from_env().unwrap();
            assert_eq!(settings.backend, BackendKind::S3);
            let s3 = settings.s3().unwrap();
            assert_eq!(s3.access_key, "minio");
            assert_eq!(s3.region, "us-east-1");
            Ok(())
        });
    }

    #[test]
    fn s3_region_override() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MODELSTORE_BACKEND", "s3");
            jail.set_env("MODELSTORE_S3__ACCESS_KEY", "minio");
            jail.set_env("MODELSTORE_S3__SECRET_KEY", "minio123");
            jail.set_env("MODELSTORE_S3__ENDPOINT", "http://localhost:9000");
            jail.set_env("MODELSTORE_S3__REGION", "eu-west-1");

            let settings = StorageSettings::from_env().unwrap();
            assert_eq!(settings.s3().unwrap().region, "eu-west-1");
            Ok(())
        });
    }

    #[test]
    fn missing_s3_credentials_fail_fast() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MODELSTORE_BACKEND", "s3");

            let err = StorageSettings::from_env().unwrap_err();
            assert!(matches!(err, StoreError::Configuration(_)));
            Ok(())
        });
    }

    #[test]
    fn empty_s3_credentials_fail_fast() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MODELSTORE_BACKEND", "s3");
            jail.set_env("MODELSTORE_S3__ACCESS_KEY", "");
            jail.set_env("MODELSTORE_S3__SECRET_KEY", "minio123");
            jail.set_env("MODELSTORE_S3__ENDPOINT", "http://localhost:9000");

            let err = StorageSettings::from_env().unwrap_err();
            assert!(matches!(err, StoreError::Configuration(_)));
            Ok(())
        });
    }

    #[test]
    fn hub_settings_default_repo_type_is_model() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MODELSTORE_BACKEND", "hub");
            jail.set_env("MODELSTORE_HUB__TOKEN", "hf_test");

            let settings = StorageSettings::from_env().unwrap();
            assert_eq!(settings.backend, BackendKind::Hub);
            let hub = settings.hub().unwrap();
            assert_eq!(hub.repo_type, RepoKind::Model);
            assert_eq!(hub.token.as_deref(), Some("hf_test"));
            Ok(())
        });
    }

    #[test]
    fn hub_repo_type_dataset() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MODELSTORE_BACKEND", "hub");
            jail.set_env("MODELSTORE_HUB__TOKEN", "hf_test");
            jail.set_env("MODELSTORE_HUB__REPO_TYPE", "dataset");

            let settings = StorageSettings::from_env().unwrap();
            assert_eq!(settings.hub().unwrap().repo_type, RepoKind::Dataset);
            Ok(())
        });
    }

    #[test]
    fn missing_backend_is_configuration_error() {
        figment::Jail::expect_with(|_jail| {
            let err = StorageSettings::from_env().unwrap_err();
            assert!(matches!(err, StoreError::Configuration(_)));
            Ok(())
        });
    }

    #[test]
    fn repo_kind_plural_segments() {
        assert_eq!(RepoKind::Model.plural(), "models");
        assert_eq!(RepoKind::Dataset.plural(), "datasets");
        assert_eq!(RepoKind::Space.plural(), "spaces");
    }
}
