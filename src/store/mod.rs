//! The artifact store abstraction and its two backend implementations.
//!
//! One backend is selected per deployment by [`from_settings`]; nothing
//! switches at runtime. Every operation maps backend-specific failures into
//! the [`StoreError`] taxonomy with the original cause attached, except
//! [`ArtifactStore::key_exists`], which deliberately collapses failures into
//! `false` (it is advisory, used to skip expensive steps; false negatives
//! are acceptable, false positives are not).

pub mod hub;
pub mod s3;

pub use hub::HubStore;
pub use s3::S3Store;

use crate::codec;
use crate::error::{Result, StoreError};
use crate::frame::DataFrame;
use crate::settings::{BackendKind, StorageSettings};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Storage backend for named artifacts.
///
/// `location` is the backend's container identifier: a bucket name for the
/// object store, a repository id for the Hub. Keys are paths unique within
/// one backend's namespace; mutation is always whole-object replace.
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Advisory existence check. Never fails: backend errors are logged and
    /// collapse to `false`.
    async fn key_exists(&self, location: &str, key: &str) -> bool;

    /// Transfer a local file to the backend under `remote_key`. When
    /// `remove_local` is set, the local file is deleted only after a
    /// successful transfer: never before, never on failure. A failed
    /// upload leaves the artifact in place for retry or inspection.
    async fn upload_file(
        &self,
        local_path: &Path,
        remote_key: &str,
        location: &str,
        remove_local: bool,
    ) -> Result<()>;

    /// Materialize the remote object to a local path and return it. The Hub
    /// backend resolves to its content-addressed cache (repeat downloads of
    /// unchanged objects are cache hits); the object-store backend fetches
    /// on every call.
    async fn download_to_local(&self, remote_key: &str, location: &str) -> Result<PathBuf>;
}

/// Convenience operations available on every store, including `dyn` ones.
#[async_trait::async_trait]
pub trait ArtifactStoreExt: ArtifactStore {
    /// Serialize the dataframe as CSV at `staging_path`, then upload it with
    /// `remove_local = true`. The staging path must be unique among
    /// concurrent callers; no collision detection happens here.
    async fn upload_dataframe_as_csv(
        &self,
        dataframe: &DataFrame,
        staging_path: &Path,
        remote_key: &str,
        location: &str,
    ) -> Result<()> {
        dataframe.write_csv(staging_path)?;
        self.upload_file(staging_path, remote_key, location, true)
            .await
    }

    /// Download and parse a CSV artifact.
    async fn read_csv(&self, remote_key: &str, location: &str) -> Result<DataFrame> {
        let local = self.download_to_local(remote_key, location).await?;
        DataFrame::from_csv_path(&local)
    }

    /// Download a serialized model blob and run it through the
    /// deserialization fallback chain (see [`crate::codec::load_object`]).
    async fn load_object<T>(&self, remote_key: &str, location: &str) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let local = self.download_to_local(remote_key, location).await?;
        codec::load_object(&local)
    }
}

#[async_trait::async_trait]
impl<S: ArtifactStore + ?Sized> ArtifactStoreExt for S {}

/// Build the store the deployment's configuration selects.
pub fn from_settings(settings: &StorageSettings) -> Result<Arc<dyn ArtifactStore>> {
    settings.validate()?;
    match settings.backend {
        BackendKind::S3 => {
            let s3 = settings.s3().ok_or_else(|| {
                StoreError::Configuration("object storage credentials are not set".into())
            })?;
            Ok(Arc::new(S3Store::shared(s3)?))
        }
        BackendKind::Hub => {
            let hub = settings.hub().ok_or_else(|| {
                StoreError::Configuration("hub repository settings are not set".into())
            })?;
            Ok(Arc::new(HubStore::shared(hub)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use tempfile::TempDir;

    fn sample_frame() -> DataFrame {
        let mut df = DataFrame::new(vec!["id".into(), "response".into()]);
        df.push_row(vec!["1".into(), "0".into()]).unwrap();
        df.push_row(vec!["2".into(), "1".into()]).unwrap();
        df
    }

    #[tokio::test]
    async fn dataframe_round_trip_through_store() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new(dir.path());
        let staging = dir.path().join("staging-train.csv");

        let df = sample_frame();
        store
            .upload_dataframe_as_csv(&df, &staging, "data/train.csv", "insurance")
            .await
            .unwrap();

        let loaded = store.read_csv("data/train.csv", "insurance").await.unwrap();
        assert_eq!(loaded, df);
    }

    #[tokio::test]
    async fn staging_file_is_removed_after_successful_upload() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new(dir.path());
        let staging = dir.path().join("staging.csv");

        store
            .upload_dataframe_as_csv(&sample_frame(), &staging, "data/t.csv", "insurance")
            .await
            .unwrap();

        assert!(!staging.exists());
    }

    #[tokio::test]
    async fn staging_file_survives_failed_upload() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new(dir.path()).with_failing_uploads();
        let staging = dir.path().join("staging.csv");

        let err = store
            .upload_dataframe_as_csv(&sample_frame(), &staging, "data/t.csv", "insurance")
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Backend { .. }));
        assert!(staging.exists(), "local file must be preserved on failure");
    }

    #[tokio::test]
    async fn key_exists_is_false_for_missing_key() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new(dir.path());
        assert!(!store.key_exists("insurance", "model/model.blob").await);
    }

    #[tokio::test]
    async fn key_exists_swallows_backend_errors() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new(dir.path()).with_failing_listings();
        store.put("insurance", "model/model.blob", b"blob".to_vec());

        // The listing call fails internally; the check degrades to false.
        assert!(!store.key_exists("insurance", "model/model.blob").await);
    }

    #[tokio::test]
    async fn read_csv_on_missing_key_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new(dir.path());

        let err = store.read_csv("data/absent.csv", "insurance").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn read_csv_on_binary_blob_is_a_data_format_error() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new(dir.path());
        store.put("insurance", "data/blob.bin", vec![0x80, 0x03, 0xff, 0x00]);

        let err = store.read_csv("data/blob.bin", "insurance").await.unwrap_err();
        assert!(matches!(err, StoreError::DataFormat(_)));
    }

    #[tokio::test]
    async fn load_object_round_trips_through_store() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new(dir.path());

        let weights = vec![0.25f64, 0.5, 0.125];
        let local = dir.path().join("model.blob");
        codec::save_object(&weights, &local, codec::BlobFormat::default()).unwrap();
        store
            .upload_file(&local, "model/model.blob", "insurance", false)
            .await
            .unwrap();

        let loaded: Vec<f64> = store.load_object("model/model.blob", "insurance").await.unwrap();
        assert_eq!(loaded, weights);
    }

    #[test]
    fn from_settings_selects_s3() {
        let settings = StorageSettings {
            backend: BackendKind::S3,
            s3: Some(crate::settings::S3Settings {
                access_key: "minio".into(),
                secret_key: "minio123".into(),
                endpoint: "http://localhost:9000".into(),
                region: "us-east-1".into(),
            }),
            hub: None,
        };
        assert!(from_settings(&settings).is_ok());
    }

    #[test]
    fn from_settings_without_credentials_is_a_configuration_error() {
        let settings = StorageSettings {
            backend: BackendKind::S3,
            s3: None,
            hub: None,
        };
        assert!(matches!(
            from_settings(&settings),
            Err(StoreError::Configuration(_))
        ));
    }
}
