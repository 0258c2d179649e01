//! Test utilities for the modelstore crate.
//!
//! Provides an in-memory [`ArtifactStore`] double for unit and integration
//! tests. Downloads still materialize to real local files (under a caller
//! supplied scratch directory) so the deserialization chain and CSV parsing
//! run against the same code paths as the real backends.

use crate::error::{Result, StoreError};
use crate::store::ArtifactStore;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::warn;

/// In-memory artifact store. Thread-safe via Mutex, suitable for unit tests.
pub struct MemoryStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    scratch_dir: PathBuf,
    fail_uploads: bool,
    fail_listings: bool,
    downloads: AtomicUsize,
}

impl MemoryStore {
    /// `scratch_dir` is where downloads are materialized; point it at a
    /// tempdir owned by the test.
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            scratch_dir: scratch_dir.into(),
            fail_uploads: false,
            fail_listings: false,
            downloads: AtomicUsize::new(0),
        }
    }

    /// Every upload fails with a backend error (transfer never happens).
    pub fn with_failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    /// Every listing/existence call fails internally, exercising the
    /// swallow-and-log contract of `key_exists`.
    pub fn with_failing_listings(mut self) -> Self {
        self.fail_listings = true;
        self
    }

    /// Seed an object directly, bypassing upload.
    pub fn put(&self, location: &str, key: &str, bytes: Vec<u8>) {
        self.objects
            .lock()
            .unwrap()
            .insert((location.to_string(), key.to_string()), bytes);
    }

    /// Number of downloads that actually hit the store.
    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ArtifactStore for MemoryStore {
    async fn key_exists(&self, location: &str, key: &str) -> bool {
        if self.fail_listings {
            warn!(location, key, "existence check failed, treating as absent");
            return false;
        }
        self.objects
            .lock()
            .unwrap()
            .contains_key(&(location.to_string(), key.to_string()))
    }

    async fn upload_file(
        &self,
        local_path: &Path,
        remote_key: &str,
        location: &str,
        remove_local: bool,
    ) -> Result<()> {
        let bytes = std::fs::read(local_path).map_err(|e| StoreError::io(local_path, e))?;

        if self.fail_uploads {
            return Err(StoreError::backend(
                format!("put {location}/{remote_key}"),
                std::io::Error::new(std::io::ErrorKind::ConnectionReset, "simulated failure"),
            ));
        }

        self.put(location, remote_key, bytes);
        if remove_local {
            std::fs::remove_file(local_path).map_err(|e| StoreError::io(local_path, e))?;
        }
        Ok(())
    }

    async fn download_to_local(&self, remote_key: &str, location: &str) -> Result<PathBuf> {
        let bytes = self
            .objects
            .lock()
            .unwrap()
            .get(&(location.to_string(), remote_key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::not_found(location, remote_key))?;

        self.downloads.fetch_add(1, Ordering::SeqCst);

        let local = self
            .scratch_dir
            .join("downloads")
            .join(location)
            .join(remote_key);
        if let Some(parent) = local.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        std::fs::write(&local, &bytes).map_err(|e| StoreError::io(&local, e))?;
        Ok(local)
    }
}
