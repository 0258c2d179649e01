//! Model registry facade: one named model artifact in one backend location.
//!
//! The facade owns nothing beyond the two identifying strings and the cached
//! in-memory model. Once loaded, the model is reused for every predict call
//! until the process restarts; there is no cache invalidation.

use crate::error::Result;
use crate::frame::DataFrame;
use crate::store::{ArtifactStore, ArtifactStoreExt};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// A trained model as the registry sees it: deserializable from a stored
/// blob, able to score a dataframe. The registry never interprets its
/// internals, and input-shape validation is the model's own job.
pub trait Model: DeserializeOwned + Send + Sync {
    type Output;

    fn predict(&self, input: &DataFrame) -> anyhow::Result<Self::Output>;
}

pub struct ModelRegistry<M: Model> {
    store: Arc<dyn ArtifactStore>,
    location: String,
    model_key: String,
    model: OnceCell<M>,
}

impl<M: Model> ModelRegistry<M> {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        location: impl Into<String>,
        model_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            location: location.into(),
            model_key: model_key.into(),
            model: OnceCell::new(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn model_key(&self) -> &str {
        &self.model_key
    }

    /// Advisory check; inherits `key_exists` semantics (never fails).
    pub async fn model_exists(&self) -> bool {
        self.store.key_exists(&self.location, &self.model_key).await
    }

    /// Fetch and deserialize the model, caching it on the facade. Later
    /// calls reuse the cached instance without touching the backend.
    pub async fn load_model(&self) -> Result<&M> {
        self.model
            .get_or_try_init(|| async {
                self.store
                    .load_object::<M>(&self.model_key, &self.location)
                    .await
            })
            .await
    }

    /// Upload a locally serialized model under this registry's key.
    pub async fn save_model(&self, local_path: &Path, remove_local: bool) -> Result<()> {
        self.store
            .upload_file(local_path, &self.model_key, &self.location, remove_local)
            .await
    }

    /// Score a dataframe, loading the model on first use.
    pub async fn predict(&self, input: &DataFrame) -> anyhow::Result<M::Output> {
        let model = self.load_model().await?;
        model.predict(input)
    }
}
