pub mod codec;
pub mod connection;
pub mod error;
pub mod frame;
pub mod registry;
pub mod settings;
pub mod store;

/// Test utilities for unit and integration testing.
/// Only available with cfg(test) or feature "testing".
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{Result, StoreError};
pub use frame::DataFrame;
pub use registry::{Model, ModelRegistry};
pub use settings::{BackendKind, HubSettings, S3Settings, StorageSettings};
pub use store::{ArtifactStore, ArtifactStoreExt};
