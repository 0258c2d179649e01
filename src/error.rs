use std::path::{Path, PathBuf};

/// Crate-wide result alias.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Error taxonomy for artifact storage operations.
///
/// Every backend-specific failure is caught at the point of backend
/// interaction and rewrapped into one of these kinds with the original
/// cause attached. The single deliberate exception is
/// [`ArtifactStore::key_exists`](crate::store::ArtifactStore::key_exists),
/// which swallows errors into `false`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Required credentials or identifiers are missing. Fatal, never retried.
    #[error("configuration: {0}")]
    Configuration(String),

    /// The requested key has no matching object in the backend.
    /// Recoverable by the caller (e.g. treat as "model not yet trained").
    #[error("not found: {0}")]
    NotFound(String),

    /// Connectivity, authentication, or protocol failure talking to the
    /// backend. The caller decides whether to retry; this layer never does.
    #[error("backend: {context}")]
    Backend {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Downloaded content does not parse as expected (CSV or blob stream).
    #[error("data format: {0}")]
    DataFormat(String),

    /// All deserialization fallback strategies exhausted. The message
    /// carries the final strategy's failure.
    #[error("deserialization: {0}")]
    Deserialization(String),

    /// Local filesystem failure while staging or materializing an artifact.
    #[error("i/o at {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn backend(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn not_found(location: &str, key: &str) -> Self {
        Self::NotFound(format!("{location}/{key}"))
    }
}
