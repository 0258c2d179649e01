//! Model-blob serialization and the legacy deserialization fallback chain.
//!
//! Model artifacts written over the lifetime of a deployment come in three
//! formats: the preferred self-describing JSON form, a compact binary form,
//! and a legacy tagged-JSON envelope produced by an older export pipeline.
//! Blobs in the legacy envelope may reference internal types of a previous
//! version of the modeling stack that no longer exist; those references are
//! resolved through an explicit substitution registry instead of patching
//! any shared namespace.
//!
//! [`load_object`] tries the formats in a fixed order and stops at the first
//! success. When everything fails, the returned error carries the FINAL
//! strategy's failure; earlier failures are only debug-level breadcrumbs.

use crate::error::{Result, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// On-disk format for [`save_object`]. `Json` is the preferred, richer
/// format; `Bincode` is the compact alternative for numeric-heavy objects.
/// [`load_object`] tolerates either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlobFormat {
    #[default]
    Json,
    Bincode,
}

/// Serialize `value` to a local path only (no upload), creating intermediate
/// directories as needed.
pub fn save_object<T: Serialize>(value: &T, path: &Path, format: BlobFormat) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let bytes = match format {
        BlobFormat::Json => serde_json::to_vec(value)
            .map_err(|e| StoreError::DataFormat(format!("json encode: {e}")))?,
        BlobFormat::Bincode => bincode::serde::encode_to_vec(value, bincode::config::standard())
            .map_err(|e| StoreError::DataFormat(format!("bincode encode: {e}")))?,
    };
    fs::write(path, bytes).map_err(|e| StoreError::io(path, e))
}

/// Deserialize a downloaded blob, trying each strategy in fixed order:
///
/// 1. rich self-describing decode (JSON);
/// 2. compact binary decode (bincode);
/// 3. legacy envelope decode with legacy-type substitution.
///
/// Fails with [`StoreError::Deserialization`] carrying strategy 3's error
/// once all strategies are exhausted.
pub fn load_object<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;

    match serde_json::from_slice::<T>(&bytes) {
        Ok(value) => return Ok(value),
        Err(e) => debug!(path = %path.display(), error = %e, "rich decode failed, trying compact"),
    }

    match bincode::serde::decode_from_slice::<T, _>(&bytes, bincode::config::standard()) {
        // A decode that leaves trailing bytes hit a lookalike prefix, not a
        // compact blob.
        Ok((value, consumed)) if consumed == bytes.len() => return Ok(value),
        Ok((_, consumed)) => {
            debug!(path = %path.display(), consumed, total = bytes.len(), "compact decode left trailing bytes, trying legacy");
        }
        Err(e) => debug!(path = %path.display(), error = %e, "compact decode failed, trying legacy"),
    }

    legacy::decode(&bytes).map_err(|e| {
        StoreError::Deserialization(format!("all strategies exhausted, legacy decode: {e}"))
    })
}

/// Decoder for the legacy tagged-JSON envelope.
pub mod legacy {
    use super::*;

    /// Tag key carried by legacy envelope nodes, e.g.
    /// `{"__class__": "module.Class", "state": ...}`.
    const CLASS_TAG: &str = "__class__";
    const STATE_KEY: &str = "state";

    type Substitute = fn(Value) -> Value;

    /// Registry of removed legacy types and their drop-in replacements,
    /// keyed by (module path, class name). The lone shipped entry covers an
    /// internal list wrapper that old scikit-learn column transformers
    /// embedded in exported preprocessors; its replacement reduces to the
    /// plain ordered sequence held in the node's state.
    static SUBSTITUTES: &[((&str, &str), Substitute)] = &[(
        ("sklearn.compose._column_transformer", "_RemainderColsList"),
        state_as_sequence,
    )];

    fn state_as_sequence(state: Value) -> Value {
        match state {
            Value::Array(items) => Value::Array(items),
            other => Value::Array(vec![other]),
        }
    }

    fn lookup(class_path: &str) -> Option<Substitute> {
        let (module, class) = class_path.rsplit_once('.')?;
        SUBSTITUTES
            .iter()
            .find(|((m, c), _)| *m == module && *c == class)
            .map(|(_, substitute)| *substitute)
    }

    /// Parse a legacy envelope and deserialize into `T`, substituting
    /// registered legacy types. Unregistered tags fall through to default
    /// resolution (the node is kept as-is, children still rewritten).
    pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<T> {
        let value: Value = serde_json::from_slice(bytes)?;
        serde_json::from_value(rewrite(value))
    }

    fn rewrite(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                if let Some(Value::String(class_path)) = map.get(CLASS_TAG) {
                    if let Some(substitute) = lookup(class_path) {
                        let state = map.get(STATE_KEY).cloned().unwrap_or(Value::Null);
                        debug!(class = %class_path, "substituting removed legacy type");
                        return substitute(rewrite(state));
                    }
                }
                Value::Object(map.into_iter().map(|(k, v)| (k, rewrite(v))).collect())
            }
            Value::Array(items) => Value::Array(items.into_iter().map(rewrite).collect()),
            other => other,
        }
    }
}
