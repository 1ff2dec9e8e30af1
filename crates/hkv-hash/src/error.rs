//! Error types for hash operations.

use hkv_codec::{CodecError, ValueKind};
use hkv_store::KvError;
use thiserror::Error;

/// Errors that can occur during hash operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    /// No value is stored under the key.
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// The key holds a value of another kind.
    #[error("wrong type for key {key}: expected hash, found {found}")]
    TypeMismatch { key: String, found: ValueKind },

    /// The stored bytes are damaged.
    #[error("corrupt value under {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: CodecError,
    },

    /// The hash exists but has no such field.
    #[error("field {field} not found in hash {key}")]
    FieldNotFound { key: String, field: String },

    /// The per-key lock is held by another writer.
    #[error("could not acquire lock on {key}")]
    LockFailed { key: String },

    /// Any other failure from the key-value core, passed through unchanged.
    #[error("store error: {0}")]
    Store(#[from] KvError),

    /// The field map could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),
}

impl HashError {
    /// Map a core error for `key` onto the hash taxonomy.
    pub(crate) fn from_kv(key: &str, err: KvError) -> Self {
        match err {
            KvError::NotFound { .. } => Self::NotFound {
                key: key.to_string(),
            },
            KvError::Busy { .. } => Self::LockFailed {
                key: key.to_string(),
            },
            other => Self::Store(other),
        }
    }

    /// Map a codec error for `key` onto the hash taxonomy.
    pub(crate) fn from_codec(key: &str, err: CodecError) -> Self {
        match err {
            CodecError::TypeMismatch { found, .. } => Self::TypeMismatch {
                key: key.to_string(),
                found,
            },
            CodecError::Encode(msg) => Self::Encode(msg),
            source => Self::Decode {
                key: key.to_string(),
                source,
            },
        }
    }

    /// Returns `true` if retrying the same call may succeed.
    ///
    /// Only lock contention qualifies; this layer never retries by itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockFailed { .. })
    }
}

/// Convenience type alias for hash operations.
pub type HashResult<T> = std::result::Result<T, HashError>;
