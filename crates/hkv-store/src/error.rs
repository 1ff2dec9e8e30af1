/// Errors from key-value core operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KvError {
    /// No value is stored under the key.
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// The per-key lock is already held by someone else.
    #[error("key is locked: {key}")]
    Busy { key: String },

    /// `unlock` was called on a key that is not locked.
    #[error("key is not locked: {key}")]
    NotLocked { key: String },

    /// The caller's context was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// The caller's context deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Failure reported by the storage backend itself.
    #[error("backend error: {0}")]
    Backend(String),
}

impl KvError {
    /// Returns `true` for the `NotFound` variant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result alias for key-value core operations.
pub type KvResult<T> = Result<T, KvError>;
