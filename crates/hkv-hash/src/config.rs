use serde::{Deserialize, Serialize};

/// Behavior switches for [`HashOps`](crate::HashOps).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashConfig {
    /// When `true`, `set_hash` holds the per-key lock around its store, so a
    /// whole-value overwrite can no longer interleave with a field-level
    /// read-modify-write on the same key. Off by default: `set_hash` then
    /// writes unconditionally and takes no lock.
    pub lock_whole_overwrite: bool,
}

impl HashConfig {
    /// Configuration that serializes whole-value overwrites with field writes.
    pub fn locked_overwrite() -> Self {
        Self {
            lock_whole_overwrite: true,
        }
    }
}
