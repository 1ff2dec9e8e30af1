use async_trait::async_trait;

use crate::context::Context;
use crate::error::KvResult;

/// Whole-value, lockable key-value core.
///
/// Implementations must satisfy these invariants:
/// - `get` returns exactly the bytes of the last successful `set`.
/// - `lock` is a try-acquire: it returns `KvError::Busy` instead of waiting.
/// - A lock stays held until `unlock` is called for the same key.
/// - Every method checks its [`Context`] before touching state.
#[async_trait]
pub trait KvCore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `KvError::NotFound` if nothing is stored there.
    async fn get(&self, ctx: &Context, key: &str) -> KvResult<Vec<u8>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, ctx: &Context, key: &str, value: Vec<u8>) -> KvResult<()>;

    /// Acquire the exclusive lock on `key`.
    async fn lock(&self, ctx: &Context, key: &str) -> KvResult<()>;

    /// Release the lock on `key`.
    ///
    /// Returns `KvError::NotLocked` if the key was not locked.
    async fn unlock(&self, ctx: &Context, key: &str) -> KvResult<()>;
}
