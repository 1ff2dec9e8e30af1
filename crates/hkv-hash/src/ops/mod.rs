//! [`HashOps`]: hash reads and writes over a [`KvCore`].
//!
//! - [`read`] — lock-free reads of the latest stored value
//! - [`write`] — whole-value overwrite and lock-protected field writes

mod read;
mod write;

use std::sync::Arc;

use hkv_codec::{FieldMap, ValueCodec};
use hkv_store::{Context, KvCore};
use tracing::warn;

use crate::config::HashConfig;
use crate::error::{HashError, HashResult};

/// Hash operations backed by a key-value core.
///
/// `HashOps` holds no state of its own besides the core handle and its
/// configuration; all coordination between concurrent callers goes through
/// the core's per-key lock.
pub struct HashOps<S: KvCore + ?Sized> {
    core: Arc<S>,
    config: HashConfig,
}

impl<S: KvCore + ?Sized> HashOps<S> {
    /// Create hash operations with the default configuration.
    pub fn new(core: Arc<S>) -> Self {
        Self::with_config(core, HashConfig::default())
    }

    pub fn with_config(core: Arc<S>, config: HashConfig) -> Self {
        Self { core, config }
    }

    /// The underlying key-value core.
    pub fn core(&self) -> &Arc<S> {
        &self.core
    }

    pub fn config(&self) -> &HashConfig {
        &self.config
    }

    /// Fetch and decode the field map stored under `key`.
    async fn load(&self, ctx: &Context, key: &str) -> HashResult<FieldMap> {
        let raw = self
            .core
            .get(ctx, key)
            .await
            .map_err(|e| HashError::from_kv(key, e))?;
        ValueCodec::decode_hash(&raw).map_err(|e| {
            let err = HashError::from_codec(key, e);
            if let HashError::TypeMismatch { found, .. } = &err {
                warn!(key, %found, "hash operation on non-hash value");
            }
            err
        })
    }
}

impl<S: KvCore + ?Sized> Clone for HashOps<S> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            config: self.config.clone(),
        }
    }
}

impl<S: KvCore + ?Sized> std::fmt::Debug for HashOps<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashOps")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
