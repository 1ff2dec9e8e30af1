use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use tracing::trace;

use crate::context::Context;
use crate::error::{KvError, KvResult};
use crate::traits::KvCore;

/// In-memory, HashMap-based key-value core.
///
/// Intended for tests and embedding. Values live behind a `RwLock`; the set
/// of currently locked keys lives behind a separate `Mutex`, so holding a key
/// lock never blocks reads or writes of other keys.
pub struct InMemoryKvCore {
    values: RwLock<HashMap<String, Vec<u8>>>,
    locks: Mutex<HashSet<String>>,
}

fn poisoned<E: std::fmt::Display>(e: E) -> KvError {
    KvError::Backend(format!("lock poisoned: {e}"))
}

impl InMemoryKvCore {
    /// Create a new empty core.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            locks: Mutex::new(HashSet::new()),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.values.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `key` is currently locked.
    pub fn is_locked(&self, key: &str) -> bool {
        self.locks
            .lock()
            .map(|held| held.contains(key))
            .unwrap_or(false)
    }

    /// Sorted list of all currently locked keys.
    pub fn locked_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .locks
            .lock()
            .map(|held| held.iter().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Remove all values and release all locks.
    pub fn clear(&self) {
        if let Ok(mut values) = self.values.write() {
            values.clear();
        }
        if let Ok(mut held) = self.locks.lock() {
            held.clear();
        }
    }
}

impl Default for InMemoryKvCore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvCore for InMemoryKvCore {
    async fn get(&self, ctx: &Context, key: &str) -> KvResult<Vec<u8>> {
        ctx.check()?;
        let values = self.values.read().map_err(poisoned)?;
        values.get(key).cloned().ok_or_else(|| KvError::NotFound {
            key: key.to_string(),
        })
    }

    async fn set(&self, ctx: &Context, key: &str, value: Vec<u8>) -> KvResult<()> {
        ctx.check()?;
        let mut values = self.values.write().map_err(poisoned)?;
        trace!(key, size = value.len(), "set");
        values.insert(key.to_string(), value);
        Ok(())
    }

    async fn lock(&self, ctx: &Context, key: &str) -> KvResult<()> {
        ctx.check()?;
        let mut held = self.locks.lock().map_err(poisoned)?;
        if !held.insert(key.to_string()) {
            return Err(KvError::Busy {
                key: key.to_string(),
            });
        }
        trace!(key, "locked");
        Ok(())
    }

    async fn unlock(&self, ctx: &Context, key: &str) -> KvResult<()> {
        ctx.check()?;
        let mut held = self.locks.lock().map_err(poisoned)?;
        if !held.remove(key) {
            return Err(KvError::NotLocked {
                key: key.to_string(),
            });
        }
        trace!(key, "unlocked");
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryKvCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKvCore")
            .field("key_count", &self.len())
            .field("locked", &self.locked_keys().len())
            .finish()
    }
}
