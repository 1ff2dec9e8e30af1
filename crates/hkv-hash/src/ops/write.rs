use hkv_codec::{FieldMap, ValueCodec};
use hkv_store::{Context, KvCore};
use tracing::{debug, warn};

use super::HashOps;
use crate::error::{HashError, HashResult};
use crate::types::Hash;

/// What a read-modify-write does when the key holds no value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OnMissing {
    /// Start from an empty field map; the write creates the hash.
    Seed,
    /// Surface `NotFound`.
    Fail,
}

impl<S: KvCore + ?Sized> HashOps<S> {
    /// Replace the whole hash under `hash.key`.
    ///
    /// The previous value is not read, so this succeeds even when the key
    /// holds another value kind. No lock is taken unless
    /// `lock_whole_overwrite` is configured.
    pub async fn set_hash(&self, ctx: &Context, hash: Hash) -> HashResult<()> {
        let Hash { key, fields } = hash;
        let encoded = encode(&key, &fields)?;
        debug!(key = %key, fields = fields.len(), locked = self.config.lock_whole_overwrite, "set_hash");

        if !self.config.lock_whole_overwrite {
            return self.store(ctx, &key, encoded).await;
        }
        self.acquire(ctx, &key).await?;
        let result = self.store(ctx, &key, encoded).await;
        self.release(ctx, &key, result).await
    }

    /// Set one field, creating the hash if the key holds nothing.
    pub async fn set_hash_field(
        &self,
        ctx: &Context,
        key: &str,
        field: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) -> HashResult<()> {
        let (field, value) = (field.into(), value.into());
        debug!(key, field = %field, "set_hash_field");
        self.modify(ctx, key, OnMissing::Seed, move |fields| {
            fields.insert(field, value);
        })
        .await
    }

    /// Merge `updates` into the hash, creating it if the key holds nothing.
    /// Fields not named in `updates` keep their values.
    pub async fn set_hash_fields(&self, ctx: &Context, key: &str, updates: FieldMap) -> HashResult<()> {
        debug!(key, fields = updates.len(), "set_hash_fields");
        self.modify(ctx, key, OnMissing::Seed, move |fields| {
            fields.extend(updates);
        })
        .await
    }

    /// Remove one field. Removing an absent field succeeds; a missing key
    /// is `NotFound`.
    pub async fn del_hash_field(&self, ctx: &Context, key: &str, field: &str) -> HashResult<()> {
        debug!(key, field, "del_hash_field");
        self.modify(ctx, key, OnMissing::Fail, |fields| {
            fields.remove(field);
        })
        .await
    }

    /// Acquire, load, mutate, store, release.
    ///
    /// Once the lock is acquired it is released on every return path.
    async fn modify<F>(&self, ctx: &Context, key: &str, on_missing: OnMissing, mutate: F) -> HashResult<()>
    where
        F: FnOnce(&mut FieldMap) + Send,
    {
        self.acquire(ctx, key).await?;
        let result = self.load_mutate_store(ctx, key, on_missing, mutate).await;
        self.release(ctx, key, result).await
    }

    async fn load_mutate_store<F>(&self, ctx: &Context, key: &str, on_missing: OnMissing, mutate: F) -> HashResult<()>
    where
        F: FnOnce(&mut FieldMap) + Send,
    {
        let mut fields = match self.load(ctx, key).await {
            Ok(fields) => fields,
            Err(HashError::NotFound { .. }) if on_missing == OnMissing::Seed => FieldMap::new(),
            Err(e) => return Err(e),
        };
        mutate(&mut fields);
        let encoded = encode(key, &fields)?;
        self.store(ctx, key, encoded).await
    }

    async fn acquire(&self, ctx: &Context, key: &str) -> HashResult<()> {
        self.core
            .lock(ctx, key)
            .await
            .map_err(|e| HashError::from_kv(key, e))
    }

    async fn store(&self, ctx: &Context, key: &str, encoded: Vec<u8>) -> HashResult<()> {
        self.core
            .set(ctx, key, encoded)
            .await
            .map_err(|e| HashError::from_kv(key, e))
    }

    /// Release the lock on `key` and combine the outcome with `result`.
    ///
    /// The unlock runs on a detached context so that a cancelled or expired
    /// caller still gives the lock back. An error in `result` wins over a
    /// release failure.
    async fn release(&self, ctx: &Context, key: &str, result: HashResult<()>) -> HashResult<()> {
        let released = self.core.unlock(&ctx.detached(), key).await;
        match (result, released) {
            (result, Ok(())) => result,
            (Ok(()), Err(e)) => {
                warn!(key, error = %e, "lock release failed after commit");
                Err(HashError::Store(e))
            }
            (Err(err), Err(e)) => {
                warn!(key, error = %e, cause = %err, "lock release failed after error");
                Err(err)
            }
        }
    }
}

fn encode(key: &str, fields: &FieldMap) -> HashResult<Vec<u8>> {
    ValueCodec::encode_hash(fields).map_err(|e| HashError::from_codec(key, e))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use hkv_codec::{Value, ValueKind};
    use hkv_store::{InMemoryKvCore, KvError, KvResult};

    use super::*;
    use crate::config::HashConfig;

    fn ctx() -> Context {
        Context::background()
    }

    fn ops() -> HashOps<InMemoryKvCore> {
        HashOps::new(Arc::new(InMemoryKvCore::new()))
    }

    fn field_map(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(f, v)| (f.to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    /// Core wrapper with switchable faults. Every `set` records whether the
    /// key's lock was held at that moment.
    #[derive(Default)]
    struct FaultyCore {
        inner: InMemoryKvCore,
        fail_set: AtomicBool,
        cancel_on_get: AtomicBool,
        fail_unlock: AtomicBool,
        sets: Mutex<Vec<(String, bool)>>,
    }

    impl FaultyCore {
        fn sets(&self) -> Vec<(String, bool)> {
            self.sets.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl KvCore for FaultyCore {
        async fn get(&self, ctx: &Context, key: &str) -> KvResult<Vec<u8>> {
            if self.cancel_on_get.load(Ordering::SeqCst) {
                ctx.cancel();
            }
            self.inner.get(ctx, key).await
        }

        async fn set(&self, ctx: &Context, key: &str, value: Vec<u8>) -> KvResult<()> {
            let locked = self.inner.is_locked(key);
            self.sets.lock().unwrap().push((key.to_string(), locked));
            if self.fail_set.load(Ordering::SeqCst) {
                return Err(KvError::Backend("disk full".into()));
            }
            self.inner.set(ctx, key, value).await
        }

        async fn lock(&self, ctx: &Context, key: &str) -> KvResult<()> {
            self.inner.lock(ctx, key).await
        }

        async fn unlock(&self, ctx: &Context, key: &str) -> KvResult<()> {
            if self.fail_unlock.load(Ordering::SeqCst) {
                return Err(KvError::Backend("unlock lost".into()));
            }
            self.inner.unlock(ctx, key).await
        }
    }

    // -----------------------------------------------------------------------
    // Field writes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn set_field_creates_hash() {
        let ops = ops();
        ops.set_hash_field(&ctx(), "h", "a", "1").await.unwrap();
        assert_eq!(ops.get_hash_field(&ctx(), "h", "a").await.unwrap(), b"1");
        assert!(!ops.core().is_locked("h"));
    }

    #[tokio::test]
    async fn set_field_overwrites() {
        let ops = ops();
        ops.set_hash_field(&ctx(), "h", "a", "1").await.unwrap();
        ops.set_hash_field(&ctx(), "h", "a", "2").await.unwrap();
        assert_eq!(ops.get_hash_field(&ctx(), "h", "a").await.unwrap(), b"2");
        assert_eq!(ops.hash_length(&ctx(), "h").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn set_fields_merges() {
        let ops = ops();
        ops.set_hash_fields(&ctx(), "h", field_map(&[("a", "1"), ("b", "2")]))
            .await
            .unwrap();
        ops.set_hash_fields(&ctx(), "h", field_map(&[("b", "3"), ("c", "4")]))
            .await
            .unwrap();
        let hash = ops.get_hash(&ctx(), "h").await.unwrap();
        assert_eq!(hash.fields, field_map(&[("a", "1"), ("b", "3"), ("c", "4")]));
    }

    #[tokio::test]
    async fn del_field_is_idempotent() {
        let ops = ops();
        ops.set_hash_fields(&ctx(), "h", field_map(&[("a", "1"), ("b", "2")]))
            .await
            .unwrap();
        ops.del_hash_field(&ctx(), "h", "a").await.unwrap();
        ops.del_hash_field(&ctx(), "h", "a").await.unwrap();
        assert!(!ops.hash_has(&ctx(), "h", "a").await.unwrap());
        assert!(ops.hash_has(&ctx(), "h", "b").await.unwrap());
    }

    #[tokio::test]
    async fn del_last_field_leaves_empty_hash() {
        let ops = ops();
        ops.set_hash_field(&ctx(), "h", "a", "1").await.unwrap();
        ops.del_hash_field(&ctx(), "h", "a").await.unwrap();
        let hash = ops.get_hash(&ctx(), "h").await.unwrap();
        assert!(hash.is_empty());
    }

    #[tokio::test]
    async fn del_on_missing_key_is_not_found_and_unlocks() {
        let ops = ops();
        let err = ops.del_hash_field(&ctx(), "h", "a").await.unwrap_err();
        assert_eq!(err, HashError::NotFound { key: "h".into() });
        assert!(!ops.core().is_locked("h"));
        assert!(ops.core().is_empty());
    }

    // -----------------------------------------------------------------------
    // Lock protocol
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn busy_lock_fails_without_touching_state() {
        let ops = ops();
        ops.set_hash_field(&ctx(), "h", "a", "1").await.unwrap();
        ops.core().lock(&ctx(), "h").await.unwrap();

        let err = ops.set_hash_field(&ctx(), "h", "b", "2").await.unwrap_err();
        assert_eq!(err, HashError::LockFailed { key: "h".into() });
        assert!(err.is_retryable());

        // The foreign lock is still held and the value is unchanged.
        assert!(ops.core().is_locked("h"));
        assert!(!ops.hash_has(&ctx(), "h", "b").await.unwrap());
    }

    #[tokio::test]
    async fn type_mismatch_on_load_releases_lock() {
        let ops = ops();
        let list = ValueCodec::encode_value(&Value::List(vec![])).unwrap();
        ops.core().set(&ctx(), "l", list.clone()).await.unwrap();

        let err = ops.set_hash_field(&ctx(), "l", "a", "1").await.unwrap_err();
        assert_eq!(
            err,
            HashError::TypeMismatch {
                key: "l".into(),
                found: ValueKind::List,
            }
        );
        assert!(!ops.core().is_locked("l"));
        assert_eq!(ops.core().get(&ctx(), "l").await.unwrap(), list);
    }

    #[tokio::test]
    async fn corrupt_value_on_load_releases_lock() {
        let ops = ops();
        let mut bytes = ValueCodec::encode_hash(&field_map(&[("a", "1")])).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        ops.core().set(&ctx(), "c", bytes).await.unwrap();

        let err = ops.del_hash_field(&ctx(), "c", "a").await.unwrap_err();
        assert!(matches!(err, HashError::Decode { .. }));
        assert!(!ops.core().is_locked("c"));
    }

    #[tokio::test]
    async fn field_writes_store_while_holding_lock() {
        let core = Arc::new(FaultyCore::default());
        let ops = HashOps::new(Arc::clone(&core));

        ops.set_hash_field(&ctx(), "a", "f", "1").await.unwrap();
        ops.set_hash_fields(&ctx(), "b", field_map(&[("f", "1")]))
            .await
            .unwrap();
        ops.del_hash_field(&ctx(), "a", "f").await.unwrap();

        assert_eq!(
            core.sets(),
            vec![
                ("a".to_string(), true),
                ("b".to_string(), true),
                ("a".to_string(), true),
            ]
        );
        assert!(core.inner.locked_keys().is_empty());
    }

    #[tokio::test]
    async fn locked_overwrite_stores_while_holding_lock() {
        let core = Arc::new(FaultyCore::default());
        let ops = HashOps::with_config(Arc::clone(&core), HashConfig::locked_overwrite());
        ops.set_hash(&ctx(), Hash::new("h").with_field("a", "1"))
            .await
            .unwrap();
        assert_eq!(core.sets(), vec![("h".to_string(), true)]);
        assert!(!core.inner.is_locked("h"));
    }

    #[tokio::test]
    async fn default_overwrite_stores_without_lock() {
        let core = Arc::new(FaultyCore::default());
        let ops = HashOps::new(Arc::clone(&core));
        ops.set_hash(&ctx(), Hash::new("h")).await.unwrap();
        assert_eq!(core.sets(), vec![("h".to_string(), false)]);
    }

    #[tokio::test]
    async fn failed_store_releases_lock() {
        let core = Arc::new(FaultyCore::default());
        let ops = HashOps::new(Arc::clone(&core));
        core.fail_set.store(true, Ordering::SeqCst);

        let err = ops.set_hash_field(&ctx(), "h", "a", "1").await.unwrap_err();
        assert_eq!(err, HashError::Store(KvError::Backend("disk full".into())));
        assert!(!core.inner.is_locked("h"));
        assert!(core.inner.is_empty());
    }

    #[tokio::test]
    async fn cancellation_mid_sequence_releases_lock() {
        let core = Arc::new(FaultyCore::default());
        let ops = HashOps::new(Arc::clone(&core));
        core.cancel_on_get.store(true, Ordering::SeqCst);

        let ctx = Context::background();
        let err = ops.set_hash_field(&ctx, "h", "a", "1").await.unwrap_err();
        assert_eq!(err, HashError::Store(KvError::Cancelled));
        assert!(ctx.is_done());
        assert!(!core.inner.is_locked("h"));
    }

    #[tokio::test]
    async fn cancelled_before_lock_does_nothing() {
        let ops = ops();
        let ctx = Context::background();
        ctx.cancel();
        let err = ops.set_hash_field(&ctx, "h", "a", "1").await.unwrap_err();
        assert_eq!(err, HashError::Store(KvError::Cancelled));
        assert!(!ops.core().is_locked("h"));
        assert!(ops.core().is_empty());
    }

    #[tokio::test]
    async fn release_failure_after_commit_is_reported() {
        let core = Arc::new(FaultyCore::default());
        let ops = HashOps::new(Arc::clone(&core));
        core.fail_unlock.store(true, Ordering::SeqCst);

        let err = ops.set_hash_field(&ctx(), "h", "a", "1").await.unwrap_err();
        assert_eq!(err, HashError::Store(KvError::Backend("unlock lost".into())));
        // The value itself was committed.
        assert!(core.inner.get(&ctx(), "h").await.is_ok());
    }

    #[tokio::test]
    async fn original_error_wins_over_release_failure() {
        let core = Arc::new(FaultyCore::default());
        let ops = HashOps::new(Arc::clone(&core));
        core.fail_set.store(true, Ordering::SeqCst);
        core.fail_unlock.store(true, Ordering::SeqCst);

        let err = ops.set_hash_field(&ctx(), "h", "a", "1").await.unwrap_err();
        assert_eq!(err, HashError::Store(KvError::Backend("disk full".into())));
    }

    // -----------------------------------------------------------------------
    // Whole-value overwrite
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn set_hash_replaces_everything() {
        let ops = ops();
        ops.set_hash_field(&ctx(), "h", "old", "1").await.unwrap();
        ops.set_hash(&ctx(), Hash::new("h").with_field("new", "2"))
            .await
            .unwrap();
        assert_eq!(ops.hash_fields(&ctx(), "h").await.unwrap(), vec!["new"]);
    }

    #[tokio::test]
    async fn set_hash_ignores_held_lock_by_default() {
        let ops = ops();
        ops.core().lock(&ctx(), "h").await.unwrap();
        ops.set_hash(&ctx(), Hash::new("h").with_field("a", "1"))
            .await
            .unwrap();
        assert!(ops.core().is_locked("h"));
        assert_eq!(ops.hash_length(&ctx(), "h").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn set_hash_overwrites_other_kinds() {
        let ops = ops();
        let scalar = ValueCodec::encode_value(&Value::Bytes(b"s".to_vec())).unwrap();
        ops.core().set(&ctx(), "k", scalar).await.unwrap();
        ops.set_hash(&ctx(), Hash::new("k")).await.unwrap();
        assert!(ops.get_hash(&ctx(), "k").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn locked_overwrite_respects_lock() {
        let ops = HashOps::with_config(
            Arc::new(InMemoryKvCore::new()),
            HashConfig::locked_overwrite(),
        );
        ops.core().lock(&ctx(), "h").await.unwrap();
        let err = ops
            .set_hash(&ctx(), Hash::new("h").with_field("a", "1"))
            .await
            .unwrap_err();
        assert_eq!(err, HashError::LockFailed { key: "h".into() });

        ops.core().unlock(&ctx(), "h").await.unwrap();
        ops.set_hash(&ctx(), Hash::new("h").with_field("a", "1"))
            .await
            .unwrap();
        assert!(!ops.core().is_locked("h"));
        assert_eq!(ops.hash_length(&ctx(), "h").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn key_is_not_stored_in_payload() {
        let ops = ops();
        ops.set_hash(&ctx(), Hash::new("some-distinctive-key").with_field("f", "v"))
            .await
            .unwrap();
        let raw = ops.core().get(&ctx(), "some-distinctive-key").await.unwrap();
        let needle = b"some-distinctive-key";
        assert!(!raw.windows(needle.len()).any(|w| w == needle));
    }
}
