use hkv_store::{Context, KvCore};
use tracing::debug;

use super::HashOps;
use crate::error::{HashError, HashResult};
use crate::types::Hash;

impl<S: KvCore + ?Sized> HashOps<S> {
    /// Read the whole hash stored under `key`.
    ///
    /// Fails with `NotFound` if nothing is stored, `TypeMismatch` if the key
    /// holds another value kind, and `Decode` if the bytes are damaged.
    pub async fn get_hash(&self, ctx: &Context, key: &str) -> HashResult<Hash> {
        let fields = self.load(ctx, key).await?;
        debug!(key, fields = fields.len(), "get_hash");
        Ok(Hash::from_parts(key, fields))
    }

    /// Read one field. Fails with `FieldNotFound` if the hash lacks it.
    pub async fn get_hash_field(&self, ctx: &Context, key: &str, field: &str) -> HashResult<Vec<u8>> {
        let mut hash = self.get_hash(ctx, key).await?;
        hash.fields
            .remove(field)
            .ok_or_else(|| HashError::FieldNotFound {
                key: key.to_string(),
                field: field.to_string(),
            })
    }

    /// Read a subset of fields. Requested fields the hash lacks are omitted.
    pub async fn get_hash_fields<I, F>(&self, ctx: &Context, key: &str, fields: I) -> HashResult<Hash>
    where
        I: IntoIterator<Item = F>,
        F: AsRef<str>,
    {
        let hash = self.get_hash(ctx, key).await?;
        Ok(hash.select(fields))
    }

    /// Whether the hash under `key` has `field`.
    pub async fn hash_has(&self, ctx: &Context, key: &str, field: &str) -> HashResult<bool> {
        Ok(self.get_hash(ctx, key).await?.contains(field))
    }

    /// Number of fields in the hash.
    pub async fn hash_length(&self, ctx: &Context, key: &str) -> HashResult<usize> {
        Ok(self.get_hash(ctx, key).await?.len())
    }

    /// All field names, ascending.
    pub async fn hash_fields(&self, ctx: &Context, key: &str) -> HashResult<Vec<String>> {
        Ok(self.get_hash(ctx, key).await?.field_names())
    }

    /// All values, in the ascending order of their field names.
    pub async fn hash_values(&self, ctx: &Context, key: &str) -> HashResult<Vec<Vec<u8>>> {
        Ok(self.get_hash(ctx, key).await?.into_values())
    }
}
