//! Typed hash values for hkv.
//!
//! A hash is a map from field name to opaque bytes, stored as a single
//! encoded value under one key of the [`KvCore`](hkv_store::KvCore). This
//! crate provides [`HashOps`], which exposes field-level reads and writes on
//! top of a core that only understands whole values.
//!
//! # Architecture
//!
//! - **Reads** fetch and decode the current value. They take no lock and may
//!   observe a value that an in-flight write is about to replace.
//! - **Field writes** (`set_hash_field`, `set_hash_fields`, `del_hash_field`)
//!   run a read-modify-write sequence under the core's per-key lock: acquire,
//!   load, mutate, encode, store, release. The lock is released on every exit
//!   path once it has been acquired.
//! - **Whole-value writes** (`set_hash`) replace the value without reading it
//!   and, unless [`HashConfig::lock_whole_overwrite`] is set, without locking.
//!
//! # Modules
//!
//! - [`error`] — [`HashError`] and its mapping from core and codec failures
//! - [`types`] — the [`Hash`] value
//! - [`config`] — [`HashConfig`]
//! - [`ops`] — [`HashOps`] and its read and write paths

pub mod config;
pub mod error;
pub mod ops;
pub mod types;

pub use config::HashConfig;
pub use error::{HashError, HashResult};
pub use hkv_codec::FieldMap;
pub use ops::HashOps;
pub use types::Hash;
