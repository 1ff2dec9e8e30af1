//! Key-value core for hkv.
//!
//! The core stores opaque byte blobs under string keys and offers four
//! primitives: whole-value `get`/`set` and per-key `lock`/`unlock`. It knows
//! nothing about the shape of the values it holds; typed values (hashes,
//! lists, scalars) are layered on top by the `hkv-codec` and `hkv-hash`
//! crates.
//!
//! # Backends
//!
//! All backends implement the [`KvCore`] trait:
//!
//! - [`InMemoryKvCore`] -- `HashMap`-based core for tests and embedding
//!
//! # Rules
//!
//! 1. `lock` never blocks: contention is reported as [`KvError::Busy`].
//! 2. Locks are advisory and whole-key; `get`/`set` do not consult them.
//! 3. Every primitive takes a [`Context`] and refuses to run once it is
//!    cancelled or past its deadline.

pub mod context;
pub mod error;
pub mod memory;
pub mod traits;

pub use context::Context;
pub use error::{KvError, KvResult};
pub use memory::InMemoryKvCore;
pub use traits::KvCore;
