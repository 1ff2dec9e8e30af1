//! Value encoding for hkv.
//!
//! Every value stored in the key-value core by this system is wrapped in a
//! small envelope that names its [`ValueKind`]. Decoding a hash therefore
//! tells three situations apart without inspecting any decoder message:
//!
//! - the bytes are a well-formed hash → a [`FieldMap`]
//! - the bytes are a well-formed value of another kind, or raw bytes with
//!   no envelope at all → [`CodecError::TypeMismatch`]
//! - the bytes are damaged → one of the corruption variants of
//!   [`CodecError`]

pub mod codec;
pub mod error;
pub mod value;

pub use codec::{ValueCodec, ENVELOPE_VERSION, HEADER_SIZE, MAGIC};
pub use error::{CodecError, CodecResult};
pub use value::{FieldMap, Value, ValueKind};
