//! Wire protocol for hkv.
//!
//! Defines one request/response pair per hash operation, the numeric error
//! codes returned to remote callers, and the framing used on the wire.

pub mod codec;
pub mod error;
pub mod message;

pub use codec::{Message, RpcCodec};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{codes, HashRequest, HashResponse, MAX_MESSAGE_SIZE, PROTOCOL_VERSION};
