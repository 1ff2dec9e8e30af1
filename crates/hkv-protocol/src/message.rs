use serde::{Deserialize, Serialize};

use hkv_hash::{Hash, HashError};
use hkv_store::KvError;

use crate::codec::Message;

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// One request per hash operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashRequest {
    GetHash { key: String },
    GetHashField { key: String, field: String },
    GetHashFields { key: String, fields: Vec<String> },
    HashHas { key: String, field: String },
    HashLength { key: String },
    HashFields { key: String },
    HashValues { key: String },
    SetHash { hash: Hash },
    SetHashField { key: String, field: String, value: Vec<u8> },
    /// `hash.fields` is merged into the stored hash under `hash.key`.
    SetHashFields { hash: Hash },
    DelHashField { key: String, field: String },
}

impl HashRequest {
    /// The key this request addresses.
    pub fn key(&self) -> &str {
        match self {
            Self::GetHash { key }
            | Self::GetHashField { key, .. }
            | Self::GetHashFields { key, .. }
            | Self::HashHas { key, .. }
            | Self::HashLength { key }
            | Self::HashFields { key }
            | Self::HashValues { key }
            | Self::SetHashField { key, .. }
            | Self::DelHashField { key, .. } => key,
            Self::SetHash { hash } | Self::SetHashFields { hash } => &hash.key,
        }
    }

    /// Whether the request mutates stored state.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::SetHash { .. }
                | Self::SetHashField { .. }
                | Self::SetHashFields { .. }
                | Self::DelHashField { .. }
        )
    }
}

impl Message for HashRequest {
    fn type_tag(&self) -> u8 {
        match self {
            Self::GetHash { .. } => 1,
            Self::GetHashField { .. } => 2,
            Self::GetHashFields { .. } => 3,
            Self::HashHas { .. } => 4,
            Self::HashLength { .. } => 5,
            Self::HashFields { .. } => 6,
            Self::HashValues { .. } => 7,
            Self::SetHash { .. } => 8,
            Self::SetHashField { .. } => 9,
            Self::SetHashFields { .. } => 10,
            Self::DelHashField { .. } => 11,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::GetHash { .. } => "GetHash",
            Self::GetHashField { .. } => "GetHashField",
            Self::GetHashFields { .. } => "GetHashFields",
            Self::HashHas { .. } => "HashHas",
            Self::HashLength { .. } => "HashLength",
            Self::HashFields { .. } => "HashFields",
            Self::HashValues { .. } => "HashValues",
            Self::SetHash { .. } => "SetHash",
            Self::SetHashField { .. } => "SetHashField",
            Self::SetHashFields { .. } => "SetHashFields",
            Self::DelHashField { .. } => "DelHashField",
        }
    }
}

/// Responses. Every request answers with exactly one of these.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashResponse {
    Hash(Hash),
    Value(Vec<u8>),
    Bool(bool),
    Length(u64),
    Fields(Vec<String>),
    Values(Vec<Vec<u8>>),
    Done,
    Error { code: u32, message: String },
}

impl HashResponse {
    pub fn error(code: u32, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }

    /// The response for a failed hash operation.
    pub fn from_error(err: &HashError) -> Self {
        Self::error(codes::for_error(err), err.to_string())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

impl Message for HashResponse {
    fn type_tag(&self) -> u8 {
        match self {
            Self::Hash(_) => 128,
            Self::Value(_) => 129,
            Self::Bool(_) => 130,
            Self::Length(_) => 131,
            Self::Fields(_) => 132,
            Self::Values(_) => 133,
            Self::Done => 134,
            Self::Error { .. } => 255,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Hash(_) => "Hash",
            Self::Value(_) => "Value",
            Self::Bool(_) => "Bool",
            Self::Length(_) => "Length",
            Self::Fields(_) => "Fields",
            Self::Values(_) => "Values",
            Self::Done => "Done",
            Self::Error { .. } => "Error",
        }
    }
}

pub mod codes {
    use super::*;

    pub const BAD_REQUEST: u32 = 400;
    pub const NOT_FOUND: u32 = 404;
    pub const TYPE_MISMATCH: u32 = 409;
    pub const FIELD_NOT_FOUND: u32 = 410;
    pub const LOCK_FAILED: u32 = 423;
    pub const CANCELLED: u32 = 499;
    pub const DECODE: u32 = 500;
    pub const TIMEOUT: u32 = 504;
    pub const INTERNAL: u32 = 520;

    /// Code reported to remote callers for `err`.
    pub fn for_error(err: &HashError) -> u32 {
        match err {
            HashError::NotFound { .. } => NOT_FOUND,
            HashError::TypeMismatch { .. } => TYPE_MISMATCH,
            HashError::FieldNotFound { .. } => FIELD_NOT_FOUND,
            HashError::LockFailed { .. } => LOCK_FAILED,
            HashError::Decode { .. } => DECODE,
            HashError::Store(KvError::Cancelled) => CANCELLED,
            HashError::Store(KvError::DeadlineExceeded) => TIMEOUT,
            HashError::Store(_) | HashError::Encode(_) => INTERNAL,
        }
    }
}
