use crate::value::ValueKind;

/// Errors produced while encoding or decoding stored values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The bytes hold a different value kind: either a valid envelope of
    /// another kind or raw bytes with no envelope at all.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: ValueKind,
        found: ValueKind,
    },

    /// The envelope magic is present but the header is cut short.
    #[error("truncated value: {len} bytes, header needs {needed}")]
    Truncated { len: usize, needed: usize },

    /// The envelope was written by an unknown format version.
    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u8),

    /// The kind byte names no known value kind.
    #[error("unknown value kind {0}")]
    UnknownKind(u8),

    /// CRC over kind and payload does not match the header.
    #[error("checksum mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { expected: u32, computed: u32 },

    /// The payload failed to deserialize.
    #[error("payload decode error: {0}")]
    Payload(String),

    /// The value failed to serialize.
    #[error("encode error: {0}")]
    Encode(String),
}

impl CodecError {
    /// Returns `true` if the stored value is intact but of another kind.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }

    /// Returns `true` if the stored bytes are damaged or unreadable.
    pub fn is_corrupt(&self) -> bool {
        !matches!(self, Self::TypeMismatch { .. } | Self::Encode(_))
    }
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
