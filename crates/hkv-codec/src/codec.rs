use crate::error::{CodecError, CodecResult};
use crate::value::{FieldMap, Value, ValueKind};

/// Envelope magic bytes.
pub const MAGIC: [u8; 2] = *b"HK";

/// Current envelope format version.
pub const ENVELOPE_VERSION: u8 = 1;

/// Header size: 2 bytes magic + 1 byte version + 1 byte kind + 4 bytes CRC.
pub const HEADER_SIZE: usize = 8;

/// Encoder/decoder for stored values.
///
/// Envelope format:
/// ```text
/// [2 bytes: magic "HK"]
/// [1 byte:  envelope version]
/// [1 byte:  value kind tag]
/// [4 bytes: CRC32 of kind tag + payload (little-endian u32)]
/// [N bytes: payload (bincode)]
/// ```
pub struct ValueCodec;

impl ValueCodec {
    /// Encode a hash field map.
    ///
    /// The output is deterministic: equal maps always produce equal bytes.
    pub fn encode_hash(fields: &FieldMap) -> CodecResult<Vec<u8>> {
        let payload =
            bincode::serialize(fields).map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(Self::frame(ValueKind::Hash, &payload))
    }

    /// Decode a hash field map.
    ///
    /// Bytes without the envelope magic are a raw scalar written straight
    /// through the core and yield `CodecError::TypeMismatch` with
    /// `found: ValueKind::Bytes`, as does a valid envelope of another kind.
    /// Every other failure is a corruption variant.
    pub fn decode_hash(data: &[u8]) -> CodecResult<FieldMap> {
        let kind = match Self::unframe(data)? {
            Frame::Envelope(ValueKind::Hash, payload) => {
                return bincode::deserialize(payload)
                    .map_err(|e| CodecError::Payload(e.to_string()));
            }
            Frame::Envelope(kind, _) => kind,
            Frame::Raw => ValueKind::Bytes,
        };
        Err(CodecError::TypeMismatch {
            expected: ValueKind::Hash,
            found: kind,
        })
    }

    /// Encode a value of any kind.
    pub fn encode_value(value: &Value) -> CodecResult<Vec<u8>> {
        let payload = match value {
            Value::Bytes(bytes) => bincode::serialize(bytes),
            Value::List(items) => bincode::serialize(items),
            Value::Hash(fields) => bincode::serialize(fields),
        }
        .map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(Self::frame(value.kind(), &payload))
    }

    fn frame(kind: ValueKind, payload: &[u8]) -> Vec<u8> {
        let crc = checksum(kind.tag(), payload);
        let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
        buf.extend_from_slice(&MAGIC);
        buf.push(ENVELOPE_VERSION);
        buf.push(kind.tag());
        buf.extend_from_slice(&crc.to_le_bytes());
        buf.extend_from_slice(payload);
        buf
    }

    fn unframe(data: &[u8]) -> CodecResult<Frame<'_>> {
        if !data.starts_with(&MAGIC) {
            return Ok(Frame::Raw);
        }
        if data.len() < HEADER_SIZE {
            return Err(CodecError::Truncated {
                len: data.len(),
                needed: HEADER_SIZE,
            });
        }
        if data[2] != ENVELOPE_VERSION {
            return Err(CodecError::UnsupportedVersion(data[2]));
        }
        let tag = data[3];
        let expected = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        let payload = &data[HEADER_SIZE..];
        let computed = checksum(tag, payload);
        if expected != computed {
            return Err(CodecError::ChecksumMismatch { expected, computed });
        }
        let kind = ValueKind::from_tag(tag).ok_or(CodecError::UnknownKind(tag))?;
        Ok(Frame::Envelope(kind, payload))
    }
}

/// What sits under a key, as far as framing can tell.
enum Frame<'a> {
    /// A checked envelope and its payload.
    Envelope(ValueKind, &'a [u8]),
    /// No envelope magic: raw bytes stored by something other than this codec.
    Raw,
}

fn checksum(tag: u8, payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&[tag]);
    hasher.update(payload);
    hasher.finalize()
}
