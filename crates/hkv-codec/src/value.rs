use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field name to opaque value, ordered by field name.
pub type FieldMap = BTreeMap<String, Vec<u8>>;

/// The kind of value held in an envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// A single opaque byte string.
    Bytes,
    /// An ordered sequence of byte strings.
    List,
    /// A field map.
    Hash,
}

impl ValueKind {
    /// Tag byte written into the envelope header.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Bytes => 1,
            Self::List => 2,
            Self::Hash => 3,
        }
    }

    /// Parse a tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Bytes),
            2 => Some(Self::List),
            3 => Some(Self::Hash),
            _ => None,
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes => write!(f, "bytes"),
            Self::List => write!(f, "list"),
            Self::Hash => write!(f, "hash"),
        }
    }
}

/// A decoded value of any kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Bytes(Vec<u8>),
    List(Vec<Vec<u8>>),
    Hash(FieldMap),
}

impl Value {
    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bytes(_) => ValueKind::Bytes,
            Self::List(_) => ValueKind::List,
            Self::Hash(_) => ValueKind::Hash,
        }
    }
}
