//! The [`Hash`] value.

use serde::{Deserialize, Serialize};

use hkv_codec::FieldMap;

/// A named field map.
///
/// `key` addresses the value in the key-value core and is never part of the
/// encoded payload: only `fields` is stored, and every operation that
/// returns a `Hash` reattaches the key it was read from.
///
/// `fields` is ordered by field name, so [`Hash::field_names`] and
/// [`Hash::into_values`] enumerate in the same ascending order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hash {
    pub key: String,
    pub fields: FieldMap,
}

impl Hash {
    /// An empty hash for `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: FieldMap::new(),
        }
    }

    /// A hash from a key and an existing field map.
    pub fn from_parts(key: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }

    /// Builder: set `field` to `value`.
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&[u8]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in ascending order.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    /// Values in ascending field-name order.
    ///
    /// Produced from one pass over the ordered entries, so index `i` always
    /// belongs to `field_names()[i]`.
    pub fn into_values(self) -> Vec<Vec<u8>> {
        self.fields.into_iter().map(|(_, value)| value).collect()
    }

    /// A new hash with the same key holding only the requested fields that
    /// exist here. Requested fields that are absent are skipped.
    pub fn select<I, F>(&self, fields: I) -> Hash
    where
        I: IntoIterator<Item = F>,
        F: AsRef<str>,
    {
        let selected = fields
            .into_iter()
            .filter_map(|field| {
                let field = field.as_ref();
                self.fields
                    .get(field)
                    .map(|value| (field.to_string(), value.clone()))
            })
            .collect();
        Hash::from_parts(self.key.clone(), selected)
    }
}
