use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Timestamp, Visibility};

use super::vstore::ValueRef;

/// Property value carried by a mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// Owned string.
    Str(String),
    /// Owned byte vector.
    Bytes(Vec<u8>),
    /// Date value represented as Unix timestamp (days since epoch).
    Date(i64),
    /// DateTime value represented as Unix timestamp (milliseconds since epoch).
    DateTime(i64),
    /// Indirect reference to a value held by a [`super::LargeValueLoader`].
    Ref(ValueRef),
}

impl PropValue {
    /// Returns the indirect reference when the value is not stored inline.
    pub fn as_ref_value(&self) -> Option<&ValueRef> {
        match self {
            PropValue::Ref(vref) => Some(vref),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => write!(f, "null"),
            PropValue::Bool(v) => write!(f, "{v}"),
            PropValue::Int(v) => write!(f, "{v}"),
            PropValue::Float(v) => write!(f, "{v}"),
            PropValue::Str(v) => write!(f, "{v}"),
            PropValue::Bytes(v) => write!(f, "bytes(len={})", v.len()),
            PropValue::Date(v) => write!(f, "date({v})"),
            PropValue::DateTime(v) => write!(f, "datetime({v})"),
            PropValue::Ref(v) => write!(f, "ref(id={}, len={})", v.id, v.len),
        }
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_owned())
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

/// One metadata entry attached to a property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Metadata value.
    pub value: PropValue,
    /// Visibility of the metadata entry itself.
    #[serde(default)]
    pub visibility: Visibility,
}

/// Metadata map of a property, keyed by metadata key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    entries: BTreeMap<String, MetadataEntry>,
}

impl Metadata {
    /// Creates empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: PropValue, visibility: Visibility) -> Self {
        self.insert(key, value, visibility);
        self
    }

    /// Inserts or replaces one entry.
    pub fn insert(&mut self, key: impl Into<String>, value: PropValue, visibility: Visibility) {
        self.entries
            .insert(key.into(), MetadataEntry { value, visibility });
    }

    /// Looks up an entry.
    pub fn get(&self, key: &str) -> Option<&MetadataEntry> {
        self.entries.get(key)
    }

    /// Overlays `other` on top of `self`; keys present in both take `other`'s entry.
    pub fn merge(&mut self, other: &Metadata) {
        for (key, entry) in &other.entries {
            self.entries.insert(key.clone(), entry.clone());
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Caller-supplied switches controlling what a read returns.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FetchHints {
    /// Whether hidden properties are returned.
    pub include_hidden: bool,
    /// Whether property metadata is returned.
    pub include_property_metadata: bool,
}

impl FetchHints {
    /// Everything except hidden data.
    pub const ALL: FetchHints = FetchHints {
        include_hidden: false,
        include_property_metadata: true,
    };

    /// Everything, hidden data included.
    pub const ALL_INCLUDING_HIDDEN: FetchHints = FetchHints {
        include_hidden: true,
        include_property_metadata: true,
    };

    /// Property values only, no metadata and no hidden data.
    pub const PROPERTIES: FetchHints = FetchHints {
        include_hidden: false,
        include_property_metadata: false,
    };

    /// Returns the metadata visible under these hints.
    pub fn metadata(&self, metadata: &Metadata) -> Metadata {
        if self.include_property_metadata {
            metadata.clone()
        } else {
            Metadata::new()
        }
    }
}

impl Default for FetchHints {
    fn default() -> Self {
        FetchHints::ALL
    }
}

/// The (key, name, visibility) triple naming one property slot.
///
/// Ordering sorts by name, then key, then visibility.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct PropertyIdentity {
    /// Property name.
    pub name: String,
    /// Property key distinguishing multi-valued properties.
    pub key: String,
    /// Property visibility.
    pub visibility: Visibility,
}

impl PropertyIdentity {
    /// Creates an identity.
    pub fn new(key: impl Into<String>, name: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            visibility,
        }
    }
}

/// Selects property mutations by identity; `None` fields match anything.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PropertyFilter {
    /// Required key.
    pub key: Option<String>,
    /// Required name.
    pub name: Option<String>,
    /// Required property visibility.
    pub visibility: Option<Visibility>,
}

impl PropertyFilter {
    /// Matches every property.
    pub fn any() -> Self {
        Self::default()
    }

    /// Matches exactly one identity.
    pub fn identity(key: impl Into<String>, name: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            key: Some(key.into()),
            name: Some(name.into()),
            visibility: Some(visibility),
        }
    }

    /// Matches a key/name pair under any visibility.
    pub fn key_name(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            name: Some(name.into()),
            visibility: None,
        }
    }

    /// Returns `true` when `identity` satisfies every constrained field.
    pub fn matches(&self, key: &str, name: &str, visibility: &Visibility) -> bool {
        self.key.as_deref().map_or(true, |k| k == key)
            && self.name.as_deref().map_or(true, |n| n == name)
            && self.visibility.as_ref().map_or(true, |v| v == visibility)
    }
}

/// Current state of one property as reconstructed from the log.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Property {
    /// Property key.
    pub key: String,
    /// Property name.
    pub name: String,
    /// Resolved value.
    pub value: PropValue,
    /// Metadata as filtered by the fetch hints.
    pub metadata: Metadata,
    /// Largest timestamp among the mutations folded into this property.
    pub timestamp: Timestamp,
    /// Readable visibilities currently hiding this property.
    pub hidden_visibilities: BTreeSet<Visibility>,
    /// Property visibility.
    pub visibility: Visibility,
}

impl Property {
    /// Returns the identity triple of this property.
    pub fn identity(&self) -> PropertyIdentity {
        PropertyIdentity::new(self.key.clone(), self.name.clone(), self.visibility.clone())
    }

    /// Returns `true` when any visibility hides this property.
    pub fn is_hidden(&self) -> bool {
        !self.hidden_visibilities.is_empty()
    }
}

/// One past state of a property identity.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoricalPropertyValue {
    /// Property key.
    pub key: String,
    /// Property name.
    pub name: String,
    /// Property visibility.
    pub visibility: Visibility,
    /// Value at this point; `None` when deleted before any value was seen.
    pub value: Option<PropValue>,
    /// Metadata at this point.
    pub metadata: Metadata,
    /// Timestamp of the mutation that produced this entry.
    pub timestamp: Timestamp,
    /// `true` for soft-delete entries.
    pub is_deleted: bool,
}
