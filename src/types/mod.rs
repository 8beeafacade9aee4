#![forbid(unsafe_code)]

//! Identifiers, visibility labels and the crate-wide error type.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Checksum helpers used to validate externally stored values.
pub mod checksum;

pub use checksum::{blob_crc32, Checksum, Crc32Fast};

/// Logical-clock value attached to every mutation.
pub type Timestamp = i64;

/// Externally assigned identifier of a graph element.
///
/// The id is never empty; [`ElementId::new`] is the only way to build one.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct ElementId(Arc<str>);

impl ElementId {
    /// Creates an element id, rejecting empty strings.
    pub fn new(id: impl AsRef<str>) -> Result<Self> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(StrataError::Invalid("element id is empty"));
        }
        Ok(Self(Arc::from(id)))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ElementId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ElementId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ElementId::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Opaque access-control label. The empty label is readable by everyone.
#[derive(Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Visibility(String);

impl Visibility {
    /// Creates a visibility label from its string form.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The universally readable label.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Returns `true` for the universally readable label.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the label string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Visibility {
    fn from(value: &str) -> Self {
        Visibility::new(value)
    }
}

impl From<String> for Visibility {
    fn from(value: String) -> Self {
        Visibility(value)
    }
}

/// Errors surfaced by the mutation-log engine.
#[derive(thiserror::Error, Debug)]
pub enum StrataError {
    /// Underlying I/O failure (configuration files, scripts).
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// Stored data failed validation.
    #[error("corruption: {0}")]
    Corruption(&'static str),
    /// Caller supplied an argument the engine cannot accept.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    /// Requested element or value does not exist.
    #[error("not found")]
    NotFound,
    /// An indirect property value could not be resolved.
    #[error("failed to load value of property {key}/{name} at {timestamp}: {reason}")]
    ValueLoad {
        /// Property key.
        key: String,
        /// Property name.
        name: String,
        /// Timestamp the value was requested at.
        timestamp: Timestamp,
        /// Loader failure description.
        reason: String,
    },
    /// Configuration could not be parsed.
    #[error("config: {0}")]
    Config(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, StrataError>;
