//! JSON mutation scripts and their replay into an [`InMemoryTable`].
//!
//! A script lists elements, each with the mutations to apply in order:
//!
//! ```json
//! {
//!   "elements": [
//!     {
//!       "id": "v1",
//!       "kind": "vertex",
//!       "timestamp": 1,
//!       "mutations": [
//!         { "op": "add_property_value", "key": "k", "name": "age",
//!           "value": { "int": 41 }, "timestamp": 2 },
//!         { "op": "soft_delete_property", "key": "k", "name": "age", "timestamp": 3 }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Omitted timestamps are taken from the table's clock.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::storage::{
    AllowAll, ElementKind, InMemoryTable, Metadata, PropValue, TableElement,
};
use crate::types::{Timestamp, Visibility};

use super::CliError;

/// A whole replay script.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Elements in replay order.
    pub elements: Vec<ScriptElement>,
}

/// One element and its mutations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptElement {
    /// Element id.
    pub id: String,
    /// Element kind.
    pub kind: ElementKind,
    /// Initial element visibility.
    #[serde(default)]
    pub visibility: Visibility,
    /// Creation time; the clock's time when omitted.
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
    /// Mutations applied after creation, in order.
    #[serde(default)]
    pub mutations: Vec<ScriptMutation>,
}

/// One scripted write.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum ScriptMutation {
    /// Records that the element was touched.
    Touch {
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
    /// Soft-deletes the element.
    SoftDelete {
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
    /// Hides the element.
    MarkHidden {
        #[serde(default)]
        visibility: Visibility,
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
    /// Unhides the element.
    MarkVisible {
        #[serde(default)]
        visibility: Visibility,
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
    /// Replaces the element visibility.
    AlterVisibility {
        visibility: Visibility,
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
    /// Relabels an edge.
    AlterEdgeLabel {
        label: String,
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
    /// Retypes a vertex.
    AlterConceptType {
        concept_type: String,
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
    /// Sets a property value.
    AddPropertyValue {
        key: String,
        name: String,
        value: PropValue,
        #[serde(default)]
        metadata: Metadata,
        #[serde(default)]
        visibility: Visibility,
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
    /// Overlays property metadata.
    AddPropertyMetadata {
        key: String,
        name: String,
        metadata: Metadata,
        #[serde(default)]
        visibility: Visibility,
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
    /// Soft-deletes a property.
    SoftDeleteProperty {
        key: String,
        name: String,
        #[serde(default)]
        visibility: Visibility,
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
    /// Hides a property.
    MarkPropertyHidden {
        key: String,
        name: String,
        #[serde(default)]
        visibility: Visibility,
        #[serde(default)]
        hide_visibility: Visibility,
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
    /// Unhides a property.
    MarkPropertyVisible {
        key: String,
        name: String,
        #[serde(default)]
        visibility: Visibility,
        #[serde(default)]
        hide_visibility: Visibility,
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
    /// Hard-deletes a property; any visibility when `visibility` is omitted.
    DeleteProperty {
        key: String,
        name: String,
        #[serde(default)]
        visibility: Option<Visibility>,
    },
}

/// Counts reported after a replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    /// Elements created or reused.
    pub elements: usize,
    /// Scripted mutations applied.
    pub mutations: usize,
}

impl Script {
    /// Parses a script from JSON text.
    pub fn from_json(raw: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Reads and parses a script file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CliError> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }
}

/// Applies every element of `script` to `table`.
pub fn replay(table: &InMemoryTable, script: &Script) -> Result<ReplaySummary, CliError> {
    let mut summary = ReplaySummary::default();
    for item in &script.elements {
        let element =
            table.get_or_create(&item.id, item.kind, item.visibility.clone(), item.timestamp)?;
        summary.elements += 1;
        for mutation in &item.mutations {
            apply(&element, mutation)?;
            summary.mutations += 1;
        }
        debug!(element = %item.id, mutations = item.mutations.len(), "replay.element");
    }
    info!(
        elements = summary.elements,
        mutations = summary.mutations,
        "replay.finished"
    );
    Ok(summary)
}

fn apply(element: &TableElement, mutation: &ScriptMutation) -> Result<(), CliError> {
    match mutation.clone() {
        ScriptMutation::Touch { timestamp } => element.append_element_timestamp(timestamp),
        ScriptMutation::SoftDelete { timestamp } => element.append_soft_delete(timestamp),
        ScriptMutation::MarkHidden {
            visibility,
            timestamp,
        } => element.append_mark_hidden(visibility, timestamp),
        ScriptMutation::MarkVisible {
            visibility,
            timestamp,
        } => element.append_mark_visible(visibility, timestamp),
        ScriptMutation::AlterVisibility {
            visibility,
            timestamp,
        } => element.append_alter_visibility(visibility, timestamp),
        ScriptMutation::AlterEdgeLabel { label, timestamp } => {
            element.append_alter_edge_label(label, timestamp)
        }
        ScriptMutation::AlterConceptType {
            concept_type,
            timestamp,
        } => element.append_alter_concept_type(concept_type, timestamp),
        ScriptMutation::AddPropertyValue {
            key,
            name,
            value,
            metadata,
            visibility,
            timestamp,
        } => element.append_add_property_value(&key, &name, value, metadata, visibility, timestamp),
        ScriptMutation::AddPropertyMetadata {
            key,
            name,
            metadata,
            visibility,
            timestamp,
        } => element.append_add_property_metadata(&key, &name, metadata, visibility, timestamp),
        ScriptMutation::SoftDeleteProperty {
            key,
            name,
            visibility,
            timestamp,
        } => element.append_soft_delete_property(&key, &name, visibility, timestamp),
        ScriptMutation::MarkPropertyHidden {
            key,
            name,
            visibility,
            hide_visibility,
            timestamp,
        } => {
            element.append_mark_property_hidden(
                &key,
                &name,
                visibility,
                hide_visibility,
                timestamp,
                &AllowAll,
            )?;
        }
        ScriptMutation::MarkPropertyVisible {
            key,
            name,
            visibility,
            hide_visibility,
            timestamp,
        } => {
            element.append_mark_property_visible(
                &key,
                &name,
                visibility,
                hide_visibility,
                timestamp,
                &AllowAll,
            )?;
        }
        ScriptMutation::DeleteProperty {
            key,
            name,
            visibility,
        } => {
            element.delete_property(&key, &name, visibility.as_ref(), &AllowAll)?;
        }
    }
    Ok(())
}
