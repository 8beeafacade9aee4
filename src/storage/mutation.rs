//! Immutable change records stored in an element's mutation log.
//!
//! Every record carries a logical-clock timestamp and a visibility label.
//! Element-level records describe the element itself; property-level records
//! all name a property identity and are folded by the reconstructors.

use crate::types::{Timestamp, Visibility};

use super::types::{Metadata, PropValue, PropertyFilter, PropertyIdentity};

/// One timestamped, visibility-tagged change to an element.
///
/// Fields are private: a mutation never changes after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Mutation {
    timestamp: Timestamp,
    visibility: Visibility,
    kind: MutationKind,
}

/// Closed set of mutation variants.
#[derive(Clone, Debug, PartialEq)]
pub enum MutationKind {
    /// Records the element's "last touched" time.
    ElementTimestamp,
    /// Replaces the element's own visibility.
    AlterVisibility {
        /// The visibility the element carries from now on.
        new_visibility: Visibility,
    },
    /// Marks the whole element deleted.
    SoftDelete,
    /// Hides the element for the mutation's visibility.
    MarkHidden,
    /// Revokes a previous [`MutationKind::MarkHidden`] for the same visibility.
    MarkVisible,
    /// Relabels an edge.
    AlterEdgeLabel {
        /// New edge label.
        new_label: String,
    },
    /// Retypes a vertex.
    AlterConceptType {
        /// New concept type.
        new_type: String,
    },
    /// Any property-level change.
    Property(PropertyMutation),
}

/// Property-level change addressed to one (key, name, visibility) identity.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyMutation {
    key: String,
    name: String,
    property_visibility: Visibility,
    op: PropertyOp,
}

/// What a [`PropertyMutation`] does to its property.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyOp {
    /// Sets value and metadata.
    AddValue {
        /// New value.
        value: PropValue,
        /// Metadata replacing the previous metadata.
        metadata: Metadata,
    },
    /// Overlays metadata, leaving the value alone.
    AddMetadata {
        /// Entries merged into the current metadata.
        metadata: Metadata,
    },
    /// Soft-deletes the property.
    SoftDelete,
    /// Hides the property for the mutation's visibility.
    MarkHidden,
    /// Revokes a previous hide for the mutation's visibility.
    MarkVisible,
}

/// Borrowed view of a property mutation together with its envelope fields.
///
/// This is the only input the reconstructors accept, so element-level records
/// can never reach a property fold.
#[derive(Clone, Copy, Debug)]
pub struct PropertyEntry<'a> {
    /// Timestamp of the mutation.
    pub timestamp: Timestamp,
    /// Visibility of the mutation itself (the hide visibility for hide records).
    pub visibility: &'a Visibility,
    /// The property change.
    pub mutation: &'a PropertyMutation,
}

impl Mutation {
    fn new(timestamp: Timestamp, visibility: Visibility, kind: MutationKind) -> Self {
        Self {
            timestamp,
            visibility,
            kind,
        }
    }

    /// Touches the element.
    pub fn element_timestamp(timestamp: Timestamp) -> Self {
        Self::new(timestamp, Visibility::empty(), MutationKind::ElementTimestamp)
    }

    /// Changes the element's visibility.
    pub fn alter_visibility(timestamp: Timestamp, new_visibility: Visibility) -> Self {
        Self::new(
            timestamp,
            new_visibility.clone(),
            MutationKind::AlterVisibility { new_visibility },
        )
    }

    /// Soft-deletes the element.
    pub fn soft_delete(timestamp: Timestamp) -> Self {
        Self::new(timestamp, Visibility::empty(), MutationKind::SoftDelete)
    }

    /// Hides the element for `visibility`.
    pub fn mark_hidden(timestamp: Timestamp, visibility: Visibility) -> Self {
        Self::new(timestamp, visibility, MutationKind::MarkHidden)
    }

    /// Unhides the element for `visibility`.
    pub fn mark_visible(timestamp: Timestamp, visibility: Visibility) -> Self {
        Self::new(timestamp, visibility, MutationKind::MarkVisible)
    }

    /// Relabels an edge.
    pub fn alter_edge_label(timestamp: Timestamp, new_label: impl Into<String>) -> Self {
        Self::new(
            timestamp,
            Visibility::empty(),
            MutationKind::AlterEdgeLabel {
                new_label: new_label.into(),
            },
        )
    }

    /// Retypes a vertex.
    pub fn alter_concept_type(timestamp: Timestamp, new_type: impl Into<String>) -> Self {
        Self::new(
            timestamp,
            Visibility::empty(),
            MutationKind::AlterConceptType {
                new_type: new_type.into(),
            },
        )
    }

    /// Sets a property value.
    pub fn add_property_value(
        timestamp: Timestamp,
        key: impl Into<String>,
        name: impl Into<String>,
        value: PropValue,
        metadata: Metadata,
        property_visibility: Visibility,
    ) -> Self {
        Self::property(
            timestamp,
            property_visibility.clone(),
            PropertyMutation::new(key, name, property_visibility, PropertyOp::AddValue {
                value,
                metadata,
            }),
        )
    }

    /// Overlays property metadata.
    pub fn add_property_metadata(
        timestamp: Timestamp,
        key: impl Into<String>,
        name: impl Into<String>,
        metadata: Metadata,
        property_visibility: Visibility,
    ) -> Self {
        Self::property(
            timestamp,
            property_visibility.clone(),
            PropertyMutation::new(
                key,
                name,
                property_visibility,
                PropertyOp::AddMetadata { metadata },
            ),
        )
    }

    /// Soft-deletes one property identity.
    pub fn soft_delete_property(
        timestamp: Timestamp,
        key: impl Into<String>,
        name: impl Into<String>,
        property_visibility: Visibility,
    ) -> Self {
        Self::property(
            timestamp,
            property_visibility.clone(),
            PropertyMutation::new(key, name, property_visibility, PropertyOp::SoftDelete),
        )
    }

    /// Hides a property for `hide_visibility`.
    pub fn mark_property_hidden(
        timestamp: Timestamp,
        key: impl Into<String>,
        name: impl Into<String>,
        property_visibility: Visibility,
        hide_visibility: Visibility,
    ) -> Self {
        Self::property(
            timestamp,
            hide_visibility,
            PropertyMutation::new(key, name, property_visibility, PropertyOp::MarkHidden),
        )
    }

    /// Unhides a property for `hide_visibility`.
    pub fn mark_property_visible(
        timestamp: Timestamp,
        key: impl Into<String>,
        name: impl Into<String>,
        property_visibility: Visibility,
        hide_visibility: Visibility,
    ) -> Self {
        Self::property(
            timestamp,
            hide_visibility,
            PropertyMutation::new(key, name, property_visibility, PropertyOp::MarkVisible),
        )
    }

    fn property(timestamp: Timestamp, visibility: Visibility, mutation: PropertyMutation) -> Self {
        Self::new(timestamp, visibility, MutationKind::Property(mutation))
    }

    /// Replaces the visibility tag of an element-level record.
    ///
    /// Property records keep the visibility chosen by their constructor.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        if !matches!(self.kind, MutationKind::Property(_)) {
            self.visibility = visibility;
        }
        self
    }

    /// Logical-clock time of the mutation.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Visibility guarding the mutation.
    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    /// Variant payload.
    pub fn kind(&self) -> &MutationKind {
        &self.kind
    }

    /// Returns the property view when this is a property-level record.
    pub fn property_entry(&self) -> Option<PropertyEntry<'_>> {
        match &self.kind {
            MutationKind::Property(mutation) => Some(PropertyEntry {
                timestamp: self.timestamp,
                visibility: &self.visibility,
                mutation,
            }),
            _ => None,
        }
    }

    /// Returns `true` for records that decide element existence.
    pub fn is_existence_marker(&self) -> bool {
        matches!(
            self.kind,
            MutationKind::SoftDelete | MutationKind::ElementTimestamp
        )
    }

    /// Returns `true` for element- or property-level hide records.
    pub fn is_hide(&self) -> bool {
        match &self.kind {
            MutationKind::MarkHidden => true,
            MutationKind::Property(p) => matches!(p.op, PropertyOp::MarkHidden),
            _ => false,
        }
    }

    /// Returns `true` for property records selected by `filter`.
    pub fn matches_property(&self, filter: &PropertyFilter) -> bool {
        match &self.kind {
            MutationKind::Property(p) => p.matches(filter),
            _ => false,
        }
    }

    /// Short variant name used in log events.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            MutationKind::ElementTimestamp => "element_timestamp",
            MutationKind::AlterVisibility { .. } => "alter_visibility",
            MutationKind::SoftDelete => "soft_delete",
            MutationKind::MarkHidden => "mark_hidden",
            MutationKind::MarkVisible => "mark_visible",
            MutationKind::AlterEdgeLabel { .. } => "alter_edge_label",
            MutationKind::AlterConceptType { .. } => "alter_concept_type",
            MutationKind::Property(p) => match p.op {
                PropertyOp::AddValue { .. } => "add_property_value",
                PropertyOp::AddMetadata { .. } => "add_property_metadata",
                PropertyOp::SoftDelete => "soft_delete_property",
                PropertyOp::MarkHidden => "mark_property_hidden",
                PropertyOp::MarkVisible => "mark_property_visible",
            },
        }
    }
}

impl PropertyMutation {
    fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        property_visibility: Visibility,
        op: PropertyOp,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            property_visibility,
            op,
        }
    }

    /// Property key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Visibility of the property this record addresses.
    pub fn property_visibility(&self) -> &Visibility {
        &self.property_visibility
    }

    /// The change itself.
    pub fn op(&self) -> &PropertyOp {
        &self.op
    }

    /// Identity triple of the addressed property.
    pub fn identity(&self) -> PropertyIdentity {
        PropertyIdentity::new(
            self.key.clone(),
            self.name.clone(),
            self.property_visibility.clone(),
        )
    }

    /// Returns `true` when the addressed property is `identity`.
    pub fn is_identity(&self, identity: &PropertyIdentity) -> bool {
        self.key == identity.key
            && self.name == identity.name
            && self.property_visibility == identity.visibility
    }

    /// Returns `true` when `filter` selects this record.
    pub fn matches(&self, filter: &PropertyFilter) -> bool {
        filter.matches(&self.key, &self.name, &self.property_visibility)
    }
}
