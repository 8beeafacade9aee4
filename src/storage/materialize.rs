use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{ElementId, Result, StrataError, Timestamp, Visibility};

use super::auth::Authorizations;
use super::types::{FetchHints, Property};

/// Kind of graph element a log belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// A vertex.
    Vertex,
    /// An edge.
    Edge,
}

/// Element-level and property-level state reconstructed for one read.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementState {
    /// Element id.
    pub id: ElementId,
    /// Element kind.
    pub kind: ElementKind,
    /// Current element visibility.
    pub visibility: Visibility,
    /// Latest readable "touched" time as of the read.
    pub timestamp: Option<Timestamp>,
    /// First recorded "touched" time.
    pub first_timestamp: Option<Timestamp>,
    /// Latest edge label as of the read.
    pub edge_label: Option<String>,
    /// Latest concept type as of the read.
    pub concept_type: Option<String>,
    /// Properties visible to the read, ordered by identity.
    pub properties: Vec<Property>,
    /// Net element-level hide visibilities.
    pub hidden_visibilities: BTreeSet<Visibility>,
}

/// Parameters of the read an element is materialized for.
#[derive(Clone, Copy)]
pub struct ReadRequest<'a> {
    /// Caller fetch hints.
    pub fetch_hints: FetchHints,
    /// Point in time of the read; `None` means "now".
    pub end_time: Option<Timestamp>,
    /// Caller authorizations.
    pub auth: &'a dyn Authorizations,
}

/// Builds a concrete element from reconstructed state.
///
/// Called once per successful `create_element`, only for elements that exist
/// as of the requested time. Kind-specific validation belongs here.
pub trait ElementMaterializer {
    /// The concrete element type produced.
    type Element;

    /// Builds the element.
    fn build(&self, state: ElementState, request: &ReadRequest<'_>) -> Result<Self::Element>;
}

/// Read-only vertex snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Vertex {
    /// Vertex id.
    pub id: ElementId,
    /// Concept type, if one was ever assigned.
    pub concept_type: Option<String>,
    /// Vertex visibility.
    pub visibility: Visibility,
    /// Latest "touched" time.
    pub timestamp: Option<Timestamp>,
    /// Visible properties.
    pub properties: Vec<Property>,
    /// Net hide visibilities.
    pub hidden_visibilities: BTreeSet<Visibility>,
}

impl Vertex {
    /// First property with the given name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Read-only edge snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Edge {
    /// Edge id.
    pub id: ElementId,
    /// Edge label.
    pub label: String,
    /// Edge visibility.
    pub visibility: Visibility,
    /// Latest "touched" time.
    pub timestamp: Option<Timestamp>,
    /// Visible properties.
    pub properties: Vec<Property>,
    /// Net hide visibilities.
    pub hidden_visibilities: BTreeSet<Visibility>,
}

/// Materializes [`Vertex`] snapshots.
#[derive(Clone, Copy, Debug, Default)]
pub struct VertexMaterializer;

impl ElementMaterializer for VertexMaterializer {
    type Element = Vertex;

    fn build(&self, state: ElementState, _request: &ReadRequest<'_>) -> Result<Vertex> {
        if state.kind != ElementKind::Vertex {
            return Err(StrataError::Invalid("element is not a vertex"));
        }
        Ok(Vertex {
            id: state.id,
            concept_type: state.concept_type,
            visibility: state.visibility,
            timestamp: state.timestamp,
            properties: state.properties,
            hidden_visibilities: state.hidden_visibilities,
        })
    }
}

/// Materializes [`Edge`] snapshots; an edge must carry a label.
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeMaterializer;

impl ElementMaterializer for EdgeMaterializer {
    type Element = Edge;

    fn build(&self, state: ElementState, _request: &ReadRequest<'_>) -> Result<Edge> {
        if state.kind != ElementKind::Edge {
            return Err(StrataError::Invalid("element is not an edge"));
        }
        let label = state
            .edge_label
            .ok_or(StrataError::Invalid("edge has no label"))?;
        Ok(Edge {
            id: state.id,
            label,
            visibility: state.visibility,
            timestamp: state.timestamp,
            properties: state.properties,
            hidden_visibilities: state.hidden_visibilities,
        })
    }
}
