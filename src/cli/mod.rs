#![forbid(unsafe_code)]

//! Command-line support: mutation-script replay and inspection reports.
//!
//! The `strata-inspect` binary is a thin shell over this module so the same
//! code paths are exercised by library tests.

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use crate::storage::{
    Authorizations, ElementKind, FetchHints, HistoricalPropertyValue, Property, PropertyFilter,
    TableElement, TimeRange,
};
use crate::types::{ElementId, StrataError, Timestamp, Visibility};

/// Mutation scripts and their replay.
pub mod replay;

/// Errors reported by CLI operations.
#[derive(Debug, Error)]
pub enum CliError {
    /// Generic error message.
    #[error("{0}")]
    Message(String),
    /// IO error from file operations.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Malformed JSON script.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Engine error.
    #[error(transparent)]
    Engine(#[from] StrataError),
}

impl From<&str> for CliError {
    fn from(value: &str) -> Self {
        CliError::Message(value.to_string())
    }
}

impl From<String> for CliError {
    fn from(value: String) -> Self {
        CliError::Message(value)
    }
}

/// Existence and hide status of one element.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ElementStatus {
    /// Element id.
    pub id: ElementId,
    /// Element kind.
    pub kind: ElementKind,
    /// Current element visibility.
    pub visibility: Visibility,
    /// Whether the element is soft-deleted as of the read.
    pub deleted: bool,
    /// Whether the element is hidden from the reader.
    pub hidden: bool,
    /// Net hide visibilities.
    pub hidden_visibilities: BTreeSet<Visibility>,
    /// First "touched" time.
    pub first_timestamp: Option<Timestamp>,
    /// Latest "touched" time.
    pub timestamp: Option<Timestamp>,
    /// Mutations readable as of the read, hide records included.
    pub mutations: usize,
}

/// Builds the status report for `element`.
pub fn element_status(
    element: &TableElement,
    end_time: Option<Timestamp>,
    auth: &dyn Authorizations,
) -> ElementStatus {
    ElementStatus {
        id: element.id().clone(),
        kind: element.kind(),
        visibility: element.visibility(),
        deleted: element.is_deleted(end_time, auth),
        hidden: element.is_hidden(auth),
        hidden_visibilities: element.hidden_visibilities(),
        first_timestamp: element.first_timestamp(),
        timestamp: element.timestamp(),
        mutations: element.filtered_mutations(true, end_time, auth).len(),
    }
}

/// Properties of `element` as of `end_time`.
pub fn property_report(
    element: &TableElement,
    fetch_hints: FetchHints,
    end_time: Option<Timestamp>,
    auth: &dyn Authorizations,
) -> Result<Vec<Property>, CliError> {
    Ok(element
        .get_properties(fetch_hints, end_time, auth)
        .collect::<crate::types::Result<Vec<_>>>()?)
}

/// History of the properties of `element` selected by `filter`.
pub fn history_report(
    element: &TableElement,
    filter: &PropertyFilter,
    range: TimeRange,
    auth: &dyn Authorizations,
) -> Result<Vec<HistoricalPropertyValue>, CliError> {
    Ok(element.get_historical_property_values(filter, range, auth)?)
}
