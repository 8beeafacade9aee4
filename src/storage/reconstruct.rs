//! Folds a run of property mutations into the property's current state.

use std::collections::BTreeSet;

use crate::types::{Result, StrataError, Timestamp, Visibility};

use super::auth::{can_read, Authorizations};
use super::mutation::{PropertyEntry, PropertyOp};
use super::types::{FetchHints, Metadata, PropValue, Property};
use super::vstore::LargeValueLoader;

#[derive(Default)]
struct FoldState<'a> {
    key: Option<&'a str>,
    name: Option<&'a str>,
    visibility: Option<&'a Visibility>,
    timestamp: Option<Timestamp>,
    value: Option<&'a PropValue>,
    metadata: Metadata,
    soft_deleted: bool,
    hidden: BTreeSet<Visibility>,
}

/// Reduces `entries` (one identity, ascending log order, already filtered by
/// time and authorization) to the property they describe.
///
/// Hide and unhide records count toward the hidden decision whoever wrote
/// them, but only those readable under `auth` move the property timestamp or
/// show up in its hidden visibilities.
///
/// Returns `None` when the property ends soft-deleted, when it is hidden and
/// `fetch_hints` exclude hidden data, or when no value was ever set. The value
/// is returned as stored; see [`resolve_property`] for loading indirect
/// values.
pub fn fold_property<'a, I>(
    entries: I,
    fetch_hints: &FetchHints,
    auth: &dyn Authorizations,
) -> Option<Property>
where
    I: IntoIterator<Item = PropertyEntry<'a>>,
{
    let mut state = FoldState::default();
    for entry in entries {
        let m = entry.mutation;
        state.key = Some(m.key());
        state.name = Some(m.name());
        state.visibility = Some(m.property_visibility());
        let hide_record = matches!(m.op(), PropertyOp::MarkHidden | PropertyOp::MarkVisible);
        if !hide_record || can_read(entry.visibility, auth) {
            state.timestamp = Some(
                state
                    .timestamp
                    .map_or(entry.timestamp, |ts| ts.max(entry.timestamp)),
            );
        }
        match m.op() {
            PropertyOp::AddValue { value, metadata } => {
                state.value = Some(value);
                state.metadata = metadata.clone();
                state.soft_deleted = false;
            }
            PropertyOp::AddMetadata { metadata } => {
                state.metadata.merge(metadata);
            }
            PropertyOp::SoftDelete => {
                state.soft_deleted = true;
            }
            PropertyOp::MarkHidden => {
                state.hidden.insert(entry.visibility.clone());
            }
            PropertyOp::MarkVisible => {
                state.hidden.remove(entry.visibility);
            }
        }
    }

    if state.soft_deleted {
        return None;
    }
    if !fetch_hints.include_hidden && !state.hidden.is_empty() {
        return None;
    }
    let value = state.value?;
    let hidden_visibilities = state
        .hidden
        .into_iter()
        .filter(|v| can_read(v, auth))
        .collect();
    Some(Property {
        key: state.key?.to_owned(),
        name: state.name?.to_owned(),
        value: value.clone(),
        metadata: fetch_hints.metadata(&state.metadata),
        timestamp: state.timestamp?,
        hidden_visibilities,
        visibility: state.visibility?.clone(),
    })
}

/// Replaces an indirect property value with the loaded one.
pub fn resolve_property(
    mut property: Property,
    loader: &dyn LargeValueLoader,
) -> Result<Property> {
    property.value = load_value(
        &property.value,
        &property.key,
        &property.name,
        property.timestamp,
        loader,
    )?;
    Ok(property)
}

/// Returns `value`, resolving it through `loader` when it is an indirect
/// reference. Loader failures become [`StrataError::ValueLoad`].
pub fn load_value(
    value: &PropValue,
    key: &str,
    name: &str,
    timestamp: Timestamp,
    loader: &dyn LargeValueLoader,
) -> Result<PropValue> {
    let Some(vref) = value.as_ref_value() else {
        return Ok(value.clone());
    };
    loader
        .resolve(vref, timestamp)
        .map_err(|err| StrataError::ValueLoad {
            key: key.to_owned(),
            name: name.to_owned(),
            timestamp,
            reason: err.to_string(),
        })
}
