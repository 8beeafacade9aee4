//! Rebuilds the sequence of values a property has held over time.

use std::collections::HashMap;

use crate::types::{Result, Timestamp};

use super::auth::{can_read, Authorizations};
use super::mutation::{PropertyEntry, PropertyOp};
use super::reconstruct::load_value;
use super::types::{HistoricalPropertyValue, Metadata, PropValue, PropertyIdentity};
use super::vstore::LargeValueLoader;

/// Inclusive time window; `None` leaves a side open.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TimeRange {
    /// Earliest timestamp included.
    pub start: Option<Timestamp>,
    /// Latest timestamp included.
    pub end: Option<Timestamp>,
}

impl TimeRange {
    /// The unbounded window.
    pub fn all() -> Self {
        Self::default()
    }

    /// Builds a window from optional bounds.
    pub fn new(start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        Self { start, end }
    }

    /// Returns `true` when `ts` falls inside the window.
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start.map_or(true, |s| ts >= s) && self.end.map_or(true, |e| ts <= e)
    }
}

#[derive(Default)]
struct HistoryBuilder {
    value: Option<PropValue>,
    metadata: Metadata,
    last_emitted: Option<usize>,
}

impl HistoryBuilder {
    fn build(&self, identity: &PropertyIdentity, timestamp: Timestamp, is_deleted: bool) -> HistoricalPropertyValue {
        HistoricalPropertyValue {
            key: identity.key.clone(),
            name: identity.name.clone(),
            visibility: identity.visibility.clone(),
            value: self.value.clone(),
            metadata: self.metadata.clone(),
            timestamp,
            is_deleted,
        }
    }
}

/// Settings shared by every history read of a table.
#[derive(Clone, Copy)]
pub struct HistoryContext<'a> {
    /// Caller authorizations.
    pub auth: &'a dyn Authorizations,
    /// Loader for indirect values.
    pub loader: &'a dyn LargeValueLoader,
    /// Property visibilities containing this marker are provisional and
    /// skipped. An empty marker disables the check.
    pub workspace_marker: &'a str,
}

/// Produces the historical values described by `entries` (ascending log
/// order), newest first.
///
/// Unreadable and workspace-scoped mutations are skipped. A soft delete that
/// is immediately followed by a new value for the same identity is reported as
/// a single modification rather than a delete plus an add.
pub fn reconstruct_history<'a, I>(
    entries: I,
    range: TimeRange,
    ctx: HistoryContext<'_>,
) -> Result<Vec<HistoricalPropertyValue>>
where
    I: IntoIterator<Item = PropertyEntry<'a>>,
{
    let mut builders: HashMap<PropertyIdentity, HistoryBuilder> = HashMap::new();
    let mut emitted: Vec<Option<HistoricalPropertyValue>> = Vec::new();

    for entry in entries {
        if !range.contains(entry.timestamp) {
            continue;
        }
        if !can_read(entry.visibility, ctx.auth) {
            continue;
        }
        let m = entry.mutation;
        if !ctx.workspace_marker.is_empty()
            && m.property_visibility().as_str().contains(ctx.workspace_marker)
        {
            continue;
        }

        let identity = m.identity();
        let builder = builders.entry(identity.clone()).or_default();
        match m.op() {
            PropertyOp::SoftDelete => {
                emitted.push(Some(builder.build(&identity, entry.timestamp, true)));
                builder.last_emitted = Some(emitted.len() - 1);
            }
            PropertyOp::AddMetadata { metadata } => {
                builder.metadata.merge(metadata);
            }
            PropertyOp::MarkHidden | PropertyOp::MarkVisible => {}
            PropertyOp::AddValue { value, metadata } => {
                let value = load_value(value, m.key(), m.name(), entry.timestamp, ctx.loader)?;
                builder.value = Some(value);
                builder.metadata = metadata.clone();
                if let Some(prev) = builder.last_emitted {
                    if emitted[prev].as_ref().is_some_and(|h| h.is_deleted) {
                        emitted[prev] = None;
                    }
                }
                emitted.push(Some(builder.build(&identity, entry.timestamp, false)));
                builder.last_emitted = Some(emitted.len() - 1);
            }
        }
    }

    Ok(emitted.into_iter().rev().flatten().collect())
}
