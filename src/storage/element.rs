//! One graph element backed by its own mutation log.
//!
//! Writers append mutations; every read takes one detached snapshot of the
//! relevant records and reconstructs state from it outside the lock, so a
//! read sees each append batch whole or not at all. Nothing derived from the
//! log is cached, so there is nothing to invalidate.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::vec;

use tracing::{debug, trace};

use crate::types::{ElementId, Result, Timestamp, Visibility};

use super::auth::{can_read, Authorizations};
use super::history::{reconstruct_history, HistoryContext, TimeRange};
use super::log::MutationLog;
use super::materialize::{ElementKind, ElementMaterializer, ElementState, ReadRequest};
use super::mutation::{Mutation, MutationKind, PropertyOp};
use super::options::EngineContext;
use super::reconstruct::{fold_property, resolve_property};
use super::types::{
    FetchHints, HistoricalPropertyValue, Metadata, PropValue, Property, PropertyFilter,
    PropertyIdentity,
};

/// A graph element and its mutation log.
pub struct TableElement {
    id: ElementId,
    kind: ElementKind,
    log: MutationLog,
    ctx: Arc<EngineContext>,
}

fn within(end_time: Option<Timestamp>, ts: Timestamp) -> bool {
    end_time.map_or(true, |end| ts <= end)
}

/// Property records that take part in a fold for this caller.
///
/// Hide and unhide records apply whatever the caller can read, so losing an
/// authorization never reveals a property someone hid.
fn folds_for(m: &Mutation, end_time: Option<Timestamp>, auth: &dyn Authorizations) -> bool {
    let Some(entry) = m.property_entry() else {
        return false;
    };
    if !within(end_time, m.timestamp()) {
        return false;
    }
    match entry.mutation.op() {
        PropertyOp::MarkHidden | PropertyOp::MarkVisible => true,
        _ => can_read(m.visibility(), auth),
    }
}

fn first_timestamp_in(records: &[Arc<Mutation>]) -> Option<Timestamp> {
    records
        .iter()
        .find(|m| matches!(m.kind(), MutationKind::ElementTimestamp))
        .map(|m| m.timestamp())
}

fn is_deleted_in(
    records: &[Arc<Mutation>],
    end_time: Option<Timestamp>,
    auth: &dyn Authorizations,
) -> bool {
    records
        .iter()
        .rev()
        .find(|m| {
            m.is_existence_marker()
                && within(end_time, m.timestamp())
                && can_read(m.visibility(), auth)
        })
        .is_some_and(|m| matches!(m.kind(), MutationKind::SoftDelete))
}

fn hidden_visibilities_in(records: &[Arc<Mutation>]) -> BTreeSet<Visibility> {
    let mut hidden = BTreeSet::new();
    for m in records {
        match m.kind() {
            MutationKind::MarkHidden => {
                hidden.insert(m.visibility().clone());
            }
            MutationKind::MarkVisible => {
                hidden.remove(m.visibility());
            }
            _ => {}
        }
    }
    hidden
}

impl TableElement {
    /// Creates an element with an empty log. Fails on an empty id.
    pub fn new(id: impl AsRef<str>, kind: ElementKind, ctx: Arc<EngineContext>) -> Result<Self> {
        let id = ElementId::new(id)?;
        Ok(Self {
            id,
            kind,
            log: MutationLog::with_capacity(ctx.log_capacity),
            ctx,
        })
    }

    /// Element id.
    pub fn id(&self) -> &ElementId {
        &self.id
    }

    /// Element kind.
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// The underlying log.
    pub fn log(&self) -> &MutationLog {
        &self.log
    }

    /// Appends mutations atomically and returns how many were added.
    pub fn append<I>(&self, mutations: I) -> usize
    where
        I: IntoIterator<Item = Mutation>,
    {
        let count = self.log.append(mutations);
        if count > 0 {
            self.ctx.metrics.mutations_appended(count);
        }
        count
    }

    fn append_one(&self, mutation: Mutation) {
        trace!(
            element = %self.id,
            kind = mutation.kind_name(),
            ts = mutation.timestamp(),
            "element.append"
        );
        self.append(std::iter::once(mutation));
    }

    // ---- element-level lookups -------------------------------------------------

    /// Timestamp of the first "touched" record.
    pub fn first_timestamp(&self) -> Option<Timestamp> {
        self.log
            .first_matching(|m| matches!(m.kind(), MutationKind::ElementTimestamp))
            .map(|m| m.timestamp())
    }

    /// Timestamp of the latest "touched" record.
    pub fn timestamp(&self) -> Option<Timestamp> {
        self.log
            .last_matching(|m| matches!(m.kind(), MutationKind::ElementTimestamp))
            .map(|m| m.timestamp())
    }

    /// Current element visibility; empty until one is assigned.
    pub fn visibility(&self) -> Visibility {
        self.log
            .last_matching(|m| matches!(m.kind(), MutationKind::AlterVisibility { .. }))
            .and_then(|m| match m.kind() {
                MutationKind::AlterVisibility { new_visibility } => Some(new_visibility.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Current edge label, if any.
    pub fn edge_label(&self) -> Option<String> {
        self.log
            .last_matching(|m| matches!(m.kind(), MutationKind::AlterEdgeLabel { .. }))
            .and_then(|m| match m.kind() {
                MutationKind::AlterEdgeLabel { new_label } => Some(new_label.clone()),
                _ => None,
            })
    }

    /// Current concept type, if any.
    pub fn concept_type(&self) -> Option<String> {
        self.log
            .last_matching(|m| matches!(m.kind(), MutationKind::AlterConceptType { .. }))
            .and_then(|m| match m.kind() {
                MutationKind::AlterConceptType { new_type } => Some(new_type.clone()),
                _ => None,
            })
    }

    /// Returns `true` when the caller may read the element itself.
    pub fn can_read(&self, auth: &dyn Authorizations) -> bool {
        can_read(&self.visibility(), auth)
    }

    // ---- property reads --------------------------------------------------------

    /// Current state of one property identity, `None` when absent.
    pub fn get_property(
        &self,
        key: &str,
        name: &str,
        visibility: &Visibility,
        fetch_hints: FetchHints,
        end_time: Option<Timestamp>,
        auth: &dyn Authorizations,
    ) -> Result<Option<Property>> {
        let filter = PropertyFilter::identity(key, name, visibility.clone());
        self.properties_matching(&filter, fetch_hints, end_time, auth, true)
            .next()
            .transpose()
    }

    /// Every property visible to the caller, ordered by name, key and
    /// visibility.
    ///
    /// All properties are folded from one snapshot; indirect values are
    /// loaded lazily as the iterator advances, and a value that fails to load
    /// yields an `Err` for that property only.
    pub fn get_properties(
        &self,
        fetch_hints: FetchHints,
        end_time: Option<Timestamp>,
        auth: &dyn Authorizations,
    ) -> Properties {
        self.properties_matching(&PropertyFilter::any(), fetch_hints, end_time, auth, true)
    }

    fn properties_matching(
        &self,
        filter: &PropertyFilter,
        fetch_hints: FetchHints,
        end_time: Option<Timestamp>,
        auth: &dyn Authorizations,
        resolve: bool,
    ) -> Properties {
        let snapshot = self
            .log
            .snapshot(|m| m.matches_property(filter) && folds_for(m, end_time, auth));
        self.properties_from(&snapshot, filter, fetch_hints, end_time, auth, resolve)
    }

    fn properties_from(
        &self,
        records: &[Arc<Mutation>],
        filter: &PropertyFilter,
        fetch_hints: FetchHints,
        end_time: Option<Timestamp>,
        auth: &dyn Authorizations,
        resolve: bool,
    ) -> Properties {
        let mut groups: BTreeMap<PropertyIdentity, Vec<&Mutation>> = BTreeMap::new();
        for m in records {
            if !m.matches_property(filter) || !folds_for(m, end_time, auth) {
                continue;
            }
            if let Some(entry) = m.property_entry() {
                groups.entry(entry.mutation.identity()).or_default().push(m.as_ref());
            }
        }
        let mut folded = Vec::with_capacity(groups.len());
        for run in groups.into_values() {
            let entries = run.into_iter().filter_map(Mutation::property_entry);
            let property = fold_property(entries, &fetch_hints, auth);
            self.ctx.metrics.property_folded(property.is_some());
            folded.extend(property);
        }
        Properties {
            folded: folded.into_iter(),
            ctx: Arc::clone(&self.ctx),
            resolve,
        }
    }

    /// Past values of the selected properties within `range`, newest first.
    pub fn get_historical_property_values(
        &self,
        filter: &PropertyFilter,
        range: TimeRange,
        auth: &dyn Authorizations,
    ) -> Result<Vec<HistoricalPropertyValue>> {
        let snapshot = self.log.snapshot(|m| m.matches_property(filter));
        let ctx = HistoryContext {
            auth,
            loader: self.ctx.loader.as_ref(),
            workspace_marker: self.ctx.workspace_marker(),
        };
        let history = reconstruct_history(
            snapshot.iter().filter_map(|m| m.property_entry()),
            range,
            ctx,
        )?;
        self.ctx.metrics.history_read(history.len());
        Ok(history)
    }

    // ---- writes ----------------------------------------------------------------

    /// Hard-deletes a property: every mutation of its identity leaves the log.
    ///
    /// With `visibility` unset the first matching identity (in property order)
    /// is purged. Returns the property as it stood, hidden or not, with any
    /// indirect value left unresolved; `None` when nothing matched.
    pub fn delete_property(
        &self,
        key: &str,
        name: &str,
        visibility: Option<&Visibility>,
        auth: &dyn Authorizations,
    ) -> Result<Option<Property>> {
        let filter = match visibility {
            Some(v) => PropertyFilter::identity(key, name, v.clone()),
            None => PropertyFilter::key_name(key, name),
        };
        let target = self
            .properties_matching(&filter, FetchHints::ALL_INCLUDING_HIDDEN, None, auth, false)
            .next()
            .transpose()?;
        let Some(property) = target else {
            return Ok(None);
        };
        let identity = property.identity();
        let removed = self.log.remove_matching(|m| match m.kind() {
            MutationKind::Property(p) => p.is_identity(&identity),
            _ => false,
        });
        self.ctx.metrics.mutations_removed(removed);
        debug!(
            element = %self.id,
            key = %identity.key,
            name = %identity.name,
            removed,
            "element.delete_property"
        );
        Ok(Some(property))
    }

    fn peek_property(
        &self,
        key: &str,
        name: &str,
        visibility: &Visibility,
        auth: &dyn Authorizations,
    ) -> Result<Option<Property>> {
        let filter = PropertyFilter::identity(key, name, visibility.clone());
        self.properties_matching(&filter, FetchHints::ALL_INCLUDING_HIDDEN, None, auth, false)
            .next()
            .transpose()
    }

    /// Records that the element was touched.
    pub fn append_element_timestamp(&self, timestamp: Option<Timestamp>) {
        let ts = self.ctx.timestamp_or_now(timestamp);
        self.append_one(Mutation::element_timestamp(ts));
    }

    /// Soft-deletes the element.
    pub fn append_soft_delete(&self, timestamp: Option<Timestamp>) {
        let ts = self.ctx.timestamp_or_now(timestamp);
        debug!(element = %self.id, ts, "element.soft_delete");
        self.append_one(Mutation::soft_delete(ts));
    }

    /// Hides the element for `visibility`.
    pub fn append_mark_hidden(&self, visibility: Visibility, timestamp: Option<Timestamp>) {
        let ts = self.ctx.timestamp_or_now(timestamp);
        self.append_one(Mutation::mark_hidden(ts, visibility));
    }

    /// Unhides the element for `visibility`.
    pub fn append_mark_visible(&self, visibility: Visibility, timestamp: Option<Timestamp>) {
        let ts = self.ctx.timestamp_or_now(timestamp);
        self.append_one(Mutation::mark_visible(ts, visibility));
    }

    /// Changes the element visibility.
    pub fn append_alter_visibility(&self, new_visibility: Visibility, timestamp: Option<Timestamp>) {
        let ts = self.ctx.timestamp_or_now(timestamp);
        self.append_one(Mutation::alter_visibility(ts, new_visibility));
    }

    /// Relabels the edge.
    pub fn append_alter_edge_label(&self, new_label: impl Into<String>, timestamp: Option<Timestamp>) {
        let ts = self.ctx.timestamp_or_now(timestamp);
        self.append_one(Mutation::alter_edge_label(ts, new_label));
    }

    /// Retypes the vertex.
    pub fn append_alter_concept_type(&self, new_type: impl Into<String>, timestamp: Option<Timestamp>) {
        let ts = self.ctx.timestamp_or_now(timestamp);
        self.append_one(Mutation::alter_concept_type(ts, new_type));
    }

    /// Sets a property value.
    pub fn append_add_property_value(
        &self,
        key: &str,
        name: &str,
        value: PropValue,
        metadata: Metadata,
        visibility: Visibility,
        timestamp: Option<Timestamp>,
    ) {
        let ts = self.ctx.timestamp_or_now(timestamp);
        self.append_one(Mutation::add_property_value(ts, key, name, value, metadata, visibility));
    }

    /// Overlays property metadata.
    pub fn append_add_property_metadata(
        &self,
        key: &str,
        name: &str,
        metadata: Metadata,
        visibility: Visibility,
        timestamp: Option<Timestamp>,
    ) {
        let ts = self.ctx.timestamp_or_now(timestamp);
        self.append_one(Mutation::add_property_metadata(ts, key, name, metadata, visibility));
    }

    /// Soft-deletes one property identity.
    pub fn append_soft_delete_property(
        &self,
        key: &str,
        name: &str,
        visibility: Visibility,
        timestamp: Option<Timestamp>,
    ) {
        let ts = self.ctx.timestamp_or_now(timestamp);
        self.append_one(Mutation::soft_delete_property(ts, key, name, visibility));
    }

    /// Hides a property for `hide_visibility` and returns the property as it
    /// stood before the hide.
    pub fn append_mark_property_hidden(
        &self,
        key: &str,
        name: &str,
        property_visibility: Visibility,
        hide_visibility: Visibility,
        timestamp: Option<Timestamp>,
        auth: &dyn Authorizations,
    ) -> Result<Option<Property>> {
        let before = self.peek_property(key, name, &property_visibility, auth)?;
        let ts = self.ctx.timestamp_or_now(timestamp);
        self.append_one(Mutation::mark_property_hidden(
            ts,
            key,
            name,
            property_visibility,
            hide_visibility,
        ));
        Ok(before)
    }

    /// Unhides a property for `hide_visibility` and returns the property as it
    /// stood before.
    pub fn append_mark_property_visible(
        &self,
        key: &str,
        name: &str,
        property_visibility: Visibility,
        hide_visibility: Visibility,
        timestamp: Option<Timestamp>,
        auth: &dyn Authorizations,
    ) -> Result<Option<Property>> {
        let before = self.peek_property(key, name, &property_visibility, auth)?;
        let ts = self.ctx.timestamp_or_now(timestamp);
        self.append_one(Mutation::mark_property_visible(
            ts,
            key,
            name,
            property_visibility,
            hide_visibility,
        ));
        Ok(before)
    }

    // ---- existence & hiding ----------------------------------------------------

    /// Returns `true` when the latest readable existence record at or before
    /// `end_time` is a soft delete. An element with no such record is not
    /// deleted.
    pub fn is_deleted(&self, end_time: Option<Timestamp>, auth: &dyn Authorizations) -> bool {
        let markers = self.log.snapshot(Mutation::is_existence_marker);
        is_deleted_in(&markers, end_time, auth)
    }

    /// Net set of visibilities hiding the element, replayed over the whole log.
    pub fn hidden_visibilities(&self) -> BTreeSet<Visibility> {
        let toggles = self.log.snapshot(|m| {
            matches!(m.kind(), MutationKind::MarkHidden | MutationKind::MarkVisible)
        });
        hidden_visibilities_in(&toggles)
    }

    /// Returns `true` when any net-hiding visibility is readable by the caller.
    pub fn is_hidden(&self, auth: &dyn Authorizations) -> bool {
        self.hidden_visibilities()
            .iter()
            .any(|v| can_read(v, auth))
    }

    /// Readable mutations at or before `end_time`, optionally without hide
    /// records.
    pub fn filtered_mutations(
        &self,
        include_hidden: bool,
        end_time: Option<Timestamp>,
        auth: &dyn Authorizations,
    ) -> Vec<Arc<Mutation>> {
        self.log.snapshot(|m| {
            can_read(m.visibility(), auth)
                && within(end_time, m.timestamp())
                && (include_hidden || !m.is_hide())
        })
    }

    /// Reconstructs element and property state for one read.
    pub fn state(
        &self,
        fetch_hints: FetchHints,
        end_time: Option<Timestamp>,
        auth: &dyn Authorizations,
    ) -> Result<ElementState> {
        self.state_from(&self.log.snapshot_all(), fetch_hints, end_time, auth)
    }

    fn state_from(
        &self,
        records: &[Arc<Mutation>],
        fetch_hints: FetchHints,
        end_time: Option<Timestamp>,
        auth: &dyn Authorizations,
    ) -> Result<ElementState> {
        let mut state = ElementState {
            id: self.id.clone(),
            kind: self.kind,
            visibility: Visibility::empty(),
            timestamp: None,
            first_timestamp: first_timestamp_in(records),
            edge_label: None,
            concept_type: None,
            properties: Vec::new(),
            hidden_visibilities: hidden_visibilities_in(records),
        };
        let element_records = records
            .iter()
            .filter(|m| m.property_entry().is_none() && within(end_time, m.timestamp()));
        for m in element_records {
            match m.kind() {
                MutationKind::AlterVisibility { new_visibility } => {
                    state.visibility = new_visibility.clone();
                }
                MutationKind::ElementTimestamp if can_read(m.visibility(), auth) => {
                    state.timestamp = Some(m.timestamp());
                }
                MutationKind::AlterEdgeLabel { new_label } if can_read(m.visibility(), auth) => {
                    state.edge_label = Some(new_label.clone());
                }
                MutationKind::AlterConceptType { new_type } if can_read(m.visibility(), auth) => {
                    state.concept_type = Some(new_type.clone());
                }
                _ => {}
            }
        }
        state.properties = self
            .properties_from(records, &PropertyFilter::any(), fetch_hints, end_time, auth, true)
            .collect::<Result<Vec<_>>>()?;
        Ok(state)
    }

    /// Materializes the element as of `end_time`.
    ///
    /// Returns `None` when `end_time` precedes the element's first recorded
    /// timestamp or when the element is deleted as of `end_time`. Every check
    /// and the built element come from the same snapshot of the log.
    pub fn create_element<M>(
        &self,
        materializer: &M,
        fetch_hints: FetchHints,
        end_time: Option<Timestamp>,
        auth: &dyn Authorizations,
    ) -> Result<Option<M::Element>>
    where
        M: ElementMaterializer + ?Sized,
    {
        let records = self.log.snapshot_all();
        if let (Some(end), Some(first)) = (end_time, first_timestamp_in(&records)) {
            if end < first {
                return Ok(None);
            }
        }
        if is_deleted_in(&records, end_time, auth) {
            return Ok(None);
        }
        let state = self.state_from(&records, fetch_hints, end_time, auth)?;
        let request = ReadRequest {
            fetch_hints,
            end_time,
            auth,
        };
        let element = materializer.build(state, &request)?;
        self.ctx.metrics.element_materialized();
        Ok(Some(element))
    }
}

/// Folded properties of one element, with indirect values loaded on demand.
pub struct Properties {
    folded: vec::IntoIter<Property>,
    ctx: Arc<EngineContext>,
    resolve: bool,
}

impl Iterator for Properties {
    type Item = Result<Property>;

    fn next(&mut self) -> Option<Self::Item> {
        let property = self.folded.next()?;
        if !self.resolve {
            return Some(Ok(property));
        }
        Some(resolve_property(property, self.ctx.loader.as_ref()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.folded.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::clock::ManualClock;
    use crate::storage::auth::{AllowAll, AuthorizationSet};
    use crate::storage::materialize::{EdgeMaterializer, VertexMaterializer};
    use crate::storage::options::EngineOptions;
    use crate::types::StrataError;

    fn element(kind: ElementKind) -> TableElement {
        let ctx = EngineOptions::new()
            .clock(Arc::new(ManualClock::ticking(100)))
            .into_context();
        TableElement::new("e1", kind, ctx).unwrap()
    }

    fn add(e: &TableElement, ts: i64, value: i64) {
        e.append_add_property_value("k", "n", PropValue::Int(value), Metadata::new(), Visibility::empty(), Some(ts));
    }

    #[test]
    fn empty_id_is_rejected() {
        let ctx = EngineOptions::new().into_context();
        assert!(matches!(
            TableElement::new("", ElementKind::Vertex, ctx),
            Err(StrataError::Invalid(_))
        ));
    }

    #[test]
    fn get_property_respects_end_time() -> Result<()> {
        let e = element(ElementKind::Vertex);
        add(&e, 1, 5);
        add(&e, 2, 7);
        let now = e.get_property("k", "n", &Visibility::empty(), FetchHints::ALL, None, &AllowAll)?;
        assert_eq!(now.unwrap().value, PropValue::Int(7));
        let then = e.get_property("k", "n", &Visibility::empty(), FetchHints::ALL, Some(1), &AllowAll)?;
        assert_eq!(then.unwrap().value, PropValue::Int(5));
        assert!(e
            .get_property("k", "n", &Visibility::empty(), FetchHints::ALL, Some(0), &AllowAll)?
            .is_none());
        Ok(())
    }

    #[test]
    fn unreadable_property_is_absent() -> Result<()> {
        let e = element(ElementKind::Vertex);
        e.append_add_property_value("k", "n", PropValue::Int(1), Metadata::new(), "secret".into(), Some(1));
        let vis = Visibility::from("secret");
        assert!(e
            .get_property("k", "n", &vis, FetchHints::ALL, None, &AuthorizationSet::empty())?
            .is_none());
        assert!(e
            .get_property("k", "n", &vis, FetchHints::ALL, None, &AuthorizationSet::new(["secret"]))?
            .is_some());
        Ok(())
    }

    #[test]
    fn hide_applies_even_when_hider_visibility_is_unreadable() -> Result<()> {
        let e = element(ElementKind::Vertex);
        add(&e, 1, 5);
        e.append_mark_property_hidden("k", "n", Visibility::empty(), "secret".into(), Some(5), &AllowAll)?;
        for auth in [AuthorizationSet::new(["secret"]), AuthorizationSet::empty()] {
            assert!(e
                .get_property("k", "n", &Visibility::empty(), FetchHints::ALL, None, &auth)?
                .is_none());
        }
        let before = e.append_mark_property_visible(
            "k",
            "n",
            Visibility::empty(),
            "secret".into(),
            Some(6),
            &AllowAll,
        )?;
        assert!(before.unwrap().is_hidden());
        assert!(e
            .get_property("k", "n", &Visibility::empty(), FetchHints::ALL, None, &AllowAll)?
            .is_some());
        Ok(())
    }

    #[test]
    fn delete_property_purges_identity_only() -> Result<()> {
        let e = element(ElementKind::Vertex);
        add(&e, 1, 5);
        e.append_add_property_value("k", "n", PropValue::Int(9), Metadata::new(), "a".into(), Some(2));
        e.append_add_property_value("k2", "n", PropValue::Int(3), Metadata::new(), Visibility::empty(), Some(3));
        let deleted = e.delete_property("k", "n", Some(&Visibility::empty()), &AllowAll)?;
        assert_eq!(deleted.unwrap().value, PropValue::Int(5));
        assert_eq!(e.log().len(), 2);
        assert!(e
            .get_historical_property_values(
                &PropertyFilter::identity("k", "n", Visibility::empty()),
                TimeRange::all(),
                &AllowAll
            )?
            .is_empty());
        assert!(e.delete_property("missing", "n", None, &AllowAll)?.is_none());
        let any_vis = e.delete_property("k", "n", None, &AllowAll)?;
        assert_eq!(any_vis.unwrap().visibility.as_str(), "a");
        assert_eq!(e.log().len(), 1);
        Ok(())
    }

    #[test]
    fn clock_supplies_missing_timestamps() -> Result<()> {
        let e = element(ElementKind::Vertex);
        e.append_element_timestamp(None);
        e.append_soft_delete_property("k", "n", Visibility::empty(), None);
        let ts: Vec<_> = e.log().snapshot_all().iter().map(|m| m.timestamp()).collect();
        assert_eq!(ts, vec![100, 101]);
        Ok(())
    }

    #[test]
    fn deletion_follows_latest_existence_record() {
        let e = element(ElementKind::Vertex);
        assert!(!e.is_deleted(None, &AllowAll));
        e.append_element_timestamp(Some(1));
        e.append_soft_delete(Some(5));
        e.append_element_timestamp(Some(9));
        assert!(!e.is_deleted(Some(4), &AllowAll));
        assert!(e.is_deleted(Some(5), &AllowAll));
        assert!(e.is_deleted(Some(8), &AllowAll));
        assert!(!e.is_deleted(None, &AllowAll));
    }

    #[test]
    fn hidden_set_is_net_of_toggles() {
        let e = element(ElementKind::Vertex);
        e.append_mark_hidden("a".into(), Some(1));
        e.append_mark_hidden("b".into(), Some(2));
        e.append_mark_visible("a".into(), Some(3));
        e.append_mark_hidden("a".into(), Some(4));
        e.append_mark_visible("b".into(), Some(5));
        let hidden: Vec<_> = e.hidden_visibilities().into_iter().collect();
        assert_eq!(hidden, vec![Visibility::from("a")]);
        assert!(e.is_hidden(&AuthorizationSet::new(["a"])));
        assert!(!e.is_hidden(&AuthorizationSet::new(["b"])));
    }

    #[test]
    fn create_element_checks_time_and_deletion() -> Result<()> {
        let e = element(ElementKind::Vertex);
        e.append([
            Mutation::element_timestamp(10),
            Mutation::alter_visibility(10, Visibility::empty()),
            Mutation::alter_concept_type(10, "person"),
        ]);
        add(&e, 11, 42);
        assert!(e
            .create_element(&VertexMaterializer, FetchHints::ALL, Some(9), &AllowAll)?
            .is_none());
        let v = e
            .create_element(&VertexMaterializer, FetchHints::ALL, Some(10), &AllowAll)?
            .unwrap();
        assert!(v.properties.is_empty());
        assert_eq!(v.concept_type.as_deref(), Some("person"));
        let v = e
            .create_element(&VertexMaterializer, FetchHints::ALL, None, &AllowAll)?
            .unwrap();
        assert_eq!(v.property("n").unwrap().value, PropValue::Int(42));

        e.append_soft_delete(Some(20));
        assert!(e
            .create_element(&VertexMaterializer, FetchHints::ALL, None, &AllowAll)?
            .is_none());
        assert!(e
            .create_element(&VertexMaterializer, FetchHints::ALL, Some(15), &AllowAll)?
            .is_some());
        Ok(())
    }

    #[test]
    fn edge_materializer_requires_label() -> Result<()> {
        let e = element(ElementKind::Edge);
        e.append_element_timestamp(Some(1));
        assert!(e
            .create_element(&EdgeMaterializer, FetchHints::ALL, None, &AllowAll)
            .is_err());
        e.append_alter_edge_label("knows", Some(2));
        e.append_alter_edge_label("likes", Some(3));
        let edge = e
            .create_element(&EdgeMaterializer, FetchHints::ALL, Some(2), &AllowAll)?
            .unwrap();
        assert_eq!(edge.label, "knows");
        assert_eq!(e.edge_label().as_deref(), Some("likes"));
        Ok(())
    }

    #[test]
    fn filtered_mutations_drop_hide_records_on_request() {
        let e = element(ElementKind::Vertex);
        e.append_element_timestamp(Some(1));
        e.append_mark_hidden(Visibility::empty(), Some(2));
        e.append_mark_property_hidden("k", "n", Visibility::empty(), Visibility::empty(), Some(3), &AllowAll)
            .unwrap();
        assert_eq!(e.filtered_mutations(true, None, &AllowAll).len(), 3);
        assert_eq!(e.filtered_mutations(false, None, &AllowAll).len(), 1);
        assert_eq!(e.filtered_mutations(true, Some(1), &AllowAll).len(), 1);
    }
}
