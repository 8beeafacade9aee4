use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::types::{ElementId, Result, Timestamp, Visibility};

use super::auth::Authorizations;
use super::element::TableElement;
use super::materialize::{ElementKind, ElementMaterializer};
use super::mutation::Mutation;
use super::options::{EngineContext, EngineOptions};
use super::types::FetchHints;

/// In-memory collection of elements sharing one engine context.
///
/// The map lock is held only to look up or register an element; every
/// element then synchronizes on its own log.
pub struct InMemoryTable {
    elements: RwLock<FxHashMap<ElementId, Arc<TableElement>>>,
    ctx: Arc<EngineContext>,
}

impl InMemoryTable {
    /// Creates an empty table.
    pub fn new(options: EngineOptions) -> Self {
        Self {
            elements: RwLock::new(FxHashMap::default()),
            ctx: options.into_context(),
        }
    }

    /// Shared engine context.
    pub fn context(&self) -> &Arc<EngineContext> {
        &self.ctx
    }

    /// Returns the element registered under `id`, creating it when missing.
    ///
    /// A new element starts with a "touched" record and its visibility, both
    /// at `timestamp` (or the clock's time).
    pub fn get_or_create(
        &self,
        id: &str,
        kind: ElementKind,
        visibility: Visibility,
        timestamp: Option<Timestamp>,
    ) -> Result<Arc<TableElement>> {
        let key = ElementId::new(id)?;
        if let Some(existing) = self.elements.read().get(&key) {
            return Ok(Arc::clone(existing));
        }
        let mut elements = self.elements.write();
        if let Some(existing) = elements.get(&key) {
            return Ok(Arc::clone(existing));
        }
        let element = Arc::new(TableElement::new(id, kind, Arc::clone(&self.ctx))?);
        let ts = self.ctx.timestamp_or_now(timestamp);
        element.append([
            Mutation::element_timestamp(ts),
            Mutation::alter_visibility(ts, visibility),
        ]);
        elements.insert(key, Arc::clone(&element));
        drop(elements);
        self.ctx.metrics.element_created();
        debug!(element = id, ?kind, ts, "table.element_created");
        Ok(element)
    }

    /// Element registered under `id`.
    pub fn get(&self, id: &str) -> Option<Arc<TableElement>> {
        let key = ElementId::new(id).ok()?;
        self.elements.read().get(&key).cloned()
    }

    /// Drops an element and its whole log.
    pub fn remove(&self, id: &str) -> Option<Arc<TableElement>> {
        let key = ElementId::new(id).ok()?;
        let removed = self.elements.write().remove(&key);
        if removed.is_some() {
            debug!(element = id, "table.element_removed");
        }
        removed
    }

    /// Ids of all registered elements, sorted.
    pub fn ids(&self) -> Vec<ElementId> {
        let mut ids: Vec<_> = self.elements.read().keys().cloned().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    /// Number of registered elements.
    pub fn len(&self) -> usize {
        self.elements.read().len()
    }

    /// Returns `true` when no element is registered.
    pub fn is_empty(&self) -> bool {
        self.elements.read().is_empty()
    }

    /// Materializes the element registered under `id` for one reader.
    ///
    /// Returns `None` when the element is missing, unreadable by the caller,
    /// hidden from the caller while `fetch_hints` exclude hidden data, or not
    /// alive as of `end_time`.
    pub fn read_element<M>(
        &self,
        id: &str,
        materializer: &M,
        fetch_hints: FetchHints,
        end_time: Option<Timestamp>,
        auth: &dyn Authorizations,
    ) -> Result<Option<M::Element>>
    where
        M: ElementMaterializer + ?Sized,
    {
        let Some(element) = self.get(id) else {
            return Ok(None);
        };
        if !element.can_read(auth) {
            return Ok(None);
        }
        if !fetch_hints.include_hidden && element.is_hidden(auth) {
            return Ok(None);
        }
        element.create_element(materializer, fetch_hints, end_time, auth)
    }
}

impl Default for InMemoryTable {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}
