use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use super::mutation::Mutation;

/// Ordered, append-mostly collection of one element's mutations.
///
/// Entries are kept sorted by timestamp; records with equal timestamps stay in
/// insertion order. Readers copy matching entries out under the read lock and
/// never hold it while folding.
#[derive(Debug, Default)]
pub struct MutationLog {
    entries: RwLock<Vec<Arc<Mutation>>>,
}

impl MutationLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty log with room for `capacity` mutations.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::with_capacity(capacity)),
        }
    }

    /// Appends every mutation in one write-locked step and returns how many
    /// were added. Readers observe either the whole batch or none of it.
    pub fn append<I>(&self, mutations: I) -> usize
    where
        I: IntoIterator<Item = Mutation>,
    {
        let batch: Vec<Arc<Mutation>> = mutations.into_iter().map(Arc::new).collect();
        if batch.is_empty() {
            return 0;
        }
        let count = batch.len();
        let mut entries = self.entries.write();
        for mutation in batch {
            let ts = mutation.timestamp();
            match entries.last() {
                Some(last) if last.timestamp() > ts => {
                    let at = entries.partition_point(|m| m.timestamp() <= ts);
                    entries.insert(at, mutation);
                }
                _ => entries.push(mutation),
            }
        }
        trace!(count, len = entries.len(), "mutation_log.append");
        count
    }

    /// Returns the matching mutations, in log order, as a detached copy.
    pub fn snapshot<F>(&self, mut predicate: F) -> Vec<Arc<Mutation>>
    where
        F: FnMut(&Mutation) -> bool,
    {
        let entries = self.entries.read();
        entries
            .iter()
            .filter(|m| predicate(m))
            .cloned()
            .collect()
    }

    /// Returns every mutation in log order.
    pub fn snapshot_all(&self) -> Vec<Arc<Mutation>> {
        self.entries.read().clone()
    }

    /// Removes every mutation matching `predicate`, returning how many went.
    pub fn remove_matching<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&Mutation) -> bool,
    {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|m| !predicate(m));
        let removed = before - entries.len();
        trace!(removed, len = entries.len(), "mutation_log.remove_matching");
        removed
    }

    /// Earliest mutation matching `predicate`.
    pub fn first_matching<F>(&self, mut predicate: F) -> Option<Arc<Mutation>>
    where
        F: FnMut(&Mutation) -> bool,
    {
        self.entries.read().iter().find(|m| predicate(m)).cloned()
    }

    /// Latest mutation matching `predicate`.
    pub fn last_matching<F>(&self, mut predicate: F) -> Option<Arc<Mutation>>
    where
        F: FnMut(&Mutation) -> bool,
    {
        self.entries.read().iter().rev().find(|m| predicate(m)).cloned()
    }

    /// Number of stored mutations.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` when nothing has been appended (or everything was removed).
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
