//! Mutation-log storage for graph elements.
//!
//! Each element owns an append-only log of timestamped, visibility-tagged
//! mutations. Reads fold a snapshot of the log into current property values,
//! property history, deletion and hide status, or a materialized element.

/// Authorization predicates over visibility labels.
pub mod auth;

/// Per-element mutation log and its reconstruction entry points.
pub mod element;

/// Property history reconstruction.
pub mod history;

/// Ordered, thread-safe mutation storage.
pub mod log;

/// Element snapshots built from reconstructed state.
pub mod materialize;

/// Mutation records.
pub mod mutation;

/// Property fold.
pub mod reconstruct;

/// In-memory element registry.
pub mod table;

/// Side storage for large property values.
pub mod vstore;

mod metrics;
mod options;
mod types;

pub use auth::{can_read, AllowAll, AuthorizationSet, Authorizations};
pub use element::{Properties, TableElement};
pub use history::{reconstruct_history, HistoryContext, TimeRange};
pub use log::MutationLog;
pub use materialize::{
    Edge, EdgeMaterializer, ElementKind, ElementMaterializer, ElementState, ReadRequest, Vertex,
    VertexMaterializer,
};

/// Metrics collection.
pub use metrics::{default_metrics, CounterMetrics, NoopMetrics, StorageMetrics};

pub use mutation::{Mutation, MutationKind, PropertyEntry, PropertyMutation, PropertyOp};

/// Engine configuration.
pub use options::{
    ClockKind, EngineConfig, EngineContext, EngineOptions, DEFAULT_LOG_CAPACITY,
    DEFAULT_WORKSPACE_MARKER,
};

pub use reconstruct::{fold_property, resolve_property};
pub use table::InMemoryTable;

/// Property values, metadata and read hints.
pub use types::{
    FetchHints, HistoricalPropertyValue, Metadata, MetadataEntry, PropValue, Property,
    PropertyFilter, PropertyIdentity,
};

pub use vstore::{LargeValueLoader, MemoryVStore, NoLargeValues, ValueRef};
