//! Strata: a versioned, visibility-aware property store for graph elements.
//!
//! Every vertex and edge keeps an append-only log of mutations. Current
//! property values, point-in-time reads, property history and hide/delete
//! status are all reconstructed from that log on demand.

#![warn(missing_docs)]

pub mod cli;
pub mod primitives;
pub mod storage;
pub mod types;
