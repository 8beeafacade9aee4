#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::storage::types::PropValue;
use crate::types::{blob_crc32, Result, StrataError, Timestamp};

/// Indirect reference to a property value stored outside the mutation log.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ValueRef {
    /// Store-assigned blob id.
    pub id: u64,
    /// Blob length in bytes.
    pub len: u32,
    /// CRC32 of the blob salted with its id.
    pub checksum: u32,
    /// Whether the blob holds UTF-8 text rather than raw bytes.
    #[serde(default)]
    pub text: bool,
}

/// Resolves [`ValueRef`]s into concrete values.
///
/// Failures are surfaced to the reader of the affected property; nothing is
/// substituted for a value that could not be loaded.
pub trait LargeValueLoader: Send + Sync {
    /// Loads the value `vref` points at as of `timestamp`.
    fn resolve(&self, vref: &ValueRef, timestamp: Timestamp) -> Result<PropValue>;
}

/// Loader for tables that never store indirect values.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLargeValues;

impl LargeValueLoader for NoLargeValues {
    fn resolve(&self, _vref: &ValueRef, _timestamp: Timestamp) -> Result<PropValue> {
        Err(StrataError::NotFound)
    }
}

/// Counters kept by [`MemoryVStore`].
#[derive(Default)]
pub struct VStoreMetrics {
    blobs_written: AtomicU64,
    bytes_written: AtomicU64,
    bytes_read: AtomicU64,
}

/// Snapshot of [`VStoreMetrics`] at a point in time.
#[derive(Clone, Copy, Debug, Default)]
pub struct VStoreMetricsSnapshot {
    /// Blobs stored.
    pub blobs_written: u64,
    /// Total bytes stored.
    pub bytes_written: u64,
    /// Total bytes handed out by successful resolves.
    pub bytes_read: u64,
}

impl VStoreMetrics {
    /// Creates a snapshot of the current counters.
    pub fn snapshot(&self) -> VStoreMetricsSnapshot {
        VStoreMetricsSnapshot {
            blobs_written: self.blobs_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
        }
    }
}

struct Blob {
    written_at: Timestamp,
    bytes: Vec<u8>,
}

/// In-memory blob store backing indirect property values.
pub struct MemoryVStore {
    blobs: RwLock<FxHashMap<u64, Blob>>,
    next_id: AtomicU64,
    metrics: VStoreMetrics,
}

impl Default for MemoryVStore {
    fn default() -> Self {
        Self {
            blobs: RwLock::new(FxHashMap::default()),
            next_id: AtomicU64::new(1),
            metrics: VStoreMetrics::default(),
        }
    }
}

impl MemoryVStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw bytes written at `timestamp`.
    pub fn put_bytes(&self, bytes: Vec<u8>, timestamp: Timestamp) -> Result<ValueRef> {
        self.put(bytes, timestamp, false)
    }

    /// Stores UTF-8 text written at `timestamp`.
    pub fn put_str(&self, text: &str, timestamp: Timestamp) -> Result<ValueRef> {
        self.put(text.as_bytes().to_vec(), timestamp, true)
    }

    fn put(&self, bytes: Vec<u8>, timestamp: Timestamp, text: bool) -> Result<ValueRef> {
        let len = u32::try_from(bytes.len())
            .map_err(|_| StrataError::Invalid("value larger than 4GB not supported"))?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let checksum = blob_crc32(id, &bytes);
        self.metrics.blobs_written.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .bytes_written
            .fetch_add(u64::from(len), Ordering::Relaxed);
        self.blobs.write().insert(
            id,
            Blob {
                written_at: timestamp,
                bytes,
            },
        );
        trace!(id, len, timestamp, "vstore.put");
        Ok(ValueRef {
            id,
            len,
            checksum,
            text,
        })
    }

    /// Drops a blob; later resolves of its refs fail.
    pub fn remove(&self, id: u64) -> bool {
        self.blobs.write().remove(&id).is_some()
    }

    /// Counters for this store.
    pub fn metrics(&self) -> VStoreMetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl LargeValueLoader for MemoryVStore {
    fn resolve(&self, vref: &ValueRef, timestamp: Timestamp) -> Result<PropValue> {
        let bytes = {
            let blobs = self.blobs.read();
            let blob = blobs.get(&vref.id).ok_or(StrataError::NotFound)?;
            if blob.written_at > timestamp {
                return Err(StrataError::Invalid("value reference predates its blob"));
            }
            blob.bytes.clone()
        };
        if bytes.len() != vref.len as usize {
            return Err(StrataError::Corruption("blob length does not match reference"));
        }
        if blob_crc32(vref.id, &bytes) != vref.checksum {
            return Err(StrataError::Corruption("blob checksum mismatch"));
        }
        self.metrics
            .bytes_read
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);
        trace!(id = vref.id, len = vref.len, timestamp, "vstore.resolve");
        if vref.text {
            String::from_utf8(bytes)
                .map(PropValue::Str)
                .map_err(|_| StrataError::Corruption("text blob is not valid UTF-8"))
        } else {
            Ok(PropValue::Bytes(bytes))
        }
    }
}
