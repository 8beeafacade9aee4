use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::primitives::clock::{IncreasingTime, LogicalClock, ManualClock};
use crate::types::{Result, StrataError, Timestamp};

use super::metrics::{default_metrics, StorageMetrics};
use super::vstore::{LargeValueLoader, NoLargeValues};

/// Marker identifying provisional workspace visibilities.
pub const DEFAULT_WORKSPACE_MARKER: &str = "WORKSPACE";
/// Initial per-element log capacity.
pub const DEFAULT_LOG_CAPACITY: usize = 16;

/// Configuration supplied when creating an [`super::InMemoryTable`] or a
/// standalone [`super::TableElement`].
#[derive(Clone)]
pub struct EngineOptions {
    /// Timestamp source used when callers omit a timestamp.
    pub clock: Arc<dyn LogicalClock>,
    /// Resolver for indirect property values.
    pub loader: Arc<dyn LargeValueLoader>,
    /// Optional metrics collection implementation.
    pub metrics: Option<Arc<dyn StorageMetrics>>,
    /// Visibility substring marking provisional workspace history.
    pub workspace_marker: String,
    /// Initial capacity reserved for each element's log.
    pub log_capacity: usize,
}

impl EngineOptions {
    /// Creates options with the process-wide clock and no large-value store.
    pub fn new() -> Self {
        Self {
            clock: IncreasingTime::shared(),
            loader: Arc::new(NoLargeValues),
            metrics: None,
            workspace_marker: DEFAULT_WORKSPACE_MARKER.to_owned(),
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }

    /// Sets the logical clock.
    pub fn clock(mut self, clock: Arc<dyn LogicalClock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the large-value loader.
    pub fn loader(mut self, loader: Arc<dyn LargeValueLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Sets the metrics sink.
    pub fn metrics(mut self, metrics: Arc<dyn StorageMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Sets the workspace marker; an empty marker disables workspace filtering.
    pub fn workspace_marker(mut self, marker: impl Into<String>) -> Self {
        self.workspace_marker = marker.into();
        self
    }

    /// Sets the initial per-element log capacity.
    pub fn log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    /// Freezes the options into the context shared by elements.
    pub fn into_context(self) -> Arc<EngineContext> {
        Arc::new(EngineContext {
            clock: self.clock,
            loader: self.loader,
            metrics: self.metrics.unwrap_or_else(default_metrics),
            workspace_marker: self.workspace_marker,
            log_capacity: self.log_capacity,
        })
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Runtime handles shared by every element of a table.
pub struct EngineContext {
    pub(crate) clock: Arc<dyn LogicalClock>,
    pub(crate) loader: Arc<dyn LargeValueLoader>,
    pub(crate) metrics: Arc<dyn StorageMetrics>,
    pub(crate) workspace_marker: String,
    pub(crate) log_capacity: usize,
}

impl EngineContext {
    /// Returns the clock's current time.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Returns `ts` or, when absent, the clock's current time.
    pub fn timestamp_or_now(&self, ts: Option<Timestamp>) -> Timestamp {
        ts.unwrap_or_else(|| self.clock.now())
    }

    /// The configured workspace marker.
    pub fn workspace_marker(&self) -> &str {
        &self.workspace_marker
    }
}

/// Which clock a configuration file selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClockKind {
    /// Strictly increasing wall-clock milliseconds.
    #[default]
    System,
    /// Deterministic counter starting at `manual_clock_start`, one tick per read.
    Manual,
}

/// Serializable engine configuration, usually read from a TOML file.
///
/// ```toml
/// workspace_marker = "WORKSPACE"
/// log_capacity = 32
/// clock = "manual"
/// manual_clock_start = 1000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Visibility substring marking provisional workspace history.
    pub workspace_marker: String,
    /// Initial per-element log capacity.
    pub log_capacity: usize,
    /// Clock selection.
    pub clock: ClockKind,
    /// Start value for the manual clock.
    pub manual_clock_start: Timestamp,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workspace_marker: DEFAULT_WORKSPACE_MARKER.to_owned(),
            log_capacity: DEFAULT_LOG_CAPACITY,
            clock: ClockKind::System,
            manual_clock_start: 1,
        }
    }
}

impl EngineConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| StrataError::Config(err.to_string()))
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    /// Serializes the configuration back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|err| StrataError::Config(err.to_string()))
    }

    /// Builds runtime options from this configuration.
    pub fn to_options(&self) -> EngineOptions {
        let clock: Arc<dyn LogicalClock> = match self.clock {
            ClockKind::System => IncreasingTime::shared(),
            ClockKind::Manual => Arc::new(ManualClock::ticking(self.manual_clock_start)),
        };
        EngineOptions::new()
            .clock(clock)
            .workspace_marker(self.workspace_marker.clone())
            .log_capacity(self.log_capacity)
    }
}
