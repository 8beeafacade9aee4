#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::Timestamp;

/// Source of mutation timestamps.
///
/// Implementations must never return a value smaller than one they returned
/// before, including across threads.
pub trait LogicalClock: Send + Sync {
    /// Returns the current logical time.
    fn now(&self) -> Timestamp;
}

/// Wall-clock milliseconds, bumped by one whenever the wall clock stalls or
/// steps backwards so every call yields a strictly larger value.
#[derive(Debug, Default)]
pub struct IncreasingTime {
    last: AtomicI64,
}

impl IncreasingTime {
    /// Creates an independent clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide clock shared by all tables that do not inject
    /// their own.
    pub fn shared() -> Arc<IncreasingTime> {
        static SHARED: OnceLock<Arc<IncreasingTime>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(IncreasingTime::new())).clone()
    }
}

impl LogicalClock for IncreasingTime {
    fn now(&self) -> Timestamp {
        let wall = wall_millis();
        let mut prev = self.last.load(Ordering::Acquire);
        loop {
            let next = if wall > prev { wall } else { prev + 1 };
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

fn wall_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or_default()
}

/// Deterministic clock for tests and script replay.
///
/// Every call to [`LogicalClock::now`] returns the current value and then
/// moves it forward by `step` (zero keeps it frozen).
#[derive(Debug)]
pub struct ManualClock {
    current: AtomicI64,
    step: i64,
}

impl ManualClock {
    /// A frozen clock reading `start` until moved explicitly.
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: AtomicI64::new(start),
            step: 0,
        }
    }

    /// A clock that advances by one on every read.
    pub fn ticking(start: Timestamp) -> Self {
        Self {
            current: AtomicI64::new(start),
            step: 1,
        }
    }

    /// Moves the clock to `ts`; earlier values are ignored.
    pub fn set(&self, ts: Timestamp) {
        self.current.fetch_max(ts, Ordering::AcqRel);
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: i64) {
        if delta > 0 {
            self.current.fetch_add(delta, Ordering::AcqRel);
        }
    }

    /// Reads the clock without advancing it.
    pub fn peek(&self) -> Timestamp {
        self.current.load(Ordering::Acquire)
    }
}

impl LogicalClock for ManualClock {
    fn now(&self) -> Timestamp {
        self.current.fetch_add(self.step, Ordering::AcqRel)
    }
}
