//! Wall-clock abstraction.
//!
//! Snapshot timestamps and the retention window are both expressed in the
//! server's local time at second precision. Tests and replays swap in a
//! `FixedClock` so calendar-day grouping is deterministic.

use std::sync::{Arc, RwLock};

use chrono::{Duration, Local, NaiveDateTime, Timelike};

/// Source of "now" for snapshot creation and retention sweeps.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// System local time, truncated to whole seconds.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        truncate(Local::now().naive_local())
    }
}

/// A settable clock. Clones share the same instant.
#[derive(Clone, Debug)]
pub struct FixedClock {
    now: Arc<RwLock<NaiveDateTime>>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(RwLock::new(truncate(now))),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        if let Ok(mut guard) = self.now.write() {
            *guard = truncate(now);
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.write() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        match self.now.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

fn truncate(at: NaiveDateTime) -> NaiveDateTime {
    at.with_nanosecond(0).unwrap_or(at)
}
