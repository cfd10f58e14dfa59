//! Wall clock used by every staleness and scheduling decision.
//!
//! All time in the core is expressed as milliseconds since the Unix epoch
//! ([`Timestamp`]). Nothing reads the system time directly: callers pass
//! `now` in, or hold a [`Clock`] that can be swapped for a [`ManualClock`]
//! in tests.

use crate::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

pub const SECOND_MS: u64 = 1000;
pub const MINUTE_MS: u64 = 60 * SECOND_MS;
pub const HALF_HOUR_MS: u64 = 30 * MINUTE_MS;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move the clock forward and return the new value.
    pub fn advance(&self, by_ms: u64) -> Timestamp {
        self.now.fetch_add(by_ms, Ordering::SeqCst) + by_ms
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Milliseconds left until the next whole minute.
///
/// Exactly on a boundary this is a full minute, never zero.
pub fn until_next_minute(now: Timestamp) -> u64 {
    MINUTE_MS - now % MINUTE_MS
}

/// Index of the minute `now` falls into, counted from the epoch.
pub fn minute_index(now: Timestamp) -> u64 {
    now / MINUTE_MS
}
