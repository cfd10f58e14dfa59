//! Wake delay computation.
//!
//! The face redraws on external events only, except for two cases: the
//! seconds ring needs a 1 Hz wake, and time-dependent complication texts need
//! a wake when their rendered value changes. [`next_update_delay`] returns
//! the smallest delay covering both, or `None` when nothing needs a wake.

use crate::complication::{ComplicationData, ComplicationText};
use crate::{SlotId, Timestamp};
use std::collections::BTreeMap;

/// Floor for complication-driven wakes.
pub const MIN_UPDATE_INTERVAL_MS: u64 = 1000;

/// Wake interval while the seconds ring is shown.
pub const SECONDS_RING_INTERVAL_MS: u64 = 1000;

/// Time-dependent texts per slot.
#[derive(Debug, Clone, Default)]
pub struct TimeDependentRegistry {
    texts: BTreeMap<SlotId, ComplicationText>,
}

impl TimeDependentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track the text of `data` if it will change after `now`, forget the
    /// slot otherwise.
    pub fn update(&mut self, slot_id: SlotId, data: &ComplicationData, now: Timestamp) {
        match data.primary_text() {
            Some(text) if text.next_change_time(now).is_some() => {
                self.texts.insert(slot_id, text.clone());
            }
            _ => {
                self.texts.remove(&slot_id);
            }
        }
    }

    pub fn remove(&mut self, slot_id: SlotId) {
        self.texts.remove(&slot_id);
    }

    pub fn clear(&mut self) {
        self.texts.clear();
    }

    pub fn contains(&self, slot_id: SlotId) -> bool {
        self.texts.contains_key(&slot_id)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Soonest change across all tracked slots.
    pub fn next_change(&self, now: Timestamp) -> Option<Timestamp> {
        self.texts
            .values()
            .filter_map(|text| text.next_change_time(now))
            .min()
    }
}

/// Delay until the next wake, `None` for no wake at all.
pub fn next_update_delay(
    registry: &TimeDependentRegistry,
    seconds_ring: bool,
    now: Timestamp,
) -> Option<u64> {
    if seconds_ring {
        return Some(SECONDS_RING_INTERVAL_MS);
    }
    let next = registry.next_change(now)?;
    Some(next.saturating_sub(now).max(MIN_UPDATE_INTERVAL_MS))
}
