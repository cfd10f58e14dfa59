//! Phone and watch battery status.

use crate::clock::HALF_HOUR_MS;
use crate::error::{Error, Result};
use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// Phone battery data older than this is stale and triggers a new sync.
pub const PHONE_BATTERY_STALE_MS: u64 = HALF_HOUR_MS;

/// Phone battery level pushed by the companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PhoneBatteryStatus {
    #[default]
    Unknown,
    #[serde(rename_all = "camelCase")]
    DataReceived { percentage: u8, received_at: Timestamp },
}

impl PhoneBatteryStatus {
    /// Build from a wire byte. Values above 100 are rejected.
    pub fn received(percentage: u8, now: Timestamp) -> Result<Self> {
        if percentage > 100 {
            return Err(Error::BatteryOutOfRange(percentage));
        }
        Ok(PhoneBatteryStatus::DataReceived {
            percentage,
            received_at: now,
        })
    }

    /// `Unknown` is always stale; received data is stale once strictly older
    /// than [`PHONE_BATTERY_STALE_MS`].
    pub fn is_stale(&self, now: Timestamp) -> bool {
        match self {
            PhoneBatteryStatus::Unknown => true,
            PhoneBatteryStatus::DataReceived { received_at, .. } => {
                now.saturating_sub(*received_at) > PHONE_BATTERY_STALE_MS
            }
        }
    }

    pub fn percentage(&self) -> Option<u8> {
        match self {
            PhoneBatteryStatus::Unknown => None,
            PhoneBatteryStatus::DataReceived { percentage, .. } => Some(*percentage),
        }
    }
}

/// Watch battery level as last reported by the battery complication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum WatchBatteryStatus {
    #[default]
    Unknown,
    #[serde(rename_all = "camelCase")]
    DataReceived {
        percentage: u8,
        /// Set after one mismatch with the OS level has been tolerated.
        #[serde(default)]
        possibly_stale: bool,
    },
}

impl WatchBatteryStatus {
    pub fn received(percentage: u8) -> Self {
        WatchBatteryStatus::DataReceived {
            percentage,
            possibly_stale: false,
        }
    }

    /// Parse complication text such as `"77%"` or `"77"`.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let digits = match trimmed.find('%') {
            Some(index) if index > 0 => &trimmed[..index],
            _ => trimmed,
        };
        let percentage: u8 = digits
            .trim()
            .parse()
            .map_err(|_| Error::InvalidBatteryText(text.to_string()))?;
        if percentage > 100 {
            return Err(Error::InvalidBatteryText(text.to_string()));
        }
        Ok(Self::received(percentage))
    }

    pub fn percentage(&self) -> Option<u8> {
        match self {
            WatchBatteryStatus::Unknown => None,
            WatchBatteryStatus::DataReceived { percentage, .. } => Some(*percentage),
        }
    }

    /// Whether a mismatch with the freshly sampled OS level should force a
    /// provider resubscription. The first mismatch is tolerated.
    pub fn should_refresh(&self, sampled: u8) -> bool {
        match self {
            WatchBatteryStatus::Unknown => false,
            WatchBatteryStatus::DataReceived {
                percentage,
                possibly_stale,
            } => *percentage != sampled && *possibly_stale,
        }
    }

    pub fn mark_as_stale(&mut self) {
        if let WatchBatteryStatus::DataReceived { possibly_stale, .. } = self {
            *possibly_stale = true;
        }
    }
}

/// What to do after comparing the reported and sampled watch battery level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchBatteryCheck {
    UpToDate,
    /// First mismatch, now marked possibly stale.
    Tolerated,
    /// Second mismatch, the provider must be resubscribed.
    Resubscribe,
}

/// Apply the tolerate-once rule to `status` for a sampled OS level.
pub fn check_watch_battery(status: &mut WatchBatteryStatus, sampled: u8) -> WatchBatteryCheck {
    match status.percentage() {
        None => WatchBatteryCheck::UpToDate,
        Some(reported) if reported == sampled => WatchBatteryCheck::UpToDate,
        Some(_) if status.should_refresh(sampled) => {
            *status = WatchBatteryStatus::Unknown;
            WatchBatteryCheck::Resubscribe
        }
        Some(_) => {
            status.mark_as_stale();
            WatchBatteryCheck::Tolerated
        }
    }
}
