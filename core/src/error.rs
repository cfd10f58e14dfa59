//! Error types for the watch-face core.

use crate::IconId;
use thiserror::Error;

/// All possible errors from the watch-face core.
///
/// None of these are fatal: every ingress point that can produce one logs it
/// and falls back to the last known good value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Peer payload errors
    #[error("empty payload on {0}")]
    EmptyPayload(String),

    #[error("battery percentage out of range: {0}")]
    BatteryOutOfRange(u8),

    #[error("unknown notifications sync status byte: {0}")]
    UnknownSyncStatus(u8),

    #[error("missing data item field '{field}' on {path}")]
    MissingField { path: String, field: String },

    #[error("data item field '{field}' has the wrong type, expected {expected}")]
    FieldType {
        field: String,
        expected: &'static str,
    },

    #[error("missing asset for icon {0}")]
    MissingAsset(IconId),

    #[error("unknown path: {0}")]
    UnknownPath(String),

    // Provider / platform data errors
    #[error("invalid battery text: {0}")]
    InvalidBatteryText(String),

    #[error("platform query failed: {0}")]
    PlatformQuery(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
