//! OEM provider quirks.
//!
//! Some OEM providers ship broken complication payloads. [`Sanitizer`]
//! recognizes them from the [`tables`] and the rules in [`sanitizer`] and
//! rewrites the payload, falling back to the raw data on any fault.

pub mod sanitizer;
pub mod tables;

pub use sanitizer::{
    classify, CalendarEvent, PlatformQueries, ProviderClass, QuirkFix, QuirkRule, Sanitizer,
    VersionGate, QUIRK_RULES,
};
