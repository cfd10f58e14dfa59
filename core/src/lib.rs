//! # Watch Face Core
//!
//! Deterministic logic behind a minimal digital watch face.
//!
//! This crate holds everything the watch face decides without touching the
//! outside world: which complication payloads are broken and how to repair
//! them, when the next redraw is due, how long phone-side facts stay fresh,
//! how companion messages are encoded, and how the sync protocols move
//! between states. The async host in `watchface-runtime` feeds it events and
//! carries out the IO it asks for.
//!
//! ## Design Principles
//!
//! - **No IO**: nothing here reads the clock, the network or the disk
//! - **Total**: malformed input degrades to the last good value, never a panic
//! - **Data-driven quirks**: OEM regressions are table rows, not branches
//! - **Testable**: pure functions over explicit `now` timestamps
//!
//! ## Core Concepts
//!
//! ### Complications
//!
//! A [`ComplicationSlot`] is a fixed screen position fed by an external
//! provider. Its payload is a [`ComplicationData`]; texts may be
//! time-dependent ([`ComplicationText::TimeDifference`]) and then carry their
//! own next change instant.
//!
//! ### Sanitizing
//!
//! [`Sanitizer::sanitize`] recognizes payloads from known-broken OEM
//! providers by their localized names ([`quirks::tables`]) and OEM app
//! version, and rewrites or suppresses them. Unknown providers pass through.
//!
//! ### Scheduling
//!
//! [`next_update_delay`] folds the seconds ring and every registered
//! time-dependent text into a single wake delay, floored at one second.
//!
//! ### Sync
//!
//! [`SyncMachine`] is the shared state machine of the battery and
//! notification sync protocols. Every IO step is tagged with an [`OpId`] so
//! outcomes of superseded operations are ignored.
//!
//! ## Quick Start
//!
//! ```rust
//! use watchface_core::{
//!     CalendarEvent, ComplicationData, DeviceFamily, DeviceProfile, PlatformQueries,
//!     ProviderBinding, Sanitizer, Settings,
//! };
//!
//! struct NoQueries;
//!
//! impl PlatformQueries for NoQueries {
//!     fn heart_rate(&self) -> watchface_core::Result<Option<f64>> {
//!         Ok(None)
//!     }
//!     fn next_calendar_event(&self) -> watchface_core::Result<Option<CalendarEvent>> {
//!         Ok(None)
//!     }
//!     fn health_suite_version(&self) -> watchface_core::Result<u64> {
//!         Ok(0)
//!     }
//! }
//!
//! let device = DeviceProfile::new(DeviceFamily::Samsung);
//! let sanitizer = Sanitizer::new(&device, &NoQueries);
//! let binding = ProviderBinding::new("com.example.app", "com.example/.Battery", "Example", "Battery");
//!
//! let raw = ComplicationData::short_text("42%");
//! let data = sanitizer.sanitize(&raw, &Settings::default(), 100, Some(&binding));
//! assert_eq!(data, raw);
//! ```

pub mod battery;
pub mod clock;
pub mod complication;
pub mod device;
pub mod error;
pub mod frame;
pub mod notification;
pub mod provider;
pub mod quirks;
pub mod scheduler;
pub mod settings;
pub mod slot;
pub mod sync_state;
pub mod wire;

// Re-export main types at crate root
pub use battery::{check_watch_battery, PhoneBatteryStatus, WatchBatteryCheck, WatchBatteryStatus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use complication::{ComplicationData, ComplicationKind, ComplicationText, IconRef, TapAction};
pub use device::{DeviceFamily, DeviceProfile};
pub use error::{Error, Result};
pub use frame::{route_tap, FrameSnapshot, ModeFlags, Navigation, TapContext, TapRegion};
pub use notification::{
    Bitmap, NotificationBatch, NotificationBatcher, NotificationState, PhoneNotification,
};
pub use provider::{DefaultProvider, ProviderBinding, WeatherProvider};
pub use quirks::{
    classify, CalendarEvent, PlatformQueries, ProviderClass, QuirkFix, QuirkRule, Sanitizer,
};
pub use scheduler::{next_update_delay, TimeDependentRegistry};
pub use settings::{SettingKey, Settings};
pub use slot::{ComplicationSlot, SlotLocation, Style};
pub use sync_state::{
    Discovery, OpId, PeerNotFoundReason, SyncErrorKind, SyncMachine, SyncState,
};
pub use wire::{DataItem, DataMap, DataValue, Message, NotificationsSyncStatus, WirePath};

/// Type aliases for clarity
pub type Timestamp = u64;
pub type SlotId = u32;
pub type IconId = i32;
pub type NodeId = String;
