//! Async host for the watch face.
//!
//! `watchface-core` decides; this crate does the IO. It wires the pure core
//! to a paired-device [`Transport`], persisted [`Storage`] and the
//! [`HostPlatform`] callbacks, and runs everything on tokio.
//!
//! # Layout
//!
//! - [`engine`]: the single task that owns draw-side state and runs the draw
//!   cycle. Driven through an [`EngineHandle`].
//! - [`complications`]: slot registry, sanitizing and synthetic slots.
//! - [`scheduler`]: the one-shot wake timer.
//! - [`notifications`]: the icon LRU on the watch.
//! - [`protocol`]: battery and notification sync, premium propagation.
//! - [`loopback`] and [`sim`]: in-process transport and host used by the
//!   simulator binary and the tests.
//!
//! # Cancellation
//!
//! Every background task runs under a [`CancelScope`]. Shutting the engine
//! down cancels its scope and all children; no task commits a result after
//! that.

pub mod cancel;
pub mod complications;
pub mod config;
pub mod drawer;
pub mod engine;
pub mod error;
pub mod host;
pub mod loopback;
pub mod notifications;
pub mod protocol;
pub mod scheduler;
pub mod sim;
pub mod storage;
pub mod transport;

pub use cancel::CancelScope;
pub use complications::{ComplicationManager, SlotUpdate};
pub use config::{Config, ConfigError};
pub use drawer::{Drawer, LogDrawer};
pub use engine::{EngineCommand, EngineHandle, WatchFaceEngine};
pub use error::{Result, RuntimeError, StorageError, TransportError};
pub use host::{CompanionPlatform, HostPlatform};
pub use loopback::{LoopbackNetwork, LoopbackTransport};
pub use notifications::{NotificationIconCache, ICON_CACHE_CAPACITY};
pub use protocol::{
    BatterySync, CompanionResponder, NotificationsSync, PremiumPublisher, SyncClient, SyncEvent,
    SyncProtocol, WearableStatus,
};
pub use scheduler::{UpdateScheduler, Wake};
pub use sim::{SimHost, SimPhone};
pub use storage::{SettingsStore, Storage};
pub use transport::{best_node, Node, Transport, TransportEvent};
