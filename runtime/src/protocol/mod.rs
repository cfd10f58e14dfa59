//! Companion sync protocols.
//!
//! - [`client`]: watch side of battery and notification sync, one
//!   [`SyncClient`] per protocol driving a [`SyncMachine`](watchface_core::SyncMachine).
//! - [`responder`]: phone side answering those clients.
//! - [`premium`]: phone side publishing the premium entitlement.

pub mod client;
pub mod premium;
pub mod responder;

pub use client::{BatterySync, NotificationsSync, SyncClient, SyncEvent, SyncProtocol};
pub use premium::{PremiumPublisher, WearableStatus};
pub use responder::CompanionResponder;

use crate::error::{Result, RuntimeError};
use crate::transport::Transport;
use std::time::Duration;
use watchface_core::{NodeId, WirePath};

/// Send one message, bounded by `timeout`.
pub(crate) async fn send_with_timeout(
    transport: &dyn Transport,
    node: &NodeId,
    path: WirePath,
    payload: Vec<u8>,
    timeout: Duration,
) -> Result<()> {
    tokio::time::timeout(timeout, transport.send_message(node, path, payload))
        .await
        .map_err(|_| RuntimeError::Timeout("message send"))??;
    Ok(())
}
