//! Phone side of premium propagation.
//!
//! The entitlement is written as an urgent `/premium` data item so a watch
//! that connects later still sees it, and mirrored as a one-byte message to
//! every watch currently in reach.

use crate::error::{Result, RuntimeError};
use crate::protocol::send_with_timeout;
use crate::transport::Transport;
use std::sync::Arc;
use std::time::Duration;
use watchface_core::wire::{encode_bool, premium_item, PutDataRequest};
use watchface_core::{Clock, WirePath};

/// What the phone knows about the watch app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WearableStatus {
    /// No watch connected.
    NotAvailable,
    /// A watch is connected but does not run the watch face.
    AppNotInstalled,
    AppInstalled,
}

pub struct PremiumPublisher {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    watch_capability: String,
    timeout: Duration,
}

impl PremiumPublisher {
    pub fn new(
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        watch_capability: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            clock,
            watch_capability: watch_capability.into(),
            timeout,
        }
    }

    pub async fn wearable_status(&self) -> Result<WearableStatus> {
        let connected = self.with_timeout(self.transport.connected_nodes()).await?;
        if connected.is_empty() {
            return Ok(WearableStatus::NotAvailable);
        }
        let watches = self
            .with_timeout(self.transport.reachable_nodes(&self.watch_capability))
            .await?;
        Ok(if watches.is_empty() {
            WearableStatus::AppNotInstalled
        } else {
            WearableStatus::AppInstalled
        })
    }

    /// Publish the entitlement. Returns how many watches got the message.
    pub async fn publish(&self, premium: bool) -> Result<usize> {
        self.transport
            .put_data_item(PutDataRequest {
                item: premium_item(premium, self.clock.now()),
                assets: Vec::new(),
                urgent: true,
            })
            .await?;

        let watches = self
            .with_timeout(self.transport.reachable_nodes(&self.watch_capability))
            .await?;
        for node in &watches {
            send_with_timeout(
                self.transport.as_ref(),
                &node.id,
                WirePath::PremiumMessage,
                encode_bool(premium),
                self.timeout,
            )
            .await?;
        }
        tracing::info!(premium, watches = watches.len(), "premium published");
        Ok(watches.len())
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T>
    where
        F: std::future::Future<Output = std::result::Result<T, crate::error::TransportError>>,
    {
        Ok(tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| RuntimeError::Timeout("node lookup"))??)
    }
}
