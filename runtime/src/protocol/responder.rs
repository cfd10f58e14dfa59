//! Phone side of the sync protocols.
//!
//! Answers status queries and toggles from the watch, persists the
//! activation flags on the phone, and pushes battery levels and notification
//! icons while sync is on.

use crate::cancel::CancelScope;
use crate::error::Result;
use crate::host::CompanionPlatform;
use crate::protocol::send_with_timeout;
use crate::storage::Storage;
use crate::transport::{Node, Transport, TransportEvent};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use watchface_core::wire::{
    decode_bool, encode_battery_percent, encode_bool, notifications_request,
    NotificationsSyncStatus,
};
use watchface_core::{
    Clock, IconId, Message, NodeId, NotificationBatcher, PhoneNotification, SettingKey, WirePath,
};

pub struct CompanionResponder {
    transport: Arc<dyn Transport>,
    storage: Arc<dyn Storage>,
    platform: Arc<dyn CompanionPlatform>,
    clock: Arc<dyn Clock>,
    watch_capability: String,
    timeout: Duration,
    scope: CancelScope,
    batcher: Mutex<NotificationBatcher>,
}

impl CompanionResponder {
    pub fn new(
        transport: Arc<dyn Transport>,
        storage: Arc<dyn Storage>,
        platform: Arc<dyn CompanionPlatform>,
        clock: Arc<dyn Clock>,
        watch_capability: impl Into<String>,
        timeout: Duration,
        scope: CancelScope,
    ) -> Self {
        Self {
            transport,
            storage,
            platform,
            clock,
            watch_capability: watch_capability.into(),
            timeout,
            scope,
            batcher: Mutex::new(NotificationBatcher::new()),
        }
    }

    /// Serve the watch until the scope is cancelled.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.transport.subscribe();
        let responder = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = responder.scope.cancelled() => break,
                    event = events.recv() => event,
                };
                match event {
                    Ok(event) => {
                        if let Err(err) = responder.scope.run(responder.on_event(event)).await {
                            if err.is_cancelled() {
                                break;
                            }
                            tracing::warn!(error = %err, "companion request failed");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "companion events lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("companion responder stopped");
        })
    }

    async fn on_event(&self, event: TransportEvent) -> Result<()> {
        match event {
            TransportEvent::Message(message) => self.handle_message(&message).await,
            TransportEvent::CapabilityChanged { capability, nodes }
                if capability == self.watch_capability =>
            {
                // A watch came (back) into reach: resume battery pushes.
                if self.storage.get(SettingKey::BatterySyncActivated) {
                    for node in nodes.iter().filter(|node| node.nearby) {
                        self.activate_battery(&node.id).await?;
                    }
                }
                Ok(())
            }
            TransportEvent::CapabilityChanged { .. } | TransportEvent::DataChanged(_) => Ok(()),
        }
    }

    /// Handle one message from the watch.
    pub async fn handle_message(&self, message: &Message) -> Result<()> {
        let Ok(path) = WirePath::parse(&message.path) else {
            tracing::debug!(path = %message.path, "unknown message path ignored");
            return Ok(());
        };
        let source = &message.source;
        match path {
            WirePath::BatteryQueryStatus => {
                if decode_bool(&message.path, &message.payload)? {
                    self.activate_battery(source).await
                } else {
                    self.deactivate_battery(source).await
                }
            }
            WirePath::BatteryActivate => self.activate_battery(source).await,
            WirePath::BatteryDeactivate => self.deactivate_battery(source).await,
            WirePath::NotificationsQueryStatus => {
                let activate = decode_bool(&message.path, &message.payload)?;
                self.set_notifications(source, activate).await
            }
            WirePath::NotificationsActivate => self.set_notifications(source, true).await,
            WirePath::NotificationsDeactivate => self.set_notifications(source, false).await,
            other => {
                tracing::debug!(path = %other, "message not addressed to the companion");
                Ok(())
            }
        }
    }

    async fn activate_battery(&self, node: &NodeId) -> Result<()> {
        self.storage.set(SettingKey::BatterySyncActivated, true)?;
        self.send(node, WirePath::BatterySyncActivated, encode_bool(true))
            .await?;
        self.push_battery(node).await?;
        tracing::info!(%node, "battery sync activated");
        Ok(())
    }

    async fn deactivate_battery(&self, node: &NodeId) -> Result<()> {
        self.storage.set(SettingKey::BatterySyncActivated, false)?;
        self.send(node, WirePath::BatterySyncActivated, encode_bool(false))
            .await?;
        tracing::info!(%node, "battery sync deactivated");
        Ok(())
    }

    async fn push_battery(&self, node: &NodeId) -> Result<()> {
        match self.platform.battery_percent() {
            Some(percent) => {
                self.send(node, WirePath::BatteryStatus, encode_battery_percent(percent))
                    .await
            }
            None => {
                tracing::debug!("phone battery level unavailable");
                Ok(())
            }
        }
    }

    async fn set_notifications(&self, node: &NodeId, activate: bool) -> Result<()> {
        self.storage
            .set(SettingKey::NotificationsSyncActivated, activate)?;
        if activate {
            // The watch starts from an empty cache.
            self.batcher.lock().await.reset();
        }
        let status = self.notifications_status();
        self.send(node, WirePath::NotificationsSyncStatus, vec![status.as_byte()])
            .await?;
        tracing::info!(%node, ?status, "notification sync status sent");
        Ok(())
    }

    fn notifications_status(&self) -> NotificationsSyncStatus {
        NotificationsSyncStatus::derive(
            self.storage.get(SettingKey::NotificationsSyncActivated),
            self.platform.has_notification_permission(),
        )
    }

    /// The phone battery level changed.
    pub async fn on_battery_changed(&self) -> Result<()> {
        if !self.storage.get(SettingKey::BatterySyncActivated) {
            return Ok(());
        }
        for node in self.watch_nodes().await? {
            self.push_battery(&node.id).await?;
        }
        Ok(())
    }

    /// Notification access was granted or revoked.
    pub async fn on_permission_changed(&self) -> Result<()> {
        if !self.storage.get(SettingKey::NotificationsSyncActivated) {
            return Ok(());
        }
        let status = self.notifications_status();
        for node in self.watch_nodes().await? {
            self.send(&node.id, WirePath::NotificationsSyncStatus, vec![status.as_byte()])
                .await?;
        }
        tracing::info!(?status, "notification permission change pushed");
        Ok(())
    }

    /// Publish the icons of the active notifications. Returns `false` when
    /// sync is off or the watch already has this list.
    pub async fn publish_notifications(
        &self,
        active: &[PhoneNotification],
        icons: &BTreeMap<IconId, Vec<u8>>,
    ) -> Result<bool> {
        if !self.storage.get(SettingKey::NotificationsSyncActivated) {
            return Ok(false);
        }
        let mut batcher = self.batcher.lock().await;
        let Some(batch) = batcher.next_batch(active) else {
            return Ok(false);
        };

        let request = notifications_request(&batch, icons, self.clock.now());
        self.transport.put_data_item(request).await?;
        batcher.mark_sent(&batch);
        tracing::debug!(icons = ?batch.icon_ids, has_more = batch.has_more, "notifications published");
        Ok(true)
    }

    async fn watch_nodes(&self) -> Result<Vec<Node>> {
        let nodes = tokio::time::timeout(
            self.timeout,
            self.transport.reachable_nodes(&self.watch_capability),
        )
        .await
        .map_err(|_| crate::error::RuntimeError::Timeout("watch lookup"))??;
        Ok(nodes.into_iter().filter(|node| node.nearby).collect())
    }

    async fn send(&self, node: &NodeId, path: WirePath, payload: Vec<u8>) -> Result<()> {
        send_with_timeout(self.transport.as_ref(), node, path, payload, self.timeout).await
    }

    pub fn shutdown(&self) {
        self.scope.cancel();
    }
}
