//! Watch side of the battery and notification sync protocols.
//!
//! Both protocols share one flow: find the companion node advertising the
//! capability, ask it for its status, then let the user toggle sync. A
//! [`SyncClient`] owns the [`SyncMachine`] for one protocol and performs the
//! transport calls; every outcome is fed back into the machine tagged with
//! the operation it belongs to.

use crate::cancel::CancelScope;
use crate::error::{Result, RuntimeError};
use crate::protocol::send_with_timeout;
use crate::storage::Storage;
use crate::transport::{best_node, Transport, TransportEvent};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use watchface_core::wire::{decode_bool, encode_bool, NotificationsSyncStatus};
use watchface_core::{
    Discovery, NodeId, OpId, PeerNotFoundReason, SettingKey, SyncMachine, SyncState, WirePath,
};

const EVENT_CAPACITY: usize = 16;

/// Paths and persistence of one sync protocol.
pub trait SyncProtocol: Send + Sync + 'static {
    /// What the companion reports back.
    type Value: Clone + fmt::Debug + PartialEq + Send + Sync + 'static;

    const NAME: &'static str;
    const QUERY: WirePath;
    const ACTIVATE: WirePath;
    const DEACTIVATE: WirePath;
    const REPLY: WirePath;
    /// Flag persisted on the watch once the companion confirmed.
    const SETTING: SettingKey;

    fn decode_reply(payload: &[u8]) -> watchface_core::Result<Self::Value>;

    fn is_activated(value: &Self::Value) -> bool;
}

/// Phone battery sync. The companion answers with a single boolean.
#[derive(Debug, Clone, Copy)]
pub struct BatterySync;

impl SyncProtocol for BatterySync {
    type Value = bool;

    const NAME: &'static str = "battery sync";
    const QUERY: WirePath = WirePath::BatteryQueryStatus;
    const ACTIVATE: WirePath = WirePath::BatteryActivate;
    const DEACTIVATE: WirePath = WirePath::BatteryDeactivate;
    const REPLY: WirePath = WirePath::BatterySyncActivated;
    const SETTING: SettingKey = SettingKey::ShowPhoneBattery;

    fn decode_reply(payload: &[u8]) -> watchface_core::Result<bool> {
        decode_bool(Self::REPLY.as_str(), payload)
    }

    fn is_activated(value: &bool) -> bool {
        *value
    }
}

/// Notification sync. The companion answers with a tri-state status.
#[derive(Debug, Clone, Copy)]
pub struct NotificationsSync;

impl SyncProtocol for NotificationsSync {
    type Value = NotificationsSyncStatus;

    const NAME: &'static str = "notifications sync";
    const QUERY: WirePath = WirePath::NotificationsQueryStatus;
    const ACTIVATE: WirePath = WirePath::NotificationsActivate;
    const DEACTIVATE: WirePath = WirePath::NotificationsDeactivate;
    const REPLY: WirePath = WirePath::NotificationsSyncStatus;
    const SETTING: SettingKey = SettingKey::NotificationsSyncActivated;

    fn decode_reply(payload: &[u8]) -> watchface_core::Result<NotificationsSyncStatus> {
        NotificationsSyncStatus::decode(payload)
    }

    /// Missing permission on the phone does not count as activated.
    fn is_activated(value: &NotificationsSyncStatus) -> bool {
        matches!(value, NotificationsSyncStatus::Activated)
    }
}

/// One-shot notices surfaced to the settings screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A different companion replaced the one the client was talking to.
    PeerChanged { node: NodeId },
}

enum Lookup {
    Found(NodeId),
    NotFound(PeerNotFoundReason),
}

struct Inner<P: SyncProtocol> {
    machine: Mutex<SyncMachine<P::Value>>,
    state: watch::Sender<SyncState<P::Value>>,
    events: broadcast::Sender<SyncEvent>,
    transport: Arc<dyn Transport>,
    storage: Arc<dyn Storage>,
    capability: String,
    timeout: Duration,
    scope: CancelScope,
    _protocol: PhantomData<P>,
}

pub struct SyncClient<P: SyncProtocol> {
    inner: Arc<Inner<P>>,
}

impl<P: SyncProtocol> Clone for SyncClient<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: SyncProtocol> SyncClient<P> {
    pub fn new(
        transport: Arc<dyn Transport>,
        storage: Arc<dyn Storage>,
        capability: impl Into<String>,
        timeout: Duration,
        scope: CancelScope,
    ) -> Self {
        let (state, _) = watch::channel(SyncState::Loading);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                machine: Mutex::new(SyncMachine::new()),
                state,
                events,
                transport,
                storage,
                capability: capability.into(),
                timeout,
                scope,
                _protocol: PhantomData,
            }),
        }
    }

    pub fn state(&self) -> SyncState<P::Value> {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SyncState<P::Value>> {
        self.inner.state.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }

    /// The persisted activation flag.
    pub fn is_activated(&self) -> bool {
        self.inner.storage.get(P::SETTING)
    }

    /// Listen for replies and capability changes, then run the first
    /// discovery. The task ends when the client's scope is cancelled.
    pub fn start(&self) -> JoinHandle<()> {
        // Subscribe before discovering so no reply is missed.
        let mut transport_events = self.inner.transport.subscribe();
        let op = self.lock().current_op();
        self.spawn_discovery(op);

        let client = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = client.inner.scope.cancelled() => break,
                    event = transport_events.recv() => match event {
                        Ok(event) => client.on_transport_event(event),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(protocol = P::NAME, skipped, "transport events lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            tracing::debug!(protocol = P::NAME, "sync client stopped");
        })
    }

    /// Ask the companion to switch sync on or off. Only possible once it has
    /// responded; returns `false` otherwise.
    pub fn toggle(&self, activating: bool) -> bool {
        let started = {
            let mut machine = self.lock();
            let started = machine.begin_toggle(activating);
            if started.is_some() {
                self.publish(&machine);
            }
            started
        };
        let Some((node, op)) = started else {
            tracing::debug!(protocol = P::NAME, "toggle ignored, peer has not responded");
            return false;
        };

        let path = if activating { P::ACTIVATE } else { P::DEACTIVATE };
        self.spawn_send(node, path, Vec::new(), op);
        true
    }

    /// Switch sync off locally without reaching the companion.
    pub fn force_deactivate(&self) {
        if let Err(err) = self.inner.storage.set(P::SETTING, false) {
            tracing::error!(protocol = P::NAME, error = %err, "failed to persist deactivation");
        }
        self.commit(|machine| {
            machine.force_deactivate();
            true
        });
    }

    /// Restart discovery from scratch.
    pub fn retry(&self) {
        let op = {
            let mut machine = self.lock();
            let op = machine.retry();
            self.publish(&machine);
            op
        };
        self.spawn_discovery(op);
    }

    pub fn shutdown(&self) {
        self.inner.scope.cancel();
    }

    fn lock(&self) -> MutexGuard<'_, SyncMachine<P::Value>> {
        self.inner
            .machine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, machine: &SyncMachine<P::Value>) {
        self.inner.state.send_replace(machine.state().clone());
    }

    /// Apply a transition unless the scope is gone. Publishes on change.
    fn commit(&self, transition: impl FnOnce(&mut SyncMachine<P::Value>) -> bool) -> bool {
        if self.inner.scope.is_cancelled() {
            return false;
        }
        let mut machine = self.lock();
        let changed = transition(&mut machine);
        if changed {
            self.publish(&machine);
        }
        changed
    }

    fn on_transport_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::CapabilityChanged { capability, nodes }
                if capability == self.inner.capability =>
            {
                match best_node(&nodes) {
                    Some(node) => self.on_peer_found(node.id.clone(), None),
                    None => {
                        tracing::info!(protocol = P::NAME, "companion capability lost");
                        self.retry();
                    }
                }
            }
            TransportEvent::Message(message) if message.path == P::REPLY.as_str() => {
                match P::decode_reply(&message.payload) {
                    Ok(value) => self.on_reply(&message.source, value),
                    Err(err) => {
                        tracing::warn!(protocol = P::NAME, error = %err, "malformed reply ignored");
                    }
                }
            }
            _ => {}
        }
    }

    /// `lookup` is the discovery op a lookup result belongs to. Capability
    /// events are always current and pass `None`.
    fn on_peer_found(&self, node: NodeId, lookup: Option<OpId>) {
        if self.inner.scope.is_cancelled() {
            return;
        }
        let discovery = {
            let mut machine = self.lock();
            let discovery = match lookup {
                Some(op) => machine.on_lookup_found(op, node),
                None => machine.on_peer_found(node),
            };
            if discovery != Discovery::Unchanged {
                self.publish(&machine);
            }
            discovery
        };

        match discovery {
            Discovery::Unchanged => {}
            Discovery::Query { node, op } => {
                tracing::debug!(protocol = P::NAME, %node, "companion found, querying status");
                self.send_query(node, op);
            }
            Discovery::PeerChanged { node, op } => {
                tracing::warn!(protocol = P::NAME, %node, "companion changed");
                let _ = self.inner.events.send(SyncEvent::PeerChanged { node: node.clone() });
                self.send_query(node, op);
            }
        }
    }

    fn send_query(&self, node: NodeId, op: OpId) {
        let payload = encode_bool(self.is_activated());
        self.spawn_send(node, P::QUERY, payload, op);
    }

    fn on_reply(&self, source: &str, value: P::Value) {
        let activated = P::is_activated(&value);
        if !self.commit(|machine| machine.on_reply(source, value)) {
            tracing::debug!(protocol = P::NAME, source, "reply from unbound node ignored");
            return;
        }
        if let Err(err) = self.inner.storage.set(P::SETTING, activated) {
            tracing::error!(protocol = P::NAME, error = %err, "failed to persist sync state");
        }
        tracing::info!(protocol = P::NAME, activated, "companion responded");
    }

    fn spawn_discovery(&self, op: OpId) {
        let client = self.clone();
        tokio::spawn(async move {
            let lookup = client.inner.scope.run(client.lookup()).await;
            let activated = client.is_activated();
            match lookup {
                Ok(Lookup::Found(node)) => client.on_peer_found(node, Some(op)),
                Ok(Lookup::NotFound(reason)) => {
                    tracing::info!(protocol = P::NAME, ?reason, "no companion found");
                    client.commit(|machine| {
                        machine.current_op() == op && machine.on_peer_not_found(reason, activated)
                    });
                }
                Err(err) if err.is_cancelled() => {}
                Err(RuntimeError::Timeout(_)) => {
                    tracing::warn!(protocol = P::NAME, "companion lookup timed out");
                    client.commit(|machine| machine.on_discovery_timeout(op, activated));
                }
                Err(err) => {
                    tracing::warn!(protocol = P::NAME, error = %err, "companion lookup failed");
                    client.commit(|machine| {
                        machine.current_op() == op
                            && machine.on_peer_not_found(PeerNotFoundReason::LookupFailed, activated)
                    });
                }
            }
        });
    }

    async fn lookup(&self) -> Result<Lookup> {
        tokio::time::timeout(self.inner.timeout, self.find_companion())
            .await
            .map_err(|_| RuntimeError::Timeout("capability lookup"))?
    }

    async fn find_companion(&self) -> Result<Lookup> {
        let transport = &self.inner.transport;
        let nodes = transport.reachable_nodes(&self.inner.capability).await?;
        if let Some(node) = best_node(&nodes) {
            return Ok(Lookup::Found(node.id.clone()));
        }
        let connected = transport.connected_nodes().await?;
        let reason = if connected.is_empty() {
            PeerNotFoundReason::NoDevicePaired
        } else {
            PeerNotFoundReason::AppNotInstalled
        };
        Ok(Lookup::NotFound(reason))
    }

    /// Send `path` under `op`, then wait out the response window.
    fn spawn_send(&self, node: NodeId, path: WirePath, payload: Vec<u8>, op: OpId) {
        let client = self.clone();
        tokio::spawn(async move {
            let inner = &client.inner;
            let sent = inner
                .scope
                .run(send_with_timeout(
                    inner.transport.as_ref(),
                    &node,
                    path,
                    payload,
                    inner.timeout,
                ))
                .await;

            match sent {
                Ok(()) => {
                    client.commit(|machine| machine.on_sent(op));
                }
                Err(err) if err.is_cancelled() => return,
                Err(err) => {
                    tracing::warn!(protocol = P::NAME, %node, %path, error = %err, "send failed");
                    let activated = client.is_activated();
                    client.commit(|machine| machine.on_send_failed(op, activated));
                    return;
                }
            }

            let window = inner
                .scope
                .run(async {
                    tokio::time::sleep(inner.timeout).await;
                    Ok::<_, RuntimeError>(())
                })
                .await;
            if window.is_err() {
                return;
            }

            let activated = client.is_activated();
            if client.commit(|machine| machine.on_timeout(op, activated)) {
                tracing::warn!(protocol = P::NAME, %node, %path, "companion did not respond");
            }
        });
    }
}
