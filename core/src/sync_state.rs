//! Watch-side state machine shared by the companion sync protocols.
//!
//! The machine is pure: the runtime performs the transport calls and feeds
//! their outcome back in. Every round-trip is tagged with an [`OpId`]; an
//! outcome for anything but the current operation is ignored, so a newer
//! discovery always supersedes a stale in-flight operation.

use crate::NodeId;
use serde::{Deserialize, Serialize};

/// Identifies one peer round-trip.
pub type OpId = u64;

/// Why no peer could be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PeerNotFoundReason {
    /// No paired device at all.
    NoDevicePaired,
    /// A device is paired but does not advertise the companion capability.
    AppNotInstalled,
    /// Capability lookup failed or timed out.
    LookupFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncErrorKind {
    NoResponse,
    UnableToSend,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SyncState<V> {
    Loading,
    #[serde(rename_all = "camelCase")]
    PeerNotFound {
        reason: PeerNotFoundReason,
        activated: bool,
    },
    PeerFound {
        node: NodeId,
    },
    WaitingForPeerResponse {
        node: NodeId,
    },
    PeerResponded {
        node: NodeId,
        value: V,
    },
    SendingToPeer {
        node: NodeId,
        activating: bool,
    },
    Error {
        kind: SyncErrorKind,
        activated: bool,
    },
}

impl<V> SyncState<V> {
    /// The peer this state is bound to, if any.
    pub fn node(&self) -> Option<&NodeId> {
        match self {
            SyncState::PeerFound { node }
            | SyncState::WaitingForPeerResponse { node }
            | SyncState::PeerResponded { node, .. }
            | SyncState::SendingToPeer { node, .. } => Some(node),
            SyncState::Loading | SyncState::PeerNotFound { .. } | SyncState::Error { .. } => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        match self {
            SyncState::PeerNotFound { .. } | SyncState::PeerResponded { .. } | SyncState::Error { .. } => {
                true
            }
            SyncState::Loading
            | SyncState::PeerFound { .. }
            | SyncState::WaitingForPeerResponse { .. }
            | SyncState::SendingToPeer { .. } => false,
        }
    }
}

/// What the runtime must do after a peer was discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    /// Same peer, nothing to do.
    Unchanged,
    /// Query the peer's status under `op`.
    Query { node: NodeId, op: OpId },
    /// A different peer replaced the current one mid-flight. Surface the
    /// change once, then query the new peer under `op`.
    PeerChanged { node: NodeId, op: OpId },
}

#[derive(Debug, Clone)]
pub struct SyncMachine<V> {
    state: SyncState<V>,
    op: OpId,
}

impl<V: Clone> Default for SyncMachine<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> SyncMachine<V> {
    pub fn new() -> Self {
        Self {
            state: SyncState::Loading,
            op: 0,
        }
    }

    pub fn state(&self) -> &SyncState<V> {
        &self.state
    }

    /// The current operation id.
    pub fn current_op(&self) -> OpId {
        self.op
    }

    fn next_op(&mut self) -> OpId {
        self.op += 1;
        self.op
    }

    /// A peer advertising the capability was found.
    pub fn on_peer_found(&mut self, node: NodeId) -> Discovery {
        let current = self.state.node().cloned();
        match current {
            None => {
                self.state = SyncState::PeerFound { node: node.clone() };
                let op = self.next_op();
                Discovery::Query { node, op }
            }
            Some(current) if current == node => Discovery::Unchanged,
            Some(_) => {
                self.state = SyncState::PeerFound { node: node.clone() };
                let op = self.next_op();
                Discovery::PeerChanged { node, op }
            }
        }
    }

    /// A lookup started under `op` found a peer. Superseded lookups are
    /// dropped so they cannot rebind the machine to a peer that left.
    pub fn on_lookup_found(&mut self, op: OpId, node: NodeId) -> Discovery {
        if op != self.op {
            return Discovery::Unchanged;
        }
        self.on_peer_found(node)
    }

    /// Discovery gave up. Ignored once a peer is known.
    pub fn on_peer_not_found(&mut self, reason: PeerNotFoundReason, activated: bool) -> bool {
        match self.state {
            SyncState::Loading | SyncState::PeerNotFound { .. } | SyncState::Error { .. } => {
                self.state = SyncState::PeerNotFound { reason, activated };
                self.op += 1;
                true
            }
            SyncState::PeerFound { .. }
            | SyncState::WaitingForPeerResponse { .. }
            | SyncState::PeerResponded { .. }
            | SyncState::SendingToPeer { .. } => false,
        }
    }

    /// The query or toggle message of `op` left the device.
    pub fn on_sent(&mut self, op: OpId) -> bool {
        if op != self.op {
            return false;
        }
        match &self.state {
            SyncState::PeerFound { node } | SyncState::SendingToPeer { node, .. } => {
                self.state = SyncState::WaitingForPeerResponse { node: node.clone() };
                true
            }
            SyncState::Loading
            | SyncState::PeerNotFound { .. }
            | SyncState::WaitingForPeerResponse { .. }
            | SyncState::PeerResponded { .. }
            | SyncState::Error { .. } => false,
        }
    }

    /// Sending the message of `op` failed.
    pub fn on_send_failed(&mut self, op: OpId, activated: bool) -> bool {
        if op != self.op || self.state.node().is_none() {
            return false;
        }
        self.state = SyncState::Error {
            kind: SyncErrorKind::UnableToSend,
            activated,
        };
        true
    }

    /// The peer answered. Only accepted from the bound peer.
    pub fn on_reply(&mut self, source: &str, value: V) -> bool {
        let accepts = match &self.state {
            SyncState::PeerFound { node }
            | SyncState::WaitingForPeerResponse { node }
            | SyncState::SendingToPeer { node, .. }
            | SyncState::PeerResponded { node, .. } => node == source,
            SyncState::Loading | SyncState::PeerNotFound { .. } | SyncState::Error { .. } => false,
        };
        if !accepts {
            return false;
        }
        self.state = SyncState::PeerResponded {
            node: source.to_string(),
            value,
        };
        self.op += 1;
        true
    }

    /// The response window of `op` elapsed.
    pub fn on_timeout(&mut self, op: OpId, activated: bool) -> bool {
        if op != self.op {
            return false;
        }
        match self.state {
            SyncState::PeerFound { .. }
            | SyncState::WaitingForPeerResponse { .. }
            | SyncState::SendingToPeer { .. } => {
                self.state = SyncState::Error {
                    kind: SyncErrorKind::NoResponse,
                    activated,
                };
                true
            }
            SyncState::Loading
            | SyncState::PeerNotFound { .. }
            | SyncState::PeerResponded { .. }
            | SyncState::Error { .. } => false,
        }
    }

    /// Start an activate/deactivate round-trip. Only valid once the peer has
    /// responded.
    pub fn begin_toggle(&mut self, activating: bool) -> Option<(NodeId, OpId)> {
        let SyncState::PeerResponded { node, .. } = &self.state else {
            return None;
        };
        let node = node.clone();
        self.state = SyncState::SendingToPeer {
            node: node.clone(),
            activating,
        };
        let op = self.next_op();
        Some((node, op))
    }

    /// Local deactivation without waiting for the peer.
    pub fn force_deactivate(&mut self) {
        match &mut self.state {
            SyncState::Error { activated, .. } | SyncState::PeerNotFound { activated, .. } => {
                *activated = false;
            }
            SyncState::Loading
            | SyncState::PeerFound { .. }
            | SyncState::WaitingForPeerResponse { .. }
            | SyncState::PeerResponded { .. }
            | SyncState::SendingToPeer { .. } => {}
        }
    }

    /// Restart discovery from scratch. Returns the new discovery op.
    pub fn retry(&mut self) -> OpId {
        self.state = SyncState::Loading;
        self.next_op()
    }

    /// Discovery window elapsed with nothing found.
    pub fn on_discovery_timeout(&mut self, op: OpId, activated: bool) -> bool {
        if op != self.op || !matches!(self.state, SyncState::Loading) {
            return false;
        }
        self.state = SyncState::PeerNotFound {
            reason: PeerNotFoundReason::LookupFailed,
            activated,
        };
        true
    }
}
