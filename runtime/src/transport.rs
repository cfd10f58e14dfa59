//! Paired-device transport capability.
//!
//! Two primitives cross the link: fire-and-forget [`Message`]s addressed to
//! one node, and [`DataItem`]s with binary assets that every node of the pair
//! eventually sees. Reachability is learned through named capabilities.

use crate::error::TransportError;
use async_trait::async_trait;
use tokio::sync::broadcast;
use watchface_core::wire::{Asset, PutDataRequest};
use watchface_core::{DataItem, Message, NodeId, WirePath};

/// A paired device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub display_name: String,
    /// Directly connected rather than routed through the cloud.
    pub nearby: bool,
}

/// Prefer a nearby node, else the first one.
pub fn best_node(nodes: &[Node]) -> Option<&Node> {
    nodes.iter().find(|node| node.nearby).or_else(|| nodes.first())
}

/// Something arrived from the other side of the pair.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The set of nodes advertising `capability` changed.
    CapabilityChanged {
        capability: String,
        nodes: Vec<Node>,
    },
    Message(Message),
    DataChanged(DataItem),
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// This device's node id.
    fn local_node(&self) -> NodeId;

    /// Nodes currently advertising `capability`.
    async fn reachable_nodes(&self, capability: &str) -> Result<Vec<Node>, TransportError>;

    /// Every connected node, whatever it advertises.
    async fn connected_nodes(&self) -> Result<Vec<Node>, TransportError>;

    async fn send_message(
        &self,
        node: &NodeId,
        path: WirePath,
        payload: Vec<u8>,
    ) -> Result<(), TransportError>;

    async fn put_data_item(&self, request: PutDataRequest) -> Result<(), TransportError>;

    async fn fetch_asset(&self, asset: &Asset) -> Result<Vec<u8>, TransportError>;

    /// Incoming events. Late subscribers miss earlier events.
    fn subscribe(&self) -> broadcast::Receiver<TransportEvent>;
}
