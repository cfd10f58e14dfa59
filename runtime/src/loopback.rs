//! In-memory transport connecting any number of nodes in one process.
//!
//! Used by the simulator and the integration tests. Every node owns a
//! broadcast channel; messages go to the addressed node, data items to every
//! other node, and assets live in a shared store until fetched.

use crate::error::TransportError;
use crate::transport::{Node, Transport, TransportEvent};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use watchface_core::wire::{Asset, PutDataRequest};
use watchface_core::{Message, NodeId, WirePath};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug)]
struct Endpoint {
    node: Node,
    capabilities: HashSet<String>,
    events: broadcast::Sender<TransportEvent>,
}

/// Shared medium of all loopback nodes.
#[derive(Debug, Default)]
pub struct LoopbackNetwork {
    endpoints: DashMap<NodeId, Endpoint>,
    assets: DashMap<String, Vec<u8>>,
}

impl LoopbackNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Attach a new node and return its transport.
    pub fn join(self: &Arc<Self>, display_name: &str, nearby: bool) -> LoopbackTransport {
        let node_id = uuid::Uuid::new_v4().to_string();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        self.endpoints.insert(
            node_id.clone(),
            Endpoint {
                node: Node {
                    id: node_id.clone(),
                    display_name: display_name.to_string(),
                    nearby,
                },
                capabilities: HashSet::new(),
                events,
            },
        );

        tracing::info!(node = %node_id, name = display_name, "loopback node joined");

        LoopbackTransport {
            network: Arc::clone(self),
            node_id,
        }
    }

    /// Detach a node. Capability watchers see it disappear.
    pub fn leave(&self, node_id: &str) {
        if let Some((_, endpoint)) = self.endpoints.remove(node_id) {
            for capability in &endpoint.capabilities {
                self.broadcast_capability(capability);
            }
            tracing::info!(node = %node_id, "loopback node left");
        }
    }

    pub fn advertise(&self, node_id: &str, capability: &str) {
        let inserted = self
            .endpoints
            .get_mut(node_id)
            .is_some_and(|mut endpoint| endpoint.capabilities.insert(capability.to_string()));
        if inserted {
            self.broadcast_capability(capability);
        }
    }

    pub fn withdraw(&self, node_id: &str, capability: &str) {
        let removed = self
            .endpoints
            .get_mut(node_id)
            .is_some_and(|mut endpoint| endpoint.capabilities.remove(capability));
        if removed {
            self.broadcast_capability(capability);
        }
    }

    /// Store asset bytes as if a data item carrying them had been put.
    pub fn store_asset(&self, digest: &str, bytes: Vec<u8>) {
        self.assets.insert(digest.to_string(), bytes);
    }

    /// Drop a stored asset, making later fetches fail.
    pub fn forget_asset(&self, digest: &str) -> bool {
        self.assets.remove(digest).is_some()
    }

    pub fn node_count(&self) -> usize {
        self.endpoints.len()
    }

    fn nodes_with(&self, capability: &str) -> Vec<Node> {
        self.endpoints
            .iter()
            .filter(|entry| entry.value().capabilities.contains(capability))
            .map(|entry| entry.value().node.clone())
            .collect()
    }

    fn broadcast_capability(&self, capability: &str) {
        let nodes = self.nodes_with(capability);
        for entry in self.endpoints.iter() {
            let _ = entry.value().events.send(TransportEvent::CapabilityChanged {
                capability: capability.to_string(),
                nodes: nodes.clone(),
            });
        }
        tracing::debug!(capability, nodes = nodes.len(), "capability changed");
    }
}

/// One node's view of a [`LoopbackNetwork`].
#[derive(Debug, Clone)]
pub struct LoopbackTransport {
    network: Arc<LoopbackNetwork>,
    node_id: NodeId,
}

impl LoopbackTransport {
    pub fn network(&self) -> &Arc<LoopbackNetwork> {
        &self.network
    }

    pub fn advertise(&self, capability: &str) {
        self.network.advertise(&self.node_id, capability);
    }

    pub fn withdraw(&self, capability: &str) {
        self.network.withdraw(&self.node_id, capability);
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    fn local_node(&self) -> NodeId {
        self.node_id.clone()
    }

    async fn reachable_nodes(&self, capability: &str) -> Result<Vec<Node>, TransportError> {
        Ok(self
            .network
            .nodes_with(capability)
            .into_iter()
            .filter(|node| node.id != self.node_id)
            .collect())
    }

    async fn connected_nodes(&self) -> Result<Vec<Node>, TransportError> {
        Ok(self
            .network
            .endpoints
            .iter()
            .filter(|entry| *entry.key() != self.node_id)
            .map(|entry| entry.value().node.clone())
            .collect())
    }

    async fn send_message(
        &self,
        node: &NodeId,
        path: WirePath,
        payload: Vec<u8>,
    ) -> Result<(), TransportError> {
        let endpoint = self
            .network
            .endpoints
            .get(node)
            .ok_or_else(|| TransportError::NoRoute(node.clone()))?;
        let message = Message::new(self.node_id.clone(), path, payload);
        // Nobody listening is not a send failure.
        let _ = endpoint.events.send(TransportEvent::Message(message));
        tracing::debug!(from = %self.node_id, to = %node, %path, "message sent");
        Ok(())
    }

    async fn put_data_item(&self, request: PutDataRequest) -> Result<(), TransportError> {
        if !self.network.endpoints.contains_key(&self.node_id) {
            return Err(TransportError::Closed);
        }
        for (asset, bytes) in request.assets {
            self.network.assets.insert(asset.digest, bytes);
        }
        for entry in self.network.endpoints.iter() {
            if *entry.key() != self.node_id {
                let _ = entry
                    .value()
                    .events
                    .send(TransportEvent::DataChanged(request.item.clone()));
            }
        }
        tracing::debug!(from = %self.node_id, path = %request.item.path, "data item put");
        Ok(())
    }

    async fn fetch_asset(&self, asset: &Asset) -> Result<Vec<u8>, TransportError> {
        self.network
            .assets
            .get(&asset.digest)
            .map(|bytes| bytes.value().clone())
            .ok_or_else(|| TransportError::AssetNotFound(asset.digest.clone()))
    }

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        match self.network.endpoints.get(&self.node_id) {
            Some(endpoint) => endpoint.events.subscribe(),
            // Detached node: a receiver that only ever reports closed.
            None => broadcast::channel(1).1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchface_core::wire::premium_item;

    #[tokio::test]
    async fn message_reaches_addressed_node() {
        let network = LoopbackNetwork::new_shared();
        let watch = network.join("watch", true);
        let phone = network.join("phone", true);
        let mut phone_events = phone.subscribe();

        watch
            .send_message(&phone.local_node(), WirePath::BatteryQueryStatus, vec![1])
            .await
            .unwrap();

        match phone_events.recv().await.unwrap() {
            TransportEvent::Message(message) => {
                assert_eq!(message.source, watch.local_node());
                assert_eq!(message.path, WirePath::BatteryQueryStatus.as_str());
                assert_eq!(message.payload, vec![1]);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_node_has_no_route() {
        let network = LoopbackNetwork::new_shared();
        let watch = network.join("watch", true);
        let err = watch
            .send_message(&"ghost".to_string(), WirePath::BatteryActivate, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::NoRoute(_)));
    }

    #[tokio::test]
    async fn capability_changes_are_broadcast() {
        let network = LoopbackNetwork::new_shared();
        let watch = network.join("watch", true);
        let phone = network.join("phone", false);
        let mut watch_events = watch.subscribe();

        phone.advertise("companion");
        match watch_events.recv().await.unwrap() {
            TransportEvent::CapabilityChanged { capability, nodes } => {
                assert_eq!(capability, "companion");
                assert_eq!(nodes.len(), 1);
                assert_eq!(nodes[0].id, phone.local_node());
            }
            other => panic!("unexpected event {other:?}"),
        }

        assert_eq!(watch.reachable_nodes("companion").await.unwrap().len(), 1);
        assert!(phone.reachable_nodes("companion").await.unwrap().is_empty());

        network.leave(&phone.local_node());
        assert!(watch.reachable_nodes("companion").await.unwrap().is_empty());
        assert!(watch.connected_nodes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn data_items_reach_other_nodes() {
        let network = LoopbackNetwork::new_shared();
        let watch = network.join("watch", true);
        let phone = network.join("phone", true);
        let mut watch_events = watch.subscribe();

        phone
            .put_data_item(PutDataRequest {
                item: premium_item(true, 1),
                assets: vec![(Asset::new("a1"), vec![9])],
                urgent: true,
            })
            .await
            .unwrap();

        assert!(matches!(
            watch_events.recv().await.unwrap(),
            TransportEvent::DataChanged(_)
        ));
        assert_eq!(watch.fetch_asset(&Asset::new("a1")).await.unwrap(), vec![9]);

        network.forget_asset("a1");
        assert!(watch.fetch_asset(&Asset::new("a1")).await.is_err());
    }
}
