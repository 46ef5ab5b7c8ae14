//! # In-Process Network
//!
//! Nodes of a local cluster exchange encoded messages through each other's
//! inbound channels. Broadcasts never block: a full channel drops the
//! message, as a lossy link would. Requests ask every peer in turn until one
//! answers or the timeout elapses.

use parking_lot::RwLock;
use sc_03_consensus::{InboundRequest, InboundSenders, Transport, TransportError};
use shared_types::{decode, encode, NetworkMessage, Request};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Pause between request sweeps over the peers.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub type PeerId = usize;

/// Registry of every node's inbound channels.
#[derive(Default)]
pub struct LocalNetwork {
    peers: RwLock<BTreeMap<PeerId, InboundSenders>>,
}

impl LocalNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a node and hand back its transport.
    pub fn join(self: &Arc<Self>, id: PeerId, inbound: InboundSenders) -> LocalTransport {
        self.peers.write().insert(id, inbound);
        LocalTransport {
            id,
            network: Arc::clone(self),
        }
    }

    /// Disconnect a node; it stops receiving broadcasts and requests.
    pub fn leave(&self, id: PeerId) {
        self.peers.write().remove(&id);
    }

    pub fn peer_count(&self) -> usize {
        self.peers.read().len()
    }

    fn others(&self, id: PeerId) -> Vec<InboundSenders> {
        self.peers
            .read()
            .iter()
            .filter(|(peer, _)| **peer != id)
            .map(|(_, senders)| senders.clone())
            .collect()
    }
}

/// One node's view of the [`LocalNetwork`].
#[derive(Clone)]
pub struct LocalTransport {
    id: PeerId,
    network: Arc<LocalNetwork>,
}

impl LocalTransport {
    pub fn id(&self) -> PeerId {
        self.id
    }

    async fn ask(peer: &InboundSenders, payload: Vec<u8>, deadline: Instant) -> Option<Vec<u8>> {
        let (reply, answer) = oneshot::channel();
        peer.requests
            .try_send(InboundRequest { payload, reply })
            .ok()?;
        let remaining = deadline.saturating_duration_since(Instant::now());
        tokio::time::timeout(remaining, answer).await.ok()?.ok()?
    }
}

#[async_trait::async_trait]
impl Transport for LocalTransport {
    async fn broadcast(&self, message: NetworkMessage) -> Result<(), TransportError> {
        let kind = message.kind();
        let payload = encode(&message)?;
        let peers = self.network.others(self.id);
        let dropped = peers
            .iter()
            .filter(|peer| !peer.try_deliver(kind, payload.clone()))
            .count();
        if dropped > 0 {
            debug!(from = self.id, kind = kind.as_str(), dropped, "Broadcast dropped by full peers");
        }
        trace!(from = self.id, kind = kind.as_str(), peers = peers.len(), "Broadcast sent");
        Ok(())
    }

    async fn request(
        &self,
        request: Request,
        timeout: Duration,
    ) -> Result<Option<NetworkMessage>, TransportError> {
        let payload = encode(&request)?;
        let deadline = Instant::now() + timeout;

        loop {
            for peer in self.network.others(self.id) {
                if Instant::now() >= deadline {
                    return Ok(None);
                }
                let Some(bytes) = Self::ask(&peer, payload.clone(), deadline).await else {
                    continue;
                };
                match decode::<NetworkMessage>(&bytes) {
                    Ok(message) if request.is_answered_by(&message) => return Ok(Some(message)),
                    Ok(_) => trace!(from = self.id, "Ignoring mismatched response"),
                    Err(e) => debug!(from = self.id, error = %e, "Ignoring undecodable response"),
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL.min(remaining)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_03_consensus::{
        engine_channels, inbound_channels, spawn_listeners, InMemoryStore, InboundReceivers, Store,
    };
    use shared_types::{Block, TxBatch};

    fn block(height: u64, shard_id: u16) -> Block {
        Block::new([0; 32], height, shard_id, [1; 32], [2; 64], TxBatch::new()).seal()
    }

    fn join(network: &Arc<LocalNetwork>, id: PeerId) -> (LocalTransport, InboundReceivers) {
        let (senders, receivers) = inbound_channels(8);
        (network.join(id, senders), receivers)
    }

    #[tokio::test]
    async fn test_broadcast_skips_sender() {
        let network = LocalNetwork::new();
        let (a, mut a_inbox) = join(&network, 0);
        let (_b, mut b_inbox) = join(&network, 1);

        a.broadcast(NetworkMessage::Block(block(1, 2))).await.unwrap();

        let bytes = b_inbox.blocks.try_recv().unwrap();
        let decoded: NetworkMessage = decode(&bytes).unwrap();
        assert_eq!(decoded, NetworkMessage::Block(block(1, 2)));
        assert!(a_inbox.blocks.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_peer_drops_broadcast() {
        let network = LocalNetwork::new();
        let (a, _a_inbox) = join(&network, 0);
        let (senders, mut receivers) = inbound_channels(1);
        network.join(1, senders);

        a.broadcast(NetworkMessage::Block(block(1, 2))).await.unwrap();
        a.broadcast(NetworkMessage::Block(block(2, 2))).await.unwrap();

        assert!(receivers.blocks.try_recv().is_ok());
        assert!(receivers.blocks.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_request_is_answered_by_peer_store() {
        let network = LocalNetwork::new();
        let (a, _a_inbox) = join(&network, 0);
        let (_b, b_inbox) = join(&network, 1);
        let store = Arc::new(InMemoryStore::new());
        store.insert_block(block(4, 3));
        let (engine_senders, _engine_inbox) = engine_channels(8);
        let _listeners = spawn_listeners(store, b_inbox, engine_senders);

        let response = a
            .request(Request::block(4, 3), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(response, Some(NetworkMessage::Block(block(4, 3))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_request_times_out() {
        let network = LocalNetwork::new();
        let (a, _a_inbox) = join(&network, 0);
        let (_b, b_inbox) = join(&network, 1);
        let (engine_senders, _engine_inbox) = engine_channels(8);
        let _listeners = spawn_listeners(Arc::new(InMemoryStore::new()), b_inbox, engine_senders);

        let started = Instant::now();
        let response = a
            .request(Request::block(9, 2), Duration::from_millis(200))
            .await
            .unwrap();
        assert!(response.is_none());
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_without_peers_waits_for_timeout() {
        let network = LocalNetwork::new();
        let (a, _inbox) = join(&network, 0);
        let response = a
            .request(Request::epoch_block(3), Duration::from_millis(120))
            .await
            .unwrap();
        assert!(response.is_none());
    }

    #[test]
    fn test_leave_removes_peer() {
        let network = LocalNetwork::new();
        let (_a, _a_inbox) = join(&network, 0);
        let (_b, _b_inbox) = join(&network, 1);
        assert_eq!(network.peer_count(), 2);
        network.leave(1);
        assert_eq!(network.peer_count(), 1);
    }
}
