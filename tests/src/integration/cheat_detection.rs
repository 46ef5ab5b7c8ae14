//! # Cheat Detection
//!
//! A shard that publishes a relative state its blocks do not produce must
//! never get it into an epoch block. The committee recomputes every shard's
//! effects and refuses to close the epoch while a forged transition stands.
//!
//! Forging happens at the ports: [`ForgingStore`] rewrites transitions as
//! they are stored, [`ForgingTransport`] as they are broadcast.

use async_trait::async_trait;
use sc_03_consensus::{Store, StoreError, Transport, TransportError};
use shared_types::{
    Account, Address, Block, EpochBlock, GlobalState, Hash, Height, NetworkMessage, Request,
    ShardId, StateTransition, Transaction, TransactionAssignment, COMMITTEE_SHARD,
};
use std::sync::Arc;
use std::time::Duration;

/// Account credited out of thin air by every forged transition.
pub const FORGED_ACCOUNT: Address = [0xEE; 32];
pub const FORGED_DELTA: i64 = 1_000_000;

/// Add the forged credit. Applying it twice changes nothing.
pub fn forge(mut transition: StateTransition) -> StateTransition {
    if transition.shard_id != COMMITTEE_SHARD {
        transition
            .relative_state
            .deltas
            .insert(FORGED_ACCOUNT, FORGED_DELTA);
    }
    transition
}

/// Store that forges every transition it keeps.
pub struct ForgingStore {
    inner: Arc<dyn Store>,
}

impl ForgingStore {
    pub fn new(inner: Arc<dyn Store>) -> Self {
        Self { inner }
    }
}

impl Store for ForgingStore {
    fn account(&self, address: &Address) -> Option<Account> {
        self.inner.account(address)
    }

    fn put_account(&self, account: Account) {
        self.inner.put_account(account)
    }

    fn state(&self) -> GlobalState {
        self.inner.state()
    }

    fn replace_state(&self, state: GlobalState) {
        self.inner.replace_state(state)
    }

    fn add_open_transactions(&self, txs: Vec<Transaction>) {
        self.inner.add_open_transactions(txs)
    }

    fn open_transactions(&self) -> Vec<Transaction> {
        self.inner.open_transactions()
    }

    fn close_transactions(&self, hashes: &[Hash]) {
        self.inner.close_transactions(hashes)
    }

    fn is_closed(&self, hash: &Hash) -> bool {
        self.inner.is_closed(hash)
    }

    fn insert_block(&self, block: Block) -> bool {
        self.inner.insert_block(block)
    }

    fn block(&self, height: Height, shard_id: ShardId) -> Option<Block> {
        self.inner.block(height, shard_id)
    }

    fn block_by_hash(&self, hash: &Hash) -> Option<Block> {
        self.inner.block_by_hash(hash)
    }

    fn remove_block(&self, height: Height, shard_id: ShardId) -> Option<Block> {
        self.inner.remove_block(height, shard_id)
    }

    fn insert_transition(&self, transition: StateTransition) -> bool {
        self.inner.insert_transition(forge(transition))
    }

    fn transition(&self, height: Height, shard_id: ShardId) -> Option<StateTransition> {
        self.inner.transition(height, shard_id)
    }

    fn remove_transition(&self, height: Height, shard_id: ShardId) -> Option<StateTransition> {
        self.inner.remove_transition(height, shard_id)
    }

    fn put_own_transition(&self, transition: StateTransition) {
        self.inner.put_own_transition(forge(transition))
    }

    fn own_transition(&self, height: Height) -> Option<StateTransition> {
        self.inner.own_transition(height)
    }

    fn put_assignment(&self, assignment: TransactionAssignment) {
        self.inner.put_assignment(assignment)
    }

    fn assignment(&self, height: Height, shard_id: ShardId) -> Option<TransactionAssignment> {
        self.inner.assignment(height, shard_id)
    }

    fn write_epoch_block(&self, epoch_block: EpochBlock) -> Result<(), StoreError> {
        self.inner.write_epoch_block(epoch_block)
    }

    fn epoch_block(&self, height: Height) -> Option<EpochBlock> {
        self.inner.epoch_block(height)
    }

    fn last_epoch_block(&self) -> Option<EpochBlock> {
        self.inner.last_epoch_block()
    }
}

/// Transport that forges every transition it broadcasts.
pub struct ForgingTransport {
    inner: Arc<dyn Transport>,
}

impl ForgingTransport {
    pub fn new(inner: Arc<dyn Transport>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Transport for ForgingTransport {
    async fn broadcast(&self, message: NetworkMessage) -> Result<(), TransportError> {
        let message = match message {
            NetworkMessage::StateTransition(transition) => {
                NetworkMessage::StateTransition(forge(transition))
            }
            other => other,
        };
        self.inner.broadcast(message).await
    }

    async fn request(
        &self,
        request: Request,
        timeout: Duration,
    ) -> Result<Option<NetworkMessage>, TransportError> {
        self.inner.request(request, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::*;
    use node_runtime::{LocalCluster, NodePorts};
    use shared_bus::{EventFilter, EventTopic, NodeEvent, Subscription};

    async fn cheats_seen(events: &mut Subscription, shard: ShardId, wanted: usize) -> usize {
        let mut seen = 0;
        let _ = tokio::time::timeout(SCENARIO_TIMEOUT, async {
            while seen < wanted {
                match events.recv().await {
                    Some(NodeEvent::CheatDetected { shard_id, .. }) if shard_id == shard => {
                        seen += 1
                    }
                    Some(_) => {}
                    None => break,
                }
            }
        })
        .await;
        seen
    }

    // =========================================================================
    // FORGED TRANSITIONS
    // =========================================================================

    #[test]
    fn test_forge_is_idempotent() {
        let transition = StateTransition {
            height: 1,
            shard_id: 2,
            commitment_proof: [0; 64],
            relative_state: shared_types::RelativeState::new(2),
        };
        let once = forge(transition.clone());
        assert_eq!(forge(once.clone()), once);
        assert_eq!(once.relative_state.delta(&FORGED_ACCOUNT), FORGED_DELTA);
        assert_ne!(once, transition);
    }

    // Current-thread runtime: nothing runs before the subscription exists.
    #[tokio::test]
    async fn test_committee_rejects_forged_transitions() {
        let cluster = LocalCluster::start_with(&fast_config(2), |_, ports| NodePorts {
            store: Arc::new(ForgingStore::new(ports.store)),
            transport: Arc::new(ForgingTransport::new(ports.transport)),
        })
        .unwrap();

        let committee = cluster.genesis().mapping.proposer(COMMITTEE_SHARD).unwrap();
        let committee = cluster.node_by_address(&committee).unwrap();
        let mut events = committee.subscribe(EventFilter::topics(vec![EventTopic::Committee]));

        assert!(cheats_seen(&mut events, 2, 2).await >= 2);
        assert_eq!(committee.epoch_height(), 0);
        assert_eq!(cluster.min_epoch_height(), 0);
        assert!(!committee.is_stopped());
        cluster.shutdown();
    }

    #[tokio::test]
    async fn test_forged_broadcast_is_replaced_by_honest_answer() {
        let cluster = LocalCluster::start_with(&fast_config(2), |_, ports| NodePorts {
            store: ports.store,
            transport: Arc::new(ForgingTransport::new(ports.transport)),
        })
        .unwrap();
        let mut events =
            cluster.nodes()[0].subscribe(EventFilter::topics(vec![EventTopic::Committee]));

        // The honest copy is served on request after the forged one is evicted.
        assert!(cluster.wait_for_epoch(3, SCENARIO_TIMEOUT).await);
        let epoch_block = cluster.nodes()[0].store.epoch_block(3).unwrap();
        assert!(!epoch_block.state.contains_key(&FORGED_ACCOUNT));

        while let Ok(Some(event)) = events.try_recv() {
            if let NodeEvent::CheatDetected { shard_id, .. } = event {
                assert_ne!(shard_id, COMMITTEE_SHARD);
            }
        }
        cluster.shutdown();
    }
}
