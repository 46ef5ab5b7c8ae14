//! In-memory store adapter
//!
//! Implements the Store port with one `RwLock` per collection.

use crate::domain::StoreError;
use crate::ports::Store;
use parking_lot::RwLock;
use shared_types::{
    Account, Address, Block, EpochBlock, GlobalState, Hash, Height, ShardId, StateTransition,
    Transaction, TransactionAssignment,
};
use std::collections::{BTreeMap, HashMap, HashSet};

type StashKey = (Height, ShardId);

/// Volatile store for one node.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<GlobalState>,
    open_txs: RwLock<Vec<Transaction>>,
    closed_txs: RwLock<HashSet<Hash>>,
    blocks: RwLock<BTreeMap<StashKey, Block>>,
    block_index: RwLock<HashMap<Hash, StashKey>>,
    transitions: RwLock<BTreeMap<StashKey, StateTransition>>,
    own_transitions: RwLock<BTreeMap<Height, StateTransition>>,
    assignments: RwLock<BTreeMap<StashKey, TransactionAssignment>>,
    epoch_blocks: RwLock<BTreeMap<Height, EpochBlock>>,
    last_epoch_block: RwLock<Option<EpochBlock>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.read().len()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.read().len()
    }

    pub fn closed_count(&self) -> usize {
        self.closed_txs.read().len()
    }
}

impl Store for InMemoryStore {
    fn account(&self, address: &Address) -> Option<Account> {
        self.state.read().get(address).cloned()
    }

    fn put_account(&self, account: Account) {
        self.state.write().insert(account.address, account);
    }

    fn state(&self) -> GlobalState {
        self.state.read().clone()
    }

    fn replace_state(&self, state: GlobalState) {
        *self.state.write() = state;
    }

    fn add_open_transactions(&self, txs: Vec<Transaction>) {
        let closed = self.closed_txs.read();
        let mut open = self.open_txs.write();
        for tx in txs {
            let hash = tx.hash();
            if closed.contains(&hash) || open.iter().any(|known| known.hash() == hash) {
                continue;
            }
            open.push(tx);
        }
    }

    fn open_transactions(&self) -> Vec<Transaction> {
        self.open_txs.read().clone()
    }

    fn close_transactions(&self, hashes: &[Hash]) {
        let mut closed = self.closed_txs.write();
        closed.extend(hashes.iter().copied());
        self.open_txs
            .write()
            .retain(|tx| !closed.contains(&tx.hash()));
    }

    fn is_closed(&self, hash: &Hash) -> bool {
        self.closed_txs.read().contains(hash)
    }

    fn insert_block(&self, block: Block) -> bool {
        let key = (block.height, block.shard_id);
        let mut blocks = self.blocks.write();
        if blocks.contains_key(&key) {
            return false;
        }
        self.block_index.write().insert(block.hash, key);
        blocks.insert(key, block);
        true
    }

    fn block(&self, height: Height, shard_id: ShardId) -> Option<Block> {
        self.blocks.read().get(&(height, shard_id)).cloned()
    }

    fn block_by_hash(&self, hash: &Hash) -> Option<Block> {
        let key = self.block_index.read().get(hash).copied()?;
        self.blocks
            .read()
            .get(&key)
            .filter(|block| block.hash == *hash)
            .cloned()
    }

    fn remove_block(&self, height: Height, shard_id: ShardId) -> Option<Block> {
        let removed = self.blocks.write().remove(&(height, shard_id))?;
        self.block_index.write().remove(&removed.hash);
        Some(removed)
    }

    fn insert_transition(&self, transition: StateTransition) -> bool {
        let key = (transition.height, transition.shard_id);
        let mut transitions = self.transitions.write();
        if transitions.contains_key(&key) {
            return false;
        }
        transitions.insert(key, transition);
        true
    }

    fn transition(&self, height: Height, shard_id: ShardId) -> Option<StateTransition> {
        self.transitions.read().get(&(height, shard_id)).cloned()
    }

    fn remove_transition(&self, height: Height, shard_id: ShardId) -> Option<StateTransition> {
        self.transitions.write().remove(&(height, shard_id))
    }

    fn put_own_transition(&self, transition: StateTransition) {
        self.own_transitions
            .write()
            .insert(transition.height, transition);
    }

    fn own_transition(&self, height: Height) -> Option<StateTransition> {
        self.own_transitions.read().get(&height).cloned()
    }

    fn put_assignment(&self, assignment: TransactionAssignment) {
        self.assignments
            .write()
            .insert((assignment.height, assignment.shard_id), assignment);
    }

    fn assignment(&self, height: Height, shard_id: ShardId) -> Option<TransactionAssignment> {
        self.assignments.read().get(&(height, shard_id)).cloned()
    }

    fn write_epoch_block(&self, epoch_block: EpochBlock) -> Result<(), StoreError> {
        if !epoch_block.is_sealed() {
            return Err(StoreError::UnsealedEpochBlock(epoch_block.height));
        }
        self.epoch_blocks
            .write()
            .insert(epoch_block.height, epoch_block.clone());
        *self.last_epoch_block.write() = Some(epoch_block);
        Ok(())
    }

    fn epoch_block(&self, height: Height) -> Option<EpochBlock> {
        self.epoch_blocks.read().get(&height).cloned()
    }

    fn last_epoch_block(&self) -> Option<EpochBlock> {
        self.last_epoch_block.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{FundsTx, RelativeState, TxBatch, ValidatorShardMapping};

    fn block(height: Height, shard_id: ShardId, nonce: u8) -> Block {
        Block::new([nonce; 32], height, shard_id, [1; 32], [0; 64], TxBatch::new()).seal()
    }

    fn funds(nonce: u64) -> Transaction {
        Transaction::Funds(FundsTx {
            from: [1; 32],
            to: [2; 32],
            amount: 1,
            fee: 1,
            nonce,
        })
    }

    #[test]
    fn test_block_insert_is_idempotent() {
        let store = InMemoryStore::new();
        let first = block(1, 2, 0);
        assert!(store.insert_block(first.clone()));
        assert!(!store.insert_block(block(1, 2, 9)));
        assert_eq!(store.block(1, 2), Some(first.clone()));
        assert_eq!(store.block_by_hash(&first.hash), Some(first));
        assert_eq!(store.block_count(), 1);
    }

    #[test]
    fn test_remove_block_clears_index() {
        let store = InMemoryStore::new();
        let b = block(1, 1, 0);
        store.insert_block(b.clone());
        assert!(store.remove_block(1, 1).is_some());
        assert!(store.block_by_hash(&b.hash).is_none());
        assert!(store.insert_block(block(1, 1, 4)));
    }

    #[test]
    fn test_transition_insert_is_idempotent() {
        let store = InMemoryStore::new();
        let t = StateTransition {
            height: 2,
            shard_id: 3,
            commitment_proof: [1; 64],
            relative_state: RelativeState::new(3),
        };
        assert!(store.insert_transition(t.clone()));
        assert!(!store.insert_transition(t.clone()));
        assert_eq!(store.remove_transition(2, 3), Some(t));
        assert!(store.transition(2, 3).is_none());
    }

    #[test]
    fn test_close_moves_transactions() {
        let store = InMemoryStore::new();
        store.add_open_transactions(vec![funds(1), funds(2), funds(1)]);
        assert_eq!(store.open_transactions().len(), 2);

        let closed = funds(1).hash();
        store.close_transactions(&[closed]);
        assert_eq!(store.open_transactions(), vec![funds(2)]);
        assert!(store.is_closed(&closed));

        // Closed transactions are not reopened.
        store.add_open_transactions(vec![funds(1)]);
        assert_eq!(store.open_transactions().len(), 1);
    }

    #[test]
    fn test_epoch_blocks() {
        let store = InMemoryStore::new();
        let eb = EpochBlock {
            hash: [0; 32],
            height: 3,
            prev_shard_hashes: vec![],
            state: GlobalState::new(),
            mapping: ValidatorShardMapping::default(),
            num_shards: 1,
            beneficiary: [1; 32],
            timestamp: 0,
        };
        assert_eq!(
            store.write_epoch_block(eb.clone()),
            Err(StoreError::UnsealedEpochBlock(3))
        );

        let sealed = eb.seal();
        store.write_epoch_block(sealed.clone()).unwrap();
        assert_eq!(store.epoch_block(3), Some(sealed.clone()));
        assert_eq!(store.last_epoch_block(), Some(sealed));
    }
}
