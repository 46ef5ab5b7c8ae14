//! Shard engine services
//!
//! # Architecture
//! - One engine task per node owns the [`ChainState`](crate::domain::ChainState)
//! - Listener tasks decode inbound messages into store stashes and engine channels
//! - The committee round and reconciliation fetch missing items through [`Transport`]

mod committee;
mod engine;
mod listeners;
mod miner;
mod reconciliation;
mod responder;
mod validation;


pub use committee::{fetch_block, run_committee_round};
pub use engine::ShardEngine;
pub use listeners::{
    decode_assignment, decode_block, decode_epoch_block, decode_request, decode_transition,
    engine_channels, inbound_channels, spawn_listeners, EngineInbox, EngineSenders,
    InboundReceivers, InboundRequest, InboundSenders,
};
pub use miner::{await_assignment, mine_height};
pub use reconciliation::{
    collect_transitions, reconcile, reconciliation_peers, start_reconciliation,
    PendingReconciliation,
};
pub use responder::RequestResponder;
pub use validation::{
    charge_block, previous_proofs, validate_block, validate_epoch_block, verify_transition,
};

use crate::domain::ConsensusConfig;
use crate::ports::{
    BlockFinalizer, CommitmentCrypto, CommitmentSigner, EventPublisher, ProofOfStake, Store,
    TimeSource, Transport,
};
use shared_types::Address;
use std::sync::Arc;

/// Configuration, identity and port handles of one node.
///
/// Cheap to clone; background tasks take their own copy.
#[derive(Clone)]
pub struct NodeContext {
    pub config: ConsensusConfig,
    /// This node's account address.
    pub address: Address,
    pub store: Arc<dyn Store>,
    pub transport: Arc<dyn Transport>,
    pub crypto: Arc<dyn CommitmentCrypto>,
    pub signer: Arc<dyn CommitmentSigner>,
    pub stake: Arc<dyn ProofOfStake>,
    pub finalizer: Arc<dyn BlockFinalizer>,
    pub time: Arc<dyn TimeSource>,
    pub events: Arc<dyn EventPublisher>,
}
