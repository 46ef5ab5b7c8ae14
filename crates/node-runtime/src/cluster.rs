//! # Local Cluster
//!
//! Runs N validator nodes in one process. Every node gets its own store,
//! event bus, listener tasks and engine task; nodes talk through a shared
//! [`LocalNetwork`].
//!
//! ## Startup Sequence
//!
//! 1. Derive node keys and build the genesis epoch block
//! 2. Join every node to the network (so no early broadcast is lost)
//! 3. Spawn listeners, then engines

use crate::adapters::{
    Ed25519Crypto, Ed25519Signer, KeccakStakePredicate, LocalNetwork, StakeFinalizer,
};
use crate::config::NodeConfig;
use crate::genesis::{devnet_seed, GenesisBuilder, GenesisError};
use sc_03_consensus::{
    engine_channels, inbound_channels, spawn_listeners, CommitmentSigner, ConsensusError,
    InMemoryStore, NodeContext, ProofOfStake, ShardEngine, Store, SystemTimeSource, Transport,
};
use shared_bus::{EventFilter, InMemoryEventBus, Subscription};
use shared_types::{short_hex, Address, EpochBlock, Height, Transaction};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Pause between epoch-progress checks in [`LocalCluster::wait_for_epoch`].
const PROGRESS_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("Genesis failed: {0}")]
    Genesis(#[from] GenesisError),

    #[error("Node failed to start: {0}")]
    Consensus(#[from] ConsensusError),
}

/// The ports a node is started with.
///
/// [`LocalCluster::start_with`] hands them to a callback first, which may
/// wrap them (fault injection in tests).
pub struct NodePorts {
    pub store: Arc<dyn Store>,
    pub transport: Arc<dyn Transport>,
}

/// One running node.
pub struct ClusterNode {
    pub index: usize,
    pub address: Address,
    pub store: Arc<dyn Store>,
    pub events: Arc<InMemoryEventBus>,
    engine: JoinHandle<()>,
    listeners: Vec<JoinHandle<()>>,
}

impl ClusterNode {
    /// Height of the last epoch block this node adopted.
    pub fn epoch_height(&self) -> Height {
        self.store
            .last_epoch_block()
            .map(|epoch_block| epoch_block.height)
            .unwrap_or(0)
    }

    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.events.subscribe(filter)
    }

    /// Whether the engine task has exited.
    pub fn is_stopped(&self) -> bool {
        self.engine.is_finished()
    }

    fn abort(&self) {
        self.engine.abort();
        for listener in &self.listeners {
            listener.abort();
        }
    }
}

/// N nodes on one [`LocalNetwork`].
pub struct LocalCluster {
    network: Arc<LocalNetwork>,
    genesis: EpochBlock,
    nodes: Vec<ClusterNode>,
}

impl LocalCluster {
    /// Start `config.network.nodes` nodes with the reference adapters.
    pub fn start(config: &NodeConfig) -> Result<Self, ClusterError> {
        Self::start_with(config, |_, ports| ports)
    }

    /// Start the cluster, letting `wrap` replace each node's ports.
    pub fn start_with(
        config: &NodeConfig,
        mut wrap: impl FnMut(usize, NodePorts) -> NodePorts,
    ) -> Result<Self, ClusterError> {
        let signers: Vec<Ed25519Signer> = (0..config.network.nodes)
            .map(|index| Ed25519Signer::from_seed(&devnet_seed(index)))
            .collect();
        let genesis = signers
            .iter()
            .fold(
                GenesisBuilder::new(
                    config.genesis.clone(),
                    config.consensus.ledger.clone(),
                    config.consensus.validators_per_shard,
                ),
                |builder, signer| builder.validator(signer.address(), signer.commitment_key()),
            )
            .build()?;

        let network = LocalNetwork::new();
        let capacity = config.network.channel_capacity;
        let stake: Arc<dyn ProofOfStake> = Arc::new(KeccakStakePredicate);
        let finalizer = Arc::new(StakeFinalizer::new(
            Arc::clone(&stake),
            config.mining.max_stake_attempts,
        ));

        let mut pending = Vec::with_capacity(signers.len());
        for (index, signer) in signers.into_iter().enumerate() {
            let (inbound, receivers) = inbound_channels(capacity);
            let (engine_senders, inbox) = engine_channels(capacity);
            let ports = wrap(
                index,
                NodePorts {
                    store: Arc::new(InMemoryStore::new()),
                    transport: Arc::new(network.join(index, inbound)),
                },
            );
            let address = signer.address();
            let events = Arc::new(InMemoryEventBus::new());
            let ctx = NodeContext {
                config: config.consensus.clone(),
                address,
                store: Arc::clone(&ports.store),
                transport: ports.transport,
                crypto: Arc::new(Ed25519Crypto),
                signer: Arc::new(signer),
                stake: Arc::clone(&stake),
                finalizer: finalizer.clone(),
                time: Arc::new(SystemTimeSource),
                events: events.clone(),
            };
            let engine = ShardEngine::new(ctx, genesis.clone(), inbox)?;
            pending.push((index, address, ports.store, events, engine, receivers, engine_senders));
        }

        let nodes = pending
            .into_iter()
            .map(|(index, address, store, events, engine, receivers, engine_senders)| {
                let listeners = spawn_listeners(Arc::clone(&store), receivers, engine_senders);
                let engine = tokio::spawn(async move {
                    if let Err(e) = engine.run().await {
                        error!(node = index, error = %e, "Shard engine stopped");
                    }
                });
                ClusterNode {
                    index,
                    address,
                    store,
                    events,
                    engine,
                    listeners,
                }
            })
            .collect::<Vec<_>>();

        info!(
            nodes = nodes.len(),
            num_shards = genesis.num_shards,
            genesis = %short_hex(&genesis.hash),
            "Local cluster started"
        );
        Ok(Self {
            network,
            genesis,
            nodes,
        })
    }

    pub fn genesis(&self) -> &EpochBlock {
        &self.genesis
    }

    pub fn nodes(&self) -> &[ClusterNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&ClusterNode> {
        self.nodes.get(index)
    }

    /// Node that holds `address`.
    pub fn node_by_address(&self, address: &Address) -> Option<&ClusterNode> {
        self.nodes.iter().find(|node| node.address == *address)
    }

    /// Add transactions to every node's open pool.
    pub fn submit(&self, txs: Vec<Transaction>) {
        for node in &self.nodes {
            node.store.add_open_transactions(txs.clone());
        }
    }

    /// Lowest epoch height any node has reached.
    pub fn min_epoch_height(&self) -> Height {
        self.nodes
            .iter()
            .map(ClusterNode::epoch_height)
            .min()
            .unwrap_or(0)
    }

    /// Wait until every node adopted an epoch block at `height` or later.
    pub async fn wait_for_epoch(&self, height: Height, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            while self.min_epoch_height() < height {
                tokio::time::sleep(PROGRESS_POLL).await;
            }
        })
        .await
        .is_ok()
    }

    /// Stop every task and disconnect the nodes.
    pub fn shutdown(self) {
        for node in &self.nodes {
            node.abort();
            self.network.leave(node.index);
        }
        info!(nodes = self.nodes.len(), "Local cluster stopped");
    }
}
