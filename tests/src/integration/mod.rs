//! # Integration Scenarios
//!
//! Shared fixtures for the cluster tests.

pub mod cheat_detection;
pub mod epoch_round;
pub mod single_shard;

use node_runtime::{GenesisAccount, LocalCluster, NodeConfig};
use shared_types::{Address, Balance, EpochBlock, FundsTx, Height, ShardId, Transaction};
use std::time::Duration;

/// Upper bound for any scenario to reach its goal.
pub const SCENARIO_TIMEOUT: Duration = Duration::from_secs(30);

const POLL: Duration = Duration::from_millis(25);

/// Cluster config with short timeouts and a fixed shuffle seed.
pub fn fast_config(nodes: usize) -> NodeConfig {
    let mut config = NodeConfig::default();
    config.network.nodes = nodes;
    config.consensus.rng_seed = Some(11);
    config.consensus.block_request_timeout_ms = 200;
    config.consensus.transition_request_timeout_ms = 200;
    config.consensus.assignment_request_timeout_ms = 500;
    config.consensus.epoch_request_timeout_ms = 500;
    config.consensus.round_retry_delay_ms = 20;
    config
}

/// First address of the form `[i; 32]` whose transactions route to `shard_id`.
pub fn address_in_shard(shard_id: ShardId, num_shards: ShardId) -> Address {
    (1..=u8::MAX)
        .map(|i| [i; 32])
        .find(|address| sc_02_sharding::shard_for_sender(address, num_shards).ok() == Some(shard_id))
        .unwrap()
}

/// Add a funded non-validator account to the genesis block.
pub fn fund(config: &mut NodeConfig, address: Address, balance: Balance) {
    config.genesis.accounts.push(GenesisAccount {
        address: format!("0x{}", hex::encode(address)),
        balance,
    });
}

pub fn transfer(from: Address, to: Address, amount: Balance, nonce: u64) -> Transaction {
    Transaction::Funds(FundsTx {
        from,
        to,
        amount,
        fee: 1,
        nonce,
    })
}

/// Poll `node`'s last epoch block until `accept` holds.
pub async fn wait_for_epoch_block(
    cluster: &LocalCluster,
    node: usize,
    accept: impl Fn(&EpochBlock) -> bool,
) -> Option<EpochBlock> {
    tokio::time::timeout(SCENARIO_TIMEOUT, async {
        loop {
            if let Some(epoch_block) = cluster.nodes()[node].store.last_epoch_block() {
                if accept(&epoch_block) {
                    return epoch_block;
                }
            }
            tokio::time::sleep(POLL).await;
        }
    })
    .await
    .ok()
}

/// Copies of epoch block `height` held by the nodes, once every node is past it.
pub async fn stored_epoch_blocks(cluster: &LocalCluster, height: Height) -> Vec<EpochBlock> {
    assert!(cluster.wait_for_epoch(height, SCENARIO_TIMEOUT).await);
    cluster
        .nodes()
        .iter()
        .filter_map(|node| node.store.epoch_block(height))
        .collect()
}
