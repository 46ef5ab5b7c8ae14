//! # Shard-Chain Node Runtime
//!
//! Runs a local Shard-Chain network: every configured node is a validator
//! with its own engine, store and event bus, all connected through an
//! in-process network.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, `SC_CONFIG` file, `SC_*` environment)
//! 2. Initialise logging and metrics
//! 3. Build genesis and start the cluster
//! 4. Bridge node 0's events into the metrics
//! 5. Optionally feed demo transfers, one round per epoch
//! 6. Run until Ctrl+C

use anyhow::{Context, Result};
use node_runtime::{spawn_telemetry_bridge, LocalCluster, NodeConfig};
use sc_03_consensus::Store;
use sc_telemetry::{encode_metrics, init_telemetry};
use shared_bus::{EventFilter, EventTopic, NodeEvent};
use shared_types::{Address, FundsTx, Transaction};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// One transfer from every node to the next, all with nonce `round`.
fn demo_transfers(addresses: &[Address], round: u64) -> Vec<Transaction> {
    if addresses.len() < 2 {
        return Vec::new();
    }
    addresses
        .iter()
        .enumerate()
        .map(|(index, from)| {
            Transaction::Funds(FundsTx {
                from: *from,
                to: addresses[(index + 1) % addresses.len()],
                amount: 1,
                fee: 1,
                nonce: round,
            })
        })
        .collect()
}

fn spawn_demo_workload(cluster: &LocalCluster) -> JoinHandle<()> {
    let addresses: Vec<Address> = cluster.nodes().iter().map(|node| node.address).collect();
    let stores: Vec<Arc<dyn Store>> = cluster
        .nodes()
        .iter()
        .map(|node| Arc::clone(&node.store))
        .collect();
    let mut epochs = cluster.nodes()[0].subscribe(EventFilter::topics(vec![EventTopic::Epoch]));

    tokio::spawn(async move {
        let mut round = 0;
        while let Some(NodeEvent::EpochAdvanced { height, .. }) = epochs.recv().await {
            let txs = demo_transfers(&addresses, round);
            debug!(epoch = height, round, txs = txs.len(), "Submitting demo transfers");
            for store in &stores {
                store.add_open_transactions(txs.clone());
            }
            round += 1;
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::load().context("failed to load configuration")?;
    let telemetry = init_telemetry(config.telemetry_config(|name| std::env::var(name).ok()))
        .context("failed to initialise telemetry")?;

    info!("===========================================");
    info!("  Shard-Chain Node Runtime v{}", node_runtime::VERSION);
    info!("===========================================");
    info!(
        nodes = config.network.nodes,
        epoch_length = config.consensus.epoch_length,
        validators_per_shard = config.consensus.validators_per_shard,
        difficulty = config.consensus.difficulty,
        network = %telemetry.config().network,
        "Configuration loaded"
    );

    let cluster = LocalCluster::start(&config).context("failed to start local cluster")?;
    let bridge = spawn_telemetry_bridge(&cluster.nodes()[0].events);
    let demo = std::env::var("SC_DEMO_TRANSFERS")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
        .then(|| spawn_demo_workload(&cluster));

    info!("Network is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    info!(epoch_height = cluster.min_epoch_height(), "Shutting down");
    if let Some(demo) = demo {
        demo.abort();
    }
    bridge.abort();
    cluster.shutdown();
    if let Ok(metrics) = encode_metrics() {
        debug!(metrics = %metrics, "Final metrics");
    }
    Ok(())
}
