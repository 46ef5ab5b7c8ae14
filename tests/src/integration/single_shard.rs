//! # Single Shard
//!
//! With one validator there is one shard, and that shard is the committee.
//! The node routes, mines, validates and closes every epoch on its own and
//! never has to ask anyone for anything.

use async_trait::async_trait;
use sc_03_consensus::{Transport, TransportError};
use shared_types::{NetworkMessage, Request};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Transport that counts the requests it forwards.
pub struct CountingTransport {
    inner: Arc<dyn Transport>,
    requests: Arc<AtomicUsize>,
}

impl CountingTransport {
    pub fn new(inner: Arc<dyn Transport>, requests: Arc<AtomicUsize>) -> Self {
        Self { inner, requests }
    }
}

#[async_trait]
impl Transport for CountingTransport {
    async fn broadcast(&self, message: NetworkMessage) -> Result<(), TransportError> {
        self.inner.broadcast(message).await
    }

    async fn request(
        &self,
        request: Request,
        timeout: Duration,
    ) -> Result<Option<NetworkMessage>, TransportError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.inner.request(request, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::*;
    use node_runtime::{LocalCluster, NodePorts};
    use shared_types::COMMITTEE_SHARD;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_lone_validator_runs_every_epoch_without_requests() {
        let mut config = fast_config(1);
        let dave = [0xD0; 32];
        fund(&mut config, dave, 500);

        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);
        let cluster = LocalCluster::start_with(&config, move |_, ports| NodePorts {
            store: ports.store,
            transport: Arc::new(CountingTransport::new(ports.transport, Arc::clone(&counter))),
        })
        .unwrap();
        assert_eq!(cluster.genesis().num_shards, 1);

        let validator = cluster.nodes()[0].address;
        cluster.submit(vec![transfer(dave, validator, 200, 0)]);

        let settled = wait_for_epoch_block(&cluster, 0, |epoch_block| {
            epoch_block.state[&dave].balance == 299
        })
        .await
        .expect("transfer never reached an epoch block");

        // Amount plus the fee lands on the validator, which mines every block.
        let genesis_balance = cluster.genesis().state[&validator].balance;
        assert_eq!(settled.state[&validator].balance, genesis_balance + 201);
        assert_eq!(settled.num_shards, 1);
        assert_eq!(settled.mapping.shard_of(&validator), Some(COMMITTEE_SHARD));

        assert!(cluster.wait_for_epoch(settled.height + 6, SCENARIO_TIMEOUT).await);
        assert_eq!(requests.load(Ordering::SeqCst), 0);
        cluster.shutdown();
    }
}
