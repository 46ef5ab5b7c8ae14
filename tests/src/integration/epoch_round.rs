//! # Epoch Round
//!
//! Transfers submitted to every node are routed by sender, mined by the
//! sender's shard, reconciled across shards and folded into the next epoch
//! block by the committee.
//!
//! ```text
//! submit ──→ committee routes ──→ shard 1 mines A→B ──┐
//!                            └──→ shard 2 mines B→A ──┼──→ committee round ──→ epoch block
//!                                  transitions ───────┘
//! ```

#[cfg(test)]
mod tests {
    use crate::integration::*;
    use node_runtime::LocalCluster;
    use shared_types::{FundsTx, StakeTx, Transaction, COMMITTEE_SHARD};

    // =========================================================================
    // CROSS-SHARD TRANSFERS
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cross_shard_transfers_reach_epoch_state() {
        let mut config = fast_config(2);
        let alice = address_in_shard(1, 2);
        let bob = address_in_shard(2, 2);
        fund(&mut config, alice, 1_000);
        fund(&mut config, bob, 1_000);

        let cluster = LocalCluster::start(&config).unwrap();
        assert_eq!(cluster.genesis().num_shards, 2);
        cluster.submit(vec![
            transfer(alice, bob, 100, 0),
            transfer(bob, alice, 50, 0),
        ]);

        let settled = wait_for_epoch_block(&cluster, 0, |epoch_block| {
            epoch_block.state[&alice].balance == 949 && epoch_block.state[&bob].balance == 1_049
        })
        .await
        .expect("transfers never reached an epoch block");

        let copies = stored_epoch_blocks(&cluster, settled.height).await;
        assert!(!copies.is_empty());
        assert!(copies.iter().all(|copy| copy.hash == settled.hash));

        for node in cluster.nodes() {
            assert!(node.store.open_transactions().is_empty());
        }
        cluster.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overdrawn_transfer_is_never_applied() {
        let mut config = fast_config(2);
        let carol = address_in_shard(2, 2);
        fund(&mut config, carol, 10);

        let cluster = LocalCluster::start(&config).unwrap();
        let validator = cluster.nodes()[0].address;
        cluster.submit(vec![transfer(carol, validator, 500, 0)]);

        assert!(cluster.wait_for_epoch(9, SCENARIO_TIMEOUT).await);
        let last = cluster.nodes()[0].store.last_epoch_block().unwrap();
        assert_eq!(last.state[&carol].balance, 10);
        cluster.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_sender_debited_in_two_shards_cannot_stall_epochs() {
        let mut config = fast_config(2);
        let frank = address_in_shard(2, 2);
        let grace = [0xB7; 32];
        fund(&mut config, frank, 1_000);
        fund(&mut config, grace, 0);

        let cluster = LocalCluster::start(&config).unwrap();
        // The stake fee is processed by shard 1, the transfer by shard 2.
        // Together they take 1_100 from an account holding 1_000.
        cluster.submit(vec![
            Transaction::Stake(StakeTx {
                account: frank,
                fee: 500,
                is_staking: true,
                commitment_key: [0xF1; 32],
                nonce: 0,
            }),
            Transaction::Funds(FundsTx {
                from: frank,
                to: grace,
                amount: 400,
                fee: 200,
                nonce: 1,
            }),
        ]);

        let settled = wait_for_epoch_block(&cluster, 0, |epoch_block| {
            epoch_block.state[&frank].balance == 500
        })
        .await
        .expect("stake fee never reached an epoch block");
        assert_eq!(settled.state[&grace].balance, 0);

        // Epochs keep closing and the transfer that no longer fits stays out.
        let later = settled.height + 3 * (config.consensus.epoch_length + 1);
        let copies = stored_epoch_blocks(&cluster, later).await;
        assert!(!copies.is_empty());
        for copy in &copies {
            assert_eq!(copy.state[&frank].balance, 500);
            assert_eq!(copy.state[&grace].balance, 0);
        }
        cluster.shutdown();
    }

    // =========================================================================
    // OBSERVERS
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_observers_follow_the_epochs() {
        let mut config = fast_config(4);
        config.consensus.validators_per_shard = 2;

        let cluster = LocalCluster::start(&config).unwrap();
        let genesis = cluster.genesis().clone();
        assert_eq!(genesis.num_shards, 2);
        assert_eq!(genesis.mapping.validators_in(COMMITTEE_SHARD).len(), 2);

        // Genesis at 0, then one epoch block every epoch_length + 1 heights.
        let target = 2 * (config.consensus.epoch_length + 1);
        let copies = stored_epoch_blocks(&cluster, target).await;
        assert!(!copies.is_empty());
        assert!(copies.iter().all(|copy| copy.hash == copies[0].hash));
        for node in cluster.nodes() {
            assert!(node.epoch_height() >= target);
            assert!(!node.is_stopped());
        }
        cluster.shutdown();
    }
}
