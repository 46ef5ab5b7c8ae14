//! # Transaction Router
//!
//! Partitions the open-transaction pool into one assignment per shard.
//!
//! Account-creation and staking transactions always go to the committee
//! shard. Funds and data transactions follow [`shard_for_sender`].
//!
//! [`TransactionRouter::route_funded`] additionally holds back anything the
//! sender cannot cover from its epoch balance, counting every debit already
//! assigned to any shard. Held-back transactions stay open for a later epoch.

use crate::algorithms::shard_for_sender;
use crate::domain::ShardError;
use shared_types::{
    short_hex, GlobalState, Height, ShardId, SpendingBudget, Transaction, TransactionAssignment,
    TxBatch, COMMITTEE_SHARD,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Shard that must process `tx` when `shard_count` shards are active.
pub fn route_transaction(tx: &Transaction, shard_count: ShardId) -> Result<ShardId, ShardError> {
    match tx {
        Transaction::Acc(_) | Transaction::Stake(_) => Ok(COMMITTEE_SHARD),
        Transaction::Funds(tx) => shard_for_sender(&tx.from, shard_count),
        Transaction::Data(tx) => shard_for_sender(&tx.from, shard_count),
    }
}

/// Issues transaction assignments and remembers the height it last did so.
#[derive(Debug, Default)]
pub struct TransactionRouter {
    assignment_height: Option<Height>,
}

impl TransactionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Epoch height of the most recent routing round.
    pub fn assignment_height(&self) -> Option<Height> {
        self.assignment_height
    }

    /// Build the assignments for the epoch at `height`.
    ///
    /// Every shard 1..=`shard_count` receives an assignment, empty or not,
    /// ordered by shard id.
    pub fn route<'a, I>(
        &mut self,
        open: I,
        height: Height,
        shard_count: ShardId,
    ) -> Result<Vec<TransactionAssignment>, ShardError>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        self.partition(open, height, shard_count, None)
    }

    /// Like [`route`](Self::route), but only assigns what each sender can
    /// pay for out of its balance in `epoch_state`, in pool order.
    pub fn route_funded<'a, I>(
        &mut self,
        open: I,
        height: Height,
        shard_count: ShardId,
        epoch_state: &GlobalState,
    ) -> Result<Vec<TransactionAssignment>, ShardError>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        self.partition(open, height, shard_count, Some(SpendingBudget::new(epoch_state)))
    }

    fn partition<'a, I>(
        &mut self,
        open: I,
        height: Height,
        shard_count: ShardId,
        mut budget: Option<SpendingBudget<'_>>,
    ) -> Result<Vec<TransactionAssignment>, ShardError>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        if shard_count == 0 {
            return Err(ShardError::ZeroShards);
        }

        let mut partitions: BTreeMap<ShardId, TxBatch> =
            (1..=shard_count).map(|shard| (shard, TxBatch::new())).collect();
        let mut deferred = 0usize;

        for tx in open {
            let shard = route_transaction(tx, shard_count)?;
            if let Some(budget) = budget.as_mut() {
                if !budget.try_charge(tx) {
                    debug!(
                        height,
                        sender = %short_hex(&tx.sender()),
                        debit = tx.debit(),
                        "[sc-02] Sender cannot cover transaction this epoch, deferring"
                    );
                    deferred += 1;
                    continue;
                }
            }
            partitions.entry(shard).or_default().push(tx.clone());
        }

        let assignments: Vec<TransactionAssignment> = partitions
            .into_iter()
            .map(|(shard_id, transactions)| {
                debug!(
                    height,
                    shard_id,
                    tx_count = transactions.len(),
                    "[sc-02] Assignment built"
                );
                TransactionAssignment {
                    height,
                    shard_id,
                    transactions,
                }
            })
            .collect();

        self.assignment_height = Some(height);
        info!(height, shard_count, deferred, "[sc-02] Transactions routed");
        Ok(assignments)
    }
}

/// Whether a received assignment belongs to the epoch a follower is in.
///
/// Anything issued for another height or another shard is stale.
pub fn is_current_assignment(
    assignment: &TransactionAssignment,
    epoch_height: Height,
    shard_id: ShardId,
) -> bool {
    assignment.is_for(epoch_height, shard_id)
}
