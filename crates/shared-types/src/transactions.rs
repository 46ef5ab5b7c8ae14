//! # Transactions
//!
//! The four transaction kinds and the [`TxBatch`] partition used by blocks
//! and transaction assignments.
//!
//! Account-creation and staking transactions are always processed by the
//! committee shard; funds and data transactions are routed by sender.

use crate::entities::GlobalState;
use crate::hashing::{address_from_pub_key, ContentHasher};
use crate::{Address, Balance, CommitmentKey, Hash};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Creates a new account owned by `pub_key`; the fee is minted to the miner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccTx {
    /// Account that requested the creation.
    pub issuer: Address,
    pub fee: Balance,
    /// Public key of the account to create.
    pub pub_key: [u8; 32],
}

impl AccTx {
    /// Address of the account this transaction creates.
    pub fn new_account_address(&self) -> Address {
        address_from_pub_key(&self.pub_key)
    }

    pub fn hash(&self) -> Hash {
        ContentHasher::new(b"acc-tx")
            .fixed(&self.issuer)
            .u64(self.fee)
            .fixed(&self.pub_key)
            .finish()
    }
}

/// Registers or withdraws a validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeTx {
    pub account: Address,
    pub fee: Balance,
    pub is_staking: bool,
    pub commitment_key: CommitmentKey,
    pub nonce: u64,
}

impl StakeTx {
    pub fn hash(&self) -> Hash {
        ContentHasher::new(b"stake-tx")
            .fixed(&self.account)
            .u64(self.fee)
            .flag(self.is_staking)
            .fixed(&self.commitment_key)
            .u64(self.nonce)
            .finish()
    }
}

/// Moves `amount` from `from` to `to`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundsTx {
    pub from: Address,
    pub to: Address,
    pub amount: Balance,
    pub fee: Balance,
    pub nonce: u64,
}

impl FundsTx {
    pub fn hash(&self) -> Hash {
        ContentHasher::new(b"funds-tx")
            .fixed(&self.from)
            .fixed(&self.to)
            .u64(self.amount)
            .u64(self.fee)
            .u64(self.nonce)
            .finish()
    }
}

/// Arbitrary payload; only the fee touches balances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTx {
    pub from: Address,
    pub to: Address,
    pub fee: Balance,
    pub data: Vec<u8>,
    pub nonce: u64,
}

impl DataTx {
    pub fn hash(&self) -> Hash {
        ContentHasher::new(b"data-tx")
            .fixed(&self.from)
            .fixed(&self.to)
            .u64(self.fee)
            .bytes(&self.data)
            .u64(self.nonce)
            .finish()
    }
}

/// Transaction kind tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TxKind {
    Acc,
    Stake,
    Funds,
    Data,
}

/// Closed union over every transaction the ledger understands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transaction {
    Acc(AccTx),
    Stake(StakeTx),
    Funds(FundsTx),
    Data(DataTx),
}

impl Transaction {
    pub fn hash(&self) -> Hash {
        match self {
            Self::Acc(tx) => tx.hash(),
            Self::Stake(tx) => tx.hash(),
            Self::Funds(tx) => tx.hash(),
            Self::Data(tx) => tx.hash(),
        }
    }

    pub fn kind(&self) -> TxKind {
        match self {
            Self::Acc(_) => TxKind::Acc,
            Self::Stake(_) => TxKind::Stake,
            Self::Funds(_) => TxKind::Funds,
            Self::Data(_) => TxKind::Data,
        }
    }

    pub fn fee(&self) -> Balance {
        match self {
            Self::Acc(tx) => tx.fee,
            Self::Stake(tx) => tx.fee,
            Self::Funds(tx) => tx.fee,
            Self::Data(tx) => tx.fee,
        }
    }

    /// Account the transaction is attributed to for routing.
    pub fn sender(&self) -> Address {
        match self {
            Self::Acc(tx) => tx.issuer,
            Self::Stake(tx) => tx.account,
            Self::Funds(tx) => tx.from,
            Self::Data(tx) => tx.from,
        }
    }

    /// Total the ledger takes from [`sender`](Self::sender). Account
    /// creation mints its fee and takes nothing.
    pub fn debit(&self) -> Balance {
        match self {
            Self::Acc(_) => 0,
            Self::Stake(tx) => tx.fee,
            Self::Funds(tx) => tx.amount.saturating_add(tx.fee),
            Self::Data(tx) => tx.fee,
        }
    }
}

impl From<AccTx> for Transaction {
    fn from(tx: AccTx) -> Self {
        Self::Acc(tx)
    }
}

impl From<StakeTx> for Transaction {
    fn from(tx: StakeTx) -> Self {
        Self::Stake(tx)
    }
}

impl From<FundsTx> for Transaction {
    fn from(tx: FundsTx) -> Self {
        Self::Funds(tx)
    }
}

impl From<DataTx> for Transaction {
    fn from(tx: DataTx) -> Self {
        Self::Data(tx)
    }
}

/// Transactions partitioned by kind, preserving order inside each kind.
///
/// The ledger applies the partitions in the fixed order
/// acc, stake, funds, data.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxBatch {
    pub acc: Vec<AccTx>,
    pub stake: Vec<StakeTx>,
    pub funds: Vec<FundsTx>,
    pub data: Vec<DataTx>,
}

impl TxBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tx: Transaction) {
        match tx {
            Transaction::Acc(tx) => self.acc.push(tx),
            Transaction::Stake(tx) => self.stake.push(tx),
            Transaction::Funds(tx) => self.funds.push(tx),
            Transaction::Data(tx) => self.data.push(tx),
        }
    }

    pub fn len(&self) -> usize {
        self.acc.len() + self.stake.len() + self.funds.len() + self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Transactions in application order.
    pub fn iter(&self) -> impl Iterator<Item = Transaction> + '_ {
        self.acc
            .iter()
            .cloned()
            .map(Transaction::Acc)
            .chain(self.stake.iter().cloned().map(Transaction::Stake))
            .chain(self.funds.iter().cloned().map(Transaction::Funds))
            .chain(self.data.iter().cloned().map(Transaction::Data))
    }

    /// Hashes in application order.
    pub fn hashes(&self) -> Vec<Hash> {
        self.acc
            .iter()
            .map(AccTx::hash)
            .chain(self.stake.iter().map(StakeTx::hash))
            .chain(self.funds.iter().map(FundsTx::hash))
            .chain(self.data.iter().map(DataTx::hash))
            .collect()
    }

    /// Remove every transaction whose hash is in `hashes`.
    pub fn remove_hashes(&mut self, hashes: &[Hash]) {
        self.acc.retain(|tx| !hashes.contains(&tx.hash()));
        self.stake.retain(|tx| !hashes.contains(&tx.hash()));
        self.funds.retain(|tx| !hashes.contains(&tx.hash()));
        self.data.retain(|tx| !hashes.contains(&tx.hash()));
    }
}

impl FromIterator<Transaction> for TxBatch {
    fn from_iter<I: IntoIterator<Item = Transaction>>(iter: I) -> Self {
        let mut batch = Self::new();
        for tx in iter {
            batch.push(tx);
        }
        batch
    }
}

/// Per-sender spending allowance for one epoch.
///
/// Starts from the epoch-state balance and only ever shrinks; credits
/// received during the epoch are not counted. Debits charged against one
/// budget never exceed the epoch balance, whichever shards apply them.
#[derive(Clone, Debug)]
pub struct SpendingBudget<'a> {
    state: &'a GlobalState,
    spent: BTreeMap<Address, Balance>,
}

impl<'a> SpendingBudget<'a> {
    pub fn new(state: &'a GlobalState) -> Self {
        Self {
            state,
            spent: BTreeMap::new(),
        }
    }

    /// What `address` may still spend this epoch.
    pub fn remaining(&self, address: &Address) -> Balance {
        let balance = self.state.get(address).map_or(0, |account| account.balance);
        let spent = self.spent.get(address).copied().unwrap_or(0);
        balance.saturating_sub(spent)
    }

    /// Charge `tx` if its sender can cover it; leaves the budget untouched
    /// otherwise.
    pub fn try_charge(&mut self, tx: &Transaction) -> bool {
        let debit = tx.debit();
        if debit == 0 {
            return true;
        }
        let sender = tx.sender();
        if debit > self.remaining(&sender) {
            return false;
        }
        *self.spent.entry(sender).or_insert(0) += debit;
        true
    }

    /// Charge every transaction of `batch`, or none of them.
    ///
    /// Returns the sender of the first transaction that does not fit.
    pub fn try_charge_batch(&mut self, batch: &TxBatch) -> Result<(), Address> {
        let mut scratch = self.clone();
        for tx in batch.iter() {
            if !scratch.try_charge(&tx) {
                return Err(tx.sender());
            }
        }
        self.spent = scratch.spent;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funds(from: u8, nonce: u64) -> FundsTx {
        FundsTx {
            from: [from; 32],
            to: [9; 32],
            amount: 10,
            fee: 1,
            nonce,
        }
    }

    #[test]
    fn test_batch_partitions_preserve_order() {
        let batch: TxBatch = vec![
            Transaction::Funds(funds(1, 1)),
            Transaction::Acc(AccTx {
                issuer: [1; 32],
                fee: 2,
                pub_key: [5; 32],
            }),
            Transaction::Funds(funds(1, 2)),
        ]
        .into_iter()
        .collect();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.acc.len(), 1);
        assert_eq!(batch.funds[0].nonce, 1);
        assert_eq!(batch.funds[1].nonce, 2);

        // Application order puts account creation first.
        let kinds: Vec<TxKind> = batch.iter().map(|tx| tx.kind()).collect();
        assert_eq!(kinds, vec![TxKind::Acc, TxKind::Funds, TxKind::Funds]);
    }

    #[test]
    fn test_hash_distinguishes_nonce() {
        assert_ne!(funds(1, 1).hash(), funds(1, 2).hash());
    }

    #[test]
    fn test_remove_hashes() {
        let mut batch: TxBatch = vec![funds(1, 1).into(), funds(1, 2).into()]
            .into_iter()
            .collect();
        batch.remove_hashes(&[funds(1, 1).hash()]);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.funds[0].nonce, 2);
    }

    #[test]
    fn test_acc_tx_address_derives_from_key() {
        let tx = AccTx {
            issuer: [1; 32],
            fee: 0,
            pub_key: [7; 32],
        };
        assert_eq!(tx.new_account_address(), address_from_pub_key(&[7; 32]));
    }

    #[test]
    fn test_sender_per_kind() {
        let data = Transaction::Data(DataTx {
            from: [3; 32],
            to: [4; 32],
            fee: 1,
            data: b"hello".to_vec(),
            nonce: 0,
        });
        assert_eq!(data.sender(), [3; 32]);
        assert_eq!(data.fee(), 1);
    }

    #[test]
    fn test_debit_per_kind() {
        let acc = Transaction::Acc(AccTx {
            issuer: [1; 32],
            fee: 5,
            pub_key: [7; 32],
        });
        let stake = Transaction::Stake(StakeTx {
            account: [1; 32],
            fee: 4,
            is_staking: true,
            commitment_key: [2; 32],
            nonce: 0,
        });
        assert_eq!(acc.debit(), 0);
        assert_eq!(stake.debit(), 4);
        assert_eq!(Transaction::Funds(funds(1, 0)).debit(), 11);
    }

    #[test]
    fn test_budget_spans_kinds_and_never_overdraws() {
        let state: GlobalState = [([1; 32], crate::Account::new([1; 32], 20))]
            .into_iter()
            .collect();
        let mut budget = SpendingBudget::new(&state);

        let stake = Transaction::Stake(StakeTx {
            account: [1; 32],
            fee: 8,
            is_staking: true,
            commitment_key: [2; 32],
            nonce: 0,
        });
        assert!(budget.try_charge(&stake));
        assert!(budget.try_charge(&funds(1, 0).into()));
        assert_eq!(budget.remaining(&[1; 32]), 1);

        // 11 more does not fit and charges nothing.
        assert!(!budget.try_charge(&funds(1, 1).into()));
        assert_eq!(budget.remaining(&[1; 32]), 1);

        // Unknown senders have nothing to spend.
        assert!(!budget.try_charge(&funds(6, 0).into()));
    }

    #[test]
    fn test_budget_batch_is_all_or_nothing() {
        let state: GlobalState = [([1; 32], crate::Account::new([1; 32], 15))]
            .into_iter()
            .collect();
        let mut budget = SpendingBudget::new(&state);
        let batch: TxBatch = vec![funds(1, 0).into(), funds(1, 1).into()]
            .into_iter()
            .collect();

        assert_eq!(budget.try_charge_batch(&batch), Err([1; 32]));
        assert_eq!(budget.remaining(&[1; 32]), 15);
    }
}
