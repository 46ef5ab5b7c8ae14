//! # Fee and Transfer Application
//!
//! The four deterministic ledger operations. Each batch function takes an
//! owned scratch state and returns the mutated copy, or the first failure.
//!
//! Every partial mutation re-reads the account it touches, so a sender,
//! receiver and beneficiary that are the same account stay consistent.

use crate::domain::{BatchError, LedgerError, LedgerParams};
use shared_types::{
    AccTx, Account, Address, Balance, DataTx, FundsTx, GlobalState, Hash, StakeTx, Transaction,
    TxBatch, TxKind,
};
use tracing::trace;

fn debit(state: &mut GlobalState, address: &Address, amount: Balance) -> Result<(), LedgerError> {
    let account = state
        .get_mut(address)
        .ok_or(LedgerError::UnknownAccount(*address))?;
    let available = account.balance;
    account.balance = available
        .checked_sub(amount)
        .ok_or(LedgerError::InsufficientFunds {
            address: *address,
            required: amount,
            available,
        })?;
    Ok(())
}

fn credit(
    state: &mut GlobalState,
    address: &Address,
    amount: Balance,
    params: &LedgerParams,
) -> Result<(), LedgerError> {
    let account = state
        .get_mut(address)
        .ok_or(LedgerError::UnknownAccount(*address))?;
    let balance = account.balance;
    account.balance = balance
        .checked_add(amount)
        .filter(|updated| *updated <= params.max_supply)
        .ok_or(LedgerError::BalanceOverflow {
            address: *address,
            balance,
            amount,
            max_supply: params.max_supply,
        })?;
    Ok(())
}

/// Mint the fee to the beneficiary and create the requested account.
pub fn apply_acc_tx(
    state: &mut GlobalState,
    beneficiary: &Address,
    tx: &AccTx,
    params: &LedgerParams,
) -> Result<(), LedgerError> {
    let address = tx.new_account_address();
    if state.contains_key(&address) {
        return Err(LedgerError::AccountExists(address));
    }
    credit(state, beneficiary, tx.fee, params)?;
    state.insert(address, Account::new(address, params.new_account_balance));
    Ok(())
}

/// Move the fee from the staking account to the beneficiary.
pub fn apply_stake_tx(
    state: &mut GlobalState,
    beneficiary: &Address,
    tx: &StakeTx,
    params: &LedgerParams,
) -> Result<(), LedgerError> {
    debit(state, &tx.account, tx.fee)?;
    credit(state, beneficiary, tx.fee, params)
}

/// Move `amount` to the receiver, then the fee to the beneficiary.
pub fn apply_funds_tx(
    state: &mut GlobalState,
    beneficiary: &Address,
    tx: &FundsTx,
    params: &LedgerParams,
) -> Result<(), LedgerError> {
    debit(state, &tx.from, tx.amount)?;
    credit(state, &tx.to, tx.amount, params)?;
    debit(state, &tx.from, tx.fee)?;
    credit(state, beneficiary, tx.fee, params)
}

/// Move the fee from the sender to the beneficiary.
pub fn apply_data_tx(
    state: &mut GlobalState,
    beneficiary: &Address,
    tx: &DataTx,
    params: &LedgerParams,
) -> Result<(), LedgerError> {
    debit(state, &tx.from, tx.fee)?;
    credit(state, beneficiary, tx.fee, params)
}

/// Apply any transaction in place.
pub fn apply_transaction(
    state: &mut GlobalState,
    beneficiary: &Address,
    tx: &Transaction,
    params: &LedgerParams,
) -> Result<(), LedgerError> {
    match tx {
        Transaction::Acc(tx) => apply_acc_tx(state, beneficiary, tx, params),
        Transaction::Stake(tx) => apply_stake_tx(state, beneficiary, tx, params),
        Transaction::Funds(tx) => apply_funds_tx(state, beneficiary, tx, params),
        Transaction::Data(tx) => apply_data_tx(state, beneficiary, tx, params),
    }
}

fn apply_all<T>(
    mut state: GlobalState,
    beneficiary: &Address,
    txs: &[T],
    kind: TxKind,
    hash: fn(&T) -> Hash,
    apply: fn(&mut GlobalState, &Address, &T, &LedgerParams) -> Result<(), LedgerError>,
    params: &LedgerParams,
) -> Result<GlobalState, BatchError> {
    for tx in txs {
        apply(&mut state, beneficiary, tx, params).map_err(|source| BatchError {
            tx_hash: hash(tx),
            kind,
            source,
        })?;
    }
    Ok(state)
}

pub fn apply_acc_txs(
    state: GlobalState,
    beneficiary: &Address,
    txs: &[AccTx],
    params: &LedgerParams,
) -> Result<GlobalState, BatchError> {
    apply_all(state, beneficiary, txs, TxKind::Acc, AccTx::hash, apply_acc_tx, params)
}

pub fn apply_stake_txs(
    state: GlobalState,
    beneficiary: &Address,
    txs: &[StakeTx],
    params: &LedgerParams,
) -> Result<GlobalState, BatchError> {
    apply_all(state, beneficiary, txs, TxKind::Stake, StakeTx::hash, apply_stake_tx, params)
}

pub fn apply_funds_txs(
    state: GlobalState,
    beneficiary: &Address,
    txs: &[FundsTx],
    params: &LedgerParams,
) -> Result<GlobalState, BatchError> {
    apply_all(state, beneficiary, txs, TxKind::Funds, FundsTx::hash, apply_funds_tx, params)
}

pub fn apply_data_txs(
    state: GlobalState,
    beneficiary: &Address,
    txs: &[DataTx],
    params: &LedgerParams,
) -> Result<GlobalState, BatchError> {
    apply_all(state, beneficiary, txs, TxKind::Data, DataTx::hash, apply_data_tx, params)
}

/// Apply a whole batch in the order acc, stake, funds, data.
///
/// Any failure rejects the entire batch.
pub fn apply_batch(
    state: GlobalState,
    beneficiary: &Address,
    batch: &TxBatch,
    params: &LedgerParams,
) -> Result<GlobalState, BatchError> {
    let state = apply_acc_txs(state, beneficiary, &batch.acc, params)?;
    let state = apply_stake_txs(state, beneficiary, &batch.stake, params)?;
    let state = apply_funds_txs(state, beneficiary, &batch.funds, params)?;
    apply_data_txs(state, beneficiary, &batch.data, params)
}

/// Result of [`filter_applicable`].
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// Transactions that apply cleanly, in application order.
    pub accepted: TxBatch,
    /// Transactions that would fail, with the reason.
    pub rejected: Vec<(Hash, LedgerError)>,
    /// State after applying `accepted`.
    pub state: GlobalState,
}

/// Select at most `limit` candidates that apply cleanly one after another.
///
/// Candidates are tried in application order so that [`apply_batch`] over
/// the accepted set reproduces `FilterOutcome::state` exactly.
pub fn filter_applicable(
    state: &GlobalState,
    beneficiary: &Address,
    candidates: &TxBatch,
    limit: usize,
    params: &LedgerParams,
) -> FilterOutcome {
    let mut outcome = FilterOutcome {
        accepted: TxBatch::new(),
        rejected: Vec::new(),
        state: state.clone(),
    };

    for tx in candidates.iter() {
        if outcome.accepted.len() >= limit {
            break;
        }
        let mut trial = outcome.state.clone();
        match apply_transaction(&mut trial, beneficiary, &tx, params) {
            Ok(()) => {
                outcome.state = trial;
                outcome.accepted.push(tx);
            }
            Err(e) => {
                trace!(error = %e, "[sc-01] Dropping inapplicable transaction");
                outcome.rejected.push((tx.hash(), e));
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MAX_SUPPLY;

    const A: Address = [0xa; 32];
    const B: Address = [0xb; 32];
    const C: Address = [0xc; 32];

    fn state(accounts: &[(Address, Balance)]) -> GlobalState {
        accounts
            .iter()
            .map(|(address, balance)| (*address, Account::new(*address, *balance)))
            .collect()
    }

    fn balance(state: &GlobalState, address: &Address) -> Balance {
        state.get(address).map(|a| a.balance).unwrap_or_default()
    }

    fn funds(from: Address, to: Address, amount: Balance, fee: Balance) -> FundsTx {
        FundsTx {
            from,
            to,
            amount,
            fee,
            nonce: 0,
        }
    }

    #[test]
    fn test_funds_transfer_example() {
        let before = state(&[(A, 100), (B, 10), (C, 0)]);
        let after = apply_funds_txs(
            before,
            &C,
            &[funds(A, B, 30, 1)],
            &LedgerParams::default(),
        )
        .unwrap();

        assert_eq!(balance(&after, &A), 69);
        assert_eq!(balance(&after, &B), 40);
        assert_eq!(balance(&after, &C), 1);
    }

    #[test]
    fn test_account_creation_example() {
        let before = state(&[(A, 5), (C, 0)]);
        let tx = AccTx {
            issuer: A,
            fee: 3,
            pub_key: [0x77; 32],
        };
        let after = apply_acc_txs(before, &C, &[tx.clone()], &LedgerParams::default()).unwrap();

        let created = &after[&tx.new_account_address()];
        assert_eq!(created.balance, 100_000);
        assert!(!created.is_staking);
        assert_eq!(balance(&after, &C), 3);
        // The fee is minted, not taken from the issuer.
        assert_eq!(balance(&after, &A), 5);
    }

    #[test]
    fn test_beneficiary_at_max_supply_overflows() {
        let before = state(&[(A, 100), (C, MAX_SUPPLY)]);
        let tx = DataTx {
            from: A,
            to: B,
            fee: 1,
            data: vec![],
            nonce: 0,
        };
        let err = apply_data_txs(before, &C, &[tx], &LedgerParams::default()).unwrap_err();
        assert!(matches!(err.source, LedgerError::BalanceOverflow { .. }));
        assert_eq!(err.kind, TxKind::Data);
    }

    #[test]
    fn test_acc_tx_overflow_at_max_supply() {
        let before = state(&[(C, MAX_SUPPLY)]);
        let tx = AccTx {
            issuer: C,
            fee: 1,
            pub_key: [1; 32],
        };
        let err = apply_acc_txs(before, &C, &[tx], &LedgerParams::default()).unwrap_err();
        assert!(matches!(err.source, LedgerError::BalanceOverflow { .. }));
    }

    #[test]
    fn test_sender_is_beneficiary() {
        let before = state(&[(A, 100), (B, 0)]);
        let after =
            apply_funds_txs(before, &A, &[funds(A, B, 30, 5)], &LedgerParams::default()).unwrap();
        // The fee leaves and returns to the same account.
        assert_eq!(balance(&after, &A), 70);
        assert_eq!(balance(&after, &B), 30);
    }

    #[test]
    fn test_receiver_is_beneficiary() {
        let before = state(&[(A, 100), (B, 0)]);
        let after =
            apply_funds_txs(before, &B, &[funds(A, B, 30, 5)], &LedgerParams::default()).unwrap();
        assert_eq!(balance(&after, &A), 65);
        assert_eq!(balance(&after, &B), 35);
    }

    #[test]
    fn test_self_transfer() {
        let before = state(&[(A, 100), (C, 0)]);
        let after =
            apply_funds_txs(before, &C, &[funds(A, A, 60, 2)], &LedgerParams::default()).unwrap();
        assert_eq!(balance(&after, &A), 98);
        assert_eq!(balance(&after, &C), 2);
    }

    #[test]
    fn test_insufficient_funds_rejects_batch() {
        let before = state(&[(A, 10), (B, 0), (C, 0)]);
        let batch: TxBatch = vec![
            Transaction::Funds(funds(A, B, 5, 1)),
            Transaction::Funds(funds(A, B, 5, 1)),
        ]
        .into_iter()
        .collect();

        let err = apply_batch(before, &C, &batch, &LedgerParams::default()).unwrap_err();
        assert!(matches!(
            err.source,
            LedgerError::InsufficientFunds { available: 4, .. }
        ));
    }

    #[test]
    fn test_unknown_receiver() {
        let before = state(&[(A, 10), (C, 0)]);
        let err =
            apply_funds_txs(before, &C, &[funds(A, B, 1, 0)], &LedgerParams::default()).unwrap_err();
        assert_eq!(err.source, LedgerError::UnknownAccount(B));
    }

    #[test]
    fn test_duplicate_account_creation() {
        let tx = AccTx {
            issuer: A,
            fee: 0,
            pub_key: [9; 32],
        };
        let before = state(&[(C, 0)]);
        let err = apply_acc_txs(before, &C, &[tx.clone(), tx.clone()], &LedgerParams::default())
            .unwrap_err();
        assert_eq!(
            err.source,
            LedgerError::AccountExists(tx.new_account_address())
        );
    }

    #[test]
    fn test_stake_tx_moves_only_fee() {
        let before = state(&[(A, 50), (C, 0)]);
        let tx = StakeTx {
            account: A,
            fee: 4,
            is_staking: true,
            commitment_key: [1; 32],
            nonce: 0,
        };
        let after = apply_stake_txs(before, &C, &[tx], &LedgerParams::default()).unwrap();
        assert_eq!(balance(&after, &A), 46);
        assert_eq!(balance(&after, &C), 4);
        assert!(!after[&A].is_staking);
    }

    #[test]
    fn test_filter_drops_inapplicable_and_matches_batch() {
        let before = state(&[(A, 10), (B, 0), (C, 0)]);
        let candidates: TxBatch = vec![
            Transaction::Funds(funds(A, B, 6, 1)),
            Transaction::Funds(funds(A, B, 6, 1)),
            Transaction::Funds(funds(B, A, 2, 1)),
        ]
        .into_iter()
        .collect();

        let outcome = filter_applicable(&before, &C, &candidates, 10, &LedgerParams::default());
        assert_eq!(outcome.accepted.len(), 2);
        assert_eq!(outcome.rejected.len(), 1);

        let replayed =
            apply_batch(before, &C, &outcome.accepted, &LedgerParams::default()).unwrap();
        assert_eq!(replayed, outcome.state);
    }

    #[test]
    fn test_filter_respects_limit() {
        let before = state(&[(A, 100), (B, 0), (C, 0)]);
        let candidates: TxBatch = (0..5)
            .map(|nonce| {
                Transaction::Funds(FundsTx {
                    nonce,
                    ..funds(A, B, 1, 1)
                })
            })
            .collect();

        let outcome = filter_applicable(&before, &C, &candidates, 3, &LedgerParams::default());
        assert_eq!(outcome.accepted.len(), 3);
        assert!(outcome.rejected.is_empty());
    }
}
