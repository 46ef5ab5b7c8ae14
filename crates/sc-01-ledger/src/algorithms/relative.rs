//! # Relative States
//!
//! Balance deltas between two versions of the global state, and the
//! comparison the committee uses to catch a shard lying about its block.

use crate::domain::{LedgerError, LedgerParams};
use shared_types::{Address, GlobalState, RelativeState, ShardId};
use std::collections::BTreeSet;

/// Deltas that turn `before` into `after`.
///
/// Only balances are tracked; accounts never disappear.
pub fn compute_relative_state(
    before: &GlobalState,
    after: &GlobalState,
    shard_id: ShardId,
) -> Result<RelativeState, LedgerError> {
    let mut relative = RelativeState::new(shard_id);

    for (address, account) in after {
        match before.get(address) {
            Some(previous) => {
                let delta = i128::from(account.balance) - i128::from(previous.balance);
                if delta != 0 {
                    let delta =
                        i64::try_from(delta).map_err(|_| LedgerError::DeltaOutOfRange(*address))?;
                    relative.deltas.insert(*address, delta);
                }
            }
            None => {
                relative.created.insert(*address, account.clone());
            }
        }
    }

    Ok(relative)
}

/// Apply `relative` to an owned copy of the state.
pub fn apply_relative_state(
    mut state: GlobalState,
    relative: &RelativeState,
    params: &LedgerParams,
) -> Result<GlobalState, LedgerError> {
    for (address, account) in &relative.created {
        if state.contains_key(address) {
            return Err(LedgerError::AccountExists(*address));
        }
        state.insert(*address, account.clone());
    }

    for (address, delta) in &relative.deltas {
        let account = state
            .get_mut(address)
            .ok_or(LedgerError::UnknownAccount(*address))?;
        let balance = account.balance;
        let updated = i128::from(balance) + i128::from(*delta);
        if updated < 0 {
            return Err(LedgerError::InsufficientFunds {
                address: *address,
                required: delta.unsigned_abs(),
                available: balance,
            });
        }
        if updated > i128::from(params.max_supply) {
            return Err(LedgerError::BalanceOverflow {
                address: *address,
                balance,
                amount: delta.unsigned_abs(),
                max_supply: params.max_supply,
            });
        }
        // 0 <= updated <= max_supply <= u64::MAX
        account.balance = updated as u64;
    }

    Ok(state)
}

/// One account whose claimed effect differs from the recomputed one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceMismatch {
    pub address: Address,
    pub computed: i64,
    pub claimed: i64,
}

fn effect(relative: &RelativeState, address: &Address) -> i64 {
    match relative.created.get(address) {
        Some(account) => i64::try_from(account.balance).unwrap_or(i64::MAX),
        None => relative.delta(address),
    }
}

/// Per-account comparison over the union of touched accounts.
///
/// An account absent from one side counts as a zero effect there.
pub fn diff_relative_states(
    computed: &RelativeState,
    claimed: &RelativeState,
) -> Vec<BalanceMismatch> {
    let touched: BTreeSet<&Address> = computed
        .deltas
        .keys()
        .chain(computed.created.keys())
        .chain(claimed.deltas.keys())
        .chain(claimed.created.keys())
        .collect();

    touched
        .into_iter()
        .filter_map(|address| {
            let computed = effect(computed, address);
            let claimed = effect(claimed, address);
            (computed != claimed).then_some(BalanceMismatch {
                address: *address,
                computed,
                claimed,
            })
        })
        .collect()
}
