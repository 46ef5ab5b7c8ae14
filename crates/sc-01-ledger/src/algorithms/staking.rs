//! # Staking Effects
//!
//! Fee functions never touch staking flags. When the committee assembles
//! the epoch state it applies the staking requests of the closed epoch here.

use crate::domain::{LedgerError, LedgerParams};
use shared_types::{Address, GlobalState, StakeTx};
use tracing::debug;

/// Apply staking requests in order.
///
/// Returns the accounts that became staking, in the order they joined.
/// Requests from accounts below the staking minimum are ignored.
pub fn apply_stake_effects(
    state: &mut GlobalState,
    stake_txs: &[StakeTx],
    params: &LedgerParams,
) -> Result<Vec<Address>, LedgerError> {
    let mut newly_staking = Vec::new();

    for tx in stake_txs {
        let account = state
            .get_mut(&tx.account)
            .ok_or(LedgerError::UnknownAccount(tx.account))?;

        if !tx.is_staking {
            account.is_staking = false;
            newly_staking.retain(|address| *address != tx.account);
            continue;
        }

        if account.balance < params.staking_minimum {
            debug!(
                balance = account.balance,
                minimum = params.staking_minimum,
                "[sc-01] Ignoring stake request below minimum"
            );
            continue;
        }

        let joined = !account.is_staking;
        account.is_staking = true;
        account.commitment_key = tx.commitment_key;
        if joined && !newly_staking.contains(&tx.account) {
            newly_staking.push(tx.account);
        }
    }

    Ok(newly_staking)
}

/// Staking accounts in address order.
pub fn staking_validators(state: &GlobalState) -> Vec<Address> {
    state
        .values()
        .filter(|account| account.is_staking)
        .map(|account| account.address)
        .collect()
}
