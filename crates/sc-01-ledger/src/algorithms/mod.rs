//! # Ledger Algorithms
//!
//! - `fees` - the four fee/transfer operations and batch application
//! - `relative` - relative-state computation, application and comparison
//! - `staking` - staking flag updates at epoch boundaries

pub mod fees;
pub mod relative;
pub mod staking;

pub use fees::{
    apply_acc_tx, apply_acc_txs, apply_batch, apply_data_tx, apply_data_txs, apply_funds_tx,
    apply_funds_txs, apply_stake_tx, apply_stake_txs, apply_transaction, filter_applicable,
    FilterOutcome,
};
pub use relative::{
    apply_relative_state, compute_relative_state, diff_relative_states, BalanceMismatch,
};
pub use staking::{apply_stake_effects, staking_validators};
