//! # SC-01 Ledger
//!
//! Deterministic account-state transitions.
//!
//! **Subsystem ID:** 01  
//! **Architecture:** Pure domain + algorithms, no I/O
//!
//! ## Purpose
//!
//! Every node in the network applies transactions through this crate, so the
//! same inputs always yield the same global state:
//! - Fee functions for the four transaction kinds
//! - Whole-batch application in the order acc, stake, funds, data
//! - Relative states: per-shard balance deltas merged by the committee
//! - Staking flag updates at epoch boundaries
//!
//! ## Module Structure
//!
//! ```text
//! sc-01-ledger/
//! ├── domain/          # LedgerError, BatchError, LedgerParams
//! └── algorithms/      # fees, relative states, staking effects
//! ```

#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;

// Re-exports
pub use algorithms::{
    apply_acc_tx, apply_acc_txs, apply_batch, apply_data_tx, apply_data_txs, apply_funds_tx,
    apply_funds_txs, apply_relative_state, apply_stake_effects, apply_stake_tx, apply_stake_txs,
    apply_transaction, compute_relative_state, diff_relative_states, filter_applicable,
    staking_validators, BalanceMismatch, FilterOutcome,
};
pub use domain::{
    BatchError, LedgerError, LedgerParams, DEFAULT_STAKING_MINIMUM, MAX_SUPPLY,
    NEW_ACCOUNT_BALANCE,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
