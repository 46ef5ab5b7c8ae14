//! # Domain Layer
//!
//! Ledger errors and parameters.

mod errors;
mod params;

pub use errors::{BatchError, LedgerError};
pub use params::{LedgerParams, DEFAULT_STAKING_MINIMUM, MAX_SUPPLY, NEW_ACCOUNT_BALANCE};
