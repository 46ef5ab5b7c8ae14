//! # Domain Errors
//!
//! Error types for the ledger.

use shared_types::{short_hex, Address, Balance, Hash, TxKind};
use thiserror::Error;

/// Why a single balance mutation was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Referenced account does not exist.
    #[error("Unknown account {}", short_hex(.0))]
    UnknownAccount(Address),

    /// Sender cannot cover the debit.
    #[error("Insufficient funds at {}: required {required}, available {available}", short_hex(.address))]
    InsufficientFunds {
        address: Address,
        required: Balance,
        available: Balance,
    },

    /// Credit would push the balance above the maximum supply.
    #[error("Balance overflow at {}: {balance} + {amount} exceeds {max_supply}", short_hex(.address))]
    BalanceOverflow {
        address: Address,
        balance: Balance,
        amount: Balance,
        max_supply: Balance,
    },

    /// Account creation collides with an existing account.
    #[error("Account {} already exists", short_hex(.0))]
    AccountExists(Address),

    /// Balance change does not fit a signed 64-bit delta.
    #[error("Delta out of range at {}", short_hex(.0))]
    DeltaOutOfRange(Address),
}

/// A batch was rejected because one of its transactions failed.
///
/// The caller's state is untouched: batches run on an owned scratch copy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?} transaction {} rejected: {source}", short_hex(.tx_hash))]
pub struct BatchError {
    pub tx_hash: Hash,
    pub kind: TxKind,
    pub source: LedgerError,
}
