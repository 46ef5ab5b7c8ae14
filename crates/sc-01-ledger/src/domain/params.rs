//! Ledger parameters.

use serde::Deserialize;
use shared_types::Balance;

/// Largest representable supply: every balance fits a signed delta.
pub const MAX_SUPPLY: Balance = i64::MAX as Balance;

/// Starting balance of accounts created by an account-creation transaction.
pub const NEW_ACCOUNT_BALANCE: Balance = 100_000;

/// Minimum balance for a staking request to take effect.
pub const DEFAULT_STAKING_MINIMUM: Balance = 1_000;

/// Economic constants the fee functions run against.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerParams {
    pub max_supply: Balance,
    pub new_account_balance: Balance,
    pub staking_minimum: Balance,
}

impl Default for LedgerParams {
    fn default() -> Self {
        Self {
            max_supply: MAX_SUPPLY,
            new_account_balance: NEW_ACCOUNT_BALANCE,
            staking_minimum: DEFAULT_STAKING_MINIMUM,
        }
    }
}

impl LedgerParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_supply > MAX_SUPPLY {
            return Err(format!("max_supply {} exceeds {}", self.max_supply, MAX_SUPPLY));
        }
        if self.new_account_balance > self.max_supply {
            return Err("new_account_balance exceeds max_supply".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = LedgerParams::default();
        assert_eq!(params.new_account_balance, 100_000);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_supply_above_delta_range_is_rejected() {
        let params = LedgerParams {
            max_supply: u64::MAX,
            ..LedgerParams::default()
        };
        assert!(params.validate().is_err());
    }
}
