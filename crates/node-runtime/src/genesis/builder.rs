//! # Genesis Epoch Block Builder
//!
//! Builds the epoch block every node starts from.

use rand::rngs::StdRng;
use rand::SeedableRng;
use sc_01_ledger::LedgerParams;
use sc_02_sharding::{assign_validators_to_shards, ShardError};
use serde::Deserialize;
use shared_types::{
    keccak256, short_hex, Account, Address, Balance, CommitmentKey, EpochBlock, GlobalState,
};
use thiserror::Error;
use tracing::info;

/// Genesis block creation errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("Genesis needs at least one validator")]
    NoValidators,

    #[error("Validator balance {balance} is below the staking minimum {minimum}")]
    BelowStakingMinimum { balance: Balance, minimum: Balance },

    #[error("Balance {balance} of {account} exceeds max supply {max_supply}")]
    ExceedsMaxSupply {
        account: String,
        balance: Balance,
        max_supply: Balance,
    },

    #[error("Invalid account address {0:?}: expected 32 hex-encoded bytes")]
    InvalidAddress(String),

    #[error("Account {0} appears twice in genesis")]
    DuplicateAccount(String),

    #[error("Initial shard assignment failed: {0}")]
    Sharding(#[from] ShardError),
}

/// A funded, non-staking account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenesisAccount {
    /// Hex address, optionally `0x`-prefixed.
    pub address: String,
    pub balance: Balance,
}

impl GenesisAccount {
    pub fn parse_address(&self) -> Result<Address, GenesisError> {
        let invalid = || GenesisError::InvalidAddress(self.address.clone());
        let raw = self.address.strip_prefix("0x").unwrap_or(&self.address);
        let bytes = hex::decode(raw).map_err(|_| invalid())?;
        bytes.try_into().map_err(|_| invalid())
    }
}

/// Genesis parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    /// Starting balance of every validator except the root.
    pub validator_balance: Balance,
    pub accounts: Vec<GenesisAccount>,
    pub timestamp: u64,
    /// Seed of the initial validator shuffle.
    pub shuffle_seed: u64,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            validator_balance: 5_000,
            accounts: Vec::new(),
            timestamp: 0,
            shuffle_seed: 0,
        }
    }
}

/// A staking account present from the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenesisValidator {
    pub address: Address,
    pub commitment_key: CommitmentKey,
}

/// Deterministic key seed for local validator `index`.
pub fn devnet_seed(index: usize) -> [u8; 32] {
    let mut material = b"shard-chain-devnet-validator".to_vec();
    material.extend_from_slice(&(index as u64).to_be_bytes());
    keccak256(&material)
}

/// Builder for the genesis epoch block.
///
/// The first validator added is the root account; it starts with exactly
/// the staking minimum.
pub struct GenesisBuilder {
    config: GenesisConfig,
    params: LedgerParams,
    validators_per_shard: usize,
    validators: Vec<GenesisValidator>,
}

impl GenesisBuilder {
    pub fn new(config: GenesisConfig, params: LedgerParams, validators_per_shard: usize) -> Self {
        Self {
            config,
            params,
            validators_per_shard,
            validators: Vec::new(),
        }
    }

    pub fn validator(mut self, address: Address, commitment_key: CommitmentKey) -> Self {
        self.validators.push(GenesisValidator {
            address,
            commitment_key,
        });
        self
    }

    pub fn build(self) -> Result<EpochBlock, GenesisError> {
        let root = *self.validators.first().ok_or(GenesisError::NoValidators)?;
        if self.config.validator_balance < self.params.staking_minimum {
            return Err(GenesisError::BelowStakingMinimum {
                balance: self.config.validator_balance,
                minimum: self.params.staking_minimum,
            });
        }

        let mut state = GlobalState::new();
        for (index, validator) in self.validators.iter().enumerate() {
            let balance = if index == 0 {
                self.params.staking_minimum
            } else {
                self.config.validator_balance
            };
            let account = Account::validator(validator.address, balance, validator.commitment_key);
            self.insert(&mut state, account)?;
        }
        for entry in &self.config.accounts {
            let account = Account::new(entry.parse_address()?, entry.balance);
            self.insert(&mut state, account)?;
        }

        let mut rng = StdRng::seed_from_u64(self.config.shuffle_seed);
        let mapping =
            assign_validators_to_shards(&state, self.validators_per_shard, None, 0, &mut rng)?;

        let genesis = EpochBlock {
            hash: [0u8; 32],
            height: 0,
            prev_shard_hashes: Vec::new(),
            num_shards: mapping.shard_count(),
            state,
            mapping,
            beneficiary: root.address,
            timestamp: self.config.timestamp,
        }
        .seal();

        info!(
            hash = %short_hex(&genesis.hash),
            validators = self.validators.len(),
            accounts = genesis.state.len(),
            num_shards = genesis.num_shards,
            "Genesis epoch block built"
        );
        Ok(genesis)
    }

    fn insert(&self, state: &mut GlobalState, account: Account) -> Result<(), GenesisError> {
        if account.balance > self.params.max_supply {
            return Err(GenesisError::ExceedsMaxSupply {
                account: short_hex(&account.address),
                balance: account.balance,
                max_supply: self.params.max_supply,
            });
        }
        if state.contains_key(&account.address) {
            return Err(GenesisError::DuplicateAccount(short_hex(&account.address)));
        }
        state.insert(account.address, account);
        Ok(())
    }
}
