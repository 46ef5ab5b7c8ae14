//! Consensus configuration.

use sc_01_ledger::LedgerParams;
use serde::Deserialize;
use std::time::Duration;

/// Tunables of the shard engine.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Shard-block heights per epoch.
    pub epoch_length: u64,
    pub validators_per_shard: usize,
    /// Ancestor commitment proofs fed to the stake predicate.
    pub num_included_prev_proofs: usize,
    pub difficulty: u32,
    pub max_txs_per_block: usize,
    pub block_request_timeout_ms: u64,
    pub transition_request_timeout_ms: u64,
    pub assignment_request_timeout_ms: u64,
    pub epoch_request_timeout_ms: u64,
    /// Pause before a committee round is retried.
    pub round_retry_delay_ms: u64,
    /// Seed for the validator shuffle; entropy when unset.
    pub rng_seed: Option<u64>,
    pub ledger: LedgerParams,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            epoch_length: 2,
            validators_per_shard: 1,
            num_included_prev_proofs: 5,
            difficulty: 4,
            max_txs_per_block: 100,
            block_request_timeout_ms: 2_000,
            transition_request_timeout_ms: 2_000,
            assignment_request_timeout_ms: 5_000,
            epoch_request_timeout_ms: 5_000,
            round_retry_delay_ms: 500,
            rng_seed: None,
            ledger: LedgerParams::default(),
        }
    }
}

impl ConsensusConfig {
    pub fn block_request_timeout(&self) -> Duration {
        Duration::from_millis(self.block_request_timeout_ms)
    }

    pub fn transition_request_timeout(&self) -> Duration {
        Duration::from_millis(self.transition_request_timeout_ms)
    }

    pub fn assignment_request_timeout(&self) -> Duration {
        Duration::from_millis(self.assignment_request_timeout_ms)
    }

    pub fn epoch_request_timeout(&self) -> Duration {
        Duration::from_millis(self.epoch_request_timeout_ms)
    }

    pub fn round_retry_delay(&self) -> Duration {
        Duration::from_millis(self.round_retry_delay_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.epoch_length == 0 {
            return Err("epoch_length must be at least 1".to_string());
        }
        if self.validators_per_shard == 0 {
            return Err("validators_per_shard must be at least 1".to_string());
        }
        if self.max_txs_per_block == 0 {
            return Err("max_txs_per_block must be at least 1".to_string());
        }
        if self.difficulty >= 64 {
            return Err(format!("difficulty {} out of range 0..64", self.difficulty));
        }
        self.ledger.validate()
    }
}
