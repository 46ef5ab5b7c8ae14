//! # Node Configuration
//!
//! Unified configuration for the local network, consensus, genesis, stake
//! search and telemetry.
//!
//! ## Sources (later wins)
//!
//! 1. Built-in defaults
//! 2. TOML file named by `SC_CONFIG`
//! 3. `SC_*` environment variables

use crate::genesis::GenesisConfig;
use sc_03_consensus::ConsensusConfig;
use sc_telemetry::TelemetryConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for {name}")]
    InvalidVar { name: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub network: NetworkConfig,
    pub consensus: ConsensusConfig,
    pub genesis: GenesisConfig,
    pub mining: MiningConfig,
    pub telemetry: TelemetrySettings,
}

/// Local network configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Nodes in the local cluster, each one a validator.
    pub nodes: usize,
    /// Capacity of every inbound and engine channel.
    pub channel_capacity: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            nodes: 4,
            channel_capacity: 1024,
        }
    }
}

/// Stake search configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Timestamps tried per block before the finalizer gives up.
    pub max_stake_attempts: u64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            max_stake_attempts: 1_000_000,
        }
    }
}

/// File-level telemetry settings; the environment still wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    pub service_name: Option<String>,
    pub log_level: Option<String>,
    pub json_logs: Option<bool>,
    pub network: Option<String>,
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { name, value }),
    }
}

impl NodeConfig {
    /// Load from `SC_CONFIG` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|name| std::env::var(name).ok())
    }

    /// Same as [`NodeConfig::load`] over an arbitrary variable source.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup("SC_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply `SC_*` variables on top of the current values.
    pub fn apply_overrides(
        &mut self,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(nodes) = parse_var(lookup, "SC_NODES")? {
            self.network.nodes = nodes;
        }
        if let Some(capacity) = parse_var(lookup, "SC_CHANNEL_CAPACITY")? {
            self.network.channel_capacity = capacity;
        }
        if let Some(length) = parse_var(lookup, "SC_EPOCH_LENGTH")? {
            self.consensus.epoch_length = length;
        }
        if let Some(per_shard) = parse_var(lookup, "SC_VALIDATORS_PER_SHARD")? {
            self.consensus.validators_per_shard = per_shard;
        }
        if let Some(difficulty) = parse_var(lookup, "SC_DIFFICULTY")? {
            self.consensus.difficulty = difficulty;
        }
        if let Some(max_txs) = parse_var(lookup, "SC_MAX_TXS_PER_BLOCK")? {
            self.consensus.max_txs_per_block = max_txs;
        }
        if let Some(seed) = parse_var(lookup, "SC_RNG_SEED")? {
            self.consensus.rng_seed = Some(seed);
        }
        if let Some(minimum) = parse_var(lookup, "SC_STAKING_MINIMUM")? {
            self.consensus.ledger.staking_minimum = minimum;
        }
        if let Some(balance) = parse_var(lookup, "SC_VALIDATOR_BALANCE")? {
            self.genesis.validator_balance = balance;
        }
        if let Some(seed) = parse_var(lookup, "SC_GENESIS_SEED")? {
            self.genesis.shuffle_seed = seed;
        }
        if let Some(attempts) = parse_var(lookup, "SC_MAX_STAKE_ATTEMPTS")? {
            self.mining.max_stake_attempts = attempts;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.nodes == 0 {
            return Err(ConfigError::Invalid("network.nodes must be at least 1".into()));
        }
        if self.network.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "network.channel_capacity must be at least 1".into(),
            ));
        }
        if self.mining.max_stake_attempts == 0 {
            return Err(ConfigError::Invalid(
                "mining.max_stake_attempts must be at least 1".into(),
            ));
        }
        if self.genesis.validator_balance < self.consensus.ledger.staking_minimum {
            return Err(ConfigError::Invalid(format!(
                "genesis.validator_balance {} is below the staking minimum {}",
                self.genesis.validator_balance, self.consensus.ledger.staking_minimum
            )));
        }
        self.consensus.validate().map_err(ConfigError::Invalid)
    }

    /// Telemetry configuration: environment first, then this file's settings.
    pub fn telemetry_config(&self, lookup: impl Fn(&str) -> Option<String>) -> TelemetryConfig {
        let settings = &self.telemetry;
        TelemetryConfig::from_lookup(|name| {
            lookup(name).or_else(|| match name {
                "SC_SERVICE_NAME" => settings.service_name.clone(),
                "SC_LOG_LEVEL" => settings.log_level.clone(),
                "SC_JSON_LOGS" => settings.json_logs.map(|json| json.to_string()),
                "SC_NETWORK" => settings.network.clone(),
                _ => None,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = NodeConfig::default();
        assert_eq!(config.network.nodes, 4);
        assert_eq!(config.consensus.epoch_length, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = NodeConfig::from_toml(
            r#"
            [network]
            nodes = 6

            [consensus]
            epoch_length = 3
            validators_per_shard = 2

            [consensus.ledger]
            staking_minimum = 500

            [[genesis.accounts]]
            address = "0x0909090909090909090909090909090909090909090909090909090909090909"
            balance = 42
            "#,
        )
        .unwrap();

        assert_eq!(config.network.nodes, 6);
        assert_eq!(config.network.channel_capacity, 1024);
        assert_eq!(config.consensus.epoch_length, 3);
        assert_eq!(config.consensus.validators_per_shard, 2);
        assert_eq!(config.consensus.num_included_prev_proofs, 5);
        assert_eq!(config.consensus.ledger.staking_minimum, 500);
        assert_eq!(config.genesis.accounts.len(), 1);
        assert_eq!(config.genesis.accounts[0].balance, 42);
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = NodeConfig::from_toml("[network\nnodes = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let config = NodeConfig::load_from(vars(&[
            ("SC_NODES", "2"),
            ("SC_EPOCH_LENGTH", "5"),
            ("SC_RNG_SEED", "11"),
            ("SC_DIFFICULTY", "8"),
        ]))
        .unwrap();
        assert_eq!(config.network.nodes, 2);
        assert_eq!(config.consensus.epoch_length, 5);
        assert_eq!(config.consensus.rng_seed, Some(11));
        assert_eq!(config.consensus.difficulty, 8);
    }

    #[test]
    fn test_unparsable_override_is_rejected() {
        let err = NodeConfig::load_from(vars(&[("SC_NODES", "many")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidVar {
                name: "SC_NODES",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(NodeConfig::load_from(vars(&[("SC_NODES", "0")])).is_err());
        assert!(NodeConfig::load_from(vars(&[("SC_EPOCH_LENGTH", "0")])).is_err());
        assert!(NodeConfig::load_from(vars(&[("SC_VALIDATOR_BALANCE", "1")])).is_err());
    }

    #[test]
    fn test_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[network]\nnodes = 7\nchannel_capacity = 16").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config =
            NodeConfig::load_from(vars(&[("SC_CONFIG", path.as_str()), ("SC_NODES", "3")])).unwrap();
        assert_eq!(config.network.nodes, 3);
        assert_eq!(config.network.channel_capacity, 16);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err =
            NodeConfig::load_from(vars(&[("SC_CONFIG", "/nonexistent/shard-chain.toml")]))
                .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_telemetry_settings_yield_to_environment() {
        let config = NodeConfig {
            telemetry: TelemetrySettings {
                log_level: Some("debug".into()),
                json_logs: Some(true),
                ..TelemetrySettings::default()
            },
            ..NodeConfig::default()
        };

        let from_file = config.telemetry_config(vars(&[]));
        assert_eq!(from_file.log_level, "debug");
        assert!(from_file.json_logs);

        let from_env = config.telemetry_config(vars(&[("SC_LOG_LEVEL", "warn")]));
        assert_eq!(from_env.log_level, "warn");
    }
}
