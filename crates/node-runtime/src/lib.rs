//! # Shard-Chain Node Runtime Library
//!
//! Reference adapters, configuration, genesis and the in-process cluster
//! used by the node binary and the integration tests.
//!
//! ## Modular Structure
//!
//! - `adapters/` - Port implementations for the consensus core
//! - `config` - `NodeConfig` loading (TOML file + `SC_*` environment)
//! - `genesis/` - Genesis epoch block creation
//! - `cluster` - N nodes on one in-process network

pub mod adapters;
pub mod cluster;
pub mod config;
pub mod genesis;

pub use adapters::{
    record_event, spawn_telemetry_bridge, Ed25519Crypto, Ed25519Signer, KeccakStakePredicate,
    LocalNetwork, LocalTransport, PeerId, StakeFinalizer,
};
pub use cluster::{ClusterError, ClusterNode, LocalCluster, NodePorts};
pub use config::{ConfigError, MiningConfig, NetworkConfig, NodeConfig, TelemetrySettings};
pub use genesis::{
    devnet_seed, GenesisAccount, GenesisBuilder, GenesisConfig, GenesisError, GenesisValidator,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
