//! # Genesis Module
//!
//! The genesis epoch block has special properties:
//!
//! - Height: 0, no previous shard hashes
//! - State: the root validator (balance = staking minimum), the remaining
//!   validators, and any configured funded accounts
//! - Mapping: the initial validator shuffle, seeded from the configuration
//!   so every node of a network derives the same block

pub mod builder;

pub use builder::{
    devnet_seed, GenesisAccount, GenesisBuilder, GenesisConfig, GenesisError, GenesisValidator,
};
