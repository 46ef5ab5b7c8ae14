//! # Algorithms Module
//!
//! Shard count, sender routing and the per-epoch validator shuffle.

pub mod shard_assignment;
pub mod validator_assignment;

pub use shard_assignment::{shard_count, shard_for_sender};
pub use validator_assignment::assign_validators_to_shards;
