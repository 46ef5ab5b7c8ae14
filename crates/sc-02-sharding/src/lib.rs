//! # SC-02 Sharding
//!
//! Validator-to-shard assignment and transaction routing.
//!
//! **Subsystem ID:** 02  
//! **Architecture:** Pure domain + algorithms
//!
//! ## Purpose
//!
//! - Shard count per epoch: `ceil(validators / validators_per_shard)`
//! - Random round-robin validator shuffle with a committee fairness rule
//! - Routing of open transactions into per-shard assignments
//!
//! ## Module Structure
//!
//! ```text
//! sc-02-sharding/
//! ├── domain/          # ShardError, mapping invariants
//! ├── algorithms/      # shard count, sender routing, validator shuffle
//! └── routing/         # TransactionRouter
//! ```

#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;
pub mod routing;

// Re-exports
pub use algorithms::{assign_validators_to_shards, shard_count, shard_for_sender};
pub use domain::{
    invariant_committee_populated, invariant_contiguous_shards, invariant_newcomer_in_committee,
    ShardError,
};
pub use routing::{is_current_assignment, route_transaction, TransactionRouter};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
