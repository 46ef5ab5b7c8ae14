//! # Domain Module
//!
//! Errors and mapping invariants for the sharding subsystem.

pub mod errors;
pub mod invariants;

pub use errors::*;
pub use invariants::*;
