//! Domain layer for the consensus subsystem.
//!
//! - chain: the engine-owned view of the current epoch
//! - slashing: evidence of detected cheats

mod chain;
mod config;
mod error;
mod round;
mod slashing;

pub use chain::*;
pub use config::*;
pub use error::*;
pub use round::*;
pub use slashing::*;
