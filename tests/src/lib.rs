//! # Shard-Chain Test Suite
//!
//! Multi-node scenarios that run whole clusters on the in-process network.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── epoch_round.rs       # Transfers across shards reach the epoch state
//!     ├── cheat_detection.rs   # Committee rejects forged state transitions
//!     └── single_shard.rs      # One validator runs the whole protocol
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sc-tests
//! cargo test -p sc-tests integration::cheat_detection
//!
//! # Benchmarks
//! cargo bench -p sc-tests
//! ```

pub mod integration;
