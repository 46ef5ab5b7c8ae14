//! # sc-03-consensus
//!
//! Shard mining, committee validation and reconciliation for Shard-Chain.
//!
//! ## Architecture
//!
//! Time is cut into epochs of `epoch_length` heights. Every shard mines one
//! block per height. At the end of the epoch the proposer of shard 1 (the
//! committee) validates every shard's blocks and produces the next epoch
//! block, which carries the new global state and validator mapping.
//!
//! ```text
//!  epoch block E ──→ heights E+1 ..= E+L (all shards) ──→ committee round ──→ epoch block E+L+1
//!                          │                                    ↑
//!                          └── state transitions ──→ reconcile ─┘
//! ```
//!
//! Shards never see each other's transactions. Each non-committee shard
//! signs the balance effects of its blocks (a state transition); peers merge
//! them and the committee recomputes them to catch a shard that lies.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sc_03_consensus::{engine_channels, NodeContext, ShardEngine};
//!
//! let (senders, inbox) = engine_channels(1024);
//! let engine = ShardEngine::new(ctx, genesis, inbox)?;
//! tokio::spawn(engine.run());
//! ```

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::InMemoryStore;
pub use domain::{
    ChainState, ConsensusConfig, ConsensusError, ConsensusResult, EpochBlockError, EpochReport,
    Role, RoundError, RoundOutcome, SlashingProof, SlashingRegistry, StoreError, TransportError,
};
pub use ports::{
    BlockFinalizer, CommitmentCrypto, CommitmentSigner, EventPublisher, ProofOfStake,
    StakeContext, StakeProofInput, Store, SystemTimeSource, TimeSource, Transport,
};
pub use service::{
    engine_channels, inbound_channels, spawn_listeners, EngineInbox, EngineSenders,
    InboundReceivers, InboundRequest, InboundSenders, NodeContext, RequestResponder,
    ShardEngine,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
