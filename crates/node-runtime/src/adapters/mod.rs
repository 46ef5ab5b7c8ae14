//! # Adapter Implementations
//!
//! Concrete implementations of the consensus core's outbound ports, plus the
//! bridge from the event bus to the metrics registry.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    OUTER LAYER (Adapters)                    │
//! │  Ed25519Crypto, KeccakStakePredicate, StakeFinalizer,        │
//! │  LocalTransport, InMemoryStore (core), telemetry bridge      │
//! └──────────────────────────────────────────────────────────────┘
//!                        ↑ implements ↑
//! ┌──────────────────────────────────────────────────────────────┐
//! │          PORTS (sc-03-consensus::ports, shared-bus)          │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod crypto;
pub mod network;
pub mod stake;
pub mod telemetry_bridge;

pub use crypto::{Ed25519Crypto, Ed25519Signer};
pub use network::{LocalNetwork, LocalTransport, PeerId};
pub use stake::{KeccakStakePredicate, StakeFinalizer};
pub use telemetry_bridge::{record_event, spawn_telemetry_bridge};
