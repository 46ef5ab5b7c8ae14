//! Ports for the consensus subsystem.

mod outbound;

pub use outbound::*;
pub use shared_bus::EventPublisher;
