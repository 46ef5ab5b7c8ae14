//! # Shared Bus - Node Event Notifications
//!
//! The notification boundary of the consensus core. The engine publishes
//! [`NodeEvent`]s ("block accepted", "epoch advanced", ...) and observers
//! subscribe with an [`EventFilter`].
//!
//! ```text
//! ┌──────────────┐   publish()   ┌──────────────┐  subscribe()  ┌───────────┐
//! │ Shard engine │ ────────────→ │  Event Bus   │ ────────────→ │ Telemetry │
//! └──────────────┘               └──────────────┘               └───────────┘
//! ```
//!
//! Publishing never blocks consensus: events without subscribers are dropped.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, NodeEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
