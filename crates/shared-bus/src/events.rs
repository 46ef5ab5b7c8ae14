//! # Node Events
//!
//! Notifications the consensus core emits for observers (telemetry, tests,
//! operators). Events never drive consensus; they only report it.

use serde::{Deserialize, Serialize};
use shared_types::{Hash, Height, ShardId};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeEvent {
    /// This node mined and locally validated a shard block.
    BlockAccepted {
        height: Height,
        shard_id: ShardId,
        hash: Hash,
        tx_count: usize,
    },

    /// The committee issued a transaction assignment for a shard.
    AssignmentIssued {
        epoch_height: Height,
        shard_id: ShardId,
        tx_count: usize,
    },

    /// A new epoch block was adopted.
    EpochAdvanced {
        height: Height,
        num_shards: ShardId,
        /// Shard this node serves in the new epoch, if any.
        shard_id: Option<ShardId>,
    },

    /// A shard's claimed relative state disagreed with the committee's.
    CheatDetected {
        height: Height,
        shard_id: ShardId,
        mismatched_accounts: usize,
    },

    /// A committee round was abandoned.
    RoundAborted { epoch_height: Height, reason: String },
}

impl NodeEvent {
    /// Get the topic for this event.
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::BlockAccepted { .. } => EventTopic::Mining,
            Self::AssignmentIssued { .. } => EventTopic::Routing,
            Self::EpochAdvanced { .. } => EventTopic::Epoch,
            Self::CheatDetected { .. } | Self::RoundAborted { .. } => EventTopic::Committee,
        }
    }
}

/// Event topics for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    Mining,
    Routing,
    Epoch,
    Committee,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &NodeEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
