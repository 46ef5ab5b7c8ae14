//! # Wire Messages
//!
//! Everything a node broadcasts, requests, or answers.

use crate::entities::{Block, EpochBlock, StateTransition, TransactionAssignment};
use crate::{Height, ShardId};
use serde::{Deserialize, Serialize};

/// A broadcast payload or a request response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkMessage {
    Block(Block),
    EpochBlock(EpochBlock),
    StateTransition(StateTransition),
    Assignment(TransactionAssignment),
}

impl NetworkMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Block(_) => MessageKind::Block,
            Self::EpochBlock(_) => MessageKind::EpochBlock,
            Self::StateTransition(_) => MessageKind::StateTransition,
            Self::Assignment(_) => MessageKind::Assignment,
        }
    }
}

/// Message kind; each kind has its own inbound channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MessageKind {
    Block,
    EpochBlock,
    StateTransition,
    Assignment,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::EpochBlock => "epoch_block",
            Self::StateTransition => "state_transition",
            Self::Assignment => "assignment",
        }
    }
}

/// Direct request for one item, keyed by height and shard.
///
/// `shard_id` is ignored for epoch-block requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub kind: MessageKind,
    pub height: Height,
    pub shard_id: ShardId,
}

impl Request {
    pub fn block(height: Height, shard_id: ShardId) -> Self {
        Self {
            kind: MessageKind::Block,
            height,
            shard_id,
        }
    }

    pub fn state_transition(height: Height, shard_id: ShardId) -> Self {
        Self {
            kind: MessageKind::StateTransition,
            height,
            shard_id,
        }
    }

    pub fn assignment(height: Height, shard_id: ShardId) -> Self {
        Self {
            kind: MessageKind::Assignment,
            height,
            shard_id,
        }
    }

    pub fn epoch_block(height: Height) -> Self {
        Self {
            kind: MessageKind::EpochBlock,
            height,
            shard_id: 0,
        }
    }

    /// Whether `response` is the item this request asked for.
    pub fn is_answered_by(&self, response: &NetworkMessage) -> bool {
        match (self.kind, response) {
            (MessageKind::Block, NetworkMessage::Block(b)) => {
                b.height == self.height && b.shard_id == self.shard_id
            }
            (MessageKind::StateTransition, NetworkMessage::StateTransition(t)) => {
                t.height == self.height && t.shard_id == self.shard_id
            }
            (MessageKind::Assignment, NetworkMessage::Assignment(a)) => {
                a.is_for(self.height, self.shard_id)
            }
            (MessageKind::EpochBlock, NetworkMessage::EpochBlock(e)) => e.height == self.height,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::TransactionAssignment;
    use crate::transactions::TxBatch;

    #[test]
    fn test_request_matches_only_requested_item() {
        let request = Request::assignment(4, 2);
        let right = NetworkMessage::Assignment(TransactionAssignment {
            height: 4,
            shard_id: 2,
            transactions: TxBatch::new(),
        });
        let stale = NetworkMessage::Assignment(TransactionAssignment {
            height: 3,
            shard_id: 2,
            transactions: TxBatch::new(),
        });
        assert!(request.is_answered_by(&right));
        assert!(!request.is_answered_by(&stale));
        assert!(!Request::block(4, 2).is_answered_by(&right));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(MessageKind::StateTransition.as_str(), "state_transition");
    }
}
