//! # Inbound Listeners
//!
//! One channel per message kind. Listener tasks decode and validate raw
//! payloads, drop anything malformed, stash blocks and transitions in the
//! store, and forward epoch blocks and assignments to the engine.

use super::responder::RequestResponder;
use crate::ports::Store;
use shared_types::{
    decode, Block, EpochBlock, MessageKind, NetworkMessage, Request, StateTransition,
    TransactionAssignment,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// A peer's direct request and the slot for the answer.
#[derive(Debug)]
pub struct InboundRequest {
    pub payload: Vec<u8>,
    pub reply: oneshot::Sender<Option<Vec<u8>>>,
}

/// Transport-facing ends of the inbound channels.
#[derive(Clone, Debug)]
pub struct InboundSenders {
    pub blocks: mpsc::Sender<Vec<u8>>,
    pub epoch_blocks: mpsc::Sender<Vec<u8>>,
    pub transitions: mpsc::Sender<Vec<u8>>,
    pub assignments: mpsc::Sender<Vec<u8>>,
    pub requests: mpsc::Sender<InboundRequest>,
}

impl InboundSenders {
    /// Queue a broadcast payload without waiting; false if it was dropped.
    pub fn try_deliver(&self, kind: MessageKind, payload: Vec<u8>) -> bool {
        let sender = match kind {
            MessageKind::Block => &self.blocks,
            MessageKind::EpochBlock => &self.epoch_blocks,
            MessageKind::StateTransition => &self.transitions,
            MessageKind::Assignment => &self.assignments,
        };
        sender.try_send(payload).is_ok()
    }
}

/// Listener-facing ends of the inbound channels.
#[derive(Debug)]
pub struct InboundReceivers {
    pub blocks: mpsc::Receiver<Vec<u8>>,
    pub epoch_blocks: mpsc::Receiver<Vec<u8>>,
    pub transitions: mpsc::Receiver<Vec<u8>>,
    pub assignments: mpsc::Receiver<Vec<u8>>,
    pub requests: mpsc::Receiver<InboundRequest>,
}

pub fn inbound_channels(capacity: usize) -> (InboundSenders, InboundReceivers) {
    let (blocks_tx, blocks_rx) = mpsc::channel(capacity);
    let (epoch_tx, epoch_rx) = mpsc::channel(capacity);
    let (transitions_tx, transitions_rx) = mpsc::channel(capacity);
    let (assignments_tx, assignments_rx) = mpsc::channel(capacity);
    let (requests_tx, requests_rx) = mpsc::channel(capacity);
    (
        InboundSenders {
            blocks: blocks_tx,
            epoch_blocks: epoch_tx,
            transitions: transitions_tx,
            assignments: assignments_tx,
            requests: requests_tx,
        },
        InboundReceivers {
            blocks: blocks_rx,
            epoch_blocks: epoch_rx,
            transitions: transitions_rx,
            assignments: assignments_rx,
            requests: requests_rx,
        },
    )
}

/// Typed messages the listeners hand to the engine.
#[derive(Clone, Debug)]
pub struct EngineSenders {
    pub epoch_blocks: mpsc::Sender<EpochBlock>,
    pub assignments: mpsc::Sender<TransactionAssignment>,
}

/// Engine end of the typed channels.
#[derive(Debug)]
pub struct EngineInbox {
    pub epoch_blocks: mpsc::Receiver<EpochBlock>,
    pub assignments: mpsc::Receiver<TransactionAssignment>,
}

pub fn engine_channels(capacity: usize) -> (EngineSenders, EngineInbox) {
    let (epoch_tx, epoch_rx) = mpsc::channel(capacity);
    let (assignments_tx, assignments_rx) = mpsc::channel(capacity);
    (
        EngineSenders {
            epoch_blocks: epoch_tx,
            assignments: assignments_tx,
        },
        EngineInbox {
            epoch_blocks: epoch_rx,
            assignments: assignments_rx,
        },
    )
}

fn decode_message(bytes: &[u8]) -> Option<NetworkMessage> {
    match decode::<NetworkMessage>(bytes) {
        Ok(message) => Some(message),
        Err(e) => {
            debug!(error = %e, len = bytes.len(), "[sc-03] Dropping undecodable message");
            None
        }
    }
}

/// A sealed shard block, or nothing.
pub fn decode_block(bytes: &[u8]) -> Option<Block> {
    match decode_message(bytes)? {
        NetworkMessage::Block(block) if block.is_sealed() => Some(block),
        other => {
            debug!(kind = other.kind().as_str(), "[sc-03] Dropping invalid block message");
            None
        }
    }
}

/// A sealed epoch block with a non-empty mapping, or nothing.
pub fn decode_epoch_block(bytes: &[u8]) -> Option<EpochBlock> {
    match decode_message(bytes)? {
        NetworkMessage::EpochBlock(epoch_block)
            if epoch_block.is_sealed() && !epoch_block.mapping.is_empty() =>
        {
            Some(epoch_block)
        }
        other => {
            debug!(
                kind = other.kind().as_str(),
                "[sc-03] Dropping invalid epoch block message"
            );
            None
        }
    }
}

/// A state transition whose relative state names the same shard, or nothing.
pub fn decode_transition(bytes: &[u8]) -> Option<StateTransition> {
    match decode_message(bytes)? {
        NetworkMessage::StateTransition(transition)
            if transition.relative_state.shard_id == transition.shard_id =>
        {
            Some(transition)
        }
        other => {
            debug!(
                kind = other.kind().as_str(),
                "[sc-03] Dropping invalid transition message"
            );
            None
        }
    }
}

pub fn decode_assignment(bytes: &[u8]) -> Option<TransactionAssignment> {
    match decode_message(bytes)? {
        NetworkMessage::Assignment(assignment) => Some(assignment),
        other => {
            debug!(
                kind = other.kind().as_str(),
                "[sc-03] Dropping invalid assignment message"
            );
            None
        }
    }
}

pub fn decode_request(bytes: &[u8]) -> Option<Request> {
    match decode::<Request>(bytes) {
        Ok(request) => Some(request),
        Err(e) => {
            debug!(error = %e, "[sc-03] Dropping undecodable request");
            None
        }
    }
}

/// Spawn one listener task per inbound channel.
pub fn spawn_listeners(
    store: Arc<dyn Store>,
    inbound: InboundReceivers,
    engine: EngineSenders,
) -> Vec<JoinHandle<()>> {
    let InboundReceivers {
        mut blocks,
        mut epoch_blocks,
        mut transitions,
        mut assignments,
        mut requests,
    } = inbound;
    let EngineSenders {
        epoch_blocks: epoch_out,
        assignments: assignments_out,
    } = engine;

    let block_store = store.clone();
    let block_listener = tokio::spawn(async move {
        while let Some(bytes) = blocks.recv().await {
            if let Some(block) = decode_block(&bytes) {
                let (height, shard_id) = (block.height, block.shard_id);
                let fresh = block_store.insert_block(block);
                trace!(height, shard_id, fresh, "[sc-03] Block stashed");
            }
        }
    });

    let transition_store = store.clone();
    let transition_listener = tokio::spawn(async move {
        while let Some(bytes) = transitions.recv().await {
            if let Some(transition) = decode_transition(&bytes) {
                let (height, shard_id) = (transition.height, transition.shard_id);
                let fresh = transition_store.insert_transition(transition);
                trace!(height, shard_id, fresh, "[sc-03] Transition stashed");
            }
        }
    });

    let epoch_listener = tokio::spawn(async move {
        while let Some(bytes) = epoch_blocks.recv().await {
            if let Some(epoch_block) = decode_epoch_block(&bytes) {
                if epoch_out.send(epoch_block).await.is_err() {
                    break;
                }
            }
        }
    });

    let assignment_listener = tokio::spawn(async move {
        while let Some(bytes) = assignments.recv().await {
            if let Some(assignment) = decode_assignment(&bytes) {
                if assignments_out.send(assignment).await.is_err() {
                    break;
                }
            }
        }
    });

    let responder = RequestResponder::new(store);
    let request_listener = tokio::spawn(async move {
        while let Some(InboundRequest { payload, reply }) = requests.recv().await {
            let response =
                decode_request(&payload).and_then(|request| responder.respond_bytes(&request));
            // Requester may have timed out already.
            let _ = reply.send(response);
        }
    });

    vec![
        block_listener,
        transition_listener,
        epoch_listener,
        assignment_listener,
        request_listener,
    ]
}
