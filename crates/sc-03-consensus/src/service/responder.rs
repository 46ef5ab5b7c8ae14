//! Answers peers' direct requests from the local store.

use crate::ports::Store;
use shared_types::{encode, MessageKind, NetworkMessage, Request};
use std::sync::Arc;
use tracing::{debug, trace};

/// Looks up requested items in the store; never waits.
#[derive(Clone)]
pub struct RequestResponder {
    store: Arc<dyn Store>,
}

impl RequestResponder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn respond(&self, request: &Request) -> Option<NetworkMessage> {
        let Request {
            kind,
            height,
            shard_id,
        } = *request;
        let response = match kind {
            MessageKind::Block => self.store.block(height, shard_id).map(NetworkMessage::Block),
            MessageKind::StateTransition => self
                .store
                .own_transition(height)
                .filter(|own| own.shard_id == shard_id)
                .or_else(|| self.store.transition(height, shard_id))
                .map(NetworkMessage::StateTransition),
            MessageKind::Assignment => self
                .store
                .assignment(height, shard_id)
                .map(NetworkMessage::Assignment),
            MessageKind::EpochBlock => self
                .store
                .epoch_block(height)
                .map(NetworkMessage::EpochBlock),
        };
        trace!(
            kind = kind.as_str(),
            height,
            shard_id,
            found = response.is_some(),
            "[sc-03] Request answered"
        );
        response
    }

    /// Answer an encoded request with an encoded response.
    pub fn respond_bytes(&self, request: &Request) -> Option<Vec<u8>> {
        let response = self.respond(request)?;
        match encode(&response) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!(error = %e, "[sc-03] Failed to encode response");
                None
            }
        }
    }
}
