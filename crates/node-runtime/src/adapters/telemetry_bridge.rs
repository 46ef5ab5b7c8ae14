//! # Telemetry Bridge
//!
//! Turns [`NodeEvent`]s from a node's event bus into `sc-telemetry` metrics.
//! Consensus never touches these metrics directly; it only counts what is
//! never published as an event (see `sc_03_consensus::metrics`).

use sc_telemetry::{
    ASSIGNMENTS_ISSUED, BLOCKS_ACCEPTED, CHEATS_DETECTED, EPOCHS_ADVANCED, EPOCH_HEIGHT,
    ROUNDS_ABORTED, SHARD_COUNT, TRANSACTIONS_INCLUDED,
};
use shared_bus::{EventFilter, InMemoryEventBus, NodeEvent};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::debug;

/// Update the metrics for one event.
pub fn record_event(event: &NodeEvent) {
    match event {
        NodeEvent::BlockAccepted {
            shard_id, tx_count, ..
        } => {
            BLOCKS_ACCEPTED
                .with_label_values(&[&shard_id.to_string()])
                .inc();
            TRANSACTIONS_INCLUDED.inc_by(*tx_count as f64);
        }
        NodeEvent::AssignmentIssued { .. } => ASSIGNMENTS_ISSUED.inc(),
        NodeEvent::EpochAdvanced {
            height, num_shards, ..
        } => {
            EPOCHS_ADVANCED.inc();
            EPOCH_HEIGHT.set(*height as f64);
            SHARD_COUNT.set(f64::from(*num_shards));
        }
        NodeEvent::CheatDetected { shard_id, .. } => {
            CHEATS_DETECTED
                .with_label_values(&[&shard_id.to_string()])
                .inc();
        }
        NodeEvent::RoundAborted { .. } => ROUNDS_ABORTED.inc(),
    }
}

/// Feed every event published on `bus` into the metrics until the bus closes.
///
/// Events the bridge falls too far behind on are skipped by the stream.
pub fn spawn_telemetry_bridge(bus: &InMemoryEventBus) -> JoinHandle<()> {
    let events = bus.event_stream(EventFilter::all());
    tokio::spawn(async move {
        tokio::pin!(events);
        while let Some(event) = events.next().await {
            record_event(&event);
        }
        debug!("Event bus closed, telemetry bridge stopped");
    })
}
