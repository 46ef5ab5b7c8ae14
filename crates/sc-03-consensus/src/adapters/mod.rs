//! Adapters for the consensus subsystem.

mod memory_store;

pub use memory_store::InMemoryStore;
