//! # Error Types
//!
//! Errors shared across crates.

use thiserror::Error;

/// Wire codec failures. Structural: the message is dropped, never retried.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Payload could not be serialized.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Payload is not a valid encoding of the expected message.
    #[error("Decoding failed: {0}")]
    Decode(String),

    /// Payload exceeds the wire size limit.
    #[error("Message too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: u64 },
}
