//! Error types and results.
//!
//! Only misuse of the local API surfaces as `Err`: relay-side outcomes
//! (failed room operations, lost connections) arrive as events during a
//! poll, and data addressed to unknown identities is dropped silently. The
//! one fatal condition, acquiring a connection slot from an exhausted pool,
//! panics because it can only mean the engine and relay capacities were
//! configured inconsistently.

use thiserror::Error;

/// Errors returned from the adapter's synchronous surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ErrorKind {
    /// An address string could not be split into host and port.
    #[error("malformed address '{address}'")]
    MalformedAddress {
        /// The address string as supplied by the caller.
        address: String,
    },
    /// A send payload exceeds the largest event the relay carries.
    #[error("payload of {size} bytes exceeds the maximum event size of {max} bytes")]
    PayloadTooLarge {
        /// Size of the rejected payload.
        size: usize,
        /// Largest accepted payload size.
        max: usize,
    },
    /// The backend rejected its connection settings.
    #[error("invalid relay configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience result alias used across the relaygate crates.
pub type Result<T> = std::result::Result<T, ErrorKind>;
