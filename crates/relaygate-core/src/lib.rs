#![warn(missing_docs)]

//! relaygate-core: foundational types shared across the adapter layers.
//!
//! This crate provides the minimal vocabulary the session and transport
//! layers build on:
//! - Configuration for the relay connection
//! - Error handling
//! - Reserved event codes and size constants
//! - Leased buffer pooling
//! - Logical peer endpoints and address parsing
//! - The `RelayBackend` trait describing what a relay SDK must offer
//!
//! Session bookkeeping lives in `relaygate-session`; the engine-facing
//! facade lives in `relaygate-transport`.

/// Reserved event codes and size constants shared across layers.
pub mod constants {
    /// Relay event code carrying an engine payload between participants.
    ///
    /// Codes 1 and 10 are claimed by this transport; layers above it must
    /// pick codes that do not collide with them.
    pub const EVENT_CODE_MESSAGE: u8 = 1;
    /// Relay event code instructing the receiving participant to disconnect itself.
    pub const EVENT_CODE_KICK_SELF: u8 = 10;
    /// Characters a room join code is drawn from.
    pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    /// Number of characters in a room join code.
    pub const ROOM_CODE_LENGTH: usize = 5;
    /// Maximum transmission unit reported for every relayed connection.
    ///
    /// The relay fragments larger events itself; the engine never sees a
    /// per-link MTU, so a fixed conservative value is reported instead.
    pub const DEFAULT_MTU: usize = 1200;
    /// Size of the facade's scratch receive buffer, matching the largest
    /// single event the relay delivers.
    pub const RECEIVE_BUFFER_SIZE: usize = 2048;
    /// Largest payload accepted by a send.
    pub const MAX_EVENT_PAYLOAD: usize = RECEIVE_BUFFER_SIZE;
}

/// The contract a concrete relay SDK fulfils, plus its event model.
pub mod backend;
/// Configuration options for the relay connection.
pub mod config;
/// Logical peer endpoints and address parsing.
pub mod endpoint;
/// Error types and results.
pub mod error;
/// Leased buffer pooling for zero-allocation send/receive paths.
pub mod slice_pool;
/// Identity and delivery-mode vocabulary.
pub mod types;

pub use backend::{BackendEvent, DisconnectCause, RelayBackend};
pub use config::RelayConfig;
pub use endpoint::EndPoint;
pub use error::{ErrorKind, Result};
pub use slice_pool::{PooledSlice, SlicePool};
pub use types::{DeliveryGuarantee, ParticipantId};
