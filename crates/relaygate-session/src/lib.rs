#![warn(missing_docs)]

//! relaygate-session: room lifecycle and participant bookkeeping.
//!
//! The `SessionManager` drives a `RelayBackend` through connect, room
//! creation or join, data exchange and teardown, translating raw backend
//! events into the `SessionEvent` stream the transport facade consumes.

/// Session events and disconnect reasons.
pub mod event_types;
/// Session manager driving a relay backend.
pub mod manager;
/// Peer handles for remote participants.
pub mod peer;
/// Room join-code generation and validation.
pub mod room_code;

pub use event_types::{DisconnectReason, SessionEvent};
pub use manager::{SessionManager, SessionState};
pub use peer::RelayPeer;
pub use room_code::{generate_room_code, is_well_formed};
