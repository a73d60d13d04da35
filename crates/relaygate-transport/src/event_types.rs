//! Engine-facing contract: run modes and the event sink.
//!
//! The engine implements `EngineSink` and hands it to
//! `RelayTransport::poll_events` once per tick; every notification fires
//! synchronously during that call, on the calling thread.

use relaygate_core::DisconnectCause;
use relaygate_session::DisconnectReason;

use crate::connection::{Connection, ConnectionId};

/// Which role the transport is started in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Create and own a room; the authority side.
    Host,
    /// Join an existing room by code.
    Client,
}

/// Receiving side of the engine: connection lifecycle and byte delivery.
///
/// The three lifecycle methods are required; the remaining notifications
/// default to no-ops so an engine only overrides what it surfaces.
pub trait EngineSink {
    /// A connection slot was bound for a newly reachable participant.
    fn on_connected(&mut self, id: ConnectionId, connection: &Connection);

    /// A previously announced connection is gone. The slot is recycled
    /// right after this call returns.
    fn on_disconnected(&mut self, id: ConnectionId, reason: DisconnectReason);

    /// A payload arrived on a connection. The slice borrows the transport's
    /// scratch buffer and is only valid for the duration of this call;
    /// engines keeping the bytes must copy them.
    fn on_receive(&mut self, id: ConnectionId, payload: &[u8]);

    /// The room was entered; its join code can now be fetched and shown.
    fn on_room_code_available(&mut self) {}

    /// Creating the room failed; the session will not recover.
    fn on_room_create_failed(&mut self) {}

    /// The join code was rejected. No connection ever existed, so no
    /// `on_disconnected` follows.
    fn on_connect_failed(&mut self) {}

    /// The relay connection itself ended, after all per-connection
    /// `on_disconnected` notifications were delivered.
    fn on_relay_disconnected(&mut self, _cause: DisconnectCause) {}
}
