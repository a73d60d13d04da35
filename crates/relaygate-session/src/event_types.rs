//! Session events and disconnect reasons.
//!
//! `SessionEvent` is what the session layer emits toward its consumer
//! (normally the transport facade). Events are pushed into a channel during
//! `poll_update` and drained non-blockingly afterwards, all on one thread.

use relaygate_core::{DisconnectCause, ParticipantId, PooledSlice};

use crate::peer::RelayPeer;

/// Why a peer stopped being connected, in engine-facing vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisconnectReason {
    /// No cause could be attributed (lost relay link, unresponsive peer).
    Timeout,
    /// The participant left the room.
    Left,
    /// The peer was removed through the kick flow.
    Kicked,
    /// The local side shut the session down.
    Shutdown,
}

/// Events emitted by the session manager and drained through `try_next_event`.
#[derive(Debug)]
pub enum SessionEvent {
    /// The local participant is in a room; the join code is now retrievable.
    /// Fired for room creators and joiners alike.
    ConnectedToRoom,
    /// Creating a room failed; the session is over.
    CreateRoomFailed {
        /// Service error code.
        code: i16,
        /// Human-readable failure description.
        message: String,
    },
    /// Joining a room failed. A failed join is not a disconnect: no peer
    /// ever existed, so no `PeerDisconnected` accompanies it.
    ConnectFailed {
        /// Service error code.
        code: i16,
        /// Human-readable failure description.
        message: String,
    },
    /// A remote participant is now reachable.
    PeerConnected {
        /// Handle registered for the participant.
        peer: RelayPeer,
    },
    /// A previously connected participant is gone.
    PeerDisconnected {
        /// Identity the handle was registered under.
        id: ParticipantId,
        /// Best-known cause of the departure.
        reason: DisconnectReason,
    },
    /// A payload arrived from a connected participant. The lease must be
    /// returned via `SessionManager::release_slice` once consumed.
    Received {
        /// Identity of the sender.
        from: ParticipantId,
        /// Leased payload bytes.
        payload: PooledSlice,
    },
    /// The relay connection itself ended. Emitted after the per-peer
    /// `PeerDisconnected` sweep.
    DisconnectedFromRelay {
        /// Cause reported by the backend.
        cause: DisconnectCause,
    },
}
