//! The contract a concrete relay SDK fulfils, plus its event model.
//!
//! `RelayBackend` is the seam between this adapter and whichever relay
//! client library actually talks to the service. Every method is
//! fire-and-forget: outcomes arrive later as `BackendEvent`s collected
//! during `service`, on the caller's thread. The in-memory implementation
//! used by tests and demos lives in `relaygate-loopback`.

use std::collections::VecDeque;

use crate::{
    config::RelayConfig,
    error::Result,
    slice_pool::PooledSlice,
    types::{DeliveryGuarantee, ParticipantId},
};

/// Why the relay connection ended, as reported by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisconnectCause {
    /// The local side asked for the disconnect.
    ClientLogic,
    /// The relay service closed the connection.
    ServerLogic,
    /// The connection timed out.
    Timeout,
    /// The underlying link was lost.
    ConnectionLost,
}

/// Events a backend reports from `service`.
#[derive(Debug)]
pub enum BackendEvent {
    /// The backend connection is established; room operations may begin.
    Connected,
    /// The backend connection ended.
    Disconnected(DisconnectCause),
    /// Creating a room failed (name collision, service rejection).
    RoomCreateFailed {
        /// Service error code.
        code: i16,
        /// Human-readable failure description.
        message: String,
    },
    /// The local participant entered a room (as creator or joiner).
    RoomJoined,
    /// Joining a room failed (unknown name, room full).
    RoomJoinFailed {
        /// Service error code.
        code: i16,
        /// Human-readable failure description.
        message: String,
    },
    /// The local participant left its room while staying connected.
    RoomLeft,
    /// A targeted event arrived from another participant.
    Event {
        /// Application event code.
        code: u8,
        /// Identity of the sending participant.
        sender: ParticipantId,
        /// Leased payload, if the event carried one. The consumer must
        /// return the lease via `release_slice` once done with it.
        payload: Option<PooledSlice>,
    },
    /// Another participant entered the room.
    ParticipantEntered(ParticipantId),
    /// Another participant left the room.
    ParticipantLeft(ParticipantId),
}

/// Connection to a room-based relay service.
///
/// Implementations wrap a relay SDK without exposing its types. Methods
/// must not block and must not invoke callbacks re-entrantly; all activity
/// is reported through `service`.
pub trait RelayBackend {
    /// Begins connecting to the relay service. Completion is reported as
    /// `BackendEvent::Connected`; a synchronous error means the settings
    /// were rejected before any traffic happened.
    fn connect(&mut self, config: &RelayConfig) -> Result<()>;

    /// Begins disconnecting from the relay service.
    fn disconnect(&mut self);

    /// Asks the service to create a room under the given name with the
    /// given participant capacity.
    fn create_room(&mut self, name: &str, capacity: usize);

    /// Asks the service to join the room with the given name.
    fn join_room(&mut self, name: &str);

    /// Raises a targeted event at another participant. A payload slice is
    /// consumed by the call and returned to the pool once dispatched.
    fn raise_event(
        &mut self,
        code: u8,
        payload: Option<PooledSlice>,
        target: ParticipantId,
        delivery: DeliveryGuarantee,
    );

    /// Runs pending backend work and appends any events that arrived.
    fn service(&mut self, events: &mut VecDeque<BackendEvent>);

    /// Leases a buffer of the given length from the backend's pool.
    fn acquire_slice(&mut self, len: usize) -> PooledSlice;

    /// Returns a consumed lease to the backend's pool.
    fn release_slice(&mut self, slice: PooledSlice);

    /// Enables event-instance reuse and pooled payload delivery where the
    /// SDK supports it. Implementations without the option do nothing.
    fn enable_event_reuse(&mut self);

    /// Returns true while the backend connection is established.
    fn is_connected(&self) -> bool;

    /// Returns the name of the room currently joined.
    fn room_name(&self) -> Option<&str>;

    /// Returns the identity of the room's master participant.
    fn master_participant(&self) -> Option<ParticipantId>;

    /// Returns the address of the game server the room was routed through,
    /// in `host:port` or `scheme://host:port` form.
    fn game_server_address(&self) -> Option<String>;
}
