//! The transport facade.
//!
//! `RelayTransport` wraps a `SessionManager` and presents the contract a
//! poll-driven engine expects: start in a role, connect by address,
//! exchange bytes on connections, poll once per tick. The "address" a
//! client connects to is the room join code; real addressing is the
//! relay's business.

use std::collections::HashMap;

use relaygate_core::{
    constants::RECEIVE_BUFFER_SIZE, DeliveryGuarantee, ParticipantId, RelayBackend, RelayConfig,
    Result,
};
use relaygate_session::{DisconnectReason, SessionEvent, SessionManager, SessionState};
use tracing::{trace, warn};

use crate::{
    connection::{Connection, ConnectionId, ConnectionPool},
    event_types::{EngineSink, RunMode},
};

/// Engine-facing transport over a room-based relay.
///
/// Owns the session manager, the slot pool and the association between
/// participant identities and connection ids. Not thread-safe by design:
/// every entry point takes `&mut self` and all callbacks fire inside
/// `poll_events` on the calling thread.
pub struct RelayTransport<B: RelayBackend> {
    session: SessionManager<B>,
    pool: ConnectionPool,
    connections: HashMap<ParticipantId, ConnectionId>,
    /// Scratch buffer inbound payloads are copied into before delivery;
    /// allocated once, never grown
    receive_buffer: Vec<u8>,
}

impl<B: RelayBackend> RelayTransport<B> {
    /// Creates a transport over the given backend.
    ///
    /// All fixed storage (connection slots, the association map, the
    /// scratch receive buffer) is allocated here; the steady state
    /// allocates nothing per tick.
    pub fn new(backend: B, config: RelayConfig) -> Self {
        let max_participants = config.max_participants;
        Self {
            session: SessionManager::new(backend, config),
            pool: ConnectionPool::new(max_participants),
            connections: HashMap::with_capacity(max_participants),
            receive_buffer: vec![0; RECEIVE_BUFFER_SIZE],
        }
    }

    /// Starts the transport in the given role.
    ///
    /// `Host` connects to the relay and creates a room; `Client` does
    /// nothing until `connect` supplies a join code. The port is accepted
    /// for contract parity and unused, since the relay owns addressing.
    pub fn run(&mut self, mode: RunMode, _port: u16) -> Result<()> {
        match mode {
            RunMode::Host => self.session.host_room(),
            RunMode::Client => Ok(()),
        }
    }

    /// Connects to the room named by `address`.
    ///
    /// The engine passes what it considers a server address; here that is
    /// the room join code. Port and connection payload are accepted for
    /// contract parity and unused.
    pub fn connect(&mut self, address: &str, _port: u16, _connect_data: &[u8]) -> Result<()> {
        self.session.connect(address)
    }

    /// Disconnects a connection by kicking the participant bound to it.
    ///
    /// Nothing is released locally; the relay's departure event drives the
    /// actual teardown on both sides.
    pub fn disconnect(&mut self, id: ConnectionId) {
        match self.pool.get(id).and_then(Connection::participant) {
            Some(target) => self.session.kick(target),
            None => trace!("Dropping disconnect for unbound connection {}", id),
        }
    }

    /// Sends an unreliable payload on a connection.
    pub fn send(&mut self, id: ConnectionId, payload: &[u8]) -> Result<()> {
        self.send_with(id, payload, DeliveryGuarantee::Unreliable)
    }

    /// Sends a payload on a connection with the requested delivery mode.
    ///
    /// Sends on unbound or stale connection ids are dropped silently; the
    /// engine may race a send against a disconnect it has not seen yet.
    pub fn send_with(
        &mut self,
        id: ConnectionId,
        payload: &[u8],
        delivery: DeliveryGuarantee,
    ) -> Result<()> {
        match self.pool.get(id).and_then(Connection::participant) {
            Some(target) => self.session.send(target, payload, delivery),
            None => {
                trace!("Dropping send on unbound connection {}", id);
                Ok(())
            }
        }
    }

    /// Polls the relay once and delivers everything that arrived.
    ///
    /// All engine notifications for this tick fire from inside this call.
    pub fn poll_events<E: EngineSink>(&mut self, engine: &mut E) {
        self.session.poll_update();
        while let Some(event) = self.session.try_next_event() {
            self.dispatch(event, engine);
        }
    }

    /// Returns the join code of the current room, if one is joined.
    pub fn try_room_code(&self) -> Option<&str> {
        self.session.try_room_code()
    }

    /// Shuts the transport down, disconnecting from the relay if needed.
    pub fn shutdown(&mut self) {
        self.session.shutdown();
    }

    /// Returns the connection bound for an id, if the id is valid and bound.
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.pool.get(id).filter(|connection| connection.is_bound())
    }

    /// Returns the number of live connections.
    pub fn connection_count(&self) -> usize {
        self.pool.in_use()
    }

    /// Returns the current session state.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Returns a mutable reference to the underlying session manager.
    pub fn session_mut(&mut self) -> &mut SessionManager<B> {
        &mut self.session
    }

    fn dispatch<E: EngineSink>(&mut self, event: SessionEvent, engine: &mut E) {
        match event {
            SessionEvent::PeerConnected { peer } => {
                // A backend violating identity uniqueness would otherwise
                // leak the slot bound under the first announcement.
                if let Some(stale) = self.connections.remove(&peer.id()) {
                    warn!("Rebinding re-announced participant {}", peer.id());
                    engine.on_disconnected(stale, DisconnectReason::Timeout);
                    self.pool.release(stale);
                }
                let id = self.pool.acquire(peer.id(), peer.endpoint().clone());
                self.connections.insert(peer.id(), id);
                engine.on_connected(id, &self.pool[id]);
            }
            SessionEvent::PeerDisconnected { id, reason } => {
                if let Some(connection) = self.connections.remove(&id) {
                    engine.on_disconnected(connection, reason);
                    self.pool.release(connection);
                }
            }
            SessionEvent::Received { from, payload } => {
                let len = payload.len();
                if len > self.receive_buffer.len() {
                    warn!(
                        "Dropping an oversized event of {} bytes from participant {}",
                        len, from
                    );
                } else if let Some(&connection) = self.connections.get(&from) {
                    self.receive_buffer[..len].copy_from_slice(payload.as_slice());
                    engine.on_receive(connection, &self.receive_buffer[..len]);
                } else {
                    trace!("Dropping payload for unknown participant {}", from);
                }
                self.session.release_slice(payload);
            }
            SessionEvent::ConnectedToRoom => engine.on_room_code_available(),
            SessionEvent::CreateRoomFailed { code, message } => {
                warn!("Room creation failed ({}): {}", code, message);
                engine.on_room_create_failed();
            }
            SessionEvent::ConnectFailed { code, message } => {
                warn!("Room join failed ({}): {}", code, message);
                engine.on_connect_failed();
            }
            SessionEvent::DisconnectedFromRelay { cause } => {
                engine.on_relay_disconnected(cause);
            }
        }
    }
}

impl<B: RelayBackend> std::fmt::Debug for RelayTransport<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayTransport")
            .field("state", &self.state())
            .field("connections", &self.connection_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use relaygate_loopback::{LoopbackBackend, LoopbackHub};

    use super::*;

    struct NullEngine;

    impl EngineSink for NullEngine {
        fn on_connected(&mut self, _id: ConnectionId, _connection: &Connection) {}
        fn on_disconnected(&mut self, _id: ConnectionId, _reason: crate::DisconnectReason) {}
        fn on_receive(&mut self, _id: ConnectionId, _payload: &[u8]) {}
    }

    fn transport() -> RelayTransport<LoopbackBackend> {
        let hub = LoopbackHub::new();
        let config = RelayConfig {
            app_id: "transport-unit".to_string(),
            ..RelayConfig::default()
        };
        RelayTransport::new(hub.backend(), config)
    }

    #[test]
    fn test_client_run_waits_for_a_join_code() {
        let mut transport = transport();
        transport.run(RunMode::Client, 0).unwrap();
        transport.poll_events(&mut NullEngine);
        assert_eq!(transport.state(), SessionState::Idle);
    }

    #[test]
    fn test_disconnect_on_unbound_connection_is_ignored() {
        let mut transport = transport();
        transport.disconnect(ConnectionId(0));
        transport.disconnect(ConnectionId(99));
        assert_eq!(transport.connection_count(), 0);
    }

    #[test]
    fn test_connection_lookup_requires_a_bound_slot() {
        let transport = transport();
        assert!(transport.connection(ConnectionId(0)).is_none());
        assert!(transport.connection(ConnectionId(99)).is_none());
    }

    #[test]
    fn test_send_on_vacant_slot_is_dropped() {
        let mut transport = transport();
        assert!(transport.send(ConnectionId(0), b"early").is_ok());
    }
}
