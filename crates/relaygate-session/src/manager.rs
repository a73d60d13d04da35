//! Session manager driving a relay backend.
//!
//! `SessionManager` owns the backend connection and the identity map, and
//! turns raw `BackendEvent`s into the `SessionEvent` stream during
//! `poll_update`. Everything happens on the caller's thread inside the
//! poll; the type is not meant to be shared across threads.

use std::collections::{HashMap, VecDeque};

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use relaygate_core::{
    constants::{EVENT_CODE_KICK_SELF, EVENT_CODE_MESSAGE, MAX_EVENT_PAYLOAD},
    BackendEvent, DeliveryGuarantee, DisconnectCause, EndPoint, ErrorKind, ParticipantId,
    PooledSlice, RelayBackend, RelayConfig, Result,
};
use tracing::{debug, error, trace, warn};

use crate::{
    event_types::{DisconnectReason, SessionEvent},
    peer::RelayPeer,
    room_code::{generate_room_code, is_well_formed},
};

/// Lifecycle of the relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No connection attempt has been made yet
    #[default]
    Idle,
    /// Connecting to the backend, or waiting for a room operation
    Connecting,
    /// Member of a room; data can flow
    InRoom,
    /// The session ended (failure, kick or local shutdown)
    Disconnected,
}

impl SessionState {
    /// Returns true while a connection attempt or room membership is live.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::InRoom)
    }

    /// Returns true once room membership is established.
    pub fn is_in_room(&self) -> bool {
        matches!(self, SessionState::InRoom)
    }
}

/// Which side of the room lifecycle this session plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    Host,
    Client,
}

/// Session manager over a relay backend.
///
/// Owns the identity map of connected participants and the event channel
/// its consumer drains. Operations are fire-and-forget: outcomes surface as
/// `SessionEvent`s on later polls.
pub struct SessionManager<B: RelayBackend> {
    backend: B,
    config: RelayConfig,
    state: SessionState,
    role: Option<Role>,
    pending_room_code: Option<String>,
    peers: HashMap<ParticipantId, RelayPeer>,
    /// Reused between polls to avoid a fresh allocation per tick
    backend_events: VecDeque<BackendEvent>,
    event_sender: Sender<SessionEvent>,
    event_receiver: Receiver<SessionEvent>,
}

impl<B: RelayBackend> SessionManager<B> {
    /// Creates a session manager over the given backend.
    pub fn new(backend: B, config: RelayConfig) -> Self {
        let (event_sender, event_receiver) = unbounded();
        Self {
            backend,
            peers: HashMap::with_capacity(config.max_participants),
            config,
            state: SessionState::default(),
            role: None,
            pending_room_code: None,
            backend_events: VecDeque::new(),
            event_sender,
            event_receiver,
        }
    }

    /// Connects to the backend in order to create and host a room.
    ///
    /// The room code is generated once the backend connection is up and can
    /// be read via `try_room_code` after the room exists.
    pub fn host_room(&mut self) -> Result<()> {
        if self.state.is_active() {
            warn!("Ignoring host request while the session is {:?}", self.state);
            return Ok(());
        }
        // Commit nothing until the backend accepts the settings; a rejected
        // connect must leave the session as it was so the caller can retry.
        self.backend.connect(&self.config)?;
        self.role = Some(Role::Host);
        self.pending_room_code = None;
        self.state = SessionState::Connecting;
        Ok(())
    }

    /// Connects to the backend in order to join the room named by `room_code`.
    pub fn connect(&mut self, room_code: &str) -> Result<()> {
        if self.state.is_active() {
            warn!("Ignoring join request while the session is {:?}", self.state);
            return Ok(());
        }
        if !is_well_formed(room_code) {
            warn!("Join code '{}' does not look like a room code", room_code);
        }
        self.backend.connect(&self.config)?;
        self.role = Some(Role::Client);
        self.pending_room_code = Some(room_code.to_string());
        self.state = SessionState::Connecting;
        Ok(())
    }

    /// Sends a payload to a connected participant.
    ///
    /// Sends to identities that are no longer registered are dropped
    /// silently; the engine may race a send against a departure.
    pub fn send(
        &mut self,
        target: ParticipantId,
        payload: &[u8],
        delivery: DeliveryGuarantee,
    ) -> Result<()> {
        if payload.len() > MAX_EVENT_PAYLOAD {
            return Err(ErrorKind::PayloadTooLarge {
                size: payload.len(),
                max: MAX_EVENT_PAYLOAD,
            });
        }
        if !self.peers.contains_key(&target) {
            trace!("Dropping send to unknown participant {}", target);
            return Ok(());
        }

        let mut slice = self.backend.acquire_slice(payload.len());
        slice.as_mut_slice().copy_from_slice(payload);
        self.backend.raise_event(EVENT_CODE_MESSAGE, Some(slice), target, delivery);
        Ok(())
    }

    /// Instructs a participant to disconnect itself.
    ///
    /// Nothing is removed locally; the relay's departure notification is
    /// what tears the peer down on both sides.
    pub fn kick(&mut self, target: ParticipantId) {
        if !self.peers.contains_key(&target) {
            trace!("Dropping kick for unknown participant {}", target);
            return;
        }
        self.backend
            .raise_event(EVENT_CODE_KICK_SELF, None, target, DeliveryGuarantee::Reliable);
    }

    /// Runs backend work and translates everything that arrived.
    pub fn poll_update(&mut self) {
        let mut events = std::mem::take(&mut self.backend_events);
        self.backend.service(&mut events);
        for event in events.drain(..) {
            self.handle_backend_event(event);
        }
        self.backend_events = events;
    }

    /// Returns the next pending session event, if any.
    pub fn try_next_event(&self) -> Option<SessionEvent> {
        match self.event_receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => panic!["This can never happen"],
        }
    }

    /// Returns the join code of the current room, if one is joined.
    pub fn try_room_code(&self) -> Option<&str> {
        if self.state.is_in_room() {
            self.backend.room_name()
        } else {
            None
        }
    }

    /// Returns a consumed inbound payload lease to the backend's pool.
    pub fn release_slice(&mut self, slice: PooledSlice) {
        self.backend.release_slice(slice);
    }

    /// Disconnects from the backend if a connection is up.
    pub fn shutdown(&mut self) {
        if self.backend.is_connected() {
            self.backend.disconnect();
        }
    }

    /// Returns the current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the handle registered for a participant.
    pub fn peer(&self, id: ParticipantId) -> Option<&RelayPeer> {
        self.peers.get(&id)
    }

    /// Returns the number of currently registered participants.
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Returns a mutable reference to the underlying backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn emit(&self, event: SessionEvent) {
        self.event_sender.send(event).expect("Receiver must exist");
    }

    fn handle_backend_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Connected => self.on_backend_connected(),
            BackendEvent::Disconnected(cause) => self.on_backend_disconnected(cause),
            BackendEvent::RoomCreateFailed { code, message } => {
                self.state = SessionState::Disconnected;
                self.emit(SessionEvent::CreateRoomFailed { code, message });
            }
            BackendEvent::RoomJoined => self.on_room_joined(),
            BackendEvent::RoomJoinFailed { code, message } => {
                self.pending_room_code = None;
                self.state = SessionState::Disconnected;
                self.emit(SessionEvent::ConnectFailed { code, message });
            }
            BackendEvent::RoomLeft => {}
            BackendEvent::Event { code, sender, payload } => {
                self.on_relay_event(code, sender, payload)
            }
            BackendEvent::ParticipantEntered(id) => self.register_peer(id),
            BackendEvent::ParticipantLeft(id) => {
                if self.peers.remove(&id).is_some() {
                    self.emit(SessionEvent::PeerDisconnected {
                        id,
                        reason: DisconnectReason::Left,
                    });
                }
            }
        }
    }

    fn on_backend_connected(&mut self) {
        debug!("Connected to the relay backend");
        if self.config.reuse_event_buffers {
            self.backend.enable_event_reuse();
        }
        match self.role {
            Some(Role::Host) => {
                let code = generate_room_code();
                debug!("Creating room {}", code);
                self.backend.create_room(&code, self.config.max_participants);
            }
            Some(Role::Client) => match &self.pending_room_code {
                Some(code) => self.backend.join_room(code),
                None => warn!("Client session connected without a pending join code"),
            },
            None => warn!("Backend connected without a host or join request"),
        }
    }

    fn on_room_joined(&mut self) {
        self.pending_room_code = None;
        self.state = SessionState::InRoom;
        if self.role == Some(Role::Client) {
            // A joiner talks to the room's master; its handle is built from
            // the join itself rather than a participant-entered event.
            match self.backend.master_participant() {
                Some(master) => self.register_peer(master),
                None => warn!("Joined a room that reports no master participant"),
            }
        }
        self.emit(SessionEvent::ConnectedToRoom);
    }

    fn on_relay_event(&mut self, code: u8, sender: ParticipantId, payload: Option<PooledSlice>) {
        match code {
            EVENT_CODE_MESSAGE => match payload {
                Some(slice) => {
                    if self.peers.contains_key(&sender) {
                        self.emit(SessionEvent::Received { from: sender, payload: slice });
                    } else {
                        trace!("Dropping payload from unknown participant {}", sender);
                        self.backend.release_slice(slice);
                    }
                }
                None => trace!("Message event without payload from participant {}", sender),
            },
            EVENT_CODE_KICK_SELF => {
                debug!("Received a kick instruction from participant {}", sender);
                if let Some(slice) = payload {
                    self.backend.release_slice(slice);
                }
                self.backend.disconnect();
                if self.peers.remove(&sender).is_some() {
                    self.emit(SessionEvent::PeerDisconnected {
                        id: sender,
                        reason: DisconnectReason::Kicked,
                    });
                }
            }
            other => {
                trace!("Ignoring relay event with unhandled code {}", other);
                if let Some(slice) = payload {
                    self.backend.release_slice(slice);
                }
            }
        }
    }

    fn on_backend_disconnected(&mut self, cause: DisconnectCause) {
        debug!("Disconnected from the relay backend: {:?}", cause);
        let reason = match cause {
            DisconnectCause::ClientLogic => DisconnectReason::Shutdown,
            _ => DisconnectReason::Timeout,
        };
        // Every registered peer is unreachable once the relay link is gone;
        // sweep them before reporting the loss itself.
        let swept: Vec<ParticipantId> = self.peers.drain().map(|(id, _)| id).collect();
        for id in swept {
            self.emit(SessionEvent::PeerDisconnected { id, reason });
        }
        self.state = SessionState::Disconnected;
        self.emit(SessionEvent::DisconnectedFromRelay { cause });
    }

    fn register_peer(&mut self, id: ParticipantId) {
        let endpoint = self.resolve_endpoint();
        let peer = RelayPeer::new(id, endpoint);
        if self.peers.insert(id, peer.clone()).is_some() {
            warn!("Replacing an existing handle for participant {}", id);
        }
        self.emit(SessionEvent::PeerConnected { peer });
    }

    /// Parses the backend's reported game-server address. The endpoint is
    /// diagnostic, so an unparseable address degrades to an empty one
    /// instead of failing the registration.
    fn resolve_endpoint(&self) -> EndPoint {
        match self.backend.game_server_address() {
            Some(address) => match EndPoint::parse(&address) {
                Ok(endpoint) => endpoint,
                Err(err) => {
                    error!("Could not parse the relay game server address: {}", err);
                    EndPoint::default()
                }
            },
            None => EndPoint::default(),
        }
    }
}

impl<B: RelayBackend> std::fmt::Debug for SessionManager<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state)
            .field("role", &self.role)
            .field("peers", &self.peers.len())
            .finish()
    }
}
