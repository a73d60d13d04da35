#![warn(missing_docs)]

//! An in-memory relay backend for tests, demos and offline runs.
//!
//! [`LoopbackHub`] plays the part of the relay service: it owns the room
//! table and a mailbox per attached client. [`LoopbackBackend`] implements
//! [`RelayBackend`] against that hub, so a full host/client session can be
//! driven inside a single thread with no sockets involved. Delivery mode is
//! accepted but ignored; every event arrives exactly once, in order.

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap, VecDeque},
    mem,
    rc::Rc,
};

use relaygate_core::{
    BackendEvent, DeliveryGuarantee, DisconnectCause, ErrorKind, ParticipantId, PooledSlice,
    RelayBackend, RelayConfig, Result, SlicePool,
};
use tracing::trace;

/// Service code reported when joining a room that does not exist.
pub const ERR_ROOM_NOT_FOUND: i16 = 32758;
/// Service code reported when joining a room that is already full.
pub const ERR_ROOM_FULL: i16 = 32765;
/// Service code reported when creating a room whose name is taken.
pub const ERR_ROOM_EXISTS: i16 = 32766;

/// Address handed out as the game server for every hub-hosted room.
const DEFAULT_GAME_SERVER: &str = "relay.loopback.local:5055";

/// What the hub drops into a client's mailbox. Mirrors [`BackendEvent`]
/// except that payloads travel as plain byte vectors; each backend copies
/// them into its own slice pool on the way out of [`RelayBackend::service`].
#[derive(Debug)]
enum Mail {
    Connected,
    Disconnected(DisconnectCause),
    RoomCreateFailed { code: i16, message: String },
    RoomJoined { room: String, me: ParticipantId },
    RoomJoinFailed { code: i16, message: String },
    Event { code: u8, sender: ParticipantId, payload: Option<Vec<u8>> },
    ParticipantEntered(ParticipantId),
    ParticipantLeft(ParticipantId),
}

#[derive(Debug)]
struct Room {
    capacity: usize,
    /// Next identity to hand out. The creator always takes 1 and the counter
    /// never rewinds, so identities are unique for the lifetime of the room.
    next_participant: u32,
    master: ParticipantId,
    /// Participant identity to mailbox key, ordered so the lowest identity
    /// is cheap to find when the master leaves.
    members: BTreeMap<ParticipantId, u64>,
}

#[derive(Debug)]
struct HubState {
    rooms: HashMap<String, Room>,
    mailboxes: HashMap<u64, VecDeque<Mail>>,
    game_server_address: String,
    next_client: u64,
}

impl HubState {
    fn register(&mut self) -> u64 {
        let key = self.next_client;
        self.next_client += 1;
        self.mailboxes.insert(key, VecDeque::new());
        key
    }

    fn push(&mut self, key: u64, mail: Mail) {
        match self.mailboxes.get_mut(&key) {
            Some(mailbox) => mailbox.push_back(mail),
            None => trace!("Discarding mail for unregistered client {}", key),
        }
    }

    fn drain(&mut self, key: u64) -> VecDeque<Mail> {
        self.mailboxes
            .get_mut(&key)
            .map(mem::take)
            .unwrap_or_default()
    }

    fn create_room(&mut self, key: u64, name: &str, capacity: usize) {
        if self.rooms.contains_key(name) {
            self.push(
                key,
                Mail::RoomCreateFailed {
                    code: ERR_ROOM_EXISTS,
                    message: format!("a room named '{}' already exists", name),
                },
            );
            return;
        }
        let creator = ParticipantId(1);
        let mut members = BTreeMap::new();
        members.insert(creator, key);
        self.rooms.insert(
            name.to_string(),
            Room {
                capacity: capacity.max(1),
                next_participant: 2,
                master: creator,
                members,
            },
        );
        self.push(
            key,
            Mail::RoomJoined {
                room: name.to_string(),
                me: creator,
            },
        );
    }

    fn join_room(&mut self, key: u64, name: &str) {
        let outcome = match self.rooms.get_mut(name) {
            None => Err((ERR_ROOM_NOT_FOUND, format!("no room named '{}'", name))),
            Some(room) if room.members.len() >= room.capacity => {
                Err((ERR_ROOM_FULL, format!("room '{}' is full", name)))
            }
            Some(room) => {
                let id = ParticipantId(room.next_participant);
                room.next_participant += 1;
                room.members.insert(id, key);
                let others: Vec<u64> = room
                    .members
                    .iter()
                    .filter(|(member, _)| **member != id)
                    .map(|(_, mailbox)| *mailbox)
                    .collect();
                Ok((id, others))
            }
        };
        match outcome {
            Ok((id, others)) => {
                // Existing members learn about the newcomer. The newcomer is
                // told nothing about them; the live service behaves the same
                // way, which is why adapters track only announced peers.
                for other in others {
                    self.push(other, Mail::ParticipantEntered(id));
                }
                self.push(
                    key,
                    Mail::RoomJoined {
                        room: name.to_string(),
                        me: id,
                    },
                );
            }
            Err((code, message)) => self.push(key, Mail::RoomJoinFailed { code, message }),
        }
    }

    fn raise(
        &mut self,
        room: &str,
        sender: ParticipantId,
        code: u8,
        payload: Option<Vec<u8>>,
        target: ParticipantId,
    ) {
        let mailbox = self
            .rooms
            .get(room)
            .and_then(|room| room.members.get(&target).copied());
        match mailbox {
            Some(mailbox) => self.push(mailbox, Mail::Event { code, sender, payload }),
            None => trace!(
                "Discarding event {} from {} for absent participant {}",
                code,
                sender,
                target
            ),
        }
    }

    fn leave(&mut self, name: &str, id: ParticipantId, key: u64, cause: DisconnectCause) {
        let mut notify: Vec<u64> = Vec::new();
        let mut drop_room = false;
        if let Some(room) = self.rooms.get_mut(name) {
            room.members.remove(&id);
            if room.members.is_empty() {
                drop_room = true;
            } else {
                if room.master == id {
                    // Mastership falls to the lowest remaining identity,
                    // matching the hosted service's reassignment rule.
                    if let Some((&next_master, _)) = room.members.iter().next() {
                        room.master = next_master;
                    }
                }
                notify = room.members.values().copied().collect();
            }
        }
        if drop_room {
            self.rooms.remove(name);
        }
        for other in notify {
            self.push(other, Mail::ParticipantLeft(id));
        }
        self.push(key, Mail::Disconnected(cause));
    }
}

/// A stand-in relay service that lives entirely in memory.
///
/// Create one hub per test or demo, then hand a [`LoopbackBackend`] from
/// [`LoopbackHub::backend`] to each session that should share it. The hub is
/// single-threaded; clones share the same room table.
#[derive(Clone, Debug)]
pub struct LoopbackHub {
    state: Rc<RefCell<HubState>>,
}

impl LoopbackHub {
    /// Creates an empty hub with no rooms and the default game server
    /// address.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(HubState {
                rooms: HashMap::new(),
                mailboxes: HashMap::new(),
                game_server_address: DEFAULT_GAME_SERVER.to_string(),
                next_client: 1,
            })),
        }
    }

    /// Overrides the address reported as the game server to every client.
    pub fn set_game_server_address(&self, address: &str) {
        self.state.borrow_mut().game_server_address = address.to_string();
    }

    /// Attaches a new client and returns its backend handle.
    pub fn backend(&self) -> LoopbackBackend {
        let key = self.state.borrow_mut().register();
        LoopbackBackend {
            hub: Rc::clone(&self.state),
            key,
            connected: false,
            room: None,
            me: None,
            pool: SlicePool::default(),
        }
    }

    /// Number of rooms currently open on the hub.
    pub fn room_count(&self) -> usize {
        self.state.borrow().rooms.len()
    }

    /// Returns true while a room with the given name is open.
    pub fn room_exists(&self, name: &str) -> bool {
        self.state.borrow().rooms.contains_key(name)
    }
}

impl Default for LoopbackHub {
    fn default() -> Self {
        Self::new()
    }
}

/// One client's connection to a [`LoopbackHub`].
pub struct LoopbackBackend {
    hub: Rc<RefCell<HubState>>,
    key: u64,
    connected: bool,
    room: Option<String>,
    me: Option<ParticipantId>,
    pool: SlicePool,
}

impl LoopbackBackend {
    /// Severs the hub link as if the transport underneath had died, leaving
    /// the room without a goodbye and reporting [`DisconnectCause::ConnectionLost`].
    pub fn simulate_link_loss(&mut self) {
        self.drop_link(DisconnectCause::ConnectionLost);
    }

    fn drop_link(&mut self, cause: DisconnectCause) {
        if !self.connected {
            return;
        }
        self.connected = false;
        let room = self.room.take();
        let me = self.me.take();
        let mut hub = self.hub.borrow_mut();
        match (room, me) {
            (Some(room), Some(me)) => hub.leave(&room, me, self.key, cause),
            _ => hub.push(self.key, Mail::Disconnected(cause)),
        }
    }
}

impl RelayBackend for LoopbackBackend {
    fn connect(&mut self, config: &RelayConfig) -> Result<()> {
        if config.app_id.is_empty() {
            return Err(ErrorKind::InvalidConfig(
                "app_id must not be empty".to_string(),
            ));
        }
        self.hub.borrow_mut().push(self.key, Mail::Connected);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.drop_link(DisconnectCause::ClientLogic);
    }

    fn create_room(&mut self, name: &str, capacity: usize) {
        if !self.connected {
            trace!("Ignoring create_room('{}') while not connected", name);
            return;
        }
        self.hub.borrow_mut().create_room(self.key, name, capacity);
    }

    fn join_room(&mut self, name: &str) {
        if !self.connected {
            trace!("Ignoring join_room('{}') while not connected", name);
            return;
        }
        self.hub.borrow_mut().join_room(self.key, name);
    }

    fn raise_event(
        &mut self,
        code: u8,
        payload: Option<PooledSlice>,
        target: ParticipantId,
        _delivery: DeliveryGuarantee,
    ) {
        let bytes = payload.as_ref().map(|slice| slice.as_slice().to_vec());
        match (&self.room, self.me) {
            (Some(room), Some(me)) => {
                let room = room.clone();
                self.hub.borrow_mut().raise(&room, me, code, bytes, target);
            }
            _ => trace!("Discarding event {} raised outside a room", code),
        }
        if let Some(slice) = payload {
            self.pool.release(slice);
        }
    }

    fn service(&mut self, events: &mut VecDeque<BackendEvent>) {
        let mails = self.hub.borrow_mut().drain(self.key);
        for mail in mails {
            match mail {
                Mail::Connected => {
                    self.connected = true;
                    events.push_back(BackendEvent::Connected);
                }
                Mail::Disconnected(cause) => {
                    self.connected = false;
                    self.room = None;
                    self.me = None;
                    events.push_back(BackendEvent::Disconnected(cause));
                }
                Mail::RoomCreateFailed { code, message } => {
                    events.push_back(BackendEvent::RoomCreateFailed { code, message });
                }
                Mail::RoomJoined { room, me } => {
                    self.room = Some(room);
                    self.me = Some(me);
                    events.push_back(BackendEvent::RoomJoined);
                }
                Mail::RoomJoinFailed { code, message } => {
                    events.push_back(BackendEvent::RoomJoinFailed { code, message });
                }
                Mail::Event { code, sender, payload } => {
                    let payload = payload.map(|bytes| {
                        let mut slice = self.pool.acquire(bytes.len());
                        slice.as_mut_slice().copy_from_slice(&bytes);
                        slice
                    });
                    events.push_back(BackendEvent::Event { code, sender, payload });
                }
                Mail::ParticipantEntered(id) => {
                    events.push_back(BackendEvent::ParticipantEntered(id));
                }
                Mail::ParticipantLeft(id) => {
                    events.push_back(BackendEvent::ParticipantLeft(id));
                }
            }
        }
    }

    fn acquire_slice(&mut self, len: usize) -> PooledSlice {
        self.pool.acquire(len)
    }

    fn release_slice(&mut self, slice: PooledSlice) {
        self.pool.release(slice);
    }

    fn enable_event_reuse(&mut self) {
        // Payloads already come out of the pool; nothing to switch on.
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn room_name(&self) -> Option<&str> {
        self.room.as_deref()
    }

    fn master_participant(&self) -> Option<ParticipantId> {
        let room = self.room.as_ref()?;
        self.hub.borrow().rooms.get(room).map(|room| room.master)
    }

    fn game_server_address(&self) -> Option<String> {
        if !self.connected {
            return None;
        }
        Some(self.hub.borrow().game_server_address.clone())
    }
}

impl std::fmt::Debug for LoopbackBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackBackend")
            .field("key", &self.key)
            .field("connected", &self.connected)
            .field("room", &self.room)
            .field("me", &self.me)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RelayConfig {
        RelayConfig {
            app_id: "test-app".to_string(),
            ..RelayConfig::default()
        }
    }

    fn drain(backend: &mut LoopbackBackend) -> Vec<BackendEvent> {
        let mut events = VecDeque::new();
        backend.service(&mut events);
        events.into_iter().collect()
    }

    fn connected_backend(hub: &LoopbackHub) -> LoopbackBackend {
        let mut backend = hub.backend();
        backend.connect(&config()).unwrap();
        let events = drain(&mut backend);
        assert!(matches!(events[0], BackendEvent::Connected));
        backend
    }

    fn joined_backend(hub: &LoopbackHub, room: &str) -> LoopbackBackend {
        let mut backend = connected_backend(hub);
        backend.join_room(room);
        let events = drain(&mut backend);
        assert!(
            matches!(events.last(), Some(BackendEvent::RoomJoined)),
            "join was rejected: {:?}",
            events
        );
        backend
    }

    #[test]
    fn test_connect_rejects_empty_app_id() {
        let hub = LoopbackHub::new();
        let mut backend = hub.backend();
        let result = backend.connect(&RelayConfig::default());
        assert!(matches!(result, Err(ErrorKind::InvalidConfig(_))));
        assert!(!backend.is_connected());
    }

    #[test]
    fn test_create_room_makes_creator_master() {
        let hub = LoopbackHub::new();
        let mut host = connected_backend(&hub);
        host.create_room("ABCDE", 4);
        let events = drain(&mut host);
        assert!(matches!(events[0], BackendEvent::RoomJoined));
        assert_eq!(host.room_name(), Some("ABCDE"));
        assert_eq!(host.master_participant(), Some(ParticipantId(1)));
        assert!(hub.room_exists("ABCDE"));
    }

    #[test]
    fn test_create_room_rejects_duplicate_name() {
        let hub = LoopbackHub::new();
        let mut first = connected_backend(&hub);
        first.create_room("ABCDE", 4);
        drain(&mut first);

        let mut second = connected_backend(&hub);
        second.create_room("ABCDE", 4);
        let events = drain(&mut second);
        assert!(matches!(
            events[0],
            BackendEvent::RoomCreateFailed { code: ERR_ROOM_EXISTS, .. }
        ));
        assert_eq!(second.room_name(), None);
    }

    #[test]
    fn test_join_missing_room_fails() {
        let hub = LoopbackHub::new();
        let mut backend = connected_backend(&hub);
        backend.join_room("QQQQQ");
        let events = drain(&mut backend);
        assert!(matches!(
            events[0],
            BackendEvent::RoomJoinFailed { code: ERR_ROOM_NOT_FOUND, .. }
        ));
        assert!(backend.is_connected());
    }

    #[test]
    fn test_join_full_room_fails() {
        let hub = LoopbackHub::new();
        let mut host = connected_backend(&hub);
        host.create_room("ABCDE", 2);
        drain(&mut host);
        let _second = joined_backend(&hub, "ABCDE");

        let mut third = connected_backend(&hub);
        third.join_room("ABCDE");
        let events = drain(&mut third);
        assert!(matches!(
            events[0],
            BackendEvent::RoomJoinFailed { code: ERR_ROOM_FULL, .. }
        ));
    }

    #[test]
    fn test_identities_are_monotonic_within_a_room() {
        let hub = LoopbackHub::new();
        let mut host = connected_backend(&hub);
        host.create_room("ABCDE", 8);
        drain(&mut host);

        let mut second = joined_backend(&hub, "ABCDE");
        let entered = drain(&mut host);
        assert!(matches!(
            entered[0],
            BackendEvent::ParticipantEntered(ParticipantId(2))
        ));

        second.disconnect();
        drain(&mut second);
        drain(&mut host);

        // The freed identity is not reused.
        let _third = joined_backend(&hub, "ABCDE");
        let entered = drain(&mut host);
        assert!(matches!(
            entered[0],
            BackendEvent::ParticipantEntered(ParticipantId(3))
        ));
    }

    #[test]
    fn test_joiner_is_not_told_about_existing_members() {
        let hub = LoopbackHub::new();
        let mut host = connected_backend(&hub);
        host.create_room("ABCDE", 8);
        drain(&mut host);
        let _second = joined_backend(&hub, "ABCDE");

        let mut third = connected_backend(&hub);
        third.join_room("ABCDE");
        let events = drain(&mut third);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], BackendEvent::RoomJoined));
    }

    #[test]
    fn test_master_falls_to_lowest_identity() {
        let hub = LoopbackHub::new();
        let mut host = connected_backend(&hub);
        host.create_room("ABCDE", 8);
        drain(&mut host);
        let second = joined_backend(&hub, "ABCDE");
        let third = joined_backend(&hub, "ABCDE");

        host.disconnect();
        assert_eq!(second.master_participant(), Some(ParticipantId(2)));
        assert_eq!(third.master_participant(), Some(ParticipantId(2)));
    }

    #[test]
    fn test_room_closes_when_last_member_leaves() {
        let hub = LoopbackHub::new();
        let mut host = connected_backend(&hub);
        host.create_room("ABCDE", 4);
        drain(&mut host);
        assert_eq!(hub.room_count(), 1);

        host.disconnect();
        let events = drain(&mut host);
        assert!(matches!(
            events[0],
            BackendEvent::Disconnected(DisconnectCause::ClientLogic)
        ));
        assert_eq!(hub.room_count(), 0);
    }

    #[test]
    fn test_event_reaches_only_its_target() {
        let hub = LoopbackHub::new();
        let mut host = connected_backend(&hub);
        host.create_room("ABCDE", 8);
        drain(&mut host);
        let mut second = joined_backend(&hub, "ABCDE");
        let mut third = joined_backend(&hub, "ABCDE");
        drain(&mut host);
        drain(&mut second);

        let mut slice = host.acquire_slice(3);
        slice.as_mut_slice().copy_from_slice(b"hey");
        host.raise_event(1, Some(slice), ParticipantId(2), DeliveryGuarantee::Reliable);

        let events = drain(&mut second);
        match &events[0] {
            BackendEvent::Event { code, sender, payload } => {
                assert_eq!(*code, 1);
                assert_eq!(*sender, ParticipantId(1));
                assert_eq!(payload.as_ref().unwrap().as_slice(), b"hey");
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(drain(&mut third).is_empty());
    }

    #[test]
    fn test_event_for_absent_participant_is_dropped() {
        let hub = LoopbackHub::new();
        let mut host = connected_backend(&hub);
        host.create_room("ABCDE", 8);
        drain(&mut host);

        let mut slice = host.acquire_slice(2);
        slice.as_mut_slice().copy_from_slice(b"no");
        host.raise_event(1, Some(slice), ParticipantId(9), DeliveryGuarantee::Unreliable);
        assert!(drain(&mut host).is_empty());
    }

    #[test]
    fn test_link_loss_reports_connection_lost() {
        let hub = LoopbackHub::new();
        let mut host = connected_backend(&hub);
        host.create_room("ABCDE", 8);
        drain(&mut host);
        let mut second = joined_backend(&hub, "ABCDE");

        second.simulate_link_loss();
        let events = drain(&mut second);
        assert!(matches!(
            events[0],
            BackendEvent::Disconnected(DisconnectCause::ConnectionLost)
        ));
        let seen = drain(&mut host);
        assert!(matches!(
            seen.last(),
            Some(BackendEvent::ParticipantLeft(ParticipantId(2)))
        ));
    }
}
