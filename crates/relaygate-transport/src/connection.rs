//! Connection slots and the fixed-capacity pool.
//!
//! The engine addresses peers through `ConnectionId`s bound to reusable
//! slots. All slots are allocated up front; connect/disconnect churn moves
//! ids between the free list and the association map without touching the
//! allocator.

use std::collections::VecDeque;

use relaygate_core::{constants::DEFAULT_MTU, EndPoint, ParticipantId};

/// Index handle identifying a connection slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub usize);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reusable connection slot, bound to a participant while in use.
#[derive(Clone, Debug)]
pub struct Connection {
    participant: Option<ParticipantId>,
    endpoint: EndPoint,
}

impl Connection {
    fn vacant() -> Self {
        Self { participant: None, endpoint: EndPoint::default() }
    }

    /// Returns the participant bound to this slot, if any.
    pub fn participant(&self) -> Option<ParticipantId> {
        self.participant
    }

    /// Returns the endpoint reported for the bound participant.
    pub fn endpoint(&self) -> &EndPoint {
        &self.endpoint
    }

    /// Returns the maximum payload size for this connection.
    ///
    /// Fixed: the relay fragments internally, so every connection reports
    /// the same conservative value.
    pub fn mtu(&self) -> usize {
        DEFAULT_MTU
    }

    /// Returns true while the slot is bound to a participant.
    pub fn is_bound(&self) -> bool {
        self.participant.is_some()
    }

    fn bind(&mut self, participant: ParticipantId, endpoint: EndPoint) {
        self.participant = Some(participant);
        self.endpoint = endpoint;
    }

    fn clear(&mut self) {
        self.participant = None;
        self.endpoint = EndPoint::default();
    }
}

/// Fixed-capacity pool of connection slots.
pub struct ConnectionPool {
    slots: Vec<Connection>,
    free: VecDeque<ConnectionId>,
}

impl ConnectionPool {
    /// Creates a pool with every slot allocated and free.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| Connection::vacant()).collect(),
            free: (0..capacity).map(ConnectionId).collect(),
        }
    }

    /// Binds a free slot to a participant and returns its id.
    ///
    /// Panics when no slot is free: the pool is sized to the room capacity,
    /// so running out means the engine and relay were configured with
    /// different participant maximums, which nothing downstream can repair.
    pub fn acquire(&mut self, participant: ParticipantId, endpoint: EndPoint) -> ConnectionId {
        let id = self
            .free
            .pop_front()
            .expect("connection pool exhausted: engine and relay disagree on max participants");
        self.slots[id.0].bind(participant, endpoint);
        id
    }

    /// Unbinds a slot and returns it to the free list.
    ///
    /// Must be called exactly once per acquired id.
    pub fn release(&mut self, id: ConnectionId) {
        debug_assert!(!self.free.contains(&id), "connection slot released twice");
        self.slots[id.0].clear();
        self.free.push_back(id);
    }

    /// Returns the slot for an id, if the id is in range.
    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.slots.get(id.0)
    }

    /// Returns the number of slots currently bound.
    pub fn in_use(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Returns the total number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl std::ops::Index<ConnectionId> for ConnectionPool {
    type Output = Connection;

    fn index(&self, id: ConnectionId) -> &Connection {
        &self.slots[id.0]
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("capacity", &self.capacity())
            .field("in_use", &self.in_use())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> EndPoint {
        EndPoint::new("203.0.113.5", 7777)
    }

    #[test]
    fn test_pool_starts_fully_free() {
        let pool = ConnectionPool::new(4);
        assert_eq!(pool.capacity(), 4);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn test_acquire_binds_and_release_frees() {
        let mut pool = ConnectionPool::new(2);

        let id = pool.acquire(ParticipantId(7), endpoint());
        assert_eq!(pool.in_use(), 1);
        assert_eq!(pool[id].participant(), Some(ParticipantId(7)));
        assert_eq!(pool[id].endpoint(), &endpoint());
        assert!(pool[id].is_bound());

        pool.release(id);
        assert_eq!(pool.in_use(), 0);
        assert!(!pool[id].is_bound());
    }

    #[test]
    fn test_slots_are_reused_across_churn() {
        let mut pool = ConnectionPool::new(2);

        for round in 0..10 {
            let a = pool.acquire(ParticipantId(round), endpoint());
            let b = pool.acquire(ParticipantId(round + 100), endpoint());
            assert_eq!(pool.in_use(), 2);
            pool.release(a);
            pool.release(b);
            assert_eq!(pool.in_use(), 0);
        }
    }

    #[test]
    fn test_in_use_never_exceeds_capacity() {
        let mut pool = ConnectionPool::new(3);
        let ids: Vec<_> =
            (0..3).map(|i| pool.acquire(ParticipantId(i), endpoint())).collect();
        assert_eq!(pool.in_use(), pool.capacity());
        for id in ids {
            pool.release(id);
        }
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    #[should_panic(expected = "connection pool exhausted")]
    fn test_exhausting_the_pool_panics() {
        let mut pool = ConnectionPool::new(1);
        let _held = pool.acquire(ParticipantId(1), endpoint());
        let _too_many = pool.acquire(ParticipantId(2), endpoint());
    }

    #[test]
    fn test_mtu_is_fixed() {
        let mut pool = ConnectionPool::new(1);
        let id = pool.acquire(ParticipantId(1), endpoint());
        assert_eq!(pool[id].mtu(), DEFAULT_MTU);
    }
}
