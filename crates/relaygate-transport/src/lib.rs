#![warn(missing_docs)]

//! relaygate-transport: the engine-facing side of the adapter.
//!
//! `RelayTransport` exposes ordinary transport semantics (connections with
//! endpoints and an MTU, connect/disconnect/send, one poll per tick) while
//! the session layer underneath speaks rooms and participant identities.

/// Connection slots and the fixed-capacity pool.
pub mod connection;
/// Engine-facing contract: run modes and the event sink.
pub mod event_types;
/// The transport facade.
pub mod transport;

pub use connection::{Connection, ConnectionId, ConnectionPool};
pub use event_types::{EngineSink, RunMode};
pub use transport::RelayTransport;

pub use relaygate_session::DisconnectReason;
