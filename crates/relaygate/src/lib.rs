#![warn(missing_docs)]

//! Relaygate: a small public API facade for the workspace.
//!
//! This crate provides a clean, stable surface that re-exports the most
//! commonly used types for bridging a poll-driven engine onto a room-based
//! relay:
//!
//! - Transport and the engine contract (`RelayTransport`, `EngineSink`, `RunMode`)
//! - Connection slots (`Connection`, `ConnectionId`)
//! - Configuration and identities (`RelayConfig`, `ParticipantId`)
//! - An in-memory relay for tests and demos (`LoopbackHub`)
//!
//! Example
//! ```ignore
//! use relaygate::{LoopbackHub, RelayConfig, RelayTransport, RunMode};
//!
//! let hub = LoopbackHub::new();
//! let config = RelayConfig { app_id: "my-app".into(), ..RelayConfig::default() };
//!
//! // The host creates a room and shows its join code to the players.
//! let mut host = RelayTransport::new(hub.backend(), config.clone());
//! host.run(RunMode::Host, 0).unwrap();
//! host.poll_events(&mut engine);
//! println!("join code: {}", host.try_room_code().unwrap());
//!
//! // A client joins with the code instead of an address.
//! let mut client = RelayTransport::new(hub.backend(), config);
//! client.run(RunMode::Client, 0).unwrap();
//! client.connect("ABCDE", 0, &[]).unwrap();
//! ```

// Core configuration, identities and errors
pub use relaygate_core::{
    DeliveryGuarantee, DisconnectCause, EndPoint, ErrorKind, ParticipantId, RelayBackend,
    RelayConfig,
};
// Session layer: state and the reasons surfaced through the transport
pub use relaygate_session::{DisconnectReason, SessionManager, SessionState};
// Transport: the engine-facing facade
pub use relaygate_transport::{Connection, ConnectionId, EngineSink, RelayTransport, RunMode};
// Loopback: in-memory relay for tests, demos and offline runs
pub use relaygate_loopback::{LoopbackBackend, LoopbackHub};

/// Convenience prelude with the most commonly used items.
pub mod prelude {
    pub use crate::{
        Connection, ConnectionId, DeliveryGuarantee, DisconnectCause, DisconnectReason,
        EngineSink, LoopbackBackend, LoopbackHub, ParticipantId, RelayConfig, RelayTransport,
        RunMode, SessionState,
    };
}
