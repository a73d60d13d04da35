//! Logical peer endpoints and address parsing.
//!
//! The relay hides real peer addresses; what it reports is the game-server
//! address it routed the room through. `EndPoint` keeps that as a plain
//! host/port pair for display and diagnostics. Nothing in the adapter ever
//! dials these values.

use crate::error::{ErrorKind, Result};

/// Immutable logical network address of a peer (host and port).
///
/// Purely informational: shown in logs and surfaced to the engine alongside
/// a connection, never used to open a socket.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct EndPoint {
    host: String,
    port: u16,
}

impl EndPoint {
    /// Creates an endpoint from a host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    /// Parses an endpoint from a `host:port` or `scheme://host:port` string.
    ///
    /// Relay services report their routed address in either form depending
    /// on the configured protocol, so the scheme is optional and discarded.
    /// Bracketed IPv6 hosts (`[::1]:7777`) are unwrapped.
    ///
    /// # Examples
    /// ```
    /// use relaygate_core::EndPoint;
    ///
    /// let plain = EndPoint::parse("203.0.113.5:7777").unwrap();
    /// let schemed = EndPoint::parse("udp://203.0.113.5:7777").unwrap();
    /// assert_eq!(plain, schemed);
    /// assert_eq!(plain.host(), "203.0.113.5");
    /// assert_eq!(plain.port(), 7777);
    /// ```
    pub fn parse(address: &str) -> Result<Self> {
        let malformed = || ErrorKind::MalformedAddress { address: address.to_string() };

        let rest = match address.find("://") {
            Some(index) => &address[index + 3..],
            None => address,
        };

        let (host, port) = rest.rsplit_once(':').ok_or_else(malformed)?;
        let port = port.parse::<u16>().map_err(|_| malformed())?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(malformed());
        }

        Ok(Self { host: host.to_string(), port })
    }

    /// Returns the host portion of the endpoint.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port portion of the endpoint.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl std::fmt::Display for EndPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
