//! Peer handles for remote participants.

use relaygate_core::{EndPoint, ParticipantId};

/// Handle for a remote participant in the current room.
///
/// One live handle exists per connected identity, created when the relay
/// reports the participant and dropped when it leaves, is kicked or the
/// relay connection ends. The endpoint is diagnostic: it names the game
/// server the room runs through, not a dialable peer address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayPeer {
    id: ParticipantId,
    endpoint: EndPoint,
}

impl RelayPeer {
    /// Creates a peer handle from an identity and its reported endpoint.
    pub fn new(id: ParticipantId, endpoint: EndPoint) -> Self {
        Self { id, endpoint }
    }

    /// Returns the relay-assigned identity of this peer.
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    /// Returns the endpoint the relay reported for this peer.
    pub fn endpoint(&self) -> &EndPoint {
        &self.endpoint
    }
}

impl std::fmt::Display for RelayPeer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "participant {} ({})", self.id, self.endpoint)
    }
}
