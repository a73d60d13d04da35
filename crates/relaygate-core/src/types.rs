//! Identity and delivery-mode vocabulary shared by every layer.

/// Relay-assigned participant identity (a compact integer, not an address).
///
/// The relay guarantees an identity is never reused for a different peer
/// while that peer is still a room member; a participant that leaves and
/// rejoins comes back under a fresh identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub u32);

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Enum to specify how a relayed event should be delivered.
#[derive(Copy, Clone, Debug, PartialOrd, PartialEq, Eq, Default)]
pub enum DeliveryGuarantee {
    /// Event may or may not be delivered
    #[default]
    Unreliable,
    /// Event will be delivered
    Reliable,
}

impl DeliveryGuarantee {
    /// Returns true for reliable delivery.
    pub fn is_reliable(&self) -> bool {
        matches!(self, DeliveryGuarantee::Reliable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_id_display_is_bare_integer() {
        assert_eq!(ParticipantId(42).to_string(), "42");
    }

    #[test]
    fn delivery_guarantee_defaults_to_unreliable() {
        assert_eq!(DeliveryGuarantee::default(), DeliveryGuarantee::Unreliable);
        assert!(!DeliveryGuarantee::Unreliable.is_reliable());
        assert!(DeliveryGuarantee::Reliable.is_reliable());
    }
}
