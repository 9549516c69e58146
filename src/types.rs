//! Connection identity
//!
//! Display names are only unique among current members, so the federator
//! keys removals on `ConnectionId` instead. A leave from a session that was
//! already evicted, or whose name has since been reused, then removes
//! nothing rather than the wrong member.

use uuid::Uuid;

/// Identity of one registered connection
///
/// Minted in `Connection::new` and carried in every `Leave` event; the
/// federator matches on it when retaining members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Mint a fresh random ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_connection_id_display_is_uuid() {
        let id = ConnectionId::new();
        assert_eq!(id.to_string(), id.0.to_string());
        assert_eq!(id.to_string().len(), 36);
    }
}
