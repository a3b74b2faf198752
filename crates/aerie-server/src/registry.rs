//! Session registry mapping live connections to their room membership.

use std::collections::HashMap;

use aerie_core::{ConnectionId, PlayerId, RoomId};
use parking_lot::RwLock;

/// What a connection resolved to after a successful join.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionBinding {
    /// Player identity minted at join.
    pub player_id: PlayerId,
    /// Room the player lives in.
    pub room_id: RoomId,
}

/// Maps each live WebSocket connection to its `(player, room)` binding.
///
/// Inbound frames carry no identity, so the registry is the sole source of
/// truth for who a connection is. A connection that has not joined a room
/// has no entry; a second join replaces the first binding.
pub struct SessionRegistry {
    bindings: RwLock<HashMap<ConnectionId, SessionBinding>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            bindings: RwLock::new(HashMap::new()),
        }
    }

    /// Bind a connection to a player and room, replacing any prior binding.
    pub fn bind(&self, connection_id: ConnectionId, player_id: PlayerId, room_id: RoomId) {
        let binding = SessionBinding { player_id, room_id };
        let _ = self.bindings.write().insert(connection_id, binding);
    }

    /// Resolve a connection to its current binding.
    pub fn lookup(&self, connection_id: &ConnectionId) -> Option<SessionBinding> {
        self.bindings.read().get(connection_id).cloned()
    }

    /// Remove a connection's binding, returning it if one existed.
    pub fn unbind(&self, connection_id: &ConnectionId) -> Option<SessionBinding> {
        self.bindings.write().remove(connection_id)
    }

    /// Number of bound connections.
    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    /// Whether no connections are bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.read().is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(player: &str, room: &str) -> (PlayerId, RoomId) {
        (PlayerId::from(player), RoomId::from(room))
    }

    #[test]
    fn starts_empty() {
        let registry = SessionRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn bind_then_lookup() {
        let registry = SessionRegistry::new();
        let conn = ConnectionId::new();
        let (player, room) = binding("p1", "r1");

        registry.bind(conn.clone(), player.clone(), room.clone());

        let found = registry.lookup(&conn).unwrap();
        assert_eq!(found.player_id, player);
        assert_eq!(found.room_id, room);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookup_unknown_connection() {
        let registry = SessionRegistry::new();
        assert!(registry.lookup(&ConnectionId::new()).is_none());
    }

    #[test]
    fn rebind_replaces_prior_binding() {
        let registry = SessionRegistry::new();
        let conn = ConnectionId::new();
        registry.bind(conn.clone(), PlayerId::from("p1"), RoomId::from("r1"));
        registry.bind(conn.clone(), PlayerId::from("p2"), RoomId::from("r2"));

        let found = registry.lookup(&conn).unwrap();
        assert_eq!(found.player_id, PlayerId::from("p2"));
        assert_eq!(found.room_id, RoomId::from("r2"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unbind_returns_binding() {
        let registry = SessionRegistry::new();
        let conn = ConnectionId::new();
        registry.bind(conn.clone(), PlayerId::from("p1"), RoomId::from("r1"));

        let removed = registry.unbind(&conn).unwrap();
        assert_eq!(removed.player_id, PlayerId::from("p1"));
        assert!(registry.is_empty());
    }

    #[test]
    fn unbind_is_idempotent() {
        let registry = SessionRegistry::new();
        let conn = ConnectionId::new();
        registry.bind(conn.clone(), PlayerId::from("p1"), RoomId::from("r1"));

        assert!(registry.unbind(&conn).is_some());
        assert!(registry.unbind(&conn).is_none());
    }

    #[test]
    fn bindings_are_per_connection() {
        let registry = SessionRegistry::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        registry.bind(a.clone(), PlayerId::from("pa"), RoomId::from("r1"));
        registry.bind(b.clone(), PlayerId::from("pb"), RoomId::from("r1"));

        assert_eq!(registry.lookup(&a).unwrap().player_id, PlayerId::from("pa"));
        assert_eq!(registry.lookup(&b).unwrap().player_id, PlayerId::from("pb"));
        assert_eq!(registry.len(), 2);
    }
}
