//! A single room: player seats plus broadcast fan-out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use aerie_core::{Player, PlayerId, RoomId, ServerMessage};
use tracing::warn;

use crate::websocket::connection::ClientConnection;

/// One player's seat in a room: relayed state plus the transport handle
/// used to reach them.
pub struct RoomMember {
    /// Last known player state.
    pub player: Player,
    /// Transport handle for outbound frames.
    pub connection: Arc<ClientConnection>,
}

/// A room full of players.
///
/// Rooms are created on first join and deleted when the last player leaves,
/// so an empty `Room` never outlives the operation that emptied it.
pub struct Room {
    id: RoomId,
    members: HashMap<PlayerId, RoomMember>,
    created_at: i64,
}

impl Room {
    /// Create an empty room.
    pub fn new(id: RoomId, now_ms: i64) -> Self {
        Self {
            id,
            members: HashMap::new(),
            created_at: now_ms,
        }
    }

    /// Room key.
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Epoch-millisecond creation time.
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Current player count.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the room has no players.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether a player is seated here.
    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.members.contains_key(player_id)
    }

    /// Seat a player.
    pub fn insert(&mut self, player: Player, connection: Arc<ClientConnection>) {
        let id = player.id.clone();
        let _ = self.members.insert(id, RoomMember { player, connection });
    }

    /// Remove a player, returning their seat if present.
    pub fn remove(&mut self, player_id: &PlayerId) -> Option<RoomMember> {
        self.members.remove(player_id)
    }

    /// Immutable view of a player's state.
    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.members.get(player_id).map(|m| &m.player)
    }

    /// Mutable view of a player's state.
    pub fn player_mut(&mut self, player_id: &PlayerId) -> Option<&mut Player> {
        self.members.get_mut(player_id).map(|m| &mut m.player)
    }

    /// Snapshot of every player in the room, for join rosters.
    pub fn roster(&self) -> Vec<Player> {
        self.members.values().map(|m| m.player.clone()).collect()
    }

    /// Send a message to every member, optionally excluding one player.
    ///
    /// The message is serialized once and the same frame fans out to all
    /// recipients. Members whose outbound queue is full or closed are
    /// skipped; only the disconnect path removes a member, never this one.
    pub fn broadcast(&self, message: &ServerMessage, exclude: Option<&PlayerId>) {
        let json = match serde_json::to_string(message) {
            Ok(j) => Arc::new(j),
            Err(e) => {
                warn!(room_id = %self.id, error = %e, "failed to serialize broadcast");
                return;
            }
        };
        for member in self.members.values() {
            if exclude == Some(&member.player.id) {
                continue;
            }
            if !member.connection.send(json.clone()) {
                warn!(
                    room_id = %self.id,
                    player_id = %member.player.id,
                    "failed to send frame to player"
                );
            }
        }
    }

    /// Send a message to a single member.
    ///
    /// Returns `false` when the target is not seated here or their queue
    /// rejected the frame.
    pub fn send_to(&self, target: &PlayerId, message: &ServerMessage) -> bool {
        let Some(member) = self.members.get(target) else {
            return false;
        };
        member.connection.send_message(message)
    }

    /// Players whose last update is strictly older than `timeout`.
    pub fn stale_player_ids(&self, now_ms: i64, timeout: Duration) -> Vec<PlayerId> {
        let timeout_ms = i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX);
        self.members
            .values()
            .filter(|m| now_ms - m.player.last_update > timeout_ms)
            .map(|m| m.player.id.clone())
            .collect()
    }
}
