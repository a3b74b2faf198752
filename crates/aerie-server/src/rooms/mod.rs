//! Room lifecycle and relay operations.
//!
//! [`RoomManager`] owns every room behind one `parking_lot::RwLock`; an
//! operation takes the lock once and completes under it, so capacity checks,
//! state merges, and the broadcasts they trigger observe a consistent
//! membership. Nothing awaits while a lock is held and all sends are
//! non-blocking.

pub mod room;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use aerie_core::errors::Result;
use aerie_core::protocol::{
    AttackBroadcast, AttackData, ChatBroadcast, ChatData, JoinData, JoinedData, PlayerLeftData,
    PlayerUpdateData, SignalData, SignalRelay, VoiceData, VoiceUpdateData,
};
use aerie_core::{ConnectionId, Player, PlayerId, PlayerUpdate, RelayError, RoomId, ServerMessage};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::registry::{SessionBinding, SessionRegistry};
use crate::websocket::connection::ClientConnection;

pub use room::{Room, RoomMember};

/// Owns all rooms and executes every relay operation against them.
pub struct RoomManager {
    rooms: RwLock<HashMap<RoomId, Room>>,
    registry: Arc<SessionRegistry>,
    max_players: usize,
}

impl RoomManager {
    /// Create a manager with the given per-room player cap.
    ///
    /// A cap below 1 is raised to 1 so a newly created room can always seat
    /// its creator.
    pub fn new(registry: Arc<SessionRegistry>, max_players: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            registry,
            max_players: max_players.max(1),
        }
    }

    /// Seat a connection in a room, creating the room on first reference.
    ///
    /// On success the joiner receives a `joined` roster including themself,
    /// everyone already seated receives `player_joined`, and the connection
    /// is bound in the session registry. A connection may only occupy one
    /// seat; a join while already seated vacates the old seat. A full room
    /// rejects the join before anything is vacated or inserted, so the
    /// caller's current seat survives the rejection. A member rejoining the
    /// room it already occupies is admitted even at capacity, since its own
    /// seat is the one being replaced.
    pub fn join(&self, connection: &Arc<ClientConnection>, data: JoinData) -> Result<PlayerId> {
        let JoinData {
            room_id,
            address,
            username,
            dragon_id,
        } = data;
        let now = now_ms();
        let player_id = PlayerId::generate(&address);
        let player = Player::spawn(player_id.clone(), address, username, dragon_id, now);

        let mut rooms = self.rooms.write();
        // Capacity is checked before any state changes. The caller's own
        // seat in the target room does not count against capacity.
        let prior = self.registry.lookup(&connection.id);
        if let Some(room) = rooms.get(&room_id) {
            let rejoining = prior
                .as_ref()
                .is_some_and(|b| b.room_id == room_id && room.contains(&b.player_id));
            if room.len() - usize::from(rejoining) >= self.max_players {
                return Err(RelayError::RoomFull { room_id });
            }
        }
        if let Some(binding) = self.registry.unbind(&connection.id) {
            let _ = Self::remove_seat(&mut rooms, binding);
        }

        let room = rooms.entry(room_id.clone()).or_insert_with(|| {
            info!(room_id = %room_id, "created room");
            Room::new(room_id.clone(), now)
        });
        room.insert(player.clone(), connection.clone());
        self.registry
            .bind(connection.id.clone(), player_id.clone(), room_id.clone());

        if !connection.send_message(&ServerMessage::Joined(JoinedData {
            player_id: player_id.clone(),
            players: room.roster(),
        })) {
            warn!(player_id = %player_id, "failed to send join acknowledgement");
        }
        room.broadcast(&ServerMessage::PlayerJoined(player), Some(&player_id));
        info!(player_id = %player_id, room_id = %room_id, players = room.len(), "player joined");
        Ok(player_id)
    }

    /// Merge a positional update into the sender's state and broadcast the
    /// merged result to everyone else in the room.
    ///
    /// This is the only operation besides join that refreshes the sender's
    /// liveness stamp.
    pub fn update_position(
        &self,
        connection_id: &ConnectionId,
        update: &PlayerUpdate,
    ) -> Result<()> {
        let binding = self
            .registry
            .lookup(connection_id)
            .ok_or(RelayError::NotInRoom)?;
        let now = now_ms();
        let mut rooms = self.rooms.write();
        let room = rooms
            .get_mut(&binding.room_id)
            .ok_or(RelayError::NotInRoom)?;
        let Some(player) = room.player_mut(&binding.player_id) else {
            return Err(RelayError::NotInRoom);
        };
        player.apply_update(update, now);
        let message = ServerMessage::PlayerUpdate(PlayerUpdateData {
            player_id: binding.player_id.clone(),
            position: player.position,
            rotation: player.rotation,
            is_flying: player.is_flying,
            health: player.health,
        });
        room.broadcast(&message, Some(&binding.player_id));
        Ok(())
    }

    /// Relay a chat line to the whole room, the sender included.
    pub fn chat(&self, connection_id: &ConnectionId, data: ChatData) -> Result<()> {
        let binding = self
            .registry
            .lookup(connection_id)
            .ok_or(RelayError::NotInRoom)?;
        let now = now_ms();
        let rooms = self.rooms.read();
        let room = rooms.get(&binding.room_id).ok_or(RelayError::NotInRoom)?;
        let username = room
            .player(&binding.player_id)
            .ok_or(RelayError::NotInRoom)?
            .username
            .clone();
        room.broadcast(
            &ServerMessage::Chat(ChatBroadcast {
                player_id: binding.player_id,
                username,
                message: data.message,
                timestamp: now,
            }),
            None,
        );
        Ok(())
    }

    /// Record whether the sender is speaking and tell everyone else.
    ///
    /// Speaking state does not count as activity for the liveness sweep.
    pub fn set_voice_activity(&self, connection_id: &ConnectionId, data: &VoiceData) -> Result<()> {
        let binding = self
            .registry
            .lookup(connection_id)
            .ok_or(RelayError::NotInRoom)?;
        let mut rooms = self.rooms.write();
        let room = rooms
            .get_mut(&binding.room_id)
            .ok_or(RelayError::NotInRoom)?;
        let Some(player) = room.player_mut(&binding.player_id) else {
            return Err(RelayError::NotInRoom);
        };
        player.is_speaking = data.is_speaking;
        room.broadcast(
            &ServerMessage::VoiceUpdate(VoiceUpdateData {
                player_id: binding.player_id.clone(),
                is_speaking: data.is_speaking,
            }),
            Some(&binding.player_id),
        );
        Ok(())
    }

    /// Broadcast an attack event to everyone except the attacker.
    ///
    /// The relay does not resolve hits; recipients apply their own damage
    /// locally.
    pub fn attack(&self, connection_id: &ConnectionId, data: AttackData) -> Result<()> {
        let binding = self
            .registry
            .lookup(connection_id)
            .ok_or(RelayError::NotInRoom)?;
        let rooms = self.rooms.read();
        let room = rooms.get(&binding.room_id).ok_or(RelayError::NotInRoom)?;
        if !room.contains(&binding.player_id) {
            return Err(RelayError::NotInRoom);
        }
        room.broadcast(
            &ServerMessage::PlayerAttack(AttackBroadcast {
                player_id: binding.player_id.clone(),
                weapon_type: data.weapon_type,
                position: data.position,
            }),
            Some(&binding.player_id),
        );
        Ok(())
    }

    /// Forward an opaque WebRTC signaling payload to one player in the
    /// sender's room, stamped with the sender's identity.
    pub fn relay_signal(&self, connection_id: &ConnectionId, data: SignalData) -> Result<()> {
        let binding = self
            .registry
            .lookup(connection_id)
            .ok_or(RelayError::NotInRoom)?;
        let SignalData { to, signal } = data;
        let rooms = self.rooms.read();
        let room = rooms.get(&binding.room_id).ok_or(RelayError::NotInRoom)?;
        let delivered = room.send_to(
            &to,
            &ServerMessage::WebrtcSignal(SignalRelay {
                from: binding.player_id,
                signal,
            }),
        );
        if delivered {
            Ok(())
        } else {
            Err(RelayError::TargetNotFound { target: to })
        }
    }

    /// Unseat a connection's player, notify the remaining room, and delete
    /// the room if it emptied.
    ///
    /// Returns the departed player's id, or `None` if the connection was
    /// not seated. Safe to call any number of times; the socket itself is
    /// left open.
    pub fn leave(&self, connection_id: &ConnectionId) -> Option<PlayerId> {
        let binding = self.registry.unbind(connection_id)?;
        let mut rooms = self.rooms.write();
        Some(Self::remove_seat(&mut rooms, binding))
    }

    /// Remove a bound seat from the room map, notify the remaining room,
    /// and delete the room if it emptied. Operates on an already-held
    /// write guard so `join` can vacate the old seat without reacquiring
    /// the lock.
    fn remove_seat(rooms: &mut HashMap<RoomId, Room>, binding: SessionBinding) -> PlayerId {
        let Some(room) = rooms.get_mut(&binding.room_id) else {
            return binding.player_id;
        };
        if room.remove(&binding.player_id).is_some() {
            room.broadcast(
                &ServerMessage::PlayerLeft(PlayerLeftData {
                    player_id: binding.player_id.clone(),
                }),
                None,
            );
            info!(
                player_id = %binding.player_id,
                room_id = %binding.room_id,
                players = room.len(),
                "player left"
            );
        }
        if room.is_empty() {
            let _ = rooms.remove(&binding.room_id);
            info!(room_id = %binding.room_id, "deleted empty room");
        }
        binding.player_id
    }

    /// Evict every player whose last update is strictly older than
    /// `timeout`, notifying their rooms and deleting any room that empties.
    ///
    /// Returns the number of players evicted.
    pub fn sweep(&self, timeout: Duration) -> usize {
        let now = now_ms();
        let mut rooms = self.rooms.write();
        let mut evicted = 0usize;
        let mut emptied = Vec::new();
        for (room_id, room) in rooms.iter_mut() {
            for player_id in room.stale_player_ids(now, timeout) {
                if let Some(seat) = room.remove(&player_id) {
                    let _ = self.registry.unbind(&seat.connection.id);
                    room.broadcast(
                        &ServerMessage::PlayerLeft(PlayerLeftData {
                            player_id: player_id.clone(),
                        }),
                        None,
                    );
                    info!(player_id = %player_id, room_id = %room_id, "evicted inactive player");
                    evicted += 1;
                }
            }
            if room.is_empty() {
                emptied.push(room_id.clone());
            }
        }
        for room_id in emptied {
            let _ = rooms.remove(&room_id);
            info!(room_id = %room_id, "deleted empty room");
        }
        evicted
    }

    /// Number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }

    /// Players across all rooms.
    pub fn player_count(&self) -> usize {
        self.rooms.read().values().map(Room::len).sum()
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
