//! Player state and the partial-update merge rule.

use serde::{Deserialize, Serialize};

use crate::ids::PlayerId;

/// Spawn position for a freshly joined player (airborne).
pub const SPAWN_POSITION: Vec3 = Vec3 {
    x: 0.0,
    y: 10.0,
    z: 0.0,
};

/// Health assigned at spawn. Relayed to peers, never validated.
pub const SPAWN_HEALTH: f64 = 100.0;

/// Display name used when a join omits one.
pub const DEFAULT_USERNAME: &str = "Player";

/// Dragon reference used when a join omits one.
pub const DEFAULT_DRAGON_ID: &str = "0";

/// A point in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate (up).
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Vec3 {
    /// Construct from components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A view direction. Units are the client's concern; the relay never
/// interprets them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    /// Heading.
    pub yaw: f64,
    /// Elevation.
    pub pitch: f64,
}

/// One connected participant, exclusively owned by the room it joined.
///
/// Serializes with camelCase field names — this struct is the roster entry
/// sent in `joined` and the payload of `player_joined`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Stable identity for this connection, generated at join.
    pub id: PlayerId,
    /// Account identifier the client presented. Opaque to the relay.
    pub address: String,
    /// Display name shown to other players.
    pub username: String,
    /// Opaque dragon reference relayed to peers.
    pub dragon_id: String,
    /// Current world position.
    pub position: Vec3,
    /// Current view rotation.
    pub rotation: Rotation,
    /// Current health as reported by the client.
    pub health: f64,
    /// Flight flag.
    pub is_flying: bool,
    /// Voice-activity flag.
    pub is_speaking: bool,
    /// Epoch milliseconds of the most recent state update; drives eviction.
    pub last_update: i64,
}

impl Player {
    /// Create a player at the spawn defaults.
    #[must_use]
    pub fn spawn(
        id: PlayerId,
        address: String,
        username: Option<String>,
        dragon_id: Option<String>,
        now_ms: i64,
    ) -> Self {
        Self {
            id,
            address,
            username: username.unwrap_or_else(|| DEFAULT_USERNAME.to_owned()),
            dragon_id: dragon_id.unwrap_or_else(|| DEFAULT_DRAGON_ID.to_owned()),
            position: SPAWN_POSITION,
            rotation: Rotation::default(),
            health: SPAWN_HEALTH,
            is_flying: false,
            is_speaking: false,
            last_update: now_ms,
        }
    }

    /// Apply a partial update.
    ///
    /// Fields absent from `update` keep their current value; `last_update`
    /// is always restamped.
    pub fn apply_update(&mut self, update: &PlayerUpdate, now_ms: i64) {
        if let Some(position) = update.position {
            self.position = position;
        }
        if let Some(rotation) = update.rotation {
            self.rotation = rotation;
        }
        if let Some(is_flying) = update.is_flying {
            self.is_flying = is_flying;
        }
        if let Some(health) = update.health {
            self.health = health;
        }
        self.last_update = now_ms;
    }
}

/// The partial state carried by an `update_position` frame.
///
/// Every field is independently optional; an omitted field means "unchanged",
/// not "reset".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdate {
    /// New world position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
    /// New view rotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Rotation>,
    /// New flight flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_flying: Option<bool>,
    /// New health value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<f64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
