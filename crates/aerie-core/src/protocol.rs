//! Wire protocol — the `{type, data}` JSON envelope in both directions.
//!
//! Inbound frames parse into [`ClientMessage`]; a payload that does not
//! match its tag's shape is rejected, not coerced. Outbound frames are
//! built as [`ServerMessage`] and serialized once per broadcast.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{PlayerId, RoomId};
use crate::player::{Player, PlayerUpdate, Rotation, Vec3};

// ─────────────────────────────────────────────────────────────────────────────
// Inbound
// ─────────────────────────────────────────────────────────────────────────────

/// Messages accepted from clients.
///
/// `update_position` and `voice` also accept the alternate tags
/// (`player_update`, `voice_update`) that live clients still send.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    /// Enter a room, creating it on first reference.
    #[serde(rename = "join")]
    Join(JoinData),

    /// Partial state update; broadcast to the room excluding the sender.
    #[serde(rename = "update_position", alias = "player_update")]
    UpdatePosition(PlayerUpdate),

    /// Chat line; echoed to the whole room including the sender.
    #[serde(rename = "chat")]
    Chat(ChatData),

    /// Voice-activity change; broadcast excluding the sender.
    #[serde(rename = "voice", alias = "voice_update")]
    Voice(VoiceData),

    /// Attack animation event; broadcast excluding the sender.
    #[serde(rename = "attack")]
    Attack(AttackData),

    /// Opaque signaling payload forwarded to exactly one peer.
    #[serde(rename = "webrtc_signal")]
    WebrtcSignal(SignalData),

    /// Explicit exit; equivalent to closing the socket.
    #[serde(rename = "leave")]
    Leave,
}

/// `join` payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinData {
    /// Room to enter; acts as a namespace key.
    pub room_id: RoomId,
    /// Account identifier; opaque to the relay.
    pub address: String,
    /// Display name. Server fills a default when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Dragon reference. Server fills a default when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dragon_id: Option<String>,
}

/// `chat` payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatData {
    /// The chat line, relayed verbatim.
    pub message: String,
}

/// `voice` payload.
///
/// Clients also echo their own `playerId` here; extra fields are ignored —
/// the sender's identity always comes from the Session Registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceData {
    /// Whether the sender is currently speaking.
    pub is_speaking: bool,
}

/// `attack` payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackData {
    /// Weapon/animation identifier; opaque to the relay.
    pub weapon_type: String,
    /// Where the attack happened.
    pub position: Vec3,
}

/// `webrtc_signal` payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalData {
    /// Target player within the sender's room.
    pub to: PlayerId,
    /// Opaque SDP/ICE payload, relayed without interpretation.
    pub signal: Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// Outbound
// ─────────────────────────────────────────────────────────────────────────────

/// Messages sent to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    /// Join acknowledgment carrying the full roster, joiner included.
    #[serde(rename = "joined")]
    Joined(JoinedData),

    /// A new player entered the room. Sent to everyone else.
    #[serde(rename = "player_joined")]
    PlayerJoined(Player),

    /// A player's merged current state after an update.
    #[serde(rename = "player_update")]
    PlayerUpdate(PlayerUpdateData),

    /// Chat line.
    #[serde(rename = "chat")]
    Chat(ChatBroadcast),

    /// Voice-activity change.
    #[serde(rename = "voice_update")]
    VoiceUpdate(VoiceUpdateData),

    /// Attack animation event.
    #[serde(rename = "player_attack")]
    PlayerAttack(AttackBroadcast),

    /// Relayed signaling payload, delivered to exactly one connection.
    #[serde(rename = "webrtc_signal")]
    WebrtcSignal(SignalRelay),

    /// A player left, disconnected, or timed out.
    #[serde(rename = "player_left")]
    PlayerLeft(PlayerLeftData),

    /// Request-scoped failure. Today only capacity rejection reaches the
    /// wire; everything else is dropped or logged.
    #[serde(rename = "error")]
    Error(ErrorData),
}

/// `joined` payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedData {
    /// The id assigned to the joiner.
    pub player_id: PlayerId,
    /// Everyone currently in the room, the joiner included.
    pub players: Vec<Player>,
}

/// `player_update` payload — the post-merge state, not the delta.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdateData {
    /// Whose state changed.
    pub player_id: PlayerId,
    /// Current position.
    pub position: Vec3,
    /// Current rotation.
    pub rotation: Rotation,
    /// Current flight flag.
    pub is_flying: bool,
    /// Current health.
    pub health: f64,
}

/// `chat` payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBroadcast {
    /// Who spoke.
    pub player_id: PlayerId,
    /// Their display name at send time.
    pub username: String,
    /// The chat line.
    pub message: String,
    /// Server receipt time, epoch milliseconds.
    pub timestamp: i64,
}

/// `voice_update` payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceUpdateData {
    /// Whose flag changed.
    pub player_id: PlayerId,
    /// The new value.
    pub is_speaking: bool,
}

/// `player_attack` payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackBroadcast {
    /// Who attacked.
    pub player_id: PlayerId,
    /// Weapon/animation identifier.
    pub weapon_type: String,
    /// Where the attack happened.
    pub position: Vec3,
}

/// `webrtc_signal` payload as delivered to the target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRelay {
    /// The sending player.
    pub from: PlayerId,
    /// The payload, verbatim from the sender.
    pub signal: Value,
}

/// `player_left` payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLeftData {
    /// Who is gone.
    pub player_id: PlayerId,
}

/// `error` payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    /// Human-readable description.
    pub message: String,
}

impl ServerMessage {
    /// The capacity-rejection frame sent to a join that found the room full.
    #[must_use]
    pub fn room_full() -> Self {
        Self::Error(ErrorData {
            message: "Room is full".to_owned(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
