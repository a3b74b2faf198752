//! Relay error types.
//!
//! [`RelayError`] is returned by room operations. Only the capacity
//! rejection is ever surfaced to a client (as the `error` frame); the
//! remaining variants are logged and dropped by the session layer.

use thiserror::Error;

use crate::ids::{PlayerId, RoomId};

/// Errors that can occur while servicing a client request.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The room already holds the maximum number of players.
    #[error("room {room_id} is full")]
    RoomFull {
        /// The room that rejected the join.
        room_id: RoomId,
    },
    /// The connection has no player bound to it yet.
    #[error("connection is not bound to a room")]
    NotInRoom,
    /// A signaling target is not present in the sender's room.
    #[error("target player not found: {target}")]
    TargetNotFound {
        /// The requested recipient.
        target: PlayerId,
    },
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_full_display() {
        let err = RelayError::RoomFull {
            room_id: RoomId::from("dragon-isle"),
        };
        assert_eq!(err.to_string(), "room dragon-isle is full");
    }

    #[test]
    fn not_in_room_display() {
        assert_eq!(
            RelayError::NotInRoom.to_string(),
            "connection is not bound to a room"
        );
    }

    #[test]
    fn target_not_found_display() {
        let err = RelayError::TargetNotFound {
            target: PlayerId::from("0xabc_1_aaaaaa"),
        };
        assert_eq!(
            err.to_string(),
            "target player not found: 0xabc_1_aaaaaa"
        );
    }

    #[test]
    fn result_alias() {
        fn example() -> Result<u32> {
            Ok(7)
        }
        assert_eq!(example().unwrap(), 7);
    }
}
