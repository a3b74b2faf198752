//! Branded ID newtypes for type safety.
//!
//! Every identity in the relay has a distinct ID type implemented as a
//! newtype wrapper around `String`. This prevents accidentally passing a
//! room key where a player id is expected.
//!
//! Generation differs per type: [`ConnectionId`] is a UUID v7 minted by the
//! server at accept time, [`PlayerId`] is derived from the joining address
//! plus the current time, and [`RoomId`] is always client-supplied.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create from an existing string value.
            #[must_use]
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Unique identifier for one WebSocket connection.
    ///
    /// Minted by the server at accept time; used as the Session Registry key
    /// and for log correlation. Never appears on the wire.
    ConnectionId
}

branded_id! {
    /// Unique identifier for a player, generated at join and stable for the
    /// connection's lifetime.
    PlayerId
}

branded_id! {
    /// Client-supplied room namespace key. The first join referencing an
    /// unknown `RoomId` creates the room.
    RoomId
}

impl ConnectionId {
    /// Mint a new connection ID (UUID v7, time-ordered).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerId {
    /// Derive a fresh player ID from the joining address and the current
    /// time. The random suffix keeps repeat joins by the same address
    /// distinct even within a single millisecond.
    #[must_use]
    pub fn generate(address: &str) -> Self {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let suffix = rand::random::<u32>() & 0x00ff_ffff;
        Self(format!("{address}_{now_ms}_{suffix:06x}"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
