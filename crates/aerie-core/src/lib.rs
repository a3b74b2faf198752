//! # aerie-core
//!
//! Foundation types for the Aerie multiplayer relay.
//!
//! - **Branded IDs**: `ConnectionId`, `PlayerId`, `RoomId` as newtypes so a
//!   room key can never be passed where a player id is expected
//! - **Wire protocol**: the `{type, data}` envelope as tagged enums —
//!   [`ClientMessage`] inbound, [`ServerMessage`] outbound
//! - **Player state**: [`Player`] with spawn defaults and the partial-update
//!   merge rule
//! - **Errors**: [`RelayError`] via `thiserror`

#![deny(unsafe_code)]

pub mod errors;
pub mod ids;
pub mod player;
pub mod protocol;

pub use errors::RelayError;
pub use ids::{ConnectionId, PlayerId, RoomId};
pub use player::{Player, PlayerUpdate, Rotation, Vec3};
pub use protocol::{ClientMessage, ServerMessage};
