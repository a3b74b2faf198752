//! # aerie-server
//!
//! Axum HTTP + `WebSocket` relay server for multiplayer rooms.
//!
//! - HTTP endpoints: service banner, health check
//! - `WebSocket` gateway: session lifecycle, envelope dispatch, keepalive pings
//! - Room manager: membership, capacity, broadcast fan-out with exclusion
//! - Session registry mapping live connections to `(player, room)` bindings
//! - Liveness sweeper evicting players whose position updates stopped
//! - Graceful shutdown via `tokio::signal` + `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod registry;
pub mod rooms;
pub mod server;
pub mod shutdown;
pub mod sweeper;
pub mod websocket;

pub use config::ServerConfig;
pub use registry::{SessionBinding, SessionRegistry};
pub use rooms::RoomManager;
pub use server::AerieServer;
pub use shutdown::ShutdownCoordinator;
