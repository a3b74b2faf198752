//! WebSocket connection management, session lifecycle, and message dispatch.

pub mod connection;
pub mod handler;
pub mod session;
