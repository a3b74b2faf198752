//! WebSocket session lifecycle — handles a single connected client from
//! upgrade through disconnect.

use std::sync::Arc;
use std::time::Duration;

use aerie_core::ConnectionId;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::rooms::RoomManager;

use super::connection::ClientConnection;
use super::handler::handle_message;

/// Interval between server-initiated Ping frames.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Outbound queue depth per connection. A client whose socket cannot keep
/// up loses frames beyond this backlog instead of stalling broadcasts.
const OUTBOUND_BUFFER: usize = 1024;

/// How long to let the outbound task flush before aborting it.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Run a WebSocket session for a connected client.
///
/// 1. Dispatches incoming frames through the message handler
/// 2. Forwards queued outbound frames to the socket
/// 3. Sends periodic Ping frames to keep intermediaries from idling out
/// 4. On shutdown, pushes a Close frame to the client
/// 5. Releases the player's seat on disconnect
#[instrument(skip_all, fields(connection_id = %connection_id))]
pub async fn run_ws_session(
    ws: WebSocket,
    connection_id: ConnectionId,
    rooms: Arc<RoomManager>,
    shutdown: CancellationToken,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    let (send_tx, mut send_rx) = mpsc::channel::<Arc<String>>(OUTBOUND_BUFFER);
    let connection = Arc::new(ClientConnection::new(connection_id, send_tx));

    info!("client connected");

    // Spawn outbound forwarder with periodic Ping frames.
    let outbound_shutdown = shutdown.clone();
    let mut outbound = tokio::spawn(async move {
        let mut ping_interval = tokio::time::interval(PING_INTERVAL);
        // Skip the immediate first tick
        let _ = ping_interval.tick().await;

        loop {
            tokio::select! {
                msg = send_rx.recv() => {
                    match msg {
                        Some(text) => {
                            if ws_tx.send(Message::Text((*text).clone().into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ping_interval.tick() => {
                    if ws_tx.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
                () = outbound_shutdown.cancelled() => {
                    // Close the client before exiting
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    // Process incoming messages until the socket ends or shutdown begins
    loop {
        tokio::select! {
            maybe_msg = ws_rx.next() => {
                let Some(Ok(msg)) = maybe_msg else { break };
                let text = match msg {
                    Message::Text(ref t) => Some(t.to_string()),
                    Message::Binary(ref data) => {
                        // Some clients send JSON as binary frames
                        if let Ok(s) = std::str::from_utf8(data) {
                            Some(s.to_owned())
                        } else {
                            debug!(len = data.len(), "dropping non-UTF8 binary frame");
                            None
                        }
                    }
                    Message::Close(_) => {
                        info!("client sent close frame");
                        break;
                    }
                    Message::Ping(_) | Message::Pong(_) => None,
                };
                if let Some(text) = text {
                    handle_message(&text, &connection, &rooms);
                }
            }
            () = shutdown.cancelled() => {
                debug!("shutdown requested, ending session");
                break;
            }
        }
    }

    // Clean up
    if let Some(player_id) = rooms.leave(&connection.id) {
        debug!(player_id = %player_id, "seat released on disconnect");
    }
    let dropped = connection.drop_count();
    if dropped > 0 {
        warn!(dropped, "outbound frames were dropped for this connection");
    }
    info!("client disconnected");

    // Dropping the last sender ends the forwarder; give it a moment to
    // flush any Close frame, then abort.
    drop(connection);
    if tokio::time::timeout(CLOSE_GRACE, &mut outbound).await.is_err() {
        outbound.abort();
    }
}
