//! WebSocket message dispatch — parses incoming text as the `{type, data}`
//! envelope and routes to the room manager.

use std::sync::Arc;

use aerie_core::{ClientMessage, RelayError, ServerMessage};
use tracing::{debug, instrument, warn};

use crate::rooms::RoomManager;
use crate::websocket::connection::ClientConnection;

/// Handle an incoming WebSocket text frame.
///
/// Malformed frames are logged and dropped; the connection stays open.
/// Operations that need a seat are dropped when the sender has not joined
/// a room. The only error ever surfaced to the client is the capacity
/// rejection on join.
#[instrument(skip_all, fields(kind))]
pub fn handle_message(message: &str, connection: &Arc<ClientConnection>, rooms: &RoomManager) {
    let parsed: ClientMessage = match serde_json::from_str(message) {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "invalid message received");
            return;
        }
    };

    let kind = message_kind(&parsed);
    let _ = tracing::Span::current().record("kind", kind);
    debug!(kind, "dispatching message");

    match parsed {
        ClientMessage::Join(data) => match rooms.join(connection, data) {
            Ok(_) => {}
            Err(err @ RelayError::RoomFull { .. }) => {
                debug!(error = %err, "rejecting join");
                let _ = connection.send_message(&ServerMessage::room_full());
            }
            Err(err) => debug!(error = %err, "join failed"),
        },
        ClientMessage::UpdatePosition(update) => {
            if let Err(err) = rooms.update_position(&connection.id, &update) {
                debug!(error = %err, "dropping position update");
            }
        }
        ClientMessage::Chat(data) => {
            if let Err(err) = rooms.chat(&connection.id, data) {
                debug!(error = %err, "dropping chat");
            }
        }
        ClientMessage::Voice(data) => {
            if let Err(err) = rooms.set_voice_activity(&connection.id, &data) {
                debug!(error = %err, "dropping voice update");
            }
        }
        ClientMessage::Attack(data) => {
            if let Err(err) = rooms.attack(&connection.id, data) {
                debug!(error = %err, "dropping attack");
            }
        }
        ClientMessage::WebrtcSignal(data) => {
            if let Err(err) = rooms.relay_signal(&connection.id, data) {
                debug!(error = %err, "dropping signal");
            }
        }
        ClientMessage::Leave => {
            let _ = rooms.leave(&connection.id);
        }
    }
}

fn message_kind(message: &ClientMessage) -> &'static str {
    match message {
        ClientMessage::Join(_) => "join",
        ClientMessage::UpdatePosition(_) => "update_position",
        ClientMessage::Chat(_) => "chat",
        ClientMessage::Voice(_) => "voice",
        ClientMessage::Attack(_) => "attack",
        ClientMessage::WebrtcSignal(_) => "webrtc_signal",
        ClientMessage::Leave => "leave",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerie_core::ConnectionId;
    use serde_json::json;
    use tokio::sync::mpsc;

    use crate::registry::SessionRegistry;

    fn make_rooms(max_players: usize) -> RoomManager {
        RoomManager::new(Arc::new(SessionRegistry::new()), max_players)
    }

    fn make_connection(id: &str) -> (Arc<ClientConnection>, mpsc::Receiver<Arc<String>>) {
        let (tx, rx) = mpsc::channel(32);
        let conn = Arc::new(ClientConnection::new(ConnectionId::from(id), tx));
        (conn, rx)
    }

    fn join_frame(room: &str) -> String {
        json!({"type": "join", "data": {"roomId": room, "address": "0xwallet"}}).to_string()
    }

    fn recv_json(rx: &mut mpsc::Receiver<Arc<String>>) -> serde_json::Value {
        let frame = rx.try_recv().expect("expected a frame");
        serde_json::from_str(&frame).unwrap()
    }

    #[tokio::test]
    async fn join_frame_is_dispatched() {
        let rooms = make_rooms(50);
        let (conn, mut rx) = make_connection("c1");

        handle_message(&join_frame("r1"), &conn, &rooms);

        let ack = recv_json(&mut rx);
        assert_eq!(ack["type"], "joined");
        assert_eq!(rooms.player_count(), 1);
    }

    #[tokio::test]
    async fn malformed_frame_is_dropped_and_connection_survives() {
        let rooms = make_rooms(50);
        let (conn, mut rx) = make_connection("c1");

        handle_message("this is not json", &conn, &rooms);
        assert!(rx.try_recv().is_err());
        assert_eq!(rooms.player_count(), 0);

        // The same connection can still join afterwards
        handle_message(&join_frame("r1"), &conn, &rooms);
        assert_eq!(recv_json(&mut rx)["type"], "joined");
    }

    #[tokio::test]
    async fn unknown_type_is_dropped() {
        let rooms = make_rooms(50);
        let (conn, mut rx) = make_connection("c1");

        let frame = json!({"type": "teleport", "data": {}}).to_string();
        handle_message(&frame, &conn, &rooms);

        assert!(rx.try_recv().is_err());
        assert_eq!(rooms.player_count(), 0);
    }

    #[tokio::test]
    async fn wrong_payload_shape_is_dropped() {
        let rooms = make_rooms(50);
        let (conn, mut rx) = make_connection("c1");
        handle_message(&join_frame("r1"), &conn, &rooms);
        let _ack = recv_json(&mut rx);

        let frame = json!({"type": "chat", "data": {"message": 123}}).to_string();
        handle_message(&frame, &conn, &rooms);
        assert!(rx.try_recv().is_err());

        // Still seated, still able to chat
        let frame = json!({"type": "chat", "data": {"message": "hello"}}).to_string();
        handle_message(&frame, &conn, &rooms);
        assert_eq!(recv_json(&mut rx)["type"], "chat");
    }

    #[tokio::test]
    async fn full_room_rejection_reaches_the_client() {
        let rooms = make_rooms(1);
        let (seated, _rx_seated) = make_connection("c1");
        handle_message(&join_frame("r1"), &seated, &rooms);

        let (conn, mut rx) = make_connection("c2");
        handle_message(&join_frame("r1"), &conn, &rooms);

        let err = recv_json(&mut rx);
        assert_eq!(err["type"], "error");
        assert_eq!(err["data"]["message"], "Room is full");
        assert_eq!(rooms.player_count(), 1);
    }

    #[tokio::test]
    async fn unseated_operations_are_ignored() {
        let rooms = make_rooms(50);
        let (conn, mut rx) = make_connection("c1");

        for frame in [
            json!({"type": "update_position", "data": {"position": {"x": 1.0, "y": 2.0, "z": 3.0}}}),
            json!({"type": "chat", "data": {"message": "into the void"}}),
            json!({"type": "voice", "data": {"isSpeaking": true}}),
            json!({"type": "attack", "data": {"weaponType": "fireball", "position": {"x": 0.0, "y": 0.0, "z": 0.0}}}),
            json!({"type": "webrtc_signal", "data": {"to": "nobody", "signal": {}}}),
            json!({"type": "leave"}),
        ] {
            handle_message(&frame.to_string(), &conn, &rooms);
        }

        assert!(rx.try_recv().is_err());
        assert_eq!(rooms.player_count(), 0);
    }

    #[tokio::test]
    async fn leave_frame_unseats_the_player() {
        let rooms = make_rooms(50);
        let (conn, mut rx) = make_connection("c1");
        handle_message(&join_frame("r1"), &conn, &rooms);
        let _ack = recv_json(&mut rx);

        handle_message(&json!({"type": "leave"}).to_string(), &conn, &rooms);

        assert_eq!(rooms.player_count(), 0);
        assert_eq!(rooms.room_count(), 0);
        // Leaving again is harmless
        handle_message(&json!({"type": "leave"}).to_string(), &conn, &rooms);
    }
}
