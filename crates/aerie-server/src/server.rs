//! `AerieServer` — axum HTTP listener with the WebSocket relay endpoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use aerie_core::ConnectionId;

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::registry::SessionRegistry;
use crate::rooms::RoomManager;
use crate::shutdown::ShutdownCoordinator;
use crate::sweeper::run_sweeper;
use crate::websocket::session::run_ws_session;

/// One-line banner served on `GET /`.
const BANNER: &str = "Aerie Multiplayer Server\n";

/// Shared state accessible from axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Room membership and relay fan-out.
    pub rooms: Arc<RoomManager>,
    /// Connection-to-seat bindings.
    pub registry: Arc<SessionRegistry>,
    /// Live WebSocket sockets, joined or not.
    pub connections: Arc<AtomicUsize>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
}

/// The relay server.
pub struct AerieServer {
    config: ServerConfig,
    rooms: Arc<RoomManager>,
    registry: Arc<SessionRegistry>,
    connections: Arc<AtomicUsize>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl AerieServer {
    /// Create a new server.
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let rooms = Arc::new(RoomManager::new(registry.clone(), config.max_players));
        Self {
            config,
            rooms,
            registry,
            connections: Arc::new(AtomicUsize::new(0)),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
        }
    }

    /// Build the axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            rooms: self.rooms.clone(),
            registry: self.registry.clone(),
            connections: self.connections.clone(),
            shutdown: self.shutdown.clone(),
            start_time: self.start_time,
        };

        Router::new()
            .route("/", get(banner_handler))
            .route("/health", get(health_handler))
            .route("/ws", get(ws_handler))
            .with_state(state)
    }

    /// Bind the listener and start serving.
    ///
    /// Returns the bound address (resolves port `0` to the assigned port)
    /// and the serve task handle. The liveness sweeper and the periodic
    /// stats task are spawned alongside the accept loop; all of them stop
    /// when the shutdown coordinator fires, and the returned handle resolves
    /// once they have drained.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;

        let token = self.shutdown.token();
        let sweeper = tokio::spawn(run_sweeper(
            self.rooms.clone(),
            self.config.sweep_interval(),
            self.config.player_timeout(),
            token.clone(),
        ));
        let stats = tokio::spawn(run_stats(
            self.rooms.clone(),
            self.connections.clone(),
            self.config.stats_interval(),
            token.clone(),
        ));

        let router = self.router();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(error) = serve.await {
                error!(%error, "server error");
            }
            let _ = sweeper.await;
            let _ = stats.await;
        });

        info!(addr = %local_addr, "relay listening");
        Ok((local_addr, handle))
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the room manager.
    pub fn rooms(&self) -> &Arc<RoomManager> {
        &self.rooms
    }

    /// Get the session registry.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }
}

/// GET /
async fn banner_handler() -> &'static str {
    BANNER
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let resp = health::health_check(
        state.start_time,
        state.connections.load(Ordering::Relaxed),
        state.rooms.room_count(),
        state.rooms.player_count(),
    );
    Json(resp)
}

/// GET /ws — WebSocket upgrade.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Run a relay session on a freshly upgraded socket.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = ConnectionId::new();
    let _ = state.connections.fetch_add(1, Ordering::Relaxed);
    run_ws_session(
        socket,
        connection_id,
        state.rooms.clone(),
        state.shutdown.token(),
    )
    .await;
    let _ = state.connections.fetch_sub(1, Ordering::Relaxed);
}

/// Periodically log room/player/connection totals.
async fn run_stats(
    rooms: Arc<RoomManager>,
    connections: Arc<AtomicUsize>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut stats_interval = time::interval(period);
    // Skip the immediate first tick
    let _ = stats_interval.tick().await;

    loop {
        tokio::select! {
            _ = stats_interval.tick() => {
                info!(
                    rooms = rooms.room_count(),
                    players = rooms.player_count(),
                    connections = connections.load(Ordering::Relaxed),
                    "relay stats"
                );
            }
            () = cancel.cancelled() => {
                return;
            }
        }
    }
}
