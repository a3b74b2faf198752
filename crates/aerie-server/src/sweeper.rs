//! Liveness sweeping — evicts players whose position updates stopped.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::rooms::RoomManager;

/// Periodically evict players whose last update is older than `timeout`.
///
/// Runs until `cancel` fires. Eviction takes the same path as an explicit
/// departure: remaining players receive `player_left` and rooms that empty
/// out are deleted. The evicted player's socket stays open; only their seat
/// is reclaimed.
pub async fn run_sweeper(
    rooms: Arc<RoomManager>,
    interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
) {
    let mut sweep_interval = time::interval(interval);
    // Skip the immediate first tick
    let _ = sweep_interval.tick().await;

    loop {
        tokio::select! {
            _ = sweep_interval.tick() => {
                let evicted = rooms.sweep(timeout);
                if evicted > 0 {
                    info!(evicted, "sweep removed inactive players");
                }
            }
            () = cancel.cancelled() => {
                return;
            }
        }
    }
}
