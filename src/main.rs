//! Arena Server - authoritative multiplayer arena simulation
//!
//! Entry point: loads configuration, starts the room manager and serves the
//! admin HTTP surface until a shutdown signal arrives.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_server::app::AppState;
use arena_server::config::Config;
use arena_server::game::{GameMode, RoomManager, WorldSnapshot};
use arena_server::http::build_router;
use arena_server::util::time::init_server_time;

const REAP_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    init_tracing(&config.log_level);
    init_server_time();

    info!("Starting Arena Server");
    info!(
        tick_rate = config.room.tick_rate,
        max_rooms = config.max_rooms,
        max_players = config.room.max_players,
        "Room settings loaded"
    );

    let state = AppState::new(config.clone());

    if config.demo_bots > 0 {
        spawn_demo_room(&state.rooms, config.demo_bots)?;
    }

    // Deregister finished rooms
    let reaper_rooms = state.rooms.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(REAP_INTERVAL);
        loop {
            ticker.tick().await;
            let reaped = reaper_rooms.reap_finished();
            if reaped > 0 {
                info!(reaped, active_rooms = reaper_rooms.active_rooms(), "Reaped finished rooms");
            }
        }
    });

    let rooms = state.rooms.clone();
    let router = build_router(state);

    let addr: SocketAddr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Admin server listening on {}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    rooms.shutdown();
    info!("Server shutdown complete");
    Ok(())
}

/// Start a bots-only room whose snapshots are logged at debug level
fn spawn_demo_room(rooms: &RoomManager, bots: usize) -> anyhow::Result<()> {
    let room = rooms.create_room(GameMode::FreeForAll, "outpost")?;

    let (snapshot_tx, mut snapshot_rx) = broadcast::channel::<WorldSnapshot>(64);
    room.set_snapshot_sink(snapshot_tx);
    room.spawn_bots(bots);
    room.start()?;

    let room_id = room.id();
    tokio::spawn(async move {
        loop {
            match snapshot_rx.recv().await {
                Ok(snapshot) => debug!(
                    room_id = %room_id,
                    tick = snapshot.tick,
                    state = ?snapshot.state,
                    events = snapshot.events.len(),
                    "Demo snapshot"
                ),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(room_id = %room_id, skipped, "Demo snapshot consumer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    info!(room_id = %room_id, bots, "Demo room started");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
