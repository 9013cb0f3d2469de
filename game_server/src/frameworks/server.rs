// Process wiring: tracing, channels, background tasks and the HTTP listener.

use crate::domain::PlayerTuning;
use crate::frameworks::config;
use crate::interface_adapters::net::serializer::{Snapshot, WorldFrame, world_update_serializer};
use crate::interface_adapters::routes::app;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{GameEvent, WorldSettings, WorldUpdate, world_task};

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use sync_protocol::GamePhase;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, watch};

/// Everything the server needs besides its listener.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub static_dir: PathBuf,
    pub world: WorldSettings,
}

impl ServerSettings {
    pub fn from_env() -> Self {
        let world = WorldSettings {
            tick_interval: config::TICK_INTERVAL,
            gameplay_countdown: config::GAMEPLAY_COUNTDOWN,
            player: PlayerTuning {
                move_speed: config::MOVE_SPEED,
                ..PlayerTuning::default()
            },
            ..WorldSettings::default()
        };
        Self {
            static_dir: config::static_dir(),
            world,
        }
    }
}

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json")) {
        subscriber.json().with_current_span(true).init();
    } else {
        subscriber.compact().init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: TcpListener) -> io::Result<()> {
    run_with_settings(listener, ServerSettings::from_env()).await
}

/// Serves until the process receives Ctrl-C.
pub async fn run_with_settings(listener: TcpListener, settings: ServerSettings) -> io::Result<()> {
    let address = listener.local_addr()?;
    tracing::info!(
        %address,
        static_dir = %settings.static_dir.display(),
        tick = ?settings.world.tick_interval,
        "game server listening"
    );

    let router = app(spawn_world(settings));
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "server stopped with error"))
}

pub async fn run_with_config() -> io::Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));
    let listener = TcpListener::bind(address)
        .await
        .inspect_err(|e| tracing::error!(%address, error = %e, "failed to bind"))?;

    run(listener).await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown requested"),
        Err(e) => {
            // Without a signal handler, serve until the process is killed.
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}

// One world task feeds one serializer; every connection subscribes to the
// serializer's frames and the phase watch.
fn spawn_world(settings: ServerSettings) -> Arc<AppState> {
    let (input_tx, input_rx) = mpsc::channel::<GameEvent>(config::INPUT_CHANNEL_CAPACITY);
    let (world_tx, _) = broadcast::channel::<WorldUpdate>(config::WORLD_BROADCAST_CAPACITY);
    let (frames_tx, _) = broadcast::channel::<WorldFrame>(config::WORLD_BROADCAST_CAPACITY);
    let (snapshot_tx, _) = watch::channel::<Snapshot>(Arc::from(Vec::new()));
    let (phase_tx, _) = watch::channel(GamePhase::Lobby);

    // Subscribe before the world starts so the first update is serialized.
    tokio::spawn(world_update_serializer(
        world_tx.subscribe(),
        frames_tx.clone(),
        snapshot_tx.clone(),
    ));
    tokio::spawn(world_task(
        input_rx,
        world_tx,
        phase_tx.clone(),
        settings.world,
    ));

    Arc::new(AppState {
        input_tx,
        frames_tx,
        snapshot_tx,
        phase_tx,
        static_dir: Arc::new(settings.static_dir),
    })
}
