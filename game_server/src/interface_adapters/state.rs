use crate::interface_adapters::net::serializer::{Snapshot, WorldFrame};
use crate::use_cases::GameEvent;
use std::path::PathBuf;
use std::sync::Arc;
use sync_protocol::GamePhase;
use tokio::sync::{broadcast, mpsc, watch};

/// Shared handles every HTTP and WebSocket handler can reach.
#[derive(Clone)]
pub struct AppState {
    // Join, leave and input events for the world task.
    pub input_tx: mpsc::Sender<GameEvent>,
    // Encoded CREATE_OR_UPDATE and DESTROY frames, one per entity change.
    pub frames_tx: broadcast::Sender<WorldFrame>,
    // Every live entity, for joiners and resync.
    pub snapshot_tx: watch::Sender<Snapshot>,
    pub phase_tx: watch::Sender<GamePhase>,
    // Root of the files served over HTTP.
    pub static_dir: Arc<PathBuf>,
}
