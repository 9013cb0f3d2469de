use crate::interface_adapters::http::error_response;
use crate::interface_adapters::net::serializer::{EntityFrame, Snapshot, WorldFrame};
use crate::interface_adapters::state::AppState;
use crate::use_cases::GameEvent;

use axum::{
    extract::{
        Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::SinkExt;
use std::{
    collections::BTreeSet,
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};
use sync_protocol::{
    ClientEventType, ClientRole, EntityId, GamePhase, ProtocolError, ServerMessage,
    decode_client_message, encode_server_message,
};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{Instrument, debug, info, info_span, warn};

// Frames that fail to decode before the connection is closed with POLICY.
const MAX_INVALID_MESSAGES: u32 = 10;
// Minimum gap between repeated warnings of the same kind on one connection.
const LOG_THROTTLE: Duration = Duration::from_secs(2);

#[derive(Debug)]
enum NetError {
    Ws(axum::Error),
    Protocol(ProtocolError),
    InputClosed,
    WorldUpdatesClosed,
    PhaseClosed,
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::Ws(e) => write!(f, "websocket error: {e}"),
            NetError::Protocol(e) => write!(f, "protocol error: {e}"),
            NetError::InputClosed => f.write_str("world input channel closed"),
            NetError::WorldUpdatesClosed => f.write_str("world update stream closed"),
            NetError::PhaseClosed => f.write_str("phase channel closed"),
        }
    }
}

impl std::error::Error for NetError {}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct RoleQuery {
    // Players when omitted.
    #[serde(default)]
    role: Option<String>,
}

fn parse_role(value: Option<&str>) -> Option<ClientRole> {
    match value.map(str::to_ascii_lowercase).as_deref() {
        None | Some("player") => Some(ClientRole::Player),
        Some("spectator") => Some(ClientRole::Spectator),
        Some(_) => None,
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoleQuery>,
) -> Response {
    let Some(role) = parse_role(query.role.as_deref()) else {
        return error_response(StatusCode::BAD_REQUEST, "unknown role");
    };

    ws.on_upgrade(move |socket| {
        // The server-assigned client id doubles as the player's entity id.
        let client_id = uuid::Uuid::new_v4().to_string();
        let span = info_span!("conn", %client_id, ?role);
        serve_connection(socket, state, client_id, role).instrument(span)
    })
    .into_response()
}

async fn serve_connection(
    mut socket: WebSocket,
    state: Arc<AppState>,
    client_id: String,
    role: ClientRole,
) {
    let mut conn = match bootstrap_connection(&mut socket, &state, client_id, role).await {
        Ok(conn) => conn,
        Err(e) => {
            warn!(error = %e, "connection bootstrap failed");
            let frame = close_frame(close_code::ERROR, "bootstrap failed");
            let _ = socket.send(Message::Close(Some(frame))).await;
            return;
        }
    };

    info!("client connected");

    if let Err(e) = run_client_loop(&mut socket, &mut conn).await {
        warn!(error = %e, "connection ended with error");
    }
}

/// Rate limiter for one kind of warning.
struct Throttle {
    last: Option<Instant>,
}

impl Throttle {
    fn new() -> Self {
        Self { last: None }
    }

    fn ready(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < LOG_THROTTLE => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

#[derive(Debug, Default)]
struct ConnStats {
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_messages: u32,
    lag_recoveries: u64,
}

impl ConnStats {
    fn received(&mut self, bytes: usize) {
        self.msgs_in += 1;
        self.bytes_in += bytes as u64;
    }

    fn sent(&mut self, bytes: usize) {
        self.msgs_out += 1;
        self.bytes_out += bytes as u64;
    }
}

/// Entity ids this client currently holds, as far as the frames sent so far say.
#[derive(Debug, Default)]
struct SentEntities {
    ids: BTreeSet<EntityId>,
}

impl SentEntities {
    fn record(&mut self, frame: &WorldFrame) {
        match frame {
            WorldFrame::Upsert(entry) => {
                self.ids.insert(entry.id.clone());
            }
            WorldFrame::Destroy(entry) => {
                self.ids.remove(&entry.id);
            }
            WorldFrame::Resync => {}
        }
    }

    /// Adopts `snapshot` as the client's new entity set and returns the ids the
    /// client still holds that no longer exist.
    fn resync(&mut self, snapshot: &[EntityFrame]) -> Vec<EntityId> {
        let live: BTreeSet<EntityId> = snapshot.iter().map(|entry| entry.id.clone()).collect();
        let stale = self.ids.difference(&live).cloned().collect();
        self.ids = live;
        stale
    }
}

struct Connection {
    client_id: String,
    role: ClientRole,
    input_tx: mpsc::Sender<GameEvent>,
    frames_rx: broadcast::Receiver<WorldFrame>,
    snapshot_rx: watch::Receiver<Snapshot>,
    phase_rx: watch::Receiver<GamePhase>,
    sent: SentEntities,
    stats: ConnStats,
    input_log: Throttle,
    lag_log: Throttle,
    full_log: Throttle,
}

/// What the loop does after handling one event.
enum Flow {
    Continue,
    Close(Option<CloseFrame>),
    Fail(NetError),
}

fn close_frame(code: u16, reason: &'static str) -> CloseFrame {
    CloseFrame {
        code,
        reason: reason.into(),
    }
}

async fn send_frame(
    socket: &mut WebSocket,
    stats: &mut ConnStats,
    frame: Utf8Bytes,
) -> Result<(), NetError> {
    let len = frame.len();
    socket.send(Message::Text(frame)).await?;
    stats.sent(len);
    Ok(())
}

async fn send_message(
    socket: &mut WebSocket,
    stats: &mut ConnStats,
    message: &ServerMessage,
) -> Result<(), NetError> {
    let text = encode_server_message(message).map_err(NetError::Protocol)?;
    send_frame(socket, stats, Utf8Bytes::from(text)).await
}

// IDENTITY, then Join, then the current phase and snapshot. Receivers are taken
// before the first await so no frame published meanwhile is missed.
async fn bootstrap_connection(
    socket: &mut WebSocket,
    state: &AppState,
    client_id: String,
    role: ClientRole,
) -> Result<Connection, NetError> {
    let frames_rx = state.frames_tx.subscribe();
    let snapshot_rx = state.snapshot_tx.subscribe();
    let mut phase_rx = state.phase_tx.subscribe();
    let mut stats = ConnStats::default();
    let mut sent = SentEntities::default();

    let identity = ServerMessage::Identity {
        client_id: client_id.clone(),
        role,
    };
    send_message(socket, &mut stats, &identity).await?;

    if role.accepts_input() {
        state
            .input_tx
            .send(GameEvent::Join {
                client_id: client_id.clone(),
                role,
            })
            .await
            .map_err(|_| NetError::InputClosed)?;
    }

    let initial = send_initial_state(socket, &mut stats, &mut sent, &mut phase_rx, &snapshot_rx);
    if let Err(e) = initial.await {
        // The world already spawned this player; undo it.
        if role.accepts_input() {
            let _ = state.input_tx.send(GameEvent::Leave { client_id }).await;
        }
        return Err(e);
    }

    Ok(Connection {
        client_id,
        role,
        input_tx: state.input_tx.clone(),
        frames_rx,
        snapshot_rx,
        phase_rx,
        sent,
        stats,
        input_log: Throttle::new(),
        lag_log: Throttle::new(),
        full_log: Throttle::new(),
    })
}

async fn send_initial_state(
    socket: &mut WebSocket,
    stats: &mut ConnStats,
    sent: &mut SentEntities,
    phase_rx: &mut watch::Receiver<GamePhase>,
    snapshot_rx: &watch::Receiver<Snapshot>,
) -> Result<(), NetError> {
    // Copy out of the watch guards before awaiting.
    let phase = *phase_rx.borrow_and_update();
    let snapshot = snapshot_rx.borrow().clone();

    send_message(socket, stats, &ServerMessage::PhaseChange { phase }).await?;
    sent.resync(&snapshot);
    for entry in snapshot.iter() {
        send_frame(socket, stats, entry.frame.clone()).await?;
    }
    debug!(?phase, entities = snapshot.len(), "initial state sent");
    Ok(())
}

async fn run_client_loop(socket: &mut WebSocket, conn: &mut Connection) -> Result<(), NetError> {
    let (close, failure) = loop {
        let flow = tokio::select! {
            incoming = socket.recv() => on_incoming(incoming, conn),
            frame = conn.frames_rx.recv() => on_world_frame(frame, socket, conn).await,
            changed = conn.phase_rx.changed() => match changed {
                Ok(()) => on_phase_change(socket, conn).await,
                Err(_) => Flow::Fail(NetError::PhaseClosed),
            },
        };

        match flow {
            Flow::Continue => {}
            Flow::Close(frame) => break (frame, None),
            Flow::Fail(e) => break (None, Some(e)),
        }
    };

    if let Some(frame) = close {
        let _ = socket.send(Message::Close(Some(frame))).await;
    }
    if let Err(e) = socket.close().await {
        debug!(error = %e, "socket already closed");
    }

    let cleanup = disconnect_cleanup(conn).await;
    match (failure, cleanup) {
        (Some(e), _) | (None, Err(e)) => Err(e),
        (None, Ok(())) => Ok(()),
    }
}

fn on_incoming(incoming: Option<Result<Message, axum::Error>>, conn: &mut Connection) -> Flow {
    match incoming {
        Some(Ok(Message::Text(text))) => on_text(text.as_str(), conn),
        Some(Ok(Message::Binary(_))) => Flow::Close(Some(close_frame(
            close_code::UNSUPPORTED,
            "binary messages not supported",
        ))),
        Some(Ok(Message::Ping(_) | Message::Pong(_))) => Flow::Continue,
        Some(Ok(Message::Close(_))) | None => {
            info!("client closed the connection");
            Flow::Close(None)
        }
        Some(Err(e)) => {
            warn!(error = %e, "websocket receive failed");
            Flow::Close(None)
        }
    }
}

fn on_text(text: &str, conn: &mut Connection) -> Flow {
    conn.stats.received(text.len());

    let message = match decode_client_message(text) {
        Ok(message) => message,
        Err(e) => {
            conn.stats.invalid_messages += 1;
            if conn.input_log.ready() {
                warn!(bytes = text.len(), error = %e, "unparseable client message");
            }
            if conn.stats.invalid_messages > MAX_INVALID_MESSAGES {
                return Flow::Close(Some(close_frame(
                    close_code::POLICY,
                    "too many invalid messages",
                )));
            }
            return Flow::Continue;
        }
    };

    if !conn.role.accepts_input() {
        if conn.input_log.ready() {
            warn!("spectator input ignored");
        }
        return Flow::Continue;
    }
    if message.client_id != conn.client_id {
        if conn.input_log.ready() {
            warn!(claimed = %message.client_id, "input for another client ignored");
        }
        return Flow::Continue;
    }

    forward_input(conn, message.event_type)
}

fn forward_input(conn: &mut Connection, event: ClientEventType) -> Flow {
    let input = GameEvent::Input {
        client_id: conn.client_id.clone(),
        event,
    };
    match conn.input_tx.try_send(input) {
        Ok(()) => Flow::Continue,
        Err(mpsc::error::TrySendError::Full(_)) => {
            // Dropping one edge beats stalling the socket behind a busy world.
            if conn.full_log.ready() {
                warn!("world input queue full; input dropped");
            }
            Flow::Continue
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Flow::Fail(NetError::InputClosed),
    }
}

async fn on_world_frame(
    frame: Result<WorldFrame, broadcast::error::RecvError>,
    socket: &mut WebSocket,
    conn: &mut Connection,
) -> Flow {
    let outcome = match frame {
        Ok(WorldFrame::Resync) => resync(socket, conn).await,
        Ok(frame) => {
            conn.sent.record(&frame);
            match frame {
                WorldFrame::Upsert(entry) | WorldFrame::Destroy(entry) => {
                    send_frame(socket, &mut conn.stats, entry.frame).await
                }
                WorldFrame::Resync => Ok(()),
            }
        }
        Err(broadcast::error::RecvError::Lagged(missed)) => {
            if conn.lag_log.ready() {
                warn!(missed, "connection lagged behind the world; resyncing");
            }
            resync(socket, conn).await
        }
        Err(broadcast::error::RecvError::Closed) => Err(NetError::WorldUpdatesClosed),
    };
    match outcome {
        Ok(()) => Flow::Continue,
        Err(e) => Flow::Fail(e),
    }
}

// Brings the client back in line after frames were lost: DESTROY for every id
// it holds that is gone, then the full snapshot. CREATE_OR_UPDATE is
// idempotent, so entities it already has are simply overwritten.
async fn resync(socket: &mut WebSocket, conn: &mut Connection) -> Result<(), NetError> {
    let snapshot = conn.snapshot_rx.borrow().clone();
    let stale = conn.sent.resync(&snapshot);
    conn.stats.lag_recoveries += 1;

    for id in &stale {
        let destroy = ServerMessage::Destroy { id: id.clone() };
        send_message(socket, &mut conn.stats, &destroy).await?;
    }
    for entry in snapshot.iter() {
        send_frame(socket, &mut conn.stats, entry.frame.clone()).await?;
    }
    debug!(
        entities = snapshot.len(),
        destroyed = stale.len(),
        recoveries = conn.stats.lag_recoveries,
        "connection resynced"
    );
    Ok(())
}

async fn on_phase_change(socket: &mut WebSocket, conn: &mut Connection) -> Flow {
    let phase = *conn.phase_rx.borrow_and_update();
    match send_message(socket, &mut conn.stats, &ServerMessage::PhaseChange { phase }).await {
        Ok(()) => Flow::Continue,
        Err(e) => Flow::Fail(e),
    }
}

async fn disconnect_cleanup(conn: &Connection) -> Result<(), NetError> {
    if conn.role.accepts_input() {
        // Players own an entity; the world despawns it and broadcasts DESTROY.
        conn.input_tx
            .send(GameEvent::Leave {
                client_id: conn.client_id.clone(),
            })
            .await
            .map_err(|_| NetError::InputClosed)?;
    }

    debug!(stats = ?conn.stats, "connection stats");
    info!("client disconnected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface_adapters::net::serializer::{
        destroy_frame, entity_frame, world_update_serializer,
    };
    use crate::use_cases::WorldUpdate;
    use sync_protocol::{ComponentSet, EntityData};

    #[test]
    fn when_role_is_missing_or_known_then_it_is_parsed() {
        assert_eq!(parse_role(None), Some(ClientRole::Player));
        assert_eq!(parse_role(Some("player")), Some(ClientRole::Player));
        assert_eq!(parse_role(Some("Spectator")), Some(ClientRole::Spectator));
        assert_eq!(parse_role(Some("referee")), None);
    }

    #[test]
    fn when_warning_repeats_quickly_then_throttle_suppresses_it() {
        let mut throttle = Throttle::new();

        assert!(throttle.ready());
        assert!(!throttle.ready());
    }

    #[test]
    fn when_frames_are_counted_then_stats_accumulate_bytes() {
        let mut stats = ConnStats::default();

        stats.received(10);
        stats.sent(4);
        stats.sent(6);

        assert_eq!((stats.msgs_in, stats.bytes_in), (1, 10));
        assert_eq!((stats.msgs_out, stats.bytes_out), (2, 10));
    }

    fn upsert(id: &str) -> EntityFrame {
        entity_frame(EntityData {
            id: EntityId::from(id),
            components: ComponentSet::default(),
        })
        .unwrap()
    }

    #[test]
    fn when_frames_go_out_then_sent_entities_follow_creates_and_destroys() {
        let mut sent = SentEntities::default();

        sent.record(&WorldFrame::Upsert(upsert("p1")));
        sent.record(&WorldFrame::Upsert(upsert("p2")));
        sent.record(&WorldFrame::Destroy(destroy_frame(EntityId::from("p1")).unwrap()));
        sent.record(&WorldFrame::Resync);

        assert_eq!(sent.ids, BTreeSet::from([EntityId::from("p2")]));
    }

    #[test]
    fn when_resyncing_then_ids_missing_from_snapshot_are_reported_stale() {
        let mut sent = SentEntities::default();
        sent.resync(&[upsert("p1"), upsert("p2")]);

        let stale = sent.resync(&[upsert("p2"), upsert("p3")]);

        assert_eq!(stale, vec![EntityId::from("p1")]);
        assert_eq!(
            sent.ids,
            BTreeSet::from([EntityId::from("p2"), EntityId::from("p3")])
        );
        assert!(sent.resync(&[upsert("p2"), upsert("p3")]).is_empty());
    }

    #[tokio::test]
    async fn when_removal_is_lost_upstream_then_resync_destroys_the_stale_entity() {
        // The connection saw p1 and p2 created, then the serializer missed the
        // update removing p1.
        let mut sent = SentEntities::default();
        sent.record(&WorldFrame::Upsert(upsert("p1")));
        sent.record(&WorldFrame::Upsert(upsert("p2")));

        let (world_tx, world_rx) = broadcast::channel(1);
        let (frames_tx, mut frames_rx) = broadcast::channel(8);
        let (snapshot_tx, snapshot_rx) = watch::channel::<Snapshot>(Arc::from(Vec::new()));
        let p2 = EntityData {
            id: EntityId::from("p2"),
            components: ComponentSet::default(),
        };
        world_tx
            .send(WorldUpdate {
                tick: 1,
                changed: Vec::new(),
                removed: vec![EntityId::from("p1")],
                entities: vec![p2.clone()],
            })
            .unwrap();
        world_tx
            .send(WorldUpdate {
                tick: 2,
                changed: vec![p2.clone()],
                removed: Vec::new(),
                entities: vec![p2],
            })
            .unwrap();
        drop(world_tx);
        world_update_serializer(world_rx, frames_tx, snapshot_tx).await;

        let mut stale = Vec::new();
        while let Ok(frame) = frames_rx.try_recv() {
            match frame {
                WorldFrame::Resync => stale.extend(sent.resync(&snapshot_rx.borrow())),
                other => sent.record(&other),
            }
        }

        assert_eq!(stale, vec![EntityId::from("p1")]);
        assert_eq!(sent.ids, BTreeSet::from([EntityId::from("p2")]));
    }
}
