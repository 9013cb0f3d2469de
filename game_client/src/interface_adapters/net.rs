// WebSocket transport adapter: handshake, outbound writer and the single-task session loop.

use crate::domain::{InputEvent, RenderSink};
use crate::use_cases::{ClientSession, SessionConfig};

use futures_util::{SinkExt, StreamExt};
use std::fmt;
use std::time::Duration;
use sync_protocol::{ClientRole, ServerMessage, decode_server_message};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use url::Url;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug)]
pub enum NetError {
    Connect(tungstenite::Error),
    Ws(tungstenite::Error),
    // First meaningful frame was not an identity message.
    HandshakeRejected(String),
    HandshakeTimeout,
    ClosedBeforeIdentity,
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::Connect(err) => write!(f, "failed to connect: {err}"),
            NetError::Ws(err) => write!(f, "websocket error: {err}"),
            NetError::HandshakeRejected(reason) => write!(f, "handshake rejected: {reason}"),
            NetError::HandshakeTimeout => write!(f, "timed out waiting for identity"),
            NetError::ClosedBeforeIdentity => write!(f, "connection closed before identity"),
        }
    }
}

impl std::error::Error for NetError {}

/// Identity granted by the server during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub client_id: String,
    pub role: ClientRole,
}

pub async fn connect(url: &Url) -> Result<WsStream, NetError> {
    let (stream, response) = connect_async(url.as_str())
        .await
        .map_err(NetError::Connect)?;
    debug!(status = %response.status(), "websocket upgraded");
    Ok(stream)
}

/// Waits for the server's identity frame, which must precede everything else.
pub async fn read_identity(stream: &mut WsStream, limit: Duration) -> Result<Identity, NetError> {
    match tokio::time::timeout(limit, read_identity_frame(stream)).await {
        Ok(result) => result,
        Err(_) => Err(NetError::HandshakeTimeout),
    }
}

async fn read_identity_frame(stream: &mut WsStream) -> Result<Identity, NetError> {
    loop {
        let Some(incoming) = stream.next().await else {
            return Err(NetError::ClosedBeforeIdentity);
        };

        match incoming.map_err(NetError::Ws)? {
            Message::Text(text) => {
                return match decode_server_message(text.as_str()) {
                    Ok(ServerMessage::Identity { client_id, role }) => {
                        Ok(Identity { client_id, role })
                    }
                    Ok(other) => Err(NetError::HandshakeRejected(format!(
                        "expected identity, got {:?}",
                        other.event_type()
                    ))),
                    Err(err) => Err(NetError::HandshakeRejected(err.to_string())),
                };
            }
            Message::Close(_) => return Err(NetError::ClosedBeforeIdentity),
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            Message::Binary(_) => {
                return Err(NetError::HandshakeRejected(
                    "binary messages not supported".to_string(),
                ));
            }
        }
    }
}

/// Drains the outbound queue into the socket sink until either side closes.
pub async fn outbound_writer<S>(mut sink: S, mut outbound_rx: mpsc::Receiver<String>)
where
    S: futures_util::Sink<Message, Error = tungstenite::Error> + Unpin,
{
    while let Some(text) = outbound_rx.recv().await {
        if let Err(err) = sink.send(Message::Text(text.into())).await {
            warn!(error = %err, "failed to send outbound message");
            break;
        }
    }
    // Best-effort close; the peer may already be gone.
    let _ = sink.close().await;
}

enum LoopControl {
    Continue,
    Disconnect,
}

/// Runs the session until the connection drops or the input source ends, then hands the
/// render collaborator back.
///
/// Every inbound frame and input event is handled to completion on this task, so the
/// registry is never touched concurrently.
pub async fn run_session<R: RenderSink>(
    stream: WsStream,
    config: SessionConfig,
    render: R,
    mut input_rx: mpsc::Receiver<InputEvent>,
    outbound_capacity: usize,
) -> R {
    let (sink, mut inbound) = stream.split();
    let (outbound_tx, outbound_rx) = mpsc::channel::<String>(outbound_capacity);
    let writer = tokio::spawn(outbound_writer(sink, outbound_rx));

    let mut session = ClientSession::new(config, outbound_tx, render);
    info!(client_id = %session.config().client_id, role = ?session.config().role, "session started");

    loop {
        let control = tokio::select! {
            incoming = inbound.next() => handle_incoming(&mut session, incoming),
            event = input_rx.recv() => match event {
                Some(event) => {
                    session.handle_event(event);
                    LoopControl::Continue
                }
                None => {
                    info!("input source closed; leaving session");
                    LoopControl::Disconnect
                }
            },
        };

        if matches!(control, LoopControl::Disconnect) || session.is_connection_lost() {
            break;
        }
    }

    // Dropping the session drops the outbound sender, letting the writer close the socket.
    let render = session.into_render();
    if let Err(err) = writer.await {
        warn!(error = %err, "outbound writer task failed");
    }
    render
}

fn handle_incoming<R: RenderSink>(
    session: &mut ClientSession<mpsc::Sender<String>, R>,
    incoming: Option<Result<Message, tungstenite::Error>>,
) -> LoopControl {
    match incoming {
        Some(Ok(Message::Text(text))) => {
            session.on_server_text(text.as_str());
            LoopControl::Continue
        }
        Some(Ok(Message::Binary(bytes))) => {
            warn!(bytes = bytes.len(), "binary frame ignored");
            LoopControl::Continue
        }
        Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => LoopControl::Continue,
        Some(Ok(Message::Close(frame))) => {
            info!(?frame, "server closed connection");
            session.on_connection_lost();
            LoopControl::Disconnect
        }
        Some(Err(err)) => {
            warn!(error = %err, "websocket recv error");
            session.on_connection_lost();
            LoopControl::Disconnect
        }
        None => {
            session.on_connection_lost();
            LoopControl::Disconnect
        }
    }
}
