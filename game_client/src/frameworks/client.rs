// Framework bootstrap for the client runtime.

use crate::domain::{InputEvent, ResourceNotFound};
use crate::frameworks::config::{
    self, ClientConfig, ConfigError, HANDSHAKE_TIMEOUT, INPUT_QUEUE_CAPACITY,
};
use crate::interface_adapters::net::{self, NetError};
use crate::interface_adapters::{AssetLoadError, LogRender, load_assets, spawn_stdin_reader};
use crate::use_cases::SessionConfig;

use std::fmt;
use tokio::sync::mpsc;
use tracing::{Instrument, info, info_span};

#[derive(Debug)]
pub enum ClientError {
    Config(ConfigError),
    Assets(AssetLoadError),
    MissingAsset(ResourceNotFound),
    Net(NetError),
    Input(std::io::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Config(err) => write!(f, "configuration error: {err}"),
            ClientError::Assets(err) => write!(f, "asset loading failed: {err}"),
            ClientError::MissingAsset(err) => write!(f, "required asset missing: {err}"),
            ClientError::Net(err) => write!(f, "{err}"),
            ClientError::Input(err) => write!(f, "failed to start input reader: {err}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<ConfigError> for ClientError {
    fn from(err: ConfigError) -> Self {
        ClientError::Config(err)
    }
}

impl From<AssetLoadError> for ClientError {
    fn from(err: AssetLoadError) -> Self {
        ClientError::Assets(err)
    }
}

impl From<ResourceNotFound> for ClientError {
    fn from(err: ResourceNotFound) -> Self {
        ClientError::MissingAsset(err)
    }
}

impl From<NetError> for ClientError {
    fn from(err: NetError) -> Self {
        ClientError::Net(err)
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

/// Loads assets, connects, and drives the session with terminal input until it ends.
pub async fn run(config: ClientConfig) -> Result<(), ClientError> {
    let (input_tx, input_rx) = mpsc::channel::<InputEvent>(INPUT_QUEUE_CAPACITY);
    spawn_stdin_reader(input_tx).map_err(ClientError::Input)?;
    run_with_input(config, input_rx).await
}

/// Same as [`run`] with a caller-supplied input source.
pub async fn run_with_input(
    config: ClientConfig,
    input_rx: mpsc::Receiver<InputEvent>,
) -> Result<(), ClientError> {
    let http = reqwest::Client::new();
    let base_url = config.http_base_url()?;
    let catalog = load_assets(&http, &base_url, config.asset_requests()).await?;
    // Locally configured assets must exist; fail before touching the network socket.
    let render = LogRender::new(catalog, config.ui_font())?;

    let ws_url = config.ws_url()?;
    info!(%ws_url, "connecting");
    let mut stream = net::connect(&ws_url).await?;
    let identity = net::read_identity(&mut stream, HANDSHAKE_TIMEOUT).await?;

    let span = info_span!("session", client_id = %identity.client_id);
    let session_config = SessionConfig {
        client_id: identity.client_id,
        role: identity.role,
        screen: config.screen,
    };

    let render = net::run_session(
        stream,
        session_config,
        render,
        input_rx,
        config::OUTBOUND_QUEUE_CAPACITY,
    )
    .instrument(span)
    .await;

    if render.is_connectivity_lost() {
        info!("session ended by server");
    } else {
        info!("session ended by client");
    }
    Ok(())
}

pub async fn run_with_config() -> Result<(), ClientError> {
    init_runtime();

    let config = ClientConfig::from_env()?;
    info!(
        host = %config.server_host,
        port = config.server_port,
        role = ?config.role,
        "client configured"
    );
    run(config).await
}
