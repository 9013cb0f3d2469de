use crate::domain::{AssetKind, ScreenSize};
use std::{env, fmt, time::Duration};
use sync_protocol::ClientRole;
use url::Url;

// Runtime/client constants.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;
pub const INPUT_QUEUE_CAPACITY: usize = 256;
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SCREEN_WIDTH: u32 = 1280;
const DEFAULT_SCREEN_HEIGHT: u32 = 720;

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
    InvalidUrl(url::ParseError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => {
                write!(f, "invalid value for {key}: {value:?}")
            }
            ConfigError::InvalidUrl(err) => write!(f, "invalid server url: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Immutable client configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_host: String,
    pub server_port: u16,
    // Role requested from the server; the server echoes the granted role.
    pub role: ClientRole,
    pub screen: ScreenSize,
    pub font_urls: Vec<String>,
    pub texture_urls: Vec<String>,
    pub audio_urls: Vec<String>,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup (env in production, maps in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server_host = lookup("GAME_SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let server_port = parse_or("GAME_SERVER_PORT", &lookup, DEFAULT_PORT)?;
        let role = match lookup("CLIENT_ROLE") {
            None => ClientRole::Player,
            Some(value) => parse_role(&value).ok_or(ConfigError::InvalidValue {
                key: "CLIENT_ROLE",
                value,
            })?,
        };
        let screen = ScreenSize {
            width: parse_or("SCREEN_WIDTH", &lookup, DEFAULT_SCREEN_WIDTH)?,
            height: parse_or("SCREEN_HEIGHT", &lookup, DEFAULT_SCREEN_HEIGHT)?,
        };

        let config = Self {
            server_host,
            server_port,
            role,
            screen,
            font_urls: parse_list(lookup("FONT_URLS")),
            texture_urls: parse_list(lookup("TEXTURE_URLS")),
            audio_urls: parse_list(lookup("AUDIO_URLS")),
        };
        // Fail fast on a host that cannot form a url.
        config.http_base_url()?;
        Ok(config)
    }

    pub fn http_base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&format!("http://{}:{}/", self.server_host, self.server_port))
            .map_err(ConfigError::InvalidUrl)
    }

    pub fn ws_url(&self) -> Result<Url, ConfigError> {
        let mut url = Url::parse(&format!("ws://{}:{}/ws", self.server_host, self.server_port))
            .map_err(ConfigError::InvalidUrl)?;
        let role = match self.role {
            ClientRole::Player => "player",
            ClientRole::Spectator => "spectator",
        };
        url.query_pairs_mut().append_pair("role", role);
        Ok(url)
    }

    /// Every configured asset url tagged with its kind, in load order.
    pub fn asset_requests(&self) -> Vec<(AssetKind, String)> {
        let fonts = self.font_urls.iter().map(|url| (AssetKind::Font, url.clone()));
        let textures = self
            .texture_urls
            .iter()
            .map(|url| (AssetKind::Texture, url.clone()));
        let audio = self.audio_urls.iter().map(|url| (AssetKind::Audio, url.clone()));
        fonts.chain(textures).chain(audio).collect()
    }

    // The first configured font doubles as the UI font.
    pub fn ui_font(&self) -> Option<&str> {
        self.font_urls.first().map(String::as_str)
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

fn parse_role(value: &str) -> Option<ClientRole> {
    match value.trim().to_ascii_lowercase().as_str() {
        "player" => Some(ClientRole::Player),
        "spectator" => Some(ClientRole::Spectator),
        _ => None,
    }
}

fn parse_list(value: Option<String>) -> Vec<String> {
    value
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn when_nothing_is_set_then_defaults_are_used() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).expect("expected defaults");

        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.role, ClientRole::Player);
        assert_eq!(config.screen.width, 1280);
        assert!(config.texture_urls.is_empty());
    }

    #[test]
    fn when_role_is_spectator_then_ws_url_requests_spectator() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("CLIENT_ROLE", "Spectator"),
            ("GAME_SERVER_PORT", "9001"),
        ]))
        .expect("expected config");

        assert_eq!(config.role, ClientRole::Spectator);
        assert_eq!(
            config.ws_url().unwrap().as_str(),
            "ws://127.0.0.1:9001/ws?role=spectator"
        );
    }

    #[test]
    fn when_port_is_not_a_number_then_returns_invalid_value() {
        let err = ClientConfig::from_lookup(lookup_from(&[("GAME_SERVER_PORT", "eighty")]))
            .expect_err("expected invalid port");

        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "GAME_SERVER_PORT",
                ..
            }
        ));
    }

    #[test]
    fn when_role_is_unknown_then_returns_invalid_value() {
        let err = ClientConfig::from_lookup(lookup_from(&[("CLIENT_ROLE", "referee")]))
            .expect_err("expected invalid role");

        assert!(matches!(err, ConfigError::InvalidValue { key: "CLIENT_ROLE", .. }));
    }

    #[test]
    fn when_asset_lists_have_blanks_then_they_are_skipped() {
        let config = ClientConfig::from_lookup(lookup_from(&[(
            "TEXTURE_URLS",
            "static/hero.png, ,static/tiles.png,",
        )]))
        .expect("expected config");

        assert_eq!(
            config.texture_urls,
            vec!["static/hero.png".to_string(), "static/tiles.png".to_string()]
        );
    }

    #[test]
    fn when_assets_are_configured_then_requests_are_tagged_by_kind() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("FONT_URLS", "static/ui.json"),
            ("TEXTURE_URLS", "static/hero.png"),
            ("AUDIO_URLS", "static/theme.ogg"),
        ]))
        .expect("expected config");

        assert_eq!(
            config.asset_requests(),
            vec![
                (AssetKind::Font, "static/ui.json".to_string()),
                (AssetKind::Texture, "static/hero.png".to_string()),
                (AssetKind::Audio, "static/theme.ogg".to_string()),
            ]
        );
        assert_eq!(config.ui_font(), Some("static/ui.json"));
    }
}
