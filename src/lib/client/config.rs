use std::env;
use std::time::Duration;

use tokio_tungstenite::tungstenite::http::Uri;

use crate::core::SyncError;

/// Fixed delay between a closed connection and the next attempt.
pub const RECONNECT_INTERVAL: Duration = Duration::from_millis(1000);

pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8080";
pub const DEFAULT_LOCALE: &str = "en_US";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket URL, normally derived from the page origin.
    pub url: String,
    pub reconnect_interval: Duration,
    /// POSIX locale name used for dates, e.g. `en_US`.
    pub locale: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080".to_string(),
            reconnect_interval: RECONNECT_INTERVAL,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl ClientConfig {
    /// Config that talks to the socket on the same host as `origin`.
    pub fn for_origin(origin: &str) -> Result<Self, SyncError> {
        Ok(Self {
            url: websocket_url(origin)?,
            ..Self::default()
        })
    }

    /// Reads `TODO_SYNC_ORIGIN`, `TODO_SYNC_LOCALE` and
    /// `TODO_SYNC_RECONNECT_MS`, falling back to the defaults.
    pub fn from_env() -> Result<Self, SyncError> {
        let origin = env::var("TODO_SYNC_ORIGIN").unwrap_or_else(|_| DEFAULT_ORIGIN.to_string());
        let mut config = Self::for_origin(&origin)?;
        if let Ok(locale) = env::var("TODO_SYNC_LOCALE") {
            config.locale = locale;
        }
        if let Ok(ms) = env::var("TODO_SYNC_RECONNECT_MS") {
            config.reconnect_interval = parse_reconnect_ms(&ms)?;
        }
        Ok(config)
    }
}

fn parse_reconnect_ms(raw: &str) -> Result<Duration, SyncError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| SyncError::InvalidConfig(format!("TODO_SYNC_RECONNECT_MS={raw:?}: {e}")))
}

/// Maps a page origin to the WebSocket URL on the same host and port:
/// `https` becomes `wss`, `http` becomes `ws`, and any path is dropped.
pub fn websocket_url(origin: &str) -> Result<String, SyncError> {
    let invalid = || SyncError::InvalidOrigin(origin.to_string());
    let uri: Uri = origin.parse().map_err(|_| invalid())?;
    let scheme = match uri.scheme_str() {
        Some(s) if s.eq_ignore_ascii_case("https") => "wss",
        Some(s) if s.eq_ignore_ascii_case("http") => "ws",
        _ => return Err(invalid()),
    };
    let host = uri.host().filter(|h| !h.is_empty()).ok_or_else(invalid)?;
    Ok(match uri.port_u16() {
        Some(port) => format!("{scheme}://{host}:{port}"),
        None => format!("{scheme}://{host}"),
    })
}
