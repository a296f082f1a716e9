use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid origin {0}: expected an http or https URL with a host")]
    InvalidOrigin(String),
    #[error("Failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },
    #[error("WebSocket transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Deserialization error: {0}")]
    Deserialization(String),
    #[error("Unknown locale {0}")]
    InvalidLocale(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Sync client is no longer running")]
    Closed,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
