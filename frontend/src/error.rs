use thiserror::Error;

/// Everything the telemetry client can run into.
///
/// Only `Config` and `Io` ever reach a caller (while loading configuration);
/// the rest are absorbed and logged by the supervisor.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("command dropped: not connected")]
    CommandDropped,

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::MalformedEnvelope(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::Transport(e.to_string())
    }
}
