use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing credential: environment variable {var} is not set")]
    MissingCredential { var: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Connection closed abnormally: {code} - {reason}")]
    AbnormalClose { code: u16, reason: String },

    #[error("Stream ended before the end-of-stream marker was received")]
    StreamIncomplete,

    #[error("No pong received within {timeout_secs}s")]
    KeepaliveTimeout { timeout_secs: u64 },

    #[error("Unknown scenario: {name}")]
    UnknownScenario { name: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// True for failures that happened on the wire rather than in local setup.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::AbnormalClose { .. }
                | Self::StreamIncomplete
                | Self::KeepaliveTimeout { .. }
                | Self::Network(_)
                | Self::WebSocket(_)
        )
    }
}
