use thiserror::Error;
use tokio::sync::mpsc::error::SendError;
use tokio_tungstenite::tungstenite;

#[derive(Error, Debug)]
pub enum DuoSyncError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),

    #[error("WebSocket send error: {0}")]
    WebSocketSend(String),

    /// An element the extractor needs is absent after every fallback.
    #[error("Missing page data: {0}")]
    MissingData(String),

    #[error("Flashcard service unreachable: {0}")]
    ServiceUnreachable(String),

    /// The flashcard service answered with something other than `{error, result}`.
    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("Page change source closed")]
    PageClosed,

    #[error("DuoSyncError: {0}")]
    Custom(String),
}

impl DuoSyncError {
    pub fn missing(what: impl Into<String>) -> Self {
        DuoSyncError::MissingData(what.into())
    }
}

impl<T> From<SendError<T>> for DuoSyncError {
    fn from(error: SendError<T>) -> Self {
        DuoSyncError::WebSocketSend(error.to_string())
    }
}

impl From<std::io::Error> for DuoSyncError {
    fn from(error: std::io::Error) -> Self {
        DuoSyncError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for DuoSyncError {
    fn from(error: reqwest::Error) -> Self {
        DuoSyncError::Reqwest(Box::new(error))
    }
}

impl From<tungstenite::Error> for DuoSyncError {
    fn from(error: tungstenite::Error) -> Self {
        DuoSyncError::WebSocket(Box::new(error))
    }
}
