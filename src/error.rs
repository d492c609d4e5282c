//! Error types for the chess session client.

use thiserror::Error;

/// Local move-engine failures. All of these are recoverable: the move is
/// rejected before any network round-trip and no state changes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid FEN string: {0}")]
    InvalidFen(String),

    #[error("invalid square name: {0}")]
    InvalidSquare(String),

    #[error("invalid uci move: {0}")]
    InvalidUci(String),

    #[error("illegal move: {0}")]
    IllegalMove(String),
}

/// A reconnection replay hit an illegal move mid-sequence. The server's
/// move history and the local rules engine disagree, so the session view
/// cannot be restored; there is no partial replay.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot restore game state: move {index} ({uci}) is illegal during replay")]
pub struct ReplayError {
    pub index: usize,
    pub uci: String,
}

/// Connectivity and framing failures, surfaced as results or events and
/// never unwound across a message-handling boundary.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("websocket connect failed: {0}")]
    Connect(tokio_tungstenite::tungstenite::Error),

    #[error("websocket transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid room URL: {0}")]
    Url(#[from] url::ParseError),
}
