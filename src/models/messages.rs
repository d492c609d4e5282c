use chess::Color;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Action sent from the client to the server.
///
/// Serializes to the wire shape `{"action": "join_game"}` /
/// `{"action": "make_move", "move": "e2e4"}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientAction {
    JoinGame,
    MakeMove {
        #[serde(rename = "move")]
        uci: String,
    },
    ResignGame,
    DrawRequest,
    AbortGame,
    PauseRequest,
}

/// Audience of an inbound message: this client only, the other client
/// only, or both participants.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    OnlyMe,
    All,
    Both,
    #[serde(other)]
    Unknown,
}

/// The `message` part of an inbound envelope.
#[derive(Deserialize, Debug, Clone)]
pub struct MessageBody {
    #[serde(rename = "type")]
    pub scope: Scope,
    pub info: String,
    pub player: Option<PlayerRef>,
    pub error: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PlayerRef {
    pub user: String,
}

/// Inbound message envelope: routing metadata plus an optional snapshot
/// of the server-owned game session.
#[derive(Deserialize, Debug, Clone)]
pub struct Envelope {
    pub message: MessageBody,
    pub game: Option<GameSnapshot>,
}

/// Which seat a username occupies in the session.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlayerSlot {
    Player1,
    Player2,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Waiting,
    InProgress,
    Ended,
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WireColor {
    White,
    Black,
}

impl WireColor {
    pub fn to_color(self) -> Color {
        match self {
            WireColor::White => Color::White,
            WireColor::Black => Color::Black,
        }
    }
}

/// Convert a chess color to its wire string.
pub fn color_to_string(color: Color) -> String {
    match color {
        Color::White => "white".to_string(),
        Color::Black => "black".to_string(),
    }
}

/// One accepted move in the server's history. Immutable once accepted;
/// `played_at` ordering is the replay order on reconnection.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    #[serde(rename = "move")]
    pub uci: String,
    pub played_at: DateTime<Utc>,
    pub played_by: Option<String>,
}

/// The client's projection of the server-owned game session.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct GameSnapshot {
    pub player1: Option<String>,
    pub player2: Option<String>,
    pub player1_color: Option<WireColor>,
    pub player2_color: Option<WireColor>,
    pub current_turn: Option<PlayerSlot>,
    pub status: Option<GamePhase>,
    /// The uci of the move this message announces (`moved` only).
    #[serde(rename = "move")]
    pub last_move: Option<String>,
    #[serde(default)]
    pub moves: Vec<MoveRecord>,
    pub winner: Option<PlayerSlot>,
    pub over_type: Option<String>,
}

impl GameSnapshot {
    /// Color assigned to `username`, by comparing the session's player
    /// names against the locally known user.
    pub fn color_of(&self, username: &str) -> Option<Color> {
        if self.player1.as_deref() == Some(username) {
            self.player1_color.map(WireColor::to_color)
        } else if self.player2.as_deref() == Some(username) {
            self.player2_color.map(WireColor::to_color)
        } else {
            None
        }
    }

    /// Whether it is `username`'s turn according to `current_turn`.
    pub fn is_turn_of(&self, username: &str) -> bool {
        match self.current_turn {
            Some(PlayerSlot::Player1) => self.player1.as_deref() == Some(username),
            Some(PlayerSlot::Player2) => self.player2.as_deref() == Some(username),
            None => false,
        }
    }

    /// Winner's username and color, resolved through the seat mapping.
    pub fn winner_identity(&self) -> (Option<String>, Option<Color>) {
        match self.winner {
            Some(PlayerSlot::Player1) => (
                self.player1.clone(),
                self.player1_color.map(WireColor::to_color),
            ),
            Some(PlayerSlot::Player2) => (
                self.player2.clone(),
                self.player2_color.map(WireColor::to_color),
            ),
            None => (None, None),
        }
    }
}

/// Terminal result of a game, surfaced to the UI when the session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOutcome {
    pub status: Option<GamePhase>,
    pub winner: Option<String>,
    pub color: Option<Color>,
    pub over_type: Option<String>,
}

impl GameOutcome {
    pub fn from_snapshot(game: &GameSnapshot) -> Self {
        let (winner, color) = game.winner_identity();
        GameOutcome {
            status: game.status,
            winner,
            color,
            over_type: game.over_type.clone(),
        }
    }
}
