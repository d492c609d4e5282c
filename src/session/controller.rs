//! The orchestrating session state machine.
//!
//! Turns routed protocol events and local user intent into game-state
//! mutations and outbound actions. Owns the optimistic-apply contract:
//! the local player's move is applied before server confirmation, the
//! `moved` echo makes it durable, and an explicit `invalid` is the sole
//! rollback trigger.
//!
//! The controller does no I/O. Frames come in through [`SessionController::on_frame`],
//! outbound actions come back as return values, and anything the UI
//! must show is surfaced as a [`SessionEvent`]. The driver (binary or
//! test) owns the message loop, so the whole machine runs without a
//! network or a UI framework.

use chess::Color;
use log::{debug, info, warn};

use crate::error::ReplayError;
use crate::game::GameStateStore;
use crate::models::{ClientAction, ClientIdentity, GameOutcome, GamePhase, GameSnapshot};
use crate::session::router::{self, Routed};

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    WaitingForOpponent,
    MyTurn,
    OpponentTurn,
    GameOver,
    Disconnected,
}

/// Something the UI layer should react to.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The server confirmed our username.
    IdentityConfirmed { user: String },
    /// We are in the game; seats and turn are known.
    GameJoined {
        player1: Option<String>,
        player2: Option<String>,
        my_color: Option<Color>,
        my_turn: bool,
    },
    /// The board changed (move applied, rolled back, or replayed).
    PositionChanged,
    /// The server rejected our optimistic move; it has been reverted.
    MoveRejected,
    /// The opponent offered a draw.
    DrawOffered,
    /// Terminal result; no further moves will be accepted.
    GameOver(GameOutcome),
    /// Reconnection replay failed; the game view cannot be restored.
    ReplayFailed(ReplayError),
}

/// One controller per mounted game view; it exclusively owns the store
/// and identity for that session.
#[derive(Debug, Default)]
pub struct SessionController {
    state: SessionState,
    store: GameStateStore,
    identity: ClientIdentity,
    player1: Option<String>,
    player2: Option<String>,
    /// A local move was applied and sent but not yet confirmed.
    pending_move: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Connecting
    }
}

impl SessionController {
    pub fn new() -> Self {
        SessionController::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn store(&self) -> &GameStateStore {
        &self.store
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn players(&self) -> (Option<&str>, Option<&str>) {
        (self.player1.as_deref(), self.player2.as_deref())
    }

    /// The one action valid on a freshly opened connection. Idempotent:
    /// the same join is re-sent on every reconnect.
    pub fn on_open(&mut self) -> ClientAction {
        self.state = SessionState::Connecting;
        ClientAction::JoinGame
    }

    /// Process one inbound text frame. Malformed frames are logged and
    /// dropped; nothing here may panic or change state on bad input.
    pub fn on_frame(&mut self, raw: &str) -> Vec<SessionEvent> {
        let envelope = match serde_json::from_str(raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!("dropping malformed frame: {}", err);
                return Vec::new();
            }
        };

        match router::classify(envelope) {
            Routed::MoveRejected => self.handle_rejection(),
            Routed::Connected { user } => {
                info!("connected as {}", user);
                self.identity.bind_username(user.clone());
                vec![SessionEvent::IdentityConfirmed { user }]
            }
            Routed::Joined { game, rejoined } => self.handle_joined(game, rejoined),
            Routed::Moved { by, game } => self.handle_moved(by, game),
            Routed::Ended { game } => self.finish(&game),
            Routed::DrawOffered => vec![SessionEvent::DrawOffered],
            Routed::Malformed { reason } => {
                warn!("dropping malformed message: {}", reason);
                Vec::new()
            }
            Routed::Discarded => Vec::new(),
            Routed::Unhandled { info } => {
                debug!("unhandled message info: {}", info);
                Vec::new()
            }
        }
    }

    /// Local move intent from the board (square click or drag-drop).
    /// Accepted only in `MyTurn`; anywhere else it is a silent no-op.
    /// On success the move is already applied locally and the returned
    /// action must be sent to the server.
    pub fn on_drop(
        &mut self,
        from: &str,
        to: &str,
        promotion: Option<char>,
    ) -> Option<ClientAction> {
        if self.state != SessionState::MyTurn {
            return None;
        }
        let uci = self.store.apply_local_move(from, to, promotion)?;
        self.pending_move = true;
        self.state = SessionState::OpponentTurn;
        Some(ClientAction::MakeMove { uci })
    }

    // Fire-and-forget intents: no local state changes; their effect
    // arrives later as a terminal or informational message.

    pub fn resign(&self) -> ClientAction {
        ClientAction::ResignGame
    }

    pub fn offer_draw(&self) -> ClientAction {
        ClientAction::DrawRequest
    }

    pub fn abort(&self) -> ClientAction {
        ClientAction::AbortGame
    }

    pub fn pause(&self) -> ClientAction {
        ClientAction::PauseRequest
    }

    /// The transport closed or failed. Game flow does not resume until
    /// a new connection is opened and `on_open` is sent again.
    pub fn on_disconnect(&mut self) {
        self.state = SessionState::Disconnected;
        self.pending_move = false;
        self.identity.reset_color();
    }

    fn handle_rejection(&mut self) -> Vec<SessionEvent> {
        if !self.pending_move {
            warn!("server rejected a move but none is pending");
            return Vec::new();
        }
        self.store.rollback_last_move();
        self.pending_move = false;
        // The only optimistic moves are our own, so the pre-move state
        // was necessarily our turn.
        self.state = SessionState::MyTurn;
        vec![SessionEvent::MoveRejected, SessionEvent::PositionChanged]
    }

    fn handle_joined(&mut self, game: GameSnapshot, rejoined: bool) -> Vec<SessionEvent> {
        self.player1 = game.player1.clone();
        self.player2 = game.player2.clone();

        let my_color = self.identity.resolve_color(&game);
        if let Some(color) = my_color {
            self.store.set_local_color(color);
        }
        let my_turn = self
            .identity
            .username()
            .map(|user| game.is_turn_of(user))
            .unwrap_or(false);

        let mut events = Vec::new();
        if rejoined {
            // The server's history is authoritative; the local
            // pre-reconnect state is never trusted.
            if let Err(err) = self.store.load_from_history(&game.moves) {
                warn!("{}", err);
                self.state = SessionState::Disconnected;
                events.push(SessionEvent::ReplayFailed(err));
                return events;
            }
            self.pending_move = false;
            events.push(SessionEvent::PositionChanged);
        }

        events.push(SessionEvent::GameJoined {
            player1: self.player1.clone(),
            player2: self.player2.clone(),
            my_color,
            my_turn,
        });

        if game.status == Some(GamePhase::Ended) {
            events.extend(self.finish(&game));
        } else if !my_turn && self.player2.is_none() {
            // Nobody to wait a move from yet. When the turn is ours we
            // enter MyTurn even before an opponent arrives.
            self.state = SessionState::WaitingForOpponent;
        } else {
            self.state = self.turn_state(my_turn);
        }
        events
    }

    fn handle_moved(&mut self, by: Option<String>, game: GameSnapshot) -> Vec<SessionEvent> {
        let my_turn = self
            .identity
            .username()
            .map(|user| game.is_turn_of(user))
            .unwrap_or(false);

        let mut events = Vec::new();
        if self.identity.is_me(by.as_deref()) {
            // Echo of our own optimistic move; the board is already
            // correct, the move is now durable.
            self.pending_move = false;
        } else {
            match game.last_move.as_deref() {
                Some(uci) => {
                    if self.store.apply_remote_move(uci) {
                        events.push(SessionEvent::PositionChanged);
                    } else {
                        warn!("opponent move {} does not apply locally", uci);
                    }
                }
                None => {
                    warn!("dropping moved message without a move");
                    return events;
                }
            }
        }

        if game.status == Some(GamePhase::Ended) {
            events.extend(self.finish(&game));
        } else {
            self.state = self.turn_state(my_turn);
        }
        events
    }

    fn finish(&mut self, game: &GameSnapshot) -> Vec<SessionEvent> {
        let outcome = GameOutcome::from_snapshot(game);
        info!(
            "game over: winner={:?} over_type={:?}",
            outcome.winner, outcome.over_type
        );
        self.state = SessionState::GameOver;
        self.pending_move = false;
        vec![SessionEvent::GameOver(outcome)]
    }

    fn turn_state(&self, my_turn: bool) -> SessionState {
        if my_turn {
            SessionState::MyTurn
        } else {
            SessionState::OpponentTurn
        }
    }
}
