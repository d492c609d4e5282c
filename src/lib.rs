//! Client-side game-session synchronization engine for online chess.
//!
//! Owns a single server-authoritative game over a persistent websocket:
//! the connection lifecycle, the message protocol and its routing, a
//! local rules-validating chess-state container, and the reconciliation
//! logic (optimistic apply, rollback on rejection, history replay on
//! reconnect) that keeps the local view consistent with the server.
//!
//! Board rendering and UI composition are external collaborators; the
//! [`session::SessionController`] surfaces events for them and accepts
//! their move intents, nothing more.

pub mod error;
pub mod game;
pub mod models;
pub mod session;

pub use error::{EngineError, ReplayError, SessionError};
pub use game::{GameStateStore, Position};
pub use models::{ClientAction, ClientIdentity, GameOutcome};
pub use session::{SessionConnection, SessionController, SessionEvent, SessionState};
