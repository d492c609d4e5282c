//! Classification of inbound protocol messages.
//!
//! The single place that knows the wire vocabulary. Pure: an envelope
//! goes in, a [`Routed`] event comes out, nothing is mutated here.

use log::debug;

use crate::models::{Envelope, GameSnapshot, Scope};

/// What an inbound envelope means for this client.
#[derive(Debug, Clone)]
pub enum Routed {
    /// The server rejected our last move (`only_me` + `invalid`).
    MoveRejected,
    /// Broadcast not relevant to this client's projection.
    Discarded,
    /// The server confirmed who we are.
    Connected { user: String },
    /// We joined (or rejoined) the session.
    Joined {
        game: GameSnapshot,
        rejoined: bool,
    },
    /// A move was accepted for one of the participants.
    Moved {
        by: Option<String>,
        game: GameSnapshot,
    },
    /// The game ended (resignation, abort, ...).
    Ended { game: GameSnapshot },
    /// The opponent offered a draw.
    DrawOffered,
    /// A relevant message was missing a field it needs.
    Malformed { reason: &'static str },
    /// Recognized audience, unrecognized info. Logged and dropped.
    Unhandled { info: String },
}

/// Classify an envelope, in priority order: rejection notices first,
/// then the audience filter, then dispatch by `info`.
pub fn classify(envelope: Envelope) -> Routed {
    let Envelope { message, game } = envelope;

    if message.scope == Scope::OnlyMe && message.info == "invalid" {
        return Routed::MoveRejected;
    }

    // Everything else is relevant only when addressed to both players,
    // except the initial identity confirmation.
    if message.scope != Scope::Both && message.info != "connected" {
        debug!("discarding {} message with scope {:?}", message.info, message.scope);
        return Routed::Discarded;
    }

    match message.info.as_str() {
        "connected" => match message.player {
            Some(player) => Routed::Connected { user: player.user },
            None => Routed::Malformed {
                reason: "connected without player",
            },
        },
        "joined" | "reconnected" => match game {
            Some(game) => Routed::Joined {
                game,
                rejoined: message.info == "reconnected",
            },
            None => Routed::Malformed {
                reason: "joined without game snapshot",
            },
        },
        "moved" => match game {
            Some(game) => Routed::Moved {
                by: message.player.map(|p| p.user),
                game,
            },
            None => Routed::Malformed {
                reason: "moved without game snapshot",
            },
        },
        "resigned" | "aborted" => match game {
            Some(game) => Routed::Ended { game },
            None => Routed::Malformed {
                reason: "game-over without game snapshot",
            },
        },
        "draw_offered" => Routed::DrawOffered,
        other => Routed::Unhandled {
            info: other.to_string(),
        },
    }
}
