//! The authoritative local view of the current game.
//!
//! Every mutation goes through [`Position`] operations; the turn and
//! check indicators are derived from the rules engine after each change,
//! never stored independently. The position stack makes rollback an
//! exact restore of the pre-move state.

use chess::{Color, Square};
use log::debug;

use crate::error::ReplayError;
use crate::game::engine::{self, parse_square, MoveDetail, Position};
use crate::models::MoveRecord;

/// Local game state: position stack, applied moves and derived fields.
#[derive(Debug, Clone, Default)]
pub struct GameStateStore {
    /// Position after each applied move; the starting position is implicit.
    positions: Vec<Position>,
    moves: Vec<MoveDetail>,
    local_color: Option<Color>,
}

impl GameStateStore {
    pub fn new() -> Self {
        GameStateStore::default()
    }

    pub fn set_local_color(&mut self, color: Color) {
        self.local_color = Some(color);
    }

    pub fn local_color(&self) -> Option<Color> {
        self.local_color
    }

    /// The current position (starting position before any move).
    pub fn position(&self) -> Position {
        self.positions.last().cloned().unwrap_or_default()
    }

    pub fn fen(&self) -> String {
        self.position().fen()
    }

    pub fn turn(&self) -> Color {
        self.position().turn()
    }

    pub fn is_local_turn(&self) -> bool {
        self.local_color == Some(self.turn())
    }

    pub fn check_square(&self) -> Option<Square> {
        self.position().check_square()
    }

    pub fn last_move(&self) -> Option<(Square, Square)> {
        self.moves.last().map(|m| (m.from, m.to))
    }

    /// Applied moves in order, as uci strings, for display/navigation.
    pub fn moves(&self) -> Vec<String> {
        self.moves.iter().map(|m| m.uci.clone()).collect()
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    /// Legal destinations for the piece on `square` (square-click
    /// move building in the UI).
    pub fn legal_destinations(&self, square: &str) -> Vec<Square> {
        match parse_square(square) {
            Ok(sq) => self.position().legal_destinations(sq),
            Err(_) => Vec::new(),
        }
    }

    /// Apply the local player's own move. Succeeds only when it is the
    /// local side's turn and the move is legal; otherwise nothing
    /// changes. Returns the normalized uci that must be sent to the
    /// server.
    pub fn apply_local_move(
        &mut self,
        from: &str,
        to: &str,
        promotion: Option<char>,
    ) -> Option<String> {
        if !self.is_local_turn() {
            debug!("local move {}{} rejected: not the local player's turn", from, to);
            return None;
        }
        let from = parse_square(from).ok()?;
        let to = parse_square(to).ok()?;
        let promotion = promotion.and_then(engine::promotion_piece);
        match self.position().try_move(from, to, promotion) {
            Ok((next, detail)) => {
                let uci = detail.uci.clone();
                self.positions.push(next);
                self.moves.push(detail);
                Some(uci)
            }
            Err(err) => {
                debug!("local move rejected: {}", err);
                None
            }
        }
    }

    /// Apply a move received from the opponent through the protocol.
    pub fn apply_remote_move(&mut self, uci: &str) -> bool {
        match self.position().try_uci_move(uci) {
            Ok((next, detail)) => {
                self.positions.push(next);
                self.moves.push(detail);
                true
            }
            Err(err) => {
                debug!("remote move {} rejected: {}", uci, err);
                false
            }
        }
    }

    /// Remove the most recent move and restore the exact prior position.
    /// No-op on empty history.
    pub fn rollback_last_move(&mut self) {
        self.positions.pop();
        self.moves.pop();
    }

    /// Discard everything and return to the starting position. The
    /// local color assignment survives.
    pub fn reset(&mut self) {
        self.positions.clear();
        self.moves.clear();
    }

    /// Rebuild the whole game from the server's move history. On replay
    /// failure the store is left untouched.
    pub fn load_from_history(&mut self, records: &[MoveRecord]) -> Result<(), ReplayError> {
        let applied = engine::replay(records)?;
        self.positions.clear();
        self.moves.clear();
        for (position, detail) in applied {
            self.positions.push(position);
            self.moves.push(detail);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(uci: &str, secs: i64) -> MoveRecord {
        MoveRecord {
            uci: uci.to_string(),
            played_at: Utc.timestamp_opt(secs, 0).unwrap(),
            played_by: None,
        }
    }

    fn white_store() -> GameStateStore {
        let mut store = GameStateStore::new();
        store.set_local_color(Color::White);
        store
    }

    #[test]
    fn local_move_flips_turn_and_sets_last_move() {
        let mut store = white_store();
        let uci = store.apply_local_move("e2", "e4", None);
        assert_eq!(uci.as_deref(), Some("e2e4"));
        assert_eq!(store.turn(), Color::Black);
        assert_eq!(
            store.last_move(),
            Some((parse_square("e2").unwrap(), parse_square("e4").unwrap()))
        );
        assert!(store.fen().contains(" b "));
    }

    #[test]
    fn out_of_turn_local_move_is_a_pure_no_op() {
        let mut store = GameStateStore::new();
        store.set_local_color(Color::Black);
        let before = store.fen();
        assert_eq!(store.apply_local_move("e2", "e4", None), None);
        assert_eq!(store.fen(), before);
        assert_eq!(store.move_count(), 0);
    }

    #[test]
    fn illegal_local_move_is_a_pure_no_op() {
        let mut store = white_store();
        let before = store.fen();
        assert_eq!(store.apply_local_move("e2", "e5", None), None);
        assert_eq!(store.fen(), before);
        assert!(store.last_move().is_none());
    }

    #[test]
    fn move_then_rollback_restores_exact_fen() {
        let mut store = white_store();
        let before = store.fen();
        store.apply_local_move("e2", "e4", None).unwrap();
        store.rollback_last_move();
        assert_eq!(store.fen(), before);
        assert_eq!(store.move_count(), 0);
        assert!(store.is_local_turn());
    }

    #[test]
    fn rollback_on_empty_history_is_a_no_op() {
        let mut store = white_store();
        let before = store.fen();
        store.rollback_last_move();
        assert_eq!(store.fen(), before);
    }

    #[test]
    fn remote_move_applies_for_the_opponent() {
        let mut store = white_store();
        store.apply_local_move("e2", "e4", None).unwrap();
        assert!(store.apply_remote_move("e7e5"));
        assert_eq!(store.turn(), Color::White);
        assert_eq!(store.moves(), vec!["e2e4".to_string(), "e7e5".to_string()]);
        assert!(!store.apply_remote_move("e7e5"));
    }

    #[test]
    fn replay_matches_step_by_step_application() {
        let mut step = white_store();
        step.apply_local_move("e2", "e4", None).unwrap();
        step.apply_remote_move("e7e5");
        step.apply_local_move("g1", "f3", None).unwrap();

        let mut replayed = white_store();
        replayed
            .load_from_history(&[
                record("e2e4", 1),
                record("e7e5", 2),
                record("g1f3", 3),
            ])
            .unwrap();

        assert_eq!(replayed.fen(), step.fen());
        assert_eq!(replayed.moves(), step.moves());
    }

    #[test]
    fn failed_replay_leaves_store_untouched() {
        let mut store = white_store();
        store.apply_local_move("d2", "d4", None).unwrap();
        let before = store.fen();

        let err = store
            .load_from_history(&[record("e7e5", 1), record("e2e4", 2)])
            .unwrap_err();
        assert_eq!(err.uci, "e7e5");
        assert_eq!(store.fen(), before);
        assert_eq!(store.move_count(), 1);
    }

    #[test]
    fn legal_destinations_queries_current_position() {
        let store = white_store();
        assert_eq!(store.legal_destinations("e2").len(), 2);
        assert!(store.legal_destinations("e5").is_empty());
        assert!(store.legal_destinations("not-a-square").is_empty());
    }
}
