//! Thin boundary around the `chess` rules library.
//!
//! [`Position`] is an immutable value: applying a move yields a new
//! position and leaves the original untouched, which is what makes
//! rollback and replay cheap and exact.

use std::str::FromStr;

use chess::{Board, ChessMove, Color, MoveGen, Piece, Rank, Square};

use crate::error::{EngineError, ReplayError};
use crate::models::MoveRecord;

/// A chess position with rules-derived queries.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    board: Board,
}

/// What a successful move application produced, besides the new position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveDetail {
    pub uci: String,
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
}

impl Default for Position {
    fn default() -> Self {
        Position {
            board: Board::default(),
        }
    }
}

impl FromStr for Position {
    type Err = EngineError;

    fn from_str(fen: &str) -> Result<Self, Self::Err> {
        let board =
            Board::from_str(fen).map_err(|_| EngineError::InvalidFen(fen.to_string()))?;
        Ok(Position { board })
    }
}

impl Position {
    pub fn fen(&self) -> String {
        self.board.to_string()
    }

    pub fn turn(&self) -> Color {
        self.board.side_to_move()
    }

    /// King square of the side to move, if that king is in check.
    pub fn check_square(&self) -> Option<Square> {
        if self.board.checkers().0 != 0 {
            Some(self.board.king_square(self.board.side_to_move()))
        } else {
            None
        }
    }

    /// Legal destination squares for the piece on `from`.
    pub fn legal_destinations(&self, from: Square) -> Vec<Square> {
        MoveGen::new_legal(&self.board)
            .filter(|m| m.get_source() == from)
            .map(|m| m.get_dest())
            .collect()
    }

    /// Apply a move without mutating this position.
    ///
    /// The promotion piece is attached only when the move actually
    /// promotes; a missing promotion on a promoting move defaults to a
    /// queen.
    pub fn try_move(
        &self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> Result<(Position, MoveDetail), EngineError> {
        let promotion = if self.is_promotion(from, to) {
            Some(promotion.unwrap_or(Piece::Queen))
        } else {
            None
        };

        let mv = ChessMove::new(from, to, promotion);
        if !self.board.legal(mv) {
            return Err(EngineError::IllegalMove(format_uci(from, to, promotion)));
        }

        let detail = MoveDetail {
            uci: format_uci(from, to, promotion),
            from,
            to,
            promotion,
        };
        Ok((
            Position {
                board: self.board.make_move_new(mv),
            },
            detail,
        ))
    }

    /// Apply a move given in uci notation.
    pub fn try_uci_move(&self, uci: &str) -> Result<(Position, MoveDetail), EngineError> {
        let (from, to, promotion) = parse_uci(uci)?;
        self.try_move(from, to, promotion)
    }

    fn is_promotion(&self, from: Square, to: Square) -> bool {
        let back_rank = match self.board.side_to_move() {
            Color::White => Rank::Eighth,
            Color::Black => Rank::First,
        };
        self.board.piece_on(from) == Some(Piece::Pawn) && to.get_rank() == back_rank
    }
}

/// Rebuild a position from the starting board by applying the given move
/// history, sorted by `played_at` ascending.
///
/// Returns the intermediate positions and move details in application
/// order. An illegal move anywhere in the sequence fails the whole
/// replay; there is no partial result.
pub fn replay(records: &[MoveRecord]) -> Result<Vec<(Position, MoveDetail)>, ReplayError> {
    let mut ordered: Vec<&MoveRecord> = records.iter().collect();
    ordered.sort_by_key(|record| record.played_at);

    let mut applied = Vec::with_capacity(ordered.len());
    let mut current = Position::default();
    for (index, record) in ordered.iter().enumerate() {
        let (next, detail) = current.try_uci_move(&record.uci).map_err(|_| ReplayError {
            index,
            uci: record.uci.clone(),
        })?;
        current = next.clone();
        applied.push((next, detail));
    }
    Ok(applied)
}

/// Parse a square name like `"e2"`.
pub fn parse_square(name: &str) -> Result<Square, EngineError> {
    Square::from_str(&name.to_lowercase())
        .map_err(|_| EngineError::InvalidSquare(name.to_string()))
}

/// Parse a uci move (`<from><to>[qrbn]`, 4 or 5 characters).
pub fn parse_uci(uci: &str) -> Result<(Square, Square, Option<Piece>), EngineError> {
    // The byte slicing below requires ascii; moves arrive off the wire,
    // so reject anything else instead of hitting a char boundary.
    if !uci.is_ascii() || (uci.len() != 4 && uci.len() != 5) {
        return Err(EngineError::InvalidUci(uci.to_string()));
    }
    let from = parse_square(&uci[0..2])?;
    let to = parse_square(&uci[2..4])?;
    let promotion = match uci[4..].chars().next() {
        None => None,
        Some(letter) => Some(
            promotion_piece(letter).ok_or_else(|| EngineError::InvalidUci(uci.to_string()))?,
        ),
    };
    Ok((from, to, promotion))
}

/// Promotion piece for a uci promotion letter.
pub fn promotion_piece(letter: char) -> Option<Piece> {
    match letter.to_ascii_lowercase() {
        'q' => Some(Piece::Queen),
        'r' => Some(Piece::Rook),
        'b' => Some(Piece::Bishop),
        'n' => Some(Piece::Knight),
        _ => None,
    }
}

fn promotion_letter(piece: Piece) -> char {
    match piece {
        Piece::Queen => 'q',
        Piece::Rook => 'r',
        Piece::Bishop => 'b',
        Piece::Knight => 'n',
        _ => '?',
    }
}

fn format_uci(from: Square, to: Square, promotion: Option<Piece>) -> String {
    match promotion {
        Some(piece) => format!("{}{}{}", from, to, promotion_letter(piece)),
        None => format!("{}{}", from, to),
    }
}
