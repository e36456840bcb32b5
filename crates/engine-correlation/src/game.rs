//! The view of a game the correlation run needs.

use thiserror::Error;
use uci::CoordinateMove;

/// Side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    /// Name of the player tag for this side.
    pub fn tag_name(self) -> &'static str {
        match self {
            Color::White => "White",
            Color::Black => "Black",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }
}

/// One half-move: the position before it, the move played and who played it.
#[derive(Debug, Clone, PartialEq)]
pub struct Ply {
    pub fen: String,
    pub played: CoordinateMove,
    pub mover: Color,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    /// The game's moves cannot be replayed from its start position.
    #[error("Malformed game: {0}")]
    Malformed(String),
}

/// A game whose moves can be replayed and whose player names can be rewritten.
pub trait GameRecord {
    /// Every ply of the main line, in order.
    fn plies(&self) -> Result<Vec<Ply>, GameError>;

    fn player(&self, color: Color) -> String;

    fn set_player(&mut self, color: Color, name: String);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_indices_are_distinct() {
        assert_eq!(Color::White.index(), 0);
        assert_eq!(Color::Black.index(), 1);
        assert_eq!(Color::ALL.map(Color::tag_name), ["White", "Black"]);
    }

    #[test]
    fn test_game_error_display() {
        let err = GameError::Malformed("illegal move Qh9".to_string());
        assert_eq!(err.to_string(), "Malformed game: illegal move Qh9");
    }
}
