//! Best-move extraction from a `go` response.

use crate::{UciError, BESTMOVE_PREFIX};
use std::fmt;
use std::str::FromStr;

/// Token engines print instead of a move when the side to move has none.
pub const NO_MOVE: &str = "(none)";

/// A move as an origin/destination square pair in long algebraic form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoordinateMove {
    pub from: String,
    pub to: String,
    /// Promotion piece letter, lowercase (`q`, `r`, `b`, `n`).
    pub promotion: Option<char>,
}

fn is_square(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 2 && (b'a'..=b'h').contains(&b[0]) && (b'1'..=b'8').contains(&b[1])
}

impl FromStr for CoordinateMove {
    type Err = UciError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.is_ascii() || !(s.len() == 4 || s.len() == 5) {
            return Err(UciError::InvalidMove(s.to_string()));
        }
        let (from, to) = (&s[0..2], &s[2..4]);
        if !is_square(from) || !is_square(to) {
            return Err(UciError::InvalidMove(s.to_string()));
        }
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(c) if matches!(c.to_ascii_lowercase(), 'q' | 'r' | 'b' | 'n') => {
                Some(c.to_ascii_lowercase())
            }
            Some(_) => return Err(UciError::InvalidMove(s.to_string())),
        };
        Ok(Self {
            from: from.to_string(),
            to: to.to_string(),
            promotion,
        })
    }
}

impl fmt::Display for CoordinateMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(p) = self.promotion {
            write!(f, "{}", p)?;
        }
        Ok(())
    }
}

/// The engine's answer to a `go` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestMove {
    Move(CoordinateMove),
    /// The engine reported no legal move (terminal position).
    NoMove,
}

/// Extract the best move from the last `bestmove` line of a response.
///
/// Format: `bestmove <move> [ponder <move>]`.
///
/// # Errors
///
/// Returns [`UciError::MissingBestMove`] if no line carries a move, and
/// [`UciError::InvalidMove`] if the move is not in coordinate notation.
pub fn extract_best_move<S: AsRef<str>>(lines: &[S]) -> Result<BestMove, UciError> {
    let line = lines
        .iter()
        .rev()
        .map(|l| l.as_ref())
        .find(|l| l.contains(BESTMOVE_PREFIX))
        .ok_or(UciError::MissingBestMove)?;

    let (_, rest) = line
        .split_once(BESTMOVE_PREFIX)
        .ok_or(UciError::MissingBestMove)?;
    let token = rest
        .split_whitespace()
        .next()
        .ok_or(UciError::MissingBestMove)?;

    if token == NO_MOVE {
        return Ok(BestMove::NoMove);
    }
    Ok(BestMove::Move(token.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(s: &str) -> CoordinateMove {
        s.parse().unwrap()
    }

    #[test]
    fn parse_coordinate_move() {
        let m = mv("e2e4");
        assert_eq!(m.from, "e2");
        assert_eq!(m.to, "e4");
        assert_eq!(m.promotion, None);
        assert_eq!(m.to_string(), "e2e4");
    }

    #[test]
    fn parse_promotion_move() {
        let m = mv("e7e8q");
        assert_eq!(m.promotion, Some('q'));
        assert_eq!(m.to_string(), "e7e8q");
    }

    #[test]
    fn reject_malformed_moves() {
        for bad in ["", "e2", "e2e9", "i2e4", "e7e8k", "e2e4e5"] {
            assert!(bad.parse::<CoordinateMove>().is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn extract_with_ponder() {
        let lines = [
            "info depth 10 seldepth 14 multipv 1 score cp 31 nodes 21030 nps 1051500 pv e2e4 e7e5",
            "bestmove e2e4 ponder e7e5",
        ];
        assert_eq!(extract_best_move(&lines).unwrap(), BestMove::Move(mv("e2e4")));
    }

    #[test]
    fn extract_uses_last_bestmove_line() {
        let lines = ["bestmove a2a3", "info depth 1 score cp 0 nodes 1", "bestmove g1f3"];
        assert_eq!(extract_best_move(&lines).unwrap(), BestMove::Move(mv("g1f3")));
    }

    #[test]
    fn extract_no_move() {
        let lines = ["info depth 0 score mate 0", "bestmove (none)"];
        assert_eq!(extract_best_move(&lines).unwrap(), BestMove::NoMove);
    }

    #[test]
    fn extract_missing_bestmove() {
        let lines = ["info depth 3 score cp 12 nodes 300"];
        assert_eq!(extract_best_move(&lines), Err(UciError::MissingBestMove));

        let lines = ["bestmove"];
        assert_eq!(extract_best_move(&lines), Err(UciError::MissingBestMove));
    }
}
