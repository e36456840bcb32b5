//! Parsing of the `d` board dump.

use crate::UciError;

/// Prefix of the dump line carrying the position.
pub const FEN_MARKER: &str = "Fen:";

/// Piece-placement field of the position reported by a `d` dump.
///
/// The dump line looks like `Fen: rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1`;
/// only the first token after the marker is returned.
pub fn extract_position_fen<S: AsRef<str>>(lines: &[S]) -> Result<String, UciError> {
    lines
        .iter()
        .map(|l| l.as_ref().trim_start())
        .find_map(|l| l.strip_prefix(FEN_MARKER))
        .and_then(|rest| rest.split_whitespace().next())
        .map(str::to_string)
        .ok_or(UciError::MissingFen)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_from_stockfish_dump() {
        let dump = [
            "",
            " +---+---+---+---+---+---+---+---+",
            " | r | n | b | q | k | b | n | r | 8",
            " +---+---+---+---+---+---+---+---+",
            "   a   b   c   d   e   f   g   h",
            "",
            "Fen: rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
            "Key: 8F8F01D4562F59FB",
            "Checkers: ",
        ];
        assert_eq!(
            extract_position_fen(&dump).unwrap(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR"
        );
    }

    #[test]
    fn missing_fen_line() {
        let dump = ["Key: 8F8F01D4562F59FB", "Checkers: "];
        assert_eq!(extract_position_fen(&dump), Err(UciError::MissingFen));
    }

    #[test]
    fn empty_fen_line() {
        assert_eq!(extract_position_fen(&["Fen:"]), Err(UciError::MissingFen));
    }
}
