//! UCI (Universal Chess Interface) protocol pieces for analysis clients.
//!
//! This crate covers the client side of the protocol: rendering the commands
//! an analysis driver sends, and pulling structured values out of the
//! free-form text an engine prints back.
//!
//! # Commands sent
//!
//! - `uci` / `isready` - Handshake and synchronization
//! - `setoption name <id> value <x>` - Engine configuration
//! - `ucinewgame` - Reset engine-internal game state
//! - `position fen <fen>` - Set position
//! - `go depth <d> [searchmoves <move>...]` - Start search
//! - `d` - Debug dump of the current board
//! - `quit` - Exit engine
//!
//! # Output consumed
//!
//! - `info depth <n> ... score cp <x> [upperbound|lowerbound] ... nodes <n> ...`
//! - `info depth <n> ... score mate <n> ... nodes <n> ...`
//! - `bestmove <move> [ponder <move>]`
//! - `Fen: <fen>` (from the `d` dump)

mod bestmove;
mod command;
mod dump;
mod info;

pub use bestmove::{extract_best_move, BestMove, CoordinateMove, NO_MOVE};
pub use command::{EngineCommand, GoOptions};
pub use dump::{extract_position_fen, FEN_MARKER};
pub use info::{extract_evaluation, is_search_line, Evaluation, ScoreRule, SCORE_RULES};

use thiserror::Error;

/// Prefix of the line that ends a `go` response.
pub const BESTMOVE_PREFIX: &str = "bestmove ";

/// Errors raised while interpreting engine output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UciError {
    #[error("No bestmove line in engine output")]
    MissingBestMove,
    #[error("Invalid move: {0}")]
    InvalidMove(String),
    #[error("No search line with a score in engine output")]
    MissingScore,
    #[error("Unparseable score in line: {0}")]
    UnparseableScore(String),
    #[error("No FEN line in engine output")]
    MissingFen,
}
