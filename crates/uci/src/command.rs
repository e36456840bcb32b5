//! UCI commands sent from the analysis client to the engine.

use std::fmt;

/// Commands sent from the client to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    /// Initialize UCI mode.
    Uci,
    /// Check if engine is ready.
    IsReady,
    /// Set an engine option.
    SetOption { name: String, value: String },
    /// Reset the engine's internal game history.
    NewGame,
    /// Set up a position from FEN.
    PositionFen(String),
    /// Start calculating.
    Go(GoOptions),
    /// Print the engine's view of the board (Stockfish extension).
    Debug,
    /// Quit the engine.
    Quit,
}

/// Options for the `go` command.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GoOptions {
    /// Search to this depth.
    pub depth: Option<u32>,
    /// Restrict the search to these moves (long algebraic).
    pub searchmoves: Vec<String>,
}

impl GoOptions {
    /// Fixed-depth search over all legal moves.
    pub fn depth(depth: u32) -> Self {
        Self {
            depth: Some(depth),
            searchmoves: Vec::new(),
        }
    }

    /// Restrict the search to a single move.
    pub fn searchmove(mut self, mv: impl Into<String>) -> Self {
        self.searchmoves.push(mv.into());
        self
    }
}

impl EngineCommand {
    /// Shorthand for `setoption name <name> value <value>`.
    pub fn set_option(name: &str, value: impl ToString) -> Self {
        EngineCommand::SetOption {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// Format the command as a single protocol line (no trailing newline).
    pub fn to_uci(&self) -> String {
        match self {
            EngineCommand::Uci => "uci".to_string(),
            EngineCommand::IsReady => "isready".to_string(),
            EngineCommand::SetOption { name, value } => {
                format!("setoption name {} value {}", name, value)
            }
            EngineCommand::NewGame => "ucinewgame".to_string(),
            EngineCommand::PositionFen(fen) => format!("position fen {}", fen),
            EngineCommand::Go(opts) => {
                let mut parts = vec!["go".to_string()];
                if let Some(d) = opts.depth {
                    parts.push(format!("depth {}", d));
                }
                if !opts.searchmoves.is_empty() {
                    parts.push(format!("searchmoves {}", opts.searchmoves.join(" ")));
                }
                parts.join(" ")
            }
            EngineCommand::Debug => "d".to_string(),
            EngineCommand::Quit => "quit".to_string(),
        }
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uci())
    }
}
