//! Engine-correlation scoring of chess games.
//!
//! For every move of a game, a UCI engine is asked for its own choice in the
//! same position. Moves that differ are compared through two searches
//! restricted to each move, and the centipawn gap is accumulated per player.
//! The per-player total is written back onto the player's name as
//! `<name> - MC: <score>`.
//!
//! # Overview
//!
//! - [`EngineSession`] - Launches, configures and stops the engine process
//! - [`ProtocolClient`] - Sends commands and collects line responses
//! - [`MoveScorer`] - Scores a single move against the engine
//! - [`evaluate_correlation`] - Annotates a whole collection of games
//! - [`GameRecord`] - What a game must expose to be annotated
//!
//! # Example
//!
//! ```ignore
//! use engine_correlation::{evaluate_correlation, EngineConfig, RunOptions};
//!
//! let modified = evaluate_correlation(&mut games, &EngineConfig::default(), &RunOptions::default())?;
//! println!("{modified} games annotated");
//! ```

pub mod annotation;
pub mod client;
pub mod config;
pub mod error;
pub mod game;
pub mod locator;
pub mod orchestrator;
pub mod scorer;
pub mod session;
pub mod wait;

pub use annotation::{annotate, annotation_score, is_annotated, strip_annotation};
pub use client::{EngineResponse, ProtocolClient, READY_OK};
pub use config::{EngineConfig, MAX_WAIT_GROWTH};
pub use error::{EngineError, LaunchError};
pub use game::{Color, GameError, GameRecord, Ply};
pub use locator::{binary_for, check_executable, resolve_engine_path, ENGINE_BINARIES};
pub use orchestrator::{
    annotate_games, evaluate_correlation, strip_correlation, CorrelationError, RunOptions,
};
pub use scorer::{correlation_from_evaluations, grade, MoveOutcome, MoveScore, MoveScorer};
pub use session::{configuration_commands, with_session, EngineSession};
pub use wait::{Backoff, CancelToken, WaitOutcome, MAX_CYCLE_WAIT};
