//! Correlate - engine-correlation annotation for PGN collections.
//!
//! # Modules
//!
//! - [`config`] - `correlate.toml` loading
//! - [`pgn`] - PGN reading and writing, and the game view used for scoring

pub mod config;
pub mod pgn;
