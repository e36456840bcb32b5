//! Correlation runs over collections of games.

use std::io::Write;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, trace};

use crate::annotation::{annotate, is_annotated, strip_annotation};
use crate::client::ProtocolClient;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::game::{Color, GameError, GameRecord};
use crate::locator::resolve_engine_path;
use crate::scorer::MoveScorer;
use crate::session::with_session;
use crate::wait::Backoff;

/// Per-run analysis settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Search depth for every query.
    pub depth: u32,
    /// First polling wait of a search, in milliseconds.
    pub wait_ms: u64,
    /// Re-score sides that are already annotated.
    pub force: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            depth: 12,
            wait_ms: 50,
            force: false,
        }
    }
}

#[derive(Error, Debug)]
pub enum CorrelationError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Score every eligible side of `games` against a freshly launched engine and
/// annotate the player names.
///
/// Returns the number of games that had at least one name rewritten. The
/// engine is stopped before returning, whether or not the run succeeded.
///
/// # Errors
///
/// * [`CorrelationError::Engine`] - The engine could not be found, started
///   or queried; games scored before the failure keep their new names
/// * [`CorrelationError::Game`] - A game's moves could not be replayed
pub fn evaluate_correlation<G: GameRecord>(
    games: &mut [G],
    engine: &EngineConfig,
    options: &RunOptions,
) -> Result<usize, CorrelationError> {
    let path = resolve_engine_path(engine).map_err(EngineError::from)?;
    let backoff = Backoff::new(Duration::from_millis(options.wait_ms), engine.wait_growth);
    let scorer = MoveScorer::new(options.depth, backoff);

    info!(
        games = games.len(),
        depth = options.depth,
        force = options.force,
        "starting correlation run"
    );
    let modified = with_session(&path, engine, |client| {
        annotate_games(client, games, &scorer, options.force)
    })?;
    info!(modified, "correlation run finished");
    Ok(modified)
}

/// Annotate `games` using an already configured engine client.
///
/// Sides whose names are already annotated are skipped unless `force` is
/// set. A game whose sides are both skipped costs no engine query.
pub fn annotate_games<W: Write, G: GameRecord>(
    client: &mut ProtocolClient<W>,
    games: &mut [G],
    scorer: &MoveScorer,
    force: bool,
) -> Result<usize, CorrelationError> {
    let mut modified = 0;
    for (index, game) in games.iter_mut().enumerate() {
        if annotate_game(client, game, scorer, force)? {
            modified += 1;
            info!(
                game = index + 1,
                white = %game.player(Color::White),
                black = %game.player(Color::Black),
                "annotated game"
            );
        } else {
            debug!(game = index + 1, "game already annotated, skipping");
        }
    }
    Ok(modified)
}

/// True if at least one player name was written.
fn annotate_game<W: Write, G: GameRecord>(
    client: &mut ProtocolClient<W>,
    game: &mut G,
    scorer: &MoveScorer,
    force: bool,
) -> Result<bool, CorrelationError> {
    let eligible = Color::ALL.map(|color| force || !is_annotated(&game.player(color)));
    if !eligible.iter().any(|&e| e) {
        return Ok(false);
    }

    let mut totals = [0.0f64; 2];
    for (ply_index, ply) in game.plies()?.iter().enumerate() {
        let side = ply.mover.index();
        if !eligible[side] {
            continue;
        }
        let result = scorer.score(client, &ply.fen, &ply.played)?;
        trace!(
            ply = ply_index + 1,
            played = %ply.played,
            outcome = ?result.outcome,
            score = result.score,
            "scored move"
        );
        totals[side] += result.score;
        client.new_game()?;
    }

    for color in Color::ALL {
        if eligible[color.index()] {
            let name = annotate(&game.player(color), totals[color.index()]);
            game.set_player(color, name);
        }
    }
    Ok(true)
}

/// Remove correlation annotations from every player name.
///
/// Returns the number of games that had at least one name rewritten.
pub fn strip_correlation<G: GameRecord>(games: &mut [G]) -> usize {
    let mut modified = 0;
    for game in games.iter_mut() {
        let mut changed = false;
        for color in Color::ALL {
            let name = game.player(color);
            if is_annotated(&name) {
                let original = strip_annotation(&name).to_string();
                game.set_player(color, original);
                changed = true;
            }
        }
        if changed {
            modified += 1;
        }
    }
    modified
}
