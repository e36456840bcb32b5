//! Per-move correlation scoring.
//!
//! A move's score is how many centipawns the engine prefers its own choice
//! over the move actually played, each measured by a search restricted to
//! that single move. Matching the engine's choice scores 0.

use std::io::Write;

use tracing::trace;
use uci::{extract_best_move, extract_evaluation, BestMove, CoordinateMove, Evaluation, GoOptions};

use crate::client::ProtocolClient;
use crate::error::EngineError;
use crate::wait::Backoff;

/// How a move's score was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The played move is the engine's best move.
    ExactMatch,
    /// Both moves had centipawn evaluations and were compared.
    Graded,
    /// A mate score or a losing evaluation made the comparison meaningless.
    NotComparable,
    /// The engine found no legal move in the position.
    NoLegalMove,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveScore {
    /// Non-negative centipawn loss against the engine's choice.
    pub score: f64,
    pub outcome: MoveOutcome,
}

impl MoveScore {
    fn zero(outcome: MoveOutcome) -> Self {
        Self {
            score: 0.0,
            outcome,
        }
    }
}

/// Compare the restricted-search evaluations of the best and the played move.
pub fn grade(best: Evaluation, played: Evaluation) -> MoveScore {
    match (best, played) {
        (Evaluation::Centipawns(best), Evaluation::Centipawns(played))
            if played >= 0.0 && best > 0.0 =>
        {
            MoveScore {
                score: (best - played).max(0.0),
                outcome: MoveOutcome::Graded,
            }
        }
        _ => MoveScore::zero(MoveOutcome::NotComparable),
    }
}

/// Score for a pair of restricted-search evaluations. Never negative.
pub fn correlation_from_evaluations(best: Evaluation, played: Evaluation) -> f64 {
    grade(best, played).score
}

/// Scores single moves against an engine at a fixed depth.
#[derive(Debug, Clone, Copy)]
pub struct MoveScorer {
    depth: u32,
    backoff: Backoff,
}

impl MoveScorer {
    /// # Arguments
    ///
    /// * `depth` - Depth of every search, unrestricted or not
    /// * `backoff` - Polling schedule used while a search runs
    pub fn new(depth: u32, backoff: Backoff) -> Self {
        Self { depth, backoff }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Score `played` in the position `fen`.
    ///
    /// Asks for the engine's own move first. When it differs from `played`,
    /// the played move is searched on its own; a mate or losing evaluation
    /// there ends scoring at 0 without searching the best move.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the engine cannot be written to, stops
    /// answering before the cancel token fires, or sends an unparseable
    /// `bestmove` or score.
    pub fn score<W: Write>(
        &self,
        client: &mut ProtocolClient<W>,
        fen: &str,
        played: &CoordinateMove,
    ) -> Result<MoveScore, EngineError> {
        client.set_position(fen)?;
        let response = client.search(GoOptions::depth(self.depth), self.backoff)?;
        let best = match extract_best_move(&response)? {
            BestMove::NoMove => return Ok(MoveScore::zero(MoveOutcome::NoLegalMove)),
            BestMove::Move(best) => best,
        };
        if best == *played {
            trace!(%played, "played move is the engine's choice");
            return Ok(MoveScore::zero(MoveOutcome::ExactMatch));
        }

        let played_eval = self.evaluate_restricted(client, fen, played)?;
        if played_eval.is_mate() || played_eval.centipawns().is_some_and(|cp| cp < 0.0) {
            return Ok(MoveScore::zero(MoveOutcome::NotComparable));
        }
        let best_eval = self.evaluate_restricted(client, fen, &best)?;

        let result = grade(best_eval, played_eval);
        trace!(%played, %best, ?best_eval, ?played_eval, score = result.score, "graded move");
        Ok(result)
    }

    /// Evaluation of `fen` when the search may only consider `mv`.
    fn evaluate_restricted<W: Write>(
        &self,
        client: &mut ProtocolClient<W>,
        fen: &str,
        mv: &CoordinateMove,
    ) -> Result<Evaluation, EngineError> {
        client.new_game()?;
        client.set_position(fen)?;
        let options = GoOptions::depth(self.depth).searchmove(mv.to_string());
        let response = client.search(options, self.backoff)?;
        Ok(extract_evaluation(&response)?)
    }
}
