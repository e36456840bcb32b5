//! Evaluation extraction from UCI `info` lines.
//!
//! Engines frame the score differently depending on search state:
//!
//! ```text
//! info depth 12 seldepth 16 multipv 1 score cp 35 nodes 48213 nps 964260 pv e2e4 e7e5
//! info depth 12 seldepth 16 multipv 1 score cp 35 upperbound nodes 48213 nps 964260 pv e2e4
//! info depth 20 seldepth 8 multipv 1 score mate 3 nodes 10234 pv d1h5 g6h5
//! ```
//!
//! Each framing is handled by one [`ScoreRule`]; [`extract_evaluation`] tries
//! them in order against the last search line.

use crate::UciError;

/// Marker opening a search line.
pub const SEARCH_LINE_PREFIX: &str = "info depth ";

const SCORE_MARKER: &str = " score ";
const MATE_MARKER: &str = "mate";
const CENTIPAWN_TOKEN: &str = "cp";

/// Evaluation reported by the engine for the searched line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    /// Centipawn score from the side to move's point of view.
    Centipawns(f64),
    /// The engine announced a forced mate (either side, any distance).
    MateDetected,
}

impl Evaluation {
    /// True if the engine reported a forced mate instead of a centipawn score.
    pub fn is_mate(&self) -> bool {
        matches!(self, Evaluation::MateDetected)
    }

    /// Centipawn value, or `None` for a mate score.
    pub fn centipawns(&self) -> Option<f64> {
        match self {
            Evaluation::Centipawns(cp) => Some(*cp),
            Evaluation::MateDetected => None,
        }
    }
}

/// One way of isolating the score text in a search line.
///
/// The score is the text between ` score ` and `end_marker`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreRule {
    pub name: &'static str,
    pub end_marker: &'static str,
}

/// Extraction rules in the order they are attempted.
pub const SCORE_RULES: [ScoreRule; 3] = [
    ScoreRule {
        name: "plain",
        end_marker: " nodes",
    },
    ScoreRule {
        name: "upperbound",
        end_marker: " upperbound nodes",
    },
    ScoreRule {
        name: "lowerbound",
        end_marker: " lowerbound nodes",
    },
];

impl ScoreRule {
    /// Text between the score marker and this rule's end marker.
    pub fn isolate<'a>(&self, line: &'a str) -> Option<&'a str> {
        let start = line.find(SCORE_MARKER)? + SCORE_MARKER.len();
        let rest = &line[start..];
        let end = rest.find(self.end_marker)?;
        Some(rest[..end].trim())
    }

    /// Parse the evaluation out of `line`, if this rule's framing matches.
    pub fn apply(&self, line: &str) -> Option<Evaluation> {
        classify(self.isolate(line)?)
    }
}

fn classify(text: &str) -> Option<Evaluation> {
    if text.contains(MATE_MARKER) {
        return Some(Evaluation::MateDetected);
    }
    let mut tokens = text.split_whitespace().filter(|t| *t != CENTIPAWN_TOKEN);
    let value = tokens.next()?;
    if tokens.next().is_some() {
        return None;
    }
    value.parse::<f64>().ok().map(Evaluation::Centipawns)
}

/// True for `info depth ...` lines that carry a score.
pub fn is_search_line(line: &str) -> bool {
    line.starts_with(SEARCH_LINE_PREFIX) && line.contains(SCORE_MARKER)
}

/// Evaluation from the last search line of a response.
///
/// Lines are scanned from the end; the first `info depth` line with a score
/// is parsed with each rule of [`SCORE_RULES`] in turn.
///
/// # Errors
///
/// * [`UciError::MissingScore`] - No search line with a score in `lines`
/// * [`UciError::UnparseableScore`] - No rule could parse that line
pub fn extract_evaluation<S: AsRef<str>>(lines: &[S]) -> Result<Evaluation, UciError> {
    let line = lines
        .iter()
        .rev()
        .map(|l| l.as_ref().trim())
        .find(|l| is_search_line(l))
        .ok_or(UciError::MissingScore)?;

    SCORE_RULES
        .iter()
        .find_map(|rule| rule.apply(line))
        .ok_or_else(|| UciError::UnparseableScore(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PLAIN: &str =
        "info depth 12 seldepth 16 multipv 1 score cp 35 nodes 48213 nps 964260 pv e2e4 e7e5";
    const UPPER: &str =
        "info depth 12 seldepth 16 multipv 1 score cp 35 upperbound nodes 48213 nps 964260 pv e2e4";
    const LOWER: &str =
        "info depth 12 seldepth 16 multipv 1 score cp -20 lowerbound nodes 512 nps 96426 pv d2d4";

    #[test]
    fn plain_rule_isolates_score() {
        assert_eq!(SCORE_RULES[0].isolate(PLAIN), Some("cp 35"));
        assert_eq!(SCORE_RULES[0].apply(PLAIN), Some(Evaluation::Centipawns(35.0)));
    }

    #[test]
    fn plain_rule_rejects_bound_framing() {
        assert_eq!(SCORE_RULES[0].isolate(UPPER), Some("cp 35 upperbound"));
        assert_eq!(SCORE_RULES[0].apply(UPPER), None);
    }

    #[test]
    fn upperbound_rule() {
        assert_eq!(SCORE_RULES[1].apply(UPPER), Some(Evaluation::Centipawns(35.0)));
        assert_eq!(SCORE_RULES[1].apply(PLAIN), None);
    }

    #[test]
    fn lowerbound_rule() {
        assert_eq!(SCORE_RULES[2].apply(LOWER), Some(Evaluation::Centipawns(-20.0)));
    }

    #[test]
    fn mate_is_detected_regardless_of_sign() {
        let lines = [
            "info depth 20 seldepth 8 multipv 1 score mate 3 nodes 10234 pv d1h5 g6h5",
            "info depth 20 seldepth 8 multipv 1 score mate -2 nodes 10234 pv d1h5 g6h5",
            "info depth 20 seldepth 8 multipv 1 score mate 1 upperbound nodes 10 pv d1h5",
        ];
        for line in lines {
            assert_eq!(extract_evaluation(&[line]).unwrap(), Evaluation::MateDetected);
        }
    }

    #[test]
    fn extract_uses_last_search_line() {
        let lines = [
            "info string NNUE evaluation using nn-1111cefa1111.nnue",
            "info depth 1 seldepth 1 multipv 1 score cp 18 nodes 20 nps 10000 pv e2e4",
            "info depth 2 seldepth 2 multipv 1 score cp 46 nodes 66 nps 33000 pv d2d4",
            "info depth 3 currmove g1f3 currmovenumber 1",
            "bestmove d2d4 ponder d7d5",
        ];
        assert_eq!(extract_evaluation(&lines).unwrap(), Evaluation::Centipawns(46.0));
    }

    #[test]
    fn extract_falls_back_to_upperbound() {
        let lines = ["info depth 7 seldepth 9 multipv 1 score cp 40 upperbound nodes 900 pv a2a3"];
        assert_eq!(extract_evaluation(&lines).unwrap(), Evaluation::Centipawns(40.0));
    }

    #[test]
    fn extract_missing_score() {
        let lines = ["info depth 3 currmove g1f3 currmovenumber 1", "bestmove g1f3"];
        assert_eq!(extract_evaluation(&lines), Err(UciError::MissingScore));
    }

    #[test]
    fn extract_unparseable_score() {
        let line = "info depth 5 score cp 12 wdl 300 400 300 time 4";
        assert_eq!(
            extract_evaluation(&[line]),
            Err(UciError::UnparseableScore(line.to_string()))
        );
    }

    #[test]
    fn evaluation_accessors() {
        assert!(Evaluation::MateDetected.is_mate());
        assert_eq!(Evaluation::MateDetected.centipawns(), None);
        assert_eq!(Evaluation::Centipawns(-3.0).centipawns(), Some(-3.0));
    }

    proptest! {
        #[test]
        fn upperbound_framing_matches_plain(cp in -5000i32..5000, nodes in 1u64..10_000_000) {
            let plain = format!("info depth 9 seldepth 11 multipv 1 score cp {cp} nodes {nodes} pv e2e4");
            let upper = format!("info depth 9 seldepth 11 multipv 1 score cp {cp} upperbound nodes {nodes} pv e2e4");
            prop_assert_eq!(extract_evaluation(&[plain]).unwrap(), Evaluation::Centipawns(cp as f64));
            prop_assert_eq!(extract_evaluation(&[upper]).unwrap(), Evaluation::Centipawns(cp as f64));
        }
    }
}
