//! Correlation annotations on player names.
//!
//! An annotated name reads `<name> - MC: <score>`, with the score printed to
//! two decimals. The original name is always recoverable.
//!
//! Detection looks only at the last two whitespace-separated tokens, so hand
//! edited forms such as `Tal MC: 7` are recognised too.
//!
//! ```
//! use engine_correlation::annotation::{annotate, annotation_score, strip_annotation};
//!
//! let name = annotate("Tal, Mikhail", 42.5);
//! assert_eq!(name, "Tal, Mikhail - MC: 42.50");
//! assert_eq!(annotation_score(&name), Some(42.5));
//! assert_eq!(strip_annotation(&name), "Tal, Mikhail");
//! ```

/// Token that precedes the score.
pub const MARKER: &str = "MC:";

/// Text between the original name and the marker.
pub const SEPARATOR: &str = " - ";

/// Whether the name already carries a correlation score: its last two
/// whitespace-separated tokens are the marker and a number.
pub fn is_annotated(name: &str) -> bool {
    annotation_score(name).is_some()
}

/// Score of an annotated name.
///
/// Returns `None` when the second-to-last token is not [`MARKER`] or the last
/// one does not parse as a number.
pub fn annotation_score(name: &str) -> Option<f64> {
    let mut tokens = name.split_whitespace().rev();
    let value = tokens.next()?;
    let marker = tokens.next()?;
    if marker != MARKER {
        return None;
    }
    value.parse().ok()
}

/// The name without its annotation. Names without one come back unchanged.
///
/// The canonical ` - MC: ` suffix is cut first; other spellings lose
/// everything from the last marker on, plus trailing whitespace.
pub fn strip_annotation(name: &str) -> &str {
    if !is_annotated(name) {
        return name;
    }
    let suffix = format!("{SEPARATOR}{MARKER} ");
    if let Some((original, _)) = name.rsplit_once(suffix.as_str()) {
        return original;
    }
    match name.rfind(MARKER) {
        Some(pos) => name[..pos].trim_end(),
        None => name,
    }
}

/// Append a score to `name`, replacing any annotation it already has.
///
/// # Arguments
///
/// * `name` - Player name, annotated or not
/// * `score` - Accumulated centipawn loss, printed with two decimals
pub fn annotate(name: &str, score: f64) -> String {
    format!("{}{SEPARATOR}{MARKER} {:.2}", strip_annotation(name), score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_annotate_formats_two_decimals() {
        assert_eq!(annotate("Carlsen, Magnus", 110.0), "Carlsen, Magnus - MC: 110.00");
        assert_eq!(annotate("Anand", 3.14159), "Anand - MC: 3.14");
        assert_eq!(annotate("", 0.0), " - MC: 0.00");
    }

    #[test]
    fn test_detects_annotation() {
        assert!(is_annotated("Tal - MC: 12.50"));
        assert!(is_annotated("Tal MC: 7"));
        assert!(!is_annotated("Tal"));
        assert!(!is_annotated("Tal - MC: abc"));
        assert!(!is_annotated("MC: Tal"));
        assert!(!is_annotated("12.5"));
    }

    #[test]
    fn test_reannotation_replaces_score() {
        let once = annotate("Petrosian", 10.0);
        let twice = annotate(&once, 20.0);
        assert_eq!(twice, "Petrosian - MC: 20.00");
        assert_eq!(annotation_score(&twice), Some(20.0));
    }

    #[test]
    fn test_strip_without_separator() {
        assert_eq!(strip_annotation("Botvinnik MC: 3.00"), "Botvinnik");
        assert_eq!(strip_annotation("Botvinnik"), "Botvinnik");
    }

    proptest! {
        #[test]
        fn annotation_round_trips(name in "[A-Za-z ,.]{0,20}", score in 0.0f64..100_000.0) {
            let annotated = annotate(&name, score);
            prop_assert!(is_annotated(&annotated));
            prop_assert_eq!(strip_annotation(&annotated), name.as_str());
        }
    }
}
