//! PGN (Portable Game Notation) reading and writing.
//!
//! Games keep their tag pairs in file order and their movetext as a flat list
//! of [`MovetextItem`]s: main-line moves, variations, comments and NAGs all
//! survive a read/write cycle. Only the main line is replayed for scoring.
//!
//! Whitespace inside comments is normalised when written back, and suffix
//! glyphs such as `!?` come back out as their `$n` form.

use std::io::{self, BufWriter, Read, Write};
use std::ops::ControlFlow;
use std::path::Path;

use engine_correlation::{Color, GameError, GameRecord, Ply};
use pgn_reader::{Nag, Outcome, RawComment, RawTag, Reader, SanPlus, Skip, Visitor};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position};
use tempfile::NamedTempFile;
use uci::CoordinateMove;

/// Movetext lines are wrapped at this width.
const LINE_WIDTH: usize = 80;

/// One element of a game's movetext, in file order.
#[derive(Debug, Clone, PartialEq)]
pub enum MovetextItem {
    /// A move, on the main line or inside a variation.
    Move(SanPlus),
    /// Numeric annotation glyph attached to the preceding move.
    Nag(Nag),
    /// Text of a `{ comment }`, without the braces.
    Comment(String),
    /// `(`: the moves up to the matching [`MovetextItem::EndVariation`]
    /// replace the preceding move.
    BeginVariation,
    /// `)`
    EndVariation,
}

/// One game: its tag pairs in order and its full movetext.
#[derive(Debug, Clone, Default)]
pub struct PgnGame {
    pub tags: Vec<(String, String)>,
    pub movetext: Vec<MovetextItem>,
    /// Termination marker found at the end of the movetext, if any.
    pub outcome: Option<Outcome>,
}

impl PgnGame {
    /// Value of the first tag called `name`.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Replace the value of tag `name`, appending the tag if it is missing.
    ///
    /// Tag order is preserved, so rewriting a player name leaves the rest of
    /// the header exactly as it was read.
    pub fn set_tag(&mut self, name: &str, value: String) {
        match self.tags.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.tags.push((name.to_string(), value)),
        }
    }

    /// Moves of the main line, skipping anything inside a variation.
    pub fn main_line(&self) -> impl Iterator<Item = &SanPlus> + '_ {
        let mut depth = 0usize;
        self.movetext.iter().filter_map(move |item| match item {
            MovetextItem::BeginVariation => {
                depth += 1;
                None
            }
            MovetextItem::EndVariation => {
                depth = depth.saturating_sub(1);
                None
            }
            MovetextItem::Move(san_plus) if depth == 0 => Some(san_plus),
            _ => None,
        })
    }

    /// Position before the first move: the `FEN` tag, or the standard start.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Malformed`] if the `FEN` tag does not parse or
    /// describes an illegal position.
    pub fn start_position(&self) -> Result<Chess, GameError> {
        let Some(fen) = self.tag("FEN") else {
            return Ok(Chess::default());
        };
        let fen: Fen = fen
            .parse()
            .map_err(|e| GameError::Malformed(format!("invalid FEN tag {fen:?}: {e}")))?;
        fen.into_position(CastlingMode::Standard)
            .map_err(|e| GameError::Malformed(format!("illegal start position: {e}")))
    }

    /// Result token for the end of the movetext: the `Result` tag when it
    /// holds a known result, then the movetext's own marker, then `*`.
    fn result(&self) -> String {
        match self.tag("Result") {
            Some(r @ ("1-0" | "0-1" | "1/2-1/2")) => r.to_string(),
            _ => self
                .outcome
                .map_or_else(|| "*".to_string(), |outcome| outcome.to_string()),
        }
    }
}

impl GameRecord for PgnGame {
    fn plies(&self) -> Result<Vec<Ply>, GameError> {
        let mut pos = self.start_position()?;
        let mut plies = Vec::new();

        for (index, san_plus) in self.main_line().enumerate() {
            let fen = Fen::from_position(&pos, EnPassantMode::Legal).to_string();
            let mv = san_plus.san.to_move(&pos).map_err(|_| {
                GameError::Malformed(format!("illegal move {san_plus} at ply {}", index + 1))
            })?;
            let uci = mv.to_uci(CastlingMode::Standard).to_string();
            let played: CoordinateMove = uci
                .parse()
                .map_err(|_| GameError::Malformed(format!("unsupported move {san_plus}")))?;
            let mover = match pos.turn() {
                shakmaty::Color::White => Color::White,
                shakmaty::Color::Black => Color::Black,
            };

            plies.push(Ply { fen, played, mover });
            pos.play_unchecked(mv);
        }
        Ok(plies)
    }

    fn player(&self, color: Color) -> String {
        self.tag(color.tag_name()).unwrap_or("?").to_string()
    }

    fn set_player(&mut self, color: Color, name: String) {
        self.set_tag(color.tag_name(), name);
    }
}

/// Visitor that collects every game into a list.
#[derive(Default)]
struct GameCollector {
    games: Vec<PgnGame>,
}

impl Visitor for GameCollector {
    type Tags = Vec<(String, String)>;
    type Movetext = PgnGame;
    type Output = ();

    fn begin_tags(&mut self) -> ControlFlow<(), Self::Tags> {
        ControlFlow::Continue(Vec::new())
    }

    fn tag(&mut self, tags: &mut Self::Tags, name: &[u8], value: RawTag<'_>) -> ControlFlow<()> {
        tags.push((
            String::from_utf8_lossy(name).into_owned(),
            value.decode_utf8_lossy().into_owned(),
        ));
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<(), PgnGame> {
        ControlFlow::Continue(PgnGame {
            tags,
            ..PgnGame::default()
        })
    }

    fn san(&mut self, game: &mut PgnGame, san_plus: SanPlus) -> ControlFlow<()> {
        game.movetext.push(MovetextItem::Move(san_plus));
        ControlFlow::Continue(())
    }

    fn nag(&mut self, game: &mut PgnGame, nag: Nag) -> ControlFlow<()> {
        game.movetext.push(MovetextItem::Nag(nag));
        ControlFlow::Continue(())
    }

    fn comment(&mut self, game: &mut PgnGame, comment: RawComment<'_>) -> ControlFlow<()> {
        let text = String::from_utf8_lossy(comment.as_bytes()).into_owned();
        game.movetext.push(MovetextItem::Comment(text));
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, game: &mut PgnGame) -> ControlFlow<(), Skip> {
        game.movetext.push(MovetextItem::BeginVariation);
        ControlFlow::Continue(Skip(false))
    }

    fn end_variation(&mut self, game: &mut PgnGame) -> ControlFlow<()> {
        // A stray `)` has no opening partner.
        if open_variations(&game.movetext) > 0 {
            game.movetext.push(MovetextItem::EndVariation);
        }
        ControlFlow::Continue(())
    }

    fn outcome(&mut self, game: &mut PgnGame, outcome: Outcome) -> ControlFlow<()> {
        game.outcome = Some(outcome);
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, mut game: PgnGame) {
        for _ in 0..open_variations(&game.movetext) {
            game.movetext.push(MovetextItem::EndVariation);
        }
        self.games.push(game);
    }
}

/// Variations opened but not yet closed.
fn open_variations(movetext: &[MovetextItem]) -> usize {
    movetext.iter().fold(0usize, |depth, item| match item {
        MovetextItem::BeginVariation => depth + 1,
        MovetextItem::EndVariation => depth.saturating_sub(1),
        _ => depth,
    })
}

/// Read every game from `reader`.
///
/// # Errors
///
/// Returns the underlying I/O error if reading fails. Games whose moves are
/// illegal still load; they are rejected later by [`GameRecord::plies`].
pub fn read_games<R: Read>(reader: R) -> io::Result<Vec<PgnGame>> {
    let mut collector = GameCollector::default();
    let mut reader = Reader::new(reader);
    while reader.read_game(&mut collector)?.is_some() {}
    Ok(collector.games)
}

/// Write `games` as PGN, separated by blank lines.
///
/// # Arguments
///
/// * `writer` - Destination; flushed before returning
/// * `games` - Games in the order they should appear
///
/// # Errors
///
/// Returns the first I/O error raised by `writer`.
pub fn write_games<W: Write>(writer: &mut W, games: &[PgnGame]) -> io::Result<()> {
    for (i, game) in games.iter().enumerate() {
        if i > 0 {
            writeln!(writer)?;
        }
        write_game(writer, game)?;
    }
    writer.flush()
}

/// Replace the file at `path` with `games`.
///
/// The games are written to a temporary file in the same directory, which is
/// then renamed over `path`. If anything fails, `path` keeps its previous
/// content.
///
/// # Errors
///
/// Returns an I/O error if the temporary file cannot be created or written,
/// or if the final rename fails.
pub fn write_games_to_path(path: &Path, games: &[PgnGame]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        write_games(&mut writer, games)?;
    }
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn write_game<W: Write>(writer: &mut W, game: &PgnGame) -> io::Result<()> {
    for (name, value) in &game.tags {
        writeln!(writer, "[{} \"{}\"]", name, escape_tag_value(value))?;
    }
    writeln!(writer)?;

    let tokens = movetext_tokens(game);
    for line in wrap(&tokens, LINE_WIDTH) {
        writeln!(writer, "{}", line)?;
    }
    Ok(())
}

fn escape_tag_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Movetext split into the units it is wrapped by.
///
/// A move number stays in the same unit as its move. Numbers are derived
/// from the start position; a black move gets a `N...` number when it opens
/// the game or a variation, or follows a comment or a closed variation.
fn movetext_tokens(game: &PgnGame) -> Vec<String> {
    let start_ply = match game.start_position() {
        Ok(pos) => {
            (u32::from(pos.fullmoves()) - 1) * 2 + u32::from(pos.turn() == shakmaty::Color::Black)
        }
        Err(_) => 0,
    };

    let mut tokens: Vec<String> = Vec::with_capacity(game.movetext.len() * 3 / 2 + 1);
    let mut ply = start_ply;
    let mut enclosing = Vec::new();
    let mut number_black = true;
    let mut opening = 0usize;

    for item in &game.movetext {
        match item {
            MovetextItem::Move(san_plus) => {
                let number = ply / 2 + 1;
                let word = if ply % 2 == 0 {
                    format!("{number}. {san_plus}")
                } else if number_black {
                    format!("{number}... {san_plus}")
                } else {
                    san_plus.to_string()
                };
                push_word(&mut tokens, &mut opening, word);
                ply += 1;
                number_black = false;
            }
            MovetextItem::Nag(nag) => push_word(&mut tokens, &mut opening, nag.to_string()),
            MovetextItem::Comment(text) => {
                let mut words = text.split_whitespace();
                match words.next() {
                    None => push_word(&mut tokens, &mut opening, "{}".to_string()),
                    Some(first) => {
                        let mut comment: Vec<String> = std::iter::once(format!("{{{first}"))
                            .chain(words.map(str::to_string))
                            .collect();
                        if let Some(last) = comment.last_mut() {
                            last.push('}');
                        }
                        for word in comment {
                            push_word(&mut tokens, &mut opening, word);
                        }
                    }
                }
                number_black = true;
            }
            MovetextItem::BeginVariation => {
                enclosing.push(ply);
                ply = ply.saturating_sub(1);
                opening += 1;
                number_black = true;
            }
            MovetextItem::EndVariation => {
                ply = enclosing.pop().unwrap_or(ply);
                if opening > 0 || tokens.is_empty() {
                    push_word(&mut tokens, &mut opening, ")".to_string());
                } else if let Some(last) = tokens.last_mut() {
                    last.push(')');
                }
                number_black = true;
            }
        }
    }
    push_word(&mut tokens, &mut opening, game.result());
    tokens
}

/// Push `word`, prefixed by any variations opened just before it.
fn push_word(tokens: &mut Vec<String>, opening: &mut usize, word: String) {
    tokens.push(format!("{}{}", "(".repeat(*opening), word));
    *opening = 0;
}

fn wrap(tokens: &[String], width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for token in tokens {
        if !line.is_empty() && line.len() + 1 + token.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(token);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
