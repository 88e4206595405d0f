//! Line classification and tokenization.
//!
//! Columns are grapheme-cluster indices, so a combining accent does not shift
//! the attribute lines below it out of alignment.

use tg_core::LineKind;
use unicode_segmentation::UnicodeSegmentation;

use crate::chain::is_single_separator;

/// A maximal run of word graphemes on a node line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) text: String,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

/// One `key=value` pair on an attribute line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttributeToken {
    pub(crate) key: String,
    pub(crate) value: String,
    pub(crate) start: usize,
    pub(crate) end: usize,
    /// Separated from the previous pair by exactly one space or comma.
    pub(crate) joined: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Lexeme {
    Word(Token),
    Attribute(AttributeToken),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScannedLine {
    Comment,
    Blank,
    Nodes(Vec<Token>),
    Attributes(Vec<AttributeToken>),
}

impl ScannedLine {
    pub(crate) const fn kind(&self) -> LineKind {
        match self {
            Self::Comment => LineKind::Comment,
            Self::Blank => LineKind::Blank,
            Self::Nodes(_) => LineKind::NodeLine,
            Self::Attributes(_) => LineKind::AttributeLine,
        }
    }
}

/// Classify a single line without keeping its tokens.
#[must_use]
pub fn classify_line(line: &str) -> LineKind {
    scan_line(line).kind()
}

pub(crate) fn scan_line(line: &str) -> ScannedLine {
    if line.trim_start().starts_with('#') {
        return ScannedLine::Comment;
    }

    let cells = graphemes(line);
    let lexemes = lex(&cells);
    match lexemes.first() {
        None => ScannedLine::Blank,
        Some(Lexeme::Word(_)) => ScannedLine::Nodes(
            lexemes
                .into_iter()
                .filter_map(|lexeme| match lexeme {
                    Lexeme::Word(token) => Some(token),
                    Lexeme::Attribute(_) => None,
                })
                .collect(),
        ),
        Some(Lexeme::Attribute(_)) => ScannedLine::Attributes(
            lexemes
                .into_iter()
                .filter_map(|lexeme| match lexeme {
                    Lexeme::Attribute(token) => Some(token),
                    Lexeme::Word(_) => None,
                })
                .collect(),
        ),
    }
}

/// Split input on `\n`, `\r\n` or a lone `\r`.
pub(crate) fn split_lines(input: &str) -> impl Iterator<Item = &str> {
    input
        .split('\n')
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
}

pub(crate) fn graphemes(line: &str) -> Vec<&str> {
    line.graphemes(true).collect()
}

pub(crate) fn is_word(cell: &str) -> bool {
    cell.chars()
        .next()
        .is_some_and(|ch| ch.is_alphanumeric() || ch == '_')
}

pub(crate) fn is_value(cell: &str) -> bool {
    is_word(cell) || matches!(cell, "+" | "-" | ".")
}

pub(crate) fn run_end(cells: &[&str], start: usize, predicate: fn(&str) -> bool) -> usize {
    cells[start..]
        .iter()
        .position(|cell| !predicate(cell))
        .map_or(cells.len(), |offset| start + offset)
}

/// Word runs followed by `=` and a value character become attributes,
/// everything else made of word characters is a node word.
fn lex(cells: &[&str]) -> Vec<Lexeme> {
    let mut lexemes = Vec::new();
    let mut index = 0;

    while index < cells.len() {
        if !is_word(cells[index]) {
            index += 1;
            continue;
        }

        let key_end = run_end(cells, index, is_word);
        let has_value = cells.get(key_end) == Some(&"=")
            && cells.get(key_end + 1).is_some_and(|cell| is_value(cell));

        if has_value {
            let value_end = run_end(cells, key_end + 1, is_value);
            let joined = matches!(
                lexemes.last(),
                Some(Lexeme::Attribute(previous))
                    if is_single_separator(cells, previous.end, index)
            );
            lexemes.push(Lexeme::Attribute(AttributeToken {
                key: cells[index..key_end].concat(),
                value: cells[key_end + 1..value_end].concat(),
                start: index,
                end: value_end,
                joined,
            }));
            index = value_end;
        } else {
            lexemes.push(Lexeme::Word(Token {
                text: cells[index..key_end].concat(),
                start: index,
                end: key_end,
            }));
            index = key_end;
        }
    }

    lexemes
}
