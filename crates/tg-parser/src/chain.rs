//! Grouping of `key=value` pairs into attribute chains.

use tg_core::Span;

use crate::scan::AttributeToken;

/// Whether an attribute line sits above or below the node line it attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Polarity {
    Above,
    Below,
}

impl Polarity {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Above => "above",
            Self::Below => "below",
        }
    }
}

/// Pairs joined by single separators; attaches as a unit to one node or edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttributeChain {
    pub(crate) pairs: Vec<(String, String)>,
    pub(crate) row: usize,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) polarity: Polarity,
}

impl AttributeChain {
    pub(crate) const fn span(&self) -> Span {
        Span::columns(self.row, self.start, self.end)
    }
}

/// True when exactly one space or comma lies between two pairs.
pub(crate) fn is_single_separator(cells: &[&str], previous_end: usize, start: usize) -> bool {
    start == previous_end + 1 && matches!(cells.get(previous_end), Some(&(" " | ",")))
}

pub(crate) fn group_chains(
    tokens: Vec<AttributeToken>,
    row: usize,
    polarity: Polarity,
) -> Vec<AttributeChain> {
    let mut chains: Vec<AttributeChain> = Vec::new();

    for token in tokens {
        match chains.last_mut() {
            Some(chain) if token.joined => {
                chain.end = token.end;
                chain.pairs.push((token.key, token.value));
            }
            _ => chains.push(AttributeChain {
                pairs: vec![(token.key, token.value)],
                row,
                start: token.start,
                end: token.end,
                polarity,
            }),
        }
    }

    chains
}
