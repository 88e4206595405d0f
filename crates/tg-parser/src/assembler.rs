use tg_core::{CommentRecord, ParseOptions, ParseWarning, Record, Span, WarningCode};
use tracing::{debug, trace};

use crate::ParseResult;
use crate::block::NodeLine;
use crate::chain::{AttributeChain, Polarity, group_chains};
use crate::scan::{ScannedLine, graphemes, scan_line};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockState {
    Idle,
    CollectingAbove,
    InNodeLine,
    CollectingBelow,
}

/// Line-driven block assembler.
///
/// Buffers the chains above and below the current node line and turns the
/// whole block into records once a blank line, the next node line, or the end
/// of input closes it.
#[derive(Debug)]
pub(crate) struct Assembler {
    options: ParseOptions,
    state: BlockState,
    above: Vec<AttributeChain>,
    node_line: Option<NodeLine>,
    below: Vec<AttributeChain>,
    /// First row of the pending block, for diagnostics.
    block_start: usize,
    records: Vec<Record>,
    warnings: Vec<ParseWarning>,
}

impl Assembler {
    pub(crate) fn new(options: ParseOptions) -> Self {
        Self {
            options,
            state: BlockState::Idle,
            above: Vec::new(),
            node_line: None,
            below: Vec::new(),
            block_start: 0,
            records: Vec::new(),
            warnings: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) const fn state(&self) -> BlockState {
        self.state
    }

    pub(crate) fn feed(&mut self, row: usize, line: &str) {
        let scanned = scan_line(line);
        trace!(row, kind = scanned.kind().as_str(), "classified line");

        match scanned {
            ScannedLine::Comment => {
                if self.options.keep_comments {
                    self.records.push(Record::Comment(CommentRecord {
                        text: line.to_string(),
                        row,
                    }));
                }
            }
            ScannedLine::Blank => self.finalize(),
            ScannedLine::Attributes(tokens) => match self.state {
                BlockState::Idle | BlockState::CollectingAbove => {
                    if self.state == BlockState::Idle {
                        self.block_start = row;
                    }
                    self.above
                        .extend(group_chains(tokens, row, Polarity::Above));
                    self.state = BlockState::CollectingAbove;
                }
                BlockState::InNodeLine | BlockState::CollectingBelow => {
                    self.below
                        .extend(group_chains(tokens, row, Polarity::Below));
                    self.state = BlockState::CollectingBelow;
                }
            },
            ScannedLine::Nodes(tokens) => {
                if let Some(previous) = &self.node_line {
                    self.warnings.push(ParseWarning::new(
                        WarningCode::MissingBlankLine,
                        format!(
                            "Line {}: node line follows the node line on line {} without a blank line",
                            row + 1,
                            previous.row() + 1
                        ),
                        Span::at_line(row, graphemes(line).len()),
                    ));
                    self.finalize();
                }
                if self.state == BlockState::Idle {
                    self.block_start = row;
                }
                self.node_line = Some(NodeLine::new(row, tokens, &mut self.warnings));
                self.state = BlockState::InNodeLine;
            }
        }
    }

    fn finalize(&mut self) {
        if self.state == BlockState::Idle {
            return;
        }

        let above = std::mem::take(&mut self.above);
        let below = std::mem::take(&mut self.below);
        match self.node_line.take() {
            Some(node_line) => {
                let row = node_line.row();
                let records = node_line.into_records(above.iter().chain(&below), &mut self.warnings);
                debug!(
                    row,
                    records = records.len(),
                    above = above.len(),
                    below = below.len(),
                    "finalized block"
                );
                self.records.extend(records);
            }
            None => {
                debug!(row = self.block_start, chains = above.len(), "dropping orphan attributes");
                self.warnings.push(ParseWarning::new(
                    WarningCode::OrphanAttributes,
                    format!(
                        "Line {}: attribute lines without a node line; ignored",
                        self.block_start + 1
                    ),
                    Span::at_line(self.block_start, 0),
                ));
            }
        }

        self.state = BlockState::Idle;
    }

    pub(crate) fn finish(mut self) -> ParseResult {
        self.finalize();
        ParseResult {
            records: self.records,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use tg_core::{ParseOptions, Record, WarningCode};

    use super::{Assembler, BlockState};

    fn assembler_after(lines: &[&str]) -> Assembler {
        let mut assembler = Assembler::new(ParseOptions::default());
        for (row, line) in lines.iter().enumerate() {
            assembler.feed(row, line);
        }
        assembler
    }

    #[test]
    fn walks_through_all_states() {
        let mut assembler = Assembler::new(ParseOptions::default());
        assert_eq!(assembler.state(), BlockState::Idle);
        assembler.feed(0, "k=v");
        assert_eq!(assembler.state(), BlockState::CollectingAbove);
        assembler.feed(1, "a b");
        assert_eq!(assembler.state(), BlockState::InNodeLine);
        assembler.feed(2, "j=w");
        assert_eq!(assembler.state(), BlockState::CollectingBelow);
        assembler.feed(3, "");
        assert_eq!(assembler.state(), BlockState::Idle);
    }

    #[test]
    fn comments_leave_state_alone() {
        let mut assembler = assembler_after(&["a b"]);
        assembler.feed(1, "# note");
        assert_eq!(assembler.state(), BlockState::InNodeLine);
        assembler.feed(2, "k=v");
        assert_eq!(assembler.state(), BlockState::CollectingBelow);
    }

    #[test]
    fn repeated_blanks_are_no_ops() {
        let mut assembler = assembler_after(&["a", "", "", ""]);
        assert_eq!(assembler.state(), BlockState::Idle);
        assembler.feed(4, "b");
        let result = assembler.finish();
        assert_eq!(result.records.len(), 2);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn adjacent_node_lines_split_with_warning() {
        let result = assembler_after(&["a b", "c d"]).finish();
        let edges: Vec<_> = result.records.iter().filter_map(Record::as_edge).collect();
        assert_eq!(edges.len(), 2);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, WarningCode::MissingBlankLine);
        assert_eq!(result.warnings[0].span.line_number(), 2);
    }

    #[test]
    fn missing_blank_line_span_counts_graphemes() {
        // "e\u{301}" is one column: e with a combining acute accent.
        let result = assembler_after(&["a", "e\u{301} b\u{301}"]).finish();
        assert_eq!(result.warnings[0].code, WarningCode::MissingBlankLine);
        assert_eq!(result.warnings[0].span.start.col, 0);
        assert_eq!(result.warnings[0].span.end.col, 3);
    }

    #[test]
    fn attributes_between_node_lines_belong_to_the_upper_block() {
        let result = assembler_after(&["a", "k=v", "b"]).finish();
        let a = result.records[0].as_node().expect("node a");
        let b = result.records[1].as_node().expect("node b");
        assert_eq!(a.attributes.get("k").map(String::as_str), Some("v"));
        assert!(b.attributes.is_empty());
    }

    #[test]
    fn orphan_attributes_are_reported() {
        let result = assembler_after(&["", "k=v", "j=w", ""]).finish();
        assert!(result.records.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, WarningCode::OrphanAttributes);
        assert_eq!(result.warnings[0].span.line_number(), 2);
    }

    #[test]
    fn kept_comments_are_emitted_in_place() {
        let mut assembler = Assembler::new(ParseOptions::with_comments());
        assembler.feed(0, "  # header ");
        assembler.feed(1, "a");
        let result = assembler.finish();
        assert!(result.records[0].is_comment());
        let Record::Comment(comment) = &result.records[0] else {
            unreachable!();
        };
        assert_eq!(comment.text, "  # header ");
        assert_eq!(comment.row, 0);
        assert!(result.records[1].as_node().is_some());
    }
}
