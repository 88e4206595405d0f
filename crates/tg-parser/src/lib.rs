#![forbid(unsafe_code)]

//! Parser for graphs drawn as monospaced text.
//!
//! ```text
//!   color=red
//! node1 ------ node2
//!          w=3   shape=box
//! ```
//!
//! Words on a node line are nodes, neighbors on the same line share an edge,
//! and `key=value` lines above or below attach to whatever node or edge sits
//! in the column of their first character.

mod assembler;
mod block;
mod chain;
mod cut;
mod params;
mod positions;
mod scan;
mod skeleton;

use serde::Serialize;
use serde_json::json;
use tg_core::{ParseError, ParseOptions, ParseWarning, Record};
use tracing::debug;

pub use cut::{cut, cuts, disconnect};
pub use params::{parse_params, read_params};
pub use positions::node_positions;
pub use scan::classify_line;
pub use skeleton::render_skeleton;

use assembler::Assembler;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ParseResult {
    pub records: Vec<Record>,
    pub warnings: Vec<ParseWarning>,
}

impl ParseResult {
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.records.iter().filter(|record| record.as_node().is_some()).count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.records.iter().filter(|record| record.as_edge().is_some()).count()
    }

    #[must_use]
    pub fn comment_count(&self) -> usize {
        self.records.iter().filter(|record| record.is_comment()).count()
    }
}

/// Parse `input` leniently into node and edge records.
///
/// Never fails: malformed parts are skipped, see [`parse_with_options`] for
/// the warnings describing what was skipped.
#[must_use]
pub fn parse(input: &str) -> Vec<Record> {
    assemble(input, ParseOptions::default()).records
}

/// Parse with explicit options, keeping the warnings.
///
/// # Errors
///
/// Only in strict mode: two node lines without a blank line between them
/// yield [`ParseError::MissingBlankLine`] for the first such pair.
pub fn parse_with_options(input: &str, options: &ParseOptions) -> Result<ParseResult, ParseError> {
    let result = assemble(input, *options);
    if !options.strict {
        return Ok(result);
    }
    match result.warnings.iter().find_map(ParseWarning::escalate) {
        Some(error) => Err(error),
        None => Ok(result),
    }
}

fn assemble(input: &str, options: ParseOptions) -> ParseResult {
    let mut assembler = Assembler::new(options);
    for (row, line) in scan::split_lines(input).enumerate() {
        assembler.feed(row, line);
    }
    let result = assembler.finish();
    debug!(
        records = result.records.len(),
        warnings = result.warnings.len(),
        "parsed text graph"
    );
    result
}

#[must_use]
pub fn summary_json(parsed: &ParseResult) -> String {
    json!({
        "node_count": parsed.node_count(),
        "edge_count": parsed.edge_count(),
        "comment_count": parsed.comment_count(),
        "warning_count": parsed.warnings.len(),
        "warnings": parsed
            .warnings
            .iter()
            .map(|warning| json!({
                "code": warning.code.as_str(),
                "line": warning.span.line_number(),
                "message": warning.message,
            }))
            .collect::<Vec<_>>(),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::{ParseResult, parse, parse_with_options, render_skeleton, summary_json};
    use proptest::prelude::*;
    use tg_core::{
        EdgeRecord, NodeRecord, ParseErrorCode, ParseOptions, Record, WarningCode,
    };

    fn adjacency(records: &[Record]) -> Vec<(String, Vec<String>)> {
        records
            .iter()
            .filter_map(Record::as_node)
            .map(|node| (node.id.clone(), node.adjacency.clone()))
            .collect()
    }

    #[test]
    fn attribute_under_second_node() {
        assert_eq!(
            parse("node1 node2\n      color=red"),
            vec![
                Record::Node(NodeRecord::new("node1").with_neighbor("node2")),
                Record::Edge(EdgeRecord::new("node1", "node2")),
                Record::Node(
                    NodeRecord::new("node2")
                        .with_neighbor("node1")
                        .with_attribute("color", "red")
                ),
            ]
        );
    }

    #[test]
    fn leading_underscore_on_first_node_isolates_it() {
        assert_eq!(
            parse("_iso other\n"),
            vec![
                Record::Node(NodeRecord::new("iso")),
                Record::Node(NodeRecord::new("other")),
            ]
        );
    }

    #[test]
    fn filler_line_and_blank_line_separate_blocks() {
        let records = parse("a b\n~~~~~~\n\nc d");
        let edges: Vec<&EdgeRecord> = records.iter().filter_map(Record::as_edge).collect();
        assert_eq!(edges, vec![&EdgeRecord::new("a", "b"), &EdgeRecord::new("c", "d")]);
    }

    #[test]
    fn two_nodes_one_edge() {
        assert_eq!(
            parse("0 1"),
            vec![
                Record::Node(NodeRecord::new("0").with_neighbor("1")),
                Record::Edge(EdgeRecord::new("0", "1")),
                Record::Node(NodeRecord::new("1").with_neighbor("0")),
            ]
        );
    }

    #[test]
    fn decorated_edges_are_edges() {
        assert_eq!(parse("n0 -----> n1 <==+==> n2"), parse("n0 n1 n2"));
    }

    #[test]
    fn underscore_only_tokens() {
        assert_eq!(parse("_"), vec![Record::Node(NodeRecord::new(""))]);
        assert_eq!(parse("__"), vec![Record::Node(NodeRecord::new(""))]);
        assert_eq!(parse("___"), vec![Record::Node(NodeRecord::new("_"))]);
    }

    #[test]
    fn attribute_line_alone_yields_nothing() {
        assert!(parse("a=42").is_empty());
        assert!(parse("").is_empty());
        assert!(parse("\n\n# only a comment\n").is_empty());
    }

    #[test]
    fn attributes_from_above_and_below() {
        let schema = "
 x=1 y=2
 mynode
 z=3
";
        assert_eq!(
            parse(schema),
            vec![Record::Node(
                NodeRecord::new("mynode")
                    .with_attribute("x", "1")
                    .with_attribute("y", "2")
                    .with_attribute("z", "3")
            )]
        );
    }

    #[test]
    fn attribute_between_nodes_goes_to_edge() {
        let schema = "
a ------- b
   len=5
";
        let records = parse(schema);
        assert_eq!(
            records[1],
            Record::Edge(EdgeRecord::new("a", "b").with_attribute("len", "5"))
        );
        assert!(records[0].as_node().is_some_and(|node| node.attributes.is_empty()));
    }

    #[test]
    fn edge_attribute_can_start_on_equals_filler() {
        let records = parse("a==b\n att=b");
        assert_eq!(
            records[1],
            Record::Edge(EdgeRecord::new("a", "b").with_attribute("att", "b"))
        );
    }

    #[test]
    fn separate_chains_attach_to_separate_entities() {
        let schema = "
n1    n2
t=1   t=2
";
        let records = parse(schema);
        assert_eq!(records[0].as_node().map(|node| &node.attributes["t"]), Some(&"1".to_string()));
        assert_eq!(records[2].as_node().map(|node| &node.attributes["t"]), Some(&"2".to_string()));
    }

    #[test]
    fn comment_inside_block_does_not_split_it() {
        let records = parse("a b\n# note\n  k=v");
        assert_eq!(
            records[2],
            Record::Node(NodeRecord::new("b").with_neighbor("a").with_attribute("k", "v"))
        );
    }

    #[test]
    fn crlf_input_matches_lf_input() {
        assert_eq!(parse("a b\r\n  k=v\r\n"), parse("a b\n  k=v\n"));
    }

    #[test]
    fn lenient_parse_reports_warnings() {
        let result = parse_with_options("a\nb\n\n  k=1\n\n_\nx\n  y=2", &ParseOptions::default())
            .expect("lenient parse never fails");
        let codes: Vec<WarningCode> = result.warnings.iter().map(|warning| warning.code).collect();
        assert_eq!(
            codes,
            vec![
                WarningCode::MissingBlankLine,
                WarningCode::OrphanAttributes,
                WarningCode::EmptyNodeId,
                WarningCode::MissingBlankLine,
                WarningCode::UnattachedAttributes,
            ]
        );
        assert_eq!(result.node_count(), 4);
    }

    #[test]
    fn strict_mode_rejects_missing_blank_line() {
        let error = parse_with_options("a b\nc", &ParseOptions::strict())
            .expect_err("adjacent node lines are an error in strict mode");
        assert_eq!(error.code(), ParseErrorCode::MissingBlankLine);
        assert_eq!(error.span().line_number(), 2);

        let ok = parse_with_options("a b\n\nc\n   k=v", &ParseOptions::strict())
            .expect("well separated blocks");
        assert_eq!(ok.records.len(), 4);
    }

    #[test]
    fn comments_are_records_on_request() {
        let result = parse_with_options("# title\na", &ParseOptions::with_comments())
            .expect("lenient parse");
        assert_eq!(result.comment_count(), 1);
        assert!(result.records[0].is_comment());
        assert!(parse("# title\na").iter().all(|record| !record.is_comment()));
    }

    #[test]
    fn summary_counts_records_and_warnings() {
        let result = parse_with_options("a b c\n\nk=v", &ParseOptions::default())
            .expect("lenient parse");
        let summary: serde_json::Value =
            serde_json::from_str(&summary_json(&result)).expect("summary is json");
        assert_eq!(summary["node_count"], 3);
        assert_eq!(summary["edge_count"], 2);
        assert_eq!(summary["warning_count"], 1);
        assert_eq!(summary["warnings"][0]["code"], "textgraph/warn/orphan-attributes");
        assert_eq!(summary["warnings"][0]["line"], 3);
    }

    #[test]
    fn empty_result_is_default() {
        let result = parse_with_options("", &ParseOptions::default()).expect("lenient parse");
        assert_eq!(result, ParseResult::default());
    }

    /// An id that begins with `_` at the left end of a connected run cannot
    /// be redrawn without detaching it.
    fn starts_run_with_leading_underscore(records: &[Record]) -> bool {
        records.windows(2).any(|pair| {
            pair[0].as_node().is_some_and(|node| node.id.starts_with('_'))
                && pair[1].as_edge().is_some()
        })
    }

    fn connected_pairs(records: &[Record]) -> Vec<bool> {
        records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.as_node().is_some())
            .map(|(index, _)| records.get(index + 1).is_some_and(|next| next.as_edge().is_some()))
            .collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_parse_is_total_and_deterministic(input in ".{0,256}") {
            let first = parse_with_options(&input, &ParseOptions::with_comments())
                .expect("lenient parse never fails");
            let second = parse_with_options(&input, &ParseOptions::with_comments())
                .expect("lenient parse never fails");
            prop_assert_eq!(&first, &second);

            let encoded = serde_json::to_string(&first.records).expect("serialize records");
            let decoded: Vec<Record> = serde_json::from_str(&encoded).expect("deserialize records");
            prop_assert_eq!(decoded, first.records);
        }

        #[test]
        fn prop_plain_lines_yield_k_nodes_and_k_minus_one_edges(
            lines in prop::collection::vec(
                prop::collection::vec("[a-z][a-z0-9]{0,4}", 1..6),
                1..4,
            )
        ) {
            let schema = lines
                .iter()
                .map(|ids| ids.join(" --- "))
                .collect::<Vec<_>>()
                .join("\n\n");
            let records = parse(&schema);

            let expected: Vec<Record> = lines
                .iter()
                .flat_map(|ids| {
                    ids.iter().enumerate().flat_map(move |(index, id)| {
                        let mut node = NodeRecord::new(id.as_str());
                        if index > 0 {
                            node = node.with_neighbor(ids[index - 1].as_str());
                        }
                        let mut out = Vec::new();
                        if let Some(next) = ids.get(index + 1) {
                            out.push(Record::Node(node.with_neighbor(next.as_str())));
                            out.push(Record::Edge(EdgeRecord::new(id.as_str(), next.as_str())));
                        } else {
                            out.push(Record::Node(node));
                        }
                        out
                    })
                })
                .collect();
            prop_assert_eq!(records, expected);
        }

        #[test]
        fn prop_underscores_always_suppress(
            tokens in prop::collection::vec("_?[a-z]{1,3}_?", 2..7)
        ) {
            let records = parse(&tokens.join("  "));
            let connected = connected_pairs(&records);
            prop_assert_eq!(connected.len(), tokens.len());
            for (index, pair) in tokens.windows(2).enumerate() {
                let detached = index == 0 && pair[0].starts_with('_');
                let suppressed = pair[0].ends_with('_') || pair[1].starts_with('_') || detached;
                prop_assert_eq!(
                    connected[index],
                    !suppressed,
                    "edge after token {} in {:?}", index, tokens
                );
            }
        }

        #[test]
        fn prop_chains_split_on_double_separators(
            first in "[a-z0-9]{1,3}",
            second in "[a-z0-9]{1,3}",
            single in any::<bool>(),
        ) {
            let separator = if single { " " } else { "  " };
            let attributes = format!("k0={first}{separator}k1={second}");
            // The left node ends one column past `k0=...`; with a double
            // separator `k1` starts on the right node instead.
            let width = format!("k0={first}").chars().count();
            let schema = format!("{} b\n{attributes}", "a".repeat(width + 1));
            let result = parse_with_options(&schema, &ParseOptions::default())
                .expect("lenient parse");
            prop_assert!(result.warnings.is_empty());

            let nodes: Vec<&NodeRecord> =
                result.records.iter().filter_map(Record::as_node).collect();
            prop_assert_eq!(nodes.len(), 2);
            let keys = |node: &NodeRecord| node.attributes.keys().cloned().collect::<Vec<_>>();
            if single {
                prop_assert_eq!(keys(nodes[0]), vec!["k0".to_string(), "k1".to_string()]);
                prop_assert!(nodes[1].attributes.is_empty());
            } else {
                prop_assert_eq!(keys(nodes[0]), vec!["k0".to_string()]);
                prop_assert_eq!(keys(nodes[1]), vec!["k1".to_string()]);
                prop_assert_eq!(&nodes[1].attributes["k1"], &second);
            }
        }

        #[test]
        fn prop_skeleton_roundtrip_keeps_adjacency(input in "[ab1_ =~,#\n-]{0,96}") {
            let records = parse(&input);
            prop_assume!(!starts_run_with_leading_underscore(&records));
            let reparsed = parse(&render_skeleton(&records));
            prop_assert_eq!(adjacency(&reparsed), adjacency(&records));
        }
    }
}
