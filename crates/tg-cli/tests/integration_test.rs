//! Integration tests for the textgraph pipeline.
//!
//! These tests drive the public parser API end to end on realistic drawings.

use tg_core::{CutSpec, ParseOptions, Record, Side, WarningCode};
use tg_parser::{cuts, node_positions, parse, parse_with_options, render_skeleton};

const NETWORK: &str = "
# two-port network
        r=10
 in ----- mid ----- out_
           c=1e-9   len=2

  Z=50
 load
";

fn node<'a>(records: &'a [Record], id: &str) -> &'a tg_core::NodeRecord {
    records
        .iter()
        .filter_map(Record::as_node)
        .find(|node| node.id == id)
        .unwrap_or_else(|| panic!("node {id} missing"))
}

/// A multi-block drawing with above/below attributes; the trailing `_` on the
/// last node of a line has no edge to cut.
#[test]
fn network_drawing_parses_into_nodes_edges_and_attributes() {
    let result = parse_with_options(NETWORK, &ParseOptions::default()).expect("lenient parse");
    assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);

    let records = &result.records;
    let kinds: Vec<&str> = records.iter().map(Record::kind_str).collect();
    assert_eq!(kinds, vec!["node", "edge", "node", "edge", "node", "node"]);

    assert_eq!(node(records, "in").adjacency, vec!["mid"]);
    assert_eq!(node(records, "mid").adjacency, vec!["in", "out"]);
    assert_eq!(node(records, "out").adjacency, vec!["mid"]);
    assert!(node(records, "load").adjacency.is_empty());
    assert_eq!(node(records, "mid").attributes["c"], "1e-9");
    assert_eq!(node(records, "out").attributes["len"], "2");
    assert_eq!(node(records, "load").attributes["Z"], "50");

    let edge = records[1].as_edge().expect("edge in-mid");
    assert_eq!(edge.endpoints, ("in".to_string(), "mid".to_string()));
    assert_eq!(edge.attributes["r"], "10");
    let edge = records[3].as_edge().expect("edge mid-out");
    assert_eq!(edge.endpoints, ("mid".to_string(), "out".to_string()));
    assert!(edge.attributes.is_empty());
}

/// Attributes below the gap whose edge was cut are reported, not attached.
#[test]
fn attributes_under_cut_edge_are_reported() {
    let result = parse_with_options("a ---- b_ ---- c\n         k=v", &ParseOptions::default())
        .expect("lenient parse");
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].code, WarningCode::UnattachedAttributes);
}

#[test]
fn records_serialize_as_tagged_json() {
    let records = parse("a b\n  w=1");
    let json = serde_json::to_value(&records).expect("serialize records");
    assert_eq!(json[0]["kind"], "node");
    assert_eq!(json[0]["adjacency"][0], "b");
    assert_eq!(json[1]["kind"], "edge");
    assert_eq!(json[1]["endpoints"][1], "b");
    assert_eq!(json[2]["attributes"]["w"], "1");
}

#[test]
fn positions_follow_the_drawing() {
    let positions = node_positions(NETWORK);
    let ids: Vec<&str> = positions.iter().map(|position| position.id.as_str()).collect();
    assert_eq!(ids, vec!["in", "mid", "out", "load"]);
    assert_eq!(positions[1].row, 3);
    assert_eq!(positions[1].column, 10);
}

#[test]
fn cut_variants_each_drop_one_edge() {
    let schema = "a ------ b ------ c";
    let specs = [
        CutSpec::new("a").on_side(Side::Right),
        CutSpec::new("c").on_side(Side::Left).with_helper("t"),
    ];

    let edge_counts: Vec<usize> = cuts(schema, &specs)
        .map(|variant| {
            let variant = variant.expect("room for helper");
            parse(&variant)
                .iter()
                .filter(|record| record.as_edge().is_some())
                .count()
        })
        .collect();
    // One edge cut, one edge to the helper added.
    assert_eq!(edge_counts, vec![2, 2]);
}

#[test]
fn skeleton_reparses_to_same_structure() {
    let records = parse(NETWORK);
    let skeleton = render_skeleton(&records);
    assert_eq!(skeleton, "in --- mid --- out\n\nload\n");

    let reparsed = parse(&skeleton);
    let ids = |records: &[Record]| -> Vec<(String, Vec<String>)> {
        records
            .iter()
            .filter_map(Record::as_node)
            .map(|node| (node.id.clone(), node.adjacency.clone()))
            .collect()
    };
    assert_eq!(ids(&reparsed), ids(&records));
}
