//! Node lines, their column spans, and attribute association.

use tg_core::{
    Attributes, EdgeRecord, NodeRecord, ParseWarning, Record, Span, WarningCode,
};
use tracing::debug;

use crate::chain::AttributeChain;
use crate::scan::Token;

/// Half-open column interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ColumnSpan {
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl ColumnSpan {
    pub(crate) const fn contains(self, column: usize) -> bool {
        self.start <= column && column < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NodeToken {
    pub(crate) id: String,
    pub(crate) span: ColumnSpan,
    pub(crate) suppresses_left_edge: bool,
    pub(crate) suppresses_right_edge: bool,
}

impl From<Token> for NodeToken {
    fn from(token: Token) -> Self {
        let suppresses_left_edge = token.text.starts_with('_');
        let rest = if suppresses_left_edge {
            &token.text[1..]
        } else {
            token.text.as_str()
        };
        // `_` alone is consumed by the leading strip and leaves nothing behind.
        let suppresses_right_edge = token.text.ends_with('_');
        let id = rest.strip_suffix('_').unwrap_or(rest);

        Self {
            id: id.to_string(),
            span: ColumnSpan {
                start: token.start,
                end: token.end,
            },
            suppresses_left_edge,
            suppresses_right_edge,
        }
    }
}

/// What a column of a node line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanTarget {
    Node(usize),
    /// Gap between node `i` and `i + 1` carrying an edge.
    Edge(usize),
    /// Gap whose edge was suppressed by an underscore.
    SuppressedGap(usize),
}

/// The node line of a block with its inferred edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NodeLine {
    row: usize,
    nodes: Vec<NodeToken>,
    /// `connected[i]` tells whether nodes `i` and `i + 1` share an edge.
    connected: Vec<bool>,
}

impl NodeLine {
    pub(crate) fn new(row: usize, tokens: Vec<Token>, warnings: &mut Vec<ParseWarning>) -> Self {
        let nodes: Vec<NodeToken> = tokens.into_iter().map(NodeToken::from).collect();

        for node in nodes.iter().filter(|node| node.id.is_empty()) {
            warnings.push(ParseWarning::new(
                WarningCode::EmptyNodeId,
                format!(
                    "Line {}: node token at column {} is empty after removing underscores",
                    row + 1,
                    node.span.start + 1
                ),
                Span::columns(row, node.span.start, node.span.end),
            ));
        }

        let connected = (0..nodes.len().saturating_sub(1))
            .map(|left| edge_connects(&nodes, left))
            .collect();

        Self {
            row,
            nodes,
            connected,
        }
    }

    pub(crate) const fn row(&self) -> usize {
        self.row
    }

    fn locate(&self, column: usize) -> Option<SpanTarget> {
        self.nodes.iter().enumerate().find_map(|(index, node)| {
            if node.span.contains(column) {
                return Some(SpanTarget::Node(index));
            }
            let right = self.nodes.get(index + 1)?;
            let gap = ColumnSpan {
                start: node.span.end,
                end: right.span.start,
            };
            if !gap.contains(column) {
                None
            } else if self.connected[index] {
                Some(SpanTarget::Edge(index))
            } else {
                Some(SpanTarget::SuppressedGap(index))
            }
        })
    }

    /// Attach `chains` (in merge order) and emit records left to right,
    /// nodes interleaved with the edges between them.
    pub(crate) fn into_records<'a>(
        self,
        chains: impl IntoIterator<Item = &'a AttributeChain>,
        warnings: &mut Vec<ParseWarning>,
    ) -> Vec<Record> {
        let mut node_attributes = vec![Attributes::new(); self.nodes.len()];
        let mut edge_attributes = vec![Attributes::new(); self.connected.len()];

        for chain in chains {
            let target = match self.locate(chain.start) {
                Some(SpanTarget::Node(index)) => &mut node_attributes[index],
                Some(SpanTarget::Edge(index)) => &mut edge_attributes[index],
                located => {
                    debug!(
                        row = chain.row,
                        column = chain.start,
                        polarity = chain.polarity.as_str(),
                        "dropping unattached attribute chain"
                    );
                    let reason = if matches!(located, Some(SpanTarget::SuppressedGap(_))) {
                        "falls between nodes whose edge is suppressed"
                    } else {
                        "is outside every node and edge"
                    };
                    warnings.push(ParseWarning::new(
                        WarningCode::UnattachedAttributes,
                        format!(
                            "Line {}: attributes at column {} {reason}; ignored",
                            chain.row + 1,
                            chain.start + 1
                        ),
                        chain.span(),
                    ));
                    continue;
                }
            };
            target.extend(chain.pairs.iter().cloned());
        }

        let mut records = Vec::with_capacity(self.nodes.len() * 2);
        let mut edge_attributes = edge_attributes.into_iter();

        for (index, (node, attributes)) in self.nodes.iter().zip(node_attributes).enumerate() {
            let mut record = NodeRecord {
                id: node.id.clone(),
                adjacency: Vec::new(),
                attributes,
            };
            if index > 0 && self.connected[index - 1] {
                record.adjacency.push(self.nodes[index - 1].id.clone());
            }
            let right = self
                .nodes
                .get(index + 1)
                .filter(|_| self.connected[index]);
            if let Some(right) = right {
                record.adjacency.push(right.id.clone());
            }
            records.push(Record::Node(record));

            let Some(attributes) = edge_attributes.next() else {
                continue;
            };
            if let Some(right) = right {
                records.push(Record::Edge(EdgeRecord {
                    endpoints: (node.id.clone(), right.id.clone()),
                    attributes,
                }));
            }
        }

        records
    }
}

/// Leading `_` cuts the edge to the left, trailing `_` the edge to the right.
/// A leading `_` on the first node of a line has nothing to cut on its left
/// and detaches the node from its right neighbor instead.
fn edge_connects(nodes: &[NodeToken], left: usize) -> bool {
    let (left_node, right_node) = (&nodes[left], &nodes[left + 1]);
    let detached = left == 0 && left_node.suppresses_left_edge;

    !(left_node.suppresses_right_edge || right_node.suppresses_left_edge || detached)
}
