#![forbid(unsafe_code)]

mod options;
mod params;

pub use options::ParseOptions;
pub use params::{
    AttributeSpec, ParamAttribute, ParamElement, ParamError, ParamKind, ParamSchema, ParamValue,
    TypedAttribute, TypedElement, TypedValue,
};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point in the source text. Both fields are 0-based; `col` counts grapheme
/// clusters, so it matches the display column of monospaced text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Half-open column range `[start_col, end_col)` on a single line.
    #[must_use]
    pub const fn columns(line: usize, start_col: usize, end_col: usize) -> Self {
        Self::new(
            Position {
                line,
                col: start_col,
            },
            Position { line, col: end_col },
        )
    }

    #[must_use]
    pub fn at_line(line: usize, line_len: usize) -> Self {
        Self::columns(line, 0, line_len)
    }

    /// 1-based line number for human-facing messages.
    #[must_use]
    pub const fn line_number(&self) -> usize {
        self.start.line + 1
    }
}

/// Classification of one raw input line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LineKind {
    Comment,
    Blank,
    NodeLine,
    AttributeLine,
}

impl LineKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Blank => "blank",
            Self::NodeLine => "node-line",
            Self::AttributeLine => "attribute-line",
        }
    }
}

/// Attribute values are kept verbatim; no numeric or unit parsing happens.
pub type Attributes = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NodeRecord {
    pub id: String,
    /// Neighbor ids, left neighbor first. Suppressed edges are not listed.
    pub adjacency: Vec<String>,
    pub attributes: Attributes,
}

impl NodeRecord {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_neighbor(mut self, neighbor: impl Into<String>) -> Self {
        self.adjacency.push(neighbor.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EdgeRecord {
    pub endpoints: (String, String),
    pub attributes: Attributes,
}

impl EdgeRecord {
    #[must_use]
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            endpoints: (left.into(), right.into()),
            attributes: Attributes::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn left(&self) -> &str {
        &self.endpoints.0
    }

    #[must_use]
    pub fn right(&self) -> &str {
        &self.endpoints.1
    }
}

/// A comment line, only emitted when [`ParseOptions::keep_comments`] is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CommentRecord {
    /// The line as written, without its line break.
    pub text: String,
    /// 0-based line index.
    pub row: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    Node(NodeRecord),
    Edge(EdgeRecord),
    Comment(CommentRecord),
}

impl Record {
    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::Node(_) => "node",
            Self::Edge(_) => "edge",
            Self::Comment(_) => "comment",
        }
    }

    #[must_use]
    pub const fn as_node(&self) -> Option<&NodeRecord> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_edge(&self) -> Option<&EdgeRecord> {
        match self {
            Self::Edge(edge) => Some(edge),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_comment(&self) -> bool {
        matches!(self, Self::Comment(_))
    }
}

impl From<NodeRecord> for Record {
    fn from(node: NodeRecord) -> Self {
        Self::Node(node)
    }
}

impl From<EdgeRecord> for Record {
    fn from(edge: EdgeRecord) -> Self {
        Self::Edge(edge)
    }
}

/// Location of a node identifier in the source text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NodePosition {
    pub id: String,
    /// 0-based line index of the node line.
    pub row: usize,
    /// Column of the identifier's first character (after a stripped `_`).
    pub column: usize,
}

impl NodePosition {
    /// Drawing coordinates with the y axis pointing up: `(column, -row)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn xy(&self) -> (f64, f64) {
        (self.column as f64, -(self.row as f64))
    }
}

/// Which edge of a node a cut applies to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// One requested cut: insert `helper_id` next to `device_id` on `side`
/// (left first, then right, when `side` is `None`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CutSpec {
    pub device_id: String,
    pub side: Option<Side>,
    pub helper_id: String,
}

impl CutSpec {
    pub const DEFAULT_HELPER_ID: &'static str = "n";

    #[must_use]
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            side: None,
            helper_id: Self::DEFAULT_HELPER_ID.to_string(),
        }
    }

    #[must_use]
    pub fn on_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    #[must_use]
    pub fn with_helper(mut self, helper_id: impl Into<String>) -> Self {
        self.helper_id = helper_id.into();
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum WarningCode {
    /// Two node lines followed each other without a blank line.
    #[default]
    MissingBlankLine,
    /// An attribute chain started outside every node and edge span.
    UnattachedAttributes,
    /// Attribute lines were closed off without any node line.
    OrphanAttributes,
    /// A node token reduced to an empty identifier.
    EmptyNodeId,
}

impl WarningCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingBlankLine => "textgraph/warn/missing-blank-line",
            Self::UnattachedAttributes => "textgraph/warn/unattached-attributes",
            Self::OrphanAttributes => "textgraph/warn/orphan-attributes",
            Self::EmptyNodeId => "textgraph/warn/empty-node-id",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ParseWarning {
    pub code: WarningCode,
    pub message: String,
    pub span: Span,
}

impl ParseWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span,
        }
    }

    /// The hard error this warning becomes in strict mode, if any.
    #[must_use]
    pub fn escalate(&self) -> Option<ParseError> {
        match self.code {
            WarningCode::MissingBlankLine => Some(ParseError::MissingBlankLine {
                message: self.message.clone(),
                span: self.span,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ParseErrorCode {
    #[default]
    MissingBlankLine,
}

impl ParseErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingBlankLine => "textgraph/error/missing-blank-line",
        }
    }
}

/// Only produced in strict mode; lenient parsing never fails.
#[derive(Debug, Clone, Serialize, Deserialize, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("{message}")]
    MissingBlankLine { message: String, span: Span },
}

impl ParseError {
    #[must_use]
    pub const fn code(&self) -> ParseErrorCode {
        match self {
            Self::MissingBlankLine { .. } => ParseErrorCode::MissingBlankLine,
        }
    }

    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::MissingBlankLine { span, .. } => *span,
        }
    }
}
