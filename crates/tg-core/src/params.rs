//! Parameter lists such as `Resistor(r=10, pins=(1, 2))`.
//!
//! [`ParamElement`] keeps every name and value as written, with its span.
//! A [`ParamSchema`] turns elements into [`TypedElement`]s.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Span;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParamValue {
    /// Verbatim, quotes included for quoted values.
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParamAttribute {
    pub name: String,
    pub span: Span,
    pub values: Vec<ParamValue>,
}

impl ParamAttribute {
    #[must_use]
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.values.iter().map(|value| value.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParamElement {
    pub name: String,
    pub span: Span,
    pub attributes: Vec<ParamAttribute>,
}

impl ParamElement {
    #[must_use]
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
            attributes: Vec::new(),
        }
    }

    /// The last attribute called `name`.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&ParamAttribute> {
        self.attributes.iter().rev().find(|attribute| attribute.name == name)
    }

    /// Attribute names mapped to their value texts; a repeated name keeps
    /// its last values.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, Vec<String>> {
        self.attributes
            .iter()
            .map(|attribute| {
                let texts = attribute.values.iter().map(|value| value.text.clone()).collect();
                (attribute.name.clone(), texts)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Text,
    Integer,
    Float,
}

impl ParamKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TypedValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TypedAttribute {
    Single(TypedValue),
    Tuple(Vec<TypedValue>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypedElement {
    pub name: String,
    pub attributes: BTreeMap<String, TypedAttribute>,
}

/// How one attribute of an element is read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AttributeSpec {
    pub kind: ParamKind,
    /// Accept any number of values and always produce a tuple.
    #[serde(default)]
    pub tuple: bool,
    #[serde(default)]
    pub optional: bool,
}

impl AttributeSpec {
    #[must_use]
    pub const fn single(kind: ParamKind) -> Self {
        Self {
            kind,
            tuple: false,
            optional: false,
        }
    }

    #[must_use]
    pub const fn tuple(kind: ParamKind) -> Self {
        Self {
            kind,
            tuple: true,
            optional: false,
        }
    }

    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Known elements and their attributes.
///
/// Deserializes from TOML of the form
///
/// ```toml
/// [elements.Resistor]
/// r = { kind = "float" }
/// pins = { kind = "integer", tuple = true, optional = true }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ParamSchema {
    pub elements: BTreeMap<String, BTreeMap<String, AttributeSpec>>,
}

impl ParamSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_element<K: Into<String>>(
        mut self,
        name: impl Into<String>,
        attributes: impl IntoIterator<Item = (K, AttributeSpec)>,
    ) -> Self {
        let attributes = attributes
            .into_iter()
            .map(|(key, spec)| (key.into(), spec))
            .collect();
        self.elements.insert(name.into(), attributes);
        self
    }

    #[must_use]
    pub fn element(&self, name: &str) -> Option<&BTreeMap<String, AttributeSpec>> {
        self.elements.get(name)
    }
}

/// Problems found while reading parameter lists. Every message ends with a
/// two-line hint: the source line, then a marker under the offending text.
#[derive(Debug, Clone, Serialize, Deserialize, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("invalid text '{text}'\n{hint}")]
    InvalidText {
        text: String,
        span: Span,
        hint: String,
    },
    #[error("unexpected end of data, attribute '{attribute}' has no value\n{hint}")]
    UnexpectedEnd {
        attribute: String,
        span: Span,
        hint: String,
    },
    #[error("unknown element '{name}'\n{hint}")]
    UnknownElement {
        name: String,
        span: Span,
        hint: String,
    },
    #[error("invalid name for attribute '{name}'\n{hint}")]
    UnknownAttribute {
        name: String,
        span: Span,
        hint: String,
    },
    #[error("just one value is accepted for '{name}'\n{hint}")]
    TooManyValues {
        name: String,
        span: Span,
        hint: String,
    },
    #[error("'{text}' cannot be converted to {}\n{hint}", .kind.as_str())]
    Conversion {
        text: String,
        kind: ParamKind,
        span: Span,
        hint: String,
    },
    #[error("element '{element}' is missing attribute '{attribute}'\n{hint}")]
    MissingAttribute {
        element: String,
        attribute: String,
        span: Span,
        hint: String,
    },
}

impl ParamError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidText { .. } => "textgraph/params/invalid-text",
            Self::UnexpectedEnd { .. } => "textgraph/params/unexpected-end",
            Self::UnknownElement { .. } => "textgraph/params/unknown-element",
            Self::UnknownAttribute { .. } => "textgraph/params/unknown-attribute",
            Self::TooManyValues { .. } => "textgraph/params/too-many-values",
            Self::Conversion { .. } => "textgraph/params/conversion",
            Self::MissingAttribute { .. } => "textgraph/params/missing-attribute",
        }
    }

    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::InvalidText { span, .. }
            | Self::UnexpectedEnd { span, .. }
            | Self::UnknownElement { span, .. }
            | Self::UnknownAttribute { span, .. }
            | Self::TooManyValues { span, .. }
            | Self::Conversion { span, .. }
            | Self::MissingAttribute { span, .. } => *span,
        }
    }
}
