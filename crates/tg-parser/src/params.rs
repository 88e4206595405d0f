//! Reader for parameter lists: `Name(key=value, key=(v1, v2)), Other`.
//!
//! Elements are separated by commas or whitespace and may span lines.
//! Invalid text is reported and skipped; reading goes on after it.

use std::collections::BTreeMap;

use tg_core::{
    ParamAttribute, ParamElement, ParamError, ParamKind, ParamSchema, ParamValue, Span,
    TypedAttribute, TypedElement, TypedValue,
};
use tracing::{debug, trace};

use crate::scan::{graphemes, is_value, is_word, run_end, split_lines};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    /// Expecting an element name.
    Element,
    /// After a name: `(`, `,` or the next element name.
    AfterElement,
    /// Inside `(`: an attribute name or `)`.
    Attribute,
    Equals,
    Value,
    /// After a value: `,`, `)` or the next attribute name.
    AfterAttribute,
    /// Inside a parenthesized tuple of values.
    Values,
}

#[derive(Debug)]
struct ParamReader<'a> {
    lines: Vec<&'a str>,
    state: ReadState,
    current: Option<ParamElement>,
    results: Vec<Result<ParamElement, ParamError>>,
}

impl<'a> ParamReader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lines: split_lines(input).collect(),
            state: ReadState::Element,
            current: None,
            results: Vec::new(),
        }
    }

    fn read(mut self) -> Vec<Result<ParamElement, ParamError>> {
        for row in 0..self.lines.len() {
            let cells = graphemes(self.lines[row]);
            let mut index = 0;
            while index < cells.len() {
                index = if is_space(cells[index]) {
                    index + 1
                } else {
                    self.step(row, &cells, index)
                };
            }
        }
        self.finish()
    }

    /// Consume the lexeme at `start` and return the index after it.
    fn step(&mut self, row: usize, cells: &[&str], start: usize) -> usize {
        let cell = cells[start];
        let next = start + 1;
        match (self.state, cell) {
            (ReadState::Element | ReadState::AfterElement, _) if starts_name(cell) => {
                let end = run_end(cells, start, is_word);
                self.open_element(cells[start..end].concat(), Span::columns(row, start, end));
                self.state = ReadState::AfterElement;
                end
            }
            (ReadState::Attribute | ReadState::AfterAttribute, _) if starts_name(cell) => {
                let end = run_end(cells, start, is_word);
                self.open_attribute(cells[start..end].concat(), Span::columns(row, start, end));
                self.state = ReadState::Equals;
                end
            }
            (ReadState::AfterElement, ",") => {
                self.state = ReadState::Element;
                next
            }
            (ReadState::AfterElement, "(") => {
                self.state = ReadState::Attribute;
                next
            }
            (ReadState::Attribute | ReadState::AfterAttribute, ")") => {
                self.state = ReadState::AfterElement;
                next
            }
            (ReadState::AfterAttribute, ",") => {
                self.state = ReadState::Attribute;
                next
            }
            (ReadState::Equals, "=") => {
                self.state = ReadState::Value;
                next
            }
            (ReadState::Value, "(") => {
                self.state = ReadState::Values;
                next
            }
            (ReadState::Values, ",") => next,
            (ReadState::Values, ")") => {
                if self.pending_attribute().is_some() {
                    self.drop_empty_tuple(row, start);
                }
                self.state = ReadState::AfterAttribute;
                next
            }
            (ReadState::Value | ReadState::Values, _) if is_value(cell) || is_quote(cell) => {
                let Some(end) = value_end(cells, start) else {
                    self.invalid(row, cells, start, cells.len());
                    return cells.len();
                };
                self.push_value(cells[start..end].concat(), Span::columns(row, start, end));
                if self.state == ReadState::Value {
                    self.state = ReadState::AfterAttribute;
                }
                end
            }
            _ => {
                let end = invalid_end(cells, start);
                self.invalid(row, cells, start, end);
                end
            }
        }
    }

    fn open_element(&mut self, name: String, span: Span) {
        if let Some(element) = self.current.take() {
            self.results.push(Ok(element));
        }
        self.current = Some(ParamElement::new(name, span));
    }

    fn open_attribute(&mut self, name: String, span: Span) {
        if let Some(element) = &mut self.current {
            element.attributes.push(ParamAttribute::new(name, span));
        }
    }

    fn push_value(&mut self, text: String, span: Span) {
        let attribute = self
            .current
            .as_mut()
            .and_then(|element| element.attributes.last_mut());
        if let Some(attribute) = attribute {
            attribute.values.push(ParamValue { text, span });
        }
    }

    /// The last attribute of the open element when it has no value yet.
    fn pending_attribute(&self) -> Option<&ParamAttribute> {
        self.current
            .as_ref()
            .and_then(|element| element.attributes.last())
            .filter(|attribute| attribute.values.is_empty())
    }

    /// `key=()` carries nothing: report it and forget the attribute.
    fn drop_empty_tuple(&mut self, row: usize, close: usize) {
        let Some(attribute) = self
            .current
            .as_mut()
            .and_then(|element| element.attributes.pop())
        else {
            return;
        };
        let start = if attribute.span.start.line == row {
            attribute.span.start.col
        } else {
            close
        };
        let span = Span::columns(row, start, close + 1);
        let hint = self.hint(span);
        self.results.push(Err(ParamError::InvalidText {
            text: format!("{}=()", attribute.name),
            span,
            hint,
        }));
    }

    fn invalid(&mut self, row: usize, cells: &[&str], start: usize, end: usize) {
        let span = Span::columns(row, start, end);
        let text = cells[start..end].concat();
        trace!(row, start, state = ?self.state, text = %text, "invalid parameter text");
        let hint = self.hint(span);
        self.results.push(Err(ParamError::InvalidText { text, span, hint }));
    }

    fn hint(&self, span: Span) -> String {
        position_hint(self.lines.get(span.start.line).copied().unwrap_or(""), span)
    }

    fn finish(mut self) -> Vec<Result<ParamElement, ParamError>> {
        let unfinished = self
            .pending_attribute()
            .map(|attribute| (attribute.name.clone(), attribute.span));
        match unfinished {
            Some((attribute, span)) => {
                debug!(attribute = %attribute, "parameter list ended before a value");
                self.current = None;
                let hint = self.hint(span);
                self.results.push(Err(ParamError::UnexpectedEnd {
                    attribute,
                    span,
                    hint,
                }));
            }
            None => {
                if let Some(element) = self.current.take() {
                    self.results.push(Ok(element));
                }
            }
        }
        self.results
    }
}

fn is_space(cell: &str) -> bool {
    cell.chars().all(char::is_whitespace)
}

fn is_quote(cell: &str) -> bool {
    matches!(cell, "\"" | "'")
}

fn starts_name(cell: &str) -> bool {
    cell.chars().next().is_some_and(char::is_alphabetic)
}

/// End of a bare or quoted value; `None` for a quote left open.
fn value_end(cells: &[&str], start: usize) -> Option<usize> {
    let quote = cells[start];
    if !is_quote(quote) {
        return Some(run_end(cells, start, is_value));
    }
    cells[start + 1..]
        .iter()
        .position(|cell| *cell == quote)
        .map(|offset| start + offset + 2)
}

/// Invalid text runs up to the next space, delimiter or name.
fn invalid_end(cells: &[&str], start: usize) -> usize {
    cells[start + 1..]
        .iter()
        .position(|cell| {
            is_space(cell) || starts_name(cell) || is_quote(cell) || matches!(*cell, "(" | ")" | "," | "=")
        })
        .map_or(cells.len(), |offset| start + 1 + offset)
}

/// Two lines locating `span` in `line`: `line:col:` and the source line, then
/// `-` up to the span and `^` under it. Line and column are 1-based.
pub(crate) fn position_hint(line: &str, span: Span) -> String {
    let prefix = format!("{}:{}:", span.line_number(), span.start.col + 1);
    let width = span.end.col.saturating_sub(span.start.col).max(1);
    format!(
        "{prefix}{line}\n{}{}{}",
        " ".repeat(prefix.len()),
        "-".repeat(span.start.col),
        "^".repeat(width)
    )
}

/// Read every element of `input` with names, values and spans as written.
///
/// Results come in the order they are completed: an error inside an element
/// is reported before the element itself. An element whose last attribute
/// never received a value is replaced by [`ParamError::UnexpectedEnd`].
#[must_use]
pub fn parse_params(input: &str) -> Vec<Result<ParamElement, ParamError>> {
    let results = ParamReader::new(input).read();
    debug!(
        elements = results.iter().filter(|result| result.is_ok()).count(),
        errors = results.iter().filter(|result| result.is_err()).count(),
        "read parameter lists"
    );
    results
}

/// Read `input` and type every element against `schema`.
///
/// An element that does not fit the schema becomes its first error.
#[must_use]
pub fn read_params(input: &str, schema: &ParamSchema) -> Vec<Result<TypedElement, ParamError>> {
    let lines: Vec<&str> = split_lines(input).collect();
    parse_params(input)
        .into_iter()
        .map(|parsed| parsed.and_then(|element| convert(&element, schema, &lines)))
        .collect()
}

fn convert(
    element: &ParamElement,
    schema: &ParamSchema,
    lines: &[&str],
) -> Result<TypedElement, ParamError> {
    let hint = |span: Span| position_hint(lines.get(span.start.line).copied().unwrap_or(""), span);

    let Some(specs) = schema.element(&element.name) else {
        return Err(ParamError::UnknownElement {
            name: element.name.clone(),
            span: element.span,
            hint: hint(element.span),
        });
    };

    let mut attributes = BTreeMap::new();
    for attribute in &element.attributes {
        let Some(spec) = specs.get(&attribute.name) else {
            return Err(ParamError::UnknownAttribute {
                name: attribute.name.clone(),
                span: attribute.span,
                hint: hint(attribute.span),
            });
        };
        if let (false, Some(extra)) = (spec.tuple, attribute.values.get(1)) {
            return Err(ParamError::TooManyValues {
                name: attribute.name.clone(),
                span: extra.span,
                hint: hint(extra.span),
            });
        }

        let mut values = attribute
            .values
            .iter()
            .map(|value| {
                typed_value(&value.text, spec.kind).ok_or_else(|| ParamError::Conversion {
                    text: value.text.clone(),
                    kind: spec.kind,
                    span: value.span,
                    hint: hint(value.span),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let typed = if !spec.tuple && values.len() == 1 {
            TypedAttribute::Single(values.remove(0))
        } else {
            TypedAttribute::Tuple(values)
        };
        attributes.insert(attribute.name.clone(), typed);
    }

    if let Some((missing, _)) = specs
        .iter()
        .find(|(name, spec)| !spec.optional && !attributes.contains_key(*name))
    {
        return Err(ParamError::MissingAttribute {
            element: element.name.clone(),
            attribute: missing.clone(),
            span: element.span,
            hint: hint(element.span),
        });
    }

    Ok(TypedElement {
        name: element.name.clone(),
        attributes,
    })
}

fn typed_value(text: &str, kind: ParamKind) -> Option<TypedValue> {
    match kind {
        ParamKind::Text => Some(TypedValue::Text(unquote(text).to_string())),
        ParamKind::Integer => text.parse().ok().map(TypedValue::Integer),
        ParamKind::Float => text.parse().ok().map(TypedValue::Float),
    }
}

fn unquote(text: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|quote| text.strip_prefix(*quote)?.strip_suffix(*quote))
        .unwrap_or(text)
}
