//! Schema editing: cut an edge by inserting a terminating helper node.
//!
//! `a ------ b` cut on the right of `a` becomes `a ----n_ b`: the helper `n`
//! keeps `a` connected to something while its trailing underscore drops the
//! edge towards `b`.

use tg_core::{CutSpec, Side};

use crate::scan::{ScannedLine, graphemes, is_word, scan_line};

/// Insert `helper_id` next to the first node `device_id` that has a neighbor
/// on `side` with enough filler in between.
///
/// The gap must hold at least `len(helper_id) + 3` graphemes so one filler
/// grapheme stays attached to the device. Returns `None` when no occurrence
/// qualifies.
#[must_use]
pub fn disconnect(schema: &str, device_id: &str, side: Side, helper_id: &str) -> Option<String> {
    let mut edited = String::with_capacity(schema.len() + helper_id.len() + 2);
    let mut done = false;

    for line in schema.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        let ending = &line[content.len()..];
        match (!done)
            .then(|| disconnect_line(content, device_id, side, helper_id))
            .flatten()
        {
            Some(replaced) => {
                edited.push_str(&replaced);
                edited.push_str(ending);
                done = true;
            }
            None => edited.push_str(line),
        }
    }

    done.then_some(edited)
}

/// Cut on `side`, or when no side is given, try the left side first.
#[must_use]
pub fn cut(schema: &str, device_id: &str, side: Option<Side>, helper_id: &str) -> Option<String> {
    match side {
        Some(side) => disconnect(schema, device_id, side, helper_id),
        None => disconnect(schema, device_id, Side::Left, helper_id)
            .or_else(|| disconnect(schema, device_id, Side::Right, helper_id)),
    }
}

/// One independently edited variant of `schema` per `CutSpec`, computed lazily.
pub fn cuts<'a>(
    schema: &'a str,
    specs: impl IntoIterator<Item = &'a CutSpec> + 'a,
) -> impl Iterator<Item = Option<String>> + 'a {
    specs
        .into_iter()
        .map(move |spec| cut(schema, &spec.device_id, spec.side, &spec.helper_id))
}

fn disconnect_line(line: &str, device_id: &str, side: Side, helper_id: &str) -> Option<String> {
    if !matches!(scan_line(line), ScannedLine::Nodes(_)) {
        return None;
    }

    let cells = graphemes(line);
    let runs = word_runs(&cells);
    let width = graphemes(helper_id).len() + 2;

    let (start, end, insert) = runs.iter().enumerate().find_map(|(index, &(start, end))| {
        if cells[start..end].concat() != device_id {
            return None;
        }
        match side {
            Side::Right => {
                let &(next_start, _) = runs.get(index + 1)?;
                (next_start - end > width)
                    .then(|| (next_start - width, next_start, format!("{helper_id}_ ")))
            }
            Side::Left => {
                let &(_, previous_end) = runs.get(index.checked_sub(1)?)?;
                (start - previous_end > width)
                    .then(|| (previous_end, previous_end + width, format!(" _{helper_id}")))
            }
        }
    })?;

    Some(format!(
        "{}{insert}{}",
        cells[..start].concat(),
        cells[end..].concat()
    ))
}

fn word_runs(cells: &[&str]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut index = 0;
    while index < cells.len() {
        if is_word(cells[index]) {
            let start = index;
            while index < cells.len() && is_word(cells[index]) {
                index += 1;
            }
            runs.push((start, index));
        } else {
            index += 1;
        }
    }
    runs
}
