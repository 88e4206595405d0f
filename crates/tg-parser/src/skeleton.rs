use tg_core::Record;

const EDGE_FILLER: &str = " --- ";

/// Redraw the node/edge structure of `records` as a textual graph.
///
/// Every connected run of nodes becomes its own block, so the drawing parses
/// back to the same adjacency. Attributes and comments are not drawn.
///
/// A run whose first id starts with `_` cannot be drawn: the extra leading
/// underscore needed to keep the id would detach it from the run.
#[must_use]
pub fn render_skeleton(records: &[Record]) -> String {
    let mut runs: Vec<Vec<&str>> = Vec::new();
    let mut continues_run = false;

    for record in records {
        match record {
            Record::Node(node) => {
                match runs.last_mut() {
                    Some(run) if continues_run => run.push(node.id.as_str()),
                    _ => runs.push(vec![node.id.as_str()]),
                }
                continues_run = false;
            }
            Record::Edge(_) => continues_run = true,
            Record::Comment(_) => {}
        }
    }

    let mut out = String::new();
    for (index, run) in runs.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        match run.as_slice() {
            [single] => out.push_str(&isolated(single)),
            [inner @ .., last] => {
                for id in inner {
                    out.push_str(id);
                    out.push_str(EDGE_FILLER);
                }
                out.push_str(&run_end(last));
            }
            [] => {}
        }
        out.push('\n');
    }
    out
}

/// The last node of a run can keep a trailing `_` in its id: one more
/// underscore is stripped again and has no edge to cut.
fn run_end(id: &str) -> String {
    if id.ends_with('_') {
        format!("{id}_")
    } else {
        id.to_string()
    }
}

/// An isolated node may carry boundary underscores in its id; wrapping it in
/// one more pair keeps them after stripping.
fn isolated(id: &str) -> String {
    if id.is_empty() || id.starts_with('_') || id.ends_with('_') {
        format!("_{id}_")
    } else {
        id.to_string()
    }
}
