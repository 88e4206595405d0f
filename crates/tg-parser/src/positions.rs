use tg_core::NodePosition;

use crate::block::NodeToken;
use crate::scan::{ScannedLine, scan_line, split_lines};

/// Where every node identifier sits in the drawing, in document order.
///
/// Blocks play no role here: each node line contributes all of its tokens.
/// The column is that of the identifier itself, past a stripped leading `_`.
#[must_use]
pub fn node_positions(input: &str) -> Vec<NodePosition> {
    split_lines(input)
        .enumerate()
        .filter_map(|(row, line)| match scan_line(line) {
            ScannedLine::Nodes(tokens) => Some((row, tokens)),
            _ => None,
        })
        .flat_map(|(row, tokens)| {
            tokens.into_iter().map(move |token| {
                let token = NodeToken::from(token);
                NodePosition {
                    column: token.span.start + usize::from(token.suppresses_left_edge),
                    id: token.id,
                    row,
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::node_positions;

    fn triples(input: &str) -> Vec<(String, usize, usize)> {
        node_positions(input)
            .into_iter()
            .map(|position| (position.id, position.row, position.column))
            .collect()
    }

    #[test]
    fn reports_row_and_identifier_column() {
        let schema = "\n  a ---- _b\n  k=v\n\n    c_";
        assert_eq!(
            triples(schema),
            vec![
                ("a".to_string(), 1, 2),
                ("b".to_string(), 1, 10),
                ("c".to_string(), 4, 4),
            ]
        );
    }

    #[test]
    fn adjacent_node_lines_are_all_reported() {
        assert_eq!(triples("a\nb").len(), 2);
    }

    #[test]
    fn comments_and_attributes_have_no_positions() {
        assert!(node_positions("# a b\nk=v").is_empty());
    }

    #[test]
    fn xy_is_y_up() {
        let positions = node_positions("\n\n   x");
        assert_eq!(positions[0].xy(), (3.0, -2.0));
    }
}
