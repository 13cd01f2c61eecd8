//! Source ranges: byte offsets plus 0-based row/column points, taken
//! verbatim from the parser.

use serde::Serialize;
use tree_sitter::Node;

/// A 0-based row/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl From<tree_sitter::Point> for Point {
    fn from(p: tree_sitter::Point) -> Self {
        Point {
            row: p.row,
            column: p.column,
        }
    }
}

/// The byte and point span of a node in the source it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpanRange {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_point: Point,
    pub end_point: Point,
}

impl SpanRange {
    pub fn from_node(node: &Node) -> Self {
        SpanRange {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_point: node.start_position().into(),
            end_point: node.end_position().into(),
        }
    }
}

impl std::fmt::Display for SpanRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} - {}:{}",
            self.start_point.row, self.start_point.column, self.end_point.row, self.end_point.column
        )
    }
}
