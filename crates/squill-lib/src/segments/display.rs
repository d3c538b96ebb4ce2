//! Textual renderings of segment trees.

use std::fmt::Write;

use super::{Segment, SegmentKind};

/// Nested `(type, raw | children)` view of a tree, metas excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentTuple {
    Leaf(&'static str, String),
    Node(&'static str, Vec<SegmentTuple>),
}

impl Segment {
    pub fn to_tuple(&self, code_only: bool) -> SegmentTuple {
        match self.kind() {
            SegmentKind::Raw(_) | SegmentKind::Meta(_) => {
                SegmentTuple::Leaf(self.type_tag(), self.raw().to_string())
            }
            SegmentKind::Interior(_) | SegmentKind::Unparsable(_) => SegmentTuple::Node(
                self.type_tag(),
                self.children()
                    .iter()
                    .filter(|c| !c.is_meta() && (!code_only || c.is_code()))
                    .map(|c| c.to_tuple(code_only))
                    .collect(),
            ),
        }
    }

    /// Indented dump, one segment per line.
    ///
    /// ```text
    /// file:
    ///   statement:
    ///     keyword: "SELECT"
    /// ```
    pub fn stringify(&self) -> String {
        let mut out = String::new();
        self.stringify_into(&mut out, 0);
        out
    }

    fn stringify_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        // Writing into a String cannot fail.
        let _ = match self.kind() {
            SegmentKind::Raw(_) => writeln!(out, "{indent}{}: {:?}", self.type_tag(), self.raw()),
            SegmentKind::Meta(_) => writeln!(out, "{indent}[{}]", self.type_tag()),
            SegmentKind::Interior(_) => writeln!(out, "{indent}{}:", self.type_tag()),
            SegmentKind::Unparsable(data) => {
                writeln!(out, "{indent}unparsable: {}", data.expected)
            }
        };
        for child in self.children() {
            child.stringify_into(out, depth + 1);
        }
    }
}
