//! Grammar-driven parser.
//!
//! Parsing is two-phase. Matching (`match_segments`) consumes a flat run of
//! segments and wraps the parts it recognises; parsing (`parse_segment`)
//! then expands each wrapped segment with its parse grammar, recursively,
//! until no expandable segments remain.

mod context;
mod grammar;
mod lookahead;
mod match_result;
mod matching;
mod raw_parsers;
mod segment_parse;

#[cfg(test)]
mod tests;

use squill_core::PositionMarker;

pub use context::{DEFAULT_MAX_PARSE_DEPTH, FurthestFailure, ParseContext};
pub use grammar::{
    BracketPair, Grammar, GrammarKind, SimpleHint, any_number_of, anything, bracketed,
    contains_only, dedent, delimited, greedy_until, indent, kw, nothing, one_of, r, seq,
    starts_with,
};
pub(crate) use grammar::keyword_segment_name;
pub use match_result::MatchResult;
pub use raw_parsers::{RawParser, keyword, named, regex, symbol};
pub use segment_parse::{SegmentDef, is_expandable, parse_file, parse_segment};

/// A structural mismatch that cannot be recovered inside the grammar.
///
/// Caught at segment boundaries, where the offending region becomes an
/// unparsable segment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub anchor: Option<PositionMarker>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, anchor: Option<PositionMarker>) -> Self {
        Self {
            message: message.into(),
            anchor,
        }
    }
}
