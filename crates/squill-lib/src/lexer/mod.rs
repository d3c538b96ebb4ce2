//! Lexer: templated text to a flat run of leaf segments.
//!
//! Matchers are tried in dialect order at each position and the first
//! non-empty match wins. Characters no matcher accepts are coalesced into a
//! single `unlexable` token and reported, so the parser still sees every
//! byte of the input.

mod matcher;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use squill_core::{PositionMarker, TemplatedFile};

use crate::dialect::Dialect;
use crate::segments::{MetaKind, Segment};

pub use matcher::LexMatcher;

/// A run of characters that no lexer matcher accepts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unable to lex characters: '{text}'")]
pub struct LexError {
    pub text: String,
    pub marker: PositionMarker,
}

pub struct Lexer {
    matchers: Vec<LexMatcher>,
}

impl Lexer {
    pub fn new(dialect: &Dialect) -> Self {
        Self {
            matchers: dialect.lexer_matchers().to_vec(),
        }
    }

    fn match_at(&self, text: &str) -> Option<(&LexMatcher, usize)> {
        self.matchers
            .iter()
            .find_map(|m| m.match_len(text).map(|len| (m, len)))
    }

    /// Lex the templated string of `file`.
    ///
    /// Never fails: unlexable text becomes `unlexable` tokens plus a
    /// [`LexError`] each. Source-only template slices become placeholders.
    pub fn lex(&self, file: &Arc<TemplatedFile>) -> (Vec<Segment>, Vec<LexError>) {
        let text = file.templated_str();
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        let mut placeholders = placeholder_points(file).into_iter().peekable();

        let mut pos = 0;
        let mut loc = (1, 1);
        let mut error_start: Option<usize> = None;

        while pos < text.len() {
            let hit = self.match_at(&text[pos..]);
            if hit.is_some()
                && let Some(start) = error_start.take()
            {
                let (segment, error) = unlexable(&text[start..pos], start..pos, file, &mut loc);
                tokens.push(segment);
                errors.push(error);
            }
            while let Some((point, _)) = placeholders.peek()
                && *point <= pos
                && error_start.is_none()
            {
                if let Some((point, meta)) = placeholders.next() {
                    tokens.push(placeholder(point, meta, file, loc));
                }
            }

            match hit {
                Some((matcher, len)) => {
                    let raw = &text[pos..pos + len];
                    let marker = marker_for(file, pos..pos + len, loc);
                    loc = PositionMarker::infer_next_position(raw, loc.0, loc.1);
                    tokens.push(Segment::token(raw, matcher.type_tag(), matcher.name(), marker));
                    pos += len;
                }
                None => {
                    error_start.get_or_insert(pos);
                    pos += text[pos..].chars().next().map_or(1, char::len_utf8);
                }
            }
        }

        if let Some(start) = error_start.take() {
            let (segment, error) = unlexable(&text[start..], start..text.len(), file, &mut loc);
            tokens.push(segment);
            errors.push(error);
        }
        for (point, meta) in placeholders {
            tokens.push(placeholder(point, meta, file, loc));
        }

        tracing::debug!(
            file = file.fname(),
            tokens = tokens.len(),
            errors = errors.len(),
            "lexed"
        );
        (tokens, errors)
    }
}

fn marker_for(
    file: &Arc<TemplatedFile>,
    templated: std::ops::Range<usize>,
    loc: (usize, usize),
) -> PositionMarker {
    let source = file.templated_slice_to_source_slice(templated.clone());
    PositionMarker::new(source, templated, Arc::clone(file), Some(loc))
}

fn unlexable(
    raw: &str,
    templated: std::ops::Range<usize>,
    file: &Arc<TemplatedFile>,
    loc: &mut (usize, usize),
) -> (Segment, LexError) {
    let marker = marker_for(file, templated, *loc);
    *loc = PositionMarker::infer_next_position(raw, loc.0, loc.1);
    tracing::debug!(text = raw, "unlexable");
    let error = LexError {
        text: raw.to_string(),
        marker: marker.clone(),
    };
    (Segment::token(raw, "unlexable", "unlexable", marker), error)
}

/// Source-only slices, keyed by the templated offset they sit at.
fn placeholder_points(file: &TemplatedFile) -> Vec<(usize, (std::ops::Range<usize>, MetaKind))> {
    file.sliced_file()
        .iter()
        .filter(|s| s.slice_type.is_source_only() && s.templated_slice.is_empty())
        .map(|s| {
            let source_str = file.source_str()[s.source_slice.clone()].to_string();
            let meta = MetaKind::Placeholder {
                block_type: s.slice_type,
                source_str,
            };
            (s.templated_slice.start, (s.source_slice.clone(), meta))
        })
        .collect()
}

fn placeholder(
    point: usize,
    (source, meta): (std::ops::Range<usize>, MetaKind),
    file: &Arc<TemplatedFile>,
    loc: (usize, usize),
) -> Segment {
    let marker = PositionMarker::new(source, point..point, Arc::clone(file), Some(loc));
    Segment::meta(meta, marker)
}
