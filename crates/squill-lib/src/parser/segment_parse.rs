//! Segment definitions and the expansion phase.

use std::sync::Arc;

use squill_core::{PositionMarker, TemplatedFile};

use crate::dialect::Dialect;
use crate::segments::{MetaKind, Segment, SegmentKind, first_code_index, join_raw, span_of};
use crate::{Error, Result};

use super::context::ParseContext;
use super::grammar::Grammar;
use super::match_result::MatchResult;

/// A named segment type: how to recognise it, and optionally how to expand it.
#[derive(Debug, Clone)]
pub struct SegmentDef {
    pub name: &'static str,
    pub type_tag: &'static str,
    /// Used during matching to decide the segment's extent.
    pub match_grammar: Grammar,
    /// Applied to the children during expansion, if set.
    pub parse_grammar: Option<Grammar>,
    /// Keep leading/trailing whitespace and comments inside the segment.
    pub can_start_end_non_code: bool,
}

impl SegmentDef {
    pub fn new(name: &'static str, type_tag: &'static str, match_grammar: Grammar) -> Self {
        Self {
            name,
            type_tag,
            match_grammar,
            parse_grammar: None,
            can_start_end_non_code: false,
        }
    }

    pub fn with_parse_grammar(mut self, grammar: Grammar) -> Self {
        self.parse_grammar = Some(grammar);
        self
    }

    pub fn allow_non_code_ends(mut self) -> Self {
        self.can_start_end_non_code = true;
        self
    }

    /// Match with the match grammar and wrap what was consumed.
    pub fn match_segments<'a>(
        &'a self,
        segments: &[Segment],
        ctx: &mut ParseContext<'a>,
    ) -> Result<MatchResult> {
        if let Some((first, rest)) = segments.split_first()
            && matches!(first.kind(), SegmentKind::Interior(_))
            && first.name() == self.name
        {
            return Ok(MatchResult::new(vec![first.clone()], rest.to_vec()));
        }

        let result = self.match_grammar.match_segments(segments, ctx)?;
        if !result.has_match() {
            return Ok(MatchResult::from_unmatched(segments.to_vec()));
        }
        self.wrap(result, segments)
    }

    fn wrap(&self, result: MatchResult, segments: &[Segment]) -> Result<MatchResult> {
        let matched = &result.matched;
        let (start, end) = if self.can_start_end_non_code {
            (0, matched.len())
        } else {
            let start = matched
                .iter()
                .position(|s| !is_trimmable(s))
                .unwrap_or(matched.len());
            let end = matched
                .iter()
                .rposition(|s| !is_trimmable(s))
                .map_or(start, |i| i + 1);
            (start, end)
        };
        let core = &matched[start..end];
        if !core.iter().any(Segment::is_code) {
            return Ok(MatchResult::from_unmatched(segments.to_vec()));
        }
        let marker = span_of(core)
            .ok_or_else(|| Error::Internal(format!("empty match for {}", self.name)))?;

        let mut out = matched[..start].to_vec();
        out.push(Segment::interior(
            self.name,
            self.type_tag,
            core.to_vec(),
            marker,
        ));
        out.extend_from_slice(&matched[end..]);
        Ok(MatchResult::new(out, result.unmatched))
    }
}

/// Whitespace and comments, but not metas.
fn is_trimmable(segment: &Segment) -> bool {
    segment.is_raw() && !segment.is_code()
}

/// Whether expanding `segment` could change it.
pub fn is_expandable(segment: &Segment, dialect: &Dialect) -> bool {
    if !matches!(segment.kind(), SegmentKind::Interior(_)) {
        return false;
    }
    dialect
        .segment_def(segment.name())
        .is_some_and(|def| def.parse_grammar.is_some())
        || segment.children().iter().any(|c| is_expandable(c, dialect))
}

fn wrap_unparsable(
    children: &[Segment],
    expected: impl Into<String>,
    anchor: PositionMarker,
) -> Result<Segment> {
    let marker = span_of(children)
        .ok_or_else(|| Error::Internal("unparsable region is empty".to_string()))?;
    Ok(Segment::unparsable(children.to_vec(), expected, anchor, marker))
}

fn first_leaf_raw(segment: &Segment) -> String {
    segment
        .raw_segments()
        .into_iter()
        .find(Segment::is_code)
        .map(|leaf| leaf.raw().to_string())
        .unwrap_or_default()
}

/// Children after applying a parse grammar, with leftovers made unparsable.
fn apply_parse_result(
    result: MatchResult,
    all: &[Segment],
    grammar: &Grammar,
    ctx: &ParseContext<'_>,
) -> Result<Vec<Segment>> {
    if result.is_complete() {
        return Ok(result.matched);
    }
    if !result.has_match() {
        let (expected, anchor) = match ctx.furthest_failure() {
            Some(failure) => (failure.expected.clone(), failure.marker.clone()),
            None => {
                let anchor = first_code_index(all)
                    .map(|i| all[i].marker().start_point_marker())
                    .unwrap_or_else(|| all[0].marker().start_point_marker());
                (format!("expected {grammar}"), anchor)
            }
        };
        return Ok(vec![wrap_unparsable(all, expected, anchor)?]);
    }

    let rest = result.unmatched;
    let mut out = result.matched;
    let Some(lead) = first_code_index(&rest) else {
        out.extend(rest);
        return Ok(out);
    };
    out.extend_from_slice(&rest[..lead]);
    let region = &rest[lead..];
    let region_start = region[0].marker().templated_slice().start;

    let (expected, anchor) = match ctx.furthest_failure() {
        Some(failure) if failure.marker.templated_slice().start >= region_start => {
            (failure.expected.clone(), failure.marker.clone())
        }
        _ => {
            let after = out
                .iter()
                .rev()
                .filter(|s| s.is_code())
                .find_map(|s| s.raw_segments().into_iter().rev().find(Segment::is_code))
                .map(|leaf| leaf.raw().to_string())
                .unwrap_or_default();
            (
                format!(
                    "Nothing else after {after}. Found '{}'.",
                    first_leaf_raw(&region[0])
                ),
                region[0].marker().start_point_marker(),
            )
        }
    };
    out.push(wrap_unparsable(region, expected, anchor)?);
    Ok(out)
}

/// Expand `segment`: apply its parse grammar, then expand its children.
pub fn parse_segment(segment: &Segment, ctx: &mut ParseContext<'_>) -> Result<Segment> {
    if !matches!(segment.kind(), SegmentKind::Interior(_)) {
        return Ok(segment.clone());
    }
    let dialect = ctx.dialect();
    let def = dialect.segment_def(segment.name());
    let mut children = segment.children().to_vec();

    if let Some(grammar) = def.and_then(|d| d.parse_grammar.as_ref())
        && children.iter().any(Segment::is_code)
    {
        ctx.reset_for_parse();
        // Indents are regenerated by the grammar; placeholders are kept.
        let stripped: Vec<Segment> = children
            .into_iter()
            .filter(|s| !matches!(s.meta_kind(), Some(MetaKind::Indent | MetaKind::Dedent)))
            .collect();
        children = match grammar.match_segments(&stripped, ctx) {
            Ok(result) => apply_parse_result(result, &stripped, grammar, ctx)?,
            Err(Error::Parse(err)) => {
                let anchor = match err.anchor {
                    Some(anchor) => anchor,
                    None => stripped[0].marker().start_point_marker(),
                };
                vec![wrap_unparsable(&stripped, err.message, anchor)?]
            }
            Err(err) => return Err(err),
        };
        tracing::debug!(segment = segment.name(), "expanded");
    }

    if join_raw(&children) != segment.raw() {
        return Err(Error::Internal(format!(
            "parsing {} lost or duplicated text",
            segment.name()
        )));
    }

    if ctx.may_recurse() {
        children = ctx.deeper_parse(segment.name(), |ctx| {
            children
                .into_iter()
                .map(|child| {
                    if is_expandable(&child, dialect) {
                        parse_segment(&child, ctx)
                    } else {
                        Ok(child)
                    }
                })
                .collect()
        })?;
    }

    Ok(segment.with_children(children))
}

/// Wrap lexed tokens in the dialect's file segment and expand it.
pub fn parse_file(
    tokens: Vec<Segment>,
    templated_file: &Arc<TemplatedFile>,
    ctx: &mut ParseContext<'_>,
) -> Result<Segment> {
    let marker = span_of(&tokens)
        .unwrap_or_else(|| PositionMarker::from_point(0, 0, Arc::clone(templated_file), None));
    let file = Segment::interior("FileSegment", "file", tokens, marker);
    let tree = parse_segment(&file, ctx)?;
    tree.ensure_round_trip(templated_file.templated_str());
    Ok(tree)
}
