//! Matching algorithms for every grammar kind.
//!
//! Every matcher returns a [`MatchResult`] whose `unmatched` part is a suffix
//! of its input. Callers rely on that to resume scanning by index.

use crate::dialect::DialectElement;
use crate::segments::{MetaKind, Segment, first_code_index, trim_non_code};
use crate::{Error, Result};

use super::ParseError;
use super::context::ParseContext;
use super::grammar::{Grammar, GrammarKind, SimpleHint};
use super::lookahead::bracket_sensitive_look_ahead_match;
use super::match_result::MatchResult;

impl Grammar {
    /// First-token hint, if the grammar can only start with known tokens.
    ///
    /// `crumbs` holds the refs being resolved, to cut cycles.
    pub fn simple<'a>(
        &'a self,
        ctx: &mut ParseContext<'a>,
        crumbs: &mut Vec<String>,
    ) -> Option<SimpleHint> {
        match &self.kind {
            GrammarKind::Ref { name, .. } => {
                if crumbs.contains(name) {
                    return None;
                }
                let top_level = crumbs.is_empty();
                if top_level && let Some(hint) = ctx.cached_simple(name) {
                    return hint.clone();
                }
                let element = ctx.dialect().resolve(name).ok()?;
                crumbs.push(name.clone());
                let hint = match element {
                    DialectElement::Grammar(grammar) => grammar.simple(ctx, crumbs),
                    DialectElement::Segment(def) => def.match_grammar.simple(ctx, crumbs),
                    DialectElement::Generator(_) => None,
                };
                crumbs.pop();
                if top_level {
                    ctx.store_simple(name, hint.clone());
                }
                hint
            }
            GrammarKind::Sequence(elements) => {
                let mut hint = SimpleHint::default();
                for element in elements.iter().filter(|e| !e.is_meta()) {
                    hint = hint.union(element.simple(ctx, crumbs)?);
                    if !element.is_optional() {
                        return Some(hint);
                    }
                }
                None
            }
            GrammarKind::OneOf { elements, .. }
            | GrammarKind::AnyNumberOf { elements, .. }
            | GrammarKind::Delimited { elements, .. } => {
                let mut hint = SimpleHint::default();
                for element in elements {
                    hint = hint.union(element.simple(ctx, crumbs)?);
                }
                Some(hint)
            }
            GrammarKind::Bracketed { bracket_type, .. } => {
                let pair = ctx.dialect().bracket_pair(bracket_type)?;
                pair.start.simple(ctx, crumbs)
            }
            GrammarKind::StartsWith { target, .. } => target.simple(ctx, crumbs),
            GrammarKind::Nothing => Some(SimpleHint::default()),
            GrammarKind::Parser(parser) => parser.simple(),
            GrammarKind::GreedyUntil { .. }
            | GrammarKind::ContainsOnly { .. }
            | GrammarKind::Anything
            | GrammarKind::Meta(_) => None,
        }
    }

    /// Match a prefix of `segments`.
    pub fn match_segments<'a>(
        &'a self,
        segments: &[Segment],
        ctx: &mut ParseContext<'a>,
    ) -> Result<MatchResult> {
        if segments.is_empty() {
            return Ok(MatchResult::empty());
        }
        match &self.kind {
            GrammarKind::Ref { name, exclude } => {
                self.match_ref(name, exclude.as_deref(), segments, ctx)
            }
            GrammarKind::Sequence(elements) => {
                ctx.deeper_match("Sequence", false, &self.terminators, |ctx| {
                    match_sequence(elements, self.allow_gaps, segments, ctx)
                })
            }
            GrammarKind::OneOf { elements, exclude } => {
                ctx.deeper_match("OneOf", false, &self.terminators, |ctx| {
                    if excluded(exclude.as_deref(), segments, ctx)? {
                        return Ok(MatchResult::from_unmatched(segments.to_vec()));
                    }
                    match_one_of(elements, segments, ctx)
                })
            }
            GrammarKind::AnyNumberOf {
                elements,
                min_times,
                max_times,
            } => ctx.deeper_match("AnyNumberOf", false, &self.terminators, |ctx| {
                match_any_number_of(
                    elements,
                    *min_times,
                    *max_times,
                    self.allow_gaps,
                    segments,
                    ctx,
                )
            }),
            GrammarKind::Delimited {
                elements,
                delimiter,
                allow_trailing,
                terminator,
                min_delimiters,
            } => ctx.deeper_match("Delimited", false, &self.terminators, |ctx| {
                let delimited = Delimited {
                    elements,
                    delimiter,
                    allow_trailing: *allow_trailing,
                    terminator: terminator.as_deref(),
                    min_delimiters: *min_delimiters,
                };
                if self.allow_gaps {
                    return delimited.match_segments(segments, ctx);
                }
                // Without gaps the list ends at the first non-code after its start.
                let start = first_code_index(segments).unwrap_or(0);
                let end = segments[start..]
                    .iter()
                    .position(|s| !s.is_code())
                    .map_or(segments.len(), |i| start + i);
                let mut result = delimited.match_segments(&segments[..end], ctx)?;
                if !result.has_match() {
                    return Ok(MatchResult::from_unmatched(segments.to_vec()));
                }
                result.unmatched.extend_from_slice(&segments[end..]);
                Ok(result)
            }),
            GrammarKind::Bracketed {
                elements,
                bracket_type,
            } => ctx.deeper_match("Bracketed", false, &self.terminators, |ctx| {
                match_bracketed(elements, bracket_type, self.allow_gaps, segments, ctx)
            }),
            GrammarKind::GreedyUntil {
                terminators,
                include_terminator,
                enforce_whitespace_preceding,
            } => match_greedy_until(
                terminators,
                *include_terminator,
                *enforce_whitespace_preceding,
                segments,
                ctx,
            ),
            GrammarKind::StartsWith {
                target,
                terminator,
                include_terminator,
            } => match_starts_with(
                target,
                terminator.as_deref(),
                *include_terminator,
                segments,
                ctx,
            ),
            GrammarKind::ContainsOnly { types, grammars } => {
                match_contains_only(types, grammars, segments, ctx)
            }
            GrammarKind::Anything => Ok(MatchResult::from_matched(segments.to_vec())),
            GrammarKind::Nothing | GrammarKind::Meta(_) => {
                Ok(MatchResult::from_unmatched(segments.to_vec()))
            }
            GrammarKind::Parser(parser) => Ok(parser.match_segments(segments)),
        }
    }

    fn match_ref<'a>(
        &'a self,
        name: &'a str,
        exclude: Option<&'a Grammar>,
        segments: &[Segment],
        ctx: &mut ParseContext<'a>,
    ) -> Result<MatchResult> {
        if excluded(exclude, segments, ctx)? {
            return Ok(MatchResult::from_unmatched(segments.to_vec()));
        }

        let key = ctx.cache_key(segments, self);
        if let Some(key) = &key {
            if ctx.is_blacklisted(key) {
                return Ok(MatchResult::from_unmatched(segments.to_vec()));
            }
            if let Some(hit) = ctx.check_cache(key) {
                return Ok(hit);
            }
        }

        let element = ctx.dialect().resolve(name)?;
        let result = ctx.deeper_match(name, false, &self.terminators, |ctx| match element {
            DialectElement::Grammar(grammar) => grammar.match_segments(segments, ctx),
            DialectElement::Segment(def) => def.match_segments(segments, ctx),
            DialectElement::Generator(_) => Err(Error::Internal(format!(
                "`{name}` is an unexpanded segment generator"
            ))),
        })?;

        if let Some(key) = key {
            ctx.store(key, &result);
        }
        Ok(result)
    }
}

fn excluded<'a>(
    exclude: Option<&'a Grammar>,
    segments: &[Segment],
    ctx: &mut ParseContext<'a>,
) -> Result<bool> {
    let Some(exclude) = exclude else {
        return Ok(false);
    };
    let Some(first) = first_code_index(segments) else {
        return Ok(false);
    };
    Ok(exclude.match_segments(&segments[first..], ctx)?.has_match())
}

/// Prefix `pre` and suffix `post` (both non-code) around an inner match.
fn rewrap(pre: &[Segment], inner: MatchResult, post: &[Segment]) -> MatchResult {
    let mut matched = pre.to_vec();
    matched.extend(inner.matched);
    if inner.unmatched.is_empty() {
        matched.extend_from_slice(post);
        MatchResult::from_matched(matched)
    } else {
        let mut unmatched = inner.unmatched;
        unmatched.extend_from_slice(post);
        MatchResult::new(matched, unmatched)
    }
}

/// Whether the first code segment of `segments` starts a context terminator.
fn at_terminator<'a>(segments: &[Segment], ctx: &mut ParseContext<'a>) -> Result<bool> {
    let terminators = ctx.terminators().to_vec();
    if terminators.is_empty() {
        return Ok(false);
    }
    let Some(first) = first_code_index(segments) else {
        return Ok(false);
    };
    for terminator in terminators {
        if terminator
            .simple(ctx, &mut Vec::new())
            .is_some_and(|hint| !hint.admits(&segments[first]))
        {
            continue;
        }
        if terminator.match_segments(&segments[first..], ctx)?.has_match() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Longest match among `elements`; the first complete match wins outright
/// and earlier elements win ties.
pub(crate) fn longest_match<'a>(
    elements: &'a [Grammar],
    segments: &[Segment],
    ctx: &mut ParseContext<'a>,
) -> Result<MatchResult> {
    let first_code = first_code_index(segments);
    let mut best: Option<MatchResult> = None;

    for element in elements {
        if let Some(first) = first_code
            && element
                .simple(ctx, &mut Vec::new())
                .is_some_and(|hint| !hint.admits(&segments[first]))
        {
            continue;
        }
        let result = element.match_segments(segments, ctx)?;
        if result.is_complete() {
            return Ok(result);
        }
        if !result.has_match() {
            continue;
        }
        let longer = best
            .as_ref()
            .is_none_or(|b| result.unmatched.len() < b.unmatched.len());
        if longer {
            let terminated = at_terminator(&result.unmatched, ctx)?;
            best = Some(result);
            if terminated {
                break;
            }
        }
    }

    Ok(best.unwrap_or_else(|| MatchResult::from_unmatched(segments.to_vec())))
}

fn match_one_of<'a>(
    elements: &'a [Grammar],
    segments: &[Segment],
    ctx: &mut ParseContext<'a>,
) -> Result<MatchResult> {
    let (pre, core, post) = trim_non_code(segments);
    if core.is_empty() {
        return Ok(MatchResult::from_unmatched(segments.to_vec()));
    }
    let inner = longest_match(elements, core, ctx)?;
    if !inner.has_match() {
        return Ok(MatchResult::from_unmatched(segments.to_vec()));
    }
    Ok(rewrap(pre, inner, post))
}

/// Zero-length marker for a meta inserted at `idx`.
fn meta_marker(
    segments: &[Segment],
    idx: usize,
    matched: &[Segment],
) -> Result<squill_core::PositionMarker> {
    if let Some(next) = segments.get(idx) {
        return Ok(next.marker().start_point_marker());
    }
    matched
        .iter()
        .rev()
        .find(|s| !s.is_meta())
        .or(segments.last())
        .map(|s| s.marker().end_point_marker())
        .ok_or_else(|| Error::Internal("cannot position a meta in empty input".to_string()))
}

fn last_code_leaf(segments: &[Segment]) -> Option<Segment> {
    segments
        .iter()
        .rev()
        .filter(|s| s.is_code())
        .find_map(|s| s.raw_segments().into_iter().rev().find(Segment::is_code))
}

fn first_code_leaf(segment: &Segment) -> Option<Segment> {
    segment.raw_segments().into_iter().find(Segment::is_code)
}

/// Record why a required sequence element failed.
fn record_sequence_failure(
    ctx: &mut ParseContext<'_>,
    element: &Grammar,
    matched: &[Segment],
    found: Option<&Segment>,
    segments: &[Segment],
) {
    let after = last_code_leaf(matched);
    let found_leaf = found.and_then(first_code_leaf);
    let found_text = match &found_leaf {
        Some(leaf) => format!("Found '{}'.", leaf.raw()),
        None => "Found nothing.".to_string(),
    };
    let expected = match &after {
        Some(after) => format!("expected {element} after {}. {found_text}", after.raw()),
        None => format!("expected {element}. {found_text}"),
    };
    let marker = match (&found_leaf, &after) {
        (Some(leaf), _) => leaf.marker().start_point_marker(),
        (None, Some(after)) => after.marker().end_point_marker(),
        (None, None) => match segments.last() {
            Some(last) => last.marker().end_point_marker(),
            None => return,
        },
    };
    ctx.record_failure(marker, expected);
}

pub(crate) fn match_sequence<'a>(
    elements: &'a [Grammar],
    allow_gaps: bool,
    segments: &[Segment],
    ctx: &mut ParseContext<'a>,
) -> Result<MatchResult> {
    let len = segments.len();
    let mut matched: Vec<Segment> = Vec::new();
    let mut idx = 0;

    for (i, element) in elements.iter().enumerate() {
        if let GrammarKind::Meta(kind) = &element.kind {
            let marker = meta_marker(segments, idx, &matched)?;
            matched.push(Segment::meta(kind.clone(), marker));
            continue;
        }

        let (gap_idx, gap_matched) = (idx, matched.len());
        if allow_gaps {
            while idx < len && !segments[idx].is_code() {
                matched.push(segments[idx].clone());
                idx += 1;
            }
        }

        if idx >= len {
            let rest = &elements[i..];
            if idx > 0 && rest.iter().all(|e| e.is_optional() || e.is_meta()) {
                for element in rest {
                    if let GrammarKind::Meta(kind) = &element.kind {
                        let marker = meta_marker(segments, idx, &matched)?;
                        matched.push(Segment::meta(kind.clone(), marker));
                    }
                }
                return Ok(MatchResult::from_matched(matched));
            }
            record_sequence_failure(ctx, element, &matched, None, segments);
            return Ok(MatchResult::from_unmatched(segments.to_vec()));
        }

        let result = element.match_segments(&segments[idx..], ctx)?;
        if result.has_match() {
            idx = len - result.unmatched.len();
            matched.extend(result.matched);
            continue;
        }
        if element.is_optional() {
            // The gap belongs to whatever matches next.
            idx = gap_idx;
            matched.truncate(gap_matched);
            continue;
        }
        record_sequence_failure(ctx, element, &matched, Some(&segments[idx]), segments);
        return Ok(MatchResult::from_unmatched(segments.to_vec()));
    }

    if idx == 0 {
        return Ok(MatchResult::from_unmatched(segments.to_vec()));
    }
    // Trailing non-code belongs to the sequence when nothing else follows.
    if allow_gaps && segments[idx..].iter().all(|s| !s.is_code()) {
        matched.extend_from_slice(&segments[idx..]);
        idx = len;
    }
    Ok(MatchResult::new(matched, segments[idx..].to_vec()))
}

fn match_any_number_of<'a>(
    elements: &'a [Grammar],
    min_times: usize,
    max_times: Option<usize>,
    allow_gaps: bool,
    segments: &[Segment],
    ctx: &mut ParseContext<'a>,
) -> Result<MatchResult> {
    let len = segments.len();
    let mut matched = Vec::new();
    let mut idx = 0;
    let mut count = 0;

    loop {
        if max_times.is_some_and(|max| count >= max) {
            break;
        }
        let mut start = idx;
        if allow_gaps {
            while start < len && !segments[start].is_code() {
                start += 1;
            }
        }
        if start >= len || at_terminator(&segments[start..], ctx)? {
            break;
        }
        let result = longest_match(elements, &segments[start..], ctx)?;
        let next = len - result.unmatched.len();
        if !result.has_match() || next <= start {
            break;
        }
        matched.extend_from_slice(&segments[idx..start]);
        matched.extend(result.matched);
        idx = next;
        count += 1;
    }

    if count == 0 || count < min_times {
        return Ok(MatchResult::from_unmatched(segments.to_vec()));
    }
    Ok(MatchResult::new(matched, segments[idx..].to_vec()))
}

struct Delimited<'a> {
    elements: &'a [Grammar],
    delimiter: &'a Grammar,
    allow_trailing: bool,
    terminator: Option<&'a Grammar>,
    min_delimiters: usize,
}

impl<'a> Delimited<'a> {
    /// One element between delimiters; must match completely.
    fn match_chunk(
        &self,
        content: &[Segment],
        ctx: &mut ParseContext<'a>,
    ) -> Result<Option<Vec<Segment>>> {
        let (pre, core, post) = trim_non_code(content);
        if core.is_empty() {
            return Ok(None);
        }
        let inner = longest_match(self.elements, core, ctx)?;
        if !inner.is_complete() {
            return Ok(None);
        }
        Ok(Some(rewrap(pre, inner, post).matched))
    }

    fn finish(&self, matched: Vec<Segment>, delimiters: usize, rest: &[Segment], all: &[Segment]) -> MatchResult {
        if delimiters < self.min_delimiters {
            return MatchResult::from_unmatched(all.to_vec());
        }
        MatchResult::new(matched, rest.to_vec())
    }

    fn match_segments(&self, segments: &[Segment], ctx: &mut ParseContext<'a>) -> Result<MatchResult> {
        let len = segments.len();
        let no_match = || Ok(MatchResult::from_unmatched(segments.to_vec()));
        let mut wanted: Vec<&'a Grammar> = vec![self.delimiter];
        wanted.extend(self.terminator);

        let mut matched = Vec::new();
        let mut idx = 0;
        let mut delimiters = 0;

        loop {
            let rest = &segments[idx..];
            let has_code = rest.iter().any(Segment::is_code);
            if !has_code {
                if delimiters > 0 && self.allow_trailing {
                    return Ok(self.finish(matched, delimiters, rest, segments));
                }
                return no_match();
            }

            match bracket_sensitive_look_ahead_match(rest, &wanted, ctx)? {
                Some(hit) if hit.matcher == 0 => {
                    let Some(chunk) = self.match_chunk(&rest[..hit.pre], ctx)? else {
                        return no_match();
                    };
                    matched.extend(chunk);
                    matched.extend(hit.result.matched);
                    idx = len - hit.result.unmatched.len();
                    delimiters += 1;
                }
                Some(hit) => {
                    let content = &rest[..hit.pre];
                    if !content.iter().any(Segment::is_code) {
                        if delimiters > 0 && self.allow_trailing {
                            return Ok(self.finish(matched, delimiters, rest, segments));
                        }
                        return no_match();
                    }
                    let Some(chunk) = self.match_chunk(content, ctx)? else {
                        return no_match();
                    };
                    matched.extend(chunk);
                    return Ok(self.finish(matched, delimiters, &rest[hit.pre..], segments));
                }
                None => {
                    let (pre, core, post) = trim_non_code(rest);
                    let inner = longest_match(self.elements, core, ctx)?;
                    if !inner.has_match() {
                        if delimiters > 0 && self.allow_trailing {
                            return Ok(self.finish(matched, delimiters, rest, segments));
                        }
                        return no_match();
                    }
                    let tail = rewrap(pre, inner, post);
                    matched.extend(tail.matched);
                    return Ok(self.finish(matched, delimiters, &tail.unmatched, segments));
                }
            }
        }
    }
}

fn match_bracketed<'a>(
    elements: &'a [Grammar],
    bracket_type: &str,
    allow_gaps: bool,
    segments: &[Segment],
    ctx: &mut ParseContext<'a>,
) -> Result<MatchResult> {
    let no_match = || Ok(MatchResult::from_unmatched(segments.to_vec()));
    let len = segments.len();
    let pair = ctx.dialect().bracket_pair(bracket_type).ok_or_else(|| {
        Error::Internal(format!("bracket type `{bracket_type}` is not registered"))
    })?;

    let start_idx = if allow_gaps {
        match first_code_index(segments) {
            Some(idx) => idx,
            None => return no_match(),
        }
    } else {
        0
    };
    let start = pair.start.match_segments(&segments[start_idx..], ctx)?;
    if !start.has_match() {
        return no_match();
    }
    let content_start = len - start.unmatched.len();

    let Some(hit) =
        bracket_sensitive_look_ahead_match(&segments[content_start..], &[&pair.end], ctx)?
    else {
        return Err(ParseError::new(
            "Couldn't find closing bracket for opening bracket.",
            Some(segments[start_idx].marker().clone()),
        )
        .into());
    };
    let content_end = content_start + hit.pre;
    let content = &segments[content_start..content_end];

    let content_matched = if content.iter().any(Segment::is_code) {
        let (pre, core, post) = trim_non_code(content);
        let inner = match_sequence(elements, allow_gaps, core, ctx)?;
        if !inner.is_complete() {
            return no_match();
        }
        rewrap(pre, inner, post).matched
    } else if elements.iter().all(|e| e.is_optional() || e.is_meta()) {
        content.to_vec()
    } else {
        return no_match();
    };

    let mut matched = segments[..start_idx].to_vec();
    let open_end = start
        .matched
        .last()
        .map(|s| s.marker().end_point_marker())
        .ok_or_else(|| Error::Internal("empty bracket match".to_string()))?;
    matched.extend(start.matched);
    matched.push(Segment::meta(MetaKind::Indent, open_end));
    matched.extend(content_matched);
    matched.push(Segment::meta(
        MetaKind::Dedent,
        segments[content_end].marker().start_point_marker(),
    ));
    matched.extend(hit.result.matched);
    Ok(MatchResult::new(matched, hit.result.unmatched))
}

fn match_greedy_until<'a>(
    terminators: &'a [Grammar],
    include_terminator: bool,
    enforce_whitespace_preceding: bool,
    segments: &[Segment],
    ctx: &mut ParseContext<'a>,
) -> Result<MatchResult> {
    let wanted: Vec<&'a Grammar> = terminators.iter().collect();
    let mut offset = 0;

    loop {
        let Some(hit) = bracket_sensitive_look_ahead_match(&segments[offset..], &wanted, ctx)?
        else {
            return Ok(MatchResult::from_matched(segments.to_vec()));
        };
        let pos = offset + hit.pre;
        // Whitespace is only required before keyword terminators.
        let keyword_hit = hit
            .result
            .matched
            .iter()
            .flat_map(Segment::raw_segments)
            .find(Segment::is_code)
            .is_some_and(|leaf| leaf.is_type("keyword"));
        let preceded_by_code = segments[..pos]
            .iter()
            .rev()
            .find(|s| !s.is_meta())
            .is_some_and(|s| !s.is_whitespace());
        if enforce_whitespace_preceding && keyword_hit && preceded_by_code {
            offset = pos + 1;
            if offset >= segments.len() {
                return Ok(MatchResult::from_matched(segments.to_vec()));
            }
            continue;
        }
        let mut matched = segments[..pos].to_vec();
        let unmatched = if include_terminator {
            matched.extend(hit.result.matched);
            hit.result.unmatched
        } else {
            segments[pos..].to_vec()
        };
        return Ok(MatchResult::new(matched, unmatched));
    }
}

fn match_starts_with<'a>(
    target: &'a Grammar,
    terminator: Option<&'a Grammar>,
    include_terminator: bool,
    segments: &[Segment],
    ctx: &mut ParseContext<'a>,
) -> Result<MatchResult> {
    let no_match = || Ok(MatchResult::from_unmatched(segments.to_vec()));
    let len = segments.len();
    let Some(first) = first_code_index(segments) else {
        return no_match();
    };
    let head = target.match_segments(&segments[first..], ctx)?;
    if !head.has_match() {
        return no_match();
    }
    let after = len - head.unmatched.len();
    let mut matched = segments[..first].to_vec();
    matched.extend(head.matched);

    let Some(terminator) = terminator else {
        matched.extend_from_slice(&segments[after..]);
        return Ok(MatchResult::from_matched(matched));
    };
    let Some(hit) = bracket_sensitive_look_ahead_match(&segments[after..], &[terminator], ctx)?
    else {
        matched.extend_from_slice(&segments[after..]);
        return Ok(MatchResult::from_matched(matched));
    };
    let pos = after + hit.pre;
    matched.extend_from_slice(&segments[after..pos]);
    if include_terminator {
        matched.extend(hit.result.matched);
        return Ok(MatchResult::new(matched, hit.result.unmatched));
    }
    Ok(MatchResult::new(matched, segments[pos..].to_vec()))
}

fn match_contains_only<'a>(
    types: &[&'static str],
    grammars: &'a [Grammar],
    segments: &[Segment],
    ctx: &mut ParseContext<'a>,
) -> Result<MatchResult> {
    let no_match = || Ok(MatchResult::from_unmatched(segments.to_vec()));
    if !segments.iter().any(Segment::is_code) {
        return no_match();
    }
    let mut matched = Vec::with_capacity(segments.len());
    'segments: for (idx, segment) in segments.iter().enumerate() {
        if !segment.is_code() || segment.is_any_type(types) {
            matched.push(segment.clone());
            continue;
        }
        for grammar in grammars {
            let result = grammar.match_segments(&segments[idx..=idx], ctx)?;
            if result.is_complete() {
                matched.extend(result.matched);
                continue 'segments;
            }
        }
        return no_match();
    }
    Ok(MatchResult::from_matched(matched))
}
