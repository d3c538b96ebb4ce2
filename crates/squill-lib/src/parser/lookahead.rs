//! Forward scans for the first position where one of several grammars matches.

use crate::Result;
use crate::segments::Segment;

use super::ParseError;
use super::context::ParseContext;
use super::grammar::Grammar;
use super::match_result::MatchResult;

/// A hit found by a forward scan.
#[derive(Debug)]
pub(crate) struct LookAhead {
    /// Segments before the hit.
    pub pre: usize,
    /// Which of the wanted grammars matched.
    pub matcher: usize,
    pub result: MatchResult,
}

fn admits<'a>(grammar: &'a Grammar, segment: &Segment, ctx: &mut ParseContext<'a>) -> bool {
    grammar.simple(ctx, &mut Vec::new()).is_none_or(|hint| hint.admits(segment))
}

/// Try each wanted grammar at position `idx`, first hit wins.
fn match_at<'a>(
    segments: &[Segment],
    idx: usize,
    wanted: &[&'a Grammar],
    ctx: &mut ParseContext<'a>,
) -> Result<Option<LookAhead>> {
    for (matcher, grammar) in wanted.iter().enumerate() {
        if !admits(grammar, &segments[idx], ctx) {
            continue;
        }
        let result = grammar.match_segments(&segments[idx..], ctx)?;
        if result.has_match() {
            return Ok(Some(LookAhead {
                pre: idx,
                matcher,
                result,
            }));
        }
    }
    Ok(None)
}

/// First code position at which any of `wanted` matches, skipping
/// anything inside brackets.
///
/// A close bracket with no matching open, or an open bracket never closed,
/// is a parse error.
pub(crate) fn bracket_sensitive_look_ahead_match<'a>(
    segments: &[Segment],
    wanted: &[&'a Grammar],
    ctx: &mut ParseContext<'a>,
) -> Result<Option<LookAhead>> {
    let pairs = ctx.dialect().bracket_pairs();
    let mut stack: Vec<(&'static str, usize)> = Vec::new();

    'scan: for idx in 0..segments.len() {
        let segment = &segments[idx];
        if !segment.is_code() {
            continue;
        }
        if stack.is_empty()
            && let Some(hit) = match_at(segments, idx, wanted, ctx)?
        {
            return Ok(Some(hit));
        }
        for pair in pairs {
            if admits(&pair.start, segment, ctx)
                && pair.start.match_segments(&segments[idx..], ctx)?.has_match()
            {
                stack.push((pair.bracket_type, idx));
                continue 'scan;
            }
        }
        for pair in pairs {
            if admits(&pair.end, segment, ctx)
                && pair.end.match_segments(&segments[idx..], ctx)?.has_match()
            {
                match stack.last() {
                    Some((open_type, _)) if *open_type == pair.bracket_type => {
                        stack.pop();
                        continue 'scan;
                    }
                    _ => {
                        return Err(ParseError::new(
                            "Found unexpected end bracket!",
                            Some(segment.marker().clone()),
                        )
                        .into());
                    }
                }
            }
        }
    }

    if let Some((_, open_idx)) = stack.first() {
        return Err(ParseError::new(
            "Couldn't find closing bracket for opening bracket.",
            Some(segments[*open_idx].marker().clone()),
        )
        .into());
    }
    Ok(None)
}
