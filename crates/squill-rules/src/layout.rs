//! Whitespace and layout rules.

use squill_lib::segments::Segment;
use squill_lib::{CrawlBehaviour, LintFix, LintResult, Rule, RuleContext};

const LAYOUT_GROUPS: &[&str] = &["all", "core", "layout"];

/// Leaves of `root` that carry text, in order.
fn text_leaves(root: &Segment) -> Vec<Segment> {
    root.raw_segments()
        .into_iter()
        .filter(|s| !s.is_meta())
        .collect()
}

fn is_newline(segment: &Segment) -> bool {
    segment.is_type("newline")
}

fn is_inline_space(segment: &Segment) -> bool {
    segment.is_type("whitespace")
}

/// L001: no whitespace at the end of a line.
pub struct TrailingWhitespace;

impl Rule for TrailingWhitespace {
    fn code(&self) -> &'static str {
        "L001"
    }

    fn name(&self) -> &'static str {
        "layout.trailing_whitespace"
    }

    fn description(&self) -> &'static str {
        "Unnecessary trailing whitespace."
    }

    fn groups(&self) -> &'static [&'static str] {
        LAYOUT_GROUPS
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["LT01"]
    }

    fn crawl_behaviour(&self) -> CrawlBehaviour {
        CrawlBehaviour::RootOnly
    }

    fn eval(&self, context: &RuleContext<'_>) -> Vec<LintResult> {
        let leaves = text_leaves(context.segment);
        leaves
            .iter()
            .enumerate()
            .filter(|(i, leaf)| {
                is_inline_space(leaf) && leaves.get(i + 1).is_none_or(is_newline)
            })
            .map(|(_, leaf)| LintResult::new(leaf).with_fix(LintFix::delete(leaf)))
            .collect()
    }
}

/// L005: commas hug what precedes them and are followed by a space.
///
/// Leading commas (a comma first on its line) keep their indentation.
pub struct CommaSpacing;

impl Rule for CommaSpacing {
    fn code(&self) -> &'static str {
        "L005"
    }

    fn name(&self) -> &'static str {
        "layout.commas"
    }

    fn description(&self) -> &'static str {
        "Commas should not have whitespace directly before them."
    }

    fn groups(&self) -> &'static [&'static str] {
        LAYOUT_GROUPS
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["LT01"]
    }

    fn crawl_behaviour(&self) -> CrawlBehaviour {
        CrawlBehaviour::seeker(&["comma"])
    }

    fn eval(&self, context: &RuleContext<'_>) -> Vec<LintResult> {
        let comma = context.segment;
        let Some(root) = context.parent_stack.first() else {
            return Vec::new();
        };
        let leaves = text_leaves(root);
        let Some(idx) = leaves.iter().position(|s| s.id() == comma.id()) else {
            return Vec::new();
        };

        let mut fixes = Vec::new();
        let mut description = None;
        if let Some(before) = idx.checked_sub(1).map(|i| &leaves[i])
            && is_inline_space(before)
        {
            let line_start = idx
                .checked_sub(2)
                .map(|i| &leaves[i])
                .is_none_or(is_newline);
            if !line_start {
                fixes.push(LintFix::delete(before));
                description = Some("Unexpected whitespace before comma.");
            }
        }
        if let Some(after) = leaves.get(idx + 1)
            && after.is_code()
        {
            let space = Segment::whitespace(" ", comma.marker().end_point_marker());
            fixes.push(LintFix::create_after(comma, vec![space]));
            description.get_or_insert("Expected single whitespace after comma.");
        }

        match description {
            Some(description) => vec![
                LintResult::new(comma)
                    .with_fixes(fixes)
                    .with_description(description),
            ],
            None => Vec::new(),
        }
    }
}

/// L009: a file ends with exactly one newline.
pub struct EndOfFile;

impl Rule for EndOfFile {
    fn code(&self) -> &'static str {
        "L009"
    }

    fn name(&self) -> &'static str {
        "layout.end_of_file"
    }

    fn description(&self) -> &'static str {
        "Files must end with a single trailing newline."
    }

    fn groups(&self) -> &'static [&'static str] {
        LAYOUT_GROUPS
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["LT12"]
    }

    fn crawl_behaviour(&self) -> CrawlBehaviour {
        CrawlBehaviour::RootOnly
    }

    fn eval(&self, context: &RuleContext<'_>) -> Vec<LintResult> {
        let leaves = text_leaves(context.segment);
        let Some(last_code) = leaves.iter().rposition(|s| !s.is_whitespace()) else {
            return Vec::new();
        };
        let tail = &leaves[last_code + 1..];

        match tail.iter().position(is_newline) {
            None => {
                let anchor = &leaves[last_code];
                let newline = Segment::newline("\n", anchor.marker().end_point_marker());
                vec![
                    LintResult::new(anchor)
                        .with_fix(LintFix::create_after(anchor, vec![newline])),
                ]
            }
            Some(first) if first + 1 < tail.len() => {
                let extra = &tail[first + 1..];
                tracing::trace!(extra = extra.len(), "trailing lines after final newline");
                let fixes = extra.iter().map(LintFix::delete).collect();
                vec![LintResult::new(&extra[0]).with_fixes(fixes)]
            }
            Some(_) => Vec::new(),
        }
    }
}
