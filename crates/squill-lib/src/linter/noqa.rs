//! Inline `noqa` directives.
//!
//! `-- noqa` silences every rule on its line, `-- noqa: L010,L0*` silences
//! matching rules on its line, and `-- noqa: disable=...` / `enable=...`
//! open and close a silenced range. `all` stands for every rule.

use std::collections::{BTreeMap, BTreeSet};

use crate::lexer::LexMatcher;
use crate::segments::Segment;

use super::rule::expand_selectors;
use super::violation::{Violation, ViolationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoQaAction {
    Enable,
    Disable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoQaDirective {
    pub line_no: usize,
    pub line_pos: usize,
    /// Rule codes affected; `None` means all.
    pub rules: Option<BTreeSet<String>>,
    pub action: Option<NoQaAction>,
    pub raw_str: String,
    pub used: bool,
}

const MALFORMED: &str = "Malformed 'noqa' section. Expected 'noqa: <rule>[,...]";
const MALFORMED_RANGE: &str =
    "Malformed 'noqa' section. Expected 'noqa: enable=<rule>[,...] | all' or 'noqa: disable=<rule>[,...] | all";

impl NoQaDirective {
    /// Parse the text of one comment. `Ok(None)` if it is not a directive.
    pub fn parse(
        comment: &str,
        line_no: usize,
        line_pos: usize,
        reference_map: &BTreeMap<String, BTreeSet<String>>,
    ) -> Result<Option<Self>, &'static str> {
        let comment = comment.split("--").last().unwrap_or("").trim();
        let Some(remainder) = comment.strip_prefix("noqa") else {
            return Ok(None);
        };
        let directive = |rules: Option<BTreeSet<String>>, action: Option<NoQaAction>| NoQaDirective {
            line_no,
            line_pos,
            rules,
            action,
            raw_str: comment.to_string(),
            used: false,
        };
        if remainder.is_empty() {
            return Ok(Some(directive(None, None)));
        }
        let Some(remainder) = remainder.strip_prefix(':') else {
            return Err(MALFORMED);
        };
        let remainder = remainder.trim();
        if remainder.is_empty() {
            return Ok(Some(directive(None, None)));
        }

        let (action, rule_part) = match remainder.split_once('=') {
            Some(("disable", rules)) => (Some(NoQaAction::Disable), rules),
            Some(("enable", rules)) => (Some(NoQaAction::Enable), rules),
            Some(_) => return Err(MALFORMED_RANGE),
            None if matches!(remainder, "disable" | "enable") => return Err(MALFORMED_RANGE),
            None => (None, remainder),
        };
        let rules = (rule_part.trim() != "all")
            .then(|| expand_selectors(rule_part.split(','), reference_map));
        Ok(Some(directive(rules, action)))
    }

    fn applies_to(&self, code: &str) -> bool {
        self.rules.as_ref().is_none_or(|rules| rules.contains(code))
    }
}

/// Every directive in one file.
#[derive(Debug, Clone, Default)]
pub struct IgnoreMask {
    directives: Vec<NoQaDirective>,
}

impl IgnoreMask {
    pub fn new(directives: Vec<NoQaDirective>) -> Self {
        Self { directives }
    }

    pub fn directives(&self) -> &[NoQaDirective] {
        &self.directives
    }

    /// Directives from the comments of a parsed tree, plus a violation for
    /// each malformed one.
    pub fn from_tree(
        tree: &Segment,
        reference_map: &BTreeMap<String, BTreeSet<String>>,
    ) -> (Self, Vec<Violation>) {
        let mut directives = Vec::new();
        let mut violations = Vec::new();
        for comment in tree.recursive_crawl(&["comment"], false) {
            if !comment.is_comment() {
                continue;
            }
            let (line_no, line_pos) = comment.marker().source_position();
            match NoQaDirective::parse(comment_body(comment.raw()), line_no, line_pos, reference_map) {
                Ok(Some(directive)) => directives.push(directive),
                Ok(None) => {}
                Err(msg) => violations.push(
                    Violation::stage(ViolationKind::Noqa, msg, comment.marker())
                        .with_anchor(comment.clone()),
                ),
            }
        }
        if !directives.is_empty() {
            tracing::debug!(count = directives.len(), "noqa directives parsed");
        }
        (Self { directives }, violations)
    }

    /// Directives found by scanning source lines with an inline-comment
    /// matcher. Used when a file could not be templated.
    pub fn from_source(
        source: &str,
        inline_comment: &LexMatcher,
        reference_map: &BTreeMap<String, BTreeSet<String>>,
    ) -> (Self, Vec<Violation>) {
        let mut directives = Vec::new();
        let mut violations = Vec::new();
        for (idx, line) in source.split('\n').enumerate() {
            let found = line
                .char_indices()
                .find_map(|(pos, _)| inline_comment.match_len(&line[pos..]).map(|len| (pos, len)));
            let Some((pos, len)) = found else {
                continue;
            };
            let line_no = idx + 1;
            let line_pos = line[..pos].chars().count() + 1;
            match NoQaDirective::parse(&line[pos..pos + len], line_no, line_pos, reference_map) {
                Ok(Some(directive)) => directives.push(directive),
                Ok(None) => {}
                Err(msg) => violations.push(Violation::at_position(
                    ViolationKind::Noqa,
                    "NOQA",
                    "noqa",
                    msg,
                    line_no,
                    line_pos,
                )),
            }
        }
        (Self { directives }, violations)
    }

    /// Drop the violations silenced by directives, marking directives used.
    pub fn ignore_masked_violations(&mut self, violations: Vec<Violation>) -> Vec<Violation> {
        let violations = self.filter_single_line(violations);
        self.filter_ranges(violations)
    }

    fn filter_single_line(&mut self, mut violations: Vec<Violation>) -> Vec<Violation> {
        for directive in self.directives.iter_mut().filter(|d| d.action.is_none()) {
            let before = violations.len();
            violations.retain(|v| !(v.line_no == directive.line_no && directive.applies_to(&v.code)));
            if violations.len() != before {
                directive.used = true;
            }
        }
        violations
    }

    fn filter_ranges(&mut self, violations: Vec<Violation>) -> Vec<Violation> {
        let mut ranged: Vec<usize> = self
            .directives
            .iter()
            .enumerate()
            .filter(|(_, d)| d.action.is_some())
            .map(|(i, _)| i)
            .collect();
        if ranged.is_empty() {
            return violations;
        }
        ranged.sort_by_key(|&i| self.directives[i].line_no);

        let mut kept = Vec::with_capacity(violations.len());
        for violation in violations {
            let relevant: Vec<usize> = ranged
                .iter()
                .copied()
                .filter(|&i| self.directives[i].applies_to(&violation.code))
                .collect();
            let (ignore, last_disable) = self.range_state(violation.line_no, &relevant);
            if !ignore {
                kept.push(violation);
            } else if let Some(i) = last_disable {
                self.directives[i].used = true;
            }
        }
        kept
    }

    /// Whether `line_no` is silenced by `relevant` (sorted by line), and the
    /// disable directive responsible.
    fn range_state(&mut self, line_no: usize, relevant: &[usize]) -> (bool, Option<usize>) {
        let mut ignore = false;
        let mut last_disable = None;
        for &i in relevant {
            let directive = &mut self.directives[i];
            if directive.line_no > line_no {
                if directive.action == Some(NoQaAction::Enable) {
                    directive.used = true;
                }
                break;
            }
            match directive.action {
                Some(NoQaAction::Enable) => {
                    if last_disable.is_some() {
                        directive.used = true;
                    }
                    last_disable = None;
                    ignore = false;
                }
                Some(NoQaAction::Disable) => {
                    last_disable = Some(i);
                    ignore = true;
                }
                None => {}
            }
        }
        (ignore, last_disable)
    }

    /// Warnings for directives that silenced nothing.
    pub fn unused_warnings(&self) -> Vec<Violation> {
        self.directives
            .iter()
            .filter(|d| !d.used)
            .map(|d| {
                Violation::at_position(
                    ViolationKind::Noqa,
                    "NOQA",
                    "noqa",
                    format!("Unused noqa: '{}'", d.raw_str),
                    d.line_no,
                    d.line_pos,
                )
                .as_warning()
            })
            .collect()
    }
}

/// Comment text without block delimiters.
fn comment_body(raw: &str) -> &str {
    let mut body = raw.trim();
    if let Some(rest) = body.strip_suffix("*/") {
        body = rest.trim_end();
    }
    if let Some(rest) = body.strip_prefix("/*") {
        body = rest.trim_start();
    }
    body
}
