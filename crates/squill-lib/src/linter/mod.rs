//! Linting: templater → lexer → parser → rule passes → patches.

mod config;
mod crawler;
mod encoding;
mod fix;
mod linted_file;
mod noqa;
mod patch;
mod rule;
mod violation;

#[cfg(test)]
mod tests;
#[cfg(test)]
mod noqa_tests;
#[cfg(test)]
mod patch_tests;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use squill_core::{TemplateError, TemplatedFile};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::dialect::{Dialect, dialect_selector};
use crate::lexer::Lexer;
use crate::parser::{ParseContext, parse_file};
use crate::segments::Segment;
use crate::templater::{Templater, templater_selector};
use crate::{Error, Result, UserError};

pub use config::{ENCODINGS, IGNORE_CLASSES, LinterConfig};
pub use crawler::{CrawlEnv, crawl};
pub use encoding::{Decoded, decode, encode};
pub use fix::{AnchorEditInfo, Applied, EditType, LintFix, apply_fixes, compute_anchor_edit_info};
pub use linted_file::{FileRecord, LintedFile, LintingResult, LintingStats, ViolationFilter};
pub use noqa::{IgnoreMask, NoQaAction, NoQaDirective};
pub use patch::{FixPatch, PatchCategory, PatchSet, apply_patches, generate_source_patches};
pub use rule::{
    CrawlBehaviour, LintResult, Rule, RuleContext, expand_selectors, reference_map, select_rules,
};
pub use violation::{FixRecord, Violation, ViolationKind, ViolationRecord};

/// Name given to strings linted without a path.
pub const STRING_INPUT: &str = "<string input>";

/// Outcome of templating, lexing and parsing one string.
#[derive(Debug, Clone)]
pub struct ParsedString {
    pub templated_file: Option<Arc<TemplatedFile>>,
    pub tree: Option<Segment>,
    pub violations: Vec<Violation>,
}

/// Outcome of the rule passes over one tree.
struct FixOutcome {
    tree: Segment,
    violations: Vec<Violation>,
    warnings: Diagnostics,
}

pub struct Linter {
    config: LinterConfig,
    dialect: Arc<Dialect>,
    templater: Box<dyn Templater>,
    rules: Vec<Box<dyn Rule>>,
    /// Selectors of every known rule, enabled or not.
    reference_map: BTreeMap<String, BTreeSet<String>>,
}

impl Linter {
    /// Build a linter over `rules`, keeping those `config` selects.
    pub fn new(config: LinterConfig, rules: Vec<Box<dyn Rule>>) -> Result<Self> {
        config.validate()?;
        let dialect = dialect_selector(&config.dialect)?;
        let templater = templater_selector(&config)?;
        let reference_map = reference_map(&rules);
        let rules = select_rules(rules, &config);
        Ok(Self {
            config,
            dialect,
            templater,
            rules,
            reference_map,
        })
    }

    pub fn config(&self) -> &LinterConfig {
        &self.config
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Codes of the enabled rules, in run order.
    pub fn rule_codes(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.code()).collect()
    }

    pub fn render_string(&self, sql: &str, fname: &str) -> std::result::Result<TemplatedFile, TemplateError> {
        self.templater.process(sql, fname)
    }

    /// Template, lex and parse `sql`. Failures become violations.
    pub fn parse_string(&self, sql: &str, fname: Option<&str>) -> ParsedString {
        let fname = fname.unwrap_or(STRING_INPUT);
        let mut violations = Vec::new();

        let file = match self.render_string(sql, fname) {
            Ok(file) => Arc::new(file),
            Err(err) => {
                tracing::warn!(fname, error = %err, "templating failed");
                violations.push(Violation::at_position(
                    ViolationKind::Template,
                    "TMP",
                    "templating",
                    err.to_string(),
                    1,
                    1,
                ));
                return ParsedString {
                    templated_file: None,
                    tree: None,
                    violations,
                };
            }
        };

        let (tokens, lex_errors) = Lexer::new(&self.dialect).lex(&file);
        for err in &lex_errors {
            violations.push(Violation::stage(ViolationKind::Lex, err.to_string(), &err.marker));
        }

        let mut ctx = ParseContext::new(&self.dialect)
            .with_indentation(self.config.indentation.clone())
            .with_max_parse_depth(self.config.max_parse_depth);
        let tree = match parse_file(tokens, &file, &mut ctx) {
            Ok(tree) => tree,
            Err(err) => {
                tracing::warn!(fname, error = %err, "parsing failed");
                let marker = squill_core::PositionMarker::from_point(0, 0, Arc::clone(&file), None);
                violations.push(Violation::stage(ViolationKind::Parse, err.to_string(), &marker));
                return ParsedString {
                    templated_file: Some(file),
                    tree: None,
                    violations,
                };
            }
        };

        for unparsable in tree.iter_unparsables() {
            let anchor = unparsable
                .unparsable_anchor()
                .cloned()
                .unwrap_or_else(|| unparsable.marker().clone());
            let description = match unparsable.expected() {
                Some(expected) if !expected.is_empty() => expected.to_string(),
                _ => format!("Found unparsable section: '{}'", unparsable.raw().trim()),
            };
            violations.push(
                Violation::stage(ViolationKind::Parse, description, &anchor).with_anchor(unparsable),
            );
        }
        tracing::debug!(fname, unparsable = violations.len(), "parsed");

        ParsedString {
            templated_file: Some(file),
            tree: Some(tree),
            violations,
        }
    }

    /// Lint one string. Never fails: problems are reported as violations.
    pub fn lint_string(&self, sql: &str, fname: Option<&str>, fix: bool) -> LintedFile {
        let path = fname.unwrap_or(STRING_INPUT);
        let span = tracing::info_span!("lint", path);
        let _guard = span.enter();

        let parsed = self.parse_string(sql, fname);
        let mut linted = LintedFile::new(path);
        let mut violations = parsed.violations;

        let mut mask = IgnoreMask::default();
        if let (Some(tree), Some(file)) = (&parsed.tree, &parsed.templated_file) {
            if !self.config.disable_noqa {
                let (found, malformed) = IgnoreMask::from_tree(tree, &self.reference_map);
                mask = found;
                violations.extend(malformed);
            }
            let parse_failed = violations
                .iter()
                .any(|v| matches!(v.kind, ViolationKind::Parse | ViolationKind::Lex));
            let fixing = fix && (!parse_failed || self.config.fix_even_unparsable);
            if fix && !fixing {
                tracing::info!("not fixing a file with parse errors");
            }
            let outcome = self.lint_fix_parsed(tree.clone(), file, fixing);
            violations.extend(outcome.violations);
            linted.warnings.extend(outcome.warnings);
            if fixing {
                for dropped in generate_source_patches(&outcome.tree, file).dropped {
                    linted
                        .warnings
                        .report(DiagnosticKind::FixDropped, dropped.source_slice.clone())
                        .message(format!(
                            "edit of {:?} to {:?} lies inside templated code",
                            dropped.source_str, dropped.fixed_raw
                        ))
                        .emit();
                }
            }
            linted.tree = Some(outcome.tree);
        } else if !self.config.disable_noqa
            && let Some(matcher) = self
                .dialect
                .lexer_matchers()
                .iter()
                .find(|m| m.name() == "inline_comment")
        {
            let (found, malformed) = IgnoreMask::from_source(sql, matcher, &self.reference_map);
            mask = found;
            violations.extend(malformed);
        }
        linted.templated_file = parsed.templated_file;

        violations.retain(|v| {
            v.kind
                .ignore_class()
                .is_none_or(|class| !self.config.ignores(class))
        });
        let mut violations = mask.ignore_masked_violations(violations);
        if self.config.warn_unused_ignores {
            violations.extend(mask.unused_warnings());
        }
        violations.sort_by(|a, b| {
            (a.line_no, a.line_pos, &a.code).cmp(&(b.line_no, b.line_pos, &b.code))
        });
        tracing::info!(violations = violations.len(), "linted");
        linted.violations = violations;
        linted
    }

    /// Run every rule over `tree`, applying fixes between rules when
    /// `fix` is set, until a pass changes nothing.
    ///
    /// Only findings from the first pass are reported.
    fn lint_fix_parsed(&self, tree: Segment, file: &Arc<TemplatedFile>, fix: bool) -> FixOutcome {
        let loop_limit = if fix { self.config.runaway_limit } else { 1 };
        let original = tree.clone();
        let mut tree = tree;
        let mut violations = Vec::new();
        let mut warnings = Diagnostics::new();
        let mut previous_versions: HashSet<u32> = HashSet::from([fingerprint(&tree)]);
        let mut last_fixes: BTreeMap<&'static str, Vec<LintFix>> = BTreeMap::new();
        let mut converged = !fix;

        for loop_idx in 0..loop_limit {
            let first_pass = loop_idx == 0;
            let mut changed = false;
            for rule in &self.rules {
                let env = CrawlEnv {
                    config: &self.config,
                    dialect: &self.dialect,
                    templated_file: file,
                };
                let mut results = match crawl(rule.as_ref(), &tree, &env) {
                    Ok(results) => results,
                    Err(msg) => {
                        tracing::error!(rule = rule.code(), panic = %msg, "rule panicked, skipping");
                        if first_pass {
                            violations.push(critical(rule.as_ref(), &msg, &tree));
                        }
                        continue;
                    }
                };
                discard_unsafe_fixes(rule.as_ref(), &mut results, file);
                if first_pass {
                    violations.extend(self.to_violations(rule.as_ref(), &results));
                }
                if !fix {
                    continue;
                }

                let fixes: Vec<LintFix> = results
                    .iter()
                    .flat_map(|r| r.fixes.iter().cloned())
                    .filter(|f| !f.is_trivial())
                    .collect();
                if fixes.is_empty() {
                    continue;
                }
                if last_fixes.get(rule.code()) == Some(&fixes) {
                    tracing::warn!(rule = rule.code(), "fixes repeat the previous pass, skipping");
                    continue;
                }
                last_fixes.insert(rule.code(), fixes.clone());

                let mut anchors = compute_anchor_edit_info(&fixes);
                anchors.retain(|_, info| {
                    if info.is_valid() {
                        return true;
                    }
                    let Some(anchor) = info.fixes.first().map(|f| &f.anchor) else {
                        return false;
                    };
                    tracing::warn!(rule = rule.code(), anchor = ?anchor, "conflicting fixes on one anchor skipped");
                    warnings
                        .report(DiagnosticKind::ConflictingFixes, anchor.marker().source_slice())
                        .message(format!(
                            "{} proposed {} fixes for one segment",
                            rule.code(),
                            info.total()
                        ))
                        .emit();
                    false
                });
                if anchors.is_empty() {
                    continue;
                }

                let applied = apply_fixes(&tree, &self.dialect, &mut anchors);
                if !anchors.is_empty() {
                    tracing::debug!(rule = rule.code(), left = anchors.len(), "fix anchors not found");
                }
                let new_tree = rebuild_root(applied).realign();
                if !previous_versions.insert(fingerprint(&new_tree)) {
                    tracing::warn!(rule = rule.code(), "fixes return to an earlier version, skipping");
                    continue;
                }
                tracing::debug!(rule = rule.code(), pass = loop_idx, "fixes applied");
                tree = new_tree;
                changed = true;
            }
            if fix && !changed {
                converged = true;
                break;
            }
        }

        if !converged {
            tracing::warn!(limit = loop_limit, "loop limit on fixes reached, discarding fixes");
            warnings
                .report(DiagnosticKind::LoopLimitReached, 0..0)
                .message(format!("{loop_limit} passes"))
                .emit();
            tree = original;
            for violation in &mut violations {
                violation.fixes.clear();
            }
        }

        FixOutcome {
            tree,
            violations,
            warnings,
        }
    }

    fn to_violations(&self, rule: &dyn Rule, results: &[LintResult]) -> Vec<Violation> {
        results
            .iter()
            .filter_map(|result| {
                let anchor = result.anchor.as_ref()?;
                if !rule.targets_templated() && !anchor.marker().is_literal() {
                    tracing::debug!(rule = rule.code(), anchor = ?anchor, "finding in templated code dropped");
                    return None;
                }
                let description = result.description.as_deref().unwrap_or(rule.description());
                Some(
                    Violation::at_marker(
                        ViolationKind::Lint,
                        rule.code(),
                        rule.name(),
                        description,
                        anchor.marker(),
                    )
                    .with_anchor(anchor.clone())
                    .with_fixes(result.fixes.clone()),
                )
            })
            .collect()
    }

    /// Lint a single file from disk, optionally writing fixes back.
    pub fn lint_path(&self, path: &Path, fix: bool, apply: bool) -> Result<LintedFile> {
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        let decoded = decode(&bytes, &self.config.encoding).ok_or_else(|| UserError::Undecodable {
            path: path.display().to_string(),
            encoding: self.config.encoding.clone(),
        })?;
        let mut linted = self.lint_string(&decoded.text, Some(&path.display().to_string()), fix);
        linted.encoding = decoded.encoding.to_string();
        if fix && apply {
            linted.persist_tree()?;
        }
        Ok(linted)
    }

    /// Lint files and directories. Directories are searched recursively
    /// for files ending in one of `sql_file_exts`; globs are expanded.
    pub fn lint_paths<P: AsRef<Path>>(&self, paths: &[P], fix: bool, apply: bool) -> Result<LintingResult> {
        let files = self.discover(paths)?;
        tracing::info!(files = files.len(), "linting paths");
        let mut linted = Vec::with_capacity(files.len());
        for path in files {
            linted.push(self.lint_path(&path, fix, apply)?);
        }
        Ok(LintingResult::new(linted))
    }

    fn discover<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<PathBuf>> {
        let mut found: Vec<PathBuf> = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let text = path.to_string_lossy();
            if text.contains(['*', '?', '[']) && !path.exists() {
                let entries = glob::glob(&text).map_err(|e| UserError::InvalidConfig {
                    key: "path".to_string(),
                    reason: e.to_string(),
                })?;
                for entry in entries.flatten() {
                    self.collect(&entry, &mut found)?;
                }
                continue;
            }
            if !path.exists() {
                return Err(UserError::PathNotFound(path.display().to_string()).into());
            }
            self.collect(path, &mut found)?;
        }
        let mut seen = HashSet::new();
        found.retain(|p| seen.insert(p.clone()));
        Ok(found)
    }

    fn collect(&self, path: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
        if path.is_file() {
            found.push(path.to_path_buf());
            return Ok(());
        }
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let at = e.path().unwrap_or(path).to_path_buf();
                Error::io(at, e.into())
            })?;
            if entry.file_type().is_file() && self.has_sql_ext(entry.path()) {
                files.push(entry.into_path());
            }
        }
        found.extend(files);
        Ok(())
    }

    fn has_sql_ext(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.config
            .sql_file_exts
            .iter()
            .any(|ext| name.ends_with(&ext.to_lowercase()))
    }
}

fn critical(rule: &dyn Rule, msg: &str, tree: &Segment) -> Violation {
    Violation::at_marker(
        ViolationKind::Critical,
        "CRITICAL",
        rule.name(),
        format!("Unexpected exception in {}: {msg}. Rule skipped.", rule.code()),
        &tree.marker().start_point_marker(),
    )
}

/// Drop every fix of a result if any of them would edit template code.
fn discard_unsafe_fixes(rule: &dyn Rule, results: &mut [LintResult], file: &TemplatedFile) {
    for result in results {
        if result.fixes.iter().any(|f| f.has_template_conflicts(file)) {
            tracing::info!(rule = rule.code(), "fixes touching templated code discarded");
            result.fixes.clear();
        }
    }
}

/// The root keeps whatever non-code its children pushed out.
fn rebuild_root(applied: Applied) -> Segment {
    if applied.before.is_empty() && applied.after.is_empty() {
        return applied.segment;
    }
    let mut children = applied.before;
    children.extend(applied.segment.children().iter().cloned());
    children.extend(applied.after);
    applied.segment.with_children(children)
}

/// Checksum of the text and source fixes of a tree.
fn fingerprint(tree: &Segment) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(tree.raw().as_bytes());
    for fix in tree.all_source_fixes() {
        hasher.update(fix.edit.as_bytes());
        hasher.update(&fix.source_slice.start.to_le_bytes());
        hasher.update(&fix.source_slice.end.to_le_bytes());
    }
    hasher.finalize()
}
