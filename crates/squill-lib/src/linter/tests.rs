use indoc::indoc;

use crate::diagnostics::DiagnosticKind;
use crate::{Error, UserError};

use super::*;

/// Flags lowercase keywords and upper-cases them.
pub(super) struct UpperKeywords;

impl Rule for UpperKeywords {
    fn code(&self) -> &'static str {
        "T001"
    }

    fn name(&self) -> &'static str {
        "test.keywords"
    }

    fn description(&self) -> &'static str {
        "Keywords must be upper case."
    }

    fn groups(&self) -> &'static [&'static str] {
        &["all", "test"]
    }

    fn crawl_behaviour(&self) -> CrawlBehaviour {
        CrawlBehaviour::seeker(&["keyword"])
    }

    fn eval(&self, context: &RuleContext<'_>) -> Vec<LintResult> {
        let segment = context.segment;
        if segment.raw() == segment.raw_upper() {
            return Vec::new();
        }
        let fixed = segment.edit(segment.raw_upper());
        vec![LintResult::new(segment).with_fix(LintFix::edit(segment, fixed))]
    }
}

/// Renames `col_x` to `col_y`, optionally inside templated code.
struct RenameColumn {
    templated: bool,
}

impl Rule for RenameColumn {
    fn code(&self) -> &'static str {
        "T002"
    }

    fn name(&self) -> &'static str {
        "test.rename"
    }

    fn description(&self) -> &'static str {
        "Use col_y."
    }

    fn crawl_behaviour(&self) -> CrawlBehaviour {
        CrawlBehaviour::seeker(&["identifier"])
    }

    fn targets_templated(&self) -> bool {
        self.templated
    }

    fn eval(&self, context: &RuleContext<'_>) -> Vec<LintResult> {
        let segment = context.segment;
        if segment.raw() != "col_x" {
            return Vec::new();
        }
        vec![LintResult::new(segment).with_fix(LintFix::edit(segment, segment.edit("col_y")))]
    }
}

struct Panics;

impl Rule for Panics {
    fn code(&self) -> &'static str {
        "T003"
    }

    fn name(&self) -> &'static str {
        "test.panics"
    }

    fn description(&self) -> &'static str {
        "Always panics."
    }

    fn crawl_behaviour(&self) -> CrawlBehaviour {
        CrawlBehaviour::RootOnly
    }

    fn eval(&self, _context: &RuleContext<'_>) -> Vec<LintResult> {
        panic!("boom")
    }
}

/// Appends a space after the last leaf on every pass.
struct Grows;

impl Rule for Grows {
    fn code(&self) -> &'static str {
        "T004"
    }

    fn name(&self) -> &'static str {
        "test.grows"
    }

    fn description(&self) -> &'static str {
        "Never satisfied."
    }

    fn crawl_behaviour(&self) -> CrawlBehaviour {
        CrawlBehaviour::RootOnly
    }

    fn eval(&self, context: &RuleContext<'_>) -> Vec<LintResult> {
        let Some(last) = context
            .segment
            .raw_segments()
            .into_iter()
            .rev()
            .find(|s| !s.is_meta())
        else {
            return Vec::new();
        };
        let space = Segment::whitespace(" ", last.marker().end_point_marker());
        vec![LintResult::new(&last).with_fix(LintFix::create_after(&last, vec![space]))]
    }
}

pub(super) fn linter(config: LinterConfig, rules: Vec<Box<dyn Rule>>) -> Linter {
    Linter::new(config, rules).unwrap()
}

pub(super) fn upper() -> Vec<Box<dyn Rule>> {
    vec![Box::new(UpperKeywords)]
}

fn positions(linted: &LintedFile) -> Vec<(String, usize, usize)> {
    linted
        .violations
        .iter()
        .map(|v| (v.code.clone(), v.line_no, v.line_pos))
        .collect()
}

#[test]
fn no_rules_means_clean() {
    let linted = linter(LinterConfig::default(), Vec::new()).lint_string("SELECT a FROM t\n", None, false);
    assert!(linted.is_clean());
    assert_eq!(linted.path, STRING_INPUT);
    assert_eq!(linted.tree.as_ref().map(Segment::raw), Some("SELECT a FROM t\n"));
}

#[test]
fn keyword_case_is_reported_and_fixed() {
    let linter = linter(LinterConfig::default(), upper());
    let linted = linter.lint_string("select 1", None, true);
    assert_eq!(positions(&linted), vec![("T001".to_string(), 1, 1)]);
    assert!(linted.violations[0].is_fixable());
    assert_eq!(linted.fix_string(), ("SELECT 1".to_string(), true));
}

#[test]
fn linting_without_fix_leaves_source() {
    let linter = linter(LinterConfig::default(), upper());
    let linted = linter.lint_string("select a from t", None, false);
    assert_eq!(
        positions(&linted),
        vec![("T001".to_string(), 1, 1), ("T001".to_string(), 1, 10)]
    );
    assert_eq!(linted.fix_string(), ("select a from t".to_string(), true));
}

#[test]
fn fixes_span_lines() {
    let sql = indoc! {"
        select a
        from t
        where b = 1
    "};
    let linted = linter(LinterConfig::default(), upper()).lint_string(sql, Some("q.sql"), true);
    assert_eq!(linted.num_violations(), 3);
    assert_eq!(linted.fix_string().0, "SELECT a\nFROM t\nWHERE b = 1\n");
}

#[test]
fn templated_fix_patches_placeholder() {
    let config = LinterConfig::default()
        .with_templater("placeholder")
        .with_placeholder_style("brace")
        .with_template_value("a", "col_x");
    let linter = linter(config, vec![Box::new(RenameColumn { templated: true })]);
    let linted = linter.lint_string("SELECT {{ a }} FROM t", None, true);

    assert_eq!(linted.num_violations(), 1);
    let patches = linted.patches();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].source_slice, 7..14);
    assert_eq!(patches[0].fixed_raw, "col_y");
    assert_eq!(patches[0].patch_category, PatchCategory::Templated);
    assert_eq!(linted.fix_string().0, "SELECT col_y FROM t");
}

#[test]
fn findings_in_templated_code_are_dropped() {
    let config = LinterConfig::default()
        .with_templater("placeholder")
        .with_placeholder_style("brace")
        .with_template_value("a", "col_x");
    let linter = linter(config, vec![Box::new(RenameColumn { templated: false })]);
    let linted = linter.lint_string("SELECT {{ a }}, col_x FROM t", None, false);
    assert_eq!(positions(&linted), vec![("T002".to_string(), 1, 17)]);
}

fn spliced(value: &str) -> LinterConfig {
    LinterConfig::default()
        .with_templater("placeholder")
        .with_placeholder_style("brace")
        .with_template_value("a", value)
}

#[test]
fn template_conflicts_by_edit_type() {
    let parsed = linter(spliced("x ,y"), Vec::new()).parse_string("select {{ a }} ,b", None);
    let file = parsed.templated_file.unwrap();
    assert_eq!(file.templated_str(), "select x ,y ,b");
    let leaves = parsed.tree.unwrap().raw_segments();
    let at = |start: usize| {
        leaves
            .iter()
            .find(|s| !s.is_meta() && s.marker().templated_slice().start == start)
            .cloned()
            .unwrap()
    };
    let space = |after: &Segment| Segment::whitespace(" ", after.marker().end_point_marker());

    // Inside the expression output.
    assert!(LintFix::delete(&at(8)).has_template_conflicts(&file));
    assert!(LintFix::create_after(&at(9), vec![space(&at(9))]).has_template_conflicts(&file));

    // On its edges, or in literal text.
    assert!(!LintFix::create_before(&at(7), vec![space(&at(6))]).has_template_conflicts(&file));
    assert!(!LintFix::delete(&at(11)).has_template_conflicts(&file));
    assert!(!LintFix::create_after(&at(12), vec![space(&at(12))]).has_template_conflicts(&file));
    assert!(!LintFix::create_after(&at(13), vec![space(&at(13))]).has_template_conflicts(&file));

    // Text taken from template output.
    let moved = LintFix::delete(&at(11)).with_source(vec![at(7)]);
    assert!(moved.has_template_conflicts(&file));
}

#[test]
fn fixes_inside_template_output_are_not_applied() {
    let config = LinterConfig::default()
        .with_templater("placeholder")
        .with_placeholder_style("brace")
        .with_template_value("rest", "from t");
    let linted = linter(config, upper()).lint_string("select a {{ rest }}", None, true);

    assert_eq!(positions(&linted), vec![("T001".to_string(), 1, 1)]);
    assert!(linted.patches().iter().all(|p| p.source_slice == (0..6)));
    assert!(linted.warnings.is_empty());
    assert_eq!(linted.fix_string().0, "SELECT a {{ rest }}");
}

#[test]
fn panicking_rule_becomes_critical() {
    let linter = linter(
        LinterConfig::default(),
        vec![Box::new(Panics), Box::new(UpperKeywords)],
    );
    let linted = linter.lint_string("select 1", None, false);
    let codes: Vec<_> = linted.violations.iter().map(|v| v.code.as_str()).collect();
    assert_eq!(codes, vec!["CRITICAL", "T001"]);
    assert!(linted.violations[0].description.contains("boom"));
}

#[test]
fn runaway_fixes_are_discarded() {
    let config = LinterConfig::default().with_runaway_limit(3);
    let linted = linter(config, vec![Box::new(Grows)]).lint_string("select 1", None, true);
    assert!(
        linted
            .warnings
            .iter()
            .any(|w| w.kind() == DiagnosticKind::LoopLimitReached)
    );
    assert_eq!(linted.fix_string().0, "select 1");
    assert_eq!(linted.num_violations(), 1);
    assert!(!linted.violations[0].is_fixable());
    assert!(linted.record().violations[0].fixes.is_empty());
    let fixable = ViolationFilter {
        fixable: Some(true),
        ..ViolationFilter::default()
    };
    assert!(linted.get_violations(&fixable).is_empty());
}

#[test]
fn loop_limit_of_one_discards_interacting_fixes() {
    let config = LinterConfig::default().with_runaway_limit(1);
    let rules: Vec<Box<dyn Rule>> = vec![Box::new(UpperKeywords), Box::new(Grows)];
    let linted = linter(config, rules).lint_string("select 1", None, true);
    assert_eq!(linted.num_violations(), 2);
    assert!(linted.violations.iter().all(|v| !v.is_fixable()));
    assert_eq!(linted.fix_string().0, "select 1");
}

#[test]
fn parse_errors_block_fixing() {
    let linter = linter(LinterConfig::default(), upper());
    let linted = linter.lint_string("select * from", None, true);
    assert!(linted.has_parse_errors());
    assert!(linted.violations.iter().any(|v| v.code == "PRS" && v.line_no == 1));
    assert_eq!(linted.fix_string().0, "select * from");
}

#[test]
fn parse_errors_can_be_ignored() {
    let config = LinterConfig::default().with_ignore(["parsing"]);
    let linted = linter(config, Vec::new()).lint_string("SELECT * FROM", None, false);
    assert!(linted.is_clean());
}

#[test]
fn fix_even_unparsable_applies_fixes() {
    let config = LinterConfig::default().with_fix_even_unparsable(true);
    let linted = linter(config, upper()).lint_string("select 1;\nselect * from", None, true);
    assert!(linted.has_parse_errors());
    assert!(linted.fix_string().0.starts_with("SELECT 1;"));
}

#[test]
fn rule_selection_by_code_group_and_glob() {
    let all = || -> Vec<Box<dyn Rule>> {
        vec![
            Box::new(UpperKeywords),
            Box::new(RenameColumn { templated: false }),
            Box::new(Panics),
        ]
    };
    let codes = |config: LinterConfig| linter(config, all()).rule_codes();

    assert_eq!(codes(LinterConfig::default()), vec!["T001", "T002", "T003"]);
    assert_eq!(codes(LinterConfig::default().with_rules(["test"])), vec!["T001"]);
    assert_eq!(
        codes(LinterConfig::default().with_rules(["test.re*", "T003"])),
        vec!["T002", "T003"]
    );
    assert_eq!(
        codes(
            LinterConfig::default()
                .with_rules(["T00*"])
                .with_exclude_rules(["T002"])
        ),
        vec!["T001", "T003"]
    );
    assert!(
        codes(
            LinterConfig::default()
                .with_rules(["T001"])
                .with_exclude_rules(["test.keywords"])
        )
        .is_empty()
    );
}

#[test]
fn unknown_dialect_is_a_user_error() {
    let err = Linter::new(LinterConfig::default().with_dialect("oracle"), Vec::new())
        .err()
        .unwrap();
    assert!(matches!(err, Error::User(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn config_from_json() {
    let config = LinterConfig::from_json(r#"{"dialect": "postgres", "rules": ["L010"]}"#).unwrap();
    assert_eq!(config.dialect, "postgres");
    assert_eq!(config.rules, vec!["L010"]);
    assert_eq!(config.runaway_limit, 10);

    let err = LinterConfig::from_json(r#"{"dialekt": "ansi"}"#).unwrap_err();
    assert!(matches!(err, Error::User(UserError::InvalidConfig { .. })));

    let err = LinterConfig::from_json(r#"{"runaway_limit": 0}"#).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"invalid value for `runaway_limit`: must be at least 1");

    let err = LinterConfig::from_json(r#"{"ignore": ["typos"]}"#).unwrap_err();
    assert!(matches!(err, Error::User(UserError::InvalidConfig { key, .. }) if key == "ignore"));
}

#[test]
fn records_serialise() {
    let linted = linter(LinterConfig::default(), upper()).lint_string("select 1", Some("a.sql"), false);
    let result = LintingResult::new(vec![linted]);
    assert_eq!(result.exit_code(), 1);
    assert_eq!(
        result.stats(),
        LintingStats {
            files: 1,
            clean: 0,
            unclean: 1,
            violations: 1
        }
    );
    let json = result.to_json().unwrap();
    assert!(json.contains("\"filepath\": \"a.sql\""));
    assert!(json.contains("\"T001\""));
}

#[test]
fn decode_handles_bom_and_latin1() {
    let decoded = decode(b"\xEF\xBB\xBFselect 1", "autodetect").unwrap();
    assert_eq!(decoded, Decoded { text: "select 1".to_string(), encoding: "utf-8" });

    let decoded = decode(b"select '\xE9'", "autodetect").unwrap();
    assert_eq!(decoded.text, "select '\u{e9}'");
    assert_eq!(decoded.encoding, "latin-1");

    assert!(decode(b"select '\xE9'", "utf-8").is_none());
    assert!(decode(b"\xE9", "ascii").is_none());
    assert_eq!(encode("'\u{e9}'", "latin-1").unwrap(), b"'\xE9'".to_vec());
    assert!(encode("\u{263a}", "latin-1").is_err());
}

#[test]
fn lint_paths_walks_directories() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.sql"), "select 1\n").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "select 1\n").unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("sub").join("b.SQL"), "SELECT 1\n").unwrap();

    let linter = linter(LinterConfig::default(), upper());
    let result = linter.lint_paths(&[dir.path()], false, false).unwrap();
    assert_eq!(result.files.len(), 2);
    assert_eq!(result.num_violations(), 1);
    assert_eq!(result.exit_code(), 1);
}

#[test]
fn lint_paths_applies_fixes_in_original_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("q.sql");
    std::fs::write(&path, b"select '\xE9'\n").unwrap();

    let linter = linter(LinterConfig::default(), upper());
    let result = linter.lint_paths(&[&path], true, true).unwrap();
    assert_eq!(result.files[0].encoding, "latin-1");
    assert_eq!(std::fs::read(&path).unwrap(), b"SELECT '\xE9'\n".to_vec());

    let result = linter.lint_paths(&[&path], false, false).unwrap();
    assert_eq!(result.exit_code(), 0);
}

#[test]
fn lint_paths_expands_globs() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.sql"), "SELECT 1\n").unwrap();
    std::fs::write(dir.path().join("b.sql"), "SELECT 2\n").unwrap();
    let pattern = dir.path().join("*.sql");

    let result = linter(LinterConfig::default(), upper())
        .lint_paths(&[pattern], false, false)
        .unwrap();
    assert_eq!(result.files.len(), 2);
    assert_eq!(result.exit_code(), 0);
}

#[test]
fn missing_path_is_a_user_error() {
    let linter = linter(LinterConfig::default(), upper());
    let err = linter
        .lint_paths(&["/definitely/not/here.sql"], false, false)
        .unwrap_err();
    assert!(matches!(err, Error::User(UserError::PathNotFound(_))));
    assert_eq!(err.exit_code(), 2);
}
