use std::collections::{BTreeMap, BTreeSet};

use indoc::indoc;

use super::tests::{linter, upper};
use super::*;

fn map() -> BTreeMap<String, BTreeSet<String>> {
    let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (key, code) in [
        ("L001", "L001"),
        ("L010", "L010"),
        ("capitalisation.keywords", "L010"),
        ("layout", "L001"),
    ] {
        map.entry(key.to_string()).or_default().insert(code.to_string());
    }
    map
}

fn codes(rules: &[&str]) -> Option<BTreeSet<String>> {
    Some(rules.iter().map(|r| r.to_string()).collect())
}

fn violation(code: &str, line_no: usize) -> Violation {
    Violation::at_position(ViolationKind::Lint, code, "test", "test", line_no, 1)
}

fn lines(violations: &[Violation]) -> Vec<(usize, &str)> {
    violations.iter().map(|v| (v.line_no, v.code.as_str())).collect()
}

#[test]
fn parse_plain_and_listed() {
    let d = NoQaDirective::parse("-- noqa", 3, 10, &map()).unwrap().unwrap();
    assert_eq!((d.line_no, d.line_pos, d.rules, d.action), (3, 10, None, None));

    let d = NoQaDirective::parse("--noqa: L010, L001", 1, 1, &map()).unwrap().unwrap();
    assert_eq!(d.rules, codes(&["L001", "L010"]));
    assert_eq!(d.raw_str, "noqa: L010, L001");
}

#[test]
fn parse_expands_names_groups_and_globs() {
    let d = NoQaDirective::parse("-- noqa: capitalisation.keywords", 1, 1, &map())
        .unwrap()
        .unwrap();
    assert_eq!(d.rules, codes(&["L010"]));

    let d = NoQaDirective::parse("-- noqa: L0*", 1, 1, &map()).unwrap().unwrap();
    assert_eq!(d.rules, codes(&["L001", "L010"]));

    let d = NoQaDirective::parse("-- noqa: PRS", 1, 1, &map()).unwrap().unwrap();
    assert_eq!(d.rules, codes(&["PRS"]));
}

#[test]
fn parse_ranges() {
    let d = NoQaDirective::parse("-- noqa: disable=all", 1, 1, &map()).unwrap().unwrap();
    assert_eq!((d.rules, d.action), (None, Some(NoQaAction::Disable)));

    let d = NoQaDirective::parse("-- noqa:enable=layout", 1, 1, &map()).unwrap().unwrap();
    assert_eq!((d.rules, d.action), (codes(&["L001"]), Some(NoQaAction::Enable)));
}

#[test]
fn parse_rejects_malformed() {
    assert!(NoQaDirective::parse("-- noqa L010", 1, 1, &map()).is_err());
    assert!(NoQaDirective::parse("-- noqa: toggle=L010", 1, 1, &map()).is_err());
    assert!(NoQaDirective::parse("-- noqa: disable", 1, 1, &map()).is_err());
    assert_eq!(NoQaDirective::parse("-- nothing to see", 1, 1, &map()), Ok(None));
}

#[test]
fn single_line_directives() {
    let directives = vec![
        NoQaDirective::parse("-- noqa: L010", 1, 20, &map()).unwrap().unwrap(),
        NoQaDirective::parse("-- noqa", 3, 20, &map()).unwrap().unwrap(),
    ];
    let mut mask = IgnoreMask::new(directives);
    let kept = mask.ignore_masked_violations(vec![
        violation("L010", 1),
        violation("L001", 1),
        violation("L010", 2),
        violation("L001", 3),
    ]);
    assert_eq!(lines(&kept), vec![(1, "L001"), (2, "L010")]);
    assert!(mask.directives().iter().all(|d| d.used));
    assert!(mask.unused_warnings().is_empty());
}

#[test]
fn ranges_open_and_close() {
    let directives = vec![
        NoQaDirective::parse("-- noqa: disable=L010", 2, 1, &map()).unwrap().unwrap(),
        NoQaDirective::parse("-- noqa: enable=L010", 4, 1, &map()).unwrap().unwrap(),
    ];
    let mut mask = IgnoreMask::new(directives);
    let all: Vec<_> = (1..=5).map(|line| violation("L010", line)).collect();
    let kept = mask.ignore_masked_violations(all);
    assert_eq!(lines(&kept), vec![(1, "L010"), (4, "L010"), (5, "L010")]);

    // A second application changes nothing.
    let again = mask.ignore_masked_violations(kept.clone());
    assert_eq!(lines(&again), lines(&kept));
}

#[test]
fn range_only_covers_its_rules() {
    let directives = vec![NoQaDirective::parse("-- noqa: disable=L001", 1, 1, &map()).unwrap().unwrap()];
    let mut mask = IgnoreMask::new(directives);
    let kept = mask.ignore_masked_violations(vec![violation("L001", 2), violation("L010", 2)]);
    assert_eq!(lines(&kept), vec![(2, "L010")]);
}

#[test]
fn unused_directives_are_reported() {
    let directives = vec![NoQaDirective::parse("-- noqa: L001", 4, 12, &map()).unwrap().unwrap()];
    let mut mask = IgnoreMask::new(directives);
    let kept = mask.ignore_masked_violations(vec![violation("L010", 4)]);
    assert_eq!(kept.len(), 1);

    let warnings = mask.unused_warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].warning);
    assert_eq!((warnings[0].line_no, warnings[0].line_pos), (4, 12));
    assert_eq!(warnings[0].description, "Unused noqa: 'noqa: L001'");
}

#[test]
fn inline_directive_silences_its_line() {
    let linted = linter(LinterConfig::default(), upper())
        .lint_string("select A, b --noqa: T001\nfrom t;", None, false);
    let found: Vec<_> = linted.violations.iter().map(|v| (v.line_no, v.line_pos)).collect();
    assert_eq!(found, vec![(2, 1)]);
}

#[test]
fn disabled_range_silences_lines() {
    let sql = indoc! {"
        select 1;
        -- noqa: disable=all
        select 2;
        -- noqa: enable=all
        select 3;
    "};
    let linted = linter(LinterConfig::default(), upper()).lint_string(sql, None, false);
    let found: Vec<_> = linted.violations.iter().map(|v| v.line_no).collect();
    assert_eq!(found, vec![1, 5]);
}

#[test]
fn noqa_can_be_disabled() {
    let config = LinterConfig::default().with_disable_noqa(true);
    let linted = linter(config, upper()).lint_string("select 1 -- noqa\n", None, false);
    assert_eq!(linted.num_violations(), 1);
}

#[test]
fn malformed_directive_is_a_violation() {
    let linted = linter(LinterConfig::default(), Vec::new()).lint_string("SELECT 1 -- noqa L010\n", None, false);
    assert_eq!(linted.violations.len(), 1);
    assert_eq!(linted.violations[0].code, "NOQA");
    assert_eq!(linted.violations[0].line_pos, 10);
}

#[test]
fn unused_warning_through_linter() {
    let config = LinterConfig::default().with_warn_unused_ignores(true);
    let linted = linter(config, upper()).lint_string("SELECT 1 -- noqa: T001\n", None, false);
    assert!(linted.is_clean());
    assert_eq!(linted.violations.len(), 1);
    assert!(linted.violations[0].warning);
}
