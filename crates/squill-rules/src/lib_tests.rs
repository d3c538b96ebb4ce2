use indoc::indoc;
use squill_lib::{LintedFile, Linter, LinterConfig};

use super::standard_rules;

fn lint(config: LinterConfig, sql: &str, fix: bool) -> LintedFile {
    Linter::new(config, standard_rules()).unwrap().lint_string(sql, None, fix)
}

fn only(rules: &[&str]) -> LinterConfig {
    LinterConfig::default().with_rules(rules.iter().copied())
}

fn found(linted: &LintedFile) -> Vec<(&str, usize, usize)> {
    linted
        .violations
        .iter()
        .map(|v| (v.code.as_str(), v.line_no, v.line_pos))
        .collect()
}

#[test]
fn rules_run_in_code_order() {
    let linter = Linter::new(LinterConfig::default(), standard_rules()).unwrap();
    assert_eq!(linter.rule_codes(), vec!["L001", "L005", "L009", "L010"]);

    let linter = Linter::new(only(&["layout"]), standard_rules()).unwrap();
    assert_eq!(linter.rule_codes(), vec!["L001", "L005", "L009"]);

    let linter = Linter::new(only(&["CP01"]), standard_rules()).unwrap();
    assert_eq!(linter.rule_codes(), vec!["L010"]);
}

#[test]
fn comma_fix() {
    let linted = lint(only(&["L005"]), "SELECT a ,b FROM t", true);
    assert_eq!(found(&linted), vec![("L005", 1, 10)]);
    assert_eq!(linted.fix_string().0, "SELECT a, b FROM t");
}

#[test]
fn leading_commas_keep_indentation() {
    let sql = indoc! {"
        SELECT
            a
            , b
        FROM t
    "};
    let linted = lint(only(&["L005"]), sql, false);
    assert!(linted.is_clean());
}

#[test]
fn keyword_case_fix() {
    let linted = lint(only(&["L010"]), "select 1", true);
    assert_eq!(found(&linted), vec![("L010", 1, 1)]);
    insta::assert_snapshot!(linted.violations[0].message(), @"L010: Keywords must be upper case. Found 'select'.");
    assert_eq!(linted.fix_string().0, "SELECT 1");
}

#[test]
fn noqa_single_line() {
    let sql = "select A, b --noqa: L010\nfrom t;";
    let linted = lint(only(&["L010"]), sql, false);
    assert_eq!(found(&linted), vec![("L010", 2, 1)]);
}

#[test]
fn noqa_range() {
    let sql = indoc! {"
        -- noqa: disable=L010
        select 1;
        select 2;
        -- noqa: enable=L010
        select 3;
    "};
    let linted = lint(only(&["L010"]), sql, false);
    assert_eq!(found(&linted), vec![("L010", 5, 1)]);
}

#[test]
fn noqa_by_name() {
    let linted = lint(only(&["L010"]), "select 1 -- noqa: capitalisation.*\n", false);
    assert!(linted.is_clean());
}

#[test]
fn templated_edit_patches_placeholder() {
    let config = only(&["L010"])
        .with_templater("placeholder")
        .with_placeholder_style("brace")
        .with_template_value("a", "col_x");
    let linted = lint(config, "select {{ a }} from t", true);
    assert_eq!(found(&linted), vec![("L010", 1, 1), ("L010", 1, 16)]);
    assert_eq!(linted.fix_string().0, "SELECT {{ a }} FROM t");
}

#[test]
fn commas_inside_template_output_are_left_alone() {
    let config = || {
        LinterConfig::default()
            .with_templater("placeholder")
            .with_placeholder_style("brace")
            .with_template_value("a", "x ,y")
    };

    let linted = lint(config(), "select {{ a }} from t", true);
    assert_eq!(linted.fix_string().0, "SELECT {{ a }} FROM t\n");
    assert!(linted.warnings.is_empty());

    let linted = lint(config(), "select {{ a }} ,b  \nfrom t", true);
    assert_eq!(linted.fix_string().0, "SELECT {{ a }}, b\nFROM t\n");
}

#[test]
fn unparsable_passthrough() {
    let linted = lint(LinterConfig::default(), "SELECT * FROM", false);
    let parse: Vec<_> = linted.violations.iter().filter(|v| v.code == "PRS").collect();
    assert_eq!(parse.len(), 1);
    assert_eq!((parse[0].line_no, parse[0].line_pos), (1, 14));
    assert!(parse[0].description.contains("Found nothing"), "{}", parse[0].description);
    assert_eq!(linted.tree.as_ref().map(|t| t.raw()), Some("SELECT * FROM"));
}

#[test]
fn trailing_whitespace() {
    let linted = lint(only(&["L001"]), "SELECT a  \nFROM t \n", true);
    assert_eq!(found(&linted), vec![("L001", 1, 9), ("L001", 2, 7)]);
    assert_eq!(linted.fix_string().0, "SELECT a\nFROM t\n");
}

#[test]
fn end_of_file_newline() {
    let linted = lint(only(&["L009"]), "SELECT 1", true);
    assert_eq!(found(&linted), vec![("L009", 1, 8)]);
    assert_eq!(linted.fix_string().0, "SELECT 1\n");

    let linted = lint(only(&["L009"]), "SELECT 1\n\n\n", true);
    assert_eq!(linted.num_violations(), 1);
    assert_eq!(linted.fix_string().0, "SELECT 1\n");

    assert!(lint(only(&["L009"]), "SELECT 1\n", false).is_clean());
    assert!(lint(only(&["L009"]), "", false).is_clean());
}

#[test]
fn all_rules_together() {
    let sql = "select a ,b  \nfrom t";
    let linted = lint(LinterConfig::default(), sql, true);
    assert_eq!(linted.fix_string().0, "SELECT a, b\nFROM t\n");
    assert!(lint(LinterConfig::default(), &linted.fix_string().0, false).is_clean());
}

#[test]
fn exclusion_wins() {
    let config = LinterConfig::default()
        .with_rules(["core"])
        .with_exclude_rules(["L0*"]);
    assert!(lint(config, "select 1", false).is_clean());
}
