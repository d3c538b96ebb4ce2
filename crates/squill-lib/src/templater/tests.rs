use indexmap::IndexMap;
use squill_core::SliceType;

use super::*;

fn context(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn render(style: PlaceholderStyle, pairs: &[(&str, &str)], source: &str) -> TemplatedFile {
    PlaceholderTemplater::new(style, context(pairs))
        .unwrap()
        .process(source, "test.sql")
        .unwrap()
}

#[test]
fn raw_templater_is_identity() {
    let file = RawTemplater.process("select 1\n", "a.sql").unwrap();
    assert_eq!(file.templated_str(), "select 1\n");
    assert_eq!(file.fname(), "a.sql");
    assert!(!file.is_templated());
}

#[test]
fn brace_placeholder_maps_back_to_source() {
    let file = render(
        PlaceholderStyle::Brace,
        &[("a", "col_x")],
        "SELECT {{ a }} FROM t",
    );
    assert_eq!(file.templated_str(), "SELECT col_x FROM t");

    let templated: Vec<_> = file
        .sliced_file()
        .iter()
        .map(|s| (s.slice_type, s.source_slice.clone(), s.templated_slice.clone()))
        .collect();
    assert_eq!(
        templated,
        vec![
            (SliceType::Literal, 0..7, 0..7),
            (SliceType::Templated, 7..14, 7..12),
            (SliceType::Literal, 14..21, 12..19),
        ]
    );
    assert_eq!(file.templated_slice_to_source_slice(7..12), 7..14);
}

#[test]
fn unknown_names_render_as_themselves() {
    let file = render(PlaceholderStyle::Dollar, &[], "SELECT ${col} FROM $tbl");
    assert_eq!(file.templated_str(), "SELECT col FROM tbl");
}

#[test]
fn pyformat_uses_context() {
    let file = render(
        PlaceholderStyle::Pyformat,
        &[("id", "42")],
        "SELECT * FROM t WHERE id = %(id)s",
    );
    assert_eq!(file.templated_str(), "SELECT * FROM t WHERE id = 42");
}

#[test]
fn question_marks_are_numbered() {
    let file = render(
        PlaceholderStyle::QuestionMark,
        &[("1", "'a'")],
        "SELECT * FROM t WHERE a = ? AND b = ?",
    );
    assert_eq!(
        file.templated_str(),
        "SELECT * FROM t WHERE a = 'a' AND b = 2"
    );
}

#[test]
fn colon_skips_casts() {
    let file = render(
        PlaceholderStyle::Colon,
        &[("name", "'x'")],
        "SELECT a::int FROM t WHERE b = :name",
    );
    assert_eq!(file.templated_str(), "SELECT a::int FROM t WHERE b = 'x'");
}

#[test]
fn selector_requires_known_style() {
    let config = LinterConfig {
        templater: "placeholder".to_string(),
        placeholder_style: Some("curly".to_string()),
        ..LinterConfig::default()
    };
    let err = templater_selector(&config).err().unwrap();
    insta::assert_snapshot!(err.to_string(), @"invalid value for `placeholder_style`: unknown style `curly`, expected one of: colon, numeric_colon, pyformat, dollar, numeric_dollar, question_mark, percent, brace");

    let config = LinterConfig {
        templater: "jinja".to_string(),
        ..LinterConfig::default()
    };
    let err = templater_selector(&config).err().unwrap();
    insta::assert_snapshot!(err.to_string(), @"unknown templater `jinja`");
}

#[test]
fn selector_adds_default_context() {
    let config = LinterConfig {
        templater: "placeholder".to_string(),
        placeholder_style: Some("colon".to_string()),
        ..LinterConfig::default()
    };
    let templater = templater_selector(&config).unwrap();
    assert_eq!(templater.name(), "placeholder");
    let file = templater.process("SELECT :test_value", "x.sql").unwrap();
    assert_eq!(file.templated_str(), "SELECT __test__");
}
