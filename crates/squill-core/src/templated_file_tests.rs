use crate::{RawSlice, SliceType, TemplateError, TemplatedFile, TemplatedSlice};

/// `SELECT {{ a }} FROM t` rendered as `SELECT col_x FROM t`.
fn templated_select() -> TemplatedFile {
    TemplatedFile::new(
        "SELECT {{ a }} FROM t",
        "test.sql",
        Some("SELECT col_x FROM t".to_string()),
        Some(vec![
            TemplatedSlice::new(SliceType::Literal, 0..7, 0..7),
            TemplatedSlice::new(SliceType::Templated, 7..14, 7..12),
            TemplatedSlice::new(SliceType::Literal, 14..21, 12..19),
        ]),
        Some(vec![
            RawSlice::new("SELECT ", SliceType::Literal, 0),
            RawSlice::new("{{ a }}", SliceType::Templated, 7),
            RawSlice::new(" FROM t", SliceType::Literal, 14),
        ]),
    )
    .unwrap()
}

#[test]
fn from_string_is_one_literal_slice() {
    let file = TemplatedFile::from_string("select 1\n");

    assert_eq!(file.source_str(), "select 1\n");
    assert_eq!(file.templated_str(), "select 1\n");
    assert_eq!(file.sliced_file().len(), 1);
    assert_eq!(file.raw_sliced().len(), 1);
    assert!(!file.is_templated());
    assert_eq!(file.fname(), "<string>");
}

#[test]
fn new_without_slices_requires_identical_output() {
    let err = TemplatedFile::new("a", "f.sql", Some("b".to_string()), None, None).unwrap_err();
    assert_eq!(err, TemplateError::Unsliced);

    let ok = TemplatedFile::new("a", "f.sql", None, None, None).unwrap();
    assert_eq!(ok.templated_str(), "a");
}

#[test]
fn new_rejects_gappy_raw_slices() {
    let err = TemplatedFile::new(
        "abcde",
        "f.sql",
        Some("abc".to_string()),
        Some(vec![TemplatedSlice::new(SliceType::Literal, 0..3, 0..3)]),
        Some(vec![RawSlice::new("abc", SliceType::Literal, 0)]),
    )
    .unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"raw slices are inconsistent with the source: total source length 3 != 5");
}

#[test]
fn new_rejects_gappy_templated_slices() {
    let err = TemplatedFile::new(
        "abc",
        "f.sql",
        Some("abc".to_string()),
        Some(vec![
            TemplatedSlice::new(SliceType::Literal, 0..1, 0..1),
            TemplatedSlice::new(SliceType::Literal, 1..3, 2..3),
        ]),
        Some(vec![RawSlice::new("abc", SliceType::Literal, 0)]),
    )
    .unwrap_err();

    assert!(matches!(err, TemplateError::InconsistentTemplatedSlices(_)));
}

#[test]
fn line_pos_counts_from_one() {
    let file = TemplatedFile::from_string("a\nbc\n");

    assert_eq!(file.get_line_pos_of_char_pos(0, true), (1, 1));
    assert_eq!(file.get_line_pos_of_char_pos(1, true), (1, 2));
    assert_eq!(file.get_line_pos_of_char_pos(3, true), (2, 2));
    assert_eq!(file.get_line_pos_of_char_pos(5, true), (3, 1));
}

#[test]
fn line_pos_counts_characters_not_bytes() {
    let file = TemplatedFile::from_string("éa");

    assert_eq!(file.get_line_pos_of_char_pos(2, true), (1, 2));
}

#[test]
fn literal_slice_maps_exactly() {
    let file = templated_select();

    assert_eq!(file.templated_slice_to_source_slice(0..6), 0..6);
    assert_eq!(file.templated_slice_to_source_slice(13..17), 15..19);
}

#[test]
fn templated_slice_maps_to_whole_expression() {
    let file = templated_select();

    assert_eq!(file.templated_slice_to_source_slice(7..12), 7..14);
}

#[test]
fn point_at_template_boundary_maps_to_boundary() {
    let file = templated_select();

    assert_eq!(file.templated_slice_to_source_slice(12..12), 14..14);
    assert_eq!(file.templated_slice_to_source_slice(7..7), 7..7);
}

#[test]
fn point_inside_literal_is_offset() {
    let file = templated_select();

    assert_eq!(file.templated_slice_to_source_slice(3..3), 3..3);
}

#[test]
fn raw_slices_spanning() {
    let file = templated_select();

    let inside = file.raw_slices_spanning_source_slice(8..10);
    assert_eq!(inside.len(), 1);
    assert_eq!(inside[0].raw, "{{ a }}");

    let across = file.raw_slices_spanning_source_slice(5..10);
    assert_eq!(across.len(), 2);
    assert_eq!(across[0].slice_type, SliceType::Literal);

    assert!(file.raw_slices_spanning_source_slice(21..21).is_empty());
}

#[test]
fn source_slice_literal_check() {
    let file = templated_select();

    assert!(file.is_source_slice_literal(0..7));
    assert!(file.is_source_slice_literal(14..21));
    assert!(!file.is_source_slice_literal(7..14));
    assert!(!file.is_source_slice_literal(5..9));
    assert!(file.is_templated());
}

#[test]
fn strictly_inside_checks() {
    let file = templated_select();

    assert!(!file.is_inside_templated_span(7));
    assert!(file.is_inside_templated_span(9));
    assert!(!file.is_inside_templated_span(12));
    assert!(!file.is_inside_source_template(7));
    assert!(file.is_inside_source_template(10));
    assert!(!file.is_inside_source_template(14));
}

#[test]
fn source_only_slices_are_tags_and_comments() {
    let file = TemplatedFile::new(
        "SELECT {# c #}1",
        "f.sql",
        Some("SELECT 1".to_string()),
        Some(vec![
            TemplatedSlice::new(SliceType::Literal, 0..7, 0..7),
            TemplatedSlice::new(SliceType::Comment, 7..14, 7..7),
            TemplatedSlice::new(SliceType::Literal, 14..15, 7..8),
        ]),
        Some(vec![
            RawSlice::new("SELECT ", SliceType::Literal, 0),
            RawSlice::new("{# c #}", SliceType::Comment, 7),
            RawSlice::new("1", SliceType::Literal, 14),
        ]),
    )
    .unwrap();

    let only = file.source_only_slices();
    assert_eq!(only.len(), 1);
    assert_eq!(only[0].raw, "{# c #}");
    assert_eq!(file.templated_slice_to_source_slice(7..8), 7..15);
}

#[test]
fn slice_type_serializes_snake_case() {
    let json = serde_json::to_string(&RawSlice::new("{% if x %}", SliceType::BlockStart, 3)).unwrap();
    insta::assert_snapshot!(json, @r#"{"raw":"{% if x %}","slice_type":"block_start","source_idx":3,"block_idx":0}"#);
}
