use std::sync::Arc;

use crate::{PositionMarker, TemplatedFile};

fn file(s: &str) -> Arc<TemplatedFile> {
    Arc::new(TemplatedFile::from_string(s))
}

#[test]
fn working_loc_defaults_to_templated_position() {
    let f = file("SELECT\n  a");
    let marker = PositionMarker::new(7..10, 7..10, f, None);

    assert_eq!(marker.working_loc(), (2, 1));
    assert_eq!(marker.source_position(), (2, 1));
    assert_eq!(marker.templated_text(), "  a");
    assert_eq!(marker.source_text(), "  a");
}

#[test]
fn infer_next_position_tracks_newlines() {
    assert_eq!(PositionMarker::infer_next_position("abc", 1, 5), (1, 8));
    assert_eq!(PositionMarker::infer_next_position("a\nbc", 1, 5), (2, 3));
    assert_eq!(PositionMarker::infer_next_position("\n\n", 3, 9), (5, 1));
    assert_eq!(PositionMarker::infer_next_position("", 4, 2), (4, 2));
}

#[test]
fn advance_by_starts_at_previous_stop() {
    let f = file("SELECT\n  a b");
    let marker = PositionMarker::new(7..10, 7..10, f, None);
    let next = marker.advance_by(" ");

    assert_eq!(next.source_slice(), 10..11);
    assert_eq!(next.templated_slice(), 10..11);
    assert_eq!(next.working_loc(), (2, 4));
}

#[test]
fn point_markers() {
    let f = file("abc");
    let marker = PositionMarker::new(1..3, 1..3, f, None);

    assert!(!marker.is_point());
    let start = marker.start_point_marker();
    let end = marker.end_point_marker();
    assert!(start.is_point());
    assert!(end.is_point());
    assert_eq!(start.source_slice(), 1..1);
    assert_eq!(end.source_slice(), 3..3);
    assert_eq!(end.working_loc(), (1, 4));
    assert!(end.is_after(&marker));
}

#[test]
fn from_child_markers_spans_children() {
    let f = file("select a");
    let a = PositionMarker::new(0..6, 0..6, Arc::clone(&f), None);
    let b = PositionMarker::new(7..8, 7..8, f, None);
    let parent = PositionMarker::from_child_markers([&a, &b]).unwrap();

    assert_eq!(parent.source_slice(), 0..8);
    assert_eq!(parent.templated_slice(), 0..8);
    assert_eq!(parent.working_loc(), (1, 1));
    assert!(PositionMarker::from_child_markers(Vec::<&PositionMarker>::new()).is_none());
}

#[test]
fn literal_requires_equal_lengths() {
    let f = file("abc");
    assert!(PositionMarker::new(0..3, 0..3, Arc::clone(&f), None).is_literal());
    assert!(!PositionMarker::new(0..3, 0..2, f, None).is_literal());
}

#[test]
fn equality_ignores_file_identity() {
    let a = PositionMarker::new(0..1, 0..1, file("a"), None);
    let b = PositionMarker::new(0..1, 0..1, file("a"), None);
    assert_eq!(a, b);
    assert_ne!(a, b.clone().with_working_loc(2, 1));
}

#[test]
fn display_shows_working_location() {
    let marker = PositionMarker::new(0..1, 0..1, file("a"), None);
    insta::assert_snapshot!(marker.to_string(), @"[L:  1, P:  1]");
}
