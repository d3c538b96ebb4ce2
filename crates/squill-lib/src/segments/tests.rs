use std::sync::Arc;

use squill_core::{PositionMarker, TemplatedFile};

use super::*;

fn marker(file: &Arc<TemplatedFile>, range: Range<usize>) -> PositionMarker {
    PositionMarker::new(range.clone(), range, Arc::clone(file), None)
}

/// `select a` as file > statement > [keyword, whitespace, identifier].
fn small_tree() -> Segment {
    let file = Arc::new(TemplatedFile::from_string("select a"));
    let kw = Segment::keyword("select", marker(&file, 0..6));
    let ws = Segment::whitespace(" ", marker(&file, 6..7));
    let ident = Segment::raw_with_types("a", vec!["naked_identifier", "identifier"], "code", marker(&file, 7..8));
    let stmt = Segment::interior(
        "StatementSegment",
        "statement",
        vec![kw, ws, ident],
        marker(&file, 0..8),
    );
    Segment::interior("FileSegment", "file", vec![stmt], marker(&file, 0..8))
}

#[test]
fn interior_raw_is_concatenation() {
    let tree = small_tree();
    assert_eq!(tree.raw(), "select a");
    assert_eq!(tree.children()[0].raw(), "select a");
}

#[test]
fn token_constructor_and_raw_accessor() {
    let file = Arc::new(TemplatedFile::from_string("foo"));
    let token = Segment::token("foo", "word", "word", marker(&file, 0..3));
    assert_eq!(token.raw(), "foo");
    assert_eq!(token.raw_upper(), "FOO");
    assert_eq!(token.type_tag(), "word");
    assert!(token.is_code());
}

#[test]
fn code_classification() {
    let tree = small_tree();
    let leaves = tree.raw_segments();
    assert!(leaves[0].is_code());
    assert!(!leaves[1].is_code());
    assert!(leaves[1].is_whitespace());
    assert!(tree.is_code());
}

#[test]
fn types_and_descendants() {
    let tree = small_tree();
    let ident = &tree.raw_segments()[2];
    assert!(ident.is_type("identifier"));
    assert!(ident.is_type("naked_identifier"));
    assert!(ident.is_type("raw"));
    assert_eq!(ident.type_tag(), "naked_identifier");

    let types = tree.descendant_type_set();
    assert!(types.contains("statement"));
    assert!(types.contains("keyword"));
    assert!(!types.contains("file"));
}

#[test]
fn edit_gives_fresh_identity_same_position() {
    let tree = small_tree();
    let kw = tree.raw_segments()[0].clone();
    let edited = kw.edit("SELECT");

    assert_ne!(edited.id(), kw.id());
    assert_eq!(edited.marker(), kw.marker());
    assert_eq!(edited.raw_upper(), "SELECT");
    assert!(edited.is_type("keyword"));
}

#[test]
fn with_children_keeps_identity() {
    let tree = small_tree();
    let stmt = tree.children()[0].clone();
    let trimmed = stmt.with_children(stmt.children()[..1].to_vec());

    assert!(trimmed.is(&stmt));
    assert_eq!(trimmed.raw(), "select");
    assert!(!trimmed.descendant_type_set().contains("whitespace"));
}

#[test]
fn find_and_path_to() {
    let tree = small_tree();
    let ident = tree.raw_segments()[2].clone();

    let found = tree.find(ident.id()).unwrap();
    assert!(found.is(&ident));

    let path = tree.path_to(ident.id()).unwrap();
    let types: Vec<_> = path.iter().map(Segment::type_tag).collect();
    assert_eq!(types, vec!["file", "statement"]);
}

#[test]
fn recursive_crawl_prunes_by_type() {
    let tree = small_tree();
    let keywords = tree.recursive_crawl(&["keyword"], true);
    assert_eq!(keywords.len(), 1);
    assert_eq!(keywords[0].raw(), "select");

    let statements = tree.recursive_crawl(&["statement", "keyword"], false);
    assert_eq!(statements.len(), 1);
    assert!(tree.iter_unparsables().is_empty());
}

#[test]
fn stringify_tree() {
    insta::assert_snapshot!(small_tree().stringify(), @r#"
    file:
      statement:
        keyword: "select"
        whitespace: " "
        naked_identifier: "a"
    "#);
}

#[test]
fn to_tuple_code_only() {
    let tuple = small_tree().to_tuple(true);
    assert_eq!(
        tuple,
        SegmentTuple::Node(
            "file",
            vec![SegmentTuple::Node(
                "statement",
                vec![
                    SegmentTuple::Leaf("keyword", "select".into()),
                    SegmentTuple::Leaf("naked_identifier", "a".into()),
                ]
            )]
        )
    );
}

#[test]
fn realign_is_idempotent() {
    let tree = small_tree();
    let once = tree.realign();
    let twice = once.realign();

    assert_eq!(once, twice);
    assert_eq!(once.raw(), tree.raw());
    assert_eq!(once, tree);
}

#[test]
fn realign_shifts_after_edit() {
    let tree = small_tree();
    let stmt = &tree.children()[0];
    let kw = &stmt.children()[0];
    let longer = kw.edit("selectt");
    let mut children = stmt.children().to_vec();
    children[0] = longer;
    let tree = tree.with_children(vec![stmt.with_children(children)]).realign();

    let ident = &tree.raw_segments()[2];
    assert_eq!(ident.marker().working_loc(), (1, 9));
}

#[test]
fn trim_non_code_splits() {
    let tree = small_tree();
    let leaves = tree.raw_segments();
    let (pre, core, post) = trim_non_code(&leaves[1..]);
    assert_eq!(pre.len(), 1);
    assert_eq!(core.len(), 1);
    assert!(post.is_empty());

    let (pre, core, post) = trim_non_code(&leaves[1..2]);
    assert_eq!(pre.len(), 1);
    assert!(core.is_empty() && post.is_empty());
}
