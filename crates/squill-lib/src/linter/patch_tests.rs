use std::sync::Arc;

use indexmap::IndexMap;
use squill_core::{PositionMarker, TemplatedFile};

use crate::dialect::dialect_selector;
use crate::lexer::Lexer;
use crate::segments::Segment;
use crate::templater::{PlaceholderStyle, PlaceholderTemplater, Templater};

use super::*;

/// Lexed tokens of `file` under a single file segment.
fn flat_tree(file: &Arc<TemplatedFile>) -> Segment {
    let dialect = dialect_selector("ansi").unwrap();
    let (tokens, errors) = Lexer::new(&dialect).lex(file);
    assert!(errors.is_empty());
    let marker = PositionMarker::new(
        0..file.source_str().len(),
        0..file.templated_str().len(),
        Arc::clone(file),
        None,
    );
    Segment::interior("FileSegment", "file", tokens, marker)
}

/// Replace the first leaf whose raw is `from` with a copy reading `to`.
fn edit_leaf(tree: &Segment, from: &str, to: &str) -> Segment {
    let mut done = false;
    let children = tree
        .children()
        .iter()
        .map(|c| {
            if !done && c.raw() == from {
                done = true;
                c.edit(to)
            } else {
                c.clone()
            }
        })
        .collect();
    assert!(done, "no leaf {from:?}");
    tree.with_children(children)
}

fn patch(source: std::ops::Range<usize>, fixed: &str) -> FixPatch {
    FixPatch {
        templated_slice: source.clone(),
        fixed_raw: fixed.to_string(),
        patch_category: PatchCategory::Literal,
        source_slice: source,
        templated_str: String::new(),
        source_str: String::new(),
    }
}

#[test]
fn unchanged_tree_yields_nothing() {
    let file = Arc::new(TemplatedFile::from_string("select a from t"));
    let set = generate_source_patches(&flat_tree(&file), &file);
    assert!(set.patches.is_empty());
    assert!(set.dropped.is_empty());
}

#[test]
fn literal_edit_is_patched() {
    let file = Arc::new(TemplatedFile::from_string("select a from t"));
    let tree = edit_leaf(&flat_tree(&file), "from", "FROM");
    let set = generate_source_patches(&tree, &file);

    assert_eq!(set.patches.len(), 1);
    let only = &set.patches[0];
    assert_eq!(only.patch_category, PatchCategory::Literal);
    assert_eq!(only.source_slice, 9..13);
    assert_eq!(only.source_str, "from");
    assert_eq!(only.fixed_raw, "FROM");
    assert_eq!(apply_patches(file.source_str(), &set.patches), "select a FROM t");
}

#[test]
fn partial_template_edit_is_dropped() {
    let context: IndexMap<String, String> = [("a".to_string(), "col_x one".to_string())]
        .into_iter()
        .collect();
    let templater = PlaceholderTemplater::new(PlaceholderStyle::Brace, context).unwrap();
    let file = Arc::new(templater.process("SELECT {{ a }} FROM t", "t.sql").unwrap());
    assert_eq!(file.templated_str(), "SELECT col_x one FROM t");

    let tree = edit_leaf(&flat_tree(&file), "col_x", "col_y");
    let set = generate_source_patches(&tree, &file);
    assert!(set.patches.is_empty());
    assert_eq!(set.dropped.len(), 1);
    assert_eq!(set.dropped[0].fixed_raw, "col_y");
}

#[test]
fn overlapping_patches_are_skipped() {
    let patches = [patch(0..2, "X"), patch(1..3, "Y"), patch(4..4, "Z")];
    assert_eq!(apply_patches("abcdef", &patches), "XcdZef");
}

#[test]
fn many_edits_are_ordered_by_source() {
    let file = Arc::new(TemplatedFile::from_string("select a, b from t where c"));
    let mut tree = flat_tree(&file);
    for (from, to) in [("where", "WHERE"), ("select", "SELECT"), ("from", "FROM")] {
        tree = edit_leaf(&tree, from, to);
    }
    // Drop the space after the comma.
    let children: Vec<_> = tree
        .children()
        .iter()
        .filter(|c| c.marker().source_slice() != (9..10))
        .cloned()
        .collect();
    let tree = tree.with_children(children);

    let set = generate_source_patches(&tree, &file);
    let starts: Vec<_> = set.patches.iter().map(|p| p.source_slice.start).collect();
    assert_eq!(starts, vec![0, 9, 12, 19]);
    assert_eq!(set.patches[1].patch_category, PatchCategory::MidPoint);
    assert_eq!(set.patches[1].fixed_raw, "");
    assert_eq!(
        apply_patches(file.source_str(), &set.patches),
        "SELECT a,b FROM t WHERE c"
    );
}
