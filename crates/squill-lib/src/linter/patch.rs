//! Source patches from a fixed tree.
//!
//! The fixed tree is walked in templated order and compared with the
//! templated file. Every divergence becomes a [`FixPatch`] in source
//! coordinates; patches that would land inside template code are dropped.

use std::ops::Range;

use serde::Serialize;
use squill_core::{SliceType, TemplatedFile};

use crate::segments::{MetaKind, Segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchCategory {
    /// A changed segment lying wholly in literal text.
    Literal,
    /// A gap or insertion between two children.
    MidPoint,
    /// A gap or insertion after the last child.
    EndPoint,
    /// A changed segment standing for exactly one template expression.
    Templated,
    /// An edit a rule expressed directly in source coordinates.
    Source,
}

impl PatchCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchCategory::Literal => "literal",
            PatchCategory::MidPoint => "mid_point",
            PatchCategory::EndPoint => "end_point",
            PatchCategory::Templated => "templated",
            PatchCategory::Source => "source",
        }
    }
}

/// One edit to the source string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixPatch {
    pub templated_slice: Range<usize>,
    pub fixed_raw: String,
    pub patch_category: PatchCategory,
    pub source_slice: Range<usize>,
    pub templated_str: String,
    pub source_str: String,
}

impl FixPatch {
    fn new(
        file: &TemplatedFile,
        source_slice: Range<usize>,
        templated_slice: Range<usize>,
        fixed_raw: impl Into<String>,
        patch_category: PatchCategory,
    ) -> Self {
        Self {
            templated_str: slice_of(file.templated_str(), &templated_slice).to_string(),
            source_str: slice_of(file.source_str(), &source_slice).to_string(),
            templated_slice,
            fixed_raw: fixed_raw.into(),
            patch_category,
            source_slice,
        }
    }

    fn dedupe_key(&self) -> (Range<usize>, &str) {
        (self.source_slice.clone(), &self.fixed_raw)
    }

    /// True if either end of this patch falls strictly inside template code.
    fn straddles_template(&self, file: &TemplatedFile) -> bool {
        file.is_inside_source_template(self.source_slice.start)
            || file.is_inside_source_template(self.source_slice.end)
            || file.is_inside_templated_span(self.templated_slice.start)
            || file.is_inside_templated_span(self.templated_slice.end)
    }
}

/// Patches to apply, and patches refused because they touch template code.
#[derive(Debug, Clone, Default)]
pub struct PatchSet {
    pub patches: Vec<FixPatch>,
    pub dropped: Vec<FixPatch>,
}

/// Ordered, non-overlapping patches turning the source of `file` into the
/// text of `tree`.
pub fn generate_source_patches(tree: &Segment, file: &TemplatedFile) -> PatchSet {
    tracing::debug!(fname = file.fname(), "generating patches");
    let mut walker = PatchWalker {
        file,
        yielded: Vec::new(),
        dropped: Vec::new(),
    };
    walker.walk(tree);

    let PatchWalker {
        yielded,
        mut dropped,
        ..
    } = walker;
    let mut patches: Vec<FixPatch> = Vec::new();
    for patch in yielded {
        if patches.iter().any(|p| p.dedupe_key() == patch.dedupe_key()) {
            tracing::trace!(source = ?patch.source_slice, "duplicate patch skipped");
            continue;
        }
        if keep_patch(&patch, file) {
            tracing::trace!(
                category = patch.patch_category.as_str(),
                source = ?patch.source_slice,
                fixed = %patch.fixed_raw,
                "patch kept"
            );
            patches.push(patch);
        } else {
            tracing::warn!(
                category = patch.patch_category.as_str(),
                source = ?patch.source_slice,
                "skipping patch inside templated code"
            );
            dropped.push(patch);
        }
    }
    patches.sort_by_key(|p| p.source_slice.start);
    PatchSet { patches, dropped }
}

fn keep_patch(patch: &FixPatch, file: &TemplatedFile) -> bool {
    let local = file.raw_slices_spanning_source_slice(patch.source_slice.clone());
    if local.iter().all(|s| s.slice_type == SliceType::Literal) {
        return true;
    }
    if patch.patch_category == PatchCategory::Source {
        return true;
    }
    if patch.source_slice.is_empty()
        && local
            .first()
            .is_some_and(|s| s.source_idx == patch.source_slice.start)
    {
        return true;
    }
    !patch.straddles_template(file)
}

/// Apply `patches` (sorted, non-overlapping) to `source`.
pub fn apply_patches(source: &str, patches: &[FixPatch]) -> String {
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for patch in patches {
        if patch.source_slice.start < last {
            tracing::warn!(source = ?patch.source_slice, "overlapping patch skipped");
            continue;
        }
        out.push_str(slice_of(source, &(last..patch.source_slice.start)));
        out.push_str(&patch.fixed_raw);
        last = patch.source_slice.end;
    }
    out.push_str(slice_of(source, &(last..source.len())));
    out
}

struct PatchWalker<'a> {
    file: &'a TemplatedFile,
    yielded: Vec<FixPatch>,
    dropped: Vec<FixPatch>,
}

impl PatchWalker<'_> {
    fn source_fix_patches(&mut self, segment: &Segment) {
        for fix in segment.all_source_fixes() {
            let patch = FixPatch::new(
                self.file,
                fix.source_slice.clone(),
                fix.templated_slice.clone(),
                fix.edit.clone(),
                PatchCategory::Source,
            );
            self.yielded.push(patch);
        }
    }

    fn walk(&mut self, segment: &Segment) {
        let marker = segment.marker();
        let templated_slice = marker.templated_slice();
        if segment.raw() == slice_of(self.file.templated_str(), &templated_slice) {
            self.source_fix_patches(segment);
            return;
        }
        tracing::trace!(
            segment = segment.name(),
            at = ?templated_slice,
            fixed = segment.raw(),
            "changed segment"
        );

        if marker.is_literal() && segment.is_raw() {
            self.source_fix_patches(segment);
            let patch = FixPatch::new(
                self.file,
                marker.source_slice(),
                templated_slice,
                segment.raw(),
                PatchCategory::Literal,
            );
            self.yielded.push(patch);
            return;
        }

        let children = segment.children();
        if children.is_empty() {
            let patch = FixPatch::new(
                self.file,
                marker.source_slice(),
                templated_slice.clone(),
                segment.raw(),
                PatchCategory::Templated,
            );
            if self.covers_one_template(&marker.source_slice(), &templated_slice) {
                self.source_fix_patches(segment);
                self.yielded.push(patch);
            } else {
                tracing::warn!(source = ?patch.source_slice, "edit inside templated code dropped");
                self.dropped.push(patch);
            }
            return;
        }

        let end = children
            .iter()
            .rposition(|c| !matches!(c.meta_kind(), Some(MetaKind::Indent | MetaKind::Dedent)))
            .map_or(0, |i| i + 1);
        let mut source_idx = marker.source_slice().start;
        let mut templated_idx = templated_slice.start;
        let mut insert_buf = String::new();

        for child in &children[..end] {
            let child_marker = child.marker();
            if !child.raw().is_empty() && child_marker.is_point() {
                insert_buf.push_str(child.raw());
                continue;
            }
            if child_marker.templated_slice().start > templated_idx || !insert_buf.is_empty() {
                let first = child
                    .raw_segments()
                    .first()
                    .map(|leaf| leaf.marker().clone())
                    .unwrap_or_else(|| child_marker.clone());
                let patch = FixPatch::new(
                    self.file,
                    source_idx..first.source_slice().start.max(source_idx),
                    templated_idx..first.templated_slice().start.max(templated_idx),
                    std::mem::take(&mut insert_buf),
                    PatchCategory::MidPoint,
                );
                self.yielded.push(patch);
            }
            self.walk(child);
            source_idx = child_marker.source_slice().end;
            templated_idx = child_marker.templated_slice().end;
        }

        if templated_slice.end != templated_idx || !insert_buf.is_empty() {
            let patch = FixPatch::new(
                self.file,
                source_idx..marker.source_slice().end.max(source_idx),
                templated_idx..templated_slice.end.max(templated_idx),
                insert_buf,
                PatchCategory::EndPoint,
            );
            self.yielded.push(patch);
        }
    }

    fn covers_one_template(&self, source: &Range<usize>, templated: &Range<usize>) -> bool {
        self.file.sliced_file().iter().any(|s| {
            s.slice_type != SliceType::Literal
                && &s.source_slice == source
                && &s.templated_slice == templated
        })
    }
}

fn slice_of<'s>(text: &'s str, range: &Range<usize>) -> &'s str {
    text.get(range.clone()).unwrap_or("")
}
