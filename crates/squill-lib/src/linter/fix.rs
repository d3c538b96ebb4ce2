//! Rule fixes and their application to the tree.
//!
//! Fixes name their anchor by [`SegmentId`]. Applying a batch walks the tree
//! once, popping each anchor's fixes as the anchor is reached, so a fix whose
//! anchor no longer exists is simply left over.

use std::ops::Range;

use indexmap::IndexMap;
use serde::Serialize;
use squill_core::{PositionMarker, SliceType, TemplatedFile};

use crate::dialect::Dialect;
use crate::segments::{Segment, SegmentId, SegmentKind, SourceFix, span_of};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditType {
    Delete,
    Replace,
    CreateBefore,
    CreateAfter,
}

impl EditType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditType::Delete => "delete",
            EditType::Replace => "replace",
            EditType::CreateBefore => "create_before",
            EditType::CreateAfter => "create_after",
        }
    }
}

/// One edit a rule wants made, anchored on a segment of the current tree.
#[derive(Debug, Clone)]
pub struct LintFix {
    pub edit_type: EditType,
    pub anchor: Segment,
    pub edit: Vec<Segment>,
    /// Segments the edit was derived from, checked for template conflicts
    /// like the anchor.
    pub source: Vec<Segment>,
}

impl LintFix {
    pub fn delete(anchor: &Segment) -> Self {
        Self {
            edit_type: EditType::Delete,
            anchor: anchor.clone(),
            edit: Vec::new(),
            source: Vec::new(),
        }
    }

    pub fn replace(anchor: &Segment, edit: Vec<Segment>) -> Self {
        Self {
            edit_type: EditType::Replace,
            anchor: anchor.clone(),
            edit,
            source: Vec::new(),
        }
    }

    /// Replace `anchor` with a single segment.
    pub fn edit(anchor: &Segment, segment: Segment) -> Self {
        Self::replace(anchor, vec![segment])
    }

    pub fn create_before(anchor: &Segment, edit: Vec<Segment>) -> Self {
        Self {
            edit_type: EditType::CreateBefore,
            anchor: anchor.clone(),
            edit,
            source: Vec::new(),
        }
    }

    pub fn create_after(anchor: &Segment, edit: Vec<Segment>) -> Self {
        Self {
            edit_type: EditType::CreateAfter,
            anchor: anchor.clone(),
            edit,
            source: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: Vec<Segment>) -> Self {
        self.source = source;
        self
    }

    /// A fix that would leave the tree as it is.
    pub fn is_trivial(&self) -> bool {
        match self.edit_type {
            EditType::Delete => false,
            EditType::CreateBefore | EditType::CreateAfter => {
                self.edit.iter().all(|s| s.raw().is_empty())
            }
            EditType::Replace => match self.edit.as_slice() {
                [only] => {
                    only.raw() == self.anchor.raw()
                        && only.source_fixes() == self.anchor.source_fixes()
                        && only.class_types() == self.anchor.class_types()
                }
                _ => false,
            },
        }
    }

    /// A replacement that only adds source fixes to the anchor.
    pub fn is_just_source_edit(&self) -> bool {
        self.edit_type == EditType::Replace
            && matches!(self.edit.as_slice(), [only]
                if only.raw() == self.anchor.raw() && !only.source_fixes().is_empty())
    }

    /// Whether applying this fix would edit template code.
    ///
    /// Insertions conflict only when surrounded by template output on both
    /// sides; deletions and replacements conflict when they touch it at all.
    pub fn has_template_conflicts(&self, file: &TemplatedFile) -> bool {
        if self.is_just_source_edit() {
            return false;
        }
        let touched = self.touched_slice_types(file);
        let templated = |t: &SliceType| *t == SliceType::Templated;
        let conflict = match self.edit_type {
            EditType::CreateBefore | EditType::CreateAfter => touched.iter().all(templated),
            EditType::Delete | EditType::Replace => touched.iter().any(templated),
        };
        if conflict || self.source.is_empty() {
            return conflict;
        }
        self.source
            .iter()
            .flat_map(|s| raw_slice_types(file, Some(s.marker().templated_slice())))
            .any(|t| t == SliceType::Templated)
    }

    /// Kinds of the raw slices this fix touches. Insertions look at the
    /// characters either side of the insertion point.
    fn touched_slice_types(&self, file: &TemplatedFile) -> Vec<SliceType> {
        let marker = self.anchor.marker();
        let anchor = marker.templated_slice();
        let templated = match self.edit_type {
            EditType::CreateBefore => anchor.start.checked_sub(1).map(|s| s..anchor.start + 1),
            EditType::CreateAfter => anchor.end.checked_sub(1).map(|s| s..anchor.end + 1),
            EditType::Replace if marker.source_slice().is_empty() => return Vec::new(),
            EditType::Replace
                if !self.edit.is_empty()
                    && self
                        .edit
                        .iter()
                        .all(|e| e.is_raw() && !e.source_fixes().is_empty()) =>
            {
                return self
                    .edit
                    .iter()
                    .flat_map(|e| e.source_fixes())
                    .flat_map(|f| file.raw_slices_spanning_source_slice(f.source_slice.clone()))
                    .map(|s| s.slice_type)
                    .collect();
            }
            EditType::Delete | EditType::Replace => Some(anchor),
        };
        raw_slice_types(file, templated)
    }
}

/// Kinds of the raw slices behind a templated range. A range running off
/// either end of the file counts as literal.
fn raw_slice_types(file: &TemplatedFile, templated: Option<Range<usize>>) -> Vec<SliceType> {
    let Some(templated) = templated.filter(|r| r.end <= file.templated_str().len()) else {
        return vec![SliceType::Literal];
    };
    let source = file.templated_slice_to_source_slice(templated);
    let types: Vec<SliceType> = file
        .raw_slices_spanning_source_slice(source)
        .iter()
        .map(|s| s.slice_type)
        .collect();
    if types.is_empty() {
        return vec![SliceType::Literal];
    }
    types
}

impl PartialEq for LintFix {
    /// Same kind of edit on the same anchor producing the same text.
    fn eq(&self, other: &Self) -> bool {
        self.edit_type == other.edit_type
            && self.anchor.id() == other.anchor.id()
            && self.edit.len() == other.edit.len()
            && self.edit.iter().zip(&other.edit).all(|(a, b)| {
                a.raw() == b.raw()
                    && a.class_types() == b.class_types()
                    && a.source_fixes() == b.source_fixes()
            })
    }
}

/// Fixes collected for one anchor, with counts per edit type.
#[derive(Debug, Clone, Default)]
pub struct AnchorEditInfo {
    pub delete: usize,
    pub replace: usize,
    pub create_before: usize,
    pub create_after: usize,
    pub fixes: Vec<LintFix>,
    source_fixes: Vec<SourceFix>,
    first_replace: Option<usize>,
}

impl AnchorEditInfo {
    /// Record `fix`. Duplicates are ignored and repeated source-only edits
    /// are folded into the first replacement.
    pub fn add(&mut self, fix: LintFix) {
        if self.fixes.contains(&fix) {
            return;
        }
        if fix.is_just_source_edit() {
            self.source_fixes.extend(fix.edit[0].source_fixes().iter().cloned());
            if let Some(idx) = self.first_replace {
                let first = &mut self.fixes[idx];
                tracing::debug!(anchor = %fix.anchor.id(), "condensing source edits");
                let mut merged = first.edit[0].clone();
                for source_fix in &self.source_fixes {
                    if !merged.source_fixes().contains(source_fix) {
                        merged = merged.with_source_fix(source_fix.clone());
                    }
                }
                first.edit[0] = merged;
                return;
            }
        }
        match fix.edit_type {
            EditType::Delete => self.delete += 1,
            EditType::Replace => {
                self.replace += 1;
                if self.first_replace.is_none() {
                    self.first_replace = Some(self.fixes.len());
                }
            }
            EditType::CreateBefore => self.create_before += 1,
            EditType::CreateAfter => self.create_after += 1,
        }
        self.fixes.push(fix);
    }

    pub fn total(&self) -> usize {
        self.fixes.len()
    }

    /// At most one fix, or exactly one `create_before` plus one `create_after`.
    pub fn is_valid(&self) -> bool {
        match self.total() {
            0 | 1 => true,
            2 => self.create_before == 1 && self.create_after == 1,
            _ => false,
        }
    }
}

/// Group fixes by anchor, anchors in source order.
pub fn compute_anchor_edit_info(fixes: &[LintFix]) -> IndexMap<SegmentId, AnchorEditInfo> {
    let mut ordered: Vec<&LintFix> = fixes.iter().collect();
    ordered.sort_by_key(|f| {
        let marker = f.anchor.marker();
        (marker.templated_slice().start, marker.source_slice().start)
    });
    let mut info: IndexMap<SegmentId, AnchorEditInfo> = IndexMap::new();
    for fix in ordered {
        info.entry(fix.anchor.id()).or_default().add(fix.clone());
    }
    info
}

/// Output of [`apply_fixes`]: the rebuilt segment plus any non-code that
/// had to move out of it to its parent.
#[derive(Debug, Clone)]
pub struct Applied {
    pub segment: Segment,
    pub before: Vec<Segment>,
    pub after: Vec<Segment>,
}

/// Apply every fix in `fixes` anchored under `segment`, removing them from
/// the map. Positions of the result are not realigned.
pub fn apply_fixes(
    segment: &Segment,
    dialect: &Dialect,
    fixes: &mut IndexMap<SegmentId, AnchorEditInfo>,
) -> Applied {
    if fixes.is_empty() || !matches!(segment.kind(), SegmentKind::Interior(_) | SegmentKind::Unparsable(_)) {
        return Applied {
            segment: segment.clone(),
            before: Vec::new(),
            after: Vec::new(),
        };
    }

    let mut buffer = Vec::with_capacity(segment.children().len());
    for child in segment.children() {
        let Some(info) = fixes.shift_remove(&child.id()) else {
            buffer.push(child.clone());
            continue;
        };
        if child.is_meta() {
            tracing::warn!(anchor = %child.id(), "fix anchored on a meta segment ignored");
            buffer.push(child.clone());
            continue;
        }
        splice(child, info, &mut buffer);
    }

    let mut children = Vec::with_capacity(buffer.len());
    for child in buffer {
        let applied = apply_fixes(&child, dialect, fixes);
        children.extend(applied.before);
        children.push(applied.segment);
        children.extend(applied.after);
    }

    let keeps_ends = match segment.kind() {
        SegmentKind::Interior(_) => dialect
            .segment_def(segment.name())
            .is_none_or(|def| def.can_start_end_non_code),
        _ => true,
    };
    let (before, after) = if keeps_ends {
        (Vec::new(), Vec::new())
    } else {
        let lead = children
            .iter()
            .position(|s| s.is_code() || s.is_meta())
            .unwrap_or(children.len());
        let before: Vec<Segment> = children.drain(..lead).collect();
        let tail = children
            .iter()
            .rposition(|s| s.is_code() || s.is_meta())
            .map_or(0, |i| i + 1);
        let after: Vec<Segment> = children.drain(tail..).collect();
        (before, after)
    };

    Applied {
        segment: segment.with_children(children),
        before,
        after,
    }
}

/// Push whatever replaces `anchor` onto `buffer`.
fn splice(anchor: &Segment, info: AnchorEditInfo, buffer: &mut Vec<Segment>) {
    let marker = anchor.marker();
    let mut fixes = info.fixes;
    if fixes.len() == 2 && fixes[0].edit_type == EditType::CreateAfter {
        fixes.reverse();
    }
    let single = fixes.len() == 1;
    for fix in fixes {
        tracing::trace!(edit = fix.edit_type.as_str(), anchor = %anchor.id(), "applying fix");
        match fix.edit_type {
            EditType::Delete => {}
            EditType::Replace => {
                let mut span = Some(marker.clone());
                buffer.extend(position_new(&fix.edit, &mut span, &marker.end_point_marker()));
            }
            EditType::CreateBefore => {
                buffer.extend(position_new(&fix.edit, &mut None, &marker.start_point_marker()));
                buffer.push(anchor.clone());
            }
            EditType::CreateAfter => {
                if single {
                    buffer.push(anchor.clone());
                }
                buffer.extend(position_new(&fix.edit, &mut None, &marker.end_point_marker()));
            }
        }
    }
}

/// Give new segments positions in the file. The first leaf takes `span`
/// if one is left; every other leaf becomes a point at `point`.
fn position_new(
    segments: &[Segment],
    span: &mut Option<PositionMarker>,
    point: &PositionMarker,
) -> Vec<Segment> {
    segments
        .iter()
        .map(|segment| match segment.kind() {
            SegmentKind::Interior(_) | SegmentKind::Unparsable(_) => {
                let children = position_new(segment.children(), span, point);
                let marker = span_of(&children).unwrap_or_else(|| point.clone());
                segment.with_children(children).with_marker(marker)
            }
            SegmentKind::Raw(_) if !segment.raw().is_empty() => {
                let marker = span.take().unwrap_or_else(|| point.clone());
                segment.with_marker(marker)
            }
            SegmentKind::Raw(_) | SegmentKind::Meta(_) => segment.with_marker(point.clone()),
        })
        .collect()
}
