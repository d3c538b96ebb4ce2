//! Segment tree.
//!
//! Segments are immutable and reference counted. Every segment has a
//! [`SegmentId`] allocated at construction; fixes refer to segments by id,
//! never by structure. Editing produces new segments and the tree is
//! rebuilt around them.

mod display;

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use squill_core::{PositionMarker, SliceType};

pub use display::SegmentTuple;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a segment within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(u64);

impl SegmentId {
    fn fresh() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An edit expressed directly in source coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFix {
    pub edit: String,
    pub source_slice: Range<usize>,
    pub templated_slice: Range<usize>,
}

impl SourceFix {
    pub fn new(edit: impl Into<String>, source_slice: Range<usize>, templated_slice: Range<usize>) -> Self {
        Self {
            edit: edit.into(),
            source_slice,
            templated_slice,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaKind {
    Indent,
    Dedent,
    /// Source-only template text (tags, comments) with no templated output.
    Placeholder {
        block_type: SliceType,
        source_str: String,
    },
}

impl MetaKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            MetaKind::Indent => "indent",
            MetaKind::Dedent => "dedent",
            MetaKind::Placeholder { .. } => "placeholder",
        }
    }

    pub fn indent_val(&self) -> i8 {
        match self {
            MetaKind::Indent => 1,
            MetaKind::Dedent => -1,
            MetaKind::Placeholder { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawData {
    raw: String,
    raw_upper: String,
    /// Primary type first, then any extra class types.
    types: Vec<&'static str>,
    /// Name of the lexer matcher that produced the token.
    name: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteriorData {
    name: &'static str,
    type_tag: &'static str,
    children: Vec<Segment>,
    raw: String,
    descendant_types: BTreeSet<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnparsableData {
    children: Vec<Segment>,
    expected: String,
    anchor: PositionMarker,
    raw: String,
    descendant_types: BTreeSet<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    Raw(RawData),
    Interior(InteriorData),
    Meta(MetaKind),
    Unparsable(UnparsableData),
}

#[derive(Debug)]
struct SegmentData {
    id: SegmentId,
    marker: PositionMarker,
    kind: SegmentKind,
    source_fixes: Vec<SourceFix>,
}

/// A node of the parse tree. Cloning is cheap and preserves identity.
#[derive(Clone)]
pub struct Segment(Arc<SegmentData>);

impl Segment {
    fn build(id: SegmentId, marker: PositionMarker, kind: SegmentKind, source_fixes: Vec<SourceFix>) -> Self {
        Segment(Arc::new(SegmentData {
            id,
            marker,
            kind,
            source_fixes,
        }))
    }

    /// A leaf token.
    pub fn token(
        raw: impl Into<String>,
        type_tag: &'static str,
        name: &'static str,
        marker: PositionMarker,
    ) -> Self {
        Self::raw_with_types(raw, vec![type_tag], name, marker)
    }

    pub fn raw_with_types(
        raw: impl Into<String>,
        types: Vec<&'static str>,
        name: &'static str,
        marker: PositionMarker,
    ) -> Self {
        let raw = raw.into();
        let raw_upper = raw.to_uppercase();
        Self::build(
            SegmentId::fresh(),
            marker,
            SegmentKind::Raw(RawData {
                raw,
                raw_upper,
                types,
                name,
            }),
            Vec::new(),
        )
    }

    pub fn whitespace(raw: impl Into<String>, marker: PositionMarker) -> Self {
        Self::token(raw, "whitespace", "whitespace", marker)
    }

    pub fn newline(raw: impl Into<String>, marker: PositionMarker) -> Self {
        Self::token(raw, "newline", "newline", marker)
    }

    pub fn keyword(raw: impl Into<String>, marker: PositionMarker) -> Self {
        Self::token(raw, "keyword", "code", marker)
    }

    pub fn symbol(raw: impl Into<String>, type_tag: &'static str, marker: PositionMarker) -> Self {
        Self::raw_with_types(raw, vec![type_tag, "symbol"], "code", marker)
    }

    /// An interior node. `marker` should span the children.
    pub fn interior(
        name: &'static str,
        type_tag: &'static str,
        children: Vec<Segment>,
        marker: PositionMarker,
    ) -> Self {
        let raw = concat_raw(&children);
        let descendant_types = collect_descendant_types(&children);
        Self::build(
            SegmentId::fresh(),
            marker,
            SegmentKind::Interior(InteriorData {
                name,
                type_tag,
                children,
                raw,
                descendant_types,
            }),
            Vec::new(),
        )
    }

    pub fn meta(kind: MetaKind, marker: PositionMarker) -> Self {
        Self::build(SegmentId::fresh(), marker, SegmentKind::Meta(kind), Vec::new())
    }

    /// A run of segments that failed to parse, anchored where parsing gave up.
    pub fn unparsable(
        children: Vec<Segment>,
        expected: impl Into<String>,
        anchor: PositionMarker,
        marker: PositionMarker,
    ) -> Self {
        let raw = concat_raw(&children);
        let descendant_types = collect_descendant_types(&children);
        Self::build(
            SegmentId::fresh(),
            marker,
            SegmentKind::Unparsable(UnparsableData {
                children,
                expected: expected.into(),
                anchor,
                raw,
                descendant_types,
            }),
            Vec::new(),
        )
    }

    pub fn id(&self) -> SegmentId {
        self.0.id
    }

    /// Same node, not merely equal content.
    pub fn is(&self, other: &Segment) -> bool {
        self.0.id == other.0.id
    }

    pub fn marker(&self) -> &PositionMarker {
        &self.0.marker
    }

    pub fn kind(&self) -> &SegmentKind {
        &self.0.kind
    }

    pub fn source_fixes(&self) -> &[SourceFix] {
        &self.0.source_fixes
    }

    /// Source fixes on this segment and all descendants, in tree order.
    pub fn all_source_fixes(&self) -> Vec<SourceFix> {
        let mut out = self.0.source_fixes.clone();
        for child in self.children() {
            out.extend(child.all_source_fixes());
        }
        out
    }

    /// Primary type tag.
    pub fn type_tag(&self) -> &'static str {
        match &self.0.kind {
            SegmentKind::Raw(data) => data.types.first().copied().unwrap_or("raw"),
            SegmentKind::Interior(data) => data.type_tag,
            SegmentKind::Meta(kind) => kind.type_tag(),
            SegmentKind::Unparsable(_) => "unparsable",
        }
    }

    /// Grammar definition name for interior segments.
    pub fn name(&self) -> &'static str {
        match &self.0.kind {
            SegmentKind::Raw(data) => data.name,
            SegmentKind::Interior(data) => data.name,
            SegmentKind::Meta(kind) => kind.type_tag(),
            SegmentKind::Unparsable(_) => "unparsable",
        }
    }

    /// All types this segment answers to.
    pub fn class_types(&self) -> Vec<&'static str> {
        match &self.0.kind {
            SegmentKind::Raw(data) => {
                let mut types = data.types.clone();
                types.push("raw");
                types
            }
            _ => vec![self.type_tag()],
        }
    }

    pub fn is_type(&self, type_tag: &str) -> bool {
        match &self.0.kind {
            SegmentKind::Raw(data) => type_tag == "raw" || data.types.contains(&type_tag),
            _ => self.type_tag() == type_tag,
        }
    }

    pub fn is_any_type(&self, types: &[&str]) -> bool {
        types.iter().any(|t| self.is_type(t))
    }

    /// Class types present anywhere below this segment.
    pub fn descendant_type_set(&self) -> BTreeSet<&'static str> {
        match &self.0.kind {
            SegmentKind::Interior(data) => data.descendant_types.clone(),
            SegmentKind::Unparsable(data) => data.descendant_types.clone(),
            _ => BTreeSet::new(),
        }
    }

    pub fn has_descendant_type(&self, types: &BTreeSet<&str>) -> bool {
        match &self.0.kind {
            SegmentKind::Interior(InteriorData {
                descendant_types, ..
            })
            | SegmentKind::Unparsable(UnparsableData {
                descendant_types, ..
            }) => descendant_types.iter().any(|t| types.contains(t)),
            _ => false,
        }
    }

    pub fn raw(&self) -> &str {
        match &self.0.kind {
            SegmentKind::Raw(data) => &data.raw,
            SegmentKind::Interior(data) => &data.raw,
            SegmentKind::Unparsable(data) => &data.raw,
            SegmentKind::Meta(_) => "",
        }
    }

    pub fn raw_upper(&self) -> String {
        match &self.0.kind {
            SegmentKind::Raw(data) => data.raw_upper.clone(),
            _ => self.raw().to_uppercase(),
        }
    }

    /// Uppercased raw text of a leaf, without allocating.
    pub fn leaf_upper(&self) -> Option<&str> {
        match &self.0.kind {
            SegmentKind::Raw(data) => Some(&data.raw_upper),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Segment] {
        match &self.0.kind {
            SegmentKind::Interior(data) => &data.children,
            SegmentKind::Unparsable(data) => &data.children,
            _ => &[],
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self.0.kind, SegmentKind::Raw(_))
    }

    pub fn is_meta(&self) -> bool {
        matches!(self.0.kind, SegmentKind::Meta(_))
    }

    pub fn is_unparsable(&self) -> bool {
        matches!(self.0.kind, SegmentKind::Unparsable(_))
    }

    pub fn meta_kind(&self) -> Option<&MetaKind> {
        match &self.0.kind {
            SegmentKind::Meta(kind) => Some(kind),
            _ => None,
        }
    }

    /// What the parser expected, for unparsable segments.
    pub fn expected(&self) -> Option<&str> {
        match &self.0.kind {
            SegmentKind::Unparsable(data) => Some(&data.expected),
            _ => None,
        }
    }

    /// Where parsing gave up, for unparsable segments.
    pub fn unparsable_anchor(&self) -> Option<&PositionMarker> {
        match &self.0.kind {
            SegmentKind::Unparsable(data) => Some(&data.anchor),
            _ => None,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        self.is_raw() && (self.is_type("whitespace") || self.is_type("newline"))
    }

    pub fn is_comment(&self) -> bool {
        self.is_raw() && self.is_type("comment")
    }

    /// Everything except whitespace, comments and metas.
    pub fn is_code(&self) -> bool {
        match &self.0.kind {
            SegmentKind::Raw(_) => !self.is_whitespace() && !self.is_comment(),
            SegmentKind::Meta(_) => false,
            SegmentKind::Interior(_) | SegmentKind::Unparsable(_) => {
                self.children().iter().any(Segment::is_code)
            }
        }
    }

    /// Leaf with different raw text, a fresh identity and the same marker.
    pub fn edit(&self, new_raw: impl Into<String>) -> Segment {
        match &self.0.kind {
            SegmentKind::Raw(data) => {
                let raw = new_raw.into();
                Self::build(
                    SegmentId::fresh(),
                    self.0.marker.clone(),
                    SegmentKind::Raw(RawData {
                        raw_upper: raw.to_uppercase(),
                        raw,
                        types: data.types.clone(),
                        name: data.name,
                    }),
                    self.0.source_fixes.clone(),
                )
            }
            _ => self.clone(),
        }
    }

    /// Leaf carrying a source-level edit. The raw text is left untouched.
    pub fn with_source_fix(&self, fix: SourceFix) -> Segment {
        let mut source_fixes = self.0.source_fixes.clone();
        source_fixes.push(fix);
        Self::build(self.0.id, self.0.marker.clone(), self.0.kind.clone(), source_fixes)
    }

    /// Leaf with the same text and position but different types.
    pub fn retyped(&self, types: Vec<&'static str>) -> Segment {
        match &self.0.kind {
            SegmentKind::Raw(data) => Self::build(
                SegmentId::fresh(),
                self.0.marker.clone(),
                SegmentKind::Raw(RawData {
                    types,
                    ..data.clone()
                }),
                self.0.source_fixes.clone(),
            ),
            _ => self.clone(),
        }
    }

    /// Same segment (same id) with new children. Raw text and descendant
    /// types are recomputed; the marker is kept until the tree is realigned.
    pub fn with_children(&self, children: Vec<Segment>) -> Segment {
        let kind = match &self.0.kind {
            SegmentKind::Interior(data) => SegmentKind::Interior(InteriorData {
                name: data.name,
                type_tag: data.type_tag,
                raw: concat_raw(&children),
                descendant_types: collect_descendant_types(&children),
                children,
            }),
            SegmentKind::Unparsable(data) => SegmentKind::Unparsable(UnparsableData {
                expected: data.expected.clone(),
                anchor: data.anchor.clone(),
                raw: concat_raw(&children),
                descendant_types: collect_descendant_types(&children),
                children,
            }),
            _ => return self.clone(),
        };
        Self::build(self.0.id, self.0.marker.clone(), kind, self.0.source_fixes.clone())
    }

    /// Same segment (same id) at a different position.
    pub fn with_marker(&self, marker: PositionMarker) -> Segment {
        Self::build(self.0.id, marker, self.0.kind.clone(), self.0.source_fixes.clone())
    }

    /// All leaves (including metas) in order.
    pub fn raw_segments(&self) -> Vec<Segment> {
        let mut out = Vec::new();
        self.collect_raw_segments(&mut out);
        out
    }

    fn collect_raw_segments(&self, out: &mut Vec<Segment>) {
        match &self.0.kind {
            SegmentKind::Raw(_) | SegmentKind::Meta(_) => out.push(self.clone()),
            _ => {
                for child in self.children() {
                    child.collect_raw_segments(out);
                }
            }
        }
    }

    /// Segments of any of `types`, depth first, this segment included.
    ///
    /// With `recurse_into` false, matching segments are not searched further.
    pub fn recursive_crawl(&self, types: &[&str], recurse_into: bool) -> Vec<Segment> {
        let mut out = Vec::new();
        self.crawl_into(types, recurse_into, &mut out);
        out
    }

    fn crawl_into(&self, types: &[&str], recurse_into: bool, out: &mut Vec<Segment>) {
        let hit = self.is_any_type(types);
        if hit {
            out.push(self.clone());
            if !recurse_into {
                return;
            }
        }
        let wanted: BTreeSet<&str> = types.iter().copied().collect();
        if !self.has_descendant_type(&wanted) {
            return;
        }
        for child in self.children() {
            child.crawl_into(types, recurse_into, out);
        }
    }

    /// Unparsable segments in tree order, outermost first.
    pub fn iter_unparsables(&self) -> Vec<Segment> {
        self.recursive_crawl(&["unparsable"], false)
    }

    pub fn get_child(&self, type_tag: &str) -> Option<&Segment> {
        self.children().iter().find(|c| c.is_type(type_tag))
    }

    pub fn get_children(&self, type_tag: &str) -> Vec<&Segment> {
        self.children().iter().filter(|c| c.is_type(type_tag)).collect()
    }

    /// Ancestors of the segment with `id`, from this segment downwards,
    /// excluding the target itself.
    pub fn path_to(&self, id: SegmentId) -> Option<Vec<Segment>> {
        if self.id() == id {
            return Some(Vec::new());
        }
        for child in self.children() {
            if let Some(mut path) = child.path_to(id) {
                path.insert(0, self.clone());
                return Some(path);
            }
        }
        None
    }

    pub fn find(&self, id: SegmentId) -> Option<Segment> {
        if self.id() == id {
            return Some(self.clone());
        }
        self.children().iter().find_map(|c| c.find(id))
    }

    /// Recompute working locations from the first leaf onwards.
    ///
    /// Leaves advance by their raw text; parents take the working location of
    /// their first child. Source and templated slices are not changed.
    pub fn realign(&self) -> Segment {
        let start = self.marker().working_loc();
        self.realign_from(start).0
    }

    fn realign_from(&self, loc: (usize, usize)) -> (Segment, (usize, usize)) {
        match &self.0.kind {
            SegmentKind::Raw(_) | SegmentKind::Meta(_) => {
                let marker = self.marker().clone().with_working_loc(loc.0, loc.1);
                let next = PositionMarker::infer_next_position(self.raw(), loc.0, loc.1);
                (self.with_marker(marker), next)
            }
            SegmentKind::Interior(_) | SegmentKind::Unparsable(_) => {
                let mut cursor = loc;
                let mut children = Vec::with_capacity(self.children().len());
                for child in self.children() {
                    let (child, next) = child.realign_from(cursor);
                    children.push(child);
                    cursor = next;
                }
                let marker = self.marker().clone().with_working_loc(loc.0, loc.1);
                (self.with_children(children).with_marker(marker), cursor)
            }
        }
    }
}

/// Marker spanning `segments`, or `None` when empty.
pub fn span_of(segments: &[Segment]) -> Option<PositionMarker> {
    PositionMarker::from_child_markers(segments.iter().map(Segment::marker))
}

/// Raw text of `segments` concatenated.
pub fn join_raw(segments: &[Segment]) -> String {
    concat_raw(segments)
}

/// Index of the first code segment, if any.
pub fn first_code_index(segments: &[Segment]) -> Option<usize> {
    segments.iter().position(Segment::is_code)
}

/// Split `segments` into leading non-code, the code core and trailing non-code.
pub fn trim_non_code(segments: &[Segment]) -> (&[Segment], &[Segment], &[Segment]) {
    let Some(start) = first_code_index(segments) else {
        return (segments, &[], &[]);
    };
    let end = segments
        .iter()
        .rposition(Segment::is_code)
        .map_or(start + 1, |i| i + 1);
    (&segments[..start], &segments[start..end], &segments[end..])
}

fn concat_raw(children: &[Segment]) -> String {
    children.iter().map(Segment::raw).collect()
}

fn collect_descendant_types(children: &[Segment]) -> BTreeSet<&'static str> {
    let mut types = BTreeSet::new();
    for child in children {
        types.extend(child.class_types());
        types.extend(child.descendant_type_set());
    }
    types
}

impl PartialEq for Segment {
    /// Structural equality: kind, text, position. Identity is ignored.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.marker == other.0.marker
                && self.0.kind == other.0.kind
                && self.0.source_fixes == other.0.source_fixes)
    }
}

impl Eq for Segment {}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?}) {}", self.type_tag(), self.raw(), self.marker())
    }
}
