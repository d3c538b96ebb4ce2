//! Position markers.
//!
//! A marker locates a segment in both the source and the templated string.
//! It also carries a *working* line/column: the location the segment would
//! have in the templated output as it currently stands, which drifts from the
//! original location once fixes start inserting and deleting text.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::TemplatedFile;

#[derive(Clone)]
pub struct PositionMarker {
    source_slice: Range<usize>,
    templated_slice: Range<usize>,
    templated_file: Arc<TemplatedFile>,
    working_line_no: usize,
    working_line_pos: usize,
}

impl PositionMarker {
    /// Create a marker. Without an explicit working location, the templated
    /// location of the start of `templated_slice` is used.
    pub fn new(
        source_slice: Range<usize>,
        templated_slice: Range<usize>,
        templated_file: Arc<TemplatedFile>,
        working_loc: Option<(usize, usize)>,
    ) -> Self {
        Self::ensure_slices(&source_slice, &templated_slice, &templated_file);
        let (working_line_no, working_line_pos) = working_loc.unwrap_or_else(|| {
            templated_file.get_line_pos_of_char_pos(templated_slice.start, false)
        });
        Self {
            source_slice,
            templated_slice,
            templated_file,
            working_line_no,
            working_line_pos,
        }
    }

    /// A zero-length marker at the given source and templated offsets.
    pub fn from_point(
        source_point: usize,
        templated_point: usize,
        templated_file: Arc<TemplatedFile>,
        working_loc: Option<(usize, usize)>,
    ) -> Self {
        Self::new(
            source_point..source_point,
            templated_point..templated_point,
            templated_file,
            working_loc,
        )
    }

    /// Marker spanning from the first to the last of `markers`.
    ///
    /// Working location is taken from the first marker.
    pub fn from_child_markers<'a>(
        markers: impl IntoIterator<Item = &'a PositionMarker>,
    ) -> Option<Self> {
        let mut iter = markers.into_iter();
        let first = iter.next()?;
        let mut source_slice = first.source_slice.clone();
        let mut templated_slice = first.templated_slice.clone();
        for marker in iter {
            source_slice.start = source_slice.start.min(marker.source_slice.start);
            source_slice.end = source_slice.end.max(marker.source_slice.end);
            templated_slice.start = templated_slice.start.min(marker.templated_slice.start);
            templated_slice.end = templated_slice.end.max(marker.templated_slice.end);
        }
        Some(Self {
            source_slice,
            templated_slice,
            templated_file: Arc::clone(&first.templated_file),
            working_line_no: first.working_line_no,
            working_line_pos: first.working_line_pos,
        })
    }

    pub fn source_slice(&self) -> Range<usize> {
        self.source_slice.clone()
    }

    pub fn templated_slice(&self) -> Range<usize> {
        self.templated_slice.clone()
    }

    pub fn templated_file(&self) -> &Arc<TemplatedFile> {
        &self.templated_file
    }

    pub fn working_loc(&self) -> (usize, usize) {
        (self.working_line_no, self.working_line_pos)
    }

    pub fn working_line_no(&self) -> usize {
        self.working_line_no
    }

    pub fn working_line_pos(&self) -> usize {
        self.working_line_pos
    }

    pub fn with_working_loc(mut self, line_no: usize, line_pos: usize) -> Self {
        self.working_line_no = line_no;
        self.working_line_pos = line_pos;
        self
    }

    /// Line and column of the start of this marker in the source.
    pub fn source_position(&self) -> (usize, usize) {
        self.templated_file
            .get_line_pos_of_char_pos(self.source_slice.start, true)
    }

    /// Line and column of the start of this marker in the templated output.
    pub fn templated_position(&self) -> (usize, usize) {
        self.templated_file
            .get_line_pos_of_char_pos(self.templated_slice.start, false)
    }

    pub fn line_no(&self) -> usize {
        self.source_position().0
    }

    pub fn line_pos(&self) -> usize {
        self.source_position().1
    }

    /// Text of the templated output covered by this marker.
    pub fn templated_text(&self) -> &str {
        self.templated_file
            .templated_str()
            .get(self.templated_slice.clone())
            .unwrap_or("")
    }

    /// Text of the source covered by this marker.
    pub fn source_text(&self) -> &str {
        self.templated_file
            .source_str()
            .get(self.source_slice.clone())
            .unwrap_or("")
    }

    pub fn is_point(&self) -> bool {
        self.source_slice.is_empty() && self.templated_slice.is_empty()
    }

    /// Source and templated spans agree in length and lie wholly in literal text.
    pub fn is_literal(&self) -> bool {
        self.source_slice.len() == self.templated_slice.len()
            && self
                .templated_file
                .is_source_slice_literal(self.source_slice.clone())
    }

    /// Working location just after `raw`, starting from `(line_no, line_pos)`.
    pub fn infer_next_position(raw: &str, line_no: usize, line_pos: usize) -> (usize, usize) {
        match raw.rsplit_once('\n') {
            Some((head, tail)) => (
                line_no + head.matches('\n').count() + 1,
                tail.chars().count() + 1,
            ),
            None => (line_no, line_pos + raw.chars().count()),
        }
    }

    /// Zero-length marker at the start of this one.
    pub fn start_point_marker(&self) -> Self {
        Self {
            source_slice: self.source_slice.start..self.source_slice.start,
            templated_slice: self.templated_slice.start..self.templated_slice.start,
            templated_file: Arc::clone(&self.templated_file),
            working_line_no: self.working_line_no,
            working_line_pos: self.working_line_pos,
        }
    }

    /// Zero-length marker at the end of this one.
    pub fn end_point_marker(&self) -> Self {
        let (line_no, line_pos) = Self::infer_next_position(
            self.templated_text(),
            self.working_line_no,
            self.working_line_pos,
        );
        Self {
            source_slice: self.source_slice.end..self.source_slice.end,
            templated_slice: self.templated_slice.end..self.templated_slice.end,
            templated_file: Arc::clone(&self.templated_file),
            working_line_no: line_no,
            working_line_pos: line_pos,
        }
    }

    /// Marker covering `raw` immediately after this one.
    ///
    /// Both slices start at this marker's ends and extend by `raw.len()`.
    pub fn advance_by(&self, raw: &str) -> Self {
        let end = self.end_point_marker();
        Self {
            source_slice: end.source_slice.start..end.source_slice.start + raw.len(),
            templated_slice: end.templated_slice.start..end.templated_slice.start + raw.len(),
            ..end
        }
    }

    /// True if this marker starts at or after the end of `other` in the templated output.
    pub fn is_after(&self, other: &PositionMarker) -> bool {
        self.templated_slice.start >= other.templated_slice.end
    }
}

impl PartialEq for PositionMarker {
    fn eq(&self, other: &Self) -> bool {
        self.source_slice == other.source_slice
            && self.templated_slice == other.templated_slice
            && self.working_line_no == other.working_line_no
            && self.working_line_pos == other.working_line_pos
    }
}

impl Eq for PositionMarker {}

impl fmt::Debug for PositionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionMarker")
            .field("source_slice", &self.source_slice)
            .field("templated_slice", &self.templated_slice)
            .field("working_loc", &self.working_loc())
            .finish()
    }
}

impl fmt::Display for PositionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line_no, line_pos) = self.working_loc();
        write!(f, "[L:{line_no:3}, P:{line_pos:3}]")
    }
}
