//! Templated file model.
//!
//! A [`TemplatedFile`] pairs the source string (what the user wrote) with
//! the templated string (what the parser lexes). Two ordered slice lists
//! connect them:
//! - `raw_sliced` tiles the **source** into literal and template pieces.
//! - `sliced_file` tiles the **templated output**, each piece pointing back
//!   at the source slice it was rendered from.
//!
//! Untemplated input is the degenerate case: one literal slice in each list.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::{Result, TemplateError};

/// What a slice of the source (or templated output) was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceType {
    Literal,
    Templated,
    BlockStart,
    BlockEnd,
    BlockMid,
    Comment,
}

impl SliceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Literal => "literal",
            Self::Templated => "templated",
            Self::BlockStart => "block_start",
            Self::BlockEnd => "block_end",
            Self::BlockMid => "block_mid",
            Self::Comment => "comment",
        }
    }

    /// Slices of this kind render to nothing in the templated output.
    pub fn is_source_only(&self) -> bool {
        matches!(
            self,
            Self::Comment | Self::BlockStart | Self::BlockEnd | Self::BlockMid
        )
    }
}

impl fmt::Display for SliceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contiguous piece of the source string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSlice {
    pub raw: String,
    pub slice_type: SliceType,
    /// Byte offset of `raw` in the source string.
    pub source_idx: usize,
    /// Incremented on block start/end tags; groups slices by control block.
    #[serde(default)]
    pub block_idx: usize,
}

impl RawSlice {
    pub fn new(raw: impl Into<String>, slice_type: SliceType, source_idx: usize) -> Self {
        Self {
            raw: raw.into(),
            slice_type,
            source_idx,
            block_idx: 0,
        }
    }

    pub fn with_block_idx(mut self, block_idx: usize) -> Self {
        self.block_idx = block_idx;
        self
    }

    pub fn end_source_idx(&self) -> usize {
        self.source_idx + self.raw.len()
    }

    pub fn source_slice(&self) -> Range<usize> {
        self.source_idx..self.end_source_idx()
    }

    pub fn is_source_only(&self) -> bool {
        self.slice_type.is_source_only()
    }
}

/// A contiguous piece of the templated output and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatedSlice {
    pub slice_type: SliceType,
    pub source_slice: Range<usize>,
    pub templated_slice: Range<usize>,
}

impl TemplatedSlice {
    pub fn new(
        slice_type: SliceType,
        source_slice: Range<usize>,
        templated_slice: Range<usize>,
    ) -> Self {
        Self {
            slice_type,
            source_slice,
            templated_slice,
        }
    }
}

/// A (possibly) templated SQL file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatedFile {
    source_str: String,
    templated_str: String,
    fname: String,
    sliced_file: Vec<TemplatedSlice>,
    raw_sliced: Vec<RawSlice>,
    source_newlines: Vec<usize>,
    templated_newlines: Vec<usize>,
}

impl TemplatedFile {
    /// Build a templated file, checking that both slice lists tile their strings.
    ///
    /// When `templated_str` is `None` the file is untemplated and the slice
    /// lists must also be `None`; a single literal slice is synthesised.
    pub fn new(
        source_str: impl Into<String>,
        fname: impl Into<String>,
        templated_str: Option<String>,
        sliced_file: Option<Vec<TemplatedSlice>>,
        raw_sliced: Option<Vec<RawSlice>>,
    ) -> Result<Self> {
        let source_str = source_str.into();
        let fname = fname.into();

        let (templated_str, sliced_file, raw_sliced) = match (templated_str, sliced_file, raw_sliced)
        {
            (templated, None, None) => {
                let templated = templated.unwrap_or_else(|| source_str.clone());
                if templated != source_str {
                    return Err(TemplateError::Unsliced);
                }
                let len = source_str.len();
                let sliced = vec![TemplatedSlice::new(SliceType::Literal, 0..len, 0..len)];
                let raw = vec![RawSlice::new(source_str.clone(), SliceType::Literal, 0)];
                (templated, sliced, raw)
            }
            (templated, Some(sliced), Some(raw)) => {
                (templated.unwrap_or_else(|| source_str.clone()), sliced, raw)
            }
            _ => return Err(TemplateError::Unsliced),
        };

        check_raw_slices(&source_str, &raw_sliced)?;
        check_templated_slices(&templated_str, &sliced_file)?;

        Ok(Self {
            source_newlines: newline_indices(&source_str),
            templated_newlines: newline_indices(&templated_str),
            source_str,
            templated_str,
            fname,
            sliced_file,
            raw_sliced,
        })
    }

    /// An untemplated file read from a string.
    pub fn from_string(raw: impl Into<String>) -> Self {
        let source_str = raw.into();
        let len = source_str.len();
        Self {
            source_newlines: newline_indices(&source_str),
            templated_newlines: newline_indices(&source_str),
            templated_str: source_str.clone(),
            sliced_file: vec![TemplatedSlice::new(SliceType::Literal, 0..len, 0..len)],
            raw_sliced: vec![RawSlice::new(source_str.clone(), SliceType::Literal, 0)],
            source_str,
            fname: "<string>".to_string(),
        }
    }

    pub fn with_fname(mut self, fname: impl Into<String>) -> Self {
        self.fname = fname.into();
        self
    }

    pub fn source_str(&self) -> &str {
        &self.source_str
    }

    pub fn templated_str(&self) -> &str {
        &self.templated_str
    }

    pub fn fname(&self) -> &str {
        &self.fname
    }

    pub fn sliced_file(&self) -> &[TemplatedSlice] {
        &self.sliced_file
    }

    pub fn raw_sliced(&self) -> &[RawSlice] {
        &self.raw_sliced
    }

    /// True if any part of the output came from something other than a literal.
    pub fn is_templated(&self) -> bool {
        self.raw_sliced
            .iter()
            .any(|s| s.slice_type != SliceType::Literal)
    }

    /// Line number and (1-indexed, character based) column of a byte offset.
    pub fn get_line_pos_of_char_pos(&self, char_pos: usize, source: bool) -> (usize, usize) {
        let (text, newlines) = if source {
            (&self.source_str, &self.source_newlines)
        } else {
            (&self.templated_str, &self.templated_newlines)
        };
        let nl_idx = newlines.partition_point(|&nl| nl < char_pos);
        let line_start = if nl_idx > 0 {
            newlines[nl_idx - 1] + 1
        } else {
            0
        };
        let column = text
            .get(line_start..char_pos)
            .map(|s| s.chars().count())
            .unwrap_or(char_pos.saturating_sub(line_start));
        (nl_idx + 1, column + 1)
    }

    /// Indices `[first, last)` of the templated slices touching `templated_pos`.
    fn find_slice_indices_of_templated_pos(
        &self,
        templated_pos: usize,
        start_idx: usize,
        inclusive: bool,
    ) -> (usize, usize) {
        let mut first_idx = None;
        let mut last_idx = start_idx;
        let mut stopped_early = false;
        for (offset, elem) in self.sliced_file.iter().enumerate().skip(start_idx) {
            last_idx = offset;
            if elem.templated_slice.end >= templated_pos {
                if first_idx.is_none() {
                    first_idx = Some(offset);
                }
                if elem.templated_slice.start > templated_pos
                    || (!inclusive && elem.templated_slice.start >= templated_pos)
                {
                    stopped_early = true;
                    break;
                }
            }
        }
        if !stopped_early {
            last_idx += 1;
        }
        (first_idx.unwrap_or(self.sliced_file.len()), last_idx)
    }

    /// Raw slices overlapping a range of the source.
    ///
    /// A range at (or past) the end of the file spans nothing.
    pub fn raw_slices_spanning_source_slice(&self, source_slice: Range<usize>) -> &[RawSlice] {
        let Some(last) = self.raw_sliced.last() else {
            return &[];
        };
        if source_slice.start >= last.end_source_idx() {
            return &[];
        }
        let mut idx = 0;
        while idx + 1 < self.raw_sliced.len()
            && self.raw_sliced[idx + 1].source_idx <= source_slice.start
        {
            idx += 1;
        }
        let mut span = 1;
        while idx + span < self.raw_sliced.len()
            && self.raw_sliced[idx + span].source_idx < source_slice.end
        {
            span += 1;
        }
        &self.raw_sliced[idx..idx + span]
    }

    /// Map a range of the templated output back onto the source.
    ///
    /// Literal slices map exactly; templated slices map greedily onto the
    /// whole source expression that produced them.
    pub fn templated_slice_to_source_slice(&self, template_slice: Range<usize>) -> Range<usize> {
        if self.sliced_file.is_empty() {
            return template_slice;
        }

        let (start_first, start_last) =
            self.find_slice_indices_of_templated_pos(template_slice.start, 0, true);
        let touching = self.sliced_file.get(start_first..start_last).unwrap_or(&[]);

        // Lowest source offset of any slice boundary sitting exactly on our start.
        let mut insertion_point: Option<usize> = None;
        for elem in touching {
            for (templated, source) in [
                (elem.templated_slice.start, elem.source_slice.start),
                (elem.templated_slice.end, elem.source_slice.end),
            ] {
                if templated == template_slice.start {
                    insertion_point = Some(insertion_point.map_or(source, |p| p.min(source)));
                }
            }
        }

        if template_slice.start == template_slice.end {
            if let Some(point) = insertion_point {
                return point..point;
            }
            return match touching.first() {
                Some(first) if first.slice_type == SliceType::Literal => {
                    let point =
                        first.source_slice.start + (template_slice.start - first.templated_slice.start);
                    point..point
                }
                Some(first) => first.source_slice.start..first.source_slice.start,
                None => self.source_str.len()..self.source_str.len(),
            };
        }

        let (stop_first, stop_last) =
            self.find_slice_indices_of_templated_pos(template_slice.end, 0, false);

        let mut adjusted_first = start_first;
        if let Some(point) = insertion_point {
            for elem in self.sliced_file.iter().skip(start_first) {
                if elem.source_slice.start == point {
                    break;
                }
                adjusted_first += 1;
            }
        }

        let start_slices = match self.sliced_file.get(adjusted_first..start_last) {
            Some(slices) if !slices.is_empty() => slices,
            _ if !touching.is_empty() => touching,
            _ => &self.sliced_file[self.sliced_file.len() - 1..],
        };
        let stop_slices = match self.sliced_file.get(stop_first..stop_last) {
            Some(slices) if !slices.is_empty() => slices,
            _ => {
                let idx = stop_first.min(self.sliced_file.len() - 1);
                &self.sliced_file[idx..=idx]
            }
        };

        let first = &start_slices[0];
        let source_start = if let Some(point) = insertion_point {
            point
        } else if first.slice_type == SliceType::Literal {
            first.source_slice.start + (template_slice.start - first.templated_slice.start)
        } else {
            first.source_slice.start
        };

        let last = &stop_slices[stop_slices.len() - 1];
        let source_stop = if last.slice_type == SliceType::Literal {
            last.source_slice.end - last.templated_slice.end.saturating_sub(template_slice.end)
        } else {
            last.source_slice.end
        };

        if source_start > source_stop {
            // Loops and templated tails can invert the span; take the widest.
            let lo = start_first.min(stop_first);
            let hi = start_last.max(stop_last).min(self.sliced_file.len());
            let subslices = &self.sliced_file[lo.min(hi)..hi];
            let start = subslices.iter().map(|s| s.source_slice.start).min();
            let stop = subslices.iter().map(|s| s.source_slice.end).max();
            if let (Some(start), Some(stop)) = (start, stop) {
                return start..stop;
            }
            return source_stop..source_start;
        }

        source_start..source_stop
    }

    /// Whether a source range lies entirely within literal slices.
    pub fn is_source_slice_literal(&self, source_slice: Range<usize>) -> bool {
        if self.raw_sliced.is_empty() || source_slice.start == source_slice.end {
            return true;
        }
        let mut is_literal = true;
        for raw_slice in &self.raw_sliced {
            if raw_slice.source_idx <= source_slice.start {
                is_literal = raw_slice.slice_type == SliceType::Literal;
            } else if raw_slice.source_idx >= source_slice.end {
                break;
            } else if raw_slice.slice_type != SliceType::Literal {
                is_literal = false;
            }
        }
        is_literal
    }

    /// Slices which exist only in the source (tags, comments), in order.
    pub fn source_only_slices(&self) -> Vec<&RawSlice> {
        self.raw_sliced
            .iter()
            .filter(|s| s.is_source_only())
            .collect()
    }

    /// True if `offset` sits strictly inside a non-literal templated slice.
    pub fn is_inside_templated_span(&self, templated_offset: usize) -> bool {
        self.sliced_file.iter().any(|s| {
            s.slice_type != SliceType::Literal
                && s.templated_slice.start < templated_offset
                && templated_offset < s.templated_slice.end
        })
    }

    /// True if `offset` sits strictly inside a non-literal raw slice.
    pub fn is_inside_source_template(&self, source_offset: usize) -> bool {
        self.raw_sliced.iter().any(|s| {
            s.slice_type != SliceType::Literal
                && s.source_idx < source_offset
                && source_offset < s.end_source_idx()
        })
    }
}

impl fmt::Display for TemplatedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.templated_str)
    }
}

fn newline_indices(s: &str) -> Vec<usize> {
    s.match_indices('\n').map(|(idx, _)| idx).collect()
}

fn check_raw_slices(source_str: &str, raw_sliced: &[RawSlice]) -> Result<()> {
    let mut pos = 0;
    for slice in raw_sliced {
        if slice.source_idx != pos {
            return Err(TemplateError::InconsistentRawSlices(format!(
                "running source length {pos} != {}",
                slice.source_idx
            )));
        }
        pos += slice.raw.len();
    }
    if pos != source_str.len() {
        return Err(TemplateError::InconsistentRawSlices(format!(
            "total source length {pos} != {}",
            source_str.len()
        )));
    }
    Ok(())
}

fn check_templated_slices(templated_str: &str, sliced_file: &[TemplatedSlice]) -> Result<()> {
    let mut previous: Option<&TemplatedSlice> = None;
    for slice in sliced_file {
        match previous {
            Some(prev) if slice.templated_slice.start != prev.templated_slice.end => {
                return Err(TemplateError::InconsistentTemplatedSlices(format!(
                    "{:?} does not follow {:?}",
                    slice.templated_slice, prev.templated_slice
                )));
            }
            None if slice.templated_slice.start != 0 => {
                return Err(TemplateError::InconsistentTemplatedSlices(format!(
                    "first slice starts at {}",
                    slice.templated_slice.start
                )));
            }
            _ => {}
        }
        previous = Some(slice);
    }
    if let Some(last) = previous
        && last.templated_slice.end != templated_str.len()
    {
        return Err(TemplateError::InconsistentTemplatedSlices(format!(
            "output length {} != final slice end {}",
            templated_str.len(),
            last.templated_slice.end
        )));
    }
    Ok(())
}
