//! Invariant checks excluded from coverage reports.

#![cfg_attr(coverage_nightly, coverage(off))]

use std::ops::Range;

use crate::{PositionMarker, TemplatedFile};

impl PositionMarker {
    #[inline]
    pub(crate) fn ensure_slices(
        source_slice: &Range<usize>,
        templated_slice: &Range<usize>,
        templated_file: &TemplatedFile,
    ) {
        assert!(
            source_slice.start <= source_slice.end
                && source_slice.end <= templated_file.source_str().len(),
            "PositionMarker: source slice {source_slice:?} outside source of length {} \
             (caller must derive slices from the same file)",
            templated_file.source_str().len(),
        );
        assert!(
            templated_slice.start <= templated_slice.end
                && templated_slice.end <= templated_file.templated_str().len(),
            "PositionMarker: templated slice {templated_slice:?} outside output of length {} \
             (caller must derive slices from the same file)",
            templated_file.templated_str().len(),
        );
    }
}
