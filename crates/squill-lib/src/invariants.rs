//! Invariant checks excluded from coverage reports.

#![cfg_attr(coverage_nightly, coverage(off))]

use crate::segments::Segment;

impl Segment {
    /// The tree must stringify back to the text it was parsed from.
    #[inline]
    pub(crate) fn ensure_round_trip(&self, templated: &str) {
        assert!(
            self.raw() == templated,
            "Segment: tree of {} bytes does not reproduce templated input of {} bytes \
             (a grammar dropped or duplicated tokens)",
            self.raw().len(),
            templated.len(),
        );
    }
}
