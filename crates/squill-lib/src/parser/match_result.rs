use crate::segments::Segment;

/// Outcome of a match: the consumed prefix and the rest.
///
/// `matched ++ unmatched` always has the same raw text as the input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchResult {
    pub matched: Vec<Segment>,
    pub unmatched: Vec<Segment>,
}

impl MatchResult {
    pub fn new(matched: Vec<Segment>, unmatched: Vec<Segment>) -> Self {
        Self { matched, unmatched }
    }

    pub fn from_matched(matched: Vec<Segment>) -> Self {
        Self {
            matched,
            unmatched: Vec::new(),
        }
    }

    pub fn from_unmatched(unmatched: Vec<Segment>) -> Self {
        Self {
            matched: Vec::new(),
            unmatched,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Consumed something and left nothing.
    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty() && !self.matched.is_empty()
    }

    pub fn has_match(&self) -> bool {
        !self.matched.is_empty()
    }

    pub fn matched_len(&self) -> usize {
        self.matched.len()
    }

    pub fn raw_matched(&self) -> String {
        crate::segments::join_raw(&self.matched)
    }

    /// Every segment, matched first.
    pub fn all_segments(&self) -> Vec<Segment> {
        let mut all = self.matched.clone();
        all.extend(self.unmatched.iter().cloned());
        all
    }

    /// Append `other`'s matched segments and take its unmatched ones.
    pub fn concat(mut self, other: MatchResult) -> MatchResult {
        self.matched.extend(other.matched);
        self.unmatched = other.unmatched;
        self
    }
}
