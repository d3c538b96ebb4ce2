//! Per-file parser state.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use squill_core::PositionMarker;

use crate::dialect::Dialect;
use crate::segments::{Segment, SegmentId};
use crate::{Error, Result};

use super::grammar::{Grammar, SimpleHint};
use super::match_result::MatchResult;

/// Default bound on nested segment expansion.
pub const DEFAULT_MAX_PARSE_DEPTH: usize = 255;

/// Bound on nested grammar matching, to keep the native stack in check.
const MAX_MATCH_DEPTH: usize = 1024;

/// Cache key: input run (first id, last id, length), grammar address and the
/// terminators in force.
type CacheKey = (SegmentId, SegmentId, usize, usize, Box<[usize]>);

/// Deepest point at which a required element failed to match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FurthestFailure {
    pub marker: PositionMarker,
    pub expected: String,
}

pub struct ParseContext<'a> {
    dialect: &'a Dialect,
    indentation: IndexMap<String, bool>,
    terminators: Vec<&'a Grammar>,
    match_cache: HashMap<CacheKey, MatchResult>,
    blacklist: HashSet<CacheKey>,
    simple_cache: HashMap<String, Option<SimpleHint>>,
    use_cache: bool,
    match_depth: usize,
    parse_depth: usize,
    max_parse_depth: usize,
    recurse: Option<usize>,
    furthest_failure: Option<FurthestFailure>,
}

impl<'a> ParseContext<'a> {
    pub fn new(dialect: &'a Dialect) -> Self {
        Self {
            dialect,
            indentation: IndexMap::new(),
            terminators: Vec::new(),
            match_cache: HashMap::new(),
            blacklist: HashSet::new(),
            simple_cache: HashMap::new(),
            use_cache: true,
            match_depth: 0,
            parse_depth: 0,
            max_parse_depth: DEFAULT_MAX_PARSE_DEPTH,
            recurse: None,
            furthest_failure: None,
        }
    }

    pub fn with_indentation(mut self, indentation: IndexMap<String, bool>) -> Self {
        self.indentation = indentation;
        self
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_max_parse_depth(mut self, depth: usize) -> Self {
        self.max_parse_depth = depth;
        self
    }

    /// Expand only `levels` levels below the root. Used to inspect partial parses.
    pub fn with_recurse(mut self, levels: usize) -> Self {
        self.recurse = Some(levels);
        self
    }

    pub fn dialect(&self) -> &'a Dialect {
        self.dialect
    }

    pub fn indent_config(&self, key: &str) -> bool {
        self.indentation.get(key).copied().unwrap_or(false)
    }

    pub fn terminators(&self) -> &[&'a Grammar] {
        &self.terminators
    }

    pub fn match_depth(&self) -> usize {
        self.match_depth
    }

    pub fn parse_depth(&self) -> usize {
        self.parse_depth
    }

    pub fn may_recurse(&self) -> bool {
        self.recurse.is_none_or(|levels| self.parse_depth < levels)
    }

    /// Run `f` one grammar level deeper, optionally replacing or extending
    /// the terminator stack. State is restored whatever `f` returns.
    pub fn deeper_match<T>(
        &mut self,
        name: &str,
        clear_terminators: bool,
        push_terminators: &'a [Grammar],
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if self.match_depth >= MAX_MATCH_DEPTH {
            tracing::warn!(name, depth = self.match_depth, "match depth limit reached");
            return Err(Error::RecursionLimitExceeded);
        }
        let saved = if clear_terminators || !push_terminators.is_empty() {
            let saved = self.terminators.clone();
            if clear_terminators {
                self.terminators.clear();
            }
            self.terminators.extend(push_terminators.iter());
            Some(saved)
        } else {
            None
        };
        self.match_depth += 1;
        tracing::trace!(name, depth = self.match_depth, "match");
        let result = f(self);
        self.match_depth -= 1;
        if let Some(saved) = saved {
            self.terminators = saved;
        }
        result
    }

    /// Run `f` one segment expansion deeper.
    pub fn deeper_parse<T>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.parse_depth >= self.max_parse_depth {
            tracing::warn!(name, depth = self.parse_depth, "parse depth limit reached");
            return Err(Error::RecursionLimitExceeded);
        }
        let saved_terminators = std::mem::take(&mut self.terminators);
        self.parse_depth += 1;
        tracing::trace!(name, depth = self.parse_depth, "parse");
        let result = f(self);
        self.parse_depth -= 1;
        self.terminators = saved_terminators;
        result
    }

    pub(crate) fn cache_key(&self, segments: &[Segment], grammar: &Grammar) -> Option<CacheKey> {
        let (first, last) = (segments.first()?, segments.last()?);
        let terminators = self
            .terminators
            .iter()
            .map(|t| std::ptr::from_ref::<Grammar>(t) as usize)
            .collect();
        Some((
            first.id(),
            last.id(),
            segments.len(),
            std::ptr::from_ref(grammar) as usize,
            terminators,
        ))
    }

    pub(crate) fn check_cache(&self, key: &CacheKey) -> Option<MatchResult> {
        if !self.use_cache {
            return None;
        }
        self.match_cache.get(key).cloned()
    }

    pub(crate) fn is_blacklisted(&self, key: &CacheKey) -> bool {
        self.use_cache && self.blacklist.contains(key)
    }

    pub(crate) fn store(&mut self, key: CacheKey, result: &MatchResult) {
        if !self.use_cache {
            return;
        }
        if result.has_match() {
            self.match_cache.insert(key, result.clone());
        } else {
            self.blacklist.insert(key);
        }
    }

    pub(crate) fn cached_simple(&self, name: &str) -> Option<&Option<SimpleHint>> {
        self.simple_cache.get(name)
    }

    pub(crate) fn store_simple(&mut self, name: &str, hint: Option<SimpleHint>) {
        self.simple_cache.insert(name.to_string(), hint);
    }

    /// Forget no-match results and the furthest failure. Called once per
    /// segment expansion.
    pub(crate) fn reset_for_parse(&mut self) {
        self.blacklist.clear();
        self.furthest_failure = None;
    }

    pub fn furthest_failure(&self) -> Option<&FurthestFailure> {
        self.furthest_failure.as_ref()
    }

    /// Remember a failure if it lies beyond every failure seen so far.
    pub(crate) fn record_failure(&mut self, marker: PositionMarker, expected: String) {
        let further = self.furthest_failure.as_ref().is_none_or(|current| {
            marker.templated_slice().start > current.marker.templated_slice().start
        });
        if further {
            tracing::trace!(%expected, at = marker.templated_slice().start, "furthest failure");
            self.furthest_failure = Some(FurthestFailure { marker, expected });
        }
    }
}
