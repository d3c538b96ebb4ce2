//! The rule interface and rule selection.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use squill_core::TemplatedFile;

use crate::dialect::Dialect;
use crate::segments::Segment;

use super::config::LinterConfig;
use super::fix::LintFix;

/// Which segments a rule is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlBehaviour {
    /// Only the file segment.
    RootOnly,
    /// Every segment answering to one of `types`. With `allow_recurse`
    /// false, matching segments are not searched further.
    SegmentSeeker {
        types: BTreeSet<&'static str>,
        allow_recurse: bool,
    },
}

impl CrawlBehaviour {
    pub fn seeker(types: &[&'static str]) -> Self {
        CrawlBehaviour::SegmentSeeker {
            types: types.iter().copied().collect(),
            allow_recurse: true,
        }
    }

    pub fn passes_filter(&self, segment: &Segment) -> bool {
        match self {
            CrawlBehaviour::RootOnly => true,
            CrawlBehaviour::SegmentSeeker { types, .. } => segment
                .class_types()
                .iter()
                .any(|t| types.contains(t)),
        }
    }
}

/// What a rule sees at each segment it is shown.
pub struct RuleContext<'a> {
    pub segment: &'a Segment,
    /// Ancestors of `segment`, root first.
    pub parent_stack: &'a [Segment],
    /// Index of `segment` among its parent's children.
    pub segment_idx: usize,
    /// Leaves preceding `segment` in the file.
    pub raw_stack: &'a [Segment],
    /// State the rule returned from an earlier call in this crawl.
    pub memory: Option<&'a (dyn Any + Send)>,
    pub config: &'a LinterConfig,
    pub dialect: &'a Dialect,
    pub templated_file: &'a Arc<TemplatedFile>,
}

impl<'a> RuleContext<'a> {
    pub fn parent(&self) -> Option<&'a Segment> {
        self.parent_stack.last()
    }

    pub fn siblings_pre(&self) -> &'a [Segment] {
        match self.parent() {
            Some(parent) => &parent.children()[..self.segment_idx],
            None => &[],
        }
    }

    pub fn siblings_post(&self) -> &'a [Segment] {
        match self.parent() {
            Some(parent) => parent.children().get(self.segment_idx + 1..).unwrap_or(&[]),
            None => &[],
        }
    }

    /// Memory downcast to the rule's own type.
    pub fn memory_as<T: 'static>(&self) -> Option<&'a T> {
        self.memory.and_then(|m| m.downcast_ref::<T>())
    }
}

/// One finding, or just updated memory when `anchor` is `None`.
#[derive(Default)]
pub struct LintResult {
    pub anchor: Option<Segment>,
    pub fixes: Vec<LintFix>,
    pub description: Option<String>,
    pub memory: Option<Box<dyn Any + Send>>,
}

impl LintResult {
    pub fn new(anchor: &Segment) -> Self {
        Self {
            anchor: Some(anchor.clone()),
            ..Self::default()
        }
    }

    pub fn memory_only(memory: impl Any + Send) -> Self {
        Self {
            memory: Some(Box::new(memory)),
            ..Self::default()
        }
    }

    pub fn with_fixes(mut self, fixes: Vec<LintFix>) -> Self {
        self.fixes = fixes;
        self
    }

    pub fn with_fix(mut self, fix: LintFix) -> Self {
        self.fixes.push(fix);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_memory(mut self, memory: impl Any + Send) -> Self {
        self.memory = Some(Box::new(memory));
        self
    }
}

impl fmt::Debug for LintResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LintResult")
            .field("anchor", &self.anchor)
            .field("fixes", &self.fixes)
            .field("description", &self.description)
            .field("memory", &self.memory.is_some())
            .finish()
    }
}

/// A lint rule. Rules are stateless; per-file state travels in memory.
pub trait Rule: Send + Sync {
    /// Short code such as `L010`.
    fn code(&self) -> &'static str;

    /// Dotted name such as `capitalisation.keywords`.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn groups(&self) -> &'static [&'static str] {
        &["all"]
    }

    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Config keys the rule reads.
    fn config_keywords(&self) -> &'static [&'static str] {
        &[]
    }

    fn crawl_behaviour(&self) -> CrawlBehaviour;

    /// Whether findings anchored inside templated code are kept.
    fn targets_templated(&self) -> bool {
        false
    }

    fn eval(&self, context: &RuleContext<'_>) -> Vec<LintResult>;
}

/// Every selector a rule answers to, mapped to the codes it selects.
pub fn reference_map(rules: &[Box<dyn Rule>]) -> BTreeMap<String, BTreeSet<String>> {
    let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for rule in rules {
        let code = rule.code().to_string();
        let keys = std::iter::once(rule.code())
            .chain(std::iter::once(rule.name()))
            .chain(rule.aliases().iter().copied())
            .chain(rule.groups().iter().copied());
        for key in keys {
            map.entry(key.to_string()).or_default().insert(code.clone());
        }
    }
    map
}

/// Codes selected by `selectors`, each an exact key or a glob over keys.
///
/// A selector that selects nothing is returned as is, so pseudo codes such
/// as `PRS` survive expansion.
pub fn expand_selectors<'s>(
    selectors: impl IntoIterator<Item = &'s str>,
    reference_map: &BTreeMap<String, BTreeSet<String>>,
) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for selector in selectors {
        let selector = selector.trim();
        if selector.is_empty() {
            continue;
        }
        let pattern = glob::Pattern::new(selector).ok();
        let mut matched = false;
        for (key, codes) in reference_map {
            let hit = key == selector || pattern.as_ref().is_some_and(|p| p.matches(key));
            if hit {
                out.extend(codes.iter().cloned());
                matched = true;
            }
        }
        if !matched {
            out.insert(selector.to_string());
        }
    }
    out
}

/// Rules enabled by `config`, ordered by code.
pub fn select_rules(rules: Vec<Box<dyn Rule>>, config: &LinterConfig) -> Vec<Box<dyn Rule>> {
    let map = reference_map(&rules);
    let included = (!config.rules.is_empty())
        .then(|| expand_selectors(config.rules.iter().map(String::as_str), &map));
    let excluded = expand_selectors(config.exclude_rules.iter().map(String::as_str), &map);
    let mut selected: Vec<Box<dyn Rule>> = rules
        .into_iter()
        .filter(|rule| included.as_ref().is_none_or(|inc| inc.contains(rule.code())))
        .filter(|rule| !excluded.contains(rule.code()))
        .collect();
    selected.sort_by(|a, b| a.code().cmp(b.code()));
    tracing::debug!(
        rules = ?selected.iter().map(|r| r.code()).collect::<Vec<_>>(),
        "rules selected"
    );
    selected
}
