//! Walks a tree on behalf of one rule.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use squill_core::TemplatedFile;

use crate::dialect::Dialect;
use crate::segments::Segment;

use super::config::LinterConfig;
use super::rule::{CrawlBehaviour, LintResult, Rule, RuleContext};

/// Everything a rule sees besides the segment itself.
pub struct CrawlEnv<'a> {
    pub config: &'a LinterConfig,
    pub dialect: &'a Dialect,
    pub templated_file: &'a Arc<TemplatedFile>,
}

/// Run `rule` over `tree`. A panic inside the rule is returned as its message.
pub fn crawl(
    rule: &dyn Rule,
    tree: &Segment,
    env: &CrawlEnv<'_>,
) -> Result<Vec<LintResult>, String> {
    catch_unwind(AssertUnwindSafe(|| {
        let mut crawler = Crawler {
            rule,
            env,
            behaviour: rule.crawl_behaviour(),
            memory: None,
            raw_stack: Vec::new(),
            results: Vec::new(),
        };
        let mut parents = Vec::new();
        crawler.visit(tree, &mut parents, 0);
        crawler.results
    }))
    .map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "rule panicked".to_string()
    }
}

struct Crawler<'r, 'e> {
    rule: &'r dyn Rule,
    env: &'r CrawlEnv<'e>,
    behaviour: CrawlBehaviour,
    memory: Option<Box<dyn Any + Send>>,
    raw_stack: Vec<Segment>,
    results: Vec<LintResult>,
}

impl Crawler<'_, '_> {
    fn visit(&mut self, segment: &Segment, parents: &mut Vec<Segment>, idx: usize) {
        let (eval_here, descend) = match &self.behaviour {
            CrawlBehaviour::RootOnly => (parents.is_empty(), false),
            CrawlBehaviour::SegmentSeeker {
                types,
                allow_recurse,
            } => {
                let hit = self.behaviour.passes_filter(segment);
                let below = segment.has_descendant_type(types);
                (hit, below && (*allow_recurse || !hit))
            }
        };

        if eval_here {
            self.eval(segment, parents, idx);
        }

        if descend {
            parents.push(segment.clone());
            for (i, child) in segment.children().iter().enumerate() {
                self.visit(child, parents, i);
            }
            parents.pop();
        } else if segment.is_raw() || segment.is_meta() {
            self.raw_stack.push(segment.clone());
        } else {
            self.raw_stack.extend(segment.raw_segments());
        }
    }

    fn eval(&mut self, segment: &Segment, parents: &[Segment], idx: usize) {
        let context = RuleContext {
            segment,
            parent_stack: parents,
            segment_idx: idx,
            raw_stack: &self.raw_stack,
            memory: self.memory.as_deref(),
            config: self.env.config,
            dialect: self.env.dialect,
            templated_file: self.env.templated_file,
        };
        let results = self.rule.eval(&context);
        for mut result in results {
            if let Some(memory) = result.memory.take() {
                self.memory = Some(memory);
            }
            if result.anchor.is_some() {
                tracing::trace!(
                    rule = self.rule.code(),
                    anchor = ?result.anchor,
                    fixes = result.fixes.len(),
                    "finding"
                );
                self.results.push(result);
            }
        }
    }
}
