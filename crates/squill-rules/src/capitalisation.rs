//! Capitalisation rules.

use squill_lib::{CrawlBehaviour, LintFix, LintResult, Rule, RuleContext};

/// L010: keywords are upper case.
pub struct KeywordCapitalisation;

impl Rule for KeywordCapitalisation {
    fn code(&self) -> &'static str {
        "L010"
    }

    fn name(&self) -> &'static str {
        "capitalisation.keywords"
    }

    fn description(&self) -> &'static str {
        "Keywords must be upper case."
    }

    fn groups(&self) -> &'static [&'static str] {
        &["all", "core", "capitalisation"]
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["CP01"]
    }

    fn crawl_behaviour(&self) -> CrawlBehaviour {
        CrawlBehaviour::seeker(&["keyword"])
    }

    fn eval(&self, context: &RuleContext<'_>) -> Vec<LintResult> {
        let keyword = context.segment;
        let upper = keyword.raw_upper();
        if keyword.raw() == upper {
            return Vec::new();
        }
        let fixed = keyword.edit(upper.as_str());
        vec![
            LintResult::new(keyword)
                .with_fix(LintFix::edit(keyword, fixed))
                .with_description(format!("Keywords must be upper case. Found '{}'.", keyword.raw())),
        ]
    }
}
