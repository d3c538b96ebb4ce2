//! Bind-parameter placeholders replaced by context values.

use indexmap::IndexMap;
use regex_automata::meta::Regex;
use squill_core::{RawSlice, SliceType, TemplateError, TemplatedFile, TemplatedSlice};

use super::Templater;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `:name`
    Colon,
    /// `:1`
    NumericColon,
    /// `%(name)s`
    Pyformat,
    /// `$name` or `${name}`
    Dollar,
    /// `$1` or `${1}`
    NumericDollar,
    /// `?`, numbered from 1
    QuestionMark,
    /// `%s`, numbered from 1
    Percent,
    /// `{{ name }}`
    Brace,
}

impl PlaceholderStyle {
    pub const NAMES: &[&str] = &[
        "colon",
        "numeric_colon",
        "pyformat",
        "dollar",
        "numeric_dollar",
        "question_mark",
        "percent",
        "brace",
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "colon" => Self::Colon,
            "numeric_colon" => Self::NumericColon,
            "pyformat" => Self::Pyformat,
            "dollar" => Self::Dollar,
            "numeric_dollar" => Self::NumericDollar,
            "question_mark" => Self::QuestionMark,
            "percent" => Self::Percent,
            "brace" => Self::Brace,
            _ => return None,
        })
    }

    fn pattern(&self) -> &'static str {
        match self {
            Self::Colon => r":(?P<param_name>\w+)",
            Self::NumericColon => r":(?P<param_name>\d+)",
            Self::Pyformat => r"%\((?P<param_name>\w+)\)s",
            Self::Dollar => r"\$\{?(?P<param_name>\w+)\}?",
            Self::NumericDollar => r"\$\{?(?P<param_name>\d+)\}?",
            Self::QuestionMark => r"\?",
            Self::Percent => r"%s",
            Self::Brace => r"\{\{\s*(?P<param_name>\w+)\s*\}\}",
        }
    }

    /// Placeholders glued to a word, a colon or a backslash are left alone.
    fn guards_preceding(&self) -> bool {
        !matches!(self, Self::Brace)
    }
}

pub struct PlaceholderTemplater {
    style: PlaceholderStyle,
    regex: Regex,
    context: IndexMap<String, String>,
}

impl PlaceholderTemplater {
    pub fn new(
        style: PlaceholderStyle,
        context: IndexMap<String, String>,
    ) -> Result<Self, TemplateError> {
        let regex = Regex::new(style.pattern()).map_err(|e| TemplateError::Render(e.to_string()))?;
        Ok(Self {
            style,
            regex,
            context,
        })
    }

    pub fn style(&self) -> PlaceholderStyle {
        self.style
    }

    fn is_guarded(&self, source: &str, start: usize, end: usize) -> bool {
        let before = source[..start].chars().next_back();
        let after = source[end..].chars().next();
        let glued = before.is_some_and(|c| c == ':' || c == '\\' || c.is_alphanumeric() || c == '_');
        (self.style.guards_preceding() && glued)
            || (self.style == PlaceholderStyle::Colon && after == Some(':'))
    }
}

impl Templater for PlaceholderTemplater {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn process(&self, source: &str, fname: &str) -> Result<TemplatedFile, TemplateError> {
        let mut builder = SliceBuilder::default();
        let mut counter = 1;
        let mut last = 0;
        for caps in self.regex.captures_iter(source) {
            let Some(span) = caps.get_match().map(|m| m.range()) else {
                continue;
            };
            if self.is_guarded(source, span.start, span.end) {
                continue;
            }
            let param_name = match caps.get_group_by_name("param_name") {
                Some(group) => source[group.range()].to_string(),
                None => {
                    let n = counter.to_string();
                    counter += 1;
                    n
                }
            };
            let replacement = self
                .context
                .get(&param_name)
                .cloned()
                .unwrap_or_else(|| param_name.clone());
            tracing::trace!(param = %param_name, %replacement, "placeholder");

            builder.push(SliceType::Literal, &source[last..span.start], last, &source[last..span.start]);
            builder.push(SliceType::Templated, &source[span.clone()], span.start, &replacement);
            last = span.end;
        }
        builder.push(SliceType::Literal, &source[last..], last, &source[last..]);

        let SliceBuilder {
            templated,
            sliced,
            raw,
        } = builder;
        TemplatedFile::new(source, fname, Some(templated), Some(sliced), Some(raw))
    }
}

#[derive(Default)]
struct SliceBuilder {
    templated: String,
    sliced: Vec<TemplatedSlice>,
    raw: Vec<RawSlice>,
}

impl SliceBuilder {
    fn push(&mut self, slice_type: SliceType, raw: &str, source_idx: usize, output: &str) {
        if raw.is_empty() {
            return;
        }
        let start = self.templated.len();
        self.templated.push_str(output);
        self.sliced.push(TemplatedSlice::new(
            slice_type,
            source_idx..source_idx + raw.len(),
            start..self.templated.len(),
        ));
        self.raw.push(RawSlice::new(raw, slice_type, source_idx));
    }
}
