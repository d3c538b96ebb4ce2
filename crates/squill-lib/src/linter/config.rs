//! Linter configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::parser::DEFAULT_MAX_PARSE_DEPTH;
use crate::{Result, UserError};

/// Error classes that `ignore` may suppress.
pub const IGNORE_CLASSES: &[&str] = &["parsing", "lexing", "templating", "linting"];

/// Encodings accepted by `encoding`.
pub const ENCODINGS: &[&str] = &["utf-8", "ascii", "latin-1", "autodetect"];

/// Everything the linter reads from its caller. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinterConfig {
    pub dialect: String,
    pub templater: String,
    pub placeholder_style: Option<String>,
    pub template_context: IndexMap<String, String>,
    /// Rule selectors: codes, names, aliases, groups or globs. Empty selects all.
    pub rules: Vec<String>,
    pub exclude_rules: Vec<String>,
    pub ignore: Vec<String>,
    pub disable_noqa: bool,
    pub warn_unused_ignores: bool,
    pub encoding: String,
    pub sql_file_exts: Vec<String>,
    pub fix_even_unparsable: bool,
    /// Upper bound on fix passes per file.
    pub runaway_limit: usize,
    pub max_parse_depth: usize,
    pub indentation: IndexMap<String, bool>,
}

impl Default for LinterConfig {
    fn default() -> Self {
        Self {
            dialect: "ansi".to_string(),
            templater: "raw".to_string(),
            placeholder_style: None,
            template_context: IndexMap::new(),
            rules: Vec::new(),
            exclude_rules: Vec::new(),
            ignore: Vec::new(),
            disable_noqa: false,
            warn_unused_ignores: false,
            encoding: "autodetect".to_string(),
            sql_file_exts: vec![".sql".to_string()],
            fix_even_unparsable: false,
            runaway_limit: 10,
            max_parse_depth: DEFAULT_MAX_PARSE_DEPTH,
            indentation: IndexMap::new(),
        }
    }
}

impl LinterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| UserError::InvalidConfig {
            key: "<json>".to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if let Some(class) = self.ignore.iter().find(|c| !IGNORE_CLASSES.contains(&c.as_str())) {
            return Err(invalid(
                "ignore",
                format!("unknown class `{class}`, expected one of: {}", IGNORE_CLASSES.join(", ")),
            ));
        }
        if !ENCODINGS.contains(&self.encoding.to_ascii_lowercase().as_str()) {
            return Err(invalid(
                "encoding",
                format!(
                    "unsupported encoding `{}`, expected one of: {}",
                    self.encoding,
                    ENCODINGS.join(", ")
                ),
            ));
        }
        if self.runaway_limit == 0 {
            return Err(invalid("runaway_limit", "must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn with_dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = dialect.into();
        self
    }

    pub fn with_templater(mut self, templater: impl Into<String>) -> Self {
        self.templater = templater.into();
        self
    }

    pub fn with_placeholder_style(mut self, style: impl Into<String>) -> Self {
        self.placeholder_style = Some(style.into());
        self
    }

    pub fn with_template_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.template_context.insert(name.into(), value.into());
        self
    }

    pub fn with_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules = rules.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_rules = rules.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ignore<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore = classes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_disable_noqa(mut self, disable: bool) -> Self {
        self.disable_noqa = disable;
        self
    }

    pub fn with_warn_unused_ignores(mut self, warn: bool) -> Self {
        self.warn_unused_ignores = warn;
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn with_sql_file_exts<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sql_file_exts = exts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fix_even_unparsable(mut self, fix: bool) -> Self {
        self.fix_even_unparsable = fix;
        self
    }

    pub fn with_runaway_limit(mut self, limit: usize) -> Self {
        self.runaway_limit = limit;
        self
    }

    pub fn with_max_parse_depth(mut self, depth: usize) -> Self {
        self.max_parse_depth = depth;
        self
    }

    pub fn with_indentation(mut self, key: impl Into<String>, enabled: bool) -> Self {
        self.indentation.insert(key.into(), enabled);
        self
    }

    pub fn ignores(&self, class: &str) -> bool {
        self.ignore.iter().any(|c| c == class)
    }
}

fn invalid(key: &str, reason: String) -> crate::Error {
    UserError::InvalidConfig {
        key: key.to_string(),
        reason,
    }
    .into()
}
