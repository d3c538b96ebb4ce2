//! Dialects: named bags of lexer matchers, grammar elements and word sets.
//!
//! A dialect is assembled mutably, then [`expanded`](Dialect::expand) once:
//! segment generators run, keyword sets materialise as
//! `<Word>KeywordSegment` parsers, and every reference is checked. After
//! that it is immutable and shared behind an `Arc`.
//!
//! Derived dialects start from [`Dialect::copy_as`] and then patch lexer
//! matchers and replace grammar elements.

mod ansi;
mod keywords;
mod postgres;


use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;

use crate::lexer::LexMatcher;
use crate::parser::{BracketPair, Grammar, GrammarKind, SegmentDef, keyword};

pub use ansi::ansi_dialect;
pub use postgres::postgres_dialect;

/// Builds a library element from the dialect being expanded.
pub type SegmentGenerator = fn(&Dialect) -> Result<DialectElement, DialectError>;

#[derive(Debug, Clone)]
pub enum DialectElement {
    Grammar(Grammar),
    Segment(Arc<SegmentDef>),
    Generator(SegmentGenerator),
}

impl From<Grammar> for DialectElement {
    fn from(grammar: Grammar) -> Self {
        DialectElement::Grammar(grammar)
    }
}

impl From<SegmentDef> for DialectElement {
    fn from(def: SegmentDef) -> Self {
        DialectElement::Segment(Arc::new(def))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DialectError {
    #[error("`{name}` is already registered in the `{dialect}` dialect")]
    AlreadyRegistered { name: String, dialect: String },

    #[error("`{name}` is not registered in the `{dialect}` dialect")]
    NotRegistered { name: String, dialect: String },

    #[error("lexer matcher `{name}` not found in the `{dialect}` dialect")]
    UnknownLexMatcher { name: String, dialect: String },

    #[error("the `{0}` dialect must be expanded before use")]
    NotExpanded(String),

    #[error("Grammar refers to `{name}` which was not found in the `{dialect}` dialect")]
    UnknownReference { name: String, dialect: String },

    #[error("the `{0}` dialect is already expanded")]
    AlreadyExpanded(String),

    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Check that `pattern` is a syntactically valid regex.
pub fn validate_pattern(pattern: &str) -> Result<(), DialectError> {
    regex_syntax::ast::parse::Parser::new()
        .parse(pattern)
        .map(|_| ())
        .map_err(|e| DialectError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.kind().to_string(),
        })
}

#[derive(Debug, Clone)]
pub struct Dialect {
    name: String,
    inherits_from: Option<String>,
    root_segment_name: &'static str,
    lexer_matchers: Vec<LexMatcher>,
    library: IndexMap<String, DialectElement>,
    sets: IndexMap<String, BTreeSet<String>>,
    bracket_pairs: Vec<BracketPair>,
    expanded: bool,
}

impl Dialect {
    pub fn new(name: impl Into<String>, lexer_matchers: Vec<LexMatcher>) -> Self {
        Self {
            name: name.into(),
            inherits_from: None,
            root_segment_name: "FileSegment",
            lexer_matchers,
            library: IndexMap::new(),
            sets: IndexMap::new(),
            bracket_pairs: Vec::new(),
            expanded: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inherits_from(&self) -> Option<&str> {
        self.inherits_from.as_deref()
    }

    pub fn root_segment_name(&self) -> &'static str {
        self.root_segment_name
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn lexer_matchers(&self) -> &[LexMatcher] {
        &self.lexer_matchers
    }

    /// An unexpanded copy under a new name, inheriting everything.
    pub fn copy_as(&self, name: impl Into<String>) -> Dialect {
        let mut library = self.library.clone();
        if self.expanded {
            // Keyword parsers are regenerated from the (possibly changed) sets.
            library.retain(|name, _| !self.is_materialised_keyword(name));
        }
        Dialect {
            name: name.into(),
            inherits_from: Some(self.name.clone()),
            root_segment_name: self.root_segment_name,
            lexer_matchers: self.lexer_matchers.clone(),
            library,
            sets: self.sets.clone(),
            bracket_pairs: self.bracket_pairs.clone(),
            expanded: false,
        }
    }

    fn is_materialised_keyword(&self, name: &str) -> bool {
        ["unreserved_keywords", "reserved_keywords"].iter().any(|label| {
            self.set(label)
                .any(|word| crate::parser::keyword_segment_name(word) == name)
        })
    }

    fn ensure_mutable(&self) -> Result<(), DialectError> {
        if self.expanded {
            return Err(DialectError::AlreadyExpanded(self.name.clone()));
        }
        Ok(())
    }

    /// Register a new element. Fails if the name is taken.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        element: impl Into<DialectElement>,
    ) -> Result<(), DialectError> {
        self.ensure_mutable()?;
        let name = name.into();
        if self.library.contains_key(&name) {
            return Err(DialectError::AlreadyRegistered {
                name,
                dialect: self.name.clone(),
            });
        }
        self.library.insert(name, element.into());
        Ok(())
    }

    /// Register a segment definition under its own name.
    pub fn add_segment(&mut self, def: SegmentDef) -> Result<(), DialectError> {
        self.add(def.name, def)
    }

    /// Override an existing element. Fails if the name is not registered.
    pub fn replace(
        &mut self,
        name: impl Into<String>,
        element: impl Into<DialectElement>,
    ) -> Result<(), DialectError> {
        self.ensure_mutable()?;
        let name = name.into();
        match self.library.get_mut(&name) {
            Some(slot) => {
                *slot = element.into();
                Ok(())
            }
            None => Err(DialectError::NotRegistered {
                name,
                dialect: self.name.clone(),
            }),
        }
    }

    pub fn replace_segment(&mut self, def: SegmentDef) -> Result<(), DialectError> {
        self.replace(def.name, def)
    }

    /// Words registered under `label`, e.g. `reserved_keywords`.
    pub fn set(&self, label: &str) -> impl Iterator<Item = &str> {
        self.sets
            .get(label)
            .into_iter()
            .flat_map(|words| words.iter().map(String::as_str))
    }

    /// Add words to the set `label`, creating it if needed. Words are uppercased.
    pub fn update_set<I, S>(&mut self, label: &str, words: I) -> Result<(), DialectError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_mutable()?;
        let set = self.sets.entry(label.to_string()).or_default();
        set.extend(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_uppercase())
                .filter(|w| !w.is_empty()),
        );
        Ok(())
    }

    pub fn remove_from_set(&mut self, label: &str, word: &str) -> Result<(), DialectError> {
        self.ensure_mutable()?;
        if let Some(set) = self.sets.get_mut(label) {
            set.remove(&word.to_uppercase());
        }
        Ok(())
    }

    pub fn add_bracket_pair(&mut self, pair: BracketPair) -> Result<(), DialectError> {
        self.ensure_mutable()?;
        self.bracket_pairs.push(pair);
        Ok(())
    }

    pub fn bracket_pairs(&self) -> &[BracketPair] {
        &self.bracket_pairs
    }

    pub fn bracket_pair(&self, bracket_type: &str) -> Option<&BracketPair> {
        self.bracket_pairs
            .iter()
            .find(|pair| pair.bracket_type == bracket_type)
    }

    /// Replace lexer matchers by name. Every patch must name an existing matcher.
    pub fn patch_lexer_matchers(&mut self, patches: Vec<LexMatcher>) -> Result<(), DialectError> {
        self.ensure_mutable()?;
        for patch in patches {
            let slot = self
                .lexer_matchers
                .iter_mut()
                .find(|m| m.name() == patch.name())
                .ok_or_else(|| DialectError::UnknownLexMatcher {
                    name: patch.name().to_string(),
                    dialect: self.name.clone(),
                })?;
            *slot = patch;
        }
        Ok(())
    }

    /// Insert matchers ahead of the one named `before`.
    pub fn insert_lexer_matchers(
        &mut self,
        matchers: Vec<LexMatcher>,
        before: &str,
    ) -> Result<(), DialectError> {
        self.ensure_mutable()?;
        let idx = self
            .lexer_matchers
            .iter()
            .position(|m| m.name() == before)
            .ok_or_else(|| DialectError::UnknownLexMatcher {
                name: before.to_string(),
                dialect: self.name.clone(),
            })?;
        self.lexer_matchers.splice(idx..idx, matchers);
        Ok(())
    }

    /// Run generators, materialise keyword parsers and check references.
    pub fn expand(&mut self) -> Result<(), DialectError> {
        self.ensure_mutable()?;

        let generators: Vec<(String, SegmentGenerator)> = self
            .library
            .iter()
            .filter_map(|(name, element)| match element {
                DialectElement::Generator(generator) => Some((name.clone(), *generator)),
                _ => None,
            })
            .collect();
        for (name, generator) in generators {
            let element = generator(self)?;
            self.replace(name, element)?;
        }

        let words: Vec<String> = ["unreserved_keywords", "reserved_keywords"]
            .iter()
            .flat_map(|label| self.set(label).map(str::to_string).collect::<Vec<_>>())
            .collect();
        for word in words {
            let name = crate::parser::keyword_segment_name(&word);
            if !self.library.contains_key(&name) {
                self.library.insert(name, keyword(&word).into());
            }
        }

        self.check_references()?;
        self.expanded = true;
        tracing::debug!(
            dialect = %self.name,
            elements = self.library.len(),
            matchers = self.lexer_matchers.len(),
            "dialect expanded"
        );
        Ok(())
    }

    fn check_references(&self) -> Result<(), DialectError> {
        let mut grammars: Vec<&Grammar> = Vec::new();
        for element in self.library.values() {
            match element {
                DialectElement::Grammar(grammar) => grammars.push(grammar),
                DialectElement::Segment(def) => {
                    grammars.push(&def.match_grammar);
                    grammars.extend(def.parse_grammar.as_ref());
                }
                DialectElement::Generator(_) => {}
            }
        }
        for pair in &self.bracket_pairs {
            grammars.push(&pair.start);
            grammars.push(&pair.end);
        }
        for grammar in grammars {
            for name in grammar.referenced_names() {
                if !self.library.contains_key(&name) {
                    return Err(DialectError::UnknownReference {
                        name,
                        dialect: self.name.clone(),
                    });
                }
            }
            let mut bracket_types = BTreeSet::new();
            collect_bracket_types(grammar, &mut bracket_types);
            if let Some(missing) = bracket_types
                .into_iter()
                .find(|ty| self.bracket_pair(ty).is_none())
            {
                return Err(DialectError::NotRegistered {
                    name: format!("{missing} brackets"),
                    dialect: self.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Look up a library element. Only valid once expanded.
    pub fn resolve(&self, name: &str) -> Result<&DialectElement, DialectError> {
        if !self.expanded {
            return Err(DialectError::NotExpanded(self.name.clone()));
        }
        self.library
            .get(name)
            .ok_or_else(|| DialectError::UnknownReference {
                name: name.to_string(),
                dialect: self.name.clone(),
            })
    }

    pub fn segment_def(&self, name: &str) -> Option<&SegmentDef> {
        match self.library.get(name)? {
            DialectElement::Segment(def) => Some(def),
            _ => None,
        }
    }

    /// Every element name, in registration order.
    pub fn element_names(&self) -> impl Iterator<Item = &str> {
        self.library.keys().map(String::as_str)
    }
}

fn collect_bracket_types(grammar: &Grammar, out: &mut BTreeSet<&'static str>) {
    if let GrammarKind::Bracketed { bracket_type, .. } = grammar.kind() {
        out.insert(*bracket_type);
    }
    for child in grammar.children() {
        collect_bracket_types(child, out);
    }
}

fn expanded(dialect: Result<Dialect, DialectError>) -> Result<Arc<Dialect>, DialectError> {
    let mut dialect = dialect?;
    dialect.expand()?;
    Ok(Arc::new(dialect))
}

static ANSI: LazyLock<Result<Arc<Dialect>, DialectError>> =
    LazyLock::new(|| expanded(ansi_dialect()));

static POSTGRES: LazyLock<Result<Arc<Dialect>, DialectError>> =
    LazyLock::new(|| expanded(postgres_dialect()));

/// Names accepted by [`dialect_selector`].
pub const DIALECT_NAMES: &[&str] = &["ansi", "postgres"];

/// Shared, expanded dialect by name.
pub fn dialect_selector(name: &str) -> crate::Result<Arc<Dialect>> {
    let slot = match name.to_ascii_lowercase().as_str() {
        "ansi" => &ANSI,
        "postgres" | "postgresql" => &POSTGRES,
        _ => return Err(crate::UserError::UnknownDialect(name.to_string()).into()),
    };
    match &**slot {
        Ok(dialect) => Ok(Arc::clone(dialect)),
        Err(err) => Err(err.clone().into()),
    }
}
