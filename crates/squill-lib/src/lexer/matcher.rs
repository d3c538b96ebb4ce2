//! Lexer matchers: literal strings and anchored DFAs.

use std::fmt;
use std::sync::Arc;

use regex_automata::dfa::{Automaton, StartKind, dense};
use regex_automata::{Anchored, Input};

use crate::dialect::{DialectError, validate_pattern};

#[derive(Clone)]
enum Pattern {
    Literal(String),
    Regex {
        source: String,
        dfa: Arc<dense::DFA<Vec<u32>>>,
    },
}

/// One entry of a dialect's ordered lexer table.
#[derive(Clone)]
pub struct LexMatcher {
    name: &'static str,
    pattern: Pattern,
    type_tag: &'static str,
}

impl LexMatcher {
    /// Match exactly `literal`.
    pub fn string(name: &'static str, literal: &str, type_tag: &'static str) -> Self {
        Self {
            name,
            pattern: Pattern::Literal(literal.to_string()),
            type_tag,
        }
    }

    /// Match the longest leftmost-first run of `pattern` at the current position.
    pub fn regex(
        name: &'static str,
        pattern: &str,
        type_tag: &'static str,
    ) -> Result<Self, DialectError> {
        validate_pattern(pattern)?;
        let dfa = dense::DFA::builder()
            .configure(dense::DFA::config().start_kind(StartKind::Anchored))
            .build(pattern)
            .map_err(|e| DialectError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            name,
            pattern: Pattern::Regex {
                source: pattern.to_string(),
                dfa: Arc::new(dfa),
            },
            type_tag,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_tag(&self) -> &'static str {
        self.type_tag
    }

    /// Length of the match at the start of `text`. Empty matches don't count.
    pub fn match_len(&self, text: &str) -> Option<usize> {
        let len = match &self.pattern {
            Pattern::Literal(literal) => text.starts_with(literal.as_str()).then_some(literal.len()),
            Pattern::Regex { dfa, .. } => {
                let input = Input::new(text).anchored(Anchored::Yes);
                dfa.try_search_fwd(&input)
                    .ok()
                    .flatten()
                    .map(|half| half.offset())
            }
        }?;
        (len > 0).then_some(len)
    }
}

impl fmt::Debug for LexMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pattern {
            Pattern::Literal(literal) => write!(f, "{}({literal:?})", self.name),
            Pattern::Regex { source, .. } => write!(f, "{}(/{source}/)", self.name),
        }
    }
}
