//! Parsers that match a single leaf and retype it.

use std::fmt;

use regex_automata::meta::Regex;

use crate::dialect::{DialectError, validate_pattern};
use crate::segments::Segment;

use super::grammar::{Grammar, GrammarKind, SimpleHint};
use super::match_result::MatchResult;

#[derive(Debug, Clone)]
pub enum RawParser {
    /// Case-insensitive keyword, typed `keyword`.
    Keyword { word: String },
    /// Exact (case-insensitive) token text.
    Symbol {
        template: String,
        types: Vec<&'static str>,
    },
    /// Full match of the uppercased text, unless `anti_template` also matches.
    Regex {
        pattern: String,
        regex: Regex,
        anti_template: Option<Regex>,
        types: Vec<&'static str>,
    },
    /// Any token produced by the named lexer matcher.
    Named {
        name: &'static str,
        types: Vec<&'static str>,
    },
}

impl RawParser {
    pub fn accepts(&self, segment: &Segment) -> bool {
        let Some(upper) = segment.leaf_upper() else {
            return false;
        };
        match self {
            RawParser::Keyword { word } => upper == word,
            RawParser::Symbol { template, .. } => upper == template,
            RawParser::Regex {
                regex,
                anti_template,
                ..
            } => {
                regex.is_match(upper)
                    && !anti_template.as_ref().is_some_and(|anti| anti.is_match(upper))
            }
            RawParser::Named { name, .. } => segment.name() == *name,
        }
    }

    fn types(&self) -> Vec<&'static str> {
        match self {
            RawParser::Keyword { .. } => vec!["keyword"],
            RawParser::Symbol { types, .. }
            | RawParser::Regex { types, .. }
            | RawParser::Named { types, .. } => types.clone(),
        }
    }

    /// Match the first segment only. Callers strip leading non-code.
    pub fn match_segments(&self, segments: &[Segment]) -> MatchResult {
        match segments.split_first() {
            Some((first, rest)) if self.accepts(first) => {
                MatchResult::new(vec![first.retyped(self.types())], rest.to_vec())
            }
            _ => MatchResult::from_unmatched(segments.to_vec()),
        }
    }

    pub fn simple(&self) -> Option<SimpleHint> {
        match self {
            RawParser::Keyword { word } => Some(SimpleHint::raw(word.clone())),
            RawParser::Symbol { template, .. } => Some(SimpleHint::raw(template.clone())),
            RawParser::Named { name, .. } => Some(SimpleHint::name(name)),
            RawParser::Regex { .. } => None,
        }
    }
}

impl fmt::Display for RawParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawParser::Keyword { word } => f.write_str(word),
            RawParser::Symbol { template, .. } => write!(f, "'{template}'"),
            RawParser::Regex { types, pattern, .. } => match types.first() {
                Some(ty) => f.write_str(ty),
                None => f.write_str(pattern),
            },
            RawParser::Named { types, name } => f.write_str(types.first().unwrap_or(name)),
        }
    }
}

/// Keyword parser for `word`.
pub fn keyword(word: &str) -> Grammar {
    Grammar::new(GrammarKind::Parser(RawParser::Keyword {
        word: word.to_uppercase(),
    }))
}

/// Parser for exact token text, e.g. `,` typed `comma`.
pub fn symbol(template: &str, types: Vec<&'static str>) -> Grammar {
    Grammar::new(GrammarKind::Parser(RawParser::Symbol {
        template: template.to_uppercase(),
        types,
    }))
}

/// Parser for tokens from one lexer matcher.
pub fn named(name: &'static str, types: Vec<&'static str>) -> Grammar {
    Grammar::new(GrammarKind::Parser(RawParser::Named { name, types }))
}

/// Parser for tokens whose uppercased text fully matches `pattern`.
pub fn regex(
    pattern: &str,
    anti_template: Option<&str>,
    types: Vec<&'static str>,
) -> Result<Grammar, DialectError> {
    let regex = full_match(pattern)?;
    let anti_template = anti_template.map(full_match).transpose()?;
    Ok(Grammar::new(GrammarKind::Parser(RawParser::Regex {
        pattern: pattern.to_string(),
        regex,
        anti_template,
        types,
    })))
}

fn full_match(pattern: &str) -> Result<Regex, DialectError> {
    validate_pattern(pattern)?;
    Regex::new(&format!("^(?:{pattern})$")).map_err(|e| DialectError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}
