//! Grammar elements and their builders.
//!
//! A grammar is a tree of [`GrammarKind`] nodes with a few options shared by
//! every kind. Named productions are referenced with [`r`] and resolved
//! through the dialect at match time, which is what makes recursive SQL
//! grammars and dialect inheritance possible.

use std::collections::BTreeSet;
use std::fmt;

use crate::segments::{MetaKind, Segment};

use super::raw_parsers::RawParser;

#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) kind: GrammarKind,
    pub(crate) optional: bool,
    pub(crate) allow_gaps: bool,
    /// Pushed onto the context terminator stack while this grammar matches.
    pub(crate) terminators: Vec<Grammar>,
}

#[derive(Debug, Clone)]
pub enum GrammarKind {
    Ref {
        name: String,
        exclude: Option<Box<Grammar>>,
    },
    Sequence(Vec<Grammar>),
    OneOf {
        elements: Vec<Grammar>,
        exclude: Option<Box<Grammar>>,
    },
    AnyNumberOf {
        elements: Vec<Grammar>,
        min_times: usize,
        max_times: Option<usize>,
    },
    Delimited {
        elements: Vec<Grammar>,
        delimiter: Box<Grammar>,
        allow_trailing: bool,
        terminator: Option<Box<Grammar>>,
        min_delimiters: usize,
    },
    Bracketed {
        elements: Vec<Grammar>,
        bracket_type: &'static str,
    },
    GreedyUntil {
        terminators: Vec<Grammar>,
        include_terminator: bool,
        enforce_whitespace_preceding: bool,
    },
    StartsWith {
        target: Box<Grammar>,
        terminator: Option<Box<Grammar>>,
        include_terminator: bool,
    },
    ContainsOnly {
        types: Vec<&'static str>,
        grammars: Vec<Grammar>,
    },
    Anything,
    Nothing,
    Meta(MetaKind),
    Parser(RawParser),
}

/// Bracket pair registered in a dialect bracket set.
#[derive(Debug, Clone)]
pub struct BracketPair {
    pub bracket_type: &'static str,
    pub start: Grammar,
    pub end: Grammar,
}

impl BracketPair {
    pub fn new(bracket_type: &'static str, start: &str, end: &str) -> Self {
        Self {
            bracket_type,
            start: r(start),
            end: r(end),
        }
    }
}

/// First-token hint: a leaf can only start a match if its uppercased raw
/// text or its lexer name is listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleHint {
    pub raws: BTreeSet<String>,
    pub names: BTreeSet<&'static str>,
}

impl SimpleHint {
    pub fn raw(raw: impl Into<String>) -> Self {
        let mut raws = BTreeSet::new();
        raws.insert(raw.into());
        Self {
            raws,
            names: BTreeSet::new(),
        }
    }

    pub fn name(name: &'static str) -> Self {
        let mut names = BTreeSet::new();
        names.insert(name);
        Self {
            raws: BTreeSet::new(),
            names,
        }
    }

    pub fn union(mut self, other: SimpleHint) -> Self {
        self.raws.extend(other.raws);
        self.names.extend(other.names);
        self
    }

    /// Whether `segment` could start a match. Only leaves are ruled out.
    pub fn admits(&self, segment: &Segment) -> bool {
        match segment.leaf_upper() {
            Some(upper) => self.raws.contains(upper) || self.names.contains(segment.name()),
            None => true,
        }
    }
}

impl Grammar {
    pub(crate) fn new(kind: GrammarKind) -> Self {
        Self {
            kind,
            optional: false,
            allow_gaps: true,
            terminators: Vec::new(),
        }
    }

    pub fn kind(&self) -> &GrammarKind {
        &self.kind
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// May match nothing at all.
    pub fn is_optional(&self) -> bool {
        match &self.kind {
            GrammarKind::AnyNumberOf { min_times, .. } => self.optional || *min_times == 0,
            _ => self.optional,
        }
    }

    pub fn is_meta(&self) -> bool {
        matches!(self.kind, GrammarKind::Meta(_))
    }

    /// Disallow non-code between elements (sequences and repetitions).
    pub fn no_gaps(mut self) -> Self {
        self.allow_gaps = false;
        self
    }

    pub fn terminators(mut self, terminators: Vec<Grammar>) -> Self {
        self.terminators = terminators;
        self
    }

    /// Reject input that `exclude` matches. Applies to refs and alternatives.
    pub fn exclude(mut self, grammar: Grammar) -> Self {
        match &mut self.kind {
            GrammarKind::Ref { exclude, .. } | GrammarKind::OneOf { exclude, .. } => {
                *exclude = Some(Box::new(grammar));
            }
            _ => {}
        }
        self
    }

    pub fn min_times(mut self, n: usize) -> Self {
        if let GrammarKind::AnyNumberOf { min_times, .. } = &mut self.kind {
            *min_times = n;
        }
        self
    }

    pub fn max_times(mut self, n: usize) -> Self {
        if let GrammarKind::AnyNumberOf { max_times, .. } = &mut self.kind {
            *max_times = Some(n);
        }
        self
    }

    pub fn allow_trailing(mut self) -> Self {
        if let GrammarKind::Delimited { allow_trailing, .. } = &mut self.kind {
            *allow_trailing = true;
        }
        self
    }

    pub fn min_delimiters(mut self, n: usize) -> Self {
        if let GrammarKind::Delimited { min_delimiters, .. } = &mut self.kind {
            *min_delimiters = n;
        }
        self
    }

    pub fn delimiter(mut self, grammar: Grammar) -> Self {
        if let GrammarKind::Delimited { delimiter, .. } = &mut self.kind {
            *delimiter = Box::new(grammar);
        }
        self
    }

    pub fn terminator(mut self, grammar: Grammar) -> Self {
        match &mut self.kind {
            GrammarKind::Delimited { terminator, .. }
            | GrammarKind::StartsWith { terminator, .. } => *terminator = Some(Box::new(grammar)),
            _ => {}
        }
        self
    }

    pub fn include_terminator(mut self) -> Self {
        match &mut self.kind {
            GrammarKind::GreedyUntil {
                include_terminator, ..
            }
            | GrammarKind::StartsWith {
                include_terminator, ..
            } => *include_terminator = true,
            _ => {}
        }
        self
    }

    pub fn enforce_whitespace_preceding(mut self) -> Self {
        if let GrammarKind::GreedyUntil {
            enforce_whitespace_preceding,
            ..
        } = &mut self.kind
        {
            *enforce_whitespace_preceding = true;
        }
        self
    }

    pub fn bracket_type(mut self, kind: &'static str) -> Self {
        if let GrammarKind::Bracketed { bracket_type, .. } = &mut self.kind {
            *bracket_type = kind;
        }
        self
    }

    /// Every grammar nested directly in this one.
    pub(crate) fn children(&self) -> Vec<&Grammar> {
        let mut out: Vec<&Grammar> = self.terminators.iter().collect();
        match &self.kind {
            GrammarKind::Ref { exclude, .. } => out.extend(exclude.as_deref()),
            GrammarKind::OneOf { elements, exclude } => {
                out.extend(elements);
                out.extend(exclude.as_deref());
            }
            GrammarKind::Sequence(elements)
            | GrammarKind::AnyNumberOf { elements, .. }
            | GrammarKind::Bracketed { elements, .. } => out.extend(elements),
            GrammarKind::Delimited {
                elements,
                delimiter,
                terminator,
                ..
            } => {
                out.extend(elements);
                out.push(delimiter.as_ref());
                out.extend(terminator.as_deref());
            }
            GrammarKind::GreedyUntil { terminators, .. } => out.extend(terminators),
            GrammarKind::StartsWith {
                target, terminator, ..
            } => {
                out.push(target.as_ref());
                out.extend(terminator.as_deref());
            }
            GrammarKind::ContainsOnly { grammars, .. } => out.extend(grammars),
            GrammarKind::Anything
            | GrammarKind::Nothing
            | GrammarKind::Meta(_)
            | GrammarKind::Parser(_) => {}
        }
        out
    }

    /// Names of all refs reachable without going through the dialect.
    pub fn referenced_names(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_refs(&mut out);
        out
    }

    fn collect_refs(&self, out: &mut BTreeSet<String>) {
        if let GrammarKind::Ref { name, .. } = &self.kind {
            out.insert(name.clone());
        }
        for child in self.children() {
            child.collect_refs(out);
        }
    }
}

/// Reference to a named production in the dialect.
pub fn r(name: &str) -> Grammar {
    Grammar::new(GrammarKind::Ref {
        name: name.to_string(),
        exclude: None,
    })
}

/// Reference to the keyword segment for `word`, e.g. `FromKeywordSegment`.
pub fn kw(word: &str) -> Grammar {
    r(&keyword_segment_name(word))
}

pub(crate) fn keyword_segment_name(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    let capitalised: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    format!("{capitalised}KeywordSegment")
}

pub fn seq(elements: Vec<Grammar>) -> Grammar {
    Grammar::new(GrammarKind::Sequence(elements))
}

pub fn one_of(elements: Vec<Grammar>) -> Grammar {
    Grammar::new(GrammarKind::OneOf {
        elements,
        exclude: None,
    })
}

pub fn any_number_of(elements: Vec<Grammar>) -> Grammar {
    Grammar::new(GrammarKind::AnyNumberOf {
        elements,
        min_times: 0,
        max_times: None,
    })
}

/// Comma delimited by default; see [`Grammar::delimiter`].
pub fn delimited(elements: Vec<Grammar>) -> Grammar {
    Grammar::new(GrammarKind::Delimited {
        elements,
        delimiter: Box::new(r("CommaSegment")),
        allow_trailing: false,
        terminator: None,
        min_delimiters: 0,
    })
}

/// Round brackets by default; see [`Grammar::bracket_type`].
pub fn bracketed(elements: Vec<Grammar>) -> Grammar {
    Grammar::new(GrammarKind::Bracketed {
        elements,
        bracket_type: "round",
    })
}

pub fn greedy_until(terminators: Vec<Grammar>) -> Grammar {
    Grammar::new(GrammarKind::GreedyUntil {
        terminators,
        include_terminator: false,
        enforce_whitespace_preceding: false,
    })
}

pub fn starts_with(target: Grammar) -> Grammar {
    Grammar::new(GrammarKind::StartsWith {
        target: Box::new(target),
        terminator: None,
        include_terminator: false,
    })
}

pub fn contains_only(types: Vec<&'static str>, grammars: Vec<Grammar>) -> Grammar {
    Grammar::new(GrammarKind::ContainsOnly { types, grammars })
}

pub fn anything() -> Grammar {
    Grammar::new(GrammarKind::Anything)
}

pub fn nothing() -> Grammar {
    Grammar::new(GrammarKind::Nothing)
}

pub fn indent() -> Grammar {
    Grammar::new(GrammarKind::Meta(MetaKind::Indent))
}

pub fn dedent() -> Grammar {
    Grammar::new(GrammarKind::Meta(MetaKind::Dedent))
}

fn write_list(f: &mut fmt::Formatter<'_>, elements: &[Grammar], sep: &str) -> fmt::Result {
    for (i, element) in elements.iter().filter(|e| !e.is_meta()).enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{element}")?;
    }
    Ok(())
}

impl fmt::Display for Grammar {
    /// Short description of what the grammar expects.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            GrammarKind::Ref { name, .. } => f.write_str(name),
            GrammarKind::Sequence(elements) => write_list(f, elements, " "),
            GrammarKind::OneOf { elements, .. } | GrammarKind::AnyNumberOf { elements, .. } => {
                if elements.len() == 1 {
                    return write!(f, "{}", elements[0]);
                }
                f.write_str("one of [")?;
                write_list(f, elements, ", ")?;
                f.write_str("]")
            }
            GrammarKind::Delimited { elements, .. } => {
                if elements.len() == 1 {
                    return write!(f, "{}", elements[0]);
                }
                f.write_str("one of [")?;
                write_list(f, elements, ", ")?;
                f.write_str("]")
            }
            GrammarKind::Bracketed { elements, .. } => {
                f.write_str("(")?;
                write_list(f, elements, " ")?;
                f.write_str(")")
            }
            GrammarKind::GreedyUntil { .. } | GrammarKind::Anything => f.write_str("anything"),
            GrammarKind::StartsWith { target, .. } => write!(f, "{target}"),
            GrammarKind::ContainsOnly { types, .. } => write!(f, "only {}", types.join(", ")),
            GrammarKind::Nothing => f.write_str("nothing"),
            GrammarKind::Meta(kind) => f.write_str(kind.type_tag()),
            GrammarKind::Parser(parser) => write!(f, "{parser}"),
        }
    }
}
