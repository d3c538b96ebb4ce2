//! Squill: a dialect-driven SQL linter and fixer.
//!
//! # Example
//!
//! ```
//! use squill_lib::{Linter, LinterConfig};
//!
//! let linter = Linter::new(LinterConfig::default(), Vec::new()).expect("ansi exists");
//! let linted = linter.lint_string("SELECT a FROM t\n", None, false);
//! assert!(linted.is_clean());
//! ```
//!
//! The pipeline is templater → lexer → parser → rule passes → patches.
//! Every stage keeps the raw text of the file intact, so the parse tree of
//! any input stringifies back to the templated input.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod diagnostics;
pub mod dialect;
pub mod lexer;
pub mod linter;
pub mod parser;
pub mod segments;
pub mod templater;

mod invariants;

use std::path::PathBuf;

pub use squill_core::{
    PositionMarker, RawSlice, SliceType, TemplateError, TemplatedFile, TemplatedSlice,
};

pub use diagnostics::{DiagnosticKind, Diagnostics, DiagnosticsPrinter, Severity};
pub use dialect::{Dialect, DialectError, dialect_selector};
pub use lexer::{LexError, Lexer};
pub use linter::{
    AnchorEditInfo, CrawlBehaviour, EditType, FixPatch, LintFix, LintResult, LintedFile, Linter,
    LinterConfig, LintingResult, Rule, RuleContext, Violation, ViolationKind,
};
pub use parser::{Grammar, ParseContext, ParseError};
pub use segments::{Segment, SegmentId};

/// Errors that stop processing of a single file or the whole run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Dialect(#[from] DialectError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Parse depth exceeded the configured maximum.
    #[error("recursion limit exceeded")]
    RecursionLimitExceeded,

    /// An internal invariant was broken. Surfaces as a `CRITICAL` violation.
    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    User(#[from] UserError),

    #[error("cannot access `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::sync::Arc<std::io::Error>,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: std::sync::Arc::new(source),
        }
    }

    /// Process exit code: `2` for bad input or configuration, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) | Self::Io { .. } => 2,
            _ => 1,
        }
    }
}

/// Invalid configuration or input supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserError {
    #[error("unknown dialect `{0}`")]
    UnknownDialect(String),

    #[error("unknown templater `{0}`")]
    UnknownTemplater(String),

    #[error("invalid value for `{key}`: {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("path `{0}` does not exist")]
    PathNotFound(String),

    #[error("cannot decode `{path}` as {encoding}")]
    Undecodable { path: String, encoding: String },
}

/// Result type for linter operations.
pub type Result<T> = std::result::Result<T, Error>;
