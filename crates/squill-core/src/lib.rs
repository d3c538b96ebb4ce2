#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures shared by the Squill lexer, parser and fixer.
//!
//! Two layers:
//! - **Templated file**: the contract between a (possibly templated) source
//!   string and the string the parser actually sees, with slice maps in
//!   both directions.
//! - **Position markers**: byte spans into both strings plus a working
//!   line/column that survives tree edits.

mod invariants;
mod marker;
mod templated_file;

#[cfg(test)]
mod marker_tests;
#[cfg(test)]
mod templated_file_tests;

pub use marker::PositionMarker;
pub use templated_file::{RawSlice, SliceType, TemplatedFile, TemplatedSlice};

/// Errors raised while building a templated file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// Raw slices do not tile the source string.
    #[error("raw slices are inconsistent with the source: {0}")]
    InconsistentRawSlices(String),

    /// Templated slices do not tile the templated string.
    #[error("templated slices are inconsistent with the output: {0}")]
    InconsistentTemplatedSlices(String),

    /// A templated string was supplied without the slices describing it.
    #[error("cannot build a templated file without a slice map")]
    Unsliced,

    /// Template rendering failed before a templated string existed.
    #[error("template rendering failed: {0}")]
    Render(String),
}

/// Result type for templated file construction.
pub type Result<T> = std::result::Result<T, TemplateError>;
