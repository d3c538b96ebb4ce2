//! Standard rule pack for Squill.
//!
//! ```
//! use squill_lib::{Linter, LinterConfig};
//!
//! let linter = Linter::new(LinterConfig::default(), squill_rules::standard_rules()).unwrap();
//! let linted = linter.lint_string("select 1\n", None, true);
//! assert_eq!(linted.fix_string().0, "SELECT 1\n");
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod capitalisation;
pub mod layout;

#[cfg(test)]
mod lib_tests;

use squill_lib::Rule;

pub use capitalisation::KeywordCapitalisation;
pub use layout::{CommaSpacing, EndOfFile, TrailingWhitespace};

/// Every rule in this pack, ready for [`squill_lib::Linter::new`].
pub fn standard_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(TrailingWhitespace),
        Box::new(CommaSpacing),
        Box::new(EndOfFile),
        Box::new(KeywordCapitalisation),
    ]
}
