//! Postgres: ANSI plus JSON operators, dollar quoting and `''` escapes.

use crate::lexer::LexMatcher;
use crate::parser::{kw, named, one_of, r};

use super::{Dialect, DialectError, ansi_dialect};

/// The unexpanded Postgres dialect.
pub fn postgres_dialect() -> Result<Dialect, DialectError> {
    let mut dialect = ansi_dialect()?.copy_as("postgres");

    dialect.insert_lexer_matchers(
        vec![LexMatcher::regex("json_operator", r"->>|->", "code")?],
        "not_equal",
    )?;
    dialect.insert_lexer_matchers(
        vec![LexMatcher::regex(
            "dollar_quote",
            r"\$\$([^$]|\$[^$])*\$\$",
            "code",
        )?],
        "single_quote",
    )?;
    // Quotes are escaped by doubling, not with backslashes.
    dialect.patch_lexer_matchers(vec![LexMatcher::regex(
        "single_quote",
        r"'([^']|'')*'",
        "code",
    )?])?;

    dialect.add(
        "JsonOperatorSegment",
        named("json_operator", vec!["binary_operator", "json_operator"]),
    )?;
    dialect.add(
        "DollarQuotedLiteralSegment",
        named("dollar_quote", vec!["literal", "dollar_quoted_literal"]),
    )?;

    dialect.replace(
        "BinaryOperatorGrammar",
        one_of(vec![
            r("ArithmeticBinaryOperatorGrammar"),
            r("StringBinaryOperatorGrammar"),
            r("BooleanBinaryOperatorGrammar"),
            r("ComparisonOperatorGrammar"),
            r("JsonOperatorSegment"),
        ]),
    )?;
    dialect.replace(
        "LiteralGrammar",
        one_of(vec![
            r("QuotedLiteralSegment"),
            r("NumericLiteralSegment"),
            r("BooleanLiteralGrammar"),
            r("QualifiedNumericLiteralSegment"),
            r("DollarQuotedLiteralSegment"),
            kw("NULL"),
        ]),
    )?;
    Ok(dialect)
}
