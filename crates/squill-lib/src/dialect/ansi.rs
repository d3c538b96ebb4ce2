//! The ANSI dialect: the base every other dialect is copied from.

use crate::lexer::LexMatcher;
use crate::parser::{
    BracketPair, Grammar, SegmentDef, any_number_of, anything, bracketed, dedent, delimited,
    greedy_until, indent, kw, named, nothing, one_of, r, regex, seq, starts_with, symbol,
};

use super::keywords::{BARE_FUNCTIONS, DATETIME_UNITS, RESERVED_KEYWORDS, UNRESERVED_KEYWORDS};
use super::{Dialect, DialectElement, DialectError};

/// The unexpanded ANSI dialect.
pub fn ansi_dialect() -> Result<Dialect, DialectError> {
    let mut dialect = Dialect::new("ansi", lexer_matchers()?);

    dialect.update_set("bare_functions", BARE_FUNCTIONS)?;
    dialect.update_set("datetime_units", DATETIME_UNITS)?;
    dialect.update_set("unreserved_keywords", UNRESERVED_KEYWORDS)?;
    dialect.update_set("reserved_keywords", RESERVED_KEYWORDS)?;

    dialect.add_bracket_pair(BracketPair::new(
        "round",
        "StartBracketSegment",
        "EndBracketSegment",
    ))?;
    dialect.add_bracket_pair(BracketPair::new(
        "square",
        "StartSquareBracketSegment",
        "EndSquareBracketSegment",
    ))?;

    add_symbols(&mut dialect)?;
    add_terminals(&mut dialect)?;
    add_grammars(&mut dialect)?;
    add_expression_segments(&mut dialect)?;
    add_select_segments(&mut dialect)?;
    add_statement_segments(&mut dialect)?;
    Ok(dialect)
}

fn lexer_matchers() -> Result<Vec<LexMatcher>, DialectError> {
    Ok(vec![
        LexMatcher::regex("whitespace", r"[\t ]+", "whitespace")?,
        LexMatcher::regex("inline_comment", r"(--|#)[^\n]*", "comment")?,
        LexMatcher::regex("block_comment", r"/\*([^*]|\*+[^*/])*\*+/", "comment")?,
        LexMatcher::regex("single_quote", r"'([^'\\]|\\.)*'", "code")?,
        LexMatcher::regex("double_quote", r#""([^"\\]|\\.)*""#, "code")?,
        LexMatcher::regex("back_quote", r"`[^`]*`", "code")?,
        LexMatcher::regex("numeric_literal", r"([0-9]+(\.[0-9]+)?)|(\.[0-9]+)", "code")?,
        LexMatcher::regex("not_equal", r"!=|<>", "code")?,
        LexMatcher::string("greater_than_or_equal", ">=", "code"),
        LexMatcher::string("less_than_or_equal", "<=", "code"),
        LexMatcher::regex("newline", r"\r\n|\n", "newline")?,
        LexMatcher::string("casting_operator", "::", "code"),
        LexMatcher::string("concat_operator", "||", "code"),
        LexMatcher::string("equals", "=", "code"),
        LexMatcher::string("greater_than", ">", "code"),
        LexMatcher::string("less_than", "<", "code"),
        LexMatcher::string("dot", ".", "code"),
        LexMatcher::string("comma", ",", "comma"),
        LexMatcher::string("plus", "+", "code"),
        LexMatcher::string("tilde", "~", "code"),
        LexMatcher::string("minus", "-", "code"),
        LexMatcher::string("divide", "/", "code"),
        LexMatcher::string("percent", "%", "code"),
        LexMatcher::string("star", "*", "code"),
        LexMatcher::string("bracket_open", "(", "code"),
        LexMatcher::string("bracket_close", ")", "code"),
        LexMatcher::string("sq_bracket_open", "[", "code"),
        LexMatcher::string("sq_bracket_close", "]", "code"),
        LexMatcher::string("colon", ":", "code"),
        LexMatcher::string("semicolon", ";", "code"),
        LexMatcher::regex("code", r"[0-9a-zA-Z_]+", "code")?,
    ])
}

fn sym(template: &str, type_tag: &'static str) -> Grammar {
    symbol(template, vec![type_tag, "symbol"])
}

fn add_symbols(d: &mut Dialect) -> Result<(), DialectError> {
    let symbols = [
        ("SemicolonSegment", ";", "statement_terminator"),
        ("ColonSegment", ":", "colon"),
        ("SliceSegment", ":", "slice"),
        ("StartBracketSegment", "(", "start_bracket"),
        ("EndBracketSegment", ")", "end_bracket"),
        ("StartSquareBracketSegment", "[", "start_square_bracket"),
        ("EndSquareBracketSegment", "]", "end_square_bracket"),
        ("CommaSegment", ",", "comma"),
        ("DotSegment", ".", "dot"),
        ("StarSegment", "*", "star"),
        ("TildeSegment", "~", "tilde"),
        ("CastOperatorSegment", "::", "casting_operator"),
        ("PlusSegment", "+", "binary_operator"),
        ("MinusSegment", "-", "binary_operator"),
        ("PositiveSegment", "+", "sign_indicator"),
        ("NegativeSegment", "-", "sign_indicator"),
        ("DivideSegment", "/", "binary_operator"),
        ("MultiplySegment", "*", "binary_operator"),
        ("ModuloSegment", "%", "binary_operator"),
        ("ConcatSegment", "||", "binary_operator"),
        ("EqualsSegment", "=", "comparison_operator"),
        ("GreaterThanSegment", ">", "comparison_operator"),
        ("LessThanSegment", "<", "comparison_operator"),
        ("GreaterThanOrEqualToSegment", ">=", "comparison_operator"),
        ("LessThanOrEqualToSegment", "<=", "comparison_operator"),
        ("NotEqualToSegment_a", "!=", "comparison_operator"),
        ("NotEqualToSegment_b", "<>", "comparison_operator"),
    ];
    for (name, template, type_tag) in symbols {
        d.add(name, sym(template, type_tag))?;
    }
    d.add("TrueSegment", symbol("TRUE", vec!["literal", "boolean_literal"]))?;
    d.add("FalseSegment", symbol("FALSE", vec!["literal", "boolean_literal"]))?;
    Ok(())
}

/// Alternation of `words`, for regexes generated from a dialect set.
fn alternation<'a>(words: impl Iterator<Item = &'a str>) -> String {
    words.map(regex_syntax::escape).collect::<Vec<_>>().join("|")
}

fn bare_function(d: &Dialect) -> Result<DialectElement, DialectError> {
    let pattern = alternation(d.set("bare_functions"));
    Ok(regex(&pattern, None, vec!["bare_function"])?.into())
}

fn naked_identifier(d: &Dialect) -> Result<DialectElement, DialectError> {
    let reserved = alternation(d.set("reserved_keywords"));
    let anti = (!reserved.is_empty()).then_some(reserved.as_str());
    Ok(regex("[A-Z0-9_]*[A-Z][A-Z0-9_]*", anti, vec!["identifier"])?.into())
}

fn datetime_unit(d: &Dialect) -> Result<DialectElement, DialectError> {
    let pattern = alternation(d.set("datetime_units"));
    Ok(regex(&pattern, None, vec!["date_part"])?.into())
}

/// Leaf parsers that don't come from a fixed symbol.
fn add_terminals(d: &mut Dialect) -> Result<(), DialectError> {
    d.add("BareFunctionSegment", DialectElement::Generator(bare_function))?;
    d.add("NakedIdentifierSegment", DialectElement::Generator(naked_identifier))?;
    d.add("DatetimeUnitSegment", DialectElement::Generator(datetime_unit))?;
    d.add("ParameterNameSegment", regex("[A-Z][A-Z0-9_]*", None, vec!["parameter"])?)?;
    d.add("FunctionNameSegment", regex("[A-Z][A-Z0-9_]*", None, vec!["function_name"])?)?;
    d.add(
        "DatatypeIdentifierSegment",
        regex("[A-Z][A-Z0-9_]*", None, vec!["data_type_identifier"])?,
    )?;
    d.add("QuotedIdentifierSegment", named("double_quote", vec!["identifier", "quoted_identifier"]))?;
    d.add("QuotedLiteralSegment", named("single_quote", vec!["literal", "quoted_literal"]))?;
    d.add("NumericLiteralSegment", named("numeric_literal", vec!["literal", "numeric_literal"]))?;
    Ok(())
}

fn add_grammars(d: &mut Dialect) -> Result<(), DialectError> {
    d.add(
        "SingleIdentifierGrammar",
        one_of(vec![r("NakedIdentifierSegment"), r("QuotedIdentifierSegment")]),
    )?;
    d.add(
        "BooleanLiteralGrammar",
        one_of(vec![r("TrueSegment"), r("FalseSegment")]),
    )?;
    d.add(
        "ArithmeticBinaryOperatorGrammar",
        one_of(vec![
            r("PlusSegment"),
            r("MinusSegment"),
            r("DivideSegment"),
            r("MultiplySegment"),
            r("ModuloSegment"),
        ]),
    )?;
    d.add("StringBinaryOperatorGrammar", one_of(vec![r("ConcatSegment")]))?;
    d.add("BooleanBinaryOperatorGrammar", one_of(vec![kw("AND"), kw("OR")]))?;
    d.add(
        "ComparisonOperatorGrammar",
        one_of(vec![
            r("EqualsSegment"),
            r("GreaterThanSegment"),
            r("LessThanSegment"),
            r("GreaterThanOrEqualToSegment"),
            r("LessThanOrEqualToSegment"),
            r("NotEqualToSegment_a"),
            r("NotEqualToSegment_b"),
        ]),
    )?;
    d.add(
        "LiteralGrammar",
        one_of(vec![
            r("QuotedLiteralSegment"),
            r("NumericLiteralSegment"),
            r("BooleanLiteralGrammar"),
            r("QualifiedNumericLiteralSegment"),
            // NULL is otherwise easily taken for an identifier.
            kw("NULL"),
        ]),
    )?;
    d.add(
        "BinaryOperatorGrammar",
        one_of(vec![
            r("ArithmeticBinaryOperatorGrammar"),
            r("StringBinaryOperatorGrammar"),
            r("BooleanBinaryOperatorGrammar"),
            r("ComparisonOperatorGrammar"),
        ]),
    )?;
    d.add(
        "BracketedColumnReferenceListGrammar",
        bracketed(vec![delimited(vec![r("ColumnReferenceSegment")])]),
    )?;

    // Hooks for derived dialects.
    d.add("PreTableFunctionKeywordsGrammar", nothing())?;
    d.add("PostTableExpressionGrammar", nothing())?;
    d.add("JoinLikeClauseGrammar", nothing())?;
    d.add("FunctionContentsExpressionGrammar", r("ExpressionSegment"))?;

    d.add(
        "FunctionContentsGrammar",
        one_of(vec![
            // CAST(x AS type)
            seq(vec![r("ExpressionSegment"), kw("AS"), r("DatatypeSegment")]),
            // EXTRACT(unit FROM x), SUBSTRING(x FROM y)
            seq(vec![
                one_of(vec![r("DatetimeUnitSegment"), r("ExpressionSegment")]),
                kw("FROM"),
                r("ExpressionSegment"),
            ]),
            seq(vec![
                kw("DISTINCT").optional(),
                one_of(vec![
                    r("StarSegment"),
                    delimited(vec![r("FunctionContentsExpressionGrammar")]),
                ]),
            ]),
        ]),
    )?;
    d.add(
        "PostFunctionGrammar",
        seq(vec![
            seq(vec![one_of(vec![kw("IGNORE"), kw("RESPECT")]), kw("NULLS")]).optional(),
            r("OverClauseSegment"),
        ]),
    )?;

    d.add("Expression_A_Grammar", expression_a())?;
    d.add(
        "Expression_C_Grammar",
        one_of(vec![
            r("Expression_D_Grammar"),
            r("CaseExpressionSegment"),
            seq(vec![kw("EXISTS"), bracketed(vec![r("SelectableGrammar")])]),
        ]),
    )?;
    d.add(
        "Expression_D_Grammar",
        seq(vec![
            one_of(vec![
                r("BareFunctionSegment"),
                r("FunctionSegment"),
                bracketed(vec![one_of(vec![
                    r("Expression_A_Grammar"),
                    r("SelectableGrammar"),
                ])]),
                r("SelectStatementSegment"),
                r("LiteralGrammar"),
                r("IntervalExpressionSegment"),
                r("ColumnReferenceSegment"),
                r("ArrayLiteralSegment"),
            ]),
            r("Accessor_Grammar").optional(),
            r("ShorthandCastSegment").optional(),
        ]),
    )?;
    d.add("Accessor_Grammar", any_number_of(vec![r("ArrayAccessorSegment")]))?;

    d.add(
        "SelectableGrammar",
        one_of(vec![
            r("WithCompoundStatementSegment"),
            r("NonWithSelectableGrammar"),
        ]),
    )?;
    d.add(
        "NonWithSelectableGrammar",
        one_of(vec![r("SetExpressionSegment"), r("NonSetSelectableGrammar")]),
    )?;
    d.add(
        "NonSetSelectableGrammar",
        one_of(vec![r("SelectStatementSegment"), r("ValuesClauseSegment")]),
    )?;
    Ok(())
}

/// Operators and predicates chained onto a leading operand.
fn expression_a() -> Grammar {
    let arithmetic_tail = || {
        any_number_of(vec![seq(vec![
            r("ArithmeticBinaryOperatorGrammar"),
            r("Expression_C_Grammar"),
        ])])
    };
    seq(vec![
        one_of(vec![
            r("Expression_C_Grammar"),
            seq(vec![
                one_of(vec![r("PositiveSegment"), r("NegativeSegment"), kw("NOT")]),
                r("Expression_A_Grammar"),
            ]),
        ]),
        any_number_of(vec![one_of(vec![
            seq(vec![
                one_of(vec![
                    r("BinaryOperatorGrammar"),
                    seq(vec![
                        kw("NOT").optional(),
                        one_of(vec![kw("LIKE"), kw("RLIKE"), kw("ILIKE")]),
                    ]),
                ]),
                r("Expression_A_Grammar"),
                seq(vec![kw("ESCAPE"), r("Expression_A_Grammar")]).optional(),
            ]),
            seq(vec![
                kw("NOT").optional(),
                kw("IN"),
                bracketed(vec![one_of(vec![
                    delimited(vec![r("LiteralGrammar"), r("IntervalExpressionSegment")]),
                    r("SelectableGrammar"),
                ])]),
            ]),
            seq(vec![kw("NOT").optional(), kw("IN"), r("FunctionSegment")]),
            seq(vec![
                kw("IS"),
                kw("NOT").optional(),
                one_of(vec![
                    kw("NULL"),
                    kw("NAN"),
                    kw("NOTNULL"),
                    kw("ISNULL"),
                    r("BooleanLiteralGrammar"),
                ]),
            ]),
            // Only arithmetic inside BETWEEN, or its AND would be taken as an operator.
            seq(vec![
                kw("NOT").optional(),
                kw("BETWEEN"),
                r("Expression_C_Grammar"),
                arithmetic_tail(),
                kw("AND"),
                r("Expression_C_Grammar"),
                arithmetic_tail(),
            ]),
        ])]),
    ])
}

fn object_reference() -> Grammar {
    delimited(vec![r("SingleIdentifierGrammar")])
        .delimiter(r("DotSegment"))
        .terminator(one_of(vec![
            r("CommaSegment"),
            r("CastOperatorSegment"),
            r("StartSquareBracketSegment"),
            r("StartBracketSegment"),
            r("BinaryOperatorGrammar"),
            r("ColonSegment"),
            r("SemicolonSegment"),
        ]))
        .no_gaps()
}

fn case_when() -> Grammar {
    seq(vec![
        kw("WHEN"),
        indent(),
        r("ExpressionSegment"),
        kw("THEN"),
        r("ExpressionSegment"),
        dedent(),
    ])
}

fn case_else() -> Grammar {
    seq(vec![kw("ELSE"), indent(), r("ExpressionSegment"), dedent()]).optional()
}

fn add_expression_segments(d: &mut Dialect) -> Result<(), DialectError> {
    d.add_segment(SegmentDef::new(
        "IntervalExpressionSegment",
        "interval_expression",
        seq(vec![
            kw("INTERVAL"),
            one_of(vec![
                seq(vec![
                    r("NumericLiteralSegment"),
                    one_of(vec![r("QuotedLiteralSegment"), r("DatetimeUnitSegment")]),
                ]),
                r("QuotedLiteralSegment"),
            ]),
        ]),
    ))?;
    d.add_segment(SegmentDef::new(
        "ArrayLiteralSegment",
        "array_literal",
        bracketed(vec![delimited(vec![r("ExpressionSegment")])]).bracket_type("square"),
    ))?;
    d.add_segment(SegmentDef::new(
        "DatatypeSegment",
        "data_type",
        seq(vec![
            r("DatatypeIdentifierSegment"),
            bracketed(vec![delimited(vec![r("ExpressionSegment")]).optional()]).optional(),
        ]),
    ))?;
    d.add_segment(SegmentDef::new(
        "ObjectReferenceSegment",
        "object_reference",
        object_reference(),
    ))?;
    d.add_segment(SegmentDef::new(
        "TableReferenceSegment",
        "table_reference",
        object_reference(),
    ))?;
    d.add_segment(SegmentDef::new(
        "ColumnReferenceSegment",
        "column_reference",
        object_reference(),
    ))?;
    d.add_segment(SegmentDef::new(
        "ArrayAccessorSegment",
        "array_accessor",
        bracketed(vec![
            delimited(vec![one_of(vec![
                r("NumericLiteralSegment"),
                r("ExpressionSegment"),
            ])])
            .delimiter(r("SliceSegment")),
        ])
        .bracket_type("square"),
    ))?;
    d.add_segment(SegmentDef::new(
        "AliasExpressionSegment",
        "alias_expression",
        seq(vec![kw("AS").optional(), r("SingleIdentifierGrammar")]),
    ))?;
    d.add_segment(SegmentDef::new(
        "ShorthandCastSegment",
        "cast_expression",
        seq(vec![r("CastOperatorSegment"), r("DatatypeSegment")]).no_gaps(),
    ))?;
    d.add_segment(SegmentDef::new(
        "QualifiedNumericLiteralSegment",
        "numeric_literal",
        seq(vec![
            one_of(vec![r("PlusSegment"), r("MinusSegment")]),
            r("NumericLiteralSegment"),
        ])
        .no_gaps(),
    ))?;
    d.add_segment(SegmentDef::new(
        "OverClauseSegment",
        "over_clause",
        seq(vec![
            kw("OVER"),
            bracketed(vec![
                seq(vec![
                    r("PartitionClauseSegment").optional(),
                    r("OrderByClauseSegment").optional(),
                    r("FrameClauseSegment").optional(),
                ])
                .optional(),
            ]),
        ]),
    ))?;
    d.add_segment(SegmentDef::new(
        "FunctionSegment",
        "function",
        seq(vec![
            seq(vec![
                r("FunctionNameSegment"),
                bracketed(vec![r("FunctionContentsGrammar").optional()]),
            ]),
            r("PostFunctionGrammar").optional(),
        ]),
    ))?;
    d.add_segment(
        SegmentDef::new(
            "PartitionClauseSegment",
            "partitionby_clause",
            starts_with(kw("PARTITION"))
                .terminator(one_of(vec![kw("ORDER"), kw("ROWS"), kw("RANGE")])),
        )
        .with_parse_grammar(seq(vec![
            kw("PARTITION"),
            kw("BY"),
            indent(),
            one_of(vec![
                bracketed(vec![delimited(vec![r("ExpressionSegment")])]),
                delimited(vec![r("ExpressionSegment")]),
            ]),
            dedent(),
        ])),
    )?;

    let frame_bound = one_of(vec![
        seq(vec![kw("CURRENT"), kw("ROW")]),
        seq(vec![
            one_of(vec![kw("UNBOUNDED"), r("NumericLiteralSegment")]),
            one_of(vec![kw("PRECEDING"), kw("FOLLOWING")]),
        ]),
    ]);
    d.add_segment(SegmentDef::new(
        "FrameClauseSegment",
        "frame_clause",
        seq(vec![
            one_of(vec![kw("ROWS"), kw("RANGE")]),
            one_of(vec![
                seq(vec![
                    kw("BETWEEN"),
                    frame_bound.clone(),
                    kw("AND"),
                    frame_bound.clone(),
                ]),
                frame_bound,
            ]),
        ]),
    ))?;

    d.add_segment(SegmentDef::new(
        "CaseExpressionSegment",
        "case_expression",
        one_of(vec![
            seq(vec![
                kw("CASE"),
                indent(),
                any_number_of(vec![case_when()]).min_times(1),
                case_else(),
                dedent(),
                kw("END"),
            ]),
            seq(vec![
                kw("CASE"),
                r("ExpressionSegment"),
                indent(),
                any_number_of(vec![case_when()]).min_times(1),
                case_else(),
                dedent(),
                kw("END"),
            ]),
        ]),
    ))?;
    d.add_segment(SegmentDef::new(
        "ExpressionSegment",
        "expression",
        r("Expression_A_Grammar"),
    ))?;
    Ok(())
}

fn add_select_segments(d: &mut Dialect) -> Result<(), DialectError> {
    d.add_segment(SegmentDef::new(
        "TableExpressionSegment",
        "table_expression",
        seq(vec![
            r("PreTableFunctionKeywordsGrammar").optional(),
            one_of(vec![
                r("BareFunctionSegment"),
                r("FunctionSegment"),
                r("TableReferenceSegment"),
                bracketed(vec![r("SelectableGrammar")]),
            ]),
            r("AliasExpressionSegment").optional(),
            r("PostTableExpressionGrammar").optional(),
        ]),
    ))?;
    d.add_segment(SegmentDef::new(
        "WildcardIdentifierSegment",
        "wildcard_identifier",
        seq(vec![
            any_number_of(vec![seq(vec![
                r("SingleIdentifierGrammar"),
                r("DotSegment"),
            ])]),
            r("StarSegment"),
        ])
        .no_gaps(),
    ))?;
    d.add_segment(SegmentDef::new(
        "WildcardExpressionSegment",
        "wildcard_expression",
        seq(vec![r("WildcardIdentifierSegment")]),
    ))?;
    d.add_segment(
        SegmentDef::new(
            "SelectTargetElementSegment",
            "select_target_element",
            greedy_until(vec![
                kw("FROM"),
                kw("LIMIT"),
                r("CommaSegment"),
                r("SetOperatorSegment"),
            ])
            .enforce_whitespace_preceding(),
        )
        .with_parse_grammar(one_of(vec![
            r("WildcardExpressionSegment"),
            seq(vec![
                one_of(vec![
                    r("LiteralGrammar"),
                    r("BareFunctionSegment"),
                    r("FunctionSegment"),
                    r("IntervalExpressionSegment"),
                    r("ColumnReferenceSegment"),
                    r("ExpressionSegment"),
                ]),
                r("AliasExpressionSegment").optional(),
            ]),
        ])),
    )?;
    d.add_segment(SegmentDef::new(
        "SelectClauseModifierSegment",
        "select_clause_modifier",
        one_of(vec![kw("DISTINCT"), kw("ALL")]),
    ))?;
    d.add_segment(
        SegmentDef::new(
            "SelectClauseSegment",
            "select_clause",
            starts_with(seq(vec![
                kw("SELECT"),
                r("WildcardExpressionSegment").optional(),
            ]))
            .terminator(one_of(vec![
                kw("FROM"),
                kw("LIMIT"),
                r("SetOperatorSegment"),
            ])),
        )
        .with_parse_grammar(seq(vec![
            kw("SELECT"),
            r("SelectClauseModifierSegment").optional(),
            indent(),
            delimited(vec![r("SelectTargetElementSegment")]).allow_trailing(),
            // The matching dedent lives in the statement, after any whitespace.
        ])),
    )?;
    d.add_segment(SegmentDef::new(
        "JoinClauseSegment",
        "join_clause",
        seq(vec![
            any_number_of(vec![
                kw("FULL"),
                kw("INNER"),
                kw("LEFT"),
                kw("RIGHT"),
                kw("CROSS"),
            ])
            .max_times(1)
            .optional(),
            kw("OUTER").optional(),
            kw("JOIN"),
            indent(),
            r("TableExpressionSegment"),
            any_number_of(vec![
                seq(vec![
                    kw("ON"),
                    indent(),
                    one_of(vec![
                        r("ExpressionSegment"),
                        bracketed(vec![r("ExpressionSegment")]),
                    ]),
                    dedent(),
                ]),
                seq(vec![
                    kw("USING"),
                    indent(),
                    bracketed(vec![delimited(vec![r("SingleIdentifierGrammar")])]),
                    dedent(),
                ]),
            ]),
            dedent(),
        ]),
    ))?;
    d.add_segment(
        SegmentDef::new(
            "FromClauseSegment",
            "from_clause",
            starts_with(kw("FROM")).terminator(one_of(vec![
                kw("WHERE"),
                kw("LIMIT"),
                kw("GROUP"),
                kw("ORDER"),
                kw("HAVING"),
                r("SetOperatorSegment"),
            ])),
        )
        .with_parse_grammar(seq(vec![
            kw("FROM"),
            indent(),
            delimited(vec![r("TableExpressionSegment")]).terminator(r("JoinClauseSegment")),
            dedent(),
            any_number_of(vec![r("JoinClauseSegment"), r("JoinLikeClauseGrammar")]).optional(),
        ])),
    )?;
    d.add_segment(
        SegmentDef::new(
            "WhereClauseSegment",
            "where_clause",
            starts_with(kw("WHERE")).terminator(one_of(vec![
                kw("LIMIT"),
                kw("GROUP"),
                kw("ORDER"),
                kw("HAVING"),
            ])),
        )
        .with_parse_grammar(seq(vec![
            kw("WHERE"),
            indent(),
            r("ExpressionSegment"),
            dedent(),
        ])),
    )?;
    d.add_segment(
        SegmentDef::new(
            "OrderByClauseSegment",
            "orderby_clause",
            starts_with(kw("ORDER")).terminator(one_of(vec![
                kw("LIMIT"),
                kw("HAVING"),
                kw("ROWS"),
                kw("RANGE"),
            ])),
        )
        .with_parse_grammar(seq(vec![
            kw("ORDER"),
            kw("BY"),
            indent(),
            delimited(vec![seq(vec![
                one_of(vec![
                    r("ColumnReferenceSegment"),
                    r("NumericLiteralSegment"),
                    r("ExpressionSegment"),
                ]),
                one_of(vec![kw("ASC"), kw("DESC")]).optional(),
                seq(vec![kw("NULLS"), one_of(vec![kw("FIRST"), kw("LAST")])]).optional(),
            ])])
            .terminator(kw("LIMIT")),
            dedent(),
        ])),
    )?;
    d.add_segment(
        SegmentDef::new(
            "GroupByClauseSegment",
            "groupby_clause",
            starts_with(seq(vec![kw("GROUP"), kw("BY")])).terminator(one_of(vec![
                kw("ORDER"),
                kw("LIMIT"),
                kw("HAVING"),
            ])),
        )
        .with_parse_grammar(seq(vec![
            kw("GROUP"),
            kw("BY"),
            indent(),
            delimited(vec![one_of(vec![
                r("ColumnReferenceSegment"),
                r("NumericLiteralSegment"),
                r("ExpressionSegment"),
            ])])
            .terminator(one_of(vec![kw("ORDER"), kw("LIMIT"), kw("HAVING")])),
            dedent(),
        ])),
    )?;
    d.add_segment(
        SegmentDef::new(
            "HavingClauseSegment",
            "having_clause",
            starts_with(kw("HAVING")).terminator(one_of(vec![kw("ORDER"), kw("LIMIT")])),
        )
        .with_parse_grammar(seq(vec![
            kw("HAVING"),
            indent(),
            one_of(vec![
                bracketed(vec![r("ExpressionSegment")]),
                r("ExpressionSegment"),
            ]),
            dedent(),
        ])),
    )?;
    d.add_segment(SegmentDef::new(
        "LimitClauseSegment",
        "limit_clause",
        seq(vec![
            kw("LIMIT"),
            one_of(vec![
                r("NumericLiteralSegment"),
                seq(vec![
                    r("NumericLiteralSegment"),
                    kw("OFFSET"),
                    r("NumericLiteralSegment"),
                ]),
                seq(vec![
                    r("NumericLiteralSegment"),
                    r("CommaSegment"),
                    r("NumericLiteralSegment"),
                ]),
            ]),
        ]),
    ))?;
    d.add_segment(SegmentDef::new(
        "ValuesClauseSegment",
        "values_clause",
        seq(vec![
            one_of(vec![kw("VALUE"), kw("VALUES")]),
            delimited(vec![bracketed(vec![delimited(vec![
                r("LiteralGrammar"),
                r("IntervalExpressionSegment"),
                r("ExpressionSegment"),
            ])])]),
        ]),
    ))?;
    d.add_segment(
        SegmentDef::new(
            "SelectStatementSegment",
            "select_statement",
            starts_with(r("SelectClauseSegment")).terminator(r("SetOperatorSegment")),
        )
        .with_parse_grammar(seq(vec![
            r("SelectClauseSegment"),
            dedent(),
            r("FromClauseSegment").optional(),
            r("WhereClauseSegment").optional(),
            r("GroupByClauseSegment").optional(),
            r("HavingClauseSegment").optional(),
            r("OrderByClauseSegment").optional(),
            r("LimitClauseSegment").optional(),
        ])),
    )?;
    d.add_segment(
        SegmentDef::new(
            "WithCompoundStatementSegment",
            "with_compound_statement",
            starts_with(kw("WITH")),
        )
        .with_parse_grammar(seq(vec![
            kw("WITH"),
            delimited(vec![seq(vec![
                r("SingleIdentifierGrammar"),
                kw("AS"),
                bracketed(vec![r("SelectableGrammar")]),
            ])])
            .terminator(kw("SELECT")),
            r("NonWithSelectableGrammar"),
        ])),
    )?;
    d.add_segment(SegmentDef::new(
        "SetOperatorSegment",
        "set_operator",
        one_of(vec![
            seq(vec![
                kw("UNION"),
                one_of(vec![kw("DISTINCT"), kw("ALL")]).optional(),
            ]),
            kw("INTERSECT"),
            kw("EXCEPT"),
            kw("MINUS"),
        ]),
    ))?;
    d.add_segment(SegmentDef::new(
        "SetExpressionSegment",
        "set_expression",
        seq(vec![
            r("NonSetSelectableGrammar"),
            any_number_of(vec![seq(vec![
                r("SetOperatorSegment"),
                r("NonSetSelectableGrammar"),
            ])])
            .min_times(1),
        ]),
    ))?;
    Ok(())
}

fn or_replace() -> Grammar {
    seq(vec![kw("OR"), kw("REPLACE")]).optional()
}

fn access_target() -> Grammar {
    one_of(vec![
        seq(vec![kw("TABLE").optional(), r("TableReferenceSegment")]),
        seq(vec![
            kw("ALL"),
            kw("TABLES"),
            kw("IN"),
            kw("SCHEMA"),
            r("ObjectReferenceSegment"),
        ]),
    ])
}

fn permission() -> Grammar {
    seq(vec![
        one_of(vec![
            seq(vec![kw("ALL"), kw("PRIVILEGES").optional()]),
            kw("SELECT"),
            kw("UPDATE"),
            kw("INSERT"),
        ]),
        r("BracketedColumnReferenceListGrammar").optional(),
    ])
}

fn add_statement_segments(d: &mut Dialect) -> Result<(), DialectError> {
    d.add_segment(
        SegmentDef::new(
            "InsertStatementSegment",
            "insert_statement",
            starts_with(kw("INSERT")),
        )
        .with_parse_grammar(seq(vec![
            kw("INSERT"),
            kw("OVERWRITE").optional(),
            kw("INTO").optional(),
            r("TableReferenceSegment"),
            r("BracketedColumnReferenceListGrammar").optional(),
            r("SelectableGrammar"),
        ])),
    )?;

    let chain = || seq(vec![kw("AND"), kw("NO").optional(), kw("CHAIN")]).optional();
    d.add_segment(SegmentDef::new(
        "TransactionStatementSegment",
        "transaction_statement",
        one_of(vec![
            seq(vec![kw("COMMIT"), kw("WORK").optional(), chain()]),
            seq(vec![kw("ROLLBACK"), kw("WORK").optional(), chain()]),
        ]),
    ))?;

    d.add_segment(SegmentDef::new(
        "ColumnOptionSegment",
        "column_constraint",
        seq(vec![
            seq(vec![kw("CONSTRAINT"), r("ObjectReferenceSegment")]).optional(),
            one_of(vec![
                seq(vec![kw("NOT").optional(), kw("NULL")]),
                seq(vec![kw("DEFAULT"), r("LiteralGrammar")]),
                seq(vec![kw("PRIMARY"), kw("KEY")]),
                kw("UNIQUE"),
                kw("AUTO_INCREMENT"),
                seq(vec![
                    kw("REFERENCES"),
                    r("ColumnReferenceSegment"),
                    r("BracketedColumnReferenceListGrammar").optional(),
                ]),
                seq(vec![kw("COMMENT"), r("QuotedLiteralSegment")]),
            ]),
        ]),
    ))?;
    d.add_segment(SegmentDef::new(
        "ColumnDefinitionSegment",
        "column_definition",
        seq(vec![
            r("SingleIdentifierGrammar"),
            r("DatatypeSegment"),
            bracketed(vec![anything()]).optional(),
            any_number_of(vec![r("ColumnOptionSegment")]),
        ]),
    ))?;
    d.add_segment(SegmentDef::new(
        "TableConstraintSegment",
        "table_constraint_definition",
        seq(vec![
            seq(vec![kw("CONSTRAINT"), r("ObjectReferenceSegment")]).optional(),
            one_of(vec![
                seq(vec![kw("UNIQUE"), r("BracketedColumnReferenceListGrammar")]),
                seq(vec![
                    kw("PRIMARY"),
                    kw("KEY"),
                    r("BracketedColumnReferenceListGrammar"),
                ]),
                seq(vec![
                    kw("FOREIGN"),
                    kw("KEY"),
                    r("BracketedColumnReferenceListGrammar"),
                    kw("REFERENCES"),
                    r("ColumnReferenceSegment"),
                    r("BracketedColumnReferenceListGrammar"),
                ]),
            ]),
        ]),
    ))?;
    d.add_segment(SegmentDef::new(
        "CreateTableStatementSegment",
        "create_table_statement",
        seq(vec![
            kw("CREATE"),
            or_replace(),
            kw("TABLE"),
            seq(vec![kw("IF"), kw("NOT"), kw("EXISTS")]).optional(),
            r("TableReferenceSegment"),
            one_of(vec![
                seq(vec![
                    bracketed(vec![delimited(vec![
                        r("ColumnDefinitionSegment"),
                        r("TableConstraintSegment"),
                    ])]),
                    seq(vec![kw("COMMENT"), r("QuotedLiteralSegment")]).optional(),
                ]),
                seq(vec![kw("AS"), r("SelectableGrammar")]),
                seq(vec![kw("LIKE"), r("TableReferenceSegment")]),
            ]),
        ]),
    ))?;
    d.add_segment(SegmentDef::new(
        "AlterTableStatementSegment",
        "alter_table_statement",
        seq(vec![
            kw("ALTER"),
            kw("TABLE"),
            r("TableReferenceSegment"),
            delimited(vec![
                seq(vec![
                    r("ParameterNameSegment"),
                    r("EqualsSegment").optional(),
                    one_of(vec![r("LiteralGrammar"), r("NakedIdentifierSegment")]),
                ]),
                seq(vec![
                    one_of(vec![kw("ADD"), kw("MODIFY")]),
                    kw("COLUMN").optional(),
                    r("ColumnDefinitionSegment"),
                    one_of(vec![
                        seq(vec![
                            one_of(vec![kw("FIRST"), kw("AFTER")]),
                            r("ColumnReferenceSegment"),
                        ]),
                        r("BracketedColumnReferenceListGrammar"),
                    ])
                    .optional(),
                ]),
            ]),
        ]),
    ))?;
    d.add_segment(SegmentDef::new(
        "CreateViewStatementSegment",
        "create_view_statement",
        seq(vec![
            kw("CREATE"),
            or_replace(),
            kw("VIEW"),
            r("TableReferenceSegment"),
            r("BracketedColumnReferenceListGrammar").optional(),
            kw("AS"),
            r("SelectableGrammar"),
        ]),
    ))?;
    d.add_segment(SegmentDef::new(
        "DropStatementSegment",
        "drop_statement",
        seq(vec![
            kw("DROP"),
            one_of(vec![kw("TABLE"), kw("VIEW")]),
            seq(vec![kw("IF"), kw("EXISTS")]).optional(),
            r("TableReferenceSegment"),
            one_of(vec![kw("RESTRICT"), kw("CASCADE")]).optional(),
        ]),
    ))?;
    d.add_segment(SegmentDef::new(
        "AccessStatementSegment",
        "access_statement",
        one_of(vec![
            seq(vec![
                kw("GRANT"),
                delimited(vec![permission()]),
                kw("ON"),
                access_target(),
                kw("TO"),
                one_of(vec![kw("GROUP"), kw("USER"), kw("ROLE")]).optional(),
                one_of(vec![r("ObjectReferenceSegment"), kw("PUBLIC")]),
                seq(vec![kw("WITH"), kw("GRANT"), kw("OPTION")]).optional(),
            ]),
            seq(vec![
                kw("REVOKE"),
                delimited(vec![seq(vec![
                    seq(vec![kw("GRANT"), kw("OPTION"), kw("FOR")]).optional(),
                    permission(),
                ])]),
                kw("ON"),
                access_target(),
                kw("FROM"),
                one_of(vec![kw("GROUP"), kw("USER"), kw("ROLE")]).optional(),
                r("ObjectReferenceSegment"),
                one_of(vec![kw("RESTRICT"), kw("CASCADE")]).optional(),
            ]),
        ]),
    ))?;
    d.add_segment(
        SegmentDef::new(
            "DeleteStatementSegment",
            "delete_statement",
            starts_with(kw("DELETE")),
        )
        .with_parse_grammar(seq(vec![
            kw("DELETE"),
            r("FromClauseSegment"),
            r("WhereClauseSegment").optional(),
        ])),
    )?;
    d.add_segment(
        SegmentDef::new(
            "UpdateStatementSegment",
            "update_statement",
            starts_with(kw("UPDATE")),
        )
        .with_parse_grammar(seq(vec![
            kw("UPDATE"),
            r("TableReferenceSegment"),
            r("AliasExpressionSegment").optional(),
            r("SetClauseListSegment"),
            r("WhereClauseSegment").optional(),
        ])),
    )?;
    d.add_segment(SegmentDef::new(
        "SetClauseListSegment",
        "set_clause_list",
        seq(vec![
            kw("SET"),
            indent(),
            delimited(vec![r("SetClauseSegment")]),
            dedent(),
        ]),
    ))?;
    d.add_segment(SegmentDef::new(
        "SetClauseSegment",
        "set_clause",
        seq(vec![
            r("ColumnReferenceSegment"),
            r("EqualsSegment"),
            one_of(vec![
                r("LiteralGrammar"),
                r("BareFunctionSegment"),
                r("FunctionSegment"),
                r("ColumnReferenceSegment"),
                r("ExpressionSegment"),
                kw("DEFAULT"),
            ]),
        ]),
    ))?;
    d.add_segment(
        SegmentDef::new(
            "StatementSegment",
            "statement",
            greedy_until(vec![r("SemicolonSegment")]),
        )
        .with_parse_grammar(one_of(vec![
            r("SelectableGrammar"),
            r("InsertStatementSegment"),
            r("TransactionStatementSegment"),
            r("DropStatementSegment"),
            r("AccessStatementSegment"),
            r("CreateTableStatementSegment"),
            r("AlterTableStatementSegment"),
            r("CreateViewStatementSegment"),
            r("DeleteStatementSegment"),
            r("UpdateStatementSegment"),
        ])),
    )?;
    d.add_segment(
        SegmentDef::new("FileSegment", "file", nothing())
            .with_parse_grammar(any_number_of(vec![one_of(vec![
                r("SemicolonSegment"),
                r("StatementSegment"),
            ])]))
            .allow_non_code_ends(),
    )?;
    Ok(())
}
