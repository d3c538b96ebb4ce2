use std::sync::Arc;

use squill_core::TemplatedFile;

use crate::dialect::{Dialect, dialect_selector};
use crate::lexer::Lexer;
use crate::segments::{MetaKind, Segment, join_raw};
use crate::Error;

use super::*;

fn parse_with(sql: &str, ctx: impl FnOnce(ParseContext<'_>) -> ParseContext<'_>) -> crate::Result<Segment> {
    let dialect = dialect_selector("ansi").unwrap();
    let file = Arc::new(TemplatedFile::from_string(sql));
    let (tokens, errors) = Lexer::new(&dialect).lex(&file);
    assert!(errors.is_empty(), "{errors:?}");
    let mut ctx = ctx(ParseContext::new(&dialect));
    parse_file(tokens, &file, &mut ctx)
}

fn parse(sql: &str) -> Segment {
    parse_with(sql, |ctx| ctx).unwrap()
}

#[test]
fn tree_reproduces_input() {
    for sql in [
        "",
        "SELECT a ,b FROM t",
        "select a, b\nfrom t\nwhere a = 1;\n",
        "SELECT * FROM",
        "SELECT (a + (b FROM t",
        "  -- only a comment\n",
        "select 1; select 2;;",
    ] {
        assert_eq!(parse(sql).raw(), sql);
    }
}

#[test]
fn select_is_fully_parsed() {
    let tree = parse("SELECT a ,b FROM t");
    assert!(tree.iter_unparsables().is_empty());
    assert_eq!(tree.recursive_crawl(&["select_statement"], true).len(), 1);
    assert_eq!(tree.recursive_crawl(&["select_clause"], true).len(), 1);
    assert_eq!(tree.recursive_crawl(&["from_clause"], true).len(), 1);

    let commas = tree.recursive_crawl(&["comma"], true);
    assert_eq!(commas.len(), 1);
    assert_eq!(commas[0].marker().source_position(), (1, 10));
}

#[test]
fn dangling_from_is_unparsable() {
    let tree = parse("SELECT * FROM");
    let unparsables = tree.iter_unparsables();
    assert!(!unparsables.is_empty());
    let first = &unparsables[0];
    assert!(first.unparsable_anchor().is_some());
    assert!(first.expected().is_some_and(|e| !e.is_empty()));
}

#[test]
fn parsing_is_deterministic() {
    let sql = "select a, count(b) from t join u using (id) group by a order by 1";
    let first = parse(sql).to_tuple(false);
    let second = parse(sql).to_tuple(false);
    assert_eq!(first, second);
}

#[test]
fn cache_does_not_change_result() {
    let sql = "select a from t where a in (select b from u) and c = 1";
    let cached = parse_with(sql, |ctx| ctx.with_cache(true)).unwrap();
    let uncached = parse_with(sql, |ctx| ctx.with_cache(false)).unwrap();
    assert_eq!(cached.to_tuple(false), uncached.to_tuple(false));
}

#[test]
fn parse_depth_is_bounded() {
    let err = parse_with("SELECT a FROM t", |ctx| ctx.with_max_parse_depth(1)).unwrap_err();
    assert!(matches!(err, Error::RecursionLimitExceeded));
}

/// Four keywords, commas and round brackets over the ANSI lexer.
fn test_dialect() -> Dialect {
    let ansi = dialect_selector("ansi").unwrap();
    let mut d = Dialect::new("test", ansi.lexer_matchers().to_vec());
    d.update_set("reserved_keywords", ["foo", "bar", "baz", "stop"])
        .unwrap();
    d.add("CommaSegment", symbol(",", vec!["comma"])).unwrap();
    d.add("StartBracketSegment", symbol("(", vec!["start_bracket"]))
        .unwrap();
    d.add("EndBracketSegment", symbol(")", vec!["end_bracket"]))
        .unwrap();
    d.add_bracket_pair(BracketPair::new(
        "round",
        "StartBracketSegment",
        "EndBracketSegment",
    ))
    .unwrap();
    d.expand().unwrap();
    d
}

fn tokens(dialect: &Dialect, sql: &str) -> Vec<Segment> {
    let file = Arc::new(TemplatedFile::from_string(sql));
    let (tokens, errors) = Lexer::new(dialect).lex(&file);
    assert!(errors.is_empty(), "{errors:?}");
    tokens
}

fn try_match(grammar: &Grammar, sql: &str) -> crate::Result<MatchResult> {
    let dialect = test_dialect();
    let segments = tokens(&dialect, sql);
    let mut ctx = ParseContext::new(&dialect);
    grammar.match_segments(&segments, &mut ctx)
}

/// Raw text of the matched and unmatched parts.
fn split(grammar: &Grammar, sql: &str) -> (String, String) {
    let result = try_match(grammar, sql).unwrap();
    (join_raw(&result.matched), join_raw(&result.unmatched))
}

fn pair(matched: &str, unmatched: &str) -> (String, String) {
    (matched.to_string(), unmatched.to_string())
}

fn word() -> Grammar {
    one_of(vec![kw("foo"), kw("bar"), kw("baz")])
}

#[test]
fn delimited_trailing_delimiter() {
    let list = delimited(vec![word()]);
    assert_eq!(split(&list, "foo, bar"), pair("foo, bar", ""));
    assert_eq!(split(&list, "foo, bar,"), pair("", "foo, bar,"));

    let trailing = delimited(vec![word()]).allow_trailing();
    assert_eq!(split(&trailing, "foo, bar,"), pair("foo, bar,", ""));
    assert_eq!(split(&trailing, "foo, bar"), pair("foo, bar", ""));
}

#[test]
fn delimited_min_delimiters() {
    let list = delimited(vec![word()]).min_delimiters(2);
    assert_eq!(split(&list, "foo, bar"), pair("", "foo, bar"));
    assert_eq!(split(&list, "foo, bar, baz"), pair("foo, bar, baz", ""));
}

#[test]
fn bracketed_empty_needs_optional_content() {
    let optional = bracketed(vec![kw("foo").optional()]);
    assert_eq!(split(&optional, "()"), pair("()", ""));

    let required = bracketed(vec![kw("foo")]);
    assert_eq!(split(&required, "()"), pair("", "()"));
    assert_eq!(split(&required, "( foo ) bar"), pair("( foo )", " bar"));

    let result = try_match(&required, "(foo)").unwrap();
    let metas: Vec<_> = result
        .matched
        .iter()
        .filter_map(Segment::meta_kind)
        .cloned()
        .collect();
    assert_eq!(metas, vec![MetaKind::Indent, MetaKind::Dedent]);
}

#[test]
fn unbalanced_brackets_are_errors() {
    let required = bracketed(vec![kw("foo")]);
    let err = try_match(&required, "(foo").unwrap_err();
    assert_eq!(err.to_string(), "Couldn't find closing bracket for opening bracket.");

    let until = greedy_until(vec![kw("stop")]);
    let err = try_match(&until, "foo ) stop").unwrap_err();
    assert_eq!(err.to_string(), "Found unexpected end bracket!");
}

#[test]
fn unbalanced_brackets_become_unparsable() {
    for sql in ["SELECT a) FROM t", "SELECT (a FROM t"] {
        let tree = parse(sql);
        assert_eq!(tree.raw(), sql);
        assert!(!tree.iter_unparsables().is_empty(), "{sql}");
    }
}

#[test]
fn greedy_until_skips_bracketed_terminators() {
    let until = greedy_until(vec![kw("stop")]);
    assert_eq!(split(&until, "foo (stop) stop"), pair("foo (stop) ", "stop"));
    assert_eq!(split(&until, "foo bar"), pair("foo bar", ""));
}

#[test]
fn greedy_until_whitespace_and_terminator_options() {
    let plain = greedy_until(vec![kw("stop")]);
    assert_eq!(split(&plain, "foo,stop bar stop"), pair("foo,", "stop bar stop"));

    let spaced = greedy_until(vec![kw("stop")]).enforce_whitespace_preceding();
    assert_eq!(split(&spaced, "foo,stop bar stop"), pair("foo,stop bar ", "stop"));

    let inclusive = greedy_until(vec![kw("stop")])
        .enforce_whitespace_preceding()
        .include_terminator();
    assert_eq!(split(&inclusive, "foo,stop bar stop"), pair("foo,stop bar stop", ""));
}

#[test]
fn starts_with_runs_to_terminator() {
    let open = starts_with(kw("foo"));
    assert_eq!(split(&open, "foo bar baz"), pair("foo bar baz", ""));
    assert_eq!(split(&open, "bar foo"), pair("", "bar foo"));

    let bounded = starts_with(kw("foo")).terminator(kw("stop"));
    assert_eq!(split(&bounded, "foo bar stop baz"), pair("foo bar ", "stop baz"));

    let inclusive = starts_with(kw("foo")).terminator(kw("stop")).include_terminator();
    assert_eq!(split(&inclusive, "foo bar stop baz"), pair("foo bar stop", " baz"));
}

#[test]
fn contains_only_types_and_grammars() {
    let only = contains_only(vec!["comma"], vec![kw("foo")]);
    assert_eq!(split(&only, "foo, foo"), pair("foo, foo", ""));
    assert_eq!(split(&only, "foo, bar"), pair("", "foo, bar"));
}

#[test]
fn any_number_of_bounds() {
    let capped = any_number_of(vec![kw("foo")]).max_times(2);
    assert_eq!(split(&capped, "foo foo foo"), pair("foo foo", " foo"));

    let at_least = any_number_of(vec![kw("foo")]).min_times(2);
    assert_eq!(split(&at_least, "foo"), pair("", "foo"));
    assert_eq!(split(&at_least, "foo foo"), pair("foo foo", ""));

    let any = any_number_of(vec![kw("foo")]);
    assert_eq!(split(&any, "bar"), pair("", "bar"));
}

#[test]
fn one_of_prefers_longest_then_first() {
    let longest = one_of(vec![kw("foo"), seq(vec![kw("foo"), kw("bar")])]);
    assert_eq!(split(&longest, "foo bar baz"), pair("foo bar", " baz"));

    let tied = one_of(vec![
        named("code", vec!["first"]),
        named("code", vec!["second"]),
    ]);
    let result = try_match(&tied, "foo bar").unwrap();
    assert_eq!(join_raw(&result.matched), "foo");
    assert!(result.matched[0].is_type("first"));
}

#[test]
fn anything_and_nothing() {
    assert_eq!(split(&anything(), "foo bar"), pair("foo bar", ""));
    assert_eq!(split(&nothing(), "foo bar"), pair("", "foo bar"));
}
