use std::sync::Arc;

use squill_core::TemplatedFile;

use crate::dialect::dialect_selector;

use super::*;

fn lex(sql: &str) -> (Vec<Segment>, Vec<LexError>) {
    let dialect = dialect_selector("ansi").unwrap();
    let file = Arc::new(TemplatedFile::from_string(sql));
    Lexer::new(&dialect).lex(&file)
}

fn dump(tokens: &[Segment]) -> String {
    tokens
        .iter()
        .map(|t| format!("{} {:?} {:?}\n", t.name(), t.raw(), t.marker().working_loc()))
        .collect()
}

#[test]
fn lex_simple_select() {
    let (tokens, errors) = lex("SELECT a ,b FROM t");
    assert!(errors.is_empty());
    insta::assert_snapshot!(dump(&tokens), @r#"
    code "SELECT" (1, 1)
    whitespace " " (1, 7)
    code "a" (1, 8)
    whitespace " " (1, 9)
    comma "," (1, 10)
    code "b" (1, 11)
    whitespace " " (1, 12)
    code "FROM" (1, 13)
    whitespace " " (1, 17)
    code "t" (1, 18)
    "#);
}

#[test]
fn lex_tracks_lines() {
    let (tokens, _) = lex("select 1\n  -- note\nfrom t");
    insta::assert_snapshot!(dump(&tokens), @r#"
    code "select" (1, 1)
    whitespace " " (1, 7)
    numeric_literal "1" (1, 8)
    newline "\n" (1, 9)
    whitespace "  " (2, 1)
    inline_comment "-- note" (2, 3)
    newline "\n" (2, 10)
    code "from" (3, 1)
    whitespace " " (3, 5)
    code "t" (3, 6)
    "#);
}

#[test]
fn lex_operators_prefer_longest_listed_first() {
    let (tokens, _) = lex("a<>b>=c::int||'x'");
    let names: Vec<_> = tokens.iter().map(Segment::name).collect();
    assert_eq!(
        names,
        vec![
            "code",
            "not_equal",
            "code",
            "greater_than_or_equal",
            "code",
            "casting_operator",
            "code",
            "concat_operator",
            "single_quote",
        ]
    );
}

#[test]
fn lex_block_comment_spans_lines() {
    let (tokens, errors) = lex("/* a\n * b */select");
    assert!(errors.is_empty());
    assert_eq!(tokens[0].raw(), "/* a\n * b */");
    assert!(tokens[0].is_comment());
    assert_eq!(tokens[1].marker().working_loc(), (2, 8));
}

#[test]
fn unlexable_characters_are_coalesced() {
    let (tokens, errors) = lex("select @@ 1");
    assert_eq!(errors.len(), 1);
    insta::assert_snapshot!(errors[0].to_string(), @"Unable to lex characters: '@@'");
    assert_eq!(errors[0].marker.working_loc(), (1, 8));

    let raw: String = tokens.iter().map(Segment::raw).collect();
    assert_eq!(raw, "select @@ 1");
    assert!(tokens.iter().any(|t| t.name() == "unlexable"));
}

#[test]
fn lex_empty_input() {
    let (tokens, errors) = lex("");
    assert!(tokens.is_empty());
    assert!(errors.is_empty());
}

#[test]
fn regex_matcher_is_anchored() {
    let matcher = LexMatcher::regex("code", "[a-z]+", "code").unwrap();
    assert_eq!(matcher.match_len("abc def"), Some(3));
    assert_eq!(matcher.match_len(" abc"), None);
    insta::assert_snapshot!(format!("{matcher:?}"), @"code(/[a-z]+/)");
}

#[test]
fn invalid_matcher_pattern() {
    assert!(LexMatcher::regex("bad", "(", "code").is_err());
}
