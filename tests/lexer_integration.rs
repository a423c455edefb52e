//! Integration tests for the regex-to-DFA lexing pipeline
//!
//! These exercise the full path: regex text -> syntax tree -> NFA -> DFA ->
//! tokenization, including the maximal-munch and priority rules.

use lexparse::prelude::*;

fn lex(specs: Vec<PatternSpec>, input: &str) -> Vec<Token> {
    PatternLexer::new(specs)
        .unwrap()
        .tokenize(input)
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

// ============================================================================
// Regex -> DFA matching
// ============================================================================

#[test]
fn test_regex_to_dfa_maximal_munch() {
    let dfa = parse_regex("a*").unwrap().compile().to_dfa();
    assert_eq!(dfa.longest_match("").unwrap().len, 0);
    assert_eq!(dfa.longest_match("aaaa").unwrap().len, 4);
    assert_eq!(dfa.longest_match("aab").unwrap().text, "aa");
}

#[test]
fn test_regex_any_char_bridging() {
    let dfa = Dfa::from_nfa(&parse_regex("a.*b").unwrap().compile());
    assert!(dfa.accepts("axyzb"));
    assert!(dfa.accepts("ab"));
    assert!(!dfa.accepts("a\nb"));
}

#[test]
fn test_nfa_dfa_agreement_on_alternation() {
    let nfa = parse_regex("(ab|a)*").unwrap().compile();
    let dfa = Dfa::from_nfa(&nfa);
    for input in ["", "a", "ab", "aab", "abab", "b", "ba"] {
        let codes: Vec<u32> = input.bytes().map(u32::from).collect();
        assert_eq!(nfa.accepts(&codes), dfa.accepts(input), "input {:?}", input);
    }
}

// ============================================================================
// Tokenization
// ============================================================================

#[test]
fn test_arithmetic_tokenization() {
    let tokens = lex(
        vec![
            PatternSpec::new("ADD", "\\+"),
            PatternSpec::new("SUB", "-"),
            PatternSpec::new("DIGITS", "[0-9]+"),
        ],
        "123+456-78",
    );
    let observed: Vec<(&str, &str)> = tokens
        .iter()
        .map(|t| (t.kind.as_str(), t.text.as_str()))
        .collect();
    assert_eq!(
        observed,
        vec![
            ("DIGITS", "123"),
            ("ADD", "+"),
            ("DIGITS", "456"),
            ("SUB", "-"),
            ("DIGITS", "78"),
        ]
    );
}

#[test]
fn test_keywords_shadow_identifiers() {
    let specs = vec![
        PatternSpec::new("IF", "if"),
        PatternSpec::new("WHILE", "while"),
        PatternSpec::new("IDENT", "[a-z][a-z0-9]*"),
        PatternSpec::ignored("WS", "[ ]+"),
    ];
    let tokens = lex(specs, "if whilex while");
    let kinds: Vec<&str> = tokens.iter().map(|t| t.kind.as_str()).collect();
    assert_eq!(kinds, vec!["IF", "IDENT", "WHILE"]);
}

#[test]
fn test_ignored_tokens_advance_but_disappear() {
    let tokens = lex(
        vec![
            PatternSpec::new("WORD", "[a-z]+"),
            PatternSpec::ignored("WS", "[ \\t\\n]+"),
            PatternSpec::ignored("COMMENT", "#[^\\n]*"),
        ],
        "alpha  # a comment\nbeta",
    );
    let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["alpha", "beta"]);
    // Positions account for everything skipped.
    assert_eq!(tokens[1].span.start.line, 2);
    assert_eq!(tokens[1].span.start.column, 1);
}

#[test]
fn test_unmatched_input_reports_offset() {
    let lexer = PatternLexer::new(vec![
        PatternSpec::new("WORD", "[a-z]+"),
        PatternSpec::ignored("WS", "[ ]+"),
    ])
    .unwrap();

    let results: Vec<_> = lexer.tokenize("abc ?rest").collect();
    let err = results.last().unwrap().as_ref().unwrap_err();
    match err {
        LexError::UnmatchedInput {
            offset, position, ..
        } => {
            assert_eq!(*offset, 4);
            assert_eq!(position.column, 5);
        }
    }
}

#[test]
fn test_lexer_is_lazy_and_single_pass() {
    let lexer = PatternLexer::new(vec![PatternSpec::new("A", "a")]).unwrap();
    let mut tokens = lexer.tokenize("aaa");
    assert_eq!(tokens.next().unwrap().unwrap().span.start.offset, 0);
    assert_eq!(tokens.next().unwrap().unwrap().span.start.offset, 1);
    assert_eq!(tokens.next().unwrap().unwrap().span.start.offset, 2);
    assert!(tokens.next().is_none());
    assert!(tokens.next().is_none());
}

#[test]
fn test_escaped_class_shorthands() {
    let tokens = lex(
        vec![
            PatternSpec::new("NUM", "\\d+"),
            PatternSpec::new("WORD", "\\w+"),
            PatternSpec::ignored("WS", "[ ]+"),
        ],
        "123 abc_1",
    );
    assert_eq!(tokens[0].kind, "NUM");
    assert_eq!(tokens[1].kind, "WORD");
    assert_eq!(tokens[1].text, "abc_1");
}

#[test]
fn test_string_literal_pattern() {
    let tokens = lex(
        vec![
            PatternSpec::new("STRING", "\"[^\"]*\""),
            PatternSpec::ignored("WS", "[ ]+"),
        ],
        "\"hello\" \"\"",
    );
    assert_eq!(tokens[0].text, "\"hello\"");
    assert_eq!(tokens[1].text, "\"\"");
}

// ============================================================================
// TokenStream
// ============================================================================

#[test]
fn test_token_stream_over_lexer_output() {
    let lexer = PatternLexer::new(vec![
        PatternSpec::new("NUM", "[0-9]+"),
        PatternSpec::ignored("WS", "[ ]+"),
    ])
    .unwrap();
    let tokens: Vec<Token> = lexer
        .tokenize("1 2 3")
        .collect::<Result<_, _>>()
        .unwrap();

    let mut stream = TokenStream::from_tokens(tokens);
    assert_eq!(stream.peek().unwrap().text, "1");
    let one = stream.next().unwrap();
    assert_eq!(stream.peek().unwrap().text, "2");
    stream.push_back(one);
    assert_eq!(stream.next().unwrap().text, "1");
    assert_eq!(stream.next().unwrap().text, "2");
    assert_eq!(stream.next().unwrap().text, "3");
    assert!(stream.next().is_none());
}
