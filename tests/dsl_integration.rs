//! Integration tests for the grammar-definition DSL
//!
//! Compiles DSL sources end to end and drives the resulting lexer/parser
//! pairs over real input.

use lexparse::prelude::*;
use lexparse::compile_dsl;

fn lex_with(compiled_lexer: &PatternLexer, input: &str) -> Vec<Token> {
    compiled_lexer
        .tokenize(input)
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn test_minimal_language() {
    let compiled = compile_dsl("TOKEN_A = \"a\"\nRoot = [TOKEN_A]").unwrap();

    let tokens = lex_with(&compiled.lexer, "a");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, "TOKEN_A");

    let parser = BacktrackingParser::new(&compiled.grammar, "Root").unwrap();
    let parse = parser.parse(tokens).unwrap();
    assert_eq!(parse.tree.leaves(parse.root).len(), 1);
}

#[test]
fn test_arithmetic_language() {
    let source = r#"
        // tokens
        NUM    = r"[0-9]+"
        PLUS   = "+"
        MINUS  = "-"
        LPAREN = "("
        RPAREN = ")"

        // grammar (order matters: longer alternatives first)
        Expr   = [Atom PLUS Expr] | [Atom MINUS Expr] | [Atom]
        Atom   = [LPAREN Expr RPAREN] | [NUM]
    "#;
    let compiled = compile_dsl(source).unwrap();

    assert_eq!(compiled.grammar.start(), Some("Expr"));
    assert_eq!(
        compiled.grammar.terminals(),
        vec![
            "PLUS".to_string(),
            "MINUS".to_string(),
            "LPAREN".to_string(),
            "RPAREN".to_string(),
            "NUM".to_string(),
        ]
    );

    let tokens = lex_with(&compiled.lexer, "(1+2)-3");
    let parser = BacktrackingParser::new(&compiled.grammar, "Expr").unwrap();
    let parse = parser.parse(tokens.clone()).unwrap();

    let leaves: Vec<String> = parse
        .tree
        .leaves(parse.root)
        .iter()
        .map(|t| t.text.clone())
        .collect();
    let texts: Vec<String> = tokens.iter().map(|t| t.text.clone()).collect();
    assert_eq!(leaves, texts);
}

#[test]
fn test_dsl_grammar_requires_backtracking() {
    // Alternatives share the Atom prefix, so the compiled grammar is not
    // backtrack-free; that is exactly why the DSL pairs with the
    // backtracking engine.
    let source = r#"
        NUM  = r"[0-9]+"
        PLUS = "+"
        Expr = [NUM PLUS Expr] | [NUM]
    "#;
    let compiled = compile_dsl(source).unwrap();
    assert!(!is_backtrack_free(&compiled.grammar, "Expr").unwrap());

    let parser = BacktrackingParser::new(&compiled.grammar, "Expr").unwrap();
    assert!(parser.parse(lex_with(&compiled.lexer, "1+2+3")).is_ok());
    assert!(parser.parse(lex_with(&compiled.lexer, "1+")).is_err());
}

#[test]
fn test_declared_grammar_feeds_ll1_pipeline() {
    // A DSL-declared grammar that happens to be backtrack-free can go
    // straight into table construction.
    let source = r#"
        A    = "a"
        B    = "b"
        Root = [A Tail]
        Tail = [B Tail] | []
    "#;
    let compiled = compile_dsl(source).unwrap();

    let analysis = BacktrackFreeGrammar::analyze(compiled.grammar, "Root").unwrap();
    assert!(analysis.is_backtrack_free());
    let table = Ll1Table::build(&analysis).unwrap();

    let tokens = lex_with(&compiled.lexer, "abb");
    let parse = lexparse::ll1::parse(&table, tokens).unwrap();
    assert_eq!(parse.tree.leaves(parse.root).len(), 3);
}

#[test]
fn test_lex_errors_surface_from_compiled_lexer() {
    let compiled = compile_dsl("A = \"a\"\nRoot = [A]").unwrap();
    let results: Vec<_> = compiled.lexer.tokenize("ab").collect();
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}

#[test]
fn test_error_cases() {
    // Unterminated rule body.
    assert!(compile_dsl("Root = [A").is_err());

    // Rule body referencing an undeclared name.
    assert!(matches!(
        compile_dsl("A = \"a\"\nRoot = [B]"),
        Err(lexparse::DslError::UnknownSymbol { .. })
    ));

    // Broken token pattern (unterminated class).
    assert!(matches!(
        compile_dsl("A = r\"[0-9\"\nRoot = [A]"),
        Err(lexparse::DslError::Regex { .. })
    ));
}
