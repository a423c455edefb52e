//! Benchmarks for tokenization and table-driven parsing

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lexparse::prelude::*;
use lexparse::ll1;

fn expr_lexer() -> PatternLexer {
    PatternLexer::new(vec![
        PatternSpec::new("PLUS", "\\+"),
        PatternSpec::new("MINUS", "-"),
        PatternSpec::new("TIMES", "\\*"),
        PatternSpec::new("LPAREN", "\\("),
        PatternSpec::new("RPAREN", "\\)"),
        PatternSpec::new("NUM", "[0-9]+"),
        PatternSpec::new("NAME", "[a-z][a-z0-9]*"),
        PatternSpec::ignored("WS", "[ ]+"),
    ])
    .unwrap()
}

fn expr_table() -> Ll1Table {
    let grammar = GrammarBuilder::new()
        .rule("Expr", [Production::seq(&["Term", "ExprTail"])])
        .rule(
            "ExprTail",
            [
                Production::seq(&["PLUS", "Term", "ExprTail"]),
                Production::seq(&["MINUS", "Term", "ExprTail"]),
                Production::epsilon(),
            ],
        )
        .rule("Term", [Production::seq(&["Factor", "TermTail"])])
        .rule(
            "TermTail",
            [
                Production::seq(&["TIMES", "Factor", "TermTail"]),
                Production::epsilon(),
            ],
        )
        .rule(
            "Factor",
            [
                Production::seq(&["LPAREN", "Expr", "RPAREN"]),
                Production::seq(&["NUM"]),
                Production::seq(&["NAME"]),
            ],
        )
        .build();
    let analysis = BacktrackFreeGrammar::analyze(grammar, "Expr").unwrap();
    Ll1Table::build(&analysis).unwrap()
}

fn bench_lexing(c: &mut Criterion) {
    let lexer = expr_lexer();
    let input = "12 + 34 * ( foo - 567 ) + bar * 89 ".repeat(64);

    c.bench_function("tokenize_expression_input", |b| {
        b.iter(|| {
            let tokens: Vec<Token> = lexer
                .tokenize(black_box(&input))
                .collect::<Result<_, _>>()
                .unwrap();
            black_box(tokens)
        })
    });
}

fn bench_build_lexer(c: &mut Criterion) {
    c.bench_function("compile_pattern_table", |b| {
        b.iter(|| black_box(expr_lexer()))
    });
}

fn bench_ll1_parse(c: &mut Criterion) {
    let lexer = expr_lexer();
    let table = expr_table();
    let input = vec!["1 + 2 * ( x - 3 ) + y * 4"; 32].join(" + ");
    let tokens: Vec<Token> = lexer
        .tokenize(&input)
        .collect::<Result<_, _>>()
        .unwrap();

    c.bench_function("ll1_parse_expression", |b| {
        b.iter(|| black_box(ll1::parse(&table, black_box(tokens.clone())).unwrap()))
    });
}

criterion_group!(benches, bench_lexing, bench_build_lexer, bench_ll1_parse);
criterion_main!(benches);
