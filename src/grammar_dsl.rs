//! The grammar-definition DSL
//!
//! A small text surface for declaring lexers and grammars together:
//!
//! ```text
//! // token declarations
//! NUM    = r"[0-9]+"
//! PLUS   = "+"
//!
//! // production rules
//! Expr   = [NUM PLUS Expr] | [NUM]
//! ```
//!
//! Token declarations bind a name to a literal (`"+"`, matched verbatim) or
//! a regex (`r"[0-9]+"`). Rules list alternatives as bracketed symbol
//! sequences; `[]` is the empty production. Line comments (`// ...`) and
//! whitespace are insignificant outside literals.
//!
//! The DSL is self-hosted: its own token table is compiled by this crate's
//! regex engine and its sources are parsed by the backtracking parser over
//! a hand-built bootstrap grammar (the DSL grammar shares prefixes between
//! token declarations and rules, so it is not backtrack-free).

use crate::backtrack::BacktrackingParser;
use crate::error::{LexError, ParseError, RegexError};
use crate::grammar::{Grammar, GrammarBuilder, Production, Symbol};
use crate::lexer::{PatternLexer, PatternSpec, Token};
use crate::parse_tree::{NodeId, NodeKind, ParseTree};
use std::fmt;
use std::sync::OnceLock;

/// Errors from compiling DSL source
#[derive(Debug, Clone, PartialEq)]
pub enum DslError {
    /// The source failed to tokenize
    Lex(LexError),
    /// The source failed to parse
    Parse(ParseError),
    /// A declared token's pattern failed to compile
    Regex {
        /// The token declaration's name
        name: String,
        /// The underlying regex error
        source: RegexError,
    },
    /// A rule body references a name that is neither a declared token nor a
    /// rule
    UnknownSymbol {
        /// The unresolved name
        symbol: String,
        /// The rule whose body references it
        non_terminal: String,
    },
}

impl fmt::Display for DslError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(err) => write!(f, "grammar source: {}", err),
            Self::Parse(err) => write!(f, "grammar source: {}", err),
            Self::Regex { name, source } => {
                write!(f, "pattern for token {}: {}", name, source)
            }
            Self::UnknownSymbol {
                symbol,
                non_terminal,
            } => write!(
                f,
                "rule {} references {}, which is neither a token nor a rule",
                non_terminal, symbol
            ),
        }
    }
}

impl std::error::Error for DslError {}

impl From<LexError> for DslError {
    fn from(err: LexError) -> Self {
        Self::Lex(err)
    }
}

impl From<ParseError> for DslError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

/// Result of compiling a DSL source: a lexer for the declared tokens and a
/// grammar of the declared rules
#[derive(Debug, Clone)]
pub struct CompiledDsl {
    /// Lexer over the declared token patterns, in declaration order
    pub lexer: PatternLexer,
    /// The declared patterns (declaration order)
    pub patterns: Vec<PatternSpec>,
    /// Grammar of the declared rules; the first rule is the start symbol
    pub grammar: Grammar,
}

static DSL_LEXER: OnceLock<PatternLexer> = OnceLock::new();
static DSL_GRAMMAR: OnceLock<Grammar> = OnceLock::new();

/// The DSL's own token table
fn dsl_lexer() -> &'static PatternLexer {
    DSL_LEXER.get_or_init(|| {
        PatternLexer::new(vec![
            PatternSpec::ignored("COMMENT", "//[^\\n]*"),
            PatternSpec::ignored("WS", "[ \\t\\n\\r]+"),
            PatternSpec::new("REGEX", "r\"[^\"]*\""),
            PatternSpec::new("STRING", "\"[^\"]*\""),
            PatternSpec::new("NAME", "[A-Za-z_][A-Za-z0-9_]*"),
            PatternSpec::new("EQUALS", "="),
            PatternSpec::new("PIPE", "\\|"),
            PatternSpec::new("LBRACK", "\\["),
            PatternSpec::new("RBRACK", "\\]"),
        ])
        .expect("bootstrap token table compiles")
    })
}

/// The DSL's own grammar, parsed with the backtracking engine
fn dsl_grammar() -> &'static Grammar {
    DSL_GRAMMAR.get_or_init(|| {
        GrammarBuilder::new()
            .rule(
                "Spec",
                [
                    Production::seq(&["Item", "SpecTail"]),
                    Production::epsilon(),
                ],
            )
            .rule(
                "SpecTail",
                [
                    Production::seq(&["Item", "SpecTail"]),
                    Production::epsilon(),
                ],
            )
            .rule("Item", [Production::seq(&["NAME", "EQUALS", "Rhs"])])
            .rule(
                "Rhs",
                [
                    Production::seq(&["STRING"]),
                    Production::seq(&["REGEX"]),
                    Production::seq(&["Alts"]),
                ],
            )
            .rule("Alts", [Production::seq(&["Seq", "AltsTail"])])
            .rule(
                "AltsTail",
                [
                    Production::seq(&["PIPE", "Seq", "AltsTail"]),
                    Production::epsilon(),
                ],
            )
            .rule("Seq", [Production::seq(&["LBRACK", "Names", "RBRACK"])])
            .rule(
                "Names",
                [
                    Production::seq(&["NAME", "Names"]),
                    Production::epsilon(),
                ],
            )
            .build()
    })
}

/// One parsed declaration
enum Decl {
    Token { name: String, pattern: String },
    Rule { name: String, bodies: Vec<Vec<String>> },
}

/// Compile DSL source into a lexer and a grammar
pub fn compile_dsl(source: &str) -> Result<CompiledDsl, DslError> {
    let tokens: Vec<Token> = dsl_lexer()
        .tokenize(source)
        .collect::<Result<_, _>>()?;

    let parser =
        BacktrackingParser::new(dsl_grammar(), "Spec").expect("bootstrap grammar has Spec");
    let parse = parser.parse(tokens)?;

    let mut decls = Vec::new();
    walk_spec(&parse.tree, parse.root, &mut decls);

    let mut patterns = Vec::new();
    let mut grammar = Grammar::new();
    for decl in &decls {
        match decl {
            Decl::Token { name, pattern } => {
                patterns.push(PatternSpec::new(name.clone(), pattern.clone()));
            }
            Decl::Rule { name, bodies } => {
                for body in bodies {
                    let production = if body.is_empty() {
                        Production::epsilon()
                    } else {
                        Production::new(body.iter().map(|n| Symbol::named(n.as_str())).collect())
                    };
                    grammar.add_production(name, production);
                }
            }
        }
    }

    // Every symbol a rule references must resolve to a token or a rule.
    let token_names: Vec<&str> = patterns.iter().map(|p| p.name.as_str()).collect();
    for rule in grammar.rules() {
        for production in &rule.productions {
            for symbol in &production.symbols {
                if let Symbol::Named(name) = symbol {
                    if !token_names.contains(&name.as_str()) && !grammar.is_non_terminal(name) {
                        return Err(DslError::UnknownSymbol {
                            symbol: name.clone(),
                            non_terminal: rule.name.clone(),
                        });
                    }
                }
            }
        }
    }

    let lexer = PatternLexer::new(patterns.clone()).map_err(|source| {
        // Recover which declaration failed by recompiling one at a time.
        let name = patterns
            .iter()
            .find(|p| PatternLexer::new(vec![(*p).clone()]).is_err())
            .map(|p| p.name.clone())
            .unwrap_or_default();
        DslError::Regex { name, source }
    })?;

    Ok(CompiledDsl {
        lexer,
        patterns,
        grammar,
    })
}

/// Escape regex metacharacters so a literal declaration matches verbatim
fn escape_literal(literal: &str) -> String {
    let mut pattern = String::with_capacity(literal.len());
    for c in literal.chars() {
        if "()[]*+|.\\".contains(c) {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern
}

// The walkers below lean on the bootstrap grammar's shape; a mismatch is a
// programmer error in this module, hence the expects.

fn walk_spec(tree: &ParseTree, node: NodeId, out: &mut Vec<Decl>) {
    let children = tree.children(node);
    if children.is_empty() {
        return;
    }
    walk_item(tree, children[0], out);
    walk_spec(tree, children[1], out);
}

fn walk_item(tree: &ParseTree, node: NodeId, out: &mut Vec<Decl>) {
    let children = tree.children(node);
    let name = leaf_text(tree, children[0]).to_string();
    let rhs_child = tree.children(children[2])[0];

    let decl = match tree.node(rhs_child).kind() {
        NodeKind::Terminal(token) if token.kind == "STRING" => {
            let literal = &token.text[1..token.text.len() - 1];
            Decl::Token {
                name,
                pattern: escape_literal(literal),
            }
        }
        NodeKind::Terminal(token) => {
            // REGEX: strip the r"..." wrapper.
            let pattern = token.text[2..token.text.len() - 1].to_string();
            Decl::Token { name, pattern }
        }
        NodeKind::Rule(_) => Decl::Rule {
            name,
            bodies: walk_alts(tree, rhs_child),
        },
    };
    out.push(decl);
}

fn walk_alts(tree: &ParseTree, node: NodeId) -> Vec<Vec<String>> {
    let children = tree.children(node);
    let mut bodies = vec![walk_seq(tree, children[0])];
    walk_alts_tail(tree, children[1], &mut bodies);
    bodies
}

fn walk_alts_tail(tree: &ParseTree, node: NodeId, bodies: &mut Vec<Vec<String>>) {
    let children = tree.children(node);
    if children.is_empty() {
        return;
    }
    bodies.push(walk_seq(tree, children[1]));
    walk_alts_tail(tree, children[2], bodies);
}

fn walk_seq(tree: &ParseTree, node: NodeId) -> Vec<String> {
    let mut names = Vec::new();
    walk_names(tree, tree.children(node)[1], &mut names);
    names
}

fn walk_names(tree: &ParseTree, node: NodeId, out: &mut Vec<String>) {
    let children = tree.children(node);
    if children.is_empty() {
        return;
    }
    out.push(leaf_text(tree, children[0]).to_string());
    walk_names(tree, children[1], out);
}

fn leaf_text(tree: &ParseTree, node: NodeId) -> &str {
    tree.node(node)
        .token()
        .expect("bootstrap grammar shape: terminal leaf")
        .text
        .as_str()
}
