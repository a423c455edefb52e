//! lexparse - Lexer and Parser Construction Toolkit
//!
//! A compiler-construction library that turns regular-expression syntax and
//! context-free-grammar syntax into executable recognizers:
//!
//! - Thompson-style compilation of regexes into NFAs ([`automaton`],
//!   [`regex_ast`], [`regex_parser`])
//! - Subset construction into DFAs with maximal-munch matching ([`dfa`])
//! - Priority-ordered, longest-match tokenization ([`lexer`])
//! - Grammar analysis: FIRST/FOLLOW, left-recursion elimination,
//!   left-factoring, backtrack-free validation ([`analysis`], [`rewrite`])
//! - A table-driven LL(1) stack machine with a steppable execution
//!   interface ([`ll1`])
//! - A general backtracking top-down parser with token pushback
//!   ([`backtrack`])
//! - A grammar-definition DSL that bootstraps new lexer/parser pairs from
//!   text ([`grammar_dsl`])
//!
//! ## Quick Start
//!
//! ```rust
//! use lexparse::{PatternLexer, PatternSpec};
//!
//! let lexer = PatternLexer::new(vec![
//!     PatternSpec::new("DIGITS", "[0-9]+"),
//!     PatternSpec::new("ADD", "\\+"),
//! ])
//! .unwrap();
//!
//! let tokens: Vec<_> = lexer
//!     .tokenize("12+34")
//!     .collect::<Result<Vec<_>, _>>()
//!     .unwrap();
//! assert_eq!(tokens.len(), 3);
//! assert_eq!(tokens[0].kind, "DIGITS");
//! ```
//!
//! ## Defining a grammar
//!
//! ```rust
//! use lexparse::{BacktrackFreeGrammar, GrammarBuilder, Ll1Table, Production};
//!
//! let grammar = GrammarBuilder::new()
//!     .rule("List", [
//!         Production::seq(&["ITEM", "List"]),
//!         Production::epsilon(),
//!     ])
//!     .build();
//!
//! let analysis = BacktrackFreeGrammar::analyze(grammar, "List").unwrap();
//! assert!(analysis.is_backtrack_free());
//! let table = Ll1Table::build(&analysis).unwrap();
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging using the `log` crate
//!
//! All operations are single-threaded and synchronous; automata, DFAs,
//! grammars and tables are immutable once built and safe to share across
//! parses.

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]

// Prelude module for convenient imports
pub mod prelude;

pub mod analysis;
pub mod automaton;
pub mod backtrack;
pub mod char_class;
pub mod dfa;
pub mod error;
pub mod grammar;
pub mod grammar_dsl;
pub mod lexer;
pub mod ll1;
pub mod parse_tree;
pub mod regex_ast;
pub mod regex_parser;
pub mod rewrite;
pub mod value;

// ============================================================================
// Automata
// ============================================================================

pub use automaton::{Automaton, StateId};
pub use dfa::{Dfa, Match};

// ============================================================================
// Regex Compilation
// ============================================================================

pub use regex_ast::{CharClass, ClassItem, RegexNode};
pub use regex_parser::parse_regex;

// ============================================================================
// Lexing
// ============================================================================

pub use lexer::{PatternLexer, PatternSpec, Token, TokenStream, Tokens};

// ============================================================================
// Grammars & Analysis
// ============================================================================

pub use analysis::{is_backtrack_free, BacktrackFreeGrammar};
pub use grammar::{Grammar, GrammarBuilder, Production, Rule, SemanticAction, Symbol};
pub use rewrite::{left_factor, remove_direct_left_recursion, remove_left_recursion};

// ============================================================================
// Parsing
// ============================================================================

pub use backtrack::{BacktrackParse, BacktrackingParser};
pub use ll1::{Ll1Parse, Ll1Parser, Ll1Table, StepSnapshot, StepState};
pub use parse_tree::{NodeId, NodeKind, ParseNode, ParseTree};
pub use value::Value;

// ============================================================================
// Grammar DSL
// ============================================================================

pub use grammar_dsl::{compile_dsl, CompiledDsl, DslError};

// ============================================================================
// Errors
// ============================================================================

pub use error::{GrammarError, LexError, ParseError, RegexError, SourcePosition, Span};
