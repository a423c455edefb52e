//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types so a wildcard import brings the
//! working set into scope:
//!
//! ```
//! use lexparse::prelude::*;
//! ```

// ============================================================================
// Lexing
// ============================================================================

pub use crate::lexer::{PatternLexer, PatternSpec, Token, TokenStream};

// ============================================================================
// Regex & Automata
// ============================================================================

pub use crate::automaton::Automaton;
pub use crate::dfa::Dfa;
pub use crate::regex_parser::parse_regex;

// ============================================================================
// Grammars
// ============================================================================

pub use crate::analysis::{is_backtrack_free, BacktrackFreeGrammar};
pub use crate::grammar::{Grammar, GrammarBuilder, Production, Symbol};
pub use crate::rewrite::{left_factor, remove_direct_left_recursion, remove_left_recursion};

// ============================================================================
// Parsing
// ============================================================================

pub use crate::backtrack::BacktrackingParser;
pub use crate::grammar_dsl::compile_dsl;
pub use crate::ll1::{Ll1Parser, Ll1Table};
pub use crate::parse_tree::ParseTree;
pub use crate::value::Value;

// ============================================================================
// Errors
// ============================================================================

pub use crate::error::{GrammarError, LexError, ParseError, RegexError, Span};
