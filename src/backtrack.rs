//! General backtracking top-down parser
//!
//! Recursive descent over a [`TokenStream`] with pushback, for grammars
//! that are not backtrack-free (notably the grammar-definition DSL). For a
//! non-terminal the alternatives are tried in declaration order; a failed
//! attempt pushes back every token it consumed, in reverse, so the stream
//! is exactly as the attempt found it. That restore contract is a
//! correctness invariant, not an optimization: recursive attempts share the
//! one pushback buffer.
//!
//! Worst-case time is exponential on pathologically ambiguous grammars;
//! this engine is intended for small DSL grammars, not high-throughput
//! parsing. Backtracking here is the algorithm, not error recovery.

use crate::error::{GrammarError, ParseError};
use crate::grammar::{Grammar, Symbol};
use crate::lexer::{Token, TokenStream};
use crate::parse_tree::{NodeId, ParseTree};
use crate::value::Value;

#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

/// Result of a successful backtracking parse
#[derive(Debug)]
pub struct BacktrackParse {
    /// The parse tree
    pub tree: ParseTree,
    /// The tree's root node
    pub root: NodeId,
    /// The root production's value
    pub value: Value,
}

/// A backtracking parser for a grammar and start symbol
pub struct BacktrackingParser<'g> {
    grammar: &'g Grammar,
    start: String,
}

impl<'g> BacktrackingParser<'g> {
    /// Create a parser; the start symbol must have productions
    pub fn new(grammar: &'g Grammar, start: &str) -> Result<Self, GrammarError> {
        if !grammar.is_non_terminal(start) {
            return Err(GrammarError::UnknownStartSymbol {
                name: start.to_string(),
            });
        }
        Ok(Self {
            grammar,
            start: start.to_string(),
        })
    }

    /// Parse a token sequence
    ///
    /// The input must be fully consumed: leftover tokens after the root
    /// symbol are a [`ParseError::TokensRemain`].
    pub fn parse(&self, tokens: Vec<Token>) -> Result<BacktrackParse, ParseError> {
        let mut run = ParseRun {
            grammar: self.grammar,
            stream: TokenStream::from_tokens(tokens),
            tree: ParseTree::new(),
        };

        let (root, value, _) = run.parse_non_terminal(&self.start)?;

        if let Some(next) = run.stream.peek() {
            return Err(ParseError::TokensRemain {
                next: next.kind.clone(),
                span: next.span,
            });
        }

        run.tree.set_root(root);
        Ok(BacktrackParse {
            tree: run.tree,
            root,
            value,
        })
    }
}

/// Mutable state of one parse call
struct ParseRun<'g> {
    grammar: &'g Grammar,
    stream: TokenStream<std::vec::IntoIter<Token>>,
    tree: ParseTree,
}

impl ParseRun<'_> {
    /// The next token kind, for diagnostics
    fn lookahead_kind(&mut self) -> String {
        self.stream
            .peek()
            .map(|t| t.kind.clone())
            .unwrap_or_else(|| "<eof>".to_string())
    }

    /// Parse one body symbol
    ///
    /// Returns the built node, its value, and the tokens it consumed (in
    /// order). On failure the stream is left exactly as it was.
    fn parse_symbol(&mut self, symbol: &Symbol) -> Result<(NodeId, Value, Vec<Token>), ParseError> {
        match symbol {
            Symbol::Named(name) if self.grammar.is_non_terminal(name) => {
                self.parse_non_terminal(name)
            }
            Symbol::Named(name) => self.parse_terminal(name),
            // Reserved symbols never match from a production body; EPSILON
            // is skipped by the production loop before reaching here.
            Symbol::Epsilon | Symbol::Eof => Err(ParseError::UnmatchedTerminal {
                expected: symbol.to_string(),
                found: self.lookahead_kind(),
                span: Default::default(),
            }),
        }
    }

    /// Match one terminal token
    fn parse_terminal(&mut self, name: &str) -> Result<(NodeId, Value, Vec<Token>), ParseError> {
        match self.stream.next() {
            Some(token) if token.kind == name => {
                log_debug!("consumed terminal {} ({:?})", name, token.text);
                let node = self.tree.add_terminal(token.clone());
                let value = Value::Str(token.text.clone());
                Ok((node, value, vec![token]))
            }
            Some(token) => {
                let err = ParseError::UnmatchedTerminal {
                    expected: name.to_string(),
                    found: token.kind.clone(),
                    span: token.span,
                };
                self.stream.push_back(token);
                Err(err)
            }
            None => Err(ParseError::UnexpectedEof {
                expected: name.to_string(),
            }),
        }
    }

    /// Try each production of a non-terminal in declaration order
    fn parse_non_terminal(&mut self, name: &str) -> Result<(NodeId, Value, Vec<Token>), ParseError> {
        let rule = self
            .grammar
            .rule(name)
            .expect("classified as non-terminal");
        let tree_mark = self.tree.len();

        'alternatives: for production in &rule.productions {
            log_debug!("trying {} -> {}", name, production);
            let mut children: Vec<NodeId> = Vec::new();
            let mut values: Vec<Value> = Vec::new();
            let mut consumed: Vec<Token> = Vec::new();

            for symbol in &production.symbols {
                if matches!(symbol, Symbol::Epsilon) {
                    continue;
                }
                match self.parse_symbol(symbol) {
                    Ok((node, value, tokens)) => {
                        children.push(node);
                        values.push(value);
                        consumed.extend(tokens);
                    }
                    Err(_) => {
                        // Restore the stream exactly: everything this
                        // attempt consumed goes back, last token first.
                        for token in consumed.into_iter().rev() {
                            self.stream.push_back(token);
                        }
                        self.tree.truncate(tree_mark);
                        continue 'alternatives;
                    }
                }
            }

            let node = self.tree.add_rule(name, children);
            let value = match &production.action {
                Some(action) => action(&values, &consumed),
                None => Value::List(values),
            };
            return Ok((node, value, consumed));
        }

        Err(ParseError::NoRulesMatched {
            non_terminal: name.to_string(),
            lookahead: self.lookahead_kind(),
        })
    }
}

/// Parse a token sequence (convenience wrapper)
///
/// A start symbol without productions reports as [`ParseError::NoRulesMatched`];
/// use [`BacktrackingParser::new`] to distinguish that case up front.
pub fn parse(
    grammar: &Grammar,
    start: &str,
    tokens: Vec<Token>,
) -> Result<BacktrackParse, ParseError> {
    match BacktrackingParser::new(grammar, start) {
        Ok(parser) => parser.parse(tokens),
        Err(_) => Err(ParseError::NoRulesMatched {
            non_terminal: start.to_string(),
            lookahead: "<eof>".to_string(),
        }),
    }
}
