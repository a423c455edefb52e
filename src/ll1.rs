//! LL(1) table construction and the table-driven parser
//!
//! [`Ll1Table::build`] fills one cell per (non-terminal, terminal) pair from
//! the FIRST+ sets of a [`BacktrackFreeGrammar`]; a cell claimed twice is a
//! hard [`GrammarError::Ll1Conflict`] rather than a silent overwrite, since
//! an overwritten cell would contradict the backtrack-free contract the
//! table consumer assumes. Left-factoring the grammar first resolves such
//! conflicts.
//!
//! [`Ll1Parser`] is an explicit stack machine: the stack starts as
//! [EOF, start] and the focus is the top of stack. Terminals must match the
//! lookahead and consume it; non-terminals expand through the table, pushing
//! the production body in reverse above a deferred reduction marker. When a
//! marker surfaces, the production's symbols have all been matched: the
//! marker pops their values and nodes, invokes the production's semantic
//! action, and pushes the result.
//!
//! Every loop iteration is exposed as one [`Ll1Parser::step`], so external
//! tooling can single-step and observe [`Ll1Parser::snapshot`]s.
//! [`Ll1Parser::run`] simply loops `step` to completion; stepping is purely
//! an observation point and never changes the outcome.

use crate::analysis::BacktrackFreeGrammar;
use crate::error::{GrammarError, ParseError};
use crate::grammar::{Grammar, Production, Symbol};
use crate::lexer::Token;
use crate::parse_tree::{NodeId, ParseTree};
use crate::value::Value;
use ahash::RandomState;
use hashbrown::HashMap;

#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

/// A predictive parsing table
///
/// Owns an immutable copy of the grammar it was built from; safe to share
/// across parses.
#[derive(Debug, Clone)]
pub struct Ll1Table {
    start: String,
    grammar: Grammar,
    /// (non-terminal, lookahead terminal or EOF) -> production index
    cells: HashMap<(String, Symbol), usize, RandomState>,
}

impl Ll1Table {
    /// Build the table from FIRST+ sets
    pub fn build(analysis: &BacktrackFreeGrammar) -> Result<Self, GrammarError> {
        let grammar = analysis.grammar().clone();
        let mut cells: HashMap<(String, Symbol), usize, RandomState> =
            HashMap::with_hasher(RandomState::new());

        for rule in grammar.rules() {
            for (index, production) in rule.productions.iter().enumerate() {
                for symbol in analysis.first_plus(&rule.name, production) {
                    // EPSILON never appears in the input stream; the
                    // production is selected through FOLLOW entries instead.
                    if matches!(symbol, Symbol::Epsilon) {
                        continue;
                    }
                    let key = (rule.name.clone(), symbol);
                    match cells.get(&key) {
                        Some(&existing) if existing != index => {
                            return Err(GrammarError::Ll1Conflict {
                                non_terminal: rule.name.clone(),
                                lookahead: key.1.to_string(),
                            });
                        }
                        Some(_) => {}
                        None => {
                            cells.insert(key, index);
                        }
                    }
                }
            }
        }

        Ok(Self {
            start: analysis.start().to_string(),
            grammar,
            cells,
        })
    }

    /// The start symbol
    pub fn start(&self) -> &str {
        &self.start
    }

    /// The grammar the table routes into
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// The production index selected for (non-terminal, lookahead), if any
    pub fn cell(&self, non_terminal: &str, lookahead: &Symbol) -> Option<usize> {
        self.cells
            .get(&(non_terminal.to_string(), lookahead.clone()))
            .copied()
    }

    /// The production selected for (non-terminal, lookahead), if any
    pub fn production(&self, non_terminal: &str, lookahead: &Symbol) -> Option<&Production> {
        let index = self.cell(non_terminal, lookahead)?;
        self.grammar.productions_for(non_terminal)?.get(index)
    }
}

/// One stack entry of the parser
#[derive(Debug, Clone)]
enum StackEntry {
    /// A symbol still to be matched
    Symbol(Symbol),
    /// Deferred reduction for a fully-matched production
    Marker {
        non_terminal: String,
        production: usize,
        arity: usize,
    },
}

impl std::fmt::Display for StackEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StackEntry::Symbol(symbol) => write!(f, "{}", symbol),
            StackEntry::Marker {
                non_terminal,
                production,
                ..
            } => write!(f, "reduce:{}/{}", non_terminal, production),
        }
    }
}

/// Result of one parser step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    /// More steps remain
    Running,
    /// The parse accepted
    Accepted,
}

/// Observable parser state between steps
#[derive(Debug, Clone)]
pub struct StepSnapshot {
    /// The current focus (top of stack), if any
    pub focus: Option<String>,
    /// The full stack, bottom to top
    pub stack: Vec<String>,
    /// The current input token
    pub lookahead: Option<Token>,
    /// How many values have been collected so far
    pub collected: usize,
}

/// Result of a successful table-driven parse
#[derive(Debug)]
pub struct Ll1Parse {
    /// The parse tree
    pub tree: ParseTree,
    /// The tree's root node
    pub root: NodeId,
    /// The single collected value (the root production's action result)
    pub value: Value,
}

/// The resumable table-driven parser
pub struct Ll1Parser<'t> {
    table: &'t Ll1Table,
    tokens: std::vec::IntoIter<Token>,
    lookahead: Option<Token>,
    stack: Vec<StackEntry>,
    values: Vec<Value>,
    nodes: Vec<NodeId>,
    tree: ParseTree,
    accepted: bool,
}

impl<'t> Ll1Parser<'t> {
    /// Initialize the machine over a token sequence
    pub fn new(table: &'t Ll1Table, tokens: Vec<Token>) -> Self {
        let mut tokens = tokens.into_iter();
        let lookahead = tokens.next();
        Self {
            stack: vec![
                StackEntry::Symbol(Symbol::Eof),
                StackEntry::Symbol(Symbol::named(table.start())),
            ],
            table,
            tokens,
            lookahead,
            values: Vec::new(),
            nodes: Vec::new(),
            tree: ParseTree::new(),
            accepted: false,
        }
    }

    /// The lookahead as a grammar symbol (EOF when the input is exhausted)
    fn lookahead_symbol(&self) -> Symbol {
        match &self.lookahead {
            Some(token) => Symbol::named(&token.kind),
            None => Symbol::Eof,
        }
    }

    /// Advance exactly one state transition
    ///
    /// Errors are terminal: once a step fails the machine must be discarded.
    pub fn step(&mut self) -> Result<StepState, ParseError> {
        if self.accepted {
            return Ok(StepState::Accepted);
        }

        let focus = self
            .stack
            .pop()
            .expect("stack holds the EOF sentinel until acceptance");

        match focus {
            StackEntry::Marker {
                non_terminal,
                production,
                arity,
            } => {
                let children = self.nodes.split_off(self.nodes.len() - arity);
                let child_values = self.values.split_off(self.values.len() - arity);
                let consumed: Vec<Token> = children
                    .iter()
                    .flat_map(|&c| {
                        self.tree
                            .leaves(c)
                            .into_iter()
                            .cloned()
                            .collect::<Vec<_>>()
                    })
                    .collect();

                let node = self.tree.add_rule(&non_terminal, children);
                let action = self
                    .table
                    .grammar()
                    .productions_for(&non_terminal)
                    .and_then(|ps| ps.get(production))
                    .and_then(|p| p.action.clone());
                let value = match action {
                    Some(action) => action(&child_values, &consumed),
                    None => Value::List(child_values),
                };
                log_debug!("reduced {} (production {})", non_terminal, production);
                self.values.push(value);
                self.nodes.push(node);
                Ok(StepState::Running)
            }

            StackEntry::Symbol(Symbol::Eof) => match &self.lookahead {
                None => {
                    if let Some(&root) = self.nodes.last() {
                        self.tree.set_root(root);
                    }
                    self.accepted = true;
                    log_debug!("parse accepted");
                    Ok(StepState::Accepted)
                }
                Some(token) => Err(ParseError::TokensRemain {
                    next: token.kind.clone(),
                    span: token.span,
                }),
            },

            // EPSILON is elided when bodies are pushed.
            StackEntry::Symbol(Symbol::Epsilon) => Ok(StepState::Running),

            StackEntry::Symbol(Symbol::Named(name)) => {
                if self.table.grammar().is_non_terminal(&name) {
                    self.expand(name)
                } else {
                    self.match_terminal(name)
                }
            }
        }
    }

    /// Expand a non-terminal focus through the table
    fn expand(&mut self, name: String) -> Result<StepState, ParseError> {
        let lookahead = self.lookahead_symbol();
        let Some(index) = self.table.cell(&name, &lookahead) else {
            return Err(ParseError::NoTableEntry {
                non_terminal: name,
                lookahead: lookahead.to_string(),
            });
        };
        let production = &self
            .table
            .grammar()
            .productions_for(&name)
            .expect("classified as non-terminal")[index];

        let arity = production
            .symbols
            .iter()
            .filter(|s| !matches!(s, Symbol::Epsilon))
            .count();
        log_debug!("expanding {} via production {} on {}", name, index, lookahead);

        self.stack.push(StackEntry::Marker {
            non_terminal: name,
            production: index,
            arity,
        });
        for symbol in production.symbols.iter().rev() {
            if !matches!(symbol, Symbol::Epsilon) {
                self.stack.push(StackEntry::Symbol(symbol.clone()));
            }
        }
        Ok(StepState::Running)
    }

    /// Match a terminal focus against the lookahead
    fn match_terminal(&mut self, name: String) -> Result<StepState, ParseError> {
        match self.lookahead.take() {
            Some(token) if token.kind == name => {
                log_debug!("matched terminal {} ({:?})", name, token.text);
                let node = self.tree.add_terminal(token.clone());
                self.nodes.push(node);
                self.values.push(Value::Str(token.text));
                self.lookahead = self.tokens.next();
                Ok(StepState::Running)
            }
            Some(token) => {
                let err = ParseError::UnmatchedTerminal {
                    expected: name,
                    found: token.kind.clone(),
                    span: token.span,
                };
                self.lookahead = Some(token);
                Err(err)
            }
            None => Err(ParseError::UnexpectedEof { expected: name }),
        }
    }

    /// Observable state for external tooling
    pub fn snapshot(&self) -> StepSnapshot {
        StepSnapshot {
            focus: self.stack.last().map(|e| e.to_string()),
            stack: self.stack.iter().map(|e| e.to_string()).collect(),
            lookahead: self.lookahead.clone(),
            collected: self.values.len(),
        }
    }

    /// Whether the machine has accepted
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Run to completion by looping [`Ll1Parser::step`]
    pub fn run(mut self) -> Result<Ll1Parse, ParseError> {
        while self.step()? == StepState::Running {}
        Ok(self.into_parse())
    }

    /// Extract the result after acceptance
    ///
    /// # Panics
    /// Panics if the machine has not accepted yet.
    pub fn into_parse(self) -> Ll1Parse {
        assert!(self.accepted, "parser has not accepted");
        let root = self.tree.root().expect("accepted parse has a root");
        let value = self.values.into_iter().next().unwrap_or(Value::Nil);
        Ll1Parse {
            tree: self.tree,
            root,
            value,
        }
    }
}

/// Parse a token sequence with a table (run-to-completion convenience)
pub fn parse(table: &Ll1Table, tokens: Vec<Token>) -> Result<Ll1Parse, ParseError> {
    Ll1Parser::new(table, tokens).run()
}
