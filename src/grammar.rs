//! Context-free grammar model
//!
//! A [`Grammar`] is an ordered mapping from non-terminal names to ordered
//! production lists. Order is significant twice over: rule insertion order
//! picks the start symbol (first rule) and production order is the try-order
//! for backtracking parsing and the tie-break when building tables.
//!
//! Terminals are derived, not stored: a named symbol is a non-terminal iff
//! it has productions of its own. The reserved symbols EPSILON and EOF are
//! enum variants rather than magic names, so the compiler enforces
//! exhaustive handling wherever symbols are matched.

use crate::lexer::Token;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A grammar symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    /// A terminal or non-terminal, classified by whether it has productions
    Named(String),
    /// The empty production body
    Epsilon,
    /// End of input
    Eof,
}

impl Symbol {
    /// Create a named symbol
    pub fn named(name: impl Into<String>) -> Self {
        Symbol::Named(name.into())
    }

    /// The name, for named symbols
    pub fn name(&self) -> Option<&str> {
        match self {
            Symbol::Named(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Named(name) => write!(f, "{}", name),
            Symbol::Epsilon => write!(f, "<epsilon>"),
            Symbol::Eof => write!(f, "<eof>"),
        }
    }
}

/// A semantic action: a pure function from the children's values and the
/// production's consumed tokens to a result value
pub type SemanticAction = Arc<dyn Fn(&[Value], &[Token]) -> Value + Send + Sync>;

/// One production: a symbol sequence plus an optional semantic action
#[derive(Clone, Serialize, Deserialize)]
pub struct Production {
    /// The body symbols
    pub symbols: Vec<Symbol>,
    /// Optional semantic action (not serialized; equality ignores it)
    #[serde(skip)]
    pub action: Option<SemanticAction>,
}

impl Production {
    /// Production over the given body
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self {
            symbols,
            action: None,
        }
    }

    /// Production whose body is a sequence of named symbols
    pub fn seq<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(names.iter().map(|n| Symbol::named(n.as_ref())).collect())
    }

    /// The empty production
    pub fn epsilon() -> Self {
        Self::new(vec![Symbol::Epsilon])
    }

    /// Attach a semantic action
    pub fn with_action(
        mut self,
        action: impl Fn(&[Value], &[Token]) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.action = Some(Arc::new(action));
        self
    }

    /// True if the body is the empty production
    pub fn is_epsilon(&self) -> bool {
        self.symbols.iter().all(|s| matches!(s, Symbol::Epsilon))
    }
}

impl fmt::Debug for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Production")
            .field("symbols", &self.symbols)
            .field("action", &self.action.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl PartialEq for Production {
    fn eq(&self, other: &Self) -> bool {
        self.symbols == other.symbols
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, symbol) in self.symbols.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", symbol)?;
        }
        Ok(())
    }
}

/// A non-terminal and its ordered alternatives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// The non-terminal name
    pub name: String,
    /// Alternatives in declaration order
    pub productions: Vec<Production>,
}

/// An ordered context-free grammar
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grammar {
    rules: Vec<Rule>,
}

impl Grammar {
    /// Create an empty grammar
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a production to `name`'s alternatives, creating the rule (at
    /// the end of the rule order) if it does not exist yet
    pub fn add_production(&mut self, name: &str, production: Production) {
        match self.rules.iter_mut().find(|r| r.name == name) {
            Some(rule) => rule.productions.push(production),
            None => self.rules.push(Rule {
                name: name.to_string(),
                productions: vec![production],
            }),
        }
    }

    /// Append several productions to `name`'s alternatives
    pub fn add_productions(&mut self, name: &str, productions: Vec<Production>) {
        for production in productions {
            self.add_production(name, production);
        }
    }

    /// Remove the production at `index` from `name`'s alternatives
    ///
    /// When the last alternative is removed the rule disappears entirely, so
    /// the name reverts to being classified as a terminal.
    pub fn remove_production(&mut self, name: &str, index: usize) -> Option<Production> {
        let rule_idx = self.rules.iter().position(|r| r.name == name)?;
        let rule = &mut self.rules[rule_idx];
        if index >= rule.productions.len() {
            return None;
        }
        let removed = rule.productions.remove(index);
        if rule.productions.is_empty() {
            self.rules.remove(rule_idx);
        }
        Some(removed)
    }

    /// Look up a rule by non-terminal name
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// The productions of `name`, if it is a non-terminal
    pub fn productions_for(&self, name: &str) -> Option<&[Production]> {
        self.rule(name).map(|r| r.productions.as_slice())
    }

    /// Iterate rules in insertion order
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Number of rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// The start symbol: the first rule's name
    pub fn start(&self) -> Option<&str> {
        self.rules.first().map(|r| r.name.as_str())
    }

    /// True if `name` has productions of its own
    pub fn is_non_terminal(&self, name: &str) -> bool {
        self.rule(name).is_some()
    }

    /// All non-terminal names, in rule order
    pub fn non_terminals(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    /// All terminal names: named symbols appearing in some body that have no
    /// productions of their own, in order of first appearance
    pub fn terminals(&self) -> Vec<String> {
        let mut seen = hashbrown::HashSet::new();
        let mut terminals = Vec::new();
        for rule in &self.rules {
            for production in &rule.productions {
                for symbol in &production.symbols {
                    if let Symbol::Named(name) = symbol {
                        if !self.is_non_terminal(name) && seen.insert(name.clone()) {
                            terminals.push(name.clone());
                        }
                    }
                }
            }
        }
        terminals
    }

    /// Serialize to JSON (semantic actions are omitted)
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            write!(f, "{} ->", rule.name)?;
            for (i, production) in rule.productions.iter().enumerate() {
                if i > 0 {
                    write!(f, " |")?;
                }
                write!(f, " {}", production)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Fluent builder for grammars
///
/// The first rule added becomes the start symbol.
///
/// # Example
///
/// ```
/// use lexparse::{GrammarBuilder, Production};
///
/// let grammar = GrammarBuilder::new()
///     .rule("List", [Production::seq(&["ITEM", "List"]), Production::epsilon()])
///     .build();
/// assert_eq!(grammar.start(), Some("List"));
/// ```
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    grammar: Grammar,
}

impl GrammarBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            grammar: Grammar::new(),
        }
    }

    /// Add a rule with the given alternatives
    pub fn rule(mut self, name: &str, productions: impl IntoIterator<Item = Production>) -> Self {
        for production in productions {
            self.grammar.add_production(name, production);
        }
        self
    }

    /// Finish building
    pub fn build(self) -> Grammar {
        self.grammar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr_grammar() -> Grammar {
        GrammarBuilder::new()
            .rule("Expr", [Production::seq(&["Term", "ExprTail"])])
            .rule(
                "ExprTail",
                [
                    Production::seq(&["PLUS", "Term", "ExprTail"]),
                    Production::epsilon(),
                ],
            )
            .rule("Term", [Production::seq(&["NUM"])])
            .build()
    }

    #[test]
    fn test_start_is_first_rule() {
        assert_eq!(expr_grammar().start(), Some("Expr"));
    }

    #[test]
    fn test_classification_is_derived() {
        let grammar = expr_grammar();
        assert!(grammar.is_non_terminal("Expr"));
        assert!(grammar.is_non_terminal("ExprTail"));
        assert!(!grammar.is_non_terminal("NUM"));
        assert_eq!(grammar.terminals(), vec!["PLUS".to_string(), "NUM".to_string()]);
    }

    #[test]
    fn test_production_order_is_preserved() {
        let grammar = expr_grammar();
        let tail = grammar.rule("ExprTail").unwrap();
        assert_eq!(tail.productions.len(), 2);
        assert!(!tail.productions[0].is_epsilon());
        assert!(tail.productions[1].is_epsilon());
    }

    #[test]
    fn test_remove_production() {
        let mut grammar = expr_grammar();
        let removed = grammar.remove_production("ExprTail", 0).unwrap();
        assert_eq!(removed.symbols[0], Symbol::named("PLUS"));
        assert_eq!(grammar.rule("ExprTail").unwrap().productions.len(), 1);

        // Removing the last production removes the rule, and the name
        // reverts to a terminal.
        grammar.remove_production("ExprTail", 0);
        assert!(!grammar.is_non_terminal("ExprTail"));
        assert!(grammar.terminals().contains(&"ExprTail".to_string()));
    }

    #[test]
    fn test_json_round_trip() {
        let grammar = expr_grammar();
        let json = grammar.to_json().unwrap();
        let back = Grammar::from_json(&json).unwrap();
        assert_eq!(grammar, back);
    }

    #[test]
    fn test_actions_ignored_by_equality() {
        let plain = Production::seq(&["NUM"]);
        let with_action = Production::seq(&["NUM"]).with_action(|_, _| Value::Nil);
        assert_eq!(plain, with_action);
    }

    #[test]
    fn test_display() {
        let text = format!("{}", expr_grammar());
        assert!(text.contains("ExprTail -> PLUS Term ExprTail | <epsilon>"));
    }
}
