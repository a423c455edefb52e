//! FIRST/FOLLOW computation and the backtrack-free check
//!
//! [`BacktrackFreeGrammar`] decorates a [`Grammar`] with FIRST and FOLLOW
//! mappings computed relative to a chosen start symbol by the standard
//! fixed-point iteration: both passes sweep every production until no set
//! changes. FIRST of a symbol sequence is computed left to right and
//! includes EPSILON only when every element can derive it; FOLLOW of the
//! start symbol always contains EOF.
//!
//! FIRST+ of a production extends FIRST of its body with FOLLOW of the
//! left-hand side when the body can derive epsilon. A grammar is
//! backtrack-free for a start symbol when every non-terminal's alternatives
//! have pairwise-disjoint FIRST+ sets.

use crate::error::GrammarError;
use crate::grammar::{Grammar, Production, Symbol};
use hashbrown::{HashMap, HashSet};

/// A grammar decorated with memoized FIRST and FOLLOW sets
#[derive(Debug, Clone)]
pub struct BacktrackFreeGrammar {
    grammar: Grammar,
    start: String,
    first: HashMap<Symbol, HashSet<Symbol>>,
    follow: HashMap<String, HashSet<Symbol>>,
}

impl BacktrackFreeGrammar {
    /// Compute FIRST and FOLLOW for `grammar` relative to `start`
    pub fn analyze(grammar: Grammar, start: &str) -> Result<Self, GrammarError> {
        if !grammar.is_non_terminal(start) {
            return Err(GrammarError::UnknownStartSymbol {
                name: start.to_string(),
            });
        }

        let first = compute_first(&grammar);
        let follow = compute_follow(&grammar, start, &first);

        Ok(Self {
            grammar,
            start: start.to_string(),
            first,
            follow,
        })
    }

    /// The underlying grammar
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// The start symbol the sets were computed for
    pub fn start(&self) -> &str {
        &self.start
    }

    /// FIRST of a single symbol
    pub fn first(&self, symbol: &Symbol) -> HashSet<Symbol> {
        first_of_symbol(symbol, &self.first)
    }

    /// FOLLOW of a non-terminal
    pub fn follow(&self, non_terminal: &str) -> Option<&HashSet<Symbol>> {
        self.follow.get(non_terminal)
    }

    /// FIRST of a symbol sequence
    pub fn first_of_sequence(&self, symbols: &[Symbol]) -> HashSet<Symbol> {
        first_of_sequence(symbols, &self.first)
    }

    /// FIRST+ of one production of `non_terminal`
    pub fn first_plus(&self, non_terminal: &str, production: &Production) -> HashSet<Symbol> {
        let mut set = self.first_of_sequence(&production.symbols);
        if set.contains(&Symbol::Epsilon) {
            if let Some(follow) = self.follow.get(non_terminal) {
                set.extend(follow.iter().cloned());
            }
        }
        set
    }

    /// Whether every non-terminal's alternatives have pairwise-disjoint
    /// FIRST+ sets
    pub fn is_backtrack_free(&self) -> bool {
        for rule in self.grammar.rules() {
            let sets: Vec<HashSet<Symbol>> = rule
                .productions
                .iter()
                .map(|p| self.first_plus(&rule.name, p))
                .collect();
            for i in 0..sets.len() {
                for j in i + 1..sets.len() {
                    if !sets[i].is_disjoint(&sets[j]) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

/// Check whether `grammar` is backtrack-free for `start`
pub fn is_backtrack_free(grammar: &Grammar, start: &str) -> Result<bool, GrammarError> {
    Ok(BacktrackFreeGrammar::analyze(grammar.clone(), start)?.is_backtrack_free())
}

/// FIRST of one symbol given the computed non-terminal mapping
fn first_of_symbol(symbol: &Symbol, first: &HashMap<Symbol, HashSet<Symbol>>) -> HashSet<Symbol> {
    match first.get(symbol) {
        Some(set) => set.clone(),
        // Terminals (and the reserved symbols) begin with themselves.
        None => HashSet::from_iter([symbol.clone()]),
    }
}

/// FIRST of a symbol sequence, left to right
fn first_of_sequence(
    symbols: &[Symbol],
    first: &HashMap<Symbol, HashSet<Symbol>>,
) -> HashSet<Symbol> {
    let mut set = HashSet::new();
    let mut all_nullable = true;

    for symbol in symbols {
        let symbol_first = first_of_symbol(symbol, first);
        let nullable = symbol_first.contains(&Symbol::Epsilon);
        set.extend(
            symbol_first
                .into_iter()
                .filter(|s| !matches!(s, Symbol::Epsilon)),
        );
        if !nullable {
            all_nullable = false;
            break;
        }
    }

    if all_nullable {
        set.insert(Symbol::Epsilon);
    }
    set
}

/// Fixed-point FIRST computation over all non-terminals
fn compute_first(grammar: &Grammar) -> HashMap<Symbol, HashSet<Symbol>> {
    let mut first: HashMap<Symbol, HashSet<Symbol>> = grammar
        .rules()
        .map(|rule| (Symbol::named(&rule.name), HashSet::new()))
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for rule in grammar.rules() {
            for production in &rule.productions {
                let addition = first_of_sequence(&production.symbols, &first);
                let set = first
                    .get_mut(&Symbol::named(&rule.name))
                    .expect("rule registered above");
                let before = set.len();
                set.extend(addition);
                if set.len() != before {
                    changed = true;
                }
            }
        }
    }
    first
}

/// Fixed-point FOLLOW computation over all non-terminals
fn compute_follow(
    grammar: &Grammar,
    start: &str,
    first: &HashMap<Symbol, HashSet<Symbol>>,
) -> HashMap<String, HashSet<Symbol>> {
    let mut follow: HashMap<String, HashSet<Symbol>> = grammar
        .rules()
        .map(|rule| (rule.name.clone(), HashSet::new()))
        .collect();
    follow
        .get_mut(start)
        .expect("start symbol validated")
        .insert(Symbol::Eof);

    let mut changed = true;
    while changed {
        changed = false;
        for rule in grammar.rules() {
            // Walk each body right to left carrying the trailer: the set of
            // terminals that can follow the current position.
            let rule_follow = follow.get(&rule.name).cloned().unwrap_or_default();
            for production in &rule.productions {
                let mut trailer = rule_follow.clone();
                for symbol in production.symbols.iter().rev() {
                    match symbol {
                        Symbol::Named(name) if grammar.is_non_terminal(name) => {
                            let set = follow.get_mut(name).expect("rule registered above");
                            let before = set.len();
                            set.extend(trailer.iter().cloned());
                            if set.len() != before {
                                changed = true;
                            }

                            let symbol_first = first_of_symbol(symbol, first);
                            if symbol_first.contains(&Symbol::Epsilon) {
                                trailer.extend(
                                    symbol_first
                                        .into_iter()
                                        .filter(|s| !matches!(s, Symbol::Epsilon)),
                                );
                            } else {
                                trailer = symbol_first;
                            }
                        }
                        Symbol::Named(_) => {
                            trailer = HashSet::from_iter([symbol.clone()]);
                        }
                        Symbol::Epsilon => {}
                        Symbol::Eof => {
                            trailer = HashSet::from_iter([Symbol::Eof]);
                        }
                    }
                }
            }
        }
    }
    follow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarBuilder;

    /// The canonical backtrack-free expression grammar
    fn expr_grammar() -> Grammar {
        GrammarBuilder::new()
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
            .build()
    }

    #[test]
    fn test_first_sets() {
        let analysis = BacktrackFreeGrammar::analyze(expr_grammar(), "Expr").unwrap();

        let first_expr = analysis.first(&Symbol::named("Expr"));
        assert!(first_expr.contains(&Symbol::named("LPAREN")));
        assert!(first_expr.contains(&Symbol::named("NUM")));
        assert!(first_expr.contains(&Symbol::named("NAME")));
        assert!(!first_expr.contains(&Symbol::Epsilon));

        let first_tail = analysis.first(&Symbol::named("ExprTail"));
        assert!(first_tail.contains(&Symbol::named("PLUS")));
        assert!(first_tail.contains(&Symbol::named("MINUS")));
        assert!(first_tail.contains(&Symbol::Epsilon));
    }

    #[test]
    fn test_first_of_terminal_is_itself() {
        let analysis = BacktrackFreeGrammar::analyze(expr_grammar(), "Expr").unwrap();
        let first = analysis.first(&Symbol::named("NUM"));
        assert_eq!(first, HashSet::from_iter([Symbol::named("NUM")]));
    }

    #[test]
    fn test_follow_sets() {
        let analysis = BacktrackFreeGrammar::analyze(expr_grammar(), "Expr").unwrap();

        let follow_expr = analysis.follow("Expr").unwrap();
        assert!(follow_expr.contains(&Symbol::Eof));
        assert!(follow_expr.contains(&Symbol::named("RPAREN")));

        let follow_factor = analysis.follow("Factor").unwrap();
        assert!(follow_factor.contains(&Symbol::named("PLUS")));
        assert!(follow_factor.contains(&Symbol::named("TIMES")));
        assert!(follow_factor.contains(&Symbol::Eof));
    }

    #[test]
    fn test_first_of_sequence_nullable_chain() {
        let grammar = GrammarBuilder::new()
            .rule("S", [Production::seq(&["A", "B", "x"])])
            .rule("A", [Production::seq(&["a"]), Production::epsilon()])
            .rule("B", [Production::seq(&["b"]), Production::epsilon()])
            .build();
        let analysis = BacktrackFreeGrammar::analyze(grammar, "S").unwrap();

        let first = analysis.first_of_sequence(&[
            Symbol::named("A"),
            Symbol::named("B"),
            Symbol::named("x"),
        ]);
        assert!(first.contains(&Symbol::named("a")));
        assert!(first.contains(&Symbol::named("b")));
        assert!(first.contains(&Symbol::named("x")));
        // The trailing terminal blocks epsilon.
        assert!(!first.contains(&Symbol::Epsilon));
    }

    #[test]
    fn test_first_plus_extends_with_follow() {
        let analysis = BacktrackFreeGrammar::analyze(expr_grammar(), "Expr").unwrap();
        let rule = analysis.grammar().rule("ExprTail").unwrap().clone();
        let epsilon_production = rule.productions.last().unwrap();

        let first_plus = analysis.first_plus("ExprTail", epsilon_production);
        assert!(first_plus.contains(&Symbol::Epsilon));
        assert!(first_plus.contains(&Symbol::Eof));
        assert!(first_plus.contains(&Symbol::named("RPAREN")));
    }

    #[test]
    fn test_expression_grammar_is_backtrack_free() {
        assert!(is_backtrack_free(&expr_grammar(), "Expr").unwrap());
    }

    #[test]
    fn test_common_prefix_is_not_backtrack_free() {
        let grammar = GrammarBuilder::new()
            .rule(
                "S",
                [Production::seq(&["a", "b"]), Production::seq(&["a", "c"])],
            )
            .build();
        assert!(!is_backtrack_free(&grammar, "S").unwrap());
    }

    #[test]
    fn test_unknown_start_symbol() {
        let err = is_backtrack_free(&expr_grammar(), "Missing").unwrap_err();
        assert!(matches!(err, GrammarError::UnknownStartSymbol { .. }));
    }
}
