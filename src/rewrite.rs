//! Grammar transformations: left-recursion elimination and left-factoring
//!
//! All three transformations are pure: they take a grammar and return a new
//! one recognizing exactly the same language. Fresh non-terminals introduced
//! by a rewrite are named after their base (`A'`, then `A''`, and so on),
//! skipping any name the grammar already uses, and are inserted immediately
//! after their base rule so transformed grammars stay readable.
//!
//! Rewritten productions carry no semantic actions: a rewrite reshapes
//! production boundaries, so any action attached to an original production
//! no longer lines up with a single new one. Rules a transformation leaves
//! untouched keep their actions.

use crate::grammar::{Grammar, Production, Symbol};
use hashbrown::{HashMap, HashSet};

/// Production bodies of one non-terminal, in order
type Bodies = Vec<Vec<Symbol>>;

/// Collect every name the grammar mentions, so fresh names cannot collide
fn used_names(grammar: &Grammar) -> HashSet<String> {
    let mut used: HashSet<String> = grammar.non_terminals().iter().map(|s| s.to_string()).collect();
    used.extend(grammar.terminals());
    used
}

/// A fresh non-terminal name derived from `base`
fn fresh_name(used: &mut HashSet<String>, base: &str) -> String {
    let mut candidate = format!("{}'", base);
    while used.contains(&candidate) {
        candidate.push('\'');
    }
    used.insert(candidate.clone());
    candidate
}

/// Body symbols with the EPSILON placeholder stripped
fn real_symbols(body: &[Symbol]) -> Vec<Symbol> {
    body.iter()
        .filter(|s| !matches!(s, Symbol::Epsilon))
        .cloned()
        .collect()
}

fn starts_with(body: &[Symbol], name: &str) -> bool {
    matches!(body.first(), Some(Symbol::Named(n)) if n == name)
}

/// Wrap a possibly-empty symbol sequence as a production body
fn body_or_epsilon(symbols: Vec<Symbol>) -> Vec<Symbol> {
    if symbols.is_empty() {
        vec![Symbol::Epsilon]
    } else {
        symbols
    }
}

/// Rewrite the direct left recursion of one non-terminal's bodies
///
/// Returns the new tail rule `(name, bodies)` when the non-terminal was
/// recursive, leaving `bodies` rewritten in place.
fn eliminate_direct(
    name: &str,
    bodies: &mut Bodies,
    used: &mut HashSet<String>,
) -> Option<(String, Bodies)> {
    let (recursive, others): (Bodies, Bodies) =
        bodies.drain(..).partition(|b| starts_with(b, name));

    if recursive.is_empty() {
        *bodies = others;
        return None;
    }

    let tail = fresh_name(used, name);

    for body in others {
        let mut symbols = real_symbols(&body);
        symbols.push(Symbol::named(&tail));
        bodies.push(symbols);
    }

    let mut tail_bodies: Bodies = Vec::new();
    for body in recursive {
        // A -> A alpha becomes tail -> alpha tail; a bare A -> A cycle
        // contributes nothing to the language.
        let alpha = real_symbols(&body[1..]);
        if alpha.is_empty() {
            continue;
        }
        let mut symbols = alpha;
        symbols.push(Symbol::named(&tail));
        tail_bodies.push(symbols);
    }
    tail_bodies.push(vec![Symbol::Epsilon]);

    Some((tail, tail_bodies))
}

/// Rebuild a [`Grammar`] from ordered (name, bodies) pairs
fn rebuild(rules: Vec<(String, Bodies)>) -> Grammar {
    let mut grammar = Grammar::new();
    for (name, bodies) in rules {
        for body in bodies {
            grammar.add_production(&name, Production::new(body));
        }
    }
    grammar
}

/// Extract ordered (name, bodies) pairs from a grammar
fn to_bodies(grammar: &Grammar) -> Vec<(String, Bodies)> {
    grammar
        .rules()
        .map(|rule| {
            (
                rule.name.clone(),
                rule.productions.iter().map(|p| p.symbols.clone()).collect(),
            )
        })
        .collect()
}

/// Remove direct left recursion only
///
/// For each non-terminal A with a production `A -> A alpha`, a fresh tail
/// non-terminal A' is introduced such that `A -> beta A'` for every
/// non-recursive `A -> beta`, and `A' -> alpha A' | epsilon`.
pub fn remove_direct_left_recursion(grammar: &Grammar) -> Grammar {
    let mut used = used_names(grammar);
    let mut out: Vec<(String, Bodies)> = Vec::new();

    for (name, mut bodies) in to_bodies(grammar) {
        let tail = eliminate_direct(&name, &mut bodies, &mut used);
        if !bodies.is_empty() {
            out.push((name, bodies));
        }
        if let Some(tail_rule) = tail {
            out.push(tail_rule);
        }
    }
    rebuild(out)
}

/// Remove all left recursion, direct and indirect
///
/// The standard two-phase algorithm: processing non-terminals in grammar
/// order, each production `Ai -> Aj gamma` with j < i is expanded by
/// substituting Aj's current alternatives (in order), after which Ai's
/// direct recursion is eliminated.
pub fn remove_left_recursion(grammar: &Grammar) -> Grammar {
    let order: Vec<String> = grammar
        .non_terminals()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut used = used_names(grammar);
    let mut bodies_by_name: HashMap<String, Bodies> = to_bodies(grammar).into_iter().collect();
    // Tail rules keyed by the index of their base in `order`.
    let mut tails: Vec<(usize, String, Bodies)> = Vec::new();

    for i in 0..order.len() {
        for j in 0..i {
            // Expand every Ai production that starts with Aj until none do.
            loop {
                let ai_bodies = bodies_by_name.get(&order[i]).expect("rule exists");
                let Some(pos) = ai_bodies.iter().position(|b| starts_with(b, &order[j])) else {
                    break;
                };
                let aj_bodies = bodies_by_name.get(&order[j]).expect("rule exists").clone();

                let ai_bodies = bodies_by_name.get_mut(&order[i]).expect("rule exists");
                let gamma = real_symbols(&ai_bodies.remove(pos)[1..]);
                for (offset, beta) in aj_bodies.iter().enumerate() {
                    let mut symbols = real_symbols(beta);
                    symbols.extend(gamma.iter().cloned());
                    ai_bodies.insert(pos + offset, body_or_epsilon(symbols));
                }
            }
        }

        let bodies = bodies_by_name.get_mut(&order[i]).expect("rule exists");
        if let Some((tail_name, tail_bodies)) = eliminate_direct(&order[i], bodies, &mut used) {
            tails.push((i, tail_name, tail_bodies));
        }
    }

    let mut out: Vec<(String, Bodies)> = Vec::new();
    for (i, name) in order.iter().enumerate() {
        let bodies = bodies_by_name.remove(name).expect("rule exists");
        if !bodies.is_empty() {
            out.push((name.clone(), bodies));
        }
        for (base, tail_name, tail_bodies) in &tails {
            if *base == i {
                out.push((tail_name.clone(), tail_bodies.clone()));
            }
        }
    }
    rebuild(out)
}

/// The longest common prefix of two symbol sequences
fn common_prefix_len(a: &[Symbol], b: &[Symbol]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// Find a group of alternatives sharing a non-trivial prefix
///
/// Alternatives are grouped by first symbol; the first group with two or
/// more members is returned along with the group's longest common prefix.
fn find_factorable(bodies: &Bodies) -> Option<(Vec<usize>, Vec<Symbol>)> {
    for (i, body) in bodies.iter().enumerate() {
        let Some(first @ Symbol::Named(_)) = body.first() else {
            continue;
        };
        let members: Vec<usize> = bodies
            .iter()
            .enumerate()
            .filter(|(_, b)| b.first() == Some(first))
            .map(|(idx, _)| idx)
            .collect();
        if members.len() < 2 {
            continue;
        }
        if members[0] != i {
            continue; // already reported for the group's first member
        }

        let mut prefix_len = bodies[members[0]].len();
        for &idx in &members[1..] {
            prefix_len = prefix_len.min(common_prefix_len(&bodies[members[0]], &bodies[idx]));
        }
        let prefix = bodies[members[0]][..prefix_len].to_vec();
        return Some((members, prefix));
    }
    None
}

/// Left-factor shared prefixes out of every non-terminal
///
/// Alternatives sharing a non-trivial common symbol prefix are rewritten
/// into one shared-prefix production feeding a fresh non-terminal that holds
/// the differing suffixes, recursively, until no non-terminal has
/// alternatives sharing a prefix.
pub fn left_factor(grammar: &Grammar) -> Grammar {
    let mut used = used_names(grammar);
    let mut rules: Vec<(String, Bodies)> = to_bodies(grammar);

    let mut changed = true;
    while changed {
        changed = false;
        let mut i = 0;
        while i < rules.len() {
            if let Some((members, prefix)) = find_factorable(&rules[i].1) {
                let name = rules[i].0.clone();
                let tail = fresh_name(&mut used, &name);

                let mut suffixes: Bodies = Vec::new();
                // Walk members in reverse so earlier removals do not shift
                // later indices.
                for &idx in members.iter().rev() {
                    let body = rules[i].1.remove(idx);
                    suffixes.insert(0, body_or_epsilon(body[prefix.len()..].to_vec()));
                }

                let mut factored = prefix;
                factored.push(Symbol::named(&tail));
                rules[i].1.insert(members[0], factored);

                rules.insert(i + 1, (tail, suffixes));
                changed = true;
            }
            i += 1;
        }
    }
    rebuild(rules)
}
