//! Subset construction and longest-match scanning
//!
//! A [`Dfa`] is built once from an [`Automaton`] by the standard subset
//! construction: starting from the epsilon closure of the NFA start state,
//! each (state set, symbol) pair is epsilon-closed into a candidate set, and
//! distinct sets become DFA states. Sets are deduplicated by their canonical
//! sorted form used directly as a hash-map key. The result is immutable and
//! cheap to share.
//!
//! Matching realizes maximal munch: the scanner records the last input
//! position at which an accepting state was seen and reports that longest
//! accepted prefix.

use crate::automaton::{Automaton, StateId};
use ahash::RandomState;
use hashbrown::HashMap;

/// A deterministic state: at most one transition per symbol code
#[derive(Debug, Clone)]
struct DfaState {
    /// Transitions sorted by symbol code for binary search
    transitions: Vec<(u32, u32)>,
    accepting: bool,
}

/// A longest-match result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a> {
    /// Length of the matched prefix in bytes
    pub len: usize,
    /// The matched substring
    pub text: &'a str,
}

/// A deterministic finite automaton produced by subset construction
#[derive(Debug, Clone)]
pub struct Dfa {
    states: Vec<DfaState>,
    description: Option<String>,
}

impl Dfa {
    /// Determinize an NFA
    pub fn from_nfa(nfa: &Automaton) -> Self {
        let alphabet = nfa.alphabet();

        // Canonical sorted state-sets keyed directly in the dedup map.
        let mut index: HashMap<Vec<StateId>, u32, RandomState> =
            HashMap::with_hasher(RandomState::new());
        let mut sets: Vec<Vec<StateId>> = Vec::new();
        let mut states: Vec<DfaState> = Vec::new();

        let start_set = nfa.epsilon_closure([nfa.start()]);
        index.insert(start_set.clone(), 0);
        sets.push(start_set);

        let mut next = 0;
        while next < sets.len() {
            let current = sets[next].clone();
            let mut transitions = Vec::new();

            for &code in &alphabet {
                let moved: Vec<StateId> = current
                    .iter()
                    .flat_map(|&s| {
                        nfa.transitions(s)
                            .iter()
                            .filter(move |&&(c, _)| c == code)
                            .map(|&(_, to)| to)
                    })
                    .collect();
                if moved.is_empty() {
                    continue;
                }

                let closure = nfa.epsilon_closure(moved);
                let target = match index.get(&closure) {
                    Some(&id) => id,
                    None => {
                        let id = sets.len() as u32;
                        index.insert(closure.clone(), id);
                        sets.push(closure);
                        id
                    }
                };
                transitions.push((code, target));
            }

            let accepting = current.iter().any(|&s| nfa.is_accepting(s));
            states.push(DfaState {
                transitions,
                accepting,
            });
            next += 1;
        }

        Self {
            states,
            description: nfa.description().map(str::to_string),
        }
    }

    /// The description inherited from the source NFA, if any
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Number of deterministic states
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Follow the transition for `code` out of `state`, if present
    fn step(&self, state: u32, code: u32) -> Option<u32> {
        let transitions = &self.states[state as usize].transitions;
        transitions
            .binary_search_by_key(&code, |&(c, _)| c)
            .ok()
            .map(|idx| transitions[idx].1)
    }

    /// Longest accepted prefix of `input` (maximal munch)
    ///
    /// Returns `None` when no prefix (including the empty one) is accepted.
    /// A zero-length match is possible for patterns like `a*`.
    pub fn longest_match<'a>(&self, input: &'a str) -> Option<Match<'a>> {
        let mut state = 0;
        let mut last_accepting = if self.states[0].accepting {
            Some(0)
        } else {
            None
        };

        for (i, byte) in input.bytes().enumerate() {
            match self.step(state, u32::from(byte)) {
                Some(next) => {
                    state = next;
                    if self.states[state as usize].accepting {
                        last_accepting = Some(i + 1);
                    }
                }
                None => break,
            }
        }

        last_accepting.map(|len| Match {
            len,
            text: &input[..len],
        })
    }

    /// Whether the DFA accepts `input` exactly (the whole string)
    pub fn accepts(&self, input: &str) -> bool {
        self.longest_match(input)
            .map(|m| m.len == input.len())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(s: &str) -> Automaton {
        s.bytes()
            .map(|b| Automaton::single(u32::from(b)))
            .reduce(Automaton::concat)
            .expect("non-empty literal")
    }

    #[test]
    fn test_literal_match() {
        let dfa = Dfa::from_nfa(&literal("abc"));
        assert!(dfa.accepts("abc"));
        assert!(!dfa.accepts("ab"));
        assert!(!dfa.accepts("abcd"));

        let m = dfa.longest_match("abcdef").unwrap();
        assert_eq!(m.len, 3);
        assert_eq!(m.text, "abc");
    }

    #[test]
    fn test_star_matches_empty() {
        let dfa = Dfa::from_nfa(&literal("a").star());
        assert!(dfa.accepts(""));
        assert!(dfa.accepts("aaaa"));

        let m = dfa.longest_match("b").unwrap();
        assert_eq!(m.len, 0);
    }

    #[test]
    fn test_union_determinizes() {
        let nfa = literal("if").union(literal("in"));
        let dfa = Dfa::from_nfa(&nfa);
        assert!(dfa.accepts("if"));
        assert!(dfa.accepts("in"));
        assert!(!dfa.accepts("i"));
        assert!(!dfa.accepts("ifn"));
    }

    #[test]
    fn test_maximal_munch_prefers_longest() {
        // (a | aa) should match "aa" fully, not stop at the first 'a'.
        let nfa = literal("a").union(literal("aa"));
        let dfa = Dfa::from_nfa(&nfa);
        let m = dfa.longest_match("aaa").unwrap();
        assert_eq!(m.len, 2);
    }

    #[test]
    fn test_equivalence_with_nfa() {
        let nfa = literal("ab").union(literal("a").star());
        let dfa = Dfa::from_nfa(&nfa);
        for input in ["", "a", "aa", "ab", "aab", "b", "ba"] {
            let codes: Vec<u32> = input.bytes().map(u32::from).collect();
            assert_eq!(
                nfa.accepts(&codes),
                dfa.accepts(input),
                "disagreement on {:?}",
                input
            );
        }
    }

    #[test]
    fn test_state_sets_deduplicated() {
        // a* has a small deterministic form no matter how many NFA states
        // the Thompson construction produced.
        let dfa = Dfa::from_nfa(&literal("a").star());
        assert!(dfa.state_count() <= 3);
    }
}
