//! Nondeterministic finite automata and Thompson construction
//!
//! An [`Automaton`] is a dense graph of states over symbol codes, with
//! epsilon moves stored separately from consuming transitions so that the
//! no-input invariant is structural rather than encoded as a sentinel code.
//! Fragments compose with [`Automaton::concat`], [`Automaton::union`] and
//! [`Automaton::star`]; sub-patterns that are reused (`a+` is `a` followed by
//! a starred copy of `a`) are duplicated with `clone` to avoid aliasing.
//!
//! Construction never fails: malformed regex syntax is rejected earlier, in
//! the regex compiler.

use hashbrown::HashSet;

/// State index in an [`Automaton`]
///
/// Uses u32 which is sufficient for all practical automaton sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StateId(pub u32);

impl StateId {
    #[inline]
    fn offset(self, by: u32) -> StateId {
        StateId(self.0 + by)
    }
}

/// A single NFA state
#[derive(Debug, Clone, Default)]
pub struct State {
    /// Consuming transitions: (symbol code, target state)
    transitions: Vec<(u32, StateId)>,
    /// Epsilon transitions (consume no input)
    epsilon: Vec<StateId>,
}

/// A nondeterministic finite automaton over symbol codes
#[derive(Debug, Clone, Default)]
pub struct Automaton {
    states: Vec<State>,
    start: StateId,
    accepting: HashSet<StateId>,
    description: Option<String>,
}

impl Automaton {
    /// Create an automaton with a single, non-accepting start state
    pub fn new() -> Self {
        Self {
            states: vec![State::default()],
            start: StateId(0),
            accepting: HashSet::new(),
            description: None,
        }
    }

    /// Fragment matching exactly one occurrence of `code`
    pub fn single(code: u32) -> Self {
        Self::from_codes([code])
    }

    /// Fragment matching exactly one occurrence of any code in `codes`
    ///
    /// This is the character-class leaf of Thompson construction: one start
    /// state with a consuming transition per valid code into one accept
    /// state.
    pub fn from_codes(codes: impl IntoIterator<Item = u32>) -> Self {
        let mut nfa = Self::new();
        let accept = nfa.add_state();
        for code in codes {
            nfa.add_transition(nfa.start, code, accept);
        }
        nfa.set_accepting(accept);
        nfa
    }

    /// Attach a human-readable description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The description, if any
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Add a fresh state and return its id
    pub fn add_state(&mut self) -> StateId {
        let id = StateId(self.states.len() as u32);
        self.states.push(State::default());
        id
    }

    /// Add a consuming transition
    ///
    /// # Panics
    /// Panics if either state id is out of bounds; ids must come from
    /// [`Automaton::add_state`] on this automaton.
    pub fn add_transition(&mut self, from: StateId, code: u32, to: StateId) {
        assert!((to.0 as usize) < self.states.len(), "invalid target state");
        self.states[from.0 as usize].transitions.push((code, to));
    }

    /// Add an epsilon transition
    pub fn add_epsilon(&mut self, from: StateId, to: StateId) {
        assert!((to.0 as usize) < self.states.len(), "invalid target state");
        self.states[from.0 as usize].epsilon.push(to);
    }

    /// Mark a state as accepting
    pub fn set_accepting(&mut self, state: StateId) {
        self.accepting.insert(state);
    }

    /// The start state
    pub fn start(&self) -> StateId {
        self.start
    }

    /// Number of states
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Whether `state` is accepting
    pub fn is_accepting(&self, state: StateId) -> bool {
        self.accepting.contains(&state)
    }

    /// Iterate the accepting states
    pub fn accepting_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.accepting.iter().copied()
    }

    /// The ordered alphabet: every distinct symbol code on some transition
    pub fn alphabet(&self) -> Vec<u32> {
        let mut codes: Vec<u32> = self
            .states
            .iter()
            .flat_map(|s| s.transitions.iter().map(|&(code, _)| code))
            .collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }

    /// Consuming transitions out of `state`
    pub fn transitions(&self, state: StateId) -> &[(u32, StateId)] {
        &self.states[state.0 as usize].transitions
    }

    /// Epsilon transitions out of `state`
    pub fn epsilon_transitions(&self, state: StateId) -> &[StateId] {
        &self.states[state.0 as usize].epsilon
    }

    /// Append another automaton's states, remapping its ids by the returned
    /// offset. The absorbed start/accepting metadata is NOT merged; callers
    /// wire the fragments together.
    fn absorb(&mut self, other: Automaton) -> u32 {
        let offset = self.states.len() as u32;
        for state in other.states {
            self.states.push(State {
                transitions: state
                    .transitions
                    .into_iter()
                    .map(|(code, to)| (code, to.offset(offset)))
                    .collect(),
                epsilon: state.epsilon.into_iter().map(|to| to.offset(offset)).collect(),
            });
        }
        offset
    }

    /// Chain `self` and `other`: every accepting state of `self` gains an
    /// epsilon move to `other`'s start, and `other`'s accepting states become
    /// the accepting states of the result.
    pub fn concat(mut self, other: Automaton) -> Automaton {
        let other_start = other.start;
        let other_accepting: Vec<StateId> = other.accepting.iter().copied().collect();
        let offset = self.absorb(other);

        let old_accepting: Vec<StateId> = self.accepting.drain().collect();
        for state in old_accepting {
            self.add_epsilon(state, other_start.offset(offset));
        }
        self.accepting = other_accepting.iter().map(|&s| s.offset(offset)).collect();
        self
    }

    /// Branch between `self` and `other`: a new start epsilon-branches to
    /// both starts, and both accept sets epsilon-merge into a new accept
    /// state.
    pub fn union(self, other: Automaton) -> Automaton {
        let left_start = self.start;
        let left_accepting: Vec<StateId> = self.accepting.iter().copied().collect();
        let right_start = other.start;
        let right_accepting: Vec<StateId> = other.accepting.iter().copied().collect();

        let mut nfa = Automaton::new();
        let left_offset = nfa.absorb(self);
        let right_offset = nfa.absorb(other);
        let accept = nfa.add_state();

        nfa.add_epsilon(nfa.start, left_start.offset(left_offset));
        nfa.add_epsilon(nfa.start, right_start.offset(right_offset));
        for s in left_accepting {
            nfa.add_epsilon(s.offset(left_offset), accept);
        }
        for s in right_accepting {
            nfa.add_epsilon(s.offset(right_offset), accept);
        }
        nfa.set_accepting(accept);
        nfa
    }

    /// Kleene star: zero or more repetitions of `self`
    pub fn star(self) -> Automaton {
        let inner_start = self.start;
        let inner_accepting: Vec<StateId> = self.accepting.iter().copied().collect();

        let mut nfa = Automaton::new();
        let offset = nfa.absorb(self);
        let accept = nfa.add_state();

        nfa.add_epsilon(nfa.start, inner_start.offset(offset));
        nfa.add_epsilon(nfa.start, accept);
        for s in inner_accepting {
            nfa.add_epsilon(s.offset(offset), inner_start.offset(offset));
            nfa.add_epsilon(s.offset(offset), accept);
        }
        nfa.set_accepting(accept);
        nfa
    }

    /// Determinize into a [`crate::dfa::Dfa`] by subset construction
    pub fn to_dfa(&self) -> crate::dfa::Dfa {
        crate::dfa::Dfa::from_nfa(self)
    }

    /// Epsilon closure: every state reachable from `seeds` without consuming
    /// input, returned as a sorted, deduplicated set
    pub fn epsilon_closure(&self, seeds: impl IntoIterator<Item = StateId>) -> Vec<StateId> {
        let mut closure: HashSet<StateId> = HashSet::new();
        let mut work: Vec<StateId> = seeds.into_iter().collect();
        while let Some(state) = work.pop() {
            if closure.insert(state) {
                work.extend(self.epsilon_transitions(state).iter().copied());
            }
        }
        let mut sorted: Vec<StateId> = closure.into_iter().collect();
        sorted.sort_unstable();
        sorted
    }

    /// Run the NFA directly over a code sequence (used by equivalence tests;
    /// matching in production goes through the determinized form)
    pub fn accepts(&self, input: &[u32]) -> bool {
        let mut current = self.epsilon_closure([self.start]);
        for &code in input {
            let next: Vec<StateId> = current
                .iter()
                .flat_map(|&s| {
                    self.transitions(s)
                        .iter()
                        .filter(move |&&(c, _)| c == code)
                        .map(|&(_, to)| to)
                })
                .collect();
            current = self.epsilon_closure(next);
            if current.is_empty() {
                return false;
            }
        }
        current.iter().any(|&s| self.is_accepting(s))
    }
}
