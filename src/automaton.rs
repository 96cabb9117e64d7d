//! Finite automata: the nondeterministic [`Nfa`] with epsilon moves and the deterministic [`Dfa`].
//!
//! Both are immutable once built and share the [`FiniteAutomaton`] capability. States are
//! numbered `0..n` in the order they were declared, and every state carries a unique label.
//! A missing DFA transition means rejection.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::symbol::{Alphabet, Symbol};
use crate::utils::{FormLangError, OptionExt, Result};

/// Index of a state inside the automaton that owns it
pub type StateId = usize;

/// A state: a unique label and whether the automaton accepts when it ends there
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    label: String,
    #[serde(default)]
    accepting: bool,
}

impl State {
    pub fn new<S: Into<String>>(label: S, accepting: bool) -> Self {
        State {
            label: label.into(),
            accepting,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }
}

/// What a transition consumes: nothing (an epsilon move) or one symbol of the alphabet
///
/// Serialized as `null` for epsilon and the symbol name otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "Option<String>", from = "Option<String>")]
pub enum Input {
    Epsilon,
    Symbol(String),
}

impl Input {
    pub fn symbol<S: Into<String>>(name: S) -> Self {
        Input::Symbol(name.into())
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Input::Epsilon => None,
            Input::Symbol(name) => Some(name),
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Epsilon => f.write_str("ε"),
            Input::Symbol(name) => f.write_str(name),
        }
    }
}

impl From<Input> for Option<String> {
    fn from(input: Input) -> Self {
        match input {
            Input::Epsilon => None,
            Input::Symbol(name) => Some(name),
        }
    }
}

impl From<Option<String>> for Input {
    fn from(symbol: Option<String>) -> Self {
        symbol.map_or(Input::Epsilon, Input::Symbol)
    }
}

/// A single transition `from --input--> to`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub from: StateId,
    pub input: Input,
    pub to: StateId,
}

/// Capability shared by every finite automaton
pub trait FiniteAutomaton {
    fn states(&self) -> &[State];

    fn alphabet(&self) -> &Alphabet;

    fn start(&self) -> StateId;

    /// Outgoing moves of `state`: epsilon moves first, then by symbol.
    fn transitions_from(&self, state: StateId) -> Vec<(Input, StateId)>;

    /// Simulates the automaton on `word` and returns whether it ends in an accepting state.
    /// A symbol outside the alphabet rejects the word.
    fn accepts<S: AsRef<str>>(&self, word: &[S]) -> bool;

    fn num_states(&self) -> usize {
        self.states().len()
    }

    fn state(&self, id: StateId) -> Option<&State> {
        self.states().get(id)
    }

    /// Find a state by its label.
    fn state_id(&self, label: &str) -> Option<StateId> {
        self.states().iter().position(|state| state.label == label)
    }

    fn is_accepting(&self, id: StateId) -> bool {
        self.state(id).is_some_and(State::is_accepting)
    }

    fn accepting_states(&self) -> BTreeSet<StateId> {
        (0..self.num_states())
            .filter(|&id| self.is_accepting(id))
            .collect()
    }

    /// Every transition of the automaton, ordered by source state.
    fn edges(&self) -> Vec<Edge> {
        (0..self.num_states())
            .flat_map(|from| {
                self.transitions_from(from)
                    .into_iter()
                    .map(move |(input, to)| Edge { from, input, to })
            })
            .collect()
    }

    /// Whether no accepting state is reachable from the start state.
    fn is_empty_language(&self) -> bool {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([self.start()]);

        while let Some(state) = queue.pop_front() {
            if !visited.insert(state) {
                continue;
            }
            if self.is_accepting(state) {
                return false;
            }
            queue.extend(
                self.transitions_from(state)
                    .into_iter()
                    .map(|(_, to)| to)
                    .filter(|to| !visited.contains(to)),
            );
        }

        true
    }
}

/// Moves out of one NFA state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Moves {
    epsilon: BTreeSet<StateId>,
    on: BTreeMap<String, BTreeSet<StateId>>,
}

/// A nondeterministic finite automaton with epsilon moves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Blueprint", try_from = "Blueprint")]
pub struct Nfa {
    states: Vec<State>,
    alphabet: Alphabet,
    start: StateId,
    moves: Vec<Moves>,
}

impl Nfa {
    pub fn builder() -> NfaBuilder {
        NfaBuilder::default()
    }

    /// Assemble an NFA from edges whose endpoints and symbols are known to be valid.
    pub(crate) fn from_trusted_edges<I>(
        states: Vec<State>,
        alphabet: Alphabet,
        start: StateId,
        edges: I,
    ) -> Self
    where
        I: IntoIterator<Item = Edge>,
    {
        let mut moves = vec![Moves::default(); states.len()];
        for Edge { from, input, to } in edges {
            match input {
                Input::Epsilon => moves[from].epsilon.insert(to),
                Input::Symbol(symbol) => moves[from].on.entry(symbol).or_default().insert(to),
            };
        }
        Nfa {
            states,
            alphabet,
            start,
            moves,
        }
    }

    /// States reachable from `state` by consuming `symbol`, without epsilon closure.
    pub fn targets(&self, state: StateId, symbol: &str) -> impl Iterator<Item = StateId> + '_ {
        self.moves
            .get(state)
            .and_then(|moves| moves.on.get(symbol))
            .into_iter()
            .flatten()
            .copied()
    }

    /// The set of states reachable from `states` through zero or more epsilon moves.
    pub fn epsilon_closure(&self, states: &BTreeSet<StateId>) -> BTreeSet<StateId> {
        let mut closure = BTreeSet::new();
        let mut stack: Vec<StateId> = states.iter().copied().collect();

        while let Some(state) = stack.pop() {
            if !closure.insert(state) {
                continue;
            }
            if let Some(moves) = self.moves.get(state) {
                stack.extend(moves.epsilon.iter().filter(|s| !closure.contains(*s)));
            }
        }

        closure
    }

    /// Consume `symbol` from every state of `states`, then close over epsilon moves.
    pub fn step(&self, states: &BTreeSet<StateId>, symbol: &str) -> BTreeSet<StateId> {
        let reached = states
            .iter()
            .flat_map(|&state| self.targets(state, symbol))
            .collect();
        self.epsilon_closure(&reached)
    }

    /// Epsilon closure of the start state.
    pub fn initial_states(&self) -> BTreeSet<StateId> {
        self.epsilon_closure(&BTreeSet::from([self.start]))
    }

    /// Whether the NFA has no epsilon moves and at most one destination per state and symbol.
    pub fn is_deterministic(&self) -> bool {
        self.moves.iter().all(|moves| {
            moves.epsilon.is_empty() && moves.on.values().all(|targets| targets.len() <= 1)
        })
    }
}

impl FiniteAutomaton for Nfa {
    fn states(&self) -> &[State] {
        &self.states
    }

    fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn start(&self) -> StateId {
        self.start
    }

    fn transitions_from(&self, state: StateId) -> Vec<(Input, StateId)> {
        let Some(moves) = self.moves.get(state) else {
            return Vec::new();
        };
        let epsilon = moves.epsilon.iter().map(|&to| (Input::Epsilon, to));
        let symbols = moves.on.iter().flat_map(|(symbol, targets)| {
            targets
                .iter()
                .map(move |&to| (Input::Symbol(symbol.clone()), to))
        });
        epsilon.chain(symbols).collect()
    }

    fn accepts<S: AsRef<str>>(&self, word: &[S]) -> bool {
        let mut live = self.initial_states();
        for symbol in word {
            let symbol = symbol.as_ref();
            if !self.alphabet.contains(symbol) {
                return false;
            }
            live = self.step(&live, symbol);
            if live.is_empty() {
                return false;
            }
        }
        live.iter().any(|&state| self.is_accepting(state))
    }
}

impl From<&Dfa> for Nfa {
    fn from(dfa: &Dfa) -> Self {
        Nfa::from_trusted_edges(
            dfa.states.clone(),
            dfa.alphabet.clone(),
            dfa.start,
            dfa.edges(),
        )
    }
}

/// A deterministic finite automaton with a partial transition function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Blueprint", try_from = "Blueprint")]
pub struct Dfa {
    states: Vec<State>,
    alphabet: Alphabet,
    start: StateId,
    table: Vec<BTreeMap<String, StateId>>,
}

impl Dfa {
    pub fn builder() -> DfaBuilder {
        DfaBuilder::default()
    }

    /// Assemble a DFA from a transition table whose entries are known to be valid.
    pub(crate) fn from_trusted_table(
        states: Vec<State>,
        alphabet: Alphabet,
        start: StateId,
        table: Vec<BTreeMap<String, StateId>>,
    ) -> Self {
        debug_assert_eq!(states.len(), table.len());
        Dfa {
            states,
            alphabet,
            start,
            table,
        }
    }

    /// The destination of `state` on `symbol`, `None` when the DFA rejects.
    pub fn next(&self, state: StateId, symbol: &str) -> Option<StateId> {
        self.table.get(state)?.get(symbol).copied()
    }
}

impl FiniteAutomaton for Dfa {
    fn states(&self) -> &[State] {
        &self.states
    }

    fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn start(&self) -> StateId {
        self.start
    }

    fn transitions_from(&self, state: StateId) -> Vec<(Input, StateId)> {
        self.table
            .get(state)
            .into_iter()
            .flatten()
            .map(|(symbol, &to)| (Input::Symbol(symbol.clone()), to))
            .collect()
    }

    fn accepts<S: AsRef<str>>(&self, word: &[S]) -> bool {
        let mut current = self.start;
        for symbol in word {
            match self.next(current, symbol.as_ref()) {
                Some(next) => current = next,
                None => return false,
            }
        }
        self.is_accepting(current)
    }
}

impl TryFrom<Nfa> for Dfa {
    type Error = FormLangError;

    fn try_from(nfa: Nfa) -> Result<Self> {
        if !nfa.is_deterministic() {
            return Err(FormLangError::MalformedAutomaton(
                "automaton has epsilon moves or several destinations for one symbol".to_string(),
            ));
        }
        let table: Vec<BTreeMap<String, StateId>> = nfa
            .moves
            .into_iter()
            .map(|moves| {
                moves
                    .on
                    .into_iter()
                    .filter_map(|(symbol, targets)| Some((symbol, targets.first().copied()?)))
                    .collect()
            })
            .collect();
        Ok(Dfa::from_trusted_table(
            nfa.states,
            nfa.alphabet,
            nfa.start,
            table,
        ))
    }
}

fn fmt_automaton<A: FiniteAutomaton>(automaton: &A, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = |id: StateId| automaton.states()[id].label();

    writeln!(f, "start: {}", label(automaton.start()))?;
    let accepting: Vec<&str> = automaton
        .accepting_states()
        .into_iter()
        .map(label)
        .collect();
    writeln!(f, "accepting: {}", accepting.join(", "))?;
    for Edge { from, input, to } in automaton.edges() {
        writeln!(f, "{} --{}--> {}", label(from), input, label(to))?;
    }
    Ok(())
}

impl fmt::Display for Nfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_automaton(self, f)
    }
}

impl fmt::Display for Dfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_automaton(self, f)
    }
}

/// Label-based description of an automaton, checked when turned into an [`Nfa`] or [`Dfa`].
/// This is also the serialized form of both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Blueprint {
    states: Vec<State>,
    #[serde(default)]
    alphabet: Alphabet,
    start: Option<String>,
    #[serde(default)]
    transitions: Vec<TransitionSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TransitionSpec {
    from: String,
    input: Input,
    to: String,
}

/// A blueprint whose labels have been resolved to state ids.
struct Resolved {
    states: Vec<State>,
    alphabet: Alphabet,
    start: StateId,
    edges: Vec<Edge>,
}

impl Blueprint {
    fn from_automaton<A: FiniteAutomaton>(automaton: &A) -> Self {
        let label = |id: StateId| automaton.states()[id].label.clone();
        Blueprint {
            states: automaton.states().to_vec(),
            alphabet: automaton.alphabet().clone(),
            start: Some(label(automaton.start())),
            transitions: automaton
                .edges()
                .into_iter()
                .map(|Edge { from, input, to }| TransitionSpec {
                    from: label(from),
                    input,
                    to: label(to),
                })
                .collect(),
        }
    }

    fn resolve(self) -> Result<Resolved> {
        let mut ids: HashMap<String, StateId> = HashMap::with_capacity(self.states.len());
        for (id, state) in self.states.iter().enumerate() {
            if state.label.is_empty() {
                return Err(FormLangError::MalformedAutomaton(
                    "state labels must not be empty".to_string(),
                ));
            }
            if ids.insert(state.label.clone(), id).is_some() {
                return Err(FormLangError::MalformedAutomaton(format!(
                    "duplicate state '{}'",
                    state.label
                )));
            }
        }
        if let Some(symbol) = self.alphabet.iter().find(|symbol| symbol.is_empty()) {
            return Err(FormLangError::MalformedAutomaton(format!(
                "alphabet symbols must not be empty, got '{}'",
                symbol
            )));
        }
        if let Some(symbol) = self
            .alphabet
            .iter()
            .find(|symbol| !Symbol::terminal(symbol.as_str()).is_well_formed())
        {
            return Err(FormLangError::MalformedAutomaton(format!(
                "alphabet symbol '{}' would read as a non-terminal",
                symbol
            )));
        }

        let lookup = |label: &str| {
            ids.get(label)
                .copied()
                .ok_or_malformed_automaton(|| format!("unknown state '{}'", label))
        };

        let start = self
            .start
            .as_deref()
            .ok_or_malformed_automaton(|| "no start state".to_string())
            .and_then(lookup)?;

        let mut edges = Vec::with_capacity(self.transitions.len());
        for TransitionSpec { from, input, to } in self.transitions {
            if let Input::Symbol(symbol) = &input {
                if !self.alphabet.contains(symbol) {
                    return Err(FormLangError::MalformedAutomaton(format!(
                        "symbol '{}' on transition {} -> {} is not in the alphabet",
                        symbol, from, to
                    )));
                }
            }
            edges.push(Edge {
                from: lookup(&from)?,
                input,
                to: lookup(&to)?,
            });
        }

        Ok(Resolved {
            states: self.states,
            alphabet: self.alphabet,
            start,
            edges,
        })
    }

    fn state(&mut self, label: &str, accepting: bool) {
        self.states.push(State::new(label, accepting));
    }

    fn transition(&mut self, from: &str, input: Input, to: &str) {
        self.transitions.push(TransitionSpec {
            from: from.to_string(),
            input,
            to: to.to_string(),
        });
    }
}

impl From<Nfa> for Blueprint {
    fn from(nfa: Nfa) -> Self {
        Blueprint::from_automaton(&nfa)
    }
}

impl From<Dfa> for Blueprint {
    fn from(dfa: Dfa) -> Self {
        Blueprint::from_automaton(&dfa)
    }
}

impl TryFrom<Blueprint> for Nfa {
    type Error = FormLangError;

    fn try_from(blueprint: Blueprint) -> Result<Self> {
        let Resolved {
            states,
            alphabet,
            start,
            edges,
        } = blueprint.resolve()?;
        Ok(Nfa::from_trusted_edges(states, alphabet, start, edges))
    }
}

impl TryFrom<Blueprint> for Dfa {
    type Error = FormLangError;

    fn try_from(blueprint: Blueprint) -> Result<Self> {
        let Resolved {
            states,
            alphabet,
            start,
            edges,
        } = blueprint.resolve()?;

        let mut table = vec![BTreeMap::new(); states.len()];
        for Edge { from, input, to } in edges {
            let Input::Symbol(symbol) = input else {
                return Err(FormLangError::MalformedAutomaton(format!(
                    "epsilon move out of '{}' in a deterministic automaton",
                    states[from].label
                )));
            };
            if let Some(previous) = table[from].insert(symbol.clone(), to) {
                if previous != to {
                    return Err(FormLangError::MalformedAutomaton(format!(
                        "state '{}' has several destinations on '{}'",
                        states[from].label, symbol
                    )));
                }
            }
        }

        Ok(Dfa::from_trusted_table(states, alphabet, start, table))
    }
}

/// Builder for [`Nfa`], addressing states by label
#[derive(Debug, Clone, Default)]
pub struct NfaBuilder {
    blueprint: Blueprint,
}

impl NfaBuilder {
    /// Declare a state. States are numbered in declaration order.
    pub fn state(mut self, label: &str, accepting: bool) -> Self {
        self.blueprint.state(label, accepting);
        self
    }

    /// Add a symbol to the alphabet
    pub fn symbol(mut self, symbol: &str) -> Self {
        self.blueprint.alphabet.insert(symbol.to_string());
        self
    }

    pub fn start(mut self, label: &str) -> Self {
        self.blueprint.start = Some(label.to_string());
        self
    }

    pub fn transition(mut self, from: &str, symbol: &str, to: &str) -> Self {
        self.blueprint.transition(from, Input::symbol(symbol), to);
        self
    }

    pub fn epsilon(mut self, from: &str, to: &str) -> Self {
        self.blueprint.transition(from, Input::Epsilon, to);
        self
    }

    /// Build the NFA, checking that every label and symbol is declared
    pub fn build(self) -> Result<Nfa> {
        Nfa::try_from(self.blueprint)
    }
}

/// Builder for [`Dfa`], addressing states by label
#[derive(Debug, Clone, Default)]
pub struct DfaBuilder {
    blueprint: Blueprint,
}

impl DfaBuilder {
    /// Declare a state. States are numbered in declaration order.
    pub fn state(mut self, label: &str, accepting: bool) -> Self {
        self.blueprint.state(label, accepting);
        self
    }

    /// Add a symbol to the alphabet
    pub fn symbol(mut self, symbol: &str) -> Self {
        self.blueprint.alphabet.insert(symbol.to_string());
        self
    }

    pub fn start(mut self, label: &str) -> Self {
        self.blueprint.start = Some(label.to_string());
        self
    }

    pub fn transition(mut self, from: &str, symbol: &str, to: &str) -> Self {
        self.blueprint.transition(from, Input::symbol(symbol), to);
        self
    }

    /// Build the DFA, also rejecting two destinations for one state and symbol
    pub fn build(self) -> Result<Dfa> {
        Dfa::try_from(self.blueprint)
    }
}
