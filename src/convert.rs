//! Conversions between regular grammars and finite automata.

use std::collections::{BTreeMap, BTreeSet};

use crate::automaton::{Edge, FiniteAutomaton, Input, Nfa, State, StateId};
use crate::grammar::{Grammar, GrammarType, Linearity, Production};
use crate::symbol::Symbol;
use crate::utils::{FormLangError, Result, fresh_name};

/// Build an NFA accepting the language of a regular grammar.
///
/// A right-linear grammar gets one state per non-terminal plus an accepting `final` state:
/// `A -> a B` becomes `A --a--> B`, `A -> a` becomes `A --a--> final` and `A -> ε` makes `A`
/// accepting. A left-linear grammar is read backwards from a fresh `initial` start state:
/// `A -> B a` becomes `B --a--> A`, `A -> a` becomes `initial --a--> A`, `A -> ε` becomes
/// `initial --ε--> A`, and only the start symbol's state accepts.
pub fn grammar_to_nfa(grammar: &Grammar) -> Result<Nfa> {
    let linearity = grammar
        .linearity()
        .ok_or_else(|| FormLangError::UnsupportedGrammarType {
            expected: GrammarType::Regular,
            found: grammar.classify(),
        })?;

    let ids: BTreeMap<&str, StateId> = grammar
        .non_terminals()
        .iter()
        .enumerate()
        .map(|(id, name)| (name.as_str(), id))
        .collect();
    let extra = ids.len();
    let extra_label = fresh_name(
        match linearity {
            Linearity::Right => "final",
            Linearity::Left => "initial",
        },
        |name| grammar.has_non_terminal(name),
    );

    let mut accepting = BTreeSet::new();
    let mut edges = Vec::new();

    for production in grammar.productions() {
        // Regular productions always have a single non-terminal head.
        let Some(head) = production.head() else {
            continue;
        };
        let head = ids[head];

        match (linearity, production.rhs()) {
            (Linearity::Right, []) => {
                accepting.insert(head);
            }
            (Linearity::Right, [Symbol::Terminal(a)]) => {
                edges.push(edge(head, a, extra));
            }
            (Linearity::Right, [Symbol::Terminal(a), Symbol::NonTerminal(b)]) => {
                edges.push(edge(head, a, ids[b.as_str()]));
            }
            (Linearity::Left, []) => edges.push(Edge {
                from: extra,
                input: Input::Epsilon,
                to: head,
            }),
            (Linearity::Left, [Symbol::Terminal(a)]) => {
                edges.push(edge(extra, a, head));
            }
            (Linearity::Left, [Symbol::NonTerminal(b), Symbol::Terminal(a)]) => {
                edges.push(edge(ids[b.as_str()], a, head));
            }
            _ => {}
        }
    }

    let start_id = ids[grammar.start()];
    let (start, extra_accepting) = match linearity {
        Linearity::Right => (start_id, true),
        Linearity::Left => {
            accepting.insert(start_id);
            (extra, false)
        }
    };

    let states = ids
        .keys()
        .enumerate()
        .map(|(id, name)| State::new(*name, accepting.contains(&id)))
        .chain(std::iter::once(State::new(extra_label, extra_accepting)))
        .collect();

    Ok(Nfa::from_trusted_edges(
        states,
        grammar.terminals().clone(),
        start,
        edges,
    ))
}

/// Build a right-linear grammar generating the language accepted by an automaton.
///
/// Every state becomes a non-terminal named after its label. A transition `s --a--> t`
/// becomes `S -> a T` and an accepting state `s` gets `S -> ε`. Epsilon moves are folded in
/// through the epsilon closure of each state so that the result stays regular.
pub fn automaton_to_grammar<A: FiniteAutomaton>(automaton: &A) -> Grammar {
    let names = non_terminal_names(automaton);
    let mut productions = BTreeSet::new();

    for (state, name) in names.iter().enumerate() {
        let head = vec![Symbol::non_terminal(name.as_str())];
        let closure = epsilon_closure(automaton, state);

        for &member in &closure {
            for (input, to) in automaton.transitions_from(member) {
                if let Input::Symbol(symbol) = input {
                    productions.insert(Production::new(
                        head.clone(),
                        vec![
                            Symbol::Terminal(symbol),
                            Symbol::non_terminal(names[to].as_str()),
                        ],
                    ));
                }
            }
        }

        if closure.iter().any(|&member| automaton.is_accepting(member)) {
            productions.insert(Production::new(head, Vec::new()));
        }
    }

    Grammar::from_trusted_parts(
        names[automaton.start()].clone(),
        names.into_iter().collect(),
        automaton.alphabet().clone(),
        productions,
    )
}

fn edge(from: StateId, symbol: &str, to: StateId) -> Edge {
    Edge {
        from,
        input: Input::symbol(symbol),
        to,
    }
}

/// One non-terminal name per state, derived from the state label and kept apart from the
/// alphabet and from each other. Angle brackets are dropped so the name stays writable as
/// `<Name>`.
fn non_terminal_names<A: FiniteAutomaton>(automaton: &A) -> Vec<String> {
    let mut used = BTreeSet::new();
    automaton
        .states()
        .iter()
        .map(|state| {
            let mut base = state.label().replace(['<', '>'], "");
            if base.is_empty() {
                base.push('q');
            }
            let name = fresh_name(&base, |name| {
                used.contains(name) || automaton.alphabet().contains(name)
            });
            used.insert(name.clone());
            name
        })
        .collect()
}

fn epsilon_closure<A: FiniteAutomaton>(automaton: &A, state: StateId) -> BTreeSet<StateId> {
    let mut closure = BTreeSet::new();
    let mut stack = vec![state];

    while let Some(current) = stack.pop() {
        if !closure.insert(current) {
            continue;
        }
        stack.extend(
            automaton
                .transitions_from(current)
                .into_iter()
                .filter(|(input, _)| *input == Input::Epsilon)
                .map(|(_, to)| to),
        );
    }

    closure
}
