//! Subset construction: turning an [`Nfa`] into an equivalent [`Dfa`].

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use crate::automaton::{Dfa, FiniteAutomaton, Nfa, State, StateId};
use crate::utils::{FormLangError, Result, fresh_name};

/// Resource limits for determinization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Largest number of DFA states subset construction may create, unbounded when `None`
    pub max_dfa_states: Option<usize>,
}

impl Limits {
    pub fn max_dfa_states(limit: usize) -> Self {
        Limits {
            max_dfa_states: Some(limit),
        }
    }
}

/// Determinize an NFA with the subset construction.
///
/// Each DFA state stands for the epsilon-closed set of NFA states the NFA can be in, and is
/// labelled with that set, e.g. `{0, 1}`. A DFA state accepts when one of its NFA states
/// does. The empty set is never materialised: the DFA simply has no transition there.
pub fn determinize(nfa: &Nfa) -> Dfa {
    let Ok(dfa) = subset_construction(nfa, |_| Ok::<(), Infallible>(()));
    dfa
}

/// Like [`determinize`], failing with `StateExplosion` once the DFA would exceed the limit.
pub fn determinize_with(nfa: &Nfa, limits: &Limits) -> Result<Dfa> {
    subset_construction(nfa, |count| match limits.max_dfa_states {
        Some(limit) if count > limit => Err(FormLangError::StateExplosion { limit }),
        _ => Ok(()),
    })
}

/// `admit` is called with the DFA state count each time a new DFA state is created.
fn subset_construction<E, F>(nfa: &Nfa, mut admit: F) -> std::result::Result<Dfa, E>
where
    F: FnMut(usize) -> std::result::Result<(), E>,
{
    let initial = nfa.initial_states();
    admit(1)?;

    let mut index: HashMap<BTreeSet<StateId>, StateId> = HashMap::from([(initial.clone(), 0)]);
    let mut subsets = vec![initial];
    let mut table: Vec<BTreeMap<String, StateId>> = Vec::new();
    let mut worklist = VecDeque::from([0]);

    // States are discovered and processed in the same breadth-first order,
    // so `current` always equals `table.len()`.
    while let Some(current) = worklist.pop_front() {
        let mut row = BTreeMap::new();

        for symbol in nfa.alphabet() {
            let next = nfa.step(&subsets[current], symbol);
            if next.is_empty() {
                continue;
            }

            let target = match index.get(&next) {
                Some(&id) => id,
                None => {
                    let id = subsets.len();
                    admit(id + 1)?;
                    index.insert(next.clone(), id);
                    subsets.push(next);
                    worklist.push_back(id);
                    id
                }
            };
            row.insert(symbol.clone(), target);
        }

        debug_assert_eq!(current, table.len());
        table.push(row);
    }

    let mut labels = HashSet::with_capacity(subsets.len());
    let states = subsets
        .iter()
        .map(|subset| {
            let label = fresh_name(&subset_label(nfa, subset), |name| labels.contains(name));
            labels.insert(label.clone());
            State::new(label, subset.iter().any(|&s| nfa.is_accepting(s)))
        })
        .collect();

    Ok(Dfa::from_trusted_table(
        states,
        nfa.alphabet().clone(),
        0,
        table,
    ))
}

fn subset_label(nfa: &Nfa, subset: &BTreeSet<StateId>) -> String {
    let members: Vec<&str> = subset
        .iter()
        .map(|&state| nfa.states()[state].label())
        .collect();
    format!("{{{}}}", members.join(", "))
}
