//! DFA minimization by Moore-style partition refinement.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use crate::automaton::{Dfa, FiniteAutomaton, State, StateId};
use crate::utils::fresh_name;

/// Minimize a DFA.
///
/// States that are unreachable from the start state, or from which no accepting state can be
/// reached, are dropped first; transitions into dropped states become rejections. The rest
/// starts out split into accepting and non-accepting blocks, and a block is split again
/// whenever two of its states move to different blocks on some symbol (a missing
/// transition counts as its own target). At the fixpoint every block becomes one state.
///
/// The result is a partial DFA: the sink state of a complete input DFA is removed too.
///
/// The result is numbered breadth-first from the start state, so equivalent inputs give
/// identical outputs. A merged block is labelled with its members, e.g. `{0, 2}`.
pub fn minimize(dfa: &Dfa) -> Dfa {
    let live = live_states(dfa);
    let blocks = refine(dfa, &live);

    let mut members: BTreeMap<usize, Vec<StateId>> = BTreeMap::new();
    for &state in &live {
        members.entry(blocks[&state]).or_default().push(state);
    }

    // Canonical numbering: breadth-first over blocks, symbols in alphabet order.
    let mut ids: BTreeMap<usize, StateId> = BTreeMap::from([(blocks[&dfa.start()], 0)]);
    let mut order = vec![blocks[&dfa.start()]];
    let mut queue = VecDeque::from([blocks[&dfa.start()]]);
    let mut table = Vec::new();

    while let Some(block) = queue.pop_front() {
        let representative = members[&block][0];
        let mut row = BTreeMap::new();

        for symbol in dfa.alphabet() {
            let Some(target) = dfa
                .next(representative, symbol)
                .and_then(|next| blocks.get(&next).copied())
            else {
                continue;
            };
            let next_id = ids.len();
            let id = *ids.entry(target).or_insert_with(|| {
                order.push(target);
                queue.push_back(target);
                next_id
            });
            row.insert(symbol.clone(), id);
        }

        table.push(row);
    }

    let mut labels = HashSet::with_capacity(order.len());
    let states = order
        .iter()
        .map(|block| {
            let group = &members[block];
            let label = fresh_name(&block_label(dfa, group), |name| labels.contains(name));
            labels.insert(label.clone());
            State::new(label, dfa.is_accepting(group[0]))
        })
        .collect();

    Dfa::from_trusted_table(states, dfa.alphabet().clone(), 0, table)
}

/// Refine the accepting/non-accepting split of `live` until no block splits.
fn refine(dfa: &Dfa, live: &BTreeSet<StateId>) -> BTreeMap<StateId, usize> {
    let mut blocks: BTreeMap<StateId, usize> = live
        .iter()
        .map(|&state| (state, usize::from(dfa.is_accepting(state))))
        .collect();
    let mut count = blocks.values().collect::<BTreeSet<_>>().len();

    loop {
        let mut signatures: BTreeMap<(usize, Vec<Option<usize>>), usize> = BTreeMap::new();
        let mut refined = BTreeMap::new();

        for &state in live {
            let moves = dfa
                .alphabet()
                .iter()
                .map(|symbol| {
                    dfa.next(state, symbol)
                        .and_then(|next| blocks.get(&next).copied())
                })
                .collect();
            let fresh = signatures.len();
            let block = *signatures.entry((blocks[&state], moves)).or_insert(fresh);
            refined.insert(state, block);
        }

        blocks = refined;
        if signatures.len() == count {
            return blocks;
        }
        count = signatures.len();
    }
}

/// States reachable from the start state that can still reach an accepting state.
/// The start state is always kept.
fn live_states(dfa: &Dfa) -> BTreeSet<StateId> {
    let mut reverse = vec![Vec::new(); dfa.num_states()];
    for edge in dfa.edges() {
        reverse[edge.to].push(edge.from);
    }

    let reachable = search(dfa.start(), |state| {
        dfa.transitions_from(state)
            .into_iter()
            .map(|(_, to)| to)
            .collect()
    });

    let mut productive = BTreeSet::new();
    for accepting in dfa.accepting_states() {
        if !productive.contains(&accepting) {
            productive.extend(search(accepting, |state| reverse[state].clone()));
        }
    }

    let mut live: BTreeSet<StateId> = reachable.intersection(&productive).copied().collect();
    live.insert(dfa.start());
    live
}

fn search<F>(from: StateId, successors: F) -> BTreeSet<StateId>
where
    F: Fn(StateId) -> Vec<StateId>,
{
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::from([from]);
    while let Some(state) = queue.pop_front() {
        if visited.insert(state) {
            queue.extend(successors(state));
        }
    }
    visited
}

fn block_label(dfa: &Dfa, group: &[StateId]) -> String {
    match group {
        [single] => dfa.states()[*single].label().to_string(),
        _ => {
            let labels: Vec<&str> = group
                .iter()
                .map(|&state| dfa.states()[state].label())
                .collect();
            format!("{{{}}}", labels.join(", "))
        }
    }
}
