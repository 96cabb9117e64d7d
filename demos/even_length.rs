use formlang::{Dfa, FiniteAutomaton, automaton_to_grammar, minimize};
use std::error::Error;

/// Minimize a redundant DFA for even-length words and print the result as a grammar
fn main() -> Result<(), Box<dyn Error>> {
    let dfa = Dfa::builder()
        .state("0", true)
        .state("1", false)
        .state("2", true)
        .state("3", false)
        .symbol("a")
        .start("0")
        .transition("0", "a", "1")
        .transition("1", "a", "2")
        .transition("2", "a", "3")
        .transition("3", "a", "0")
        .build()?;

    println!("Original DFA ({} states):", dfa.num_states());
    println!("{}", dfa);

    let minimal = minimize(&dfa);
    println!("Minimal DFA ({} states):", minimal.num_states());
    println!("{}", minimal);

    println!("Equivalent grammar:");
    println!("{}", automaton_to_grammar(&minimal));

    for n in 0..5 {
        let word = vec!["a"; n];
        let verdict = if minimal.accepts(&word) { "accepted" } else { "rejected" };
        println!("{}. a^{} {}", n + 1, n, verdict);
    }

    Ok(())
}
