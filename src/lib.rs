//! Formlang classifies formal grammars and converts between regular grammars and finite
//! automata.
//!
//! A [`Grammar`] is classified in the Chomsky hierarchy with [`Grammar::classify`]. A regular
//! grammar can be turned into an [`Nfa`], an NFA determinized into a [`Dfa`], a DFA minimized,
//! and any automaton turned back into a regular grammar. Every conversion reads its input and
//! returns a freshly built value.
//!
//! # Example
//!
//! ```rust
//! use formlang::{FiniteAutomaton, GrammarBuilder, GrammarType};
//! use formlang::{determinize, grammar_to_nfa, minimize};
//!
//! // A -> a A | a B | ε, B -> b
//! let grammar = GrammarBuilder::new("A")
//!     .rule("A", &["a", "<A>"])
//!     .rule("A", &["a", "<B>"])
//!     .rule("A", &[])
//!     .rule("B", &["b"])
//!     .build()
//!     .unwrap();
//! assert_eq!(grammar.classify(), GrammarType::Regular);
//!
//! let nfa = grammar_to_nfa(&grammar).unwrap();
//! let dfa = minimize(&determinize(&nfa));
//! assert!(dfa.accepts(&["a", "a", "b"]));
//! assert!(!dfa.accepts(&["b"]));
//! ```

pub mod automaton;
pub mod convert;
pub mod determinize;
pub mod grammar;
pub mod minimize;
pub mod symbol;
pub mod utils;

pub use automaton::{
    Dfa, DfaBuilder, Edge, FiniteAutomaton, Input, Nfa, NfaBuilder, State, StateId,
};
pub use convert::{automaton_to_grammar, grammar_to_nfa};
pub use determinize::{Limits, determinize, determinize_with};
pub use grammar::{
    GenerationConfig, Grammar, GrammarBuilder, GrammarType, Linearity, Production, classify,
};
pub use minimize::minimize;
pub use symbol::{Alphabet, Symbol};
pub use utils::{FormLangError, Result};
