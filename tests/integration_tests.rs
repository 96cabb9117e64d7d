use formlang::{
    Dfa, FiniteAutomaton, FormLangError, GenerationConfig, Grammar, GrammarBuilder, GrammarType,
    Limits, Linearity, Nfa, Production, automaton_to_grammar, determinize, determinize_with,
    grammar_to_nfa, minimize,
};
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::io::Write;

fn word(text: &str) -> Vec<String> {
    text.chars().map(String::from).collect()
}

/// Every word over `symbols` of length at most `max_len`.
fn all_words(symbols: &[&str], max_len: usize) -> Vec<Vec<String>> {
    let mut all = vec![Vec::new()];
    let mut frontier: Vec<Vec<String>> = vec![Vec::new()];
    for _ in 0..max_len {
        let mut next = Vec::new();
        for prefix in &frontier {
            for symbol in symbols {
                let mut longer = prefix.clone();
                longer.push(symbol.to_string());
                next.push(longer);
            }
        }
        all.extend(next.iter().cloned());
        frontier = next;
    }
    all
}

/// Words over {a, b} containing a `b`, reached through redundant epsilon branches
fn sample_nfa() -> Nfa {
    Nfa::builder()
        .state("s", false)
        .state("p", false)
        .state("q", false)
        .state("r", true)
        .state("t", false)
        .symbol("a")
        .symbol("b")
        .start("s")
        .transition("s", "a", "s")
        .transition("s", "b", "s")
        .epsilon("s", "p")
        .transition("p", "a", "q")
        .transition("q", "b", "r")
        .transition("r", "a", "r")
        .transition("r", "b", "r")
        .epsilon("s", "t")
        .transition("t", "b", "r")
        .build()
        .unwrap()
}

#[test]
fn test_classification_is_most_restrictive() {
    let regular = GrammarBuilder::new("S")
        .rule("S", &["a", "<S>"])
        .rule("S", &["b"])
        .build()
        .unwrap();
    let context_free = GrammarBuilder::new("S")
        .rule("S", &["a", "<S>", "b"])
        .rule("S", &["a", "b"])
        .build()
        .unwrap();
    let context_sensitive = GrammarBuilder::new("S")
        .rule("S", &["a", "<B>", "c"])
        .production(Production::parse(&["<B>", "c"], &["b", "c"]))
        .build()
        .unwrap();
    let unrestricted = GrammarBuilder::new("S")
        .rule("S", &["a", "<B>", "c"])
        .production(Production::parse(&["<B>", "c"], &["c"]))
        .build()
        .unwrap();

    assert_eq!(regular.classify(), GrammarType::Regular);
    assert_eq!(context_free.classify(), GrammarType::ContextFree);
    assert_eq!(context_sensitive.classify(), GrammarType::ContextSensitive);
    assert_eq!(unrestricted.classify(), GrammarType::Unrestricted);

    // Every class includes the ones below it
    for grammar in [&regular, &context_free, &context_sensitive, &unrestricted] {
        assert!(GrammarType::Unrestricted.includes(grammar.classify()));
    }
}

#[test]
fn test_grammar_to_nfa_matches_derivations() {
    // S -> a S | b A | ε, A -> a A | a  : a* or a* b a+
    let grammar = GrammarBuilder::new("S")
        .rule("S", &["a", "<S>"])
        .rule("S", &["b", "<A>"])
        .rule("S", &[])
        .rule("A", &["a", "<A>"])
        .rule("A", &["a"])
        .build()
        .unwrap();
    let nfa = grammar_to_nfa(&grammar).unwrap();

    let in_language = |w: &[String]| {
        let text: String = w.concat();
        match text.find('b') {
            None => true,
            Some(at) => {
                let rest = &text[at + 1..];
                !rest.is_empty() && rest.chars().all(|c| c == 'a')
            }
        }
    };

    for w in all_words(&["a", "b"], 6) {
        assert_eq!(nfa.accepts(&w), in_language(&w), "word {:?}", w);
    }

    // Randomly generated words are always accepted
    let mut rng = StdRng::seed_from_u64(42);
    let config = GenerationConfig { max_steps: 500 };
    for _ in 0..25 {
        let w = grammar.generate_word(&mut rng, &config).unwrap();
        assert!(nfa.accepts(&w), "generated word {:?}", w);
    }
}

#[test]
fn test_left_linear_grammar_to_nfa_matches_derivations() {
    // S -> S a | B b | a, B -> B b | ε  : non-empty words of b* a*
    let grammar = GrammarBuilder::new("S")
        .rule("S", &["<S>", "a"])
        .rule("S", &["<B>", "b"])
        .rule("S", &["a"])
        .rule("B", &["<B>", "b"])
        .rule("B", &[])
        .build()
        .unwrap();
    assert_eq!(grammar.linearity(), Some(Linearity::Left));
    let nfa = grammar_to_nfa(&grammar).unwrap();

    let in_language = |w: &[String]| {
        let text: String = w.concat();
        !text.is_empty() && text.trim_start_matches('b').chars().all(|c| c == 'a')
    };

    for w in all_words(&["a", "b"], 6) {
        assert_eq!(nfa.accepts(&w), in_language(&w), "word {:?}", w);
    }

    let mut rng = StdRng::seed_from_u64(11);
    let config = GenerationConfig { max_steps: 500 };
    for _ in 0..25 {
        let w = grammar.generate_word(&mut rng, &config).unwrap();
        assert!(in_language(&w), "generated word {:?}", w);
        assert!(nfa.accepts(&w), "generated word {:?}", w);
    }
}

#[test]
fn test_determinization_equivalence() {
    let nfa = sample_nfa();
    let dfa = determinize(&nfa);

    assert!(Nfa::from(&dfa).is_deterministic());
    for w in all_words(&["a", "b"], 7) {
        assert_eq!(nfa.accepts(&w), dfa.accepts(&w), "word {:?}", w);
    }
}

#[test]
fn test_minimization_equivalence_and_idempotence() {
    let dfa = determinize(&sample_nfa());
    let minimal = minimize(&dfa);

    assert!(minimal.num_states() <= dfa.num_states());
    for w in all_words(&["a", "b"], 7) {
        assert_eq!(dfa.accepts(&w), minimal.accepts(&w), "word {:?}", w);
    }

    let again = minimize(&minimal);
    assert_eq!(again.num_states(), minimal.num_states());
    assert_eq!(again, minimal);
}

#[test]
fn test_automaton_grammar_round_trip() {
    let nfa = sample_nfa();
    let grammar = automaton_to_grammar(&nfa);
    assert_eq!(grammar.classify(), GrammarType::Regular);

    let back = grammar_to_nfa(&grammar).unwrap();
    for w in all_words(&["a", "b"], 6) {
        assert_eq!(nfa.accepts(&w), back.accepts(&w), "word {:?}", w);
    }

    let dfa = minimize(&determinize(&nfa));
    let from_dfa = grammar_to_nfa(&automaton_to_grammar(&dfa)).unwrap();
    for w in all_words(&["a", "b"], 6) {
        assert_eq!(dfa.accepts(&w), from_dfa.accepts(&w), "word {:?}", w);
    }
}

#[test]
fn test_subset_construction_scenario() {
    let nfa = Nfa::builder()
        .state("0", false)
        .state("1", false)
        .state("2", true)
        .symbol("a")
        .symbol("b")
        .start("0")
        .transition("0", "a", "0")
        .transition("0", "a", "1")
        .transition("1", "b", "2")
        .build()
        .unwrap();
    let dfa = determinize(&nfa);

    let start = dfa.start();
    assert_eq!(dfa.states()[start].label(), "{0}");
    let pair = dfa.next(start, "a").unwrap();
    assert_eq!(dfa.states()[pair].label(), "{0, 1}");
    assert_eq!(dfa.next(pair, "a"), Some(pair));
    let last = dfa.next(pair, "b").unwrap();
    assert_eq!(dfa.states()[last].label(), "{2}");
    assert!(dfa.is_accepting(last));
    assert_eq!(dfa.next(last, "a"), None);
    assert_eq!(dfa.next(last, "b"), None);

    assert!(dfa.accepts(&word("ab")));
    assert!(dfa.accepts(&word("aab")));
    assert!(!dfa.accepts(&word("a")));
    assert!(!dfa.accepts(&word("ba")));
}

#[test]
fn test_even_length_minimization_scenario() {
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
        .build()
        .unwrap();

    let minimal = minimize(&dfa);
    assert_eq!(minimal.num_states(), 2);
    assert!(minimal.accepts(&word("aaaa")));
    assert!(!minimal.accepts(&word("aaa")));
}

#[test]
fn test_errors_surface_to_caller() {
    let context_free = GrammarBuilder::new("S")
        .rule("S", &["<S>", "<S>"])
        .rule("S", &["a"])
        .build()
        .unwrap();
    assert!(matches!(
        grammar_to_nfa(&context_free),
        Err(FormLangError::UnsupportedGrammarType { .. })
    ));

    let explosion = determinize_with(&sample_nfa(), &Limits::max_dfa_states(1));
    assert_eq!(
        explosion.unwrap_err(),
        FormLangError::StateExplosion { limit: 1 }
    );

    let malformed = Dfa::builder()
        .state("q0", true)
        .symbol("a")
        .start("q0")
        .transition("q0", "b", "q0")
        .build();
    assert!(matches!(
        malformed,
        Err(FormLangError::MalformedAutomaton(_))
    ));
}

#[test]
fn test_empty_language_edge_cases() {
    // A grammar without productions generates nothing
    let grammar = GrammarBuilder::new("S").terminal("a").build().unwrap();
    assert_eq!(grammar.classify(), GrammarType::Regular);
    let nfa = grammar_to_nfa(&grammar).unwrap();
    assert!(nfa.is_empty_language());

    // An automaton without accepting states accepts nothing, before and after conversions
    let dfa = minimize(&determinize(&nfa));
    assert_eq!(dfa.num_states(), 1);
    assert!(dfa.is_empty_language());
    for w in all_words(&["a"], 4) {
        assert!(!dfa.accepts(&w));
    }

    let grammar = automaton_to_grammar(&dfa);
    assert_eq!(grammar.productions().count(), 0);
}

#[test]
fn test_load_from_file() {
    let grammar_content = r#"{
        "start": "S",
        "productions": [
            { "lhs": ["<S>"], "rhs": ["a", "<S>"] },
            { "lhs": ["<S>"], "rhs": ["b"] }
        ]
    }"#;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(grammar_content.as_bytes()).unwrap();

    let text = fs::read_to_string(file.path()).unwrap();
    let grammar: Grammar = serde_json::from_str(&text).unwrap();
    assert_eq!(grammar.classify(), GrammarType::Regular);

    let dfa = minimize(&determinize(&grammar_to_nfa(&grammar).unwrap()));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dfa.json");
    fs::write(&path, serde_json::to_string_pretty(&dfa).unwrap()).unwrap();

    let loaded: Dfa = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded, dfa);
    assert!(loaded.accepts(&word("aab")));
    assert!(!loaded.accepts(&word("aba")));
}
