use clap::{Parser, Subcommand};
use formlang::{
    Dfa, FiniteAutomaton, GenerationConfig, Grammar, Limits, Nfa, automaton_to_grammar,
    determinize_with, grammar_to_nfa, minimize,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Classify grammars and convert between regular grammars and finite automata.
/// Grammars and automata are read and written as JSON.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the Chomsky type of a grammar
    Classify {
        #[arg(help = "Path to the grammar file")]
        grammar: PathBuf,
    },
    /// Build an NFA from a regular grammar
    ToNfa {
        #[arg(help = "Path to the grammar file")]
        grammar: PathBuf,
        #[arg(short, long, help = "Write the result here instead of stdout")]
        output: Option<PathBuf>,
    },
    /// Determinize an NFA with the subset construction
    Determinize {
        #[arg(help = "Path to the NFA file")]
        nfa: PathBuf,
        #[arg(long, help = "Fail once the DFA would have more states than this")]
        max_states: Option<usize>,
        #[arg(short, long, help = "Write the result here instead of stdout")]
        output: Option<PathBuf>,
    },
    /// Minimize a DFA
    Minimize {
        #[arg(help = "Path to the DFA file")]
        dfa: PathBuf,
        #[arg(short, long, help = "Write the result here instead of stdout")]
        output: Option<PathBuf>,
    },
    /// Build a regular grammar from an automaton
    ToGrammar {
        #[arg(help = "Path to the automaton file")]
        automaton: PathBuf,
        #[arg(long, help = "Read the automaton as a DFA")]
        dfa: bool,
        #[arg(short, long, help = "Write the result here instead of stdout")]
        output: Option<PathBuf>,
    },
    /// Check whether an automaton accepts a word
    Accepts {
        #[arg(help = "Path to the automaton file")]
        automaton: PathBuf,
        #[arg(help = "Symbols of the word, nothing for the empty word")]
        symbols: Vec<String>,
        #[arg(long, help = "Read the automaton as a DFA")]
        dfa: bool,
    },
    /// Generate random words from a regular grammar
    Generate {
        #[arg(help = "Path to the grammar file")]
        grammar: PathBuf,
        #[arg(short, long, default_value_t = 1, help = "Number of words to generate")]
        count: usize,
        #[arg(long, help = "Seed for reproducible output")]
        seed: Option<u64>,
        #[arg(
            long,
            default_value_t = GenerationConfig::default().max_steps,
            help = "Give up on a word after this many productions"
        )]
        max_steps: usize,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { grammar } => {
            let grammar: Grammar = load(&grammar)?;
            println!("{}", grammar.classify());
        }
        Commands::ToNfa { grammar, output } => {
            let grammar: Grammar = load(&grammar)?;
            emit(&grammar_to_nfa(&grammar)?, output.as_deref())?;
        }
        Commands::Determinize {
            nfa,
            max_states,
            output,
        } => {
            let nfa: Nfa = load(&nfa)?;
            let limits = Limits {
                max_dfa_states: max_states,
            };
            let dfa = determinize_with(&nfa, &limits)?;
            eprintln!(
                "Determinized {} NFA states into {} DFA states.",
                nfa.num_states(),
                dfa.num_states()
            );
            emit(&dfa, output.as_deref())?;
        }
        Commands::Minimize { dfa, output } => {
            let dfa: Dfa = load(&dfa)?;
            let minimal = minimize(&dfa);
            eprintln!(
                "Minimized {} states into {}.",
                dfa.num_states(),
                minimal.num_states()
            );
            emit(&minimal, output.as_deref())?;
        }
        Commands::ToGrammar {
            automaton,
            dfa,
            output,
        } => {
            let grammar = if dfa {
                automaton_to_grammar(&load::<Dfa>(&automaton)?)
            } else {
                automaton_to_grammar(&load::<Nfa>(&automaton)?)
            };
            emit(&grammar, output.as_deref())?;
        }
        Commands::Accepts {
            automaton,
            symbols,
            dfa,
        } => {
            let accepted = if dfa {
                load::<Dfa>(&automaton)?.accepts(&symbols)
            } else {
                load::<Nfa>(&automaton)?.accepts(&symbols)
            };
            println!("{}", if accepted { "accepted" } else { "rejected" });
        }
        Commands::Generate {
            grammar,
            count,
            seed,
            max_steps,
        } => {
            let grammar: Grammar = load(&grammar)?;
            let config = GenerationConfig { max_steps };
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            for i in 0..count {
                let word = grammar.generate_word(&mut rng, &config)?;
                let text = if word.is_empty() {
                    "ε".to_string()
                } else {
                    word.join(" ")
                };
                println!("{}. {}", i + 1, text);
            }
        }
    }

    Ok(())
}

fn load<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("cannot read {}: {}", path.display(), err))?;
    Ok(serde_json::from_str(&text)?)
}

fn emit<T: Serialize>(value: &T, output: Option<&Path>) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, json + "\n")?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
