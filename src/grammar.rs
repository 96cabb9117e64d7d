use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::symbol::{Alphabet, Symbol, format_sequence};
use crate::utils::{FormLangError, Result};

/// Represents a production rule `lhs -> rhs` in the grammar
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Production {
    lhs: Vec<Symbol>,
    rhs: Vec<Symbol>,
}

impl Production {
    pub fn new(lhs: Vec<Symbol>, rhs: Vec<Symbol>) -> Self {
        Production { lhs, rhs }
    }

    /// Build a production from written symbols (`<A>` for non-terminals).
    pub fn parse(lhs: &[&str], rhs: &[&str]) -> Self {
        Production {
            lhs: lhs.iter().copied().map(Symbol::parse).collect(),
            rhs: rhs.iter().copied().map(Symbol::parse).collect(),
        }
    }

    pub fn lhs(&self) -> &[Symbol] {
        &self.lhs
    }

    pub fn rhs(&self) -> &[Symbol] {
        &self.rhs
    }

    /// The head of the production when it is a single non-terminal.
    pub fn head(&self) -> Option<&str> {
        match self.lhs.as_slice() {
            [Symbol::NonTerminal(name)] => Some(name),
            _ => None,
        }
    }

    fn shape(&self) -> Option<Shape> {
        self.head()?;
        match self.rhs.as_slice() {
            [] | [Symbol::Terminal(_)] => Some(Shape::Neutral),
            [Symbol::Terminal(_), Symbol::NonTerminal(_)] => Some(Shape::Right),
            [Symbol::NonTerminal(_), Symbol::Terminal(_)] => Some(Shape::Left),
            _ => None,
        }
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            format_sequence(&self.lhs),
            format_sequence(&self.rhs)
        )
    }
}

/// Shape of a single regular production.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// `A -> ε` or `A -> a`, valid in either direction
    Neutral,
    /// `A -> a B`
    Right,
    /// `A -> B a`
    Left,
}

/// Class of a grammar in the Chomsky hierarchy, ordered from most to least restrictive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrammarType {
    Regular,
    ContextFree,
    ContextSensitive,
    Unrestricted,
}

impl GrammarType {
    /// The Chomsky type number: 3 for regular down to 0 for unrestricted.
    pub fn chomsky_level(self) -> u8 {
        match self {
            GrammarType::Regular => 3,
            GrammarType::ContextFree => 2,
            GrammarType::ContextSensitive => 1,
            GrammarType::Unrestricted => 0,
        }
    }

    /// Whether every grammar of class `other` is also of class `self`.
    pub fn includes(self, other: GrammarType) -> bool {
        other <= self
    }
}

impl fmt::Display for GrammarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GrammarType::Regular => "regular",
            GrammarType::ContextFree => "context-free",
            GrammarType::ContextSensitive => "context-sensitive",
            GrammarType::Unrestricted => "unrestricted",
        };
        f.write_str(name)
    }
}

/// Direction of a regular grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linearity {
    /// Productions of the form `A -> a B`
    Right,
    /// Productions of the form `A -> B a`
    Left,
}

/// Configuration options for random word generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum number of productions applied before giving up
    pub max_steps: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig { max_steps: 100 }
    }
}

/// A formal grammar: start symbol, non-terminals, terminals and productions
///
/// A `Grammar` is immutable once built. Every constructor checks that the start
/// symbol is a declared non-terminal, that terminals and non-terminals are
/// disjoint, that no production has an empty left side, and that every symbol
/// used by a production is declared with the matching kind. Names must also
/// survive the `<Name>` written form, see [`Symbol::is_well_formed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "GrammarRepr", try_from = "GrammarRepr")]
pub struct Grammar {
    start: String,
    non_terminals: BTreeSet<String>,
    terminals: Alphabet,
    productions: BTreeSet<Production>,
}

impl Grammar {
    /// Create a grammar from fully declared parts.
    pub fn new<S, P>(
        start: S,
        non_terminals: BTreeSet<String>,
        terminals: Alphabet,
        productions: P,
    ) -> Result<Self>
    where
        S: Into<String>,
        P: IntoIterator<Item = Production>,
    {
        let grammar = Grammar {
            start: start.into(),
            non_terminals,
            terminals,
            productions: productions.into_iter().collect(),
        };
        grammar.validate()?;
        Ok(grammar)
    }

    /// Assemble a grammar whose invariants are guaranteed by the caller.
    pub(crate) fn from_trusted_parts(
        start: String,
        non_terminals: BTreeSet<String>,
        terminals: Alphabet,
        productions: BTreeSet<Production>,
    ) -> Self {
        debug_assert!(non_terminals.contains(&start));
        Grammar {
            start,
            non_terminals,
            terminals,
            productions,
        }
    }

    /// Create a builder for a grammar starting at the given non-terminal
    pub fn builder(start: &str) -> GrammarBuilder {
        GrammarBuilder::new(start)
    }

    fn validate(&self) -> Result<()> {
        let malformed = |msg: String| Err(FormLangError::MalformedGrammar(msg));

        if let Some(name) = self
            .non_terminals
            .iter()
            .chain(self.terminals.iter())
            .find(|name| name.is_empty())
        {
            return malformed(format!("symbol names must not be empty, got '{}'", name));
        }
        let symbols = self
            .non_terminals
            .iter()
            .map(Symbol::non_terminal)
            .chain(self.terminals.iter().map(Symbol::terminal));
        for symbol in symbols {
            if !symbol.is_well_formed() {
                let kind = if symbol.is_terminal() {
                    "terminal"
                } else {
                    "non-terminal"
                };
                return malformed(format!(
                    "{} '{}' cannot be written unambiguously",
                    kind,
                    symbol.name()
                ));
            }
        }
        if !self.non_terminals.contains(&self.start) {
            return malformed(format!(
                "start symbol '{}' is not a declared non-terminal",
                self.start
            ));
        }
        if let Some(name) = self.non_terminals.intersection(&self.terminals).next() {
            return malformed(format!(
                "'{}' is declared both as a terminal and a non-terminal",
                name
            ));
        }

        for production in &self.productions {
            if production.lhs.is_empty() {
                return malformed(format!(
                    "production '{}' has an empty left-hand side",
                    production
                ));
            }
            for symbol in production.lhs.iter().chain(production.rhs.iter()) {
                let declared = match symbol {
                    Symbol::Terminal(name) => self.terminals.contains(name),
                    Symbol::NonTerminal(name) => self.non_terminals.contains(name),
                };
                if !declared {
                    let kind = if symbol.is_terminal() {
                        "terminal"
                    } else {
                        "non-terminal"
                    };
                    return malformed(format!(
                        "{} '{}' in production '{}' is not declared",
                        kind,
                        symbol.name(),
                        production
                    ));
                }
            }
        }

        Ok(())
    }

    /// Get the start symbol
    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn non_terminals(&self) -> &BTreeSet<String> {
        &self.non_terminals
    }

    pub fn terminals(&self) -> &Alphabet {
        &self.terminals
    }

    pub fn productions(&self) -> impl Iterator<Item = &Production> + '_ {
        self.productions.iter()
    }

    /// Productions whose left side is exactly the given non-terminal.
    pub fn productions_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Production> {
        self.productions
            .iter()
            .filter(move |production| production.head() == Some(name))
    }

    /// Check if the grammar declares a specific non-terminal
    pub fn has_non_terminal(&self, name: &str) -> bool {
        self.non_terminals.contains(name)
    }

    /// Returns the most restrictive Chomsky class whose shape rules hold for every production.
    pub fn classify(&self) -> GrammarType {
        if self.linearity().is_some() {
            GrammarType::Regular
        } else if self.productions.iter().all(|p| p.head().is_some()) {
            GrammarType::ContextFree
        } else if self.is_non_contracting() {
            GrammarType::ContextSensitive
        } else {
            GrammarType::Unrestricted
        }
    }

    /// The direction of a regular grammar, `None` if the grammar is not regular.
    ///
    /// Grammars made only of `A -> a` and `A -> ε` productions are reported as right-linear.
    /// Mixing `A -> a B` with `A -> B a` makes a grammar non-regular.
    pub fn linearity(&self) -> Option<Linearity> {
        let mut direction = None;
        for production in &self.productions {
            let wanted = match production.shape()? {
                Shape::Neutral => continue,
                Shape::Right => Linearity::Right,
                Shape::Left => Linearity::Left,
            };
            match direction {
                Some(found) if found != wanted => return None,
                _ => direction = Some(wanted),
            }
        }
        Some(direction.unwrap_or(Linearity::Right))
    }

    fn is_non_contracting(&self) -> bool {
        let start = Symbol::NonTerminal(self.start.clone());
        let start_on_rhs = self.productions.iter().any(|p| p.rhs.contains(&start));

        self.productions.iter().all(|p| {
            p.rhs.len() >= p.lhs.len()
                || (p.rhs.is_empty() && p.head() == Some(self.start.as_str()) && !start_on_rhs)
        })
    }

    /// Generate a random word of the language of a regular grammar.
    ///
    /// Starting from the start symbol, a production of the current non-terminal is picked
    /// at random until a production without a non-terminal ends the derivation.
    pub fn generate_word<R>(&self, rng: &mut R, config: &GenerationConfig) -> Result<Vec<String>>
    where
        R: Rng + ?Sized,
    {
        let linearity = self
            .linearity()
            .ok_or_else(|| FormLangError::UnsupportedGrammarType {
                expected: GrammarType::Regular,
                found: self.classify(),
            })?;

        let mut bodies: BTreeMap<&str, Vec<&Production>> = BTreeMap::new();
        for production in &self.productions {
            if let Some(head) = production.head() {
                bodies.entry(head).or_default().push(production);
            }
        }

        let mut word = VecDeque::new();
        let mut current = self.start.as_str();

        for _ in 0..config.max_steps {
            let candidates = bodies.get(current).map(Vec::as_slice).unwrap_or_default();
            let production = candidates.choose(&mut *rng).ok_or_else(|| {
                FormLangError::Generation(format!("non-terminal '{}' has no productions", current))
            })?;

            let mut next = None;
            for symbol in production.rhs() {
                match symbol {
                    Symbol::Terminal(name) => match linearity {
                        Linearity::Right => word.push_back(name.clone()),
                        Linearity::Left => word.push_front(name.clone()),
                    },
                    Symbol::NonTerminal(name) => next = Some(name.as_str()),
                }
            }

            match next {
                Some(name) => current = name,
                None => return Ok(word.into()),
            }
        }

        Err(FormLangError::Generation(format!(
            "no word derived within {} steps",
            config.max_steps
        )))
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "start: <{}>", self.start)?;
        for production in &self.productions {
            writeln!(f, "{}", production)?;
        }
        Ok(())
    }
}

/// Classify a grammar, see [`Grammar::classify`].
pub fn classify(grammar: &Grammar) -> GrammarType {
    grammar.classify()
}

/// Builder for constructing Grammar instances
///
/// Symbols are written as in [`Symbol::parse`]: `<A>` is a non-terminal and every other
/// string is a terminal. Symbols used by rules are declared implicitly.
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    start: String,
    non_terminals: BTreeSet<String>,
    terminals: Alphabet,
    productions: Vec<Production>,
}

impl GrammarBuilder {
    /// Create a new grammar builder with the given start non-terminal
    pub fn new(start: &str) -> Self {
        GrammarBuilder {
            start: start.to_string(),
            non_terminals: BTreeSet::from([start.to_string()]),
            terminals: Alphabet::new(),
            productions: Vec::new(),
        }
    }

    /// Declare a non-terminal that may not appear in any rule
    pub fn non_terminal(mut self, name: &str) -> Self {
        self.non_terminals.insert(name.to_string());
        self
    }

    /// Declare a terminal that may not appear in any rule
    pub fn terminal(mut self, name: &str) -> Self {
        self.terminals.insert(name.to_string());
        self
    }

    /// Add a rule `<lhs> -> rhs`, an empty `rhs` being the empty word
    pub fn rule(self, lhs: &str, rhs: &[&str]) -> Self {
        let production = Production::new(
            vec![Symbol::non_terminal(lhs)],
            rhs.iter().copied().map(Symbol::parse).collect(),
        );
        self.production(production)
    }

    /// Add an arbitrary production
    pub fn production(mut self, production: Production) -> Self {
        for symbol in production.lhs().iter().chain(production.rhs()) {
            match symbol {
                Symbol::Terminal(name) => self.terminals.insert(name.clone()),
                Symbol::NonTerminal(name) => self.non_terminals.insert(name.clone()),
            };
        }
        self.productions.push(production);
        self
    }

    /// Build the grammar, checking every grammar invariant
    pub fn build(self) -> Result<Grammar> {
        Grammar::new(
            self.start,
            self.non_terminals,
            self.terminals,
            self.productions,
        )
    }
}

/// Serialized form of a grammar. Symbol sets may be omitted and are then
/// inferred from the productions.
#[derive(Debug, Serialize, Deserialize)]
struct GrammarRepr {
    start: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    non_terminals: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    terminals: Option<Alphabet>,
    #[serde(default)]
    productions: Vec<Production>,
}

impl From<Grammar> for GrammarRepr {
    fn from(grammar: Grammar) -> Self {
        GrammarRepr {
            start: grammar.start,
            non_terminals: Some(grammar.non_terminals),
            terminals: Some(grammar.terminals),
            productions: grammar.productions.into_iter().collect(),
        }
    }
}

impl TryFrom<GrammarRepr> for Grammar {
    type Error = FormLangError;

    fn try_from(repr: GrammarRepr) -> Result<Self> {
        match (repr.non_terminals, repr.terminals) {
            (Some(non_terminals), Some(terminals)) => {
                Grammar::new(repr.start, non_terminals, terminals, repr.productions)
            }
            (non_terminals, terminals) => {
                let mut builder = GrammarBuilder::new(&repr.start);
                for name in non_terminals.iter().flatten() {
                    builder = builder.non_terminal(name);
                }
                for name in terminals.iter().flatten() {
                    builder = builder.terminal(name);
                }
                repr.productions
                    .into_iter()
                    .fold(builder, GrammarBuilder::production)
                    .build()
            }
        }
    }
}
