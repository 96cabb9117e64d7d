use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static NON_TERMINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<([^<>]+)>$").expect("valid non-terminal pattern"));

/// A set of terminal names. Ordered so that conversions produce reproducible output.
pub type Alphabet = BTreeSet<String>;

/// Represents a symbol of a grammar, either a terminal or a non-terminal
///
/// Symbols serialize to their written form: a terminal is its bare name, a
/// non-terminal is its name wrapped in angle brackets (`<A>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Symbol {
    /// A terminal symbol (a letter of the alphabet)
    Terminal(String),
    /// A non-terminal symbol (a variable of the grammar)
    NonTerminal(String),
}

impl Symbol {
    pub fn terminal<S: Into<String>>(name: S) -> Self {
        Symbol::Terminal(name.into())
    }

    pub fn non_terminal<S: Into<String>>(name: S) -> Self {
        Symbol::NonTerminal(name.into())
    }

    /// Parse the written form of a symbol: `<Name>` is a non-terminal, anything else a terminal.
    pub fn parse(text: &str) -> Self {
        match NON_TERMINAL.captures(text) {
            Some(captures) => Symbol::NonTerminal(captures[1].to_string()),
            None => Symbol::Terminal(text.to_string()),
        }
    }

    /// The bare name of the symbol, without angle brackets.
    pub fn name(&self) -> &str {
        match self {
            Symbol::Terminal(name) | Symbol::NonTerminal(name) => name,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn is_non_terminal(&self) -> bool {
        matches!(self, Symbol::NonTerminal(_))
    }

    /// Whether the written form parses back to this same symbol.
    ///
    /// A terminal must not look like `<Name>`, and a non-terminal name must not contain
    /// angle brackets.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Symbol::Terminal(name) => !NON_TERMINAL.is_match(name),
            Symbol::NonTerminal(name) => !name.contains(['<', '>']),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Terminal(name) => write!(f, "{}", name),
            Symbol::NonTerminal(name) => write!(f, "<{}>", name),
        }
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.to_string()
    }
}

impl From<String> for Symbol {
    fn from(text: String) -> Self {
        Symbol::parse(&text)
    }
}

impl From<&str> for Symbol {
    fn from(text: &str) -> Self {
        Symbol::parse(text)
    }
}

/// Format a sequence of symbols the way productions are written, `ε` for the empty sequence.
pub fn format_sequence(symbols: &[Symbol]) -> String {
    if symbols.is_empty() {
        return "ε".to_string();
    }
    symbols
        .iter()
        .map(Symbol::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbol() {
        assert_eq!(Symbol::parse("<expr>"), Symbol::non_terminal("expr"));
        assert_eq!(Symbol::parse("a"), Symbol::terminal("a"));
        assert_eq!(Symbol::parse("<>"), Symbol::terminal("<>"));
        assert_eq!(Symbol::parse("<a"), Symbol::terminal("<a"));
    }

    #[test]
    fn test_display_and_name() {
        let nt = Symbol::non_terminal("B");
        assert_eq!(nt.to_string(), "<B>");
        assert_eq!(nt.name(), "B");
        assert!(nt.is_non_terminal());

        let t = Symbol::terminal("b");
        assert_eq!(t.to_string(), "b");
        assert!(t.is_terminal());
    }

    #[test]
    fn test_serde_written_form() {
        let symbols = vec![Symbol::terminal("a"), Symbol::non_terminal("A")];
        let json = serde_json::to_string(&symbols).unwrap();
        assert_eq!(json, r#"["a","<A>"]"#);

        let parsed: Vec<Symbol> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, symbols);
    }

    #[test]
    fn test_well_formed_symbols() {
        for symbol in [
            Symbol::terminal("a"),
            Symbol::terminal("<"),
            Symbol::terminal("<>"),
            Symbol::non_terminal("{0, 1}"),
        ] {
            assert!(symbol.is_well_formed(), "{:?}", symbol);
            assert_eq!(Symbol::parse(&symbol.to_string()), symbol);
        }

        assert!(!Symbol::terminal("<x>").is_well_formed());
        assert!(!Symbol::non_terminal("q<1>").is_well_formed());
        assert!(!Symbol::non_terminal("a>").is_well_formed());
    }

    #[test]
    fn test_format_sequence() {
        assert_eq!(format_sequence(&[]), "ε");
        assert_eq!(
            format_sequence(&[Symbol::terminal("a"), Symbol::non_terminal("B")]),
            "a <B>"
        );
    }
}
