use thiserror::Error;

use crate::grammar::GrammarType;

/// Errors produced while building or converting grammars and automata
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormLangError {
    #[error("Malformed grammar: {0}")]
    MalformedGrammar(String),

    #[error("Unsupported grammar type: expected a {expected} grammar, found {found}")]
    UnsupportedGrammarType {
        expected: GrammarType,
        found: GrammarType,
    },

    #[error("State explosion: determinization exceeded the limit of {limit} states")]
    StateExplosion { limit: usize },

    #[error("Malformed automaton: {0}")]
    MalformedAutomaton(String),

    #[error("Word generation failed: {0}")]
    Generation(String),
}

/// Result type for grammar and automaton operations
pub type Result<T> = std::result::Result<T, FormLangError>;

/// Trait extension for Option<T> to convert to FormLangError
pub(crate) trait OptionExt<T> {
    fn ok_or_malformed_automaton<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_malformed_automaton<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.ok_or_else(|| FormLangError::MalformedAutomaton(f()))
    }
}

/// Append primes to `base` until `taken` no longer claims the name.
pub(crate) fn fresh_name<F>(base: &str, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    let mut name = base.to_string();
    while taken(&name) {
        name.push('\'');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = FormLangError::UnsupportedGrammarType {
            expected: GrammarType::Regular,
            found: GrammarType::ContextFree,
        };
        assert_eq!(
            err.to_string(),
            "Unsupported grammar type: expected a regular grammar, found context-free"
        );

        let err = FormLangError::StateExplosion { limit: 8 };
        assert!(err.to_string().contains("limit of 8 states"));
    }

    #[test]
    fn test_option_ext() {
        let missing: Option<usize> = None;
        let err = missing
            .ok_or_malformed_automaton(|| "unknown state 'q9'".to_string())
            .unwrap_err();
        assert_eq!(
            err,
            FormLangError::MalformedAutomaton("unknown state 'q9'".to_string())
        );
        assert_eq!(Some(3).ok_or_malformed_automaton(String::new).unwrap(), 3);
    }

    #[test]
    fn test_fresh_name() {
        assert_eq!(fresh_name("q", |name| name == "q" || name == "q'"), "q''");
        assert_eq!(fresh_name("q", |_| false), "q");
    }
}
