//! Language availability rules.

use signup_core::Scope;
use std::fmt;

/// How the preferred language was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageChoice {
    /// Picked in a native `<select>`
    Native(Scope),
    /// Picked in a custom dropdown widget
    Custom(Scope),
    /// Not offered anywhere; the page default stays in effect
    Unavailable,
}

impl fmt::Display for LanguageChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(scope) => write!(f, "native select in {scope}"),
            Self::Custom(scope) => write!(f, "custom dropdown in {scope}"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

fn same_label(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Whether every required group has at least one label among `offered`.
///
/// Labels compare trimmed and case-insensitively.
#[must_use]
pub fn covers_required(required: &[Vec<String>], offered: &[String]) -> bool {
    !offered.is_empty()
        && required.iter().all(|group| {
            group
                .iter()
                .any(|label| offered.iter().any(|text| same_label(label, text)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<Vec<String>> {
        vec![
            vec!["English".to_string()],
            vec!["Dutch".to_string(), "Nederlands".to_string()],
        ]
    }

    fn offered(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| (*t).to_string()).collect()
    }

    #[test]
    fn test_english_and_dutch() {
        assert!(covers_required(&groups(), &offered(&["English", "Dutch"])));
    }

    #[test]
    fn test_alternative_label_and_case() {
        assert!(covers_required(
            &groups(),
            &offered(&["Deutsch", " english ", "NEDERLANDS"])
        ));
    }

    #[test]
    fn test_missing_group() {
        assert!(!covers_required(&groups(), &offered(&["English", "French"])));
        assert!(!covers_required(&groups(), &[]));
    }

    #[test]
    fn test_partial_match_is_not_enough() {
        assert!(!covers_required(&groups(), &offered(&["English (UK)", "Dutch"])));
    }
}
