//! Build warnings.
//!
//! Every recoverable condition in the pipeline (duplicate labels, undefined
//! reference targets, ordering-style violations) surfaces as a [`Warning`]
//! collected in a [`Warnings`] sink. Warnings never abort the build; the
//! only fatal condition is a malformed gated marker sequence, which is an
//! error, not a warning (see [`crate::gated::GatedError`]).

use std::fmt;

use serde::Serialize;

/// A single located build warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// Document the warning points at (relative path without extension).
    pub docname: String,
    /// 1-based source line, when one is available.
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.docname, line, self.message),
            None => write!(f, "{}: {}", self.docname, self.message),
        }
    }
}

/// Ordered collection of build warnings.
///
/// Order is deterministic: parse-phase warnings are folded in sorted
/// document order, and the resolution phases run single-threaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Warnings(Vec<Warning>);

impl Warnings {
    pub fn new() -> Warnings {
        Warnings::default()
    }

    pub fn push(
        &mut self,
        docname: impl Into<String>,
        line: Option<usize>,
        message: impl Into<String>,
    ) {
        self.0.push(Warning {
            docname: docname.into(),
            line,
            message: message.into(),
        });
    }

    pub fn extend(&mut self, other: Warnings) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The whole sink rendered as one string, one warning per line. This is
    /// what the CLI prints to stderr and what tests grep.
    pub fn as_text(&self) -> String {
        self.0
            .iter()
            .map(|warning| warning.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.0.iter().any(|warning| warning.message.contains(needle))
    }
}

impl fmt::Display for Warnings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display_with_line() {
        let mut warnings = Warnings::new();
        warnings.push("guide/intro", Some(12), "undefined label: foo");

        assert_eq!(warnings.as_text(), "guide/intro:12: undefined label: foo");
    }

    #[test]
    fn test_warning_display_without_line() {
        let mut warnings = Warnings::new();
        warnings.push("index", None, "duplicate label: ex-1; other instance in index");

        assert_eq!(
            warnings.as_text(),
            "index: duplicate label: ex-1; other instance in index"
        );
    }

    #[test]
    fn test_contains_matches_message_substring() {
        let mut warnings = Warnings::new();
        warnings.push("a", Some(1), "undefined label: foo");

        assert!(warnings.contains("undefined label: foo"));
        assert!(!warnings.contains("undefined label: bar"));
    }

    #[test]
    fn test_extend_preserves_order() {
        let mut first = Warnings::new();
        first.push("a", None, "one");
        let mut second = Warnings::new();
        second.push("b", None, "two");

        first.extend(second);

        let messages: Vec<&str> = first.iter().map(|w| w.message.as_str()).collect();
        assert_eq!(messages, vec!["one", "two"]);
    }
}
