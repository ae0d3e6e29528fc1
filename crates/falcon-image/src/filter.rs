//! Query filter builder for the management API
//!
//! Clauses are rendered as `name:"value"` and joined with `+`. Values are not
//! escaped, so a value containing `"` yields a malformed filter.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    clauses: Vec<(String, String)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new filter with the clause appended
    #[must_use]
    pub fn add_clause(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut clauses = self.clauses.clone();
        clauses.push((name.into(), value.into()));
        Self { clauses }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn encode(&self) -> String {
        self.clauses
            .iter()
            .map(|(name, value)| format!("{}:\"{}\"", name, value))
            .collect::<Vec<_>>()
            .join("+")
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
