//! Search filters: sanitized free text over a set of searchable fields.

use crate::sanitize::{is_valid_field_path, sanitize_search_term};
use serde::{Deserialize, Serialize};

/// A sanitized search filter.
///
/// Construction is the sanitization boundary: the term is stripped and
/// capped, and field paths failing validation are excluded. An empty term
/// or an empty field set yields a filter that matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    term: String,
    fields: Vec<String>,
}

impl SearchFilter {
    /// Build a filter from raw user text and the searchable field paths.
    pub fn new<I, P>(raw_term: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(Into::into)
            .filter(|f| is_valid_field_path(f))
            .collect();
        Self {
            term: sanitize_search_term(raw_term),
            fields,
        }
    }

    /// A filter that matches every document.
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Whether this filter constrains anything.
    pub fn is_match_all(&self) -> bool {
        self.term.is_empty() || self.fields.is_empty()
    }

    /// The sanitized search term.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// The validated searchable field paths.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Render the predicate fragment for string-embedding store backends:
    /// a disjunction of `field match "term"` clauses, or `None` when the
    /// filter matches everything.
    pub fn predicate(&self) -> Option<String> {
        if self.is_match_all() {
            return None;
        }
        let clauses: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("{} match \"{}\"", f, self.term))
            .collect();
        Some(format!("({})", clauses.join(" || ")))
    }
}
