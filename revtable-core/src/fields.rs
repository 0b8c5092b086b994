//! Output column selection.

use crate::sanitize::is_valid_field_path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Store-maintained update timestamp of a revision.
pub const FIELD_UPDATED_AT: &str = "_updatedAt";
/// Store-maintained creation timestamp of a revision.
pub const FIELD_CREATED_AT: &str = "_createdAt";
/// Computed column: update timestamp of the last published revision.
pub const FIELD_LAST_PUBLISHED_AT: &str = "_lastPublishedAt";

/// Ordered set of selected output field paths.
///
/// Paths failing validation (see [`is_valid_field_path`]) are dropped
/// silently on construction; a bad column name degrades the selection, it
/// never fails it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelection {
    paths: BTreeSet<String>,
}

impl FieldSelection {
    /// Build a selection from field paths, dropping invalid ones.
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let paths = paths
            .into_iter()
            .map(Into::into)
            .filter(|p| is_valid_field_path(p))
            .collect();
        Self { paths }
    }

    /// Add a path to the selection. Invalid paths are ignored.
    pub fn insert(&mut self, path: impl Into<String>) {
        let path = path.into();
        if is_valid_field_path(&path) {
            self.paths.insert(path);
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// The selection actually sent to the store.
    ///
    /// `_lastPublishedAt` is a computed column: displaying it requires the
    /// raw `_updatedAt` of the published revision, so that path is added
    /// whenever the computed column is selected.
    pub fn effective(&self) -> FieldSelection {
        let mut effective = self.clone();
        if effective.contains(FIELD_LAST_PUBLISHED_AT) && !effective.contains(FIELD_UPDATED_AT) {
            effective.insert(FIELD_UPDATED_AT);
        }
        effective
    }
}

impl FromIterator<String> for FieldSelection {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_paths_are_dropped_silently() {
        let sel = FieldSelection::new(["title", "seo.title", "bad name", "a;b", ""]);
        assert_eq!(sel.len(), 2);
        assert!(sel.contains("title"));
        assert!(sel.contains("seo.title"));
    }

    #[test]
    fn effective_adds_updated_at_for_last_published() {
        let sel = FieldSelection::new(["title", FIELD_LAST_PUBLISHED_AT]);
        let eff = sel.effective();
        assert!(eff.contains(FIELD_UPDATED_AT));
        // the original selection is untouched
        assert!(!sel.contains(FIELD_UPDATED_AT));
    }

    #[test]
    fn effective_is_stable_when_updated_at_present() {
        let sel = FieldSelection::new([FIELD_LAST_PUBLISHED_AT, FIELD_UPDATED_AT]);
        assert_eq!(sel.effective(), sel);
        let plain = FieldSelection::new(["title"]);
        assert_eq!(plain.effective(), plain);
    }
}
