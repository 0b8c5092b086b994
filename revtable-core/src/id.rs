//! Revision identifier normalization.
//!
//! A logical document may exist under two raw identifiers at once: a bare
//! identifier for the published revision and a `drafts.`-prefixed identifier
//! for the draft revision. Centralizing prefix handling here keeps every
//! caller on consistent rules: two raw identifiers refer to the same logical
//! document iff their normalized forms are equal.

/// Prefix carried by draft revision identifiers.
pub const DRAFT_PREFIX: &str = "drafts.";

/// Check whether a raw identifier names a draft revision.
pub fn is_draft_id(id: &str) -> bool {
    id.starts_with(DRAFT_PREFIX)
}

/// Strip the draft prefix, yielding the normalized (logical) identifier.
///
/// Bare identifiers are returned unchanged.
pub fn normalize_id(id: &str) -> &str {
    id.strip_prefix(DRAFT_PREFIX).unwrap_or(id)
}

/// The draft-revision form of an identifier.
///
/// Idempotent: an identifier that already carries the prefix is returned
/// as-is.
pub fn draft_id(id: &str) -> String {
    if is_draft_id(id) {
        id.to_string()
    } else {
        format!("{}{}", DRAFT_PREFIX, id)
    }
}

/// Both raw forms (bare and draft-prefixed) of a normalized identifier.
pub fn raw_forms(normalized: &str) -> [String; 2] {
    [normalized.to_string(), draft_id(normalized)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_prefix() {
        assert_eq!(normalize_id("drafts.abc"), "abc");
        assert_eq!(normalize_id("abc"), "abc");
    }

    #[test]
    fn normalize_only_strips_leading_prefix() {
        assert_eq!(normalize_id("drafts.drafts.abc"), "drafts.abc");
        assert_eq!(normalize_id("abc.drafts.def"), "abc.drafts.def");
    }

    #[test]
    fn draft_id_is_idempotent() {
        assert_eq!(draft_id("abc"), "drafts.abc");
        assert_eq!(draft_id("drafts.abc"), "drafts.abc");
    }

    #[test]
    fn raw_forms_cover_both_revisions() {
        let [published, draft] = raw_forms("abc");
        assert_eq!(published, "abc");
        assert_eq!(draft, "drafts.abc");
    }
}
