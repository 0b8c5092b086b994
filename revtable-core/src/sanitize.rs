//! Input sanitization for search terms and predicate building.
//!
//! User-supplied free text is embedded into query predicate strings by some
//! store backends, so every term passes through [`sanitize_search_term`]
//! before it reaches a predicate. Field names are validated rather than
//! sanitized: a name that fails the identifier pattern is excluded from the
//! searchable/selectable field set entirely (silently, not fatally).

/// Maximum length of a sanitized search term.
pub const MAX_SEARCH_TERM_LEN: usize = 100;

/// Maximum length of a valid document type name.
pub const MAX_TYPE_NAME_LEN: usize = 50;

/// Characters stripped from search terms before predicate embedding.
const STRIPPED: &[char] = &['\'', '"', '\\', '`', ';', '{', '}', '[', ']', '|', '$'];

/// Sanitize a user-supplied search term for safe embedding in a query
/// predicate string.
///
/// Strips quotes, backslashes, backticks, semicolons, braces, brackets,
/// pipes, and dollar signs, trims surrounding whitespace, and caps the
/// result at [`MAX_SEARCH_TERM_LEN`] characters. Idempotent:
/// `sanitize_search_term(sanitize_search_term(x)) == sanitize_search_term(x)`.
pub fn sanitize_search_term(input: &str) -> String {
    let stripped: String = input.chars().filter(|c| !STRIPPED.contains(c)).collect();
    stripped.trim().chars().take(MAX_SEARCH_TERM_LEN).collect()
}

/// Validate that a search term is already safe without sanitization.
///
/// Stricter than [`sanitize_search_term`]: also rejects `@`, `->`, and `..`,
/// which are meaningful to some query languages even when quoted.
pub fn is_valid_search_term(term: &str) -> bool {
    if term.is_empty() || term.chars().count() > MAX_SEARCH_TERM_LEN {
        return false;
    }
    if term.chars().any(|c| STRIPPED.contains(&c) || c == '@') {
        return false;
    }
    !term.contains("->") && !term.contains("..")
}

/// Validate a field name for use in predicates and selections.
///
/// Accepts `^[A-Za-z_][A-Za-z0-9_]*$`. Names failing this check must be
/// dropped from the searchable field set by callers.
pub fn is_valid_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate a dotted field path: every `.`-separated segment must be a valid
/// field name.
pub fn is_valid_field_path(path: &str) -> bool {
    !path.is_empty() && path.split('.').all(is_valid_field_name)
}

/// Validate a document type name.
///
/// Accepts `^[A-Za-z][A-Za-z0-9_-]*$` up to [`MAX_TYPE_NAME_LEN`] characters.
pub fn is_valid_type_name(type_name: &str) -> bool {
    if type_name.is_empty() || type_name.len() > MAX_TYPE_NAME_LEN {
        return false;
    }
    let mut chars = type_name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Build a safe `field match term` clause for one searchable field.
///
/// Returns `None` when the field path fails validation. An all-stripped
/// (empty) sanitized term degrades to the neutral `true` clause so the
/// surrounding predicate stays well-formed.
pub fn match_clause(field_path: &str, term: &str) -> Option<String> {
    if !is_valid_field_path(field_path) {
        return None;
    }
    let sanitized = sanitize_search_term(term);
    if sanitized.is_empty() {
        return Some("true".to_string());
    }
    Some(format!("{} match \"{}\"", field_path, sanitized))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_dangerous_characters() {
        let out = sanitize_search_term("o'Brien\"; DROP");
        assert_eq!(out, "oBrien DROP");
    }

    #[test]
    fn strips_every_listed_character() {
        let out = sanitize_search_term("a'b\"c\\d`e;f{g}h[i]j|k$l");
        assert_eq!(out, "abcdefghijkl");
        for c in STRIPPED {
            assert!(!out.contains(*c));
        }
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in ["o'Brien\"; DROP", "  plain  ", "{}[]|$", "", "héllo wörld"] {
            let once = sanitize_search_term(input);
            assert_eq!(sanitize_search_term(&once), once);
        }
    }

    #[test]
    fn sanitize_trims_and_caps() {
        assert_eq!(sanitize_search_term("  hi  "), "hi");
        let long = "x".repeat(300);
        assert_eq!(sanitize_search_term(&long).len(), MAX_SEARCH_TERM_LEN);
    }

    #[test]
    fn all_stripped_term_becomes_empty() {
        assert_eq!(sanitize_search_term("';`{}|$"), "");
    }

    #[test]
    fn field_name_validation() {
        assert!(is_valid_field_name("title"));
        assert!(is_valid_field_name("_updatedAt"));
        assert!(is_valid_field_name("field_2"));
        assert!(!is_valid_field_name("2field"));
        assert!(!is_valid_field_name("a-b"));
        assert!(!is_valid_field_name("a.b"));
        assert!(!is_valid_field_name(""));
    }

    #[test]
    fn field_path_validation() {
        assert!(is_valid_field_path("seo.title"));
        assert!(!is_valid_field_path("seo..title"));
        assert!(!is_valid_field_path(".title"));
    }

    #[test]
    fn type_name_validation() {
        assert!(is_valid_type_name("blog-post"));
        assert!(is_valid_type_name("post_v2"));
        assert!(!is_valid_type_name("_post"));
        assert!(!is_valid_type_name(""));
        assert!(!is_valid_type_name(&"t".repeat(51)));
    }

    #[test]
    fn search_term_validation_rejects_operators() {
        assert!(is_valid_search_term("hello world"));
        assert!(!is_valid_search_term("a@b"));
        assert!(!is_valid_search_term("a->b"));
        assert!(!is_valid_search_term("a..b"));
        assert!(!is_valid_search_term(""));
    }

    #[test]
    fn match_clause_embeds_sanitized_term() {
        assert_eq!(
            match_clause("title", "o'Brien\"; DROP").as_deref(),
            Some("title match \"oBrien DROP\"")
        );
    }

    #[test]
    fn match_clause_degrades_to_neutral() {
        assert_eq!(match_clause("title", "';`").as_deref(), Some("true"));
    }

    #[test]
    fn match_clause_rejects_bad_field() {
        assert_eq!(match_clause("title; DROP", "x"), None);
        assert_eq!(match_clause("", "x"), None);
    }
}
