//! Collection name derivation.
//!
//! Entity type names are converted from camel case to snake case with the
//! same two-pass algorithm many ODMs use: first split a trailing capitalized
//! word off an acronym run (`HTTPServer` -> `HTTP_Server`), then split plain
//! lower-to-upper boundaries (`fooBar` -> `foo_Bar`), then lowercase.

use once_cell::sync::Lazy;
use regex::Regex;

static ACRONYM_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(.)([A-Z][a-z]+)").expect("acronym boundary regex is valid")
});
static CASE_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([a-z0-9])([A-Z])").expect("case boundary regex is valid")
});

/// Convert a camel-case type name to a snake-case collection name.
///
/// Idempotent on input that is already snake case.
pub fn camel_to_snake(name: &str) -> String {
    let split = ACRONYM_BOUNDARY.replace_all(name, "${1}_${2}");
    CASE_BOUNDARY
        .replace_all(&split, "${1}_${2}")
        .to_lowercase()
}

/// A type stored in its own collection.
///
/// The default `entity_name` is the unqualified compile-time type name, so
/// plain structs need only `impl Entity for UserProfile {}` to be stored in
/// `user_profile`. Override `entity_name` to pin an explicit name (required
/// for generic types, whose compile-time names embed their parameters).
pub trait Entity {
    /// Unqualified type name the collection name is derived from.
    fn entity_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Snake-case collection name for this entity type.
    fn collection_name() -> String {
        camel_to_snake(Self::entity_name())
    }
}
