//! Shared naming helpers.

/// Strip a conventional suffix from an entity name, e.g. `GradeLevelDescriptor` -> `GradeLevel`.
///
/// A name that is nothing but the suffix is returned unchanged.
#[inline]
pub fn strip_suffix<'a>(name: &'a str, suffix: &str) -> &'a str {
    match name.strip_suffix(suffix) {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => name,
    }
}

/// Database schema name for a namespace.
#[inline]
pub fn schema_name(namespace: &str) -> String {
    namespace.to_lowercase()
}

/// Case-insensitive starts_with check without allocating.
#[inline]
pub fn starts_with_ci(haystack: &str, needle: &str) -> bool {
    haystack.len() >= needle.len()
        && haystack.as_bytes()[..needle.len()].eq_ignore_ascii_case(needle.as_bytes())
}

/// Concatenate role name and name, collapsing when they are the same word.
pub fn full_property_name(role_name: &str, name: &str) -> String {
    if role_name.is_empty() || role_name == name {
        name.to_string()
    } else {
        format!("{}{}", role_name, name)
    }
}
