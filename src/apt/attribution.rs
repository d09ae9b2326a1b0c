//! Catalogue attribution prefixes ("Workshop of Rembrandt", "After Titian").
//!
//! Museums record works by followers and workshops under the master's name
//! with one of these prefixes. Lookups use the bare name; scoring treats the
//! prefix itself as a signal.

/// Longest prefixes first so "Copy after" wins over "After".
pub const ATTRIBUTION_PREFIXES: &[&str] = &[
    "attributed to",
    "follower of",
    "workshop of",
    "imitator of",
    "copy after",
    "circle of",
    "school of",
    "studio of",
    "manner of",
    "style of",
    "after",
];

/// Returns the attribution prefix the name starts with, lowercased.
#[must_use]
pub fn attribution_prefix(name: &str) -> Option<&'static str> {
    let lower = name.trim_start().to_lowercase();
    ATTRIBUTION_PREFIXES.iter().copied().find(|prefix| {
        lower
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with(char::is_whitespace))
    })
}

/// Strips a leading attribution prefix, returning the actual artist name.
#[must_use]
pub fn strip_attribution(name: &str) -> &str {
    let trimmed = name.trim();
    match attribution_prefix(trimmed) {
        Some(prefix) => trimmed
            .get(prefix.len()..)
            .map_or(trimmed, str::trim_start),
        None => trimmed,
    }
}
