//! Name cleanup for technicians and clients

use once_cell::sync::Lazy;
use regex::Regex;

/// Administrative suffixes the legacy export appends to client names.
/// Each removes from its first match to the end of the string.
static CLIENT_SUFFIXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?is),\s*son\s+historique.*$",
        r"(?is),\s*historique.*$",
        r"(?is),\s*son\s+.*$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("client suffix pattern is valid"))
    .collect()
});

/// Technician token comparable with system usernames, which carry no hyphens
///
/// `None` for a missing or empty name.
pub fn normalize_technician_name(name: Option<&str>) -> Option<String> {
    match name {
        Some(name) if !name.is_empty() => Some(name.replace('-', "")),
        _ => None,
    }
}

/// Client display name without trailing export annotations
///
/// `"Client ABC, son historique"` becomes `"Client ABC"`. Trailing whitespace
/// is trimmed from the result. `None` for a missing or empty name.
pub fn clean_client_name(name: Option<&str>) -> Option<String> {
    let name = name.filter(|n| !n.is_empty())?;

    let cleaned = CLIENT_SUFFIXES
        .iter()
        .fold(name.to_string(), |acc, suffix| suffix.replace_all(&acc, "").into_owned());

    Some(cleaned.trim_end().to_string())
}
