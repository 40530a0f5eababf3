//! Diff generation utilities.
//!
//! Provides unified diff output for rewrites using the `similar` crate.

use similar::TextDiff;

/// Generate a unified diff between two versions of `path`.
///
/// Hunks carry three lines of context and `a/` / `b/` headers. Returns an
/// empty string when nothing changed.
#[must_use]
pub fn generate_unified_diff(original: &str, modified: &str, path: &str) -> String {
    if original == modified {
        return String::new();
    }

    TextDiff::from_lines(original, modified)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{path}"), &format!("b/{path}"))
        .to_string()
}
