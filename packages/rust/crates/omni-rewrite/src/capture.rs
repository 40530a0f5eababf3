//! Capture substitution for rewrite templates.
//!
//! Handles both single captures (`$NAME`) and multi captures (`$$$NAME`).

use std::sync::LazyLock;

use ast_grep_core::Doc;
use ast_grep_core::meta_var::MetaVarEnv;
use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\$\$([A-Z_][A-Z0-9_]*)|\$([A-Z_][A-Z0-9_]*)")
        .unwrap_or_else(|err| panic!("invalid PLACEHOLDER regex: {err}"))
});

/// Substitute captured variables into a rewrite template.
///
/// - `$NAME` becomes the text of the single node captured as `NAME`.
/// - `$$$NAME` becomes the source text spanning every node captured as
///   `NAME`, separators included. A capture with no nodes yields nothing.
///
/// `$NAME` without a capture, and the anonymous `$$$`, are kept as written.
///
/// # Arguments
/// * `template` - The rewrite template with `$VAR` placeholders
/// * `env` - The match environment holding the captures
/// * `source` - Full text of the unit the match was found in
pub fn substitute_captures<D: Doc>(template: &str, env: &MetaVarEnv<'_, D>, source: &str) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let captured = if let Some(name) = caps.get(1) {
                multi_capture_text(env, name.as_str(), source)
            } else if let Some(name) = caps.get(2) {
                env.get_match(name.as_str()).map(|node| node.text().to_string())
            } else {
                None
            };
            captured.unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Source text from the first to the last node of a multi capture.
fn multi_capture_text<D: Doc>(env: &MetaVarEnv<'_, D>, name: &str, source: &str) -> Option<String> {
    let nodes = env.get_multiple_matches(name);
    let (Some(first), Some(last)) = (nodes.first(), nodes.last()) else {
        // Bound but empty, e.g. `f($$$ARGS)` against `f()`.
        return Some(String::new());
    };
    source
        .get(first.range().start..last.range().end)
        .map(str::to_string)
}
