//! Identifier extraction for rule indexing.
//!
//! Both sides are reduced to word tokens (`\w+` runs). A pattern's words,
//! minus its metavariables, appear verbatim in any text the pattern matches,
//! so a unit lacking one of them can be skipped without running the matcher.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::rule::RewriteRule;

static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\$*)(\w+)").unwrap_or_else(|err| panic!("invalid WORD regex: {err}"))
});

/// All word tokens of a source unit.
#[must_use]
pub fn source_identifiers(text: &str) -> BTreeSet<String> {
    WORD.captures_iter(text)
        .filter_map(|caps| caps.get(2))
        .fold(BTreeSet::new(), |mut ids, word| {
            ids.insert(word.as_str().to_string());
            ids
        })
}

/// Word tokens a pattern requires from any text it matches.
///
/// Tokens glued to a `$` are metavariables (`$A`, `$$$ARGS`, `$_`) and are
/// left out.
#[must_use]
pub fn pattern_identifiers(pattern: &str) -> BTreeSet<String> {
    WORD.captures_iter(pattern)
        .filter(|caps| caps.get(1).is_none_or(|dollars| dollars.is_empty()))
        .filter_map(|caps| caps.get(2))
        .map(|word| word.as_str().to_string())
        .collect()
}

/// One identifier-set alternative per pattern of the rule.
#[must_use]
pub fn rule_alternatives(rule: &RewriteRule) -> Vec<BTreeSet<String>> {
    rule.pattern_sources().map(pattern_identifiers).collect()
}
