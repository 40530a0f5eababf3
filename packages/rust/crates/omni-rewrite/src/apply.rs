//! Textual substitution of accepted replacements.

use omni_rules::Replacement;

use crate::error::{Result, RewriteError};

/// Apply non-overlapping replacements to `source` in one forward pass.
///
/// Replacements may come in any order. Insertions at the same offset keep
/// their relative input order, so passing them in priority order puts the
/// highest-priority text first.
///
/// An insertion strictly inside a replaced range has no anchor left once
/// that range is rewritten. It is moved to the start of the range and emitted
/// before the range's new text, after any insertions already there.
///
/// # Errors
///
/// Returns [`RewriteError::Replacement`] if a range lies outside `source`,
/// splits a UTF-8 character, or overlaps another non-empty replacement.
pub fn apply_replacements<'a, I>(source: &str, replacements: I) -> Result<String>
where
    I: IntoIterator<Item = &'a Replacement>,
{
    let replacements: Vec<&Replacement> = replacements.into_iter().collect();

    let mut replaced: Vec<(usize, usize)> = replacements
        .iter()
        .filter(|r| !r.is_insertion())
        .map(|r| (r.start(), r.end()))
        .collect();
    replaced.sort_unstable();

    let mut ordered: Vec<(usize, &Replacement)> = replacements
        .into_iter()
        .map(|r| {
            let at = if r.is_insertion() {
                anchor(&replaced, r.start())
            } else {
                r.start()
            };
            (at, r)
        })
        .collect();
    // Stable: equal positions keep input order, insertions before the range.
    ordered.sort_by_key(|(at, r)| (*at, *at + r.replaced_len()));

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;

    for (at, r) in ordered {
        if r.end() > source.len()
            || !source.is_char_boundary(r.start())
            || !source.is_char_boundary(r.end())
        {
            return Err(RewriteError::Replacement(format!(
                "range {}..{} is not valid in a source of {} bytes",
                r.start(),
                r.end(),
                source.len()
            )));
        }
        if at < cursor {
            return Err(RewriteError::Replacement(format!(
                "range {}..{} overlaps an earlier replacement ending at {cursor}",
                r.start(),
                r.end()
            )));
        }
        out.push_str(&source[cursor..at]);
        out.push_str(r.text());
        cursor = at + r.replaced_len();
    }

    out.push_str(&source[cursor..]);
    Ok(out)
}

/// Start of the replaced range strictly containing `at`, or `at` itself.
fn anchor(replaced: &[(usize, usize)], at: usize) -> usize {
    let idx = replaced.partition_point(|&(start, _)| start < at);
    match idx.checked_sub(1).map(|i| replaced[i]) {
        Some((start, end)) if end > at => start,
        _ => at,
    }
}
