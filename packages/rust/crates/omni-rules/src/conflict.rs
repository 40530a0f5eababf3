//! Conflict Resolver - non-overlapping selection of matches.
//!
//! Matches are ranked by how much original code they replace (more first),
//! then by how much text they insert (less first). Walking that order, a match
//! is accepted only if none of its replacements overlaps a range claimed by an
//! earlier accepted match. Matches are all-or-nothing.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Range;

use serde::Serialize;

use crate::error::{Result, RulesError};

/// A half-open byte range of a source unit paired with its substitute text.
///
/// An empty range is a pure insertion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Replacement {
    start: usize,
    end: usize,
    text: String,
}

impl Replacement {
    /// Create a replacement of `range` by `text`.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::InvalidRange`] if `range.start > range.end`.
    pub fn new(range: Range<usize>, text: impl Into<String>) -> Result<Self> {
        if range.start > range.end {
            return Err(RulesError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        Ok(Self {
            start: range.start,
            end: range.end,
            text: text.into(),
        })
    }

    /// Create a pure insertion of `text` at `at`.
    #[must_use]
    pub fn insertion(at: usize, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            text: text.into(),
        }
    }

    /// Start offset (inclusive).
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// End offset (exclusive).
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// The replaced range.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Substitute text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Amount of original text covered.
    #[must_use]
    pub fn replaced_len(&self) -> usize {
        self.end - self.start
    }

    /// Whether this replacement removes nothing.
    #[must_use]
    pub fn is_insertion(&self) -> bool {
        self.start == self.end
    }

    /// Whether both ranges share at least one position.
    ///
    /// Empty ranges never overlap anything.
    #[must_use]
    pub fn overlaps(&self, other: &Replacement) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }
}

/// A proposed change made of replacements applied all-or-nothing.
pub trait Fix {
    /// Replacements of this fix, all over the same source unit.
    fn replacements(&self) -> &[Replacement];

    /// Total length of original text covered by the replacements.
    fn replaced_size(&self) -> usize {
        self.replacements().iter().map(Replacement::replaced_len).sum()
    }

    /// Total length of the substitute texts.
    fn inserted_size(&self) -> usize {
        self.replacements().iter().map(|r| r.text.len()).sum()
    }
}

/// A labelled bundle of replacements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    label: String,
    replacements: Vec<Replacement>,
}

impl Match {
    /// Create a match.
    pub fn new(label: impl Into<String>, replacements: Vec<Replacement>) -> Self {
        Self {
            label: label.into(),
            replacements,
        }
    }

    /// Label given at construction, e.g. the producing rule's name.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Take the replacements out of the match.
    #[must_use]
    pub fn into_replacements(self) -> Vec<Replacement> {
        self.replacements
    }
}

impl Fix for Match {
    fn replacements(&self) -> &[Replacement] {
        &self.replacements
    }
}

/// Set of half-open ranges, coalesced on insert.
///
/// Stored ranges are non-empty, disjoint and never touch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RangeSet {
    ranges: BTreeMap<usize, usize>,
}

impl RangeSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether some stored range shares a position with `range`.
    #[must_use]
    pub fn intersects(&self, range: &Range<usize>) -> bool {
        if range.start >= range.end {
            return false;
        }
        // The stored range starting last before `range.end` reaches furthest.
        self.ranges
            .range(..range.end)
            .next_back()
            .is_some_and(|(_, &end)| end > range.start)
    }

    /// Add `range`, merging it with every stored range it overlaps or touches.
    pub fn insert(&mut self, range: Range<usize>) {
        if range.start >= range.end {
            return;
        }
        let (mut start, mut end) = (range.start, range.end);

        if let Some((&s, &e)) = self.ranges.range(..=start).next_back()
            && e >= start
        {
            start = s;
            end = end.max(e);
        }

        let absorbed: Vec<usize> = self.ranges.range(start..=end).map(|(&s, _)| s).collect();
        for s in absorbed {
            if let Some(e) = self.ranges.remove(&s) {
                end = end.max(e);
            }
        }

        self.ranges.insert(start, end);
    }

    /// Stored ranges in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.ranges.iter().map(|(&s, &e)| s..e)
    }

    /// Number of stored (coalesced) ranges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether nothing was claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Select a maximal set of non-overlapping matches.
///
/// Returns the accepted matches in priority order. See
/// [`partition_conflicts`] to also get the rejected ones.
pub fn resolve_conflicts<M: Fix>(matches: Vec<M>) -> Vec<M> {
    partition_conflicts(matches).0
}

/// Split matches into `(accepted, rejected)`, both in priority order.
///
/// Priority: replaced size descending, then inserted size ascending, then the
/// replacements themselves (ranges, then texts), then input order.
pub fn partition_conflicts<M: Fix>(matches: Vec<M>) -> (Vec<M>, Vec<M>) {
    let mut ranked: Vec<(usize, usize, usize, M)> = matches
        .into_iter()
        .enumerate()
        .map(|(order, m)| (m.replaced_size(), m.inserted_size(), order, m))
        .collect();
    ranked.sort_by(|a, b| priority(a, b));

    let mut claimed = RangeSet::new();
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for (_, _, _, m) in ranked {
        let conflicts = m
            .replacements()
            .iter()
            .any(|r| claimed.intersects(&r.range()));
        if conflicts {
            rejected.push(m);
        } else {
            for r in m.replacements() {
                claimed.insert(r.range());
            }
            accepted.push(m);
        }
    }

    if log::log_enabled!(log::Level::Debug) && !rejected.is_empty() {
        log::debug!(
            "Resolved conflicts: {} accepted, {} rejected",
            accepted.len(),
            rejected.len()
        );
    }

    (accepted, rejected)
}

fn priority<M: Fix>(a: &(usize, usize, usize, M), b: &(usize, usize, usize, M)) -> Ordering {
    b.0.cmp(&a.0)
        .then_with(|| a.1.cmp(&b.1))
        .then_with(|| a.3.replacements().cmp(b.3.replacements()))
        .then_with(|| a.2.cmp(&b.2))
}
