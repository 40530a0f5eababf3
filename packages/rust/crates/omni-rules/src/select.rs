//! Candidate Selector - trie traversal against a source unit's identifiers.
//!
//! Selection is a sound filter: every rule whose registered alternative is a
//! subset of the source identifiers is returned, and nothing else. A selected
//! rule may still fail to match; callers run the real matcher on candidates.

use std::collections::BTreeSet;

use crate::index::{Node, RuleId, RuleIndex};

/// Anything that can narrow a rule collection down to candidate rules.
pub trait RuleSelector<T> {
    /// The rule handles, indexed by [`RuleId::index`].
    fn handles(&self) -> &[T];

    /// Ids of the candidate rules for `identifiers`.
    ///
    /// `identifiers` must be sorted ascending and free of duplicates.
    fn select_sorted(&self, identifiers: &[&str]) -> BTreeSet<RuleId>;
}

/// Deduplicated set of candidate rules, iterated in registration order.
#[derive(Debug)]
pub struct Candidates<'a, T> {
    rules: &'a [T],
    ids: BTreeSet<RuleId>,
}

impl<'a, T> Candidates<'a, T> {
    /// Number of candidate rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no rule survived selection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether the rule `id` was selected.
    #[must_use]
    pub fn contains(&self, id: RuleId) -> bool {
        self.ids.contains(&id)
    }

    /// Candidate ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.ids.iter().copied()
    }

    /// Candidate rules with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (RuleId, &'a T)> + '_ {
        let rules = self.rules;
        self.ids
            .iter()
            .filter_map(move |&id| rules.get(id.index()).map(|rule| (id, rule)))
    }

    /// Consume the set, keeping only the ids.
    #[must_use]
    pub fn into_ids(self) -> BTreeSet<RuleId> {
        self.ids
    }
}

/// Sort and deduplicate the unit's identifiers once, then ask `selector`.
fn select_from<'s, T, R, I, S>(selector: &'s R, identifiers: I) -> Candidates<'s, T>
where
    R: RuleSelector<T> + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut owned: Vec<S> = identifiers.into_iter().collect();
    owned.sort_unstable_by(|a, b| a.as_ref().cmp(b.as_ref()));
    owned.dedup_by(|a, b| a.as_ref() == b.as_ref());
    let sorted: Vec<&str> = owned.iter().map(AsRef::as_ref).collect();

    Candidates {
        rules: selector.handles(),
        ids: selector.select_sorted(&sorted),
    }
}

impl<T> RuleSelector<T> for RuleIndex<T> {
    fn handles(&self) -> &[T] {
        &self.rules
    }

    fn select_sorted(&self, identifiers: &[&str]) -> BTreeSet<RuleId> {
        let mut ids = BTreeSet::new();
        collect_candidates(&self.root, identifiers, &mut ids);
        ids
    }
}

impl<T> RuleIndex<T> {
    /// Rules that could match a unit with the given identifiers.
    pub fn select<I, S>(&self, identifiers: I) -> Candidates<'_, T>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        select_from(self, identifiers)
    }
}

/// Emit the rules held by `node`, then descend into every child whose label
/// is among `candidates`.
///
/// Iterates whichever side is smaller. When walking the candidates, a child
/// reached through candidate `i` only receives the candidates after `i`:
/// paths are sorted, so no deeper label can sort at or before it.
fn collect_candidates(node: &Node, candidates: &[&str], sink: &mut BTreeSet<RuleId>) {
    sink.extend(node.values().iter().copied());

    if candidates.is_empty() || node.is_leaf() {
        return;
    }

    if node.child_count() < candidates.len() {
        for (label, child) in node.children() {
            if candidates.binary_search(&label).is_ok() {
                collect_candidates(child, candidates, sink);
            }
        }
    } else {
        for (i, candidate) in candidates.iter().enumerate() {
            if let Some(child) = node.child(candidate) {
                collect_candidates(child, &candidates[i + 1..], sink);
            }
        }
    }
}

/// Linear-scan selector: a rule is a candidate if any of its alternatives is
/// a subset of the unit's identifiers.
///
/// Orders of magnitude slower than [`RuleIndex`] on large rule sets. Kept as
/// the reference behaviour and for debugging index issues.
#[derive(Debug)]
pub struct ExhaustiveSelector<T> {
    rules: Vec<T>,
    alternatives: Vec<Vec<Vec<String>>>,
}

impl<T> Default for ExhaustiveSelector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ExhaustiveSelector<T> {
    /// Create an empty selector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    /// Build a selector from `(rule, alternatives)` pairs.
    pub fn build<I, A, P, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = (T, A)>,
        A: IntoIterator<Item = P>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selector = Self::new();
        for (rule, alternatives) in rules {
            selector.add_rule(rule, alternatives);
        }
        selector
    }

    /// Register a rule with its alternatives.
    pub fn add_rule<A, P, S>(&mut self, rule: T, alternatives: A) -> RuleId
    where
        A: IntoIterator<Item = P>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = RuleId::from_index(self.rules.len());
        self.rules.push(rule);
        self.alternatives.push(
            alternatives
                .into_iter()
                .map(|alt| alt.into_iter().map(Into::into).collect())
                .collect(),
        );
        id
    }

    /// Rules that could match a unit with the given identifiers.
    pub fn select<I, S>(&self, identifiers: I) -> Candidates<'_, T>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        select_from(self, identifiers)
    }
}

impl<T> RuleSelector<T> for ExhaustiveSelector<T> {
    fn handles(&self) -> &[T] {
        &self.rules
    }

    fn select_sorted(&self, identifiers: &[&str]) -> BTreeSet<RuleId> {
        self.alternatives
            .iter()
            .enumerate()
            .filter(|(_, alternatives)| {
                alternatives.iter().any(|alt| {
                    alt.iter()
                        .all(|label| identifiers.binary_search(&label.as_str()).is_ok())
                })
            })
            .map(|(i, _)| RuleId::from_index(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names<'a>(candidates: &Candidates<'a, &'a str>) -> Vec<&'a str> {
        candidates.iter().map(|(_, rule)| *rule).collect()
    }

    #[test]
    fn test_select_superset_only() {
        let index = RuleIndex::build(vec![
            ("ab", vec![vec!["a", "b"]]),
            ("b", vec![vec!["b"]]),
            ("cd", vec![vec!["c", "d"]]),
        ]);

        assert_eq!(names(&index.select(["b", "a", "z"])), vec!["ab", "b"]);
        assert_eq!(names(&index.select(["c"])), Vec::<&str>::new());
        assert_eq!(names(&index.select(["d", "c"])), vec!["cd"]);
    }

    #[test]
    fn test_root_values_always_selected() {
        let index = RuleIndex::build(vec![("always", vec![Vec::<&str>::new()])]);

        assert_eq!(index.select(Vec::<String>::new()).len(), 1);
        assert_eq!(index.select(["anything"]).len(), 1);
    }

    #[test]
    fn test_any_alternative_suffices() {
        let index = RuleIndex::build(vec![("r", vec![vec!["x", "y"], vec!["q"]])]);

        assert_eq!(index.select(["q"]).len(), 1);
        assert_eq!(index.select(["x", "y"]).len(), 1);
        assert!(index.select(["x"]).is_empty());
    }

    #[test]
    fn test_duplicate_identifiers_are_ignored() {
        let index = RuleIndex::build(vec![("r", vec![vec!["a", "b"]])]);
        let candidates = index.select(["b", "a", "b", "a"]);

        assert_eq!(candidates.len(), 1);
        assert!(candidates.contains(RuleId::from_index(0)));
    }

    #[test]
    fn test_both_traversal_strategies_agree() {
        // Many children, few candidates: candidate-driven walk with pruning.
        let wide: Vec<(&str, Vec<Vec<String>>)> = (0..50)
            .map(|i| ("wide", vec![vec![format!("id{i:02}"), "zz".to_string()]]))
            .collect();
        let index = RuleIndex::build(wide);
        assert_eq!(index.select(["id07", "zz"]).len(), 1);
        assert_eq!(index.select(["id07", "id08", "zz"]).len(), 2);

        // Few children, many candidates: child-driven walk.
        let narrow = RuleIndex::build(vec![("n", vec![vec!["m", "n"]])]);
        let many: Vec<String> = (0..50).map(|i| format!("x{i}")).chain(["m".into(), "n".into()]).collect();
        assert_eq!(narrow.select(&many).len(), 1);
    }

    #[test]
    fn test_exhaustive_matches_index() {
        let rules = vec![
            ("a", vec![vec!["p", "q"], vec!["r"]]),
            ("b", vec![vec!["q"]]),
            ("c", vec![vec!["s", "t", "u"]]),
        ];
        let index = RuleIndex::build(rules.clone());
        let exhaustive = ExhaustiveSelector::build(rules);

        for query in [vec!["p", "q"], vec!["r"], vec!["q", "s", "t"], vec!["s", "t", "u"], vec![]] {
            assert_eq!(
                index.select(&query).into_ids(),
                exhaustive.select(&query).into_ids(),
                "query {query:?}"
            );
        }
    }
}
