//! Rule Index - identifier trie construction.
//!
//! Every rule is registered under one or more identifier-set alternatives.
//! Each alternative is sorted into a path from the root; the rule is stored at
//! the node where that path ends. A source unit can only match the rule if its
//! own identifier set contains every label on the path.
//!
//! Alternatives of one rule are registered shortest first. An alternative is
//! skipped when the rule already sits on a node along its path, since reaching
//! that node already makes the rule a candidate. Dominance is checked against
//! earlier paths only, so stored paths are not globally minimal.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::{Result, RulesError};

/// Handle of a registered rule.
///
/// Rules are identified by the slot they were registered in, never by value:
/// two rules with equal content are still two distinct entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RuleId(usize);

impl RuleId {
    /// Registration slot of this rule.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A trie node: children keyed by identifier, plus the rules completed here.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Node {
    children: HashMap<String, Node>,
    // Ascending by id, i.e. by registration order.
    values: Vec<RuleId>,
}

impl Node {
    /// Child reached over the edge labelled `label`.
    #[must_use]
    pub fn child(&self, label: &str) -> Option<&Node> {
        self.children.get(label)
    }

    /// All `(label, child)` edges, in no particular order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(label, node)| (label.as_str(), node))
    }

    /// Number of outgoing edges.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Rules whose registered path ends at this node.
    #[must_use]
    pub fn values(&self) -> &[RuleId] {
        &self.values
    }

    /// Whether this node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn holds(&self, id: RuleId) -> bool {
        // Fast path: a rule being registered is always the newest value.
        self.values.last() == Some(&id) || self.values.binary_search(&id).is_ok()
    }

    fn insert(&mut self, id: RuleId) {
        if let Err(pos) = self.values.binary_search(&id) {
            self.values.insert(pos, id);
        }
    }

    fn shrink(&mut self) {
        self.values.shrink_to_fit();
        self.children.shrink_to_fit();
        for child in self.children.values_mut() {
            child.shrink();
        }
    }

    fn measure(&self, depth: usize, stats: &mut IndexStats) {
        stats.nodes += 1;
        stats.stored_paths += self.values.len();
        stats.max_depth = stats.max_depth.max(depth);
        for child in self.children.values() {
            child.measure(depth + 1, stats);
        }
    }
}

/// Size summary of a built index.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Number of registered rules.
    pub rules: usize,
    /// Number of trie nodes, root included.
    pub nodes: usize,
    /// Number of (node, rule) entries stored across the trie.
    pub stored_paths: usize,
    /// Length of the longest root-to-node path.
    pub max_depth: usize,
}

/// Mutable builder for a [`RuleIndex`].
#[derive(Debug)]
pub struct RuleIndexBuilder<T> {
    root: Node,
    rules: Vec<T>,
}

impl<T> Default for RuleIndexBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RuleIndexBuilder<T> {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty builder with room for `capacity` rules.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            root: Node::default(),
            rules: Vec::with_capacity(capacity),
        }
    }

    /// Register a rule with all of its identifier-set alternatives.
    ///
    /// Alternatives are registered shortest first (ties broken
    /// lexicographically). A rule without any alternative is never selected;
    /// a rule with an empty alternative is always selected.
    pub fn add_rule<A, P, S>(&mut self, rule: T, alternatives: A) -> RuleId
    where
        A: IntoIterator<Item = P>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = RuleId(self.rules.len());
        self.rules.push(rule);

        let mut paths: Vec<Vec<String>> = alternatives.into_iter().map(to_path).collect();
        paths.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        paths.dedup();

        for path in &paths {
            self.register(id, path);
        }

        id
    }

    /// Register one more alternative for a rule added earlier.
    ///
    /// Registering an alternative that is already reachable is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::UnknownRule`] if `id` was not issued by this builder.
    pub fn add_alternative<P, S>(&mut self, id: RuleId, alternative: P) -> Result<()>
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if id.0 >= self.rules.len() {
            return Err(RulesError::UnknownRule(id));
        }
        self.register(id, &to_path(alternative));
        Ok(())
    }

    /// Number of rules added so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rule was added yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Freeze the trie into an immutable index.
    #[must_use]
    pub fn build(self) -> RuleIndex<T> {
        let Self { mut root, rules } = self;
        root.shrink();

        let mut stats = IndexStats {
            rules: rules.len(),
            ..IndexStats::default()
        };
        root.measure(0, &mut stats);

        log::debug!(
            "Built rule index: {} rules, {} nodes, {} stored paths, depth {}",
            stats.rules,
            stats.nodes,
            stats.stored_paths,
            stats.max_depth
        );

        RuleIndex { root, rules, stats }
    }

    /// Walk or create the nodes of `path` and store `id` at its end, unless a
    /// node on the way already holds the rule.
    fn register(&mut self, id: RuleId, path: &[String]) -> bool {
        let mut node = &mut self.root;
        if node.holds(id) {
            return false;
        }
        for label in path {
            node = node.children.entry(label.clone()).or_default();
            if node.holds(id) {
                return false;
            }
        }
        node.insert(id);
        true
    }
}

/// Sort and deduplicate an alternative into a trie path.
fn to_path<P, S>(alternative: P) -> Vec<String>
where
    P: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut path: Vec<String> = alternative.into_iter().map(Into::into).collect();
    path.sort_unstable();
    path.dedup();
    path
}

/// Immutable identifier trie over rule handles of type `T`.
///
/// Built once, then shared freely: queries never mutate the index, so it can
/// be used from many threads at once.
#[derive(Debug)]
pub struct RuleIndex<T> {
    pub(crate) root: Node,
    pub(crate) rules: Vec<T>,
    stats: IndexStats,
}

impl<T> RuleIndex<T> {
    /// Start building an index.
    #[must_use]
    pub fn builder() -> RuleIndexBuilder<T> {
        RuleIndexBuilder::new()
    }

    /// Build an index from `(rule, alternatives)` pairs.
    pub fn build<I, A, P, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = (T, A)>,
        A: IntoIterator<Item = P>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder = RuleIndexBuilder::new();
        for (rule, alternatives) in rules {
            builder.add_rule(rule, alternatives);
        }
        builder.build()
    }

    /// Build an index from rule handles, asking `extract` for each rule's
    /// identifier-set alternatives.
    pub fn build_with<I, F, A, P, S>(rules: I, mut extract: F) -> Self
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&T) -> A,
        A: IntoIterator<Item = P>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder = RuleIndexBuilder::new();
        for rule in rules {
            let alternatives = extract(&rule);
            builder.add_rule(rule, alternatives);
        }
        builder.build()
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the index holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Look up a rule by id.
    #[must_use]
    pub fn rule(&self, id: RuleId) -> Option<&T> {
        self.rules.get(id.0)
    }

    /// All rules in registration order.
    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &T)> {
        self.rules.iter().enumerate().map(|(i, rule)| (RuleId(i), rule))
    }

    /// Root of the trie.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Size summary computed at build time.
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_at<'a>(index: &'a RuleIndex<&str>, path: &[&str]) -> Option<&'a Node> {
        path.iter().try_fold(index.root(), |node, label| node.child(label))
    }

    #[test]
    fn test_shortest_alternative_dominates() {
        let index = RuleIndex::build(vec![("r", vec![vec!["A", "B"], vec!["A"]])]);

        assert_eq!(node_at(&index, &["A"]).map(Node::values), Some(&[RuleId(0)][..]));
        assert!(node_at(&index, &["A", "B"]).is_none());
        assert_eq!(index.stats().stored_paths, 1);
    }

    #[test]
    fn test_empty_alternative_stored_at_root() {
        let index = RuleIndex::build(vec![("always", vec![Vec::<&str>::new()])]);

        assert_eq!(index.root().values(), &[RuleId(0)]);
        assert!(index.root().is_leaf());
    }

    #[test]
    fn test_path_is_sorted_and_deduplicated() {
        let index = RuleIndex::build(vec![("r", vec![vec!["c", "a", "b", "a"]])]);

        let leaf = node_at(&index, &["a", "b", "c"]).expect("sorted path exists");
        assert_eq!(leaf.values(), &[RuleId(0)]);
        assert_eq!(index.stats().max_depth, 3);
    }

    #[test]
    fn test_dominance_is_prefix_based_only() {
        // {A, C} is a subset of {A, B, C} but not a prefix of its sorted path.
        let index = RuleIndex::build(vec![("r", vec![vec!["A", "C"], vec!["A", "B", "C"]])]);

        assert!(node_at(&index, &["A", "C"]).is_some());
        assert!(node_at(&index, &["A", "B", "C"]).is_some());
        assert_eq!(index.stats().stored_paths, 2);
    }

    #[test]
    fn test_add_alternative_is_idempotent() {
        let mut once = RuleIndexBuilder::new();
        let a = once.add_rule("a", vec![vec!["x"]]);
        let b = once.add_rule("b", vec![vec!["y"]]);
        once.add_alternative(a, ["z", "w"]).expect("known rule");

        let mut twice = RuleIndexBuilder::new();
        let a2 = twice.add_rule("a", vec![vec!["x"]]);
        twice.add_rule("b", vec![vec!["y"]]);
        twice.add_alternative(a2, ["z", "w"]).expect("known rule");
        twice.add_alternative(a2, ["w", "z"]).expect("known rule");
        twice.add_alternative(a2, ["x"]).expect("known rule");

        assert_eq!(once.build().root(), twice.build().root());
        assert_ne!(a, b);
    }

    #[test]
    fn test_older_rule_keeps_values_sorted() {
        let mut builder = RuleIndexBuilder::new();
        let first = builder.add_rule("first", vec![vec!["a", "b"]]);
        let second = builder.add_rule("second", vec![vec!["x"]]);
        builder.add_rule("third", vec![vec!["x"]]);
        builder.add_alternative(first, ["x"]).expect("known rule");

        let index = builder.build();
        let node = index.root().child("x").expect("x edge");
        assert_eq!(node.values(), &[first, second, RuleId(2)]);
    }

    #[test]
    fn test_unknown_rule_rejected() {
        let mut builder: RuleIndexBuilder<&str> = RuleIndexBuilder::new();
        let err = builder.add_alternative(RuleId(3), ["a"]).unwrap_err();
        assert_eq!(err, RulesError::UnknownRule(RuleId(3)));
    }

    #[test]
    fn test_rule_without_alternatives_is_not_stored() {
        let index = RuleIndex::build(vec![("never", Vec::<Vec<&str>>::new())]);

        assert_eq!(index.len(), 1);
        assert_eq!(index.stats().stored_paths, 0);
        assert_eq!(index.stats().nodes, 1);
    }

    #[test]
    fn test_build_with_extractor() {
        let rules = vec!["alpha beta", "gamma"];
        let index = RuleIndex::build_with(rules, |rule| {
            vec![rule.split_whitespace().map(str::to_string).collect::<Vec<_>>()]
        });

        assert_eq!(index.rule(RuleId(1)), Some(&"gamma"));
        assert!(node_at(&index, &["alpha", "beta"]).is_some());
        assert_eq!(index.rules().count(), 2);
    }
}
