//! omni-rules - Indexed Rule Selection for Omni DevEnv
//!
//! Checking thousands of rewrite rules against every source file is too slow
//! when only a handful can possibly apply. This crate provides the two pieces
//! that make large rule libraries cheap to run:
//!
//! - **Rule Index**: an immutable trie keyed by identifier. Each rule is
//!   registered under the identifiers its pattern requires; a source unit's
//!   identifier set then selects the few rules that could match it.
//! - **Conflict Resolver**: picks a maximal, deterministic subset of
//!   non-overlapping matches to apply when several rules rewrite the same code.
//!
//! The crate knows nothing about parsers or patterns. Rules are opaque handles,
//! identifiers are plain strings and replacements are byte ranges.
//!
//! # Architecture
//!
//! ```text
//! omni-rules/src/
//! ├── lib.rs       # Re-exports (this file)
//! ├── error.rs     # RulesError enum (thiserror)
//! ├── index.rs     # RuleIndexBuilder, RuleIndex, Node (trie construction)
//! ├── select.rs    # Candidate selection (trie traversal, exhaustive oracle)
//! └── conflict.rs  # Replacement, RangeSet, resolve_conflicts
//! ```
//!
//! # Example
//!
//! ```rust
//! use omni_rules::{Match, Replacement, RuleIndex, resolve_conflicts};
//!
//! let index = RuleIndex::build(vec![
//!     ("is-empty", vec![vec!["len"]]),
//!     ("iter-count", vec![vec!["count", "iter"]]),
//! ]);
//!
//! let candidates = index.select(["if", "len", "items"]);
//! let names: Vec<_> = candidates.iter().map(|(_, rule)| *rule).collect();
//! assert_eq!(names, vec!["is-empty"]);
//!
//! let wide = Match::new("wide", vec![Replacement::new(0..10, "x").unwrap()]);
//! let narrow = Match::new("narrow", vec![Replacement::new(2..4, "y").unwrap()]);
//! let accepted = resolve_conflicts(vec![narrow, wide]);
//! assert_eq!(accepted.len(), 1);
//! assert_eq!(accepted[0].label(), "wide");
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

mod conflict;
mod error;
mod index;
mod select;

// ============================================================================
// Public Re-exports
// ============================================================================

pub use error::{Result, RulesError};

pub use index::{IndexStats, Node, RuleId, RuleIndex, RuleIndexBuilder};

pub use select::{Candidates, ExhaustiveSelector, RuleSelector};

pub use conflict::{Fix, Match, RangeSet, Replacement, partition_conflicts, resolve_conflicts};
