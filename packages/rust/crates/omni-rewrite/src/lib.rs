#![allow(clippy::doc_markdown)]

//! omni-rewrite - Rule-Library Rewriting for Omni DevEnv
//!
//! Applies large libraries of ast-grep rewrite rules to source files. Rules
//! are pre-filtered per unit through an identifier index (omni-rules), so
//! only rules whose required identifiers all occur in a file are matched.
//! Overlapping matches are resolved deterministically before application.
//!
//! # Features
//!
//! - **Rule files**: TOML `[[rule]]` tables with one or more alternative patterns
//! - **Indexed selection**: identifier trie lookup instead of trying every rule
//! - **Conflict resolution**: the largest non-overlapping set of edits wins
//! - **Capture substitution**: `$NAME` and `$$$NAME` in rewrite templates
//! - **Diff preview**: unified diffs before anything is written
//! - **Batch rewriting**: parallel processing across whole trees
//!
//! # Architecture
//!
//! ```text
//! omni-rewrite/src/
//! ├── lib.rs          # Re-exports (this file)
//! ├── error.rs        # RewriteError enum (thiserror)
//! ├── rule.rs         # RewriteRule, RuleSet, TOML loading
//! ├── identifiers.rs  # Identifier extraction for sources and patterns
//! ├── capture.rs      # Capture substitution
//! ├── apply.rs        # Textual application of replacements
//! ├── diff.rs         # Diff generation utilities
//! ├── types.rs        # RuleMatch, EditLocation, RewriteResult, EngineConfig
//! ├── engine.rs       # RewriteEngine (select -> match -> resolve -> apply)
//! └── batch.rs        # Parallel batch rewriting with rayon
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use omni_rewrite::{BatchConfig, EngineConfig, RewriteEngine, RuleSet, SupportLang};
//!
//! let rules = RuleSet::load("rules/")?;
//! let engine = RewriteEngine::new(rules, EngineConfig::default())?;
//!
//! // Single unit
//! let result = engine.rewrite("if len(items) == 0: pass", SupportLang::Python)?;
//! print!("{}", result.diff);
//!
//! // Whole tree
//! let stats = engine.batch_rewrite(
//!     "/project",
//!     &BatchConfig {
//!         file_pattern: "**/*.py".to_string(),
//!         ..Default::default()
//!     },
//! )?;
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

mod apply;
mod batch;
mod capture;
mod diff;
mod engine;
mod error;
mod identifiers;
mod rule;
mod types;

// ============================================================================
// Public Re-exports
// ============================================================================

pub use engine::RewriteEngine;
pub use error::{Result, RewriteError};
pub use rule::{RewriteRule, RulePattern, RuleSet, language_key, parse_language};
pub use types::{EditLocation, EngineConfig, RewriteResult, RuleMatch, SelectionStrategy};

// Batch rewriting exports
pub use batch::{BatchConfig, BatchStats};

// Building blocks for external use
pub use apply::apply_replacements;
pub use capture::substitute_captures;
pub use diff::generate_unified_diff;
pub use identifiers::{pattern_identifiers, rule_alternatives, source_identifiers};

pub use ast_grep_language::SupportLang;
pub use omni_rules::Replacement;
