//! Core types for rewriting.
//!
//! Defines the data structures used throughout the rewrite pipeline.

use std::fmt::Write as _;

use omni_rules::{Fix, Replacement};
use serde::{Deserialize, Serialize};

/// A successful application of one rule at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleMatch {
    /// Name of the producing rule.
    pub rule: String,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed, in bytes).
    pub column: usize,
    /// Original text covered by the match.
    pub original_text: String,
    /// The replacement proposed by the rule.
    pub replacement: Replacement,
}

impl Fix for RuleMatch {
    fn replacements(&self) -> &[Replacement] {
        std::slice::from_ref(&self.replacement)
    }
}

/// Location of an applied edit within a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditLocation {
    /// Rule that produced the edit.
    pub rule: String,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed, in bytes).
    pub column: usize,
    /// Byte offset where the edit starts.
    pub start: usize,
    /// Byte offset where the edit ends (exclusive).
    pub end: usize,
    /// Original text that was replaced.
    pub original_text: String,
    /// New text after replacement.
    pub new_text: String,
}

impl From<RuleMatch> for EditLocation {
    fn from(m: RuleMatch) -> Self {
        Self {
            line: m.line,
            column: m.column,
            start: m.replacement.start(),
            end: m.replacement.end(),
            new_text: m.replacement.text().to_string(),
            original_text: m.original_text,
            rule: m.rule,
        }
    }
}

/// Result of rewriting one unit.
#[derive(Debug, Clone, Serialize)]
pub struct RewriteResult {
    /// Original content before modification.
    pub original: String,
    /// Modified content after replacement.
    pub modified: String,
    /// Applied edits, in source order.
    pub edits: Vec<EditLocation>,
    /// Matches dropped because they overlapped a preferred match.
    pub rejected: usize,
    /// Unified diff showing changes.
    pub diff: String,
}

impl RewriteResult {
    pub(crate) fn unchanged(content: &str) -> Self {
        Self {
            original: content.to_string(),
            modified: content.to_string(),
            edits: Vec::new(),
            rejected: 0,
            diff: String::new(),
        }
    }

    /// Number of applied edits.
    #[must_use]
    pub fn count(&self) -> usize {
        self.edits.len()
    }

    /// Whether the content is untouched.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.original == self.modified
    }

    /// Human-readable summary of the changes.
    #[must_use]
    pub fn summary(&self, path: Option<&str>) -> String {
        let mut output = String::new();

        if let Some(p) = path {
            let _ = writeln!(output, "// REWRITE: {p}");
        }
        let _ = writeln!(output, "// Edits: {}", self.count());
        if self.rejected > 0 {
            let _ = writeln!(output, "// Rejected (overlapping): {}", self.rejected);
        }

        if self.edits.is_empty() {
            output.push_str("[No matches found]\n");
            return output;
        }

        output.push_str("\n// Changes:\n");
        for edit in &self.edits {
            let _ = writeln!(
                output,
                "L{}:{} [{}] \"{}\" -> \"{}\"",
                edit.line, edit.column, edit.rule, edit.original_text, edit.new_text
            );
        }

        output.push_str("\n// Diff:\n");
        output.push_str(&self.diff);

        output
    }
}

/// How candidate rules are chosen for a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Identifier trie lookup.
    #[default]
    Indexed,
    /// Check every rule's alternatives directly. Slow; for debugging.
    Exhaustive,
}

/// Configuration for a [`crate::RewriteEngine`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum file size in bytes (default 1MB).
    pub max_file_size: u64,
    /// Whether to preview only (no file modification).
    pub dry_run: bool,
    /// Candidate selection strategy.
    pub selection: SelectionStrategy,
    /// Only load rules whose whole name matches this regex.
    pub rule_filter: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_file_size: 1024 * 1024, // 1MB
            dry_run: true,              // Default to preview for safety
            selection: SelectionStrategy::Indexed,
            rule_filter: None,
        }
    }
}
