//! Error types for rule loading and rewriting.
//!
//! Follows ODF-REP: Library crates use `thiserror` for explicit error enums.

use omni_rules::RulesError;
use thiserror::Error;

/// Error types for rewrite operations.
///
/// Each variant represents a specific failure mode in the rewriting pipeline.
/// A candidate rule that yields no match is not an error.
#[derive(Error, Debug)]
pub enum RewriteError {
    /// File I/O error (reading sources or rule files, writing results).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Source file exceeds the configured size limit.
    #[error("File too large: {path} ({size} bytes, limit {limit})")]
    FileTooLarge {
        /// Offending file.
        path: String,
        /// Actual size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// Invalid ast-grep pattern syntax in a rule.
    #[error("Pattern error in rule '{rule}': {message}")]
    Pattern {
        /// Rule owning the pattern.
        rule: String,
        /// Parser message.
        message: String,
    },

    /// Language not supported by ast-grep.
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Rule definition is structurally invalid.
    #[error("Invalid rule '{rule}': {message}")]
    InvalidRule {
        /// Rule name.
        rule: String,
        /// What is wrong with it.
        message: String,
    },

    /// Two rules share a name.
    #[error("Duplicate rule name: {0}")]
    DuplicateRule(String),

    /// Rule file is not valid TOML for the rule schema.
    #[error("Rule file error in {path}: {source}")]
    RuleFile {
        /// Rule file path.
        path: String,
        /// TOML parser error.
        source: toml::de::Error,
    },

    /// Invalid rule name filter.
    #[error("Invalid rule filter: {0}")]
    Filter(#[from] regex::Error),

    /// Invalid batch file pattern.
    #[error("Invalid file pattern: {0}")]
    Glob(#[from] globset::Error),

    /// Worker pool could not be started.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Replacement could not be applied to the source text.
    #[error("Replacement error: {0}")]
    Replacement(String),

    /// Contract violation reported by the rule core.
    #[error(transparent)]
    Rules(#[from] RulesError),
}

/// Result alias for rewrite operations.
pub type Result<T> = std::result::Result<T, RewriteError>;
