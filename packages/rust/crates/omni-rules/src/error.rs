//! Error types for rule indexing and conflict resolution.
//!
//! The core performs no I/O, so the only failures are contract violations
//! caught at the boundary.

use thiserror::Error;

use crate::index::RuleId;

/// Error types for the rule core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    /// A replacement range whose start lies past its end.
    #[error("Invalid replacement range: start {start} is past end {end}")]
    InvalidRange {
        /// Start offset of the rejected range.
        start: usize,
        /// End offset of the rejected range.
        end: usize,
    },

    /// A rule id that was not issued by this builder.
    #[error("Unknown rule: {0}")]
    UnknownRule(RuleId),
}

/// Result alias for the rule core.
pub type Result<T> = std::result::Result<T, RulesError>;
