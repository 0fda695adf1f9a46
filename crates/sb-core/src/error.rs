//! Error types for the vault organizer.

use thiserror::Error;

/// Top-level result type for organizer operations.
pub type Result<T> = std::result::Result<T, OrganizerError>;

/// Top-level error type for the organizer.
#[derive(Debug, Error)]
pub enum OrganizerError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("rule definition error at rule {index}: {message}")]
    RuleDefinition { index: usize, message: String },

    #[error(
        "classification conflict for '{note}': keeping '{kept}', rule also matched '{rejected}'"
    )]
    ClassificationConflict {
        note: String,
        kept: String,
        rejected: String,
    },

    #[error("vault error: {0}")]
    Vault(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
