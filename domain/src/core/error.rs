//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid decomposition pattern '{name}': {reason}")]
    InvalidPattern { name: String, reason: String },
}
