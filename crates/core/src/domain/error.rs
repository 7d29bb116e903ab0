// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid phase transition: {from} -> {to}")]
    PhaseRegression { from: String, to: String },

    #[error("Unsupported scope identity: {0}")]
    UnsupportedScope(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
