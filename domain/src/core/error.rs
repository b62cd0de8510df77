//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Not enough verdicts to aggregate: expected at least {expected}, got {actual}")]
    NotEnoughVerdicts { expected: usize, actual: usize },
}

impl DomainError {
    /// Create a schema violation error
    pub fn schema(message: impl Into<String>) -> Self {
        DomainError::SchemaViolation(message.into())
    }

    /// Check if this error came from aggregating too few inputs
    pub fn is_aggregation_input(&self) -> bool {
        matches!(self, DomainError::NotEnoughVerdicts { .. })
    }
}
