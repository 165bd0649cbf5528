use thiserror::Error;
use uuid::Uuid;

/// Error type that captures recurrence, calendar boundary and storage failures.
#[derive(Debug, Error)]
pub enum RecurrenceError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Recurrence rule not found: {0}")]
    RuleNotFound(Uuid),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RecurrenceError>;
