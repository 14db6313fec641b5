use thiserror::Error;

/// Workspace-level error, surfaced to HTTP clients with a stable [`code`](OutreachError::code).
#[derive(Debug, Error)]
pub enum OutreachError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Subscriber not found: {phone}")]
    SubscriberNotFound { phone: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OutreachError {
    /// Short error code string sent to clients in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            OutreachError::Config(_) => "CONFIG_ERROR",
            OutreachError::Validation { .. } => "VALIDATION_ERROR",
            OutreachError::SubscriberNotFound { .. } => "NOT_FOUND",
            OutreachError::Storage(_) => "STORAGE_ERROR",
            OutreachError::Persistence(_) => "PERSISTENCE_ERROR",
            OutreachError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, OutreachError>;
