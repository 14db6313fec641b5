use thiserror::Error;

/// Errors that can occur during subscriber directory operations.
#[derive(Debug, Error)]
pub enum SubscriberError {
    /// No subscriber with this phone exists.
    #[error("subscriber not found: {phone}")]
    NotFound { phone: String },

    /// The phone identifier is empty or otherwise unusable.
    #[error("invalid phone: {0}")]
    InvalidPhone(String),

    /// A SQLite operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, SubscriberError>;
