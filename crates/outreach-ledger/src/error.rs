use thiserror::Error;

/// Errors raised by the broadcast ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A SQLite operation failed (storage unavailable, disk full, …).
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The tally handed to `append` does not add up.
    #[error("inconsistent tally: sent {sent} + failed {failed} != total {total}")]
    InconsistentTally { sent: u32, failed: u32, total: u32 },

    /// A stored row could not be decoded.
    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: i64, reason: String },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
