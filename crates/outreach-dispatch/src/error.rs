use outreach_ledger::LedgerError;
use outreach_subscribers::SubscriberError;
use thiserror::Error;

/// Terminal failures of a dispatch call.
///
/// Per-recipient transport failures are not here: they are counted in the
/// tally and never abort the broadcast.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request was rejected before anything was read or sent.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The subscriber snapshot could not be read; nothing was sent.
    #[error("subscriber directory unavailable: {0}")]
    Directory(#[from] SubscriberError),

    /// Sends were attempted but the outcome could not be recorded.
    #[error("failed to record broadcast: {0}")]
    Persistence(#[from] LedgerError),
}

/// Failures while computing an analytics snapshot.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("subscriber directory unavailable: {0}")]
    Directory(#[from] SubscriberError),

    #[error("broadcast ledger unavailable: {0}")]
    Ledger(#[from] LedgerError),
}
