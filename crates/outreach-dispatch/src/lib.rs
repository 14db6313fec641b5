//! `outreach-dispatch`: broadcast fan-out and the analytics built on its history.
//!
//! A dispatch is: validate → snapshot the directory → one send attempt per
//! subscriber (concurrent, bounded) → join → tally → one ledger append.
//! Transport failures only ever change the tally; the caller sees either the
//! appended [`BroadcastRecord`](outreach_ledger::BroadcastRecord) or a single
//! terminal [`DispatchError`].

pub mod analytics;
pub mod dispatcher;
pub mod error;
pub mod request;

pub use analytics::{Aggregator, AnalyticsSnapshot};
pub use dispatcher::Dispatcher;
pub use error::{AnalyticsError, DispatchError};
pub use request::BroadcastRequest;
