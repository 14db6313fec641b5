//! `outreach-ledger`: append-only broadcast history backed by SQLite.
//!
//! Every dispatch appends exactly one [`BroadcastRecord`]. Records are never
//! updated or deleted from here; `id` is assigned by SQLite `AUTOINCREMENT`
//! under the ledger's connection mutex, so ids are strictly increasing even
//! when several dispatches finish at once.

pub mod db;
pub mod error;
pub mod ledger;
pub mod types;

pub use error::{LedgerError, Result};
pub use ledger::{BroadcastLedger, LedgerStore};
pub use types::{BroadcastRecord, NewBroadcast, Tally};
