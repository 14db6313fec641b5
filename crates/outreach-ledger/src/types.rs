use chrono::{DateTime, Utc};
use outreach_core::ChannelKind;
use serde::{Deserialize, Serialize};

/// Outcome of one dispatch: how many recipients were reached.
///
/// [`Tally::record`] keeps `sent + failed == total`; the ledger refuses to
/// append a tally that breaks it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub sent: u32,
    pub failed: u32,
    pub total: u32,
}

impl Tally {
    /// Count one delivery attempt.
    pub fn record(&mut self, delivered: bool) {
        if delivered {
            self.sent += 1;
        } else {
            self.failed += 1;
        }
        self.total += 1;
    }

    pub fn is_consistent(&self) -> bool {
        self.sent.checked_add(self.failed) == Some(self.total)
    }
}

impl FromIterator<bool> for Tally {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut tally = Tally::default();
        for delivered in iter {
            tally.record(delivered);
        }
        tally
    }
}

/// What the dispatcher hands to the ledger; id and timestamp are assigned on append.
#[derive(Debug, Clone)]
pub struct NewBroadcast {
    pub message: String,
    pub channel: ChannelKind,
    pub tally: Tally,
}

/// A persisted, immutable broadcast entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastRecord {
    pub id: i64,
    pub message: String,
    pub channel: ChannelKind,
    pub timestamp: DateTime<Utc>,
    pub sent: u32,
    pub failed: u32,
    pub total: u32,
}

impl BroadcastRecord {
    pub fn tally(&self) -> Tally {
        Tally {
            sent: self.sent,
            failed: self.failed,
            total: self.total,
        }
    }
}
