use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Duration;
use outreach_core::{Clock, Language, SystemClock};
use outreach_ledger::LedgerStore;
use outreach_subscribers::SubscriberSource;
use serde::Serialize;
use tracing::debug;

use crate::error::AnalyticsError;

/// Headline numbers for the stats endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsSnapshot {
    pub total_subscribers: u64,
    pub total_broadcasts: u64,
    /// Subscribers per language. Languages with nobody are absent.
    pub language_distribution: BTreeMap<Language, u64>,
    pub recent_broadcasts: u64,
}

/// Recomputes an [`AnalyticsSnapshot`] on every call.
pub struct Aggregator {
    directory: Arc<dyn SubscriberSource>,
    ledger: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    recent_window: Duration,
}

impl Aggregator {
    pub fn new(
        directory: Arc<dyn SubscriberSource>,
        ledger: Arc<dyn LedgerStore>,
        recent_window: Duration,
    ) -> Self {
        Self::with_clock(directory, ledger, recent_window, Arc::new(SystemClock))
    }

    pub fn with_clock(
        directory: Arc<dyn SubscriberSource>,
        ledger: Arc<dyn LedgerStore>,
        recent_window: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            ledger,
            clock,
            recent_window,
        }
    }

    pub fn snapshot(&self) -> Result<AnalyticsSnapshot, AnalyticsError> {
        // One directory read so the distribution always sums to the total.
        let subscribers = self.directory.all()?;
        let mut language_distribution = BTreeMap::new();
        for sub in &subscribers {
            *language_distribution.entry(sub.language).or_insert(0u64) += 1;
        }

        let since = self
            .clock
            .now()
            .checked_sub_signed(self.recent_window)
            .unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC);

        let snapshot = AnalyticsSnapshot {
            total_subscribers: subscribers.len() as u64,
            total_broadcasts: self.ledger.count()?,
            language_distribution,
            recent_broadcasts: self.ledger.count_since(since)?,
        };
        debug!(
            subscribers = snapshot.total_subscribers,
            broadcasts = snapshot.total_broadcasts,
            recent = snapshot.recent_broadcasts,
            "analytics snapshot"
        );
        Ok(snapshot)
    }
}
