use std::sync::Arc;

use futures_util::{stream, StreamExt};
use outreach_channels::{Channel, ChannelError, ChannelManager, OutboundMessage};
use outreach_core::{config::DEFAULT_MAX_CONCURRENT_SENDS, ChannelKind};
use outreach_ledger::{BroadcastRecord, LedgerStore, NewBroadcast, Tally};
use outreach_subscribers::{Subscriber, SubscriberSource};
use tracing::{error, info, instrument, warn};

use crate::error::DispatchError;
use crate::request::BroadcastRequest;

/// Fans one message out to every subscriber and records the outcome.
///
/// Cheap to share behind an `Arc`; holds no per-dispatch state, so concurrent
/// dispatches each work on their own directory snapshot.
pub struct Dispatcher {
    directory: Arc<dyn SubscriberSource>,
    ledger: Arc<dyn LedgerStore>,
    channels: Arc<ChannelManager>,
    max_concurrent_sends: usize,
}

impl Dispatcher {
    pub fn new(
        directory: Arc<dyn SubscriberSource>,
        ledger: Arc<dyn LedgerStore>,
        channels: Arc<ChannelManager>,
    ) -> Self {
        Self {
            directory,
            ledger,
            channels,
            max_concurrent_sends: DEFAULT_MAX_CONCURRENT_SENDS,
        }
    }

    /// Cap the number of in-flight sends per dispatch (minimum 1).
    pub fn with_max_concurrent_sends(mut self, limit: usize) -> Self {
        self.max_concurrent_sends = limit.max(1);
        self
    }

    /// Run one broadcast to completion.
    ///
    /// Every subscriber in the snapshot gets exactly one attempt. The record
    /// is appended only after all attempts have settled. If the append fails
    /// the sends are not undone: the message may have reached recipients
    /// without a matching ledger entry.
    #[instrument(skip_all, fields(channel = %request.channel()))]
    pub async fn dispatch(&self, request: BroadcastRequest) -> Result<BroadcastRecord, DispatchError> {
        let channel = request.channel();
        let snapshot = self.directory.all()?;
        info!(recipients = snapshot.len(), "dispatching broadcast");

        let transport = self.channels.get(channel);
        if transport.is_none() && !snapshot.is_empty() {
            warn!("no transport registered; every recipient will be counted as failed");
        }

        let tally = self
            .fan_out(channel, transport, request.text(), snapshot)
            .await;

        let record = self
            .ledger
            .append(NewBroadcast {
                message: request.into_text(),
                channel,
                tally,
            })
            .map_err(|e| {
                error!(
                    error = %e,
                    sent = tally.sent,
                    failed = tally.failed,
                    "broadcast sent but could not be recorded"
                );
                DispatchError::Persistence(e)
            })?;

        info!(
            id = record.id,
            sent = record.sent,
            failed = record.failed,
            total = record.total,
            "broadcast complete"
        );
        Ok(record)
    }

    /// Attempt delivery to every subscriber and join on all of them.
    async fn fan_out(
        &self,
        channel: ChannelKind,
        transport: Option<Arc<dyn Channel>>,
        text: &str,
        snapshot: Vec<Subscriber>,
    ) -> Tally {
        stream::iter(snapshot)
            .map(|subscriber| {
                let transport = transport.clone();
                let msg = OutboundMessage {
                    channel,
                    recipient_id: subscriber.phone,
                    content: text.to_string(),
                    language: subscriber.language,
                };
                async move { deliver(transport.as_deref(), &msg).await }
            })
            .buffer_unordered(self.max_concurrent_sends)
            .collect::<Vec<bool>>()
            .await
            .into_iter()
            .collect()
    }
}

/// One attempt to one recipient. Failures are logged and reported as `false`.
async fn deliver(transport: Option<&dyn Channel>, msg: &OutboundMessage) -> bool {
    let result = match transport {
        Some(ch) => ch.send(msg).await,
        None => Err(ChannelError::NotConfigured(msg.channel)),
    };
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(recipient = %msg.recipient_id, error = %e, "delivery failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use outreach_channels::ChannelStatus;
    use outreach_core::Language;
    use outreach_ledger::{BroadcastLedger, LedgerError};
    use outreach_subscribers::{SubscriberDirectory, SubscriberError};
    use rusqlite::Connection;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Transport that fails for a fixed set of recipients and records every attempt.
    struct ScriptedChannel {
        kind: ChannelKind,
        failing: HashSet<String>,
        attempts: Mutex<Vec<(String, Language)>>,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl ScriptedChannel {
        fn new(kind: ChannelKind, failing: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                kind,
                failing: failing.iter().map(|s| s.to_string()).collect(),
                attempts: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
            })
        }

        fn attempts(&self) -> Vec<(String, Language)> {
            let mut attempts = self.attempts.lock().unwrap().clone();
            attempts.sort();
            attempts
        }
    }

    #[async_trait]
    impl Channel for ScriptedChannel {
        fn kind(&self) -> ChannelKind {
            self.kind
        }

        async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.attempts
                .lock()
                .unwrap()
                .push((msg.recipient_id.clone(), msg.language));
            if self.failing.contains(&msg.recipient_id) {
                Err(ChannelError::SendFailed("unreachable".to_string()))
            } else {
                Ok(())
            }
        }

        fn status(&self) -> ChannelStatus {
            ChannelStatus::Ready
        }
    }

    struct BrokenLedger;

    impl LedgerStore for BrokenLedger {
        fn append(&self, _entry: NewBroadcast) -> outreach_ledger::Result<BroadcastRecord> {
            Err(LedgerError::Database(rusqlite::Error::InvalidQuery))
        }
        fn list(&self, _limit: Option<usize>) -> outreach_ledger::Result<Vec<BroadcastRecord>> {
            Ok(Vec::new())
        }
        fn count(&self) -> outreach_ledger::Result<u64> {
            Ok(0)
        }
        fn count_since(&self, _since: chrono::DateTime<chrono::Utc>) -> outreach_ledger::Result<u64> {
            Ok(0)
        }
    }

    struct BrokenDirectory;

    impl SubscriberSource for BrokenDirectory {
        fn all(&self) -> outreach_subscribers::Result<Vec<Subscriber>> {
            Err(SubscriberError::Database(rusqlite::Error::InvalidQuery))
        }
    }

    struct Fixture {
        directory: Arc<SubscriberDirectory>,
        ledger: Arc<BroadcastLedger>,
    }

    impl Fixture {
        fn new(subscribers: &[(&str, Language)]) -> Self {
            let directory =
                Arc::new(SubscriberDirectory::new(Connection::open_in_memory().unwrap()).unwrap());
            for (phone, lang) in subscribers {
                directory.upsert(phone, *lang).unwrap();
            }
            let ledger = Arc::new(BroadcastLedger::new(Connection::open_in_memory().unwrap()).unwrap());
            Self { directory, ledger }
        }

        fn dispatcher(&self, transports: Vec<Arc<ScriptedChannel>>) -> Dispatcher {
            let mut manager = ChannelManager::new();
            for t in transports {
                manager.register(t);
            }
            Dispatcher::new(
                self.directory.clone(),
                self.ledger.clone(),
                Arc::new(manager),
            )
        }
    }

    fn sms(text: &str) -> BroadcastRequest {
        BroadcastRequest::new(text, ChannelKind::Sms).unwrap()
    }

    #[tokio::test]
    async fn one_failure_is_tallied_not_raised() {
        let fx = Fixture::new(&[("+911", Language::English), ("+912", Language::Hindi)]);
        let transport = ScriptedChannel::new(ChannelKind::Sms, &["+912"]);
        let dispatcher = fx.dispatcher(vec![transport.clone()]);

        let record = dispatcher.dispatch(sms("Boil water")).await.unwrap();

        assert_eq!(record.tally(), Tally { sent: 1, failed: 1, total: 2 });
        assert_eq!(record.message, "Boil water");
        assert_eq!(record.channel, ChannelKind::Sms);
        assert_eq!(
            transport.attempts(),
            vec![
                ("+911".to_string(), Language::English),
                ("+912".to_string(), Language::Hindi),
            ]
        );
        assert_eq!(fx.ledger.list(None).unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn empty_directory_still_records() {
        let fx = Fixture::new(&[]);
        let transport = ScriptedChannel::new(ChannelKind::Whatsapp, &[]);
        let dispatcher = fx.dispatcher(vec![transport.clone()]);

        let record = dispatcher
            .dispatch(BroadcastRequest::new("Heat wave advisory", ChannelKind::Whatsapp).unwrap())
            .await
            .unwrap();

        assert_eq!(record.tally(), Tally::default());
        assert!(transport.attempts().is_empty());
        assert_eq!(fx.ledger.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn unconfigured_channel_counts_everyone_failed() {
        let fx = Fixture::new(&[("+911", Language::English), ("+912", Language::Odia)]);
        let sms_only = ScriptedChannel::new(ChannelKind::Sms, &[]);
        let dispatcher = fx.dispatcher(vec![sms_only.clone()]);

        let record = dispatcher
            .dispatch(BroadcastRequest::new("Vaccination camp", ChannelKind::Telegram).unwrap())
            .await
            .unwrap();

        assert_eq!(record.tally(), Tally { sent: 0, failed: 2, total: 2 });
        assert!(sms_only.attempts().is_empty());
    }

    #[tokio::test]
    async fn removed_subscriber_leaves_next_snapshot() {
        let fx = Fixture::new(&[("+911", Language::English), ("+912", Language::Hindi)]);
        let transport = ScriptedChannel::new(ChannelKind::Sms, &[]);
        let dispatcher = fx.dispatcher(vec![transport.clone()]);

        let first = dispatcher.dispatch(sms("first")).await.unwrap();
        fx.directory.remove("+911").unwrap();
        let second = dispatcher.dispatch(sms("second")).await.unwrap();

        assert_eq!(first.total, 2);
        assert_eq!(second.total, 1);
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn ledger_failure_surfaces_after_sends() {
        let fx = Fixture::new(&[("+911", Language::English)]);
        let transport = ScriptedChannel::new(ChannelKind::Sms, &[]);
        let mut manager = ChannelManager::new();
        manager.register(transport.clone());
        let dispatcher = Dispatcher::new(fx.directory.clone(), Arc::new(BrokenLedger), Arc::new(manager));

        let err = dispatcher.dispatch(sms("Boil water")).await.unwrap_err();

        assert!(matches!(err, DispatchError::Persistence(_)));
        // The send already happened and is not rolled back.
        assert_eq!(transport.attempts().len(), 1);
    }

    #[tokio::test]
    async fn directory_failure_sends_nothing() {
        let fx = Fixture::new(&[]);
        let transport = ScriptedChannel::new(ChannelKind::Sms, &[]);
        let mut manager = ChannelManager::new();
        manager.register(transport.clone());
        let dispatcher = Dispatcher::new(Arc::new(BrokenDirectory), fx.ledger.clone(), Arc::new(manager));

        let err = dispatcher.dispatch(sms("Boil water")).await.unwrap_err();

        assert!(matches!(err, DispatchError::Directory(_)));
        assert!(transport.attempts().is_empty());
        assert_eq!(fx.ledger.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn tally_adds_up_for_larger_directories() {
        let phones: Vec<String> = (0..40).map(|i| format!("+91{i:03}")).collect();
        let subs: Vec<(&str, Language)> = phones
            .iter()
            .enumerate()
            .map(|(i, p)| (p.as_str(), Language::ALL[i % 3]))
            .collect();
        let failing: Vec<&str> = phones.iter().step_by(7).map(String::as_str).collect();

        let fx = Fixture::new(&subs);
        let transport = ScriptedChannel::new(ChannelKind::Sms, &failing);
        let dispatcher = fx.dispatcher(vec![transport.clone()]).with_max_concurrent_sends(4);

        let record = dispatcher.dispatch(sms("Boil water")).await.unwrap();

        assert_eq!(record.total, 40);
        assert_eq!(record.failed as usize, failing.len());
        assert_eq!(record.sent + record.failed, record.total);
        assert_eq!(transport.attempts().len(), 40);
        assert!(transport.peak_in_flight.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn concurrent_dispatches_each_record_once() {
        let fx = Fixture::new(&[("+911", Language::English), ("+912", Language::Hindi)]);
        let transport = ScriptedChannel::new(ChannelKind::Sms, &[]);
        let dispatcher = Arc::new(fx.dispatcher(vec![transport.clone()]));

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let dispatcher = Arc::clone(&dispatcher);
                tokio::spawn(async move { dispatcher.dispatch(sms(&format!("alert {i}"))).await })
            })
            .collect();

        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap().unwrap().id);
        }
        ids.sort_unstable();
        ids.dedup();

        assert_eq!(ids.len(), 6);
        assert_eq!(fx.ledger.count().unwrap(), 6);
        assert_eq!(transport.attempts().len(), 12);
    }
}
