use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use outreach_core::{ChannelKind, Clock, SystemClock};
use rusqlite::Connection;
use tracing::{info, instrument};

use crate::db::init_db;
use crate::error::{LedgerError, Result};
use crate::types::{BroadcastRecord, NewBroadcast};

/// Storage contract the dispatcher writes to and the analytics reader reduces over.
pub trait LedgerStore: Send + Sync {
    /// Persist one broadcast, assigning its id and timestamp.
    fn append(&self, entry: NewBroadcast) -> Result<BroadcastRecord>;

    /// Records newest first (timestamp, then id, descending), at most `limit`.
    fn list(&self, limit: Option<usize>) -> Result<Vec<BroadcastRecord>>;

    /// Total number of records.
    fn count(&self) -> Result<u64>;

    /// Number of records stamped at or after `since`.
    fn count_since(&self, since: DateTime<Utc>) -> Result<u64>;
}

/// SQLite-backed append-only ledger.
pub struct BroadcastLedger {
    db: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl BroadcastLedger {
    /// Wrap an open connection, creating the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        Self::with_clock(conn, Arc::new(SystemClock))
    }

    pub fn with_clock(conn: Connection, clock: Arc<dyn Clock>) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
            clock,
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LedgerStore for BroadcastLedger {
    #[instrument(skip(self, entry), fields(channel = %entry.channel, total = entry.tally.total))]
    fn append(&self, entry: NewBroadcast) -> Result<BroadcastRecord> {
        let tally = entry.tally;
        if !tally.is_consistent() {
            return Err(LedgerError::InconsistentTally {
                sent: tally.sent,
                failed: tally.failed,
                total: tally.total,
            });
        }

        // The stamp is taken while holding the lock so id order and stamp
        // order agree for a monotonic clock.
        let db = self.conn();
        let stamp = encode_timestamp(self.clock.now());
        db.execute(
            "INSERT INTO broadcasts (message, channel, sent, failed, total, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                entry.message,
                entry.channel.as_str(),
                tally.sent,
                tally.failed,
                tally.total,
                stamp,
            ],
        )?;
        let id = db.last_insert_rowid();
        info!(id, sent = tally.sent, failed = tally.failed, "broadcast recorded");

        Ok(BroadcastRecord {
            id,
            message: entry.message,
            channel: entry.channel,
            timestamp: decode_timestamp(id, &stamp)?,
            sent: tally.sent,
            failed: tally.failed,
            total: tally.total,
        })
    }

    fn list(&self, limit: Option<usize>) -> Result<Vec<BroadcastRecord>> {
        // SQLite treats a negative LIMIT as "no limit".
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        let db = self.conn();
        let mut stmt = db.prepare_cached(
            "SELECT id, message, channel, sent, failed, total, created_at
             FROM broadcasts
             ORDER BY created_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![limit], |row| {
                Ok(RawRecord {
                    id: row.get(0)?,
                    message: row.get(1)?,
                    channel: row.get(2)?,
                    sent: row.get(3)?,
                    failed: row.get(4)?,
                    total: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(RawRecord::decode).collect()
    }

    fn count(&self) -> Result<u64> {
        let db = self.conn();
        let n: i64 = db.query_row("SELECT COUNT(*) FROM broadcasts", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    fn count_since(&self, since: DateTime<Utc>) -> Result<u64> {
        let db = self.conn();
        let n: i64 = db.query_row(
            "SELECT COUNT(*) FROM broadcasts WHERE created_at >= ?1",
            rusqlite::params![encode_timestamp(since)],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }
}

/// Row as stored, before the channel and timestamp are parsed.
struct RawRecord {
    id: i64,
    message: String,
    channel: String,
    sent: u32,
    failed: u32,
    total: u32,
    created_at: String,
}

impl RawRecord {
    fn decode(self) -> Result<BroadcastRecord> {
        let channel: ChannelKind = self.channel.parse().map_err(|reason| LedgerError::Corrupt {
            id: self.id,
            reason,
        })?;
        Ok(BroadcastRecord {
            id: self.id,
            timestamp: decode_timestamp(self.id, &self.created_at)?,
            message: self.message,
            channel,
            sent: self.sent,
            failed: self.failed,
            total: self.total,
        })
    }
}

/// Fixed-width UTC form (`2026-10-18T09:30:00.123456Z`), so text order is time order.
fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(id: i64, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LedgerError::Corrupt {
            id,
            reason: format!("bad timestamp {raw:?}: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tally;
    use chrono::{Duration, TimeZone};
    use outreach_core::ManualClock;

    fn entry(message: &str, sent: u32, failed: u32) -> NewBroadcast {
        NewBroadcast {
            message: message.to_string(),
            channel: ChannelKind::Sms,
            tally: Tally {
                sent,
                failed,
                total: sent + failed,
            },
        }
    }

    fn ledger_with_clock() -> (BroadcastLedger, Arc<ManualClock>) {
        let start = Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let ledger =
            BroadcastLedger::with_clock(Connection::open_in_memory().unwrap(), clock.clone())
                .unwrap();
        (ledger, clock)
    }

    #[test]
    fn append_assigns_increasing_ids_and_stamps() {
        let (ledger, clock) = ledger_with_clock();
        let first = ledger.append(entry("one", 1, 0)).unwrap();
        clock.advance(Duration::seconds(1));
        let second = ledger.append(entry("two", 0, 2)).unwrap();

        assert!(second.id > first.id);
        assert_eq!(second.timestamp - first.timestamp, Duration::seconds(1));
        assert_eq!(second.tally(), Tally { sent: 0, failed: 2, total: 2 });
    }

    #[test]
    fn append_rejects_inconsistent_tally() {
        let (ledger, _) = ledger_with_clock();
        let mut bad = entry("bad", 1, 1);
        bad.tally.total = 5;
        assert!(matches!(
            ledger.append(bad),
            Err(LedgerError::InconsistentTally { total: 5, .. })
        ));
        assert_eq!(ledger.count().unwrap(), 0);
    }

    #[test]
    fn list_is_newest_first_with_id_tiebreak() {
        let (ledger, clock) = ledger_with_clock();
        let a = ledger.append(entry("a", 1, 0)).unwrap();
        // Same instant: the later id must come first.
        let b = ledger.append(entry("b", 1, 0)).unwrap();
        clock.advance(Duration::minutes(1));
        let c = ledger.append(entry("c", 1, 0)).unwrap();

        let ids: Vec<i64> = ledger.list(None).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[test]
    fn limit_returns_head_of_full_listing() {
        let (ledger, clock) = ledger_with_clock();
        for i in 0..5 {
            ledger.append(entry(&format!("m{i}"), 1, 0)).unwrap();
            clock.advance(Duration::seconds(10));
        }
        let full = ledger.list(None).unwrap();
        for n in [0, 1, 3, 5, 9] {
            let head = ledger.list(Some(n)).unwrap();
            assert_eq!(head.len(), n.min(full.len()));
            assert_eq!(&head[..], &full[..head.len()]);
        }
    }

    #[test]
    fn count_since_uses_inclusive_boundary() {
        let (ledger, clock) = ledger_with_clock();
        ledger.append(entry("old", 1, 0)).unwrap();
        clock.advance(Duration::hours(2));
        let boundary = clock.now();
        ledger.append(entry("new", 1, 0)).unwrap();

        assert_eq!(ledger.count().unwrap(), 2);
        assert_eq!(ledger.count_since(boundary).unwrap(), 1);
        assert_eq!(ledger.count_since(boundary + Duration::seconds(1)).unwrap(), 0);
    }

    #[test]
    fn concurrent_appends_get_distinct_increasing_ids() {
        let ledger = Arc::new(BroadcastLedger::new(Connection::open_in_memory().unwrap()).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    let ids: Vec<i64> = (0..10)
                        .map(|i| ledger.append(entry(&format!("{t}-{i}"), 1, 0)).unwrap().id)
                        .collect();
                    assert!(ids.windows(2).all(|w| w[0] < w[1]));
                    ids
                })
            })
            .collect();

        let mut ids: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 80);
        assert_eq!(ledger.count().unwrap(), 80);
    }
}
