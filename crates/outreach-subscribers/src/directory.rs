use std::sync::{Mutex, MutexGuard};

use outreach_core::Language;
use rusqlite::Connection;
use tracing::{debug, info, instrument};

use crate::db::init_db;
use crate::error::{Result, SubscriberError};
use crate::types::{Subscriber, SubscriberFilter};

/// Read access to the current subscriber set.
///
/// The dispatcher and the analytics aggregator only ever need a consistent
/// snapshot, so they depend on this trait rather than on the SQLite store.
pub trait SubscriberSource: Send + Sync {
    /// Every subscriber, ordered by phone. One call is one consistent read.
    fn all(&self) -> Result<Vec<Subscriber>>;
}

/// SQLite-backed subscriber directory.
///
/// Wraps a single connection in a `Mutex`; every method is one short
/// statement so contention stays negligible.
pub struct SubscriberDirectory {
    db: Mutex<Connection>,
}

impl SubscriberDirectory {
    /// Wrap an open connection, creating the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Opt a phone in, or update its language if it already exists.
    #[instrument(skip(self))]
    pub fn upsert(&self, phone: &str, language: Language) -> Result<Subscriber> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(SubscriberError::InvalidPhone(
                "phone must not be empty".to_string(),
            ));
        }

        let now = chrono::Utc::now().to_rfc3339();
        let db = self.conn();
        db.execute(
            "INSERT INTO subscribers (phone, language, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(phone) DO UPDATE SET
                 language   = excluded.language,
                 updated_at = excluded.updated_at",
            rusqlite::params![phone, language.as_str(), now],
        )?;
        info!(%phone, "subscriber upserted");

        Ok(Subscriber::new(phone, language))
    }

    /// Look up a single subscriber. The phone is matched after trimming, as stored.
    pub fn get(&self, phone: &str) -> Result<Option<Subscriber>> {
        let phone = phone.trim();
        let db = self.conn();
        match db.query_row(
            "SELECT phone, language FROM subscribers WHERE phone = ?1",
            rusqlite::params![phone],
            row_to_subscriber,
        ) {
            Ok(s) => Ok(Some(s)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(SubscriberError::Database(e)),
        }
    }

    /// Remove a subscriber. Fails with `NotFound` if the phone is unknown.
    #[instrument(skip(self))]
    pub fn remove(&self, phone: &str) -> Result<()> {
        let phone = phone.trim();
        let db = self.conn();
        let rows_changed = db.execute(
            "DELETE FROM subscribers WHERE phone = ?1",
            rusqlite::params![phone],
        )?;
        if rows_changed == 0 {
            return Err(SubscriberError::NotFound {
                phone: phone.to_string(),
            });
        }
        info!(%phone, "subscriber removed");
        Ok(())
    }

    /// Subscribers matching `filter`, ordered by phone.
    #[instrument(skip(self))]
    pub fn search(&self, filter: &SubscriberFilter) -> Result<Vec<Subscriber>> {
        let query = filter
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());
        let language = filter.language.map(|l| l.as_str());

        let db = self.conn();
        let mut stmt = db.prepare_cached(
            "SELECT phone, language FROM subscribers
             WHERE (?1 IS NULL OR instr(lower(phone), lower(?1)) > 0)
               AND (?2 IS NULL OR language = ?2)
             ORDER BY phone",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![query, language], row_to_subscriber)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(matched = rows.len(), "subscriber search");
        Ok(rows)
    }

    /// Number of subscribers.
    pub fn count(&self) -> Result<u64> {
        let db = self.conn();
        let n: i64 = db.query_row("SELECT COUNT(*) FROM subscribers", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

impl SubscriberSource for SubscriberDirectory {
    fn all(&self) -> Result<Vec<Subscriber>> {
        self.search(&SubscriberFilter::default())
    }
}

/// Map a SQLite row to a `Subscriber`.
///
/// Rows written by other tools may carry an unknown language tag; those fall
/// back to English rather than disappearing from the directory.
fn row_to_subscriber(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subscriber> {
    let phone: String = row.get(0)?;
    let language: String = row.get(1)?;
    Ok(Subscriber {
        phone,
        language: language.parse().unwrap_or_default(),
    })
}
