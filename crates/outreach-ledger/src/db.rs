use rusqlite::Connection;

use crate::error::Result;

/// Initialise the broadcasts table.
///
/// `AUTOINCREMENT` keeps ids from ever being reused. `created_at` is a
/// fixed-width RFC3339 string so text ordering equals time ordering.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS broadcasts (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            message     TEXT NOT NULL,
            channel     TEXT NOT NULL,
            sent        INTEGER NOT NULL,
            failed      INTEGER NOT NULL,
            total       INTEGER NOT NULL,
            created_at  TEXT NOT NULL,
            CHECK (sent + failed = total)
        );
        CREATE INDEX IF NOT EXISTS idx_broadcasts_recency
            ON broadcasts(created_at DESC, id DESC);",
    )?;
    Ok(())
}
