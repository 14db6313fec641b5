use rusqlite::Connection;

use crate::error::Result;

/// Initialise the subscribers table.
///
/// Safe to call on every startup: uses `IF NOT EXISTS` throughout.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS subscribers (
            phone       TEXT PRIMARY KEY,
            language    TEXT NOT NULL DEFAULT 'en',
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_subscribers_language
            ON subscribers(language);",
    )?;
    Ok(())
}
