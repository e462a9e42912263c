//! v001 -- Initial schema creation.
//!
//! Creates the single-row `device_identity` table.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Device identity (single row)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS device_identity (
    id         INTEGER PRIMARY KEY CHECK (id = 1),
    device_id  TEXT NOT NULL,               -- "dev-" + random hex
    created_at TEXT NOT NULL                -- ISO-8601 / RFC-3339
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
