//! Persistent device identity.
//!
//! A device id is generated once per installation, stored in a single-row
//! table, and returned unchanged on every later call.  It identifies the
//! device for the server's daily registration reset; it is never rotated
//! by the client.

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{info, warn};

use absensi_shared::constants::DEVICE_ID_PREFIX;

use crate::database::Database;
use crate::error::Result;

/// Generate a fresh device id.
///
/// Randomness comes from the OS CSPRNG; if that is unavailable the id
/// falls back to current-time-plus-PRNG, which is unique enough for a
/// per-device tag.
pub fn generate_device_id() -> String {
    let mut buf = [0u8; 8];
    match OsRng.try_fill_bytes(&mut buf) {
        Ok(()) => format!("{DEVICE_ID_PREFIX}{}", hex::encode(buf)),
        Err(e) => {
            warn!(error = %e, "OS RNG unavailable, using timestamp fallback");
            let millis = chrono::Utc::now().timestamp_millis();
            format!("{DEVICE_ID_PREFIX}{millis:x}{:x}", rand::random::<u32>())
        }
    }
}

/// Return the stored device id, creating and persisting one on first call.
pub fn get_or_create_device_id(db: &Database) -> Result<String> {
    let existing: std::result::Result<String, rusqlite::Error> = db.conn().query_row(
        "SELECT device_id FROM device_identity WHERE id = 1",
        [],
        |row| row.get(0),
    );

    if let Ok(id) = existing {
        return Ok(id);
    }

    let id = generate_device_id();
    db.conn().execute(
        "INSERT OR REPLACE INTO device_identity (id, device_id, created_at) VALUES (1, ?1, ?2)",
        rusqlite::params![id, chrono::Utc::now().to_rfc3339()],
    )?;

    info!(device_id = %id, "device identity created");
    Ok(id)
}

/// Return the stored device id without creating one.
///
/// Used at startup to decide whether a previous installation already has
/// an identity worth auto-registering.
pub fn load_existing_device_id(db: &Database) -> Result<Option<String>> {
    use rusqlite::OptionalExtension;

    let id = db
        .conn()
        .query_row(
            "SELECT device_id FROM device_identity WHERE id = 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Fail-soft loader: open the default database and read or create the
/// device id.  If storage is inaccessible, return a fresh non-persisted id
/// rather than an error — callers must tolerate an id that may change on
/// the next call.
pub fn load_or_generate() -> String {
    match Database::new().and_then(|db| get_or_create_device_id(&db)) {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "device storage unavailable, using ephemeral id");
            generate_device_id()
        }
    }
}
