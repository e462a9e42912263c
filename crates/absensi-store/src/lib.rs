//! # absensi-store
//!
//! Durable client-side storage for the attendance workflow, backed by
//! SQLite.  The only thing persisted is the device identity, which must
//! survive reloads so the server can enforce its per-device daily
//! registration policy.

pub mod database;
pub mod device;
pub mod migrations;

mod error;

pub use database::Database;
pub use device::{
    generate_device_id, get_or_create_device_id, load_existing_device_id, load_or_generate,
};
pub use error::StoreError;
