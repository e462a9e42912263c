//! Shared workflow state.
//!
//! [`AppState`] is wrapped in `Arc<Mutex<>>` and read or mutated by every
//! workflow operation.  Handlers lock, mutate, and drop the guard before
//! any await point, so mutations between suspension points are atomic.

use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;

use absensi_shared::{AttendanceDraft, GeoFix, Location, RegistrationState};

/// A selected photo after preprocessing and face evaluation.
///
/// Replaced wholesale on every new selection; `face_detected` only ever
/// refers to the evaluation of exactly these `jpeg` bytes.
#[derive(Debug, Clone)]
pub struct PhotoCandidate {
    /// The preprocessed JPEG that was evaluated and will be uploaded.
    pub jpeg: Bytes,
    pub width: u32,
    pub height: u32,
    /// Whether the face-presence gate accepted this photo.
    pub face_detected: bool,
}

/// Submission state machine.  Invalid combinations (uploading while idle)
/// are unrepresentable; any non-`Idle` phase blocks a new submit action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitPhase {
    #[default]
    Idle,
    Validating,
    RequestingToken,
    Uploading,
    Done,
}

/// Central workflow state.
#[derive(Debug, Default)]
pub struct AppState {
    /// Locally generated device identifier.  `None` until loaded/created.
    pub device_id: Option<String>,

    /// Device registration progress for today.
    pub registration: RegistrationState,

    /// Bumped whenever the registration state changes through a normal
    /// completion; a watchdog only fires if its epoch is still current.
    pub registration_epoch: u64,

    /// Latest geolocation acquisition result.
    pub geo: GeoFix,

    /// Geofenced locations loaded from the server.
    pub locations: Vec<Location>,

    /// Currently selected location id.
    pub selected_location: Option<i64>,

    /// Everything the student has typed so far.
    pub draft: AttendanceDraft,

    /// The current photo selection, if any.
    pub photo: Option<PhotoCandidate>,

    /// Bumped on every new photo selection; a finished evaluation is
    /// discarded if its epoch is no longer current.
    pub photo_epoch: u64,

    /// Submission orchestrator phase.
    pub phase: SubmitPhase,
}

/// Shared handle to the workflow state.
pub type SharedState = Arc<Mutex<AppState>>;

/// Create a fresh shared state.
pub fn shared_state() -> SharedState {
    Arc::new(Mutex::new(AppState::default()))
}

/// The state mutex was poisoned by a panicking holder.
#[derive(Debug, thiserror::Error)]
#[error("State lock poisoned")]
pub struct StatePoisoned;

/// Lock the shared state, converting poisoning into a typed error.
pub fn lock(state: &SharedState) -> Result<MutexGuard<'_, AppState>, StatePoisoned> {
    state.lock().map_err(|_| StatePoisoned)
}
