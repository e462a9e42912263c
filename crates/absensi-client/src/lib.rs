//! # absensi-client
//!
//! Orchestrates the student attendance submission workflow: device
//! identity and registration, geolocation, on-device face gating of the
//! photo, client-side form checks, and the token-then-upload exchange
//! with the server.
//!
//! [`Workflow`] is the facade a frontend drives; all state it renders
//! lives behind [`state::SharedState`].

pub mod busy;
pub mod config;
pub mod geo;
pub mod photo;
pub mod registration;
pub mod state;
pub mod submit;

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use absensi_media::FaceGate;
use absensi_net::{ApiClient, ApiError, SubmitReceipt};
use absensi_shared::validate::digits_only;
use absensi_shared::{AttendanceDraft, GeoFix, Location, SessionKind};

pub use busy::BusyIndicator;
pub use config::ClientConfig;
pub use geo::{GeoAcquirer, LocationProvider};
pub use photo::PhotoError;
pub use registration::RegistrationError;
pub use state::{shared_state, AppState, SharedState, StatePoisoned, SubmitPhase};
pub use submit::{receipt_summary, SubmitError};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    #[error(transparent)]
    State(#[from] StatePoisoned),
}

impl From<RegistrationError> for WorkflowError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::Api(e) => Self::Api(e),
            RegistrationError::State(e) => Self::State(e),
        }
    }
}

/// The attendance submission workflow.
///
/// Cheap to clone-by-part: every field is shared, so concurrent calls
/// (a photo evaluation while locations load) coordinate through the one
/// [`SharedState`] and [`BusyIndicator`].
pub struct Workflow {
    state: SharedState,
    api: Arc<ApiClient>,
    gate: Arc<FaceGate>,
    busy: BusyIndicator,
    geo: GeoAcquirer,
}

impl Workflow {
    /// Build a workflow from configuration and a platform location
    /// provider.
    pub fn new(
        config: &ClientConfig,
        provider: Arc<dyn LocationProvider>,
    ) -> Result<Self, WorkflowError> {
        Ok(Self {
            state: shared_state(),
            api: Arc::new(ApiClient::new(&config.api_base)?),
            gate: Arc::new(FaceGate::new(&config.face_model_path)),
            busy: BusyIndicator::new(),
            geo: GeoAcquirer::new(provider),
        })
    }

    /// Build a workflow from pre-constructed parts.
    pub fn from_parts(api: ApiClient, gate: FaceGate, geo: GeoAcquirer) -> Self {
        Self {
            state: shared_state(),
            api: Arc::new(api),
            gate: Arc::new(gate),
            busy: BusyIndicator::new(),
            geo,
        }
    }

    /// Shared state handle, for rendering.
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Busy indicator handle, for rendering.
    pub fn busy(&self) -> &BusyIndicator {
        &self.busy
    }

    /// Startup pass: if a device identity already exists on disk, load it
    /// and re-register it for today.  A fresh installation is left alone
    /// until the student asks for an id.
    pub async fn bootstrap(&self) -> Result<Option<String>, WorkflowError> {
        let existing = tokio::task::spawn_blocking(|| {
            absensi_store::Database::new()
                .and_then(|db| absensi_store::load_existing_device_id(&db))
        })
        .await;

        let device_id = match existing {
            Ok(Ok(Some(id))) => id,
            Ok(Ok(None)) => return Ok(None),
            Ok(Err(e)) => {
                warn!(error = %e, "device storage unavailable at startup");
                return Ok(None);
            }
            Err(e) => {
                warn!(error = %e, "device load task failed");
                return Ok(None);
            }
        };

        state::lock(&self.state)?.device_id = Some(device_id.clone());
        info!(device_id, "existing device identity loaded");

        registration::register(&self.state, &self.api, &self.busy, &device_id).await?;
        Ok(Some(device_id))
    }

    /// "Get Device ID": load or create the persistent identity and
    /// register it for today.
    pub async fn acquire_device(&self) -> Result<String, WorkflowError> {
        let device_id = match tokio::task::spawn_blocking(absensi_store::load_or_generate).await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "device load task failed, using ephemeral id");
                absensi_store::generate_device_id()
            }
        };

        state::lock(&self.state)?.device_id = Some(device_id.clone());

        registration::register(&self.state, &self.api, &self.busy, &device_id).await?;
        Ok(device_id)
    }

    /// Load the geofenced locations and default-select the first one if
    /// nothing is selected yet.
    pub async fn load_locations(&self) -> Result<Vec<Location>, WorkflowError> {
        let locations = self.api.public_locations().await?;
        install_locations(&self.state, locations.clone())?;
        Ok(locations)
    }

    /// Request a fresh geolocation fix.
    pub async fn acquire_location(&self) -> Result<GeoFix, StatePoisoned> {
        self.geo.acquire(&self.state, &self.busy).await
    }

    /// Evaluate a captured or picked photo and install it as the current
    /// candidate.  Returns whether a face was detected.
    pub async fn select_photo(&self, raw: Vec<u8>) -> Result<bool, PhotoError> {
        photo::select_photo(&self.state, &self.gate, &self.busy, raw).await
    }

    /// Validate and submit the attendance.
    pub async fn submit(&self) -> Result<SubmitReceipt, SubmitError> {
        submit::submit(&self.state, &self.api, &self.busy).await
    }

    /// Apply an arbitrary edit to the draft.
    pub fn update_draft(
        &self,
        edit: impl FnOnce(&mut AttendanceDraft),
    ) -> Result<(), StatePoisoned> {
        edit(&mut state::lock(&self.state)?.draft);
        Ok(())
    }

    pub fn set_session(&self, jenis: SessionKind) -> Result<(), StatePoisoned> {
        self.update_draft(|d| d.jenis = jenis)
    }

    /// NIM input is normalized to digits as the student types.
    pub fn set_nim(&self, raw: &str) -> Result<(), StatePoisoned> {
        self.update_draft(|d| d.nim = digits_only(raw))
    }

    pub fn set_location(&self, loc_id: i64) -> Result<(), StatePoisoned> {
        state::lock(&self.state)?.selected_location = Some(loc_id);
        Ok(())
    }
}

/// Store freshly loaded locations and default-select the first one when
/// there is no current selection.
fn install_locations(state: &SharedState, locations: Vec<Location>) -> Result<(), StatePoisoned> {
    let mut s = state::lock(state)?;
    if s.selected_location.is_none() {
        s.selected_location = locations.first().map(|l| l.id);
    }
    s.locations = locations;
    Ok(())
}

/// Initialize structured logging from `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(id: i64, name: &str) -> Location {
        Location {
            id,
            name: name.into(),
            lat: 3.6,
            lon: 98.7,
            radius_m: 100.0,
        }
    }

    #[test]
    fn install_locations_defaults_to_first() {
        let state = shared_state();
        install_locations(&state, vec![loc(5, "Gedung A"), loc(9, "Gedung B")]).unwrap();

        let s = state.lock().unwrap();
        assert_eq!(s.selected_location, Some(5));
        assert_eq!(s.locations.len(), 2);
    }

    #[test]
    fn install_locations_keeps_existing_selection() {
        let state = shared_state();
        state.lock().unwrap().selected_location = Some(9);
        install_locations(&state, vec![loc(5, "Gedung A"), loc(9, "Gedung B")]).unwrap();

        assert_eq!(state.lock().unwrap().selected_location, Some(9));
    }

    #[test]
    fn nim_input_is_normalized_to_digits() {
        let workflow = Workflow::from_parts(
            ApiClient::new("http://localhost:3000").unwrap(),
            FaceGate::with_detector(Box::new(NoFace)),
            GeoAcquirer::unsupported(),
        );

        workflow.set_nim(" 23-12 34a56 ").unwrap();
        assert_eq!(workflow.state().lock().unwrap().draft.nim, "23123456");
    }

    struct NoFace;

    impl absensi_media::FaceDetector for NoFace {
        fn detect(
            &mut self,
            _gray: &image::GrayImage,
        ) -> Result<Vec<absensi_media::FaceBox>, absensi_media::MediaError> {
            Ok(vec![])
        }
    }
}
