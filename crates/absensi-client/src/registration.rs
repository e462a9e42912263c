//! Device registration with a stuck-state watchdog.
//!
//! Registration is a single POST, but the state it drives gates the whole
//! submission flow, so a request that never resolves must not leave the
//! state stuck on `Registering`.  A watchdog task forces the state to
//! `Error` after a fixed delay unless the request completed first; epoch
//! counters keep a late watchdog from clobbering a newer attempt.  The
//! busy overlay is up while the request is in flight.

use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use absensi_net::{ApiClient, ApiError};
use absensi_shared::constants::{BUSY_TIMEOUT_SECS, REGISTRATION_WATCHDOG_SECS};
use absensi_shared::RegistrationState;

use crate::busy::BusyIndicator;
use crate::state::{lock, SharedState, StatePoisoned};

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    #[error(transparent)]
    State(#[from] StatePoisoned),
}

/// Register `device_id` with the server, updating the shared
/// [`RegistrationState`] as the request progresses.
///
/// Safe to call again after a failure; each call supersedes any watchdog
/// armed by a previous one.
pub async fn register(
    state: &SharedState,
    api: &ApiClient,
    busy: &BusyIndicator,
    device_id: &str,
) -> Result<(), RegistrationError> {
    let epoch = {
        let mut s = lock(state)?;
        s.registration = RegistrationState::Registering;
        s.registration_epoch += 1;
        s.registration_epoch
    };

    spawn_watchdog(state.clone(), epoch);
    busy.start(
        "Registrasi perangkat...",
        Duration::from_secs(BUSY_TIMEOUT_SECS),
    );

    let outcome = api.register_device(device_id).await;
    busy.stop();

    let mut s = lock(state)?;
    // A watchdog or newer attempt already resolved this epoch.
    if s.registration_epoch != epoch || s.registration != RegistrationState::Registering {
        return outcome.map_err(RegistrationError::Api);
    }
    s.registration_epoch += 1;

    match outcome {
        Ok(()) => {
            s.registration = RegistrationState::Ok;
            info!(device_id, "device registered");
            Ok(())
        }
        Err(e) => {
            s.registration = RegistrationState::Error;
            warn!(device_id, error = %e, "device registration failed");
            Err(e.into())
        }
    }
}

/// Arm a one-shot timer that forces `Error` if the attempt identified by
/// `epoch` is still pending when it fires.
fn spawn_watchdog(state: SharedState, epoch: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(REGISTRATION_WATCHDOG_SECS)).await;
        if let Ok(mut s) = lock(&state) {
            if s.registration_epoch == epoch && s.registration == RegistrationState::Registering {
                warn!("registration watchdog fired, forcing error state");
                s.registration = RegistrationState::Error;
                s.registration_epoch += 1;
            }
        }
    });
}
