//! Geolocation acquisition.
//!
//! The platform location capability is abstracted behind the
//! [`LocationProvider`] port and wrapped in an awaitable request: the
//! provider races a fixed timeout, the busy overlay stays up for the
//! duration, and the outcome overwrites the shared [`GeoFix`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use absensi_shared::constants::{BUSY_TIMEOUT_SECS, GEO_TIMEOUT_SECS};
use absensi_shared::GeoFix;

use crate::busy::BusyIndicator;
use crate::state::{lock, SharedState, StatePoisoned};

/// A single position report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

/// Acquisition settings handed to the provider on every request.
#[derive(Debug, Clone, Copy)]
pub struct GeoOptions {
    /// Ask the platform for its most accurate source.
    pub high_accuracy: bool,
    /// Reject any cached fix older than this. Zero means always fresh.
    pub maximum_age: Duration,
}

impl Default for GeoOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age: Duration::ZERO,
        }
    }
}

/// Platform-reported acquisition failure.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Geolocation tidak didukung")]
    Unsupported,

    #[error("{0}")]
    Platform(String),
}

/// Port to the platform location API.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self, options: GeoOptions) -> Result<Position, GeoError>;
}

/// Awaitable wrapper over a [`LocationProvider`] with status tracking.
///
/// One request at a time: the workflow disables the trigger while a
/// request is pending instead of deduplicating here.
pub struct GeoAcquirer {
    provider: Option<Arc<dyn LocationProvider>>,
    options: GeoOptions,
    timeout: Duration,
}

impl GeoAcquirer {
    pub fn new(provider: Arc<dyn LocationProvider>) -> Self {
        Self {
            provider: Some(provider),
            options: GeoOptions::default(),
            timeout: Duration::from_secs(GEO_TIMEOUT_SECS),
        }
    }

    /// Acquirer for a platform without any location capability. Every
    /// request yields an `Error` fix.
    pub fn unsupported() -> Self {
        Self {
            provider: None,
            options: GeoOptions::default(),
            timeout: Duration::from_secs(GEO_TIMEOUT_SECS),
        }
    }

    /// Request a fresh position and overwrite the shared fix.
    ///
    /// The busy overlay is held for the whole request.  The returned
    /// [`GeoFix`] is the same value written into state.
    pub async fn acquire(
        &self,
        state: &SharedState,
        busy: &BusyIndicator,
    ) -> Result<GeoFix, StatePoisoned> {
        lock(state)?.geo = GeoFix::Requesting;
        busy.start("Mengambil lokasi GPS...", Duration::from_secs(BUSY_TIMEOUT_SECS));

        let fix = match &self.provider {
            None => GeoFix::Error(GeoError::Unsupported.to_string()),
            Some(provider) => {
                match tokio::time::timeout(self.timeout, provider.current_position(self.options))
                    .await
                {
                    Ok(Ok(pos)) => GeoFix::Ok {
                        lat: pos.lat,
                        lon: pos.lon,
                    },
                    Ok(Err(e)) => GeoFix::Error(e.to_string()),
                    Err(_) => GeoFix::Error("Timeout mengambil lokasi".to_string()),
                }
            }
        };

        busy.stop();

        match &fix {
            GeoFix::Ok { lat, lon } => debug!(lat, lon, "geolocation acquired"),
            GeoFix::Error(msg) => warn!(error = %msg, "geolocation failed"),
            _ => {}
        }

        lock(state)?.geo = fix.clone();
        Ok(fix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::shared_state;

    struct FixedProvider {
        position: Position,
    }

    #[async_trait]
    impl LocationProvider for FixedProvider {
        async fn current_position(&self, _options: GeoOptions) -> Result<Position, GeoError> {
            Ok(self.position)
        }
    }

    struct DeniedProvider;

    #[async_trait]
    impl LocationProvider for DeniedProvider {
        async fn current_position(&self, _options: GeoOptions) -> Result<Position, GeoError> {
            Err(GeoError::Platform("User denied Geolocation".into()))
        }
    }

    struct HungProvider;

    #[async_trait]
    impl LocationProvider for HungProvider {
        async fn current_position(&self, _options: GeoOptions) -> Result<Position, GeoError> {
            std::future::pending().await
        }
    }

    /// Provider that records whether the busy overlay was up while the
    /// platform request ran.
    struct OverlayRecordingProvider {
        busy: BusyIndicator,
        seen_active: std::sync::Arc<std::sync::atomic::AtomicBool>,
    }

    #[async_trait]
    impl LocationProvider for OverlayRecordingProvider {
        async fn current_position(&self, _options: GeoOptions) -> Result<Position, GeoError> {
            self.seen_active
                .store(self.busy.is_active(), std::sync::atomic::Ordering::SeqCst);
            Ok(Position { lat: 1.0, lon: 2.0 })
        }
    }

    #[tokio::test]
    async fn success_writes_ok_fix() {
        let state = shared_state();
        let busy = BusyIndicator::new();
        let acquirer = GeoAcquirer::new(Arc::new(FixedProvider {
            position: Position { lat: 3.6, lon: 98.7 },
        }));

        let fix = acquirer.acquire(&state, &busy).await.unwrap();
        assert_eq!(fix, GeoFix::Ok { lat: 3.6, lon: 98.7 });
        assert_eq!(state.lock().unwrap().geo, fix);
    }

    #[tokio::test]
    async fn denial_writes_platform_message() {
        let state = shared_state();
        let busy = BusyIndicator::new();
        let acquirer = GeoAcquirer::new(Arc::new(DeniedProvider));

        let fix = acquirer.acquire(&state, &busy).await.unwrap();
        assert_eq!(fix, GeoFix::Error("User denied Geolocation".into()));
    }

    #[tokio::test]
    async fn missing_capability_is_unsupported() {
        let state = shared_state();
        let busy = BusyIndicator::new();
        let acquirer = GeoAcquirer::unsupported();

        let fix = acquirer.acquire(&state, &busy).await.unwrap();
        assert_eq!(fix, GeoFix::Error("Geolocation tidak didukung".into()));
        assert!(!busy.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_platform_times_out() {
        let state = shared_state();
        let busy = BusyIndicator::new();
        let acquirer = GeoAcquirer::new(Arc::new(HungProvider));

        let fix = acquirer.acquire(&state, &busy).await.unwrap();
        assert_eq!(fix, GeoFix::Error("Timeout mengambil lokasi".into()));
        assert!(!state.lock().unwrap().geo.is_ok());
        assert!(!busy.is_active());
    }

    #[tokio::test]
    async fn overlay_is_up_during_the_request_and_cleared_after() {
        let state = shared_state();
        let busy = BusyIndicator::new();
        let seen_active = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let acquirer = GeoAcquirer::new(Arc::new(OverlayRecordingProvider {
            busy: busy.clone(),
            seen_active: seen_active.clone(),
        }));

        acquirer.acquire(&state, &busy).await.unwrap();
        assert!(seen_active.load(std::sync::atomic::Ordering::SeqCst));
        assert!(!busy.is_active());
    }
}
