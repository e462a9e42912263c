//! Photo selection.
//!
//! Each selected photo is preprocessed and run through the face-presence
//! gate off the async runtime.  The previous candidate is cleared the
//! moment a new selection starts, so a submission can never pick up a
//! photo whose evaluation belongs to older bytes.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use absensi_media::{FaceGate, MediaError};
use absensi_shared::constants::BUSY_TIMEOUT_SECS;

use crate::busy::BusyIndicator;
use crate::state::{lock, PhotoCandidate, SharedState, StatePoisoned};

#[derive(Debug, Error)]
pub enum PhotoError {
    /// The bytes could not be decoded or evaluated.
    #[error("Gagal memproses foto. Coba lagi.")]
    Evaluation(#[source] MediaError),

    /// A newer selection started while this one was being evaluated.
    #[error("Foto digantikan oleh pilihan yang lebih baru.")]
    Superseded,

    /// The evaluation task was cancelled or panicked.
    #[error("Gagal memproses foto. Coba lagi.")]
    Internal,

    #[error(transparent)]
    State(#[from] StatePoisoned),
}

/// Evaluate `raw` and install it as the current photo candidate.
///
/// Returns whether the gate detected a face in the installed candidate.
pub async fn select_photo(
    state: &SharedState,
    gate: &Arc<FaceGate>,
    busy: &BusyIndicator,
    raw: Vec<u8>,
) -> Result<bool, PhotoError> {
    let epoch = {
        let mut s = lock(state)?;
        s.photo = None;
        s.photo_epoch += 1;
        s.photo_epoch
    };

    busy.start("Memeriksa foto...", Duration::from_secs(BUSY_TIMEOUT_SECS));

    let gate = Arc::clone(gate);
    let evaluated = tokio::task::spawn_blocking(move || gate.evaluate(&raw)).await;

    busy.stop();

    let evaluation = match evaluated {
        Ok(Ok(e)) => e,
        Ok(Err(e)) => {
            warn!(error = %e, "photo evaluation failed");
            return Err(PhotoError::Evaluation(e));
        }
        Err(e) => {
            warn!(error = %e, "photo evaluation task failed");
            return Err(PhotoError::Internal);
        }
    };

    let mut s = lock(state)?;
    if s.photo_epoch != epoch {
        return Err(PhotoError::Superseded);
    }

    info!(
        width = evaluation.width,
        height = evaluation.height,
        face = evaluation.face_present,
        "photo candidate installed"
    );
    let face_detected = evaluation.face_present;
    s.photo = Some(PhotoCandidate {
        jpeg: evaluation.jpeg,
        width: evaluation.width,
        height: evaluation.height,
        face_detected,
    });
    Ok(face_detected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::shared_state;
    use absensi_media::{FaceBox, FaceDetector};
    use image::{GrayImage, RgbImage};

    struct AlwaysFace;

    impl FaceDetector for AlwaysFace {
        fn detect(&mut self, _gray: &GrayImage) -> Result<Vec<FaceBox>, MediaError> {
            Ok(vec![FaceBox {
                x: 10,
                y: 10,
                width: 60,
                height: 60,
            }])
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(64, 48, image::Rgb([120, 120, 120]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn installs_candidate_with_face_flag() {
        let state = shared_state();
        let gate = Arc::new(FaceGate::with_detector(Box::new(AlwaysFace)));
        let busy = BusyIndicator::new();

        let face = select_photo(&state, &gate, &busy, png_bytes()).await.unwrap();
        assert!(face);

        let s = state.lock().unwrap();
        let photo = s.photo.as_ref().unwrap();
        assert!(photo.face_detected);
        assert_eq!((photo.width, photo.height), (64, 48));
        assert!(!busy.is_active());
    }

    #[tokio::test]
    async fn garbage_bytes_are_rejected_and_leave_no_candidate() {
        let state = shared_state();
        let gate = Arc::new(FaceGate::with_detector(Box::new(AlwaysFace)));
        let busy = BusyIndicator::new();

        let err = select_photo(&state, &gate, &busy, vec![0u8; 32])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Gagal memproses foto. Coba lagi.");

        let s = state.lock().unwrap();
        assert!(s.photo.is_none());
        assert!(!busy.is_active());
    }

    #[tokio::test]
    async fn stale_evaluation_is_discarded() {
        let state = shared_state();
        let gate = Arc::new(FaceGate::with_detector(Box::new(AlwaysFace)));
        let busy = BusyIndicator::new();

        let selection = select_photo(&state, &gate, &busy, png_bytes());

        // Bump the epoch while the first selection is awaiting its
        // evaluation, as a second selection would.
        let bump = async {
            tokio::task::yield_now().await;
            state.lock().unwrap().photo_epoch += 1;
        };

        let (result, ()) = tokio::join!(selection, bump);
        assert!(matches!(result.unwrap_err(), PhotoError::Superseded));
        assert!(state.lock().unwrap().photo.is_none());
    }
}
