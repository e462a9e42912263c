//! Face-presence gate: accept a photo only if it contains a face of
//! sufficient size, measured in resized pixels.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bytes::Bytes;
use tracing::{debug, warn};

use absensi_shared::constants::MIN_FACE_AREA;

use crate::detector::{FaceDetector, SeetaDetector};
use crate::pipeline::preprocess;
use crate::MediaError;

/// Outcome of evaluating one photo selection.
pub struct PhotoEvaluation {
    /// Whether a sufficiently large face was found.
    pub face_present: bool,
    /// The preprocessed JPEG that was evaluated — the only bytes that may
    /// be uploaded for this selection.
    pub jpeg: Bytes,
    pub width: u32,
    pub height: u32,
}

/// Lazily-initialized face-presence gate.
///
/// The detector model is loaded on the first [`FaceGate::evaluate`] call and
/// reused for the lifetime of the gate.  The gate is shared behind an `Arc`
/// and evaluates one photo at a time.
pub struct FaceGate {
    model_path: PathBuf,
    detector: Mutex<Option<Box<dyn FaceDetector>>>,
}

impl FaceGate {
    /// Gate backed by the SeetaFace model at `model_path` (loaded lazily).
    pub fn new(model_path: impl AsRef<Path>) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
            detector: Mutex::new(None),
        }
    }

    /// Gate with a pre-constructed detector.  Used by tests.
    pub fn with_detector(detector: Box<dyn FaceDetector>) -> Self {
        Self {
            model_path: PathBuf::new(),
            detector: Mutex::new(Some(detector)),
        }
    }

    /// Load the detector if it is not loaded yet.  Idempotent.
    pub fn ensure_ready(&self) -> Result<(), MediaError> {
        let mut guard = self
            .detector
            .lock()
            .map_err(|_| MediaError::Detection("detector lock poisoned".into()))?;

        if guard.is_none() {
            let path = self.model_path.to_string_lossy().into_owned();
            *guard = Some(Box::new(SeetaDetector::from_model_file(&path)?));
        }

        Ok(())
    }

    /// Preprocess `raw` and run face detection on the resized raster.
    ///
    /// Detector load or inference failures are errors; the caller treats
    /// them as a photo rejection with a generic message rather than letting
    /// them escape the flow.
    pub fn evaluate(&self, raw: &[u8]) -> Result<PhotoEvaluation, MediaError> {
        let photo = preprocess(raw)?;

        self.ensure_ready()?;

        let mut guard = self
            .detector
            .lock()
            .map_err(|_| MediaError::Detection("detector lock poisoned".into()))?;
        let detector = guard
            .as_mut()
            .ok_or_else(|| MediaError::Detection("detector unavailable".into()))?;

        let faces = detector.detect(&photo.gray)?;

        let largest = faces.iter().map(|f| f.area()).max().unwrap_or(0);
        let face_present = largest >= MIN_FACE_AREA;

        if face_present {
            debug!(faces = faces.len(), largest, "face accepted");
        } else {
            warn!(faces = faces.len(), largest, "no sufficiently large face");
        }

        Ok(PhotoEvaluation {
            face_present,
            jpeg: photo.jpeg,
            width: photo.width,
            height: photo.height,
        })
    }
}
