//! # absensi-media
//!
//! Client-side photo preprocessing and the face-presence gate.
//!
//! A captured photo is decoded, downscaled so neither edge exceeds
//! [`absensi_shared::constants::MAX_PHOTO_DIMENSION`], and re-encoded as
//! JPEG for upload (which also drops the original EXIF metadata).  The
//! grayscale raster of the same image is fed to an on-device face detector;
//! the photo is accepted only if a detected face is large enough in the
//! resized coordinate space.

pub mod detector;
pub mod gate;
pub mod pipeline;

pub use detector::{FaceBox, FaceDetector, SeetaDetector};
pub use gate::{FaceGate, PhotoEvaluation};
pub use pipeline::{preprocess, ProcessedPhoto};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Photo encode error: {0}")]
    Encode(String),

    #[error("Face model load error: {0}")]
    ModelLoad(String),

    #[error("Face detection error: {0}")]
    Detection(String),
}
