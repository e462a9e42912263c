//! Face detector seam.
//!
//! The production implementation wraps the SeetaFace frontal detector from
//! the `rustface` crate; tests substitute synthetic detectors through the
//! [`FaceDetector`] trait.

use image::GrayImage;
use tracing::info;

use crate::MediaError;

/// Axis-aligned face bounding box in pixels of the *processed* raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl FaceBox {
    /// Bounding-box area in pixels.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// A single-shot face detector operating on a grayscale raster.
///
/// Detection mutates internal pyramid buffers, hence `&mut self`; the gate
/// serializes access so only one photo is evaluated at a time.
pub trait FaceDetector: Send {
    fn detect(&mut self, gray: &GrayImage) -> Result<Vec<FaceBox>, MediaError>;
}

/// SeetaFace frontal detector backed by `rustface`.
pub struct SeetaDetector {
    inner: Box<dyn rustface::Detector>,
}

// SAFETY: `rustface::create_detector` always returns a `FuStDetector`, which
// owns only `Send` data; the `Box<dyn Detector>` return type merely erases
// the auto trait.
unsafe impl Send for SeetaDetector {}

impl SeetaDetector {
    /// Load the detector model from disk.  This is the expensive cold-start
    /// step; the gate calls it once and memoizes the result.
    pub fn from_model_file(path: &str) -> Result<Self, MediaError> {
        let mut inner =
            rustface::create_detector(path).map_err(|e| MediaError::ModelLoad(e.to_string()))?;

        inner.set_min_face_size(20);
        inner.set_score_thresh(2.0);
        inner.set_pyramid_scale_factor(0.8);
        inner.set_slide_window_step(4, 4);

        info!(model = path, "face detector loaded");
        Ok(Self { inner })
    }
}

impl FaceDetector for SeetaDetector {
    fn detect(&mut self, gray: &GrayImage) -> Result<Vec<FaceBox>, MediaError> {
        let (width, height) = gray.dimensions();
        let mut image = rustface::ImageData::new(gray.as_raw(), width, height);

        let faces = self.inner.detect(&mut image);

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceBox {
                    x: bbox.x(),
                    y: bbox.y(),
                    width: bbox.width(),
                    height: bbox.height(),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_is_width_times_height() {
        let bbox = FaceBox {
            x: 10,
            y: 20,
            width: 40,
            height: 30,
        };
        assert_eq!(bbox.area(), 1200);
    }
}
