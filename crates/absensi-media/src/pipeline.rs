//! Decode, downscale, and re-encode a captured photo.

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use tracing::debug;

use absensi_shared::constants::{MAX_PHOTO_DIMENSION, PHOTO_JPEG_QUALITY};

use crate::MediaError;

/// A preprocessed photo: the JPEG payload that will be uploaded and the
/// grayscale raster the detector runs on.  Both share the same (resized)
/// dimensions, so bounding boxes measured on `gray` are in upload pixels.
pub struct ProcessedPhoto {
    /// JPEG re-encode of the resized image (EXIF from the capture is gone).
    pub jpeg: Bytes,
    pub width: u32,
    pub height: u32,
    /// Grayscale raster for face detection.
    pub gray: GrayImage,
}

/// Decode `raw`, downscale so neither edge exceeds
/// [`MAX_PHOTO_DIMENSION`] (aspect ratio preserved, never upscaled), and
/// re-encode as JPEG at quality [`PHOTO_JPEG_QUALITY`].
pub fn preprocess(raw: &[u8]) -> Result<ProcessedPhoto, MediaError> {
    let decoded = image::load_from_memory(raw)?;
    let (orig_w, orig_h) = (decoded.width(), decoded.height());

    let resized = if orig_w > MAX_PHOTO_DIMENSION || orig_h > MAX_PHOTO_DIMENSION {
        decoded.resize(MAX_PHOTO_DIMENSION, MAX_PHOTO_DIMENSION, FilterType::Triangle)
    } else {
        decoded
    };

    let (width, height) = (resized.width(), resized.height());

    debug!(
        orig_w,
        orig_h, width, height, "photo preprocessed"
    );

    let jpeg = encode_jpeg(&resized)?;
    let gray = resized.to_luma8();

    Ok(ProcessedPhoto {
        jpeg: Bytes::from(jpeg),
        width,
        height,
        gray,
    })
}

fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>, MediaError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buf);
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, PHOTO_JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| MediaError::Encode(e.to_string()))?;
    Ok(buf)
}
