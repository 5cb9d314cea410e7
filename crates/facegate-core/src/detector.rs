//! Cascade face localizer backed by the SeetaFace funnel cascade.
//!
//! Runs a pretrained multi-scale sliding-window cascade over the
//! grayscale image, selects the first reported region, and crops it from
//! the original color image onto a fixed 128×128 canvas.
//!
//! Region selection deliberately takes the first detection rather than
//! ranking by area or score; the deployment assumption is a single face
//! per capture. Changing this would change acceptance behavior.

use crate::FACE_CROP_SIZE;
use image::{imageops, imageops::FilterType, RgbImage};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

// --- Cascade configuration ---
/// Smallest detectable face, in pixels.
const MIN_FACE_SIZE: u32 = 100;
/// Ratio between adjacent pyramid levels (a 1.3× multi-scale step).
const PYRAMID_SCALE_FACTOR: f32 = 1.0 / 1.3;
/// Minimum cascade score for a window to count as a face.
const SCORE_THRESHOLD: f64 = 2.0;
/// Sliding-window step in both axes.
const SLIDE_WINDOW_STEP: u32 = 4;

#[derive(Error, Debug)]
pub enum LocalizerError {
    #[error("cascade model file not found: {0}")]
    ModelNotFound(String),
    #[error("failed to load cascade model: {0}")]
    ModelLoad(String),
    #[error("no face detected")]
    NoFaceDetected,
}

/// A detected face region in original-image coordinates.
///
/// Coordinates may extend past the image edge; [`clamp_region`] brings
/// them back in bounds before cropping.
#[derive(Debug, Clone, Copy)]
pub struct FaceRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub score: f64,
}

/// Locates the face to authenticate against in a decoded image.
///
/// Seam for tests and alternative detectors; the engine is generic over
/// this trait.
pub trait Localizer {
    /// Find the most prominent face and return it as a 128×128 RGB crop.
    fn localize(&self, image: &RgbImage) -> Result<RgbImage, LocalizerError>;
}

/// SeetaFace-funnel-cascade localizer.
///
/// The model is parsed once at load time; rustface detectors are
/// `&mut`-stateful, so a fresh detector is built from the shared model on
/// each call, keeping `localize` usable through `&self`.
pub struct CascadeLocalizer {
    model: rustface::Model,
}

impl CascadeLocalizer {
    /// Load the SeetaFace cascade model from the given path.
    pub fn load(model_path: &str) -> Result<Self, LocalizerError> {
        if !Path::new(model_path).exists() {
            return Err(LocalizerError::ModelNotFound(model_path.to_string()));
        }

        let file = File::open(model_path)
            .map_err(|e| LocalizerError::ModelLoad(format!("{model_path}: {e}")))?;
        let model = rustface::read_model(BufReader::new(file))
            .map_err(|e| LocalizerError::ModelLoad(format!("{model_path}: {e}")))?;

        tracing::info!(path = model_path, "cascade model loaded");
        Ok(Self { model })
    }

    /// Run the cascade over the grayscale image, returning every region
    /// in detector order.
    pub fn detect(&self, image: &RgbImage) -> Vec<FaceRegion> {
        let gray = imageops::grayscale(image);
        let (width, height) = gray.dimensions();

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(MIN_FACE_SIZE);
        detector.set_score_thresh(SCORE_THRESHOLD);
        detector.set_pyramid_scale_factor(PYRAMID_SCALE_FACTOR);
        detector.set_slide_window_step(SLIDE_WINDOW_STEP, SLIDE_WINDOW_STEP);

        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));

        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceRegion {
                    x: bbox.x(),
                    y: bbox.y(),
                    width: bbox.width(),
                    height: bbox.height(),
                    score: face.score(),
                }
            })
            .collect()
    }
}

impl Localizer for CascadeLocalizer {
    fn localize(&self, image: &RgbImage) -> Result<RgbImage, LocalizerError> {
        let regions = self.detect(image);
        tracing::debug!(count = regions.len(), "cascade regions");

        // First region as reported, no size or score ranking.
        let region = regions.first().ok_or(LocalizerError::NoFaceDetected)?;
        let (x, y, w, h) = clamp_region(region, image.width(), image.height())
            .ok_or(LocalizerError::NoFaceDetected)?;

        Ok(crop_to_canvas(image, x, y, w, h))
    }
}

/// Clamp a detected region to image bounds.
///
/// Returns `None` when nothing of the region remains inside the image.
pub fn clamp_region(region: &FaceRegion, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let x0 = region.x.max(0) as u32;
    let y0 = region.y.max(0) as u32;
    if x0 >= width || y0 >= height {
        return None;
    }

    let x1 = (region.x.saturating_add(region.width as i32)).max(0) as u32;
    let y1 = (region.y.saturating_add(region.height as i32)).max(0) as u32;
    let w = x1.min(width) - x0;
    let h = y1.min(height) - y0;
    if w == 0 || h == 0 {
        return None;
    }

    Some((x0, y0, w, h))
}

/// Crop the region from the color image and resize it onto the fixed
/// 128×128 canvas with bilinear filtering.
pub fn crop_to_canvas(image: &RgbImage, x: u32, y: u32, w: u32, h: u32) -> RgbImage {
    let crop = imageops::crop_imm(image, x, y, w, h).to_image();
    imageops::resize(&crop, FACE_CROP_SIZE, FACE_CROP_SIZE, FilterType::Triangle)
}
