//! Conversion of arbitrary input images onto the canonical canvas.
//!
//! Steps: luminance, inversion (ink becomes bright), fixed midpoint
//! threshold, then bilinear resampling to `CANVAS_SIZE` followed by a
//! second snap to binary.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

use crate::canvas::{BACKGROUND, CANVAS_SIZE, Canvas, FOREGROUND};
use crate::{ExtractError, Result};

/// Inverted luminance values strictly above this become foreground.
pub const THRESHOLD: u8 = 127;

/// Convert a decoded color or grayscale image into a [`Canvas`].
pub fn binarize(img: &DynamicImage) -> Canvas {
    let (width, height) = (img.width(), img.height());
    debug!(width, height, "Binarizing input image");

    let mut gray = img.to_luma8();
    image::imageops::invert(&mut gray);
    let binary = threshold_convert(&gray, THRESHOLD);

    if (width, height) == (CANVAS_SIZE, CANVAS_SIZE) {
        return Canvas::rebinarize(binary);
    }

    debug!(
        orig_w = width,
        orig_h = height,
        size = CANVAS_SIZE,
        "Resampling to canvas size"
    );
    let resized = image::imageops::resize(&binary, CANVAS_SIZE, CANVAS_SIZE, FilterType::Triangle);
    Canvas::rebinarize(resized)
}

/// Load an image file and binarize it.
pub fn load_canvas(path: impl AsRef<Path>) -> Result<Canvas> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|e| ExtractError::InputUnavailable {
        source_name: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(binarize(&img))
}

/// Decode an in-memory encoded image (PNG, JPEG, ...) and binarize it.
///
/// `source_name` only labels the error.
pub fn canvas_from_bytes(bytes: &[u8], source_name: &str) -> Result<Canvas> {
    let img = image::load_from_memory(bytes).map_err(|e| ExtractError::InputUnavailable {
        source_name: source_name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(binarize(&img))
}

/// Pixels strictly above `threshold` become [`FOREGROUND`], the rest [`BACKGROUND`].
pub fn threshold_convert(img: &GrayImage, threshold: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = GrayImage::new(width, height);
    for (x, y, px) in img.enumerate_pixels() {
        let val = if px.0[0] > threshold { FOREGROUND } else { BACKGROUND };
        output.put_pixel(x, y, Luma([val]));
    }
    output
}
