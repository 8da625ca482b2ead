//! Distance-ridge approximation of stroke centerlines.
//!
//! Every foreground pixel gets its Euclidean distance to the nearest
//! background pixel. The map is min-max normalized to `[0.0, 1.0]` and only
//! pixels at or above the cutoff are kept, which leaves the innermost part
//! of the widest strokes.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::distance_transform::euclidean_squared_distance_transform;
use tracing::debug;

use crate::canvas::{CANVAS_SIZE, Canvas, FOREGROUND};

/// Default normalized cutoff for ridge pixels.
pub const DEFAULT_RIDGE_CUTOFF: f64 = 0.99;

/// Per-pixel distance values.
pub type DistanceMap = ImageBuffer<Luma<f64>, Vec<f64>>;

/// Euclidean distance from each foreground pixel to the nearest background
/// pixel. Background pixels are `0.0`.
///
/// A canvas without background pixels has no finite distances; every
/// value is then non-finite.
pub fn distance_map(canvas: &Canvas) -> DistanceMap {
    // The transform measures distance to the nearest non-zero pixel, so
    // background has to be the non-zero side.
    let mut background = canvas.as_gray().clone();
    image::imageops::invert(&mut background);

    let mut map = euclidean_squared_distance_transform(&background);
    for px in map.pixels_mut() {
        px.0[0] = px.0[0].sqrt();
    }
    map
}

/// Min-max normalize in place. Returns `false` (leaving the map untouched)
/// when the map is flat or has no finite values.
pub fn normalize_unit(map: &mut DistanceMap) -> bool {
    let (min, max) = map
        .pixels()
        .map(|px| px.0[0])
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if !min.is_finite() || !max.is_finite() || max - min <= f64::EPSILON {
        return false;
    }

    let range = max - min;
    for px in map.pixels_mut() {
        px.0[0] = (px.0[0] - min) / range;
    }
    true
}

/// Foreground pixels whose normalized distance is at least `cutoff`.
pub fn ridge_mask(canvas: &Canvas, cutoff: f64) -> Canvas {
    let mut map = distance_map(canvas);
    if !normalize_unit(&mut map) {
        debug!("Distance map is flat, ridge mask is empty");
        return Canvas::blank();
    }

    let mut mask = GrayImage::new(CANVAS_SIZE, CANVAS_SIZE);
    for (x, y, px) in map.enumerate_pixels() {
        if px.0[0] >= cutoff {
            mask.put_pixel(x, y, Luma([FOREGROUND]));
        }
    }

    let ridge = Canvas::rebinarize(mask);
    debug!(
        cutoff,
        ridge_pixels = ridge.foreground_count(),
        "Computed distance ridge"
    );
    ridge
}
