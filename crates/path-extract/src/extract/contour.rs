//! Border-following contour extraction.
//!
//! Uses Suzuki-Abe border following (`imageproc::contours::find_contours`)
//! and compresses each border to its corner vertices.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;
use tracing::debug;

use super::ridge::ridge_mask;
use super::{Contour, Feature, FeatureExtractor};
use crate::canvas::Canvas;

/// Traces region borders of the binarized canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourExtractor {
    /// Keep hole borders as well as outer borders.
    pub include_holes: bool,
    /// Drop contours enclosing less than this many square pixels. `0.0` keeps all.
    pub min_area: f64,
}

impl Default for ContourExtractor {
    fn default() -> Self {
        Self {
            include_holes: true,
            min_area: 0.0,
        }
    }
}

impl ContourExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set hole inclusion.
    pub fn with_include_holes(mut self, val: bool) -> Self {
        self.include_holes = val;
        self
    }

    /// Builder: set the minimum enclosed area.
    pub fn with_min_area(mut self, val: f64) -> Self {
        self.min_area = val;
        self
    }

    /// Trace a binary mask (non-zero = foreground) in region-discovery order.
    pub fn trace(&self, mask: &GrayImage) -> Vec<Contour> {
        let raw = find_contours::<u32>(mask);
        let traced = raw.len();

        let contours: Vec<Contour> = raw
            .into_iter()
            .filter(|c| self.include_holes || c.border_type == BorderType::Outer)
            .map(|c| Contour {
                is_hole: c.border_type == BorderType::Hole,
                points: simplify_chain(&c.points),
            })
            .filter(|c| self.min_area <= 0.0 || c.area() >= self.min_area)
            .collect();

        debug!(traced, kept = contours.len(), "Traced contours");
        contours
    }
}

impl FeatureExtractor for ContourExtractor {
    fn name(&self) -> &str {
        "contour"
    }

    fn extract(&self, canvas: &Canvas) -> Vec<Feature> {
        self.trace(canvas.as_gray())
            .into_iter()
            .map(Feature::Contour)
            .collect()
    }
}

/// Traces outer borders of the distance-ridge mask instead of the raw canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RidgeContourExtractor {
    pub ridge_cutoff: f64,
}

impl RidgeContourExtractor {
    pub fn new(ridge_cutoff: f64) -> Self {
        Self { ridge_cutoff }
    }
}

impl FeatureExtractor for RidgeContourExtractor {
    fn name(&self) -> &str {
        "ridge"
    }

    fn extract(&self, canvas: &Canvas) -> Vec<Feature> {
        let ridge = ridge_mask(canvas, self.ridge_cutoff);
        ContourExtractor::new()
            .with_include_holes(false)
            .trace(ridge.as_gray())
            .into_iter()
            .map(Feature::Contour)
            .collect()
    }
}

/// Drop vertices lying inside straight runs of a closed chain.
///
/// A vertex survives when the step arriving at it differs from the step
/// leaving it, so horizontal, vertical and diagonal runs collapse to their
/// end points.
pub fn simplify_chain(points: &[Point<u32>]) -> Vec<Point<u32>> {
    let mut points = points.to_vec();
    points.dedup();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    let n = points.len();
    if n < 3 {
        return points;
    }

    let step = |a: Point<u32>, b: Point<u32>| {
        (
            i64::from(b.x) - i64::from(a.x),
            i64::from(b.y) - i64::from(a.y),
        )
    };

    let mut kept: Vec<Point<u32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect();

    if kept.is_empty() {
        kept.push(points[0]);
    }
    kept
}
