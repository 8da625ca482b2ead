//! Feature extraction strategies.
//!
//! A [`FeatureExtractor`] turns a [`Canvas`] into traversal features. Three
//! strategies share the interface:
//! - [`ContourExtractor`]: border following over the raw canvas
//! - [`RidgeContourExtractor`]: border following over the distance ridge
//! - [`CentroidExtractor`]: one centroid per distance-ridge blob

pub mod centroid;
pub mod contour;
pub mod ridge;

use std::fmt;
use std::str::FromStr;

use imageproc::point::Point;

use crate::ExtractError;
use crate::canvas::Canvas;

pub use centroid::CentroidExtractor;
pub use contour::{ContourExtractor, RidgeContourExtractor};
pub use ridge::{DEFAULT_RIDGE_CUTOFF, distance_map, ridge_mask};

/// Traced boundary of a connected foreground region, in canvas pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<Point<u32>>,
    /// True when the border separates a region from a hole inside it.
    pub is_hole: bool,
}

impl Contour {
    /// Absolute enclosed area via the shoelace formula.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: f64 = (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                f64::from(a.x) * f64::from(b.y) - f64::from(b.x) * f64::from(a.y)
            })
            .sum();
        (twice / 2.0).abs()
    }
}

/// Center of mass of a connected ridge blob.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
    /// Zeroth moment (pixel count) of the blob.
    pub area: f64,
}

/// One traversal unit handed to the orderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Contour(Contour),
    Centroid(Centroid),
}

impl Feature {
    /// Canvas-space points in traversal order.
    pub fn anchor_points(&self) -> Vec<(f64, f64)> {
        match self {
            Self::Contour(c) => c
                .points
                .iter()
                .map(|p| (f64::from(p.x), f64::from(p.y)))
                .collect(),
            Self::Centroid(c) => vec![(c.x, c.y)],
        }
    }

    /// The first point of the feature, used as its position when ordering.
    pub fn anchor(&self) -> Option<(f64, f64)> {
        match self {
            Self::Contour(c) => c.points.first().map(|p| (f64::from(p.x), f64::from(p.y))),
            Self::Centroid(c) => Some((c.x, c.y)),
        }
    }
}

/// Interface shared by all extraction strategies.
pub trait FeatureExtractor {
    /// Short strategy name used in logs.
    fn name(&self) -> &str;

    /// Extract features from the canvas in a deterministic order.
    fn extract(&self, canvas: &Canvas) -> Vec<Feature>;
}

/// Selects the extraction strategy at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractorKind {
    /// Every region border of the binarized canvas.
    Contour,
    /// Outer borders of the distance-ridge mask.
    RidgeContour,
    /// Centroids of distance-ridge blobs.
    #[default]
    Centroid,
}

impl ExtractorKind {
    /// Build the concrete strategy with the given ridge cutoff.
    pub fn build(self, ridge_cutoff: f64) -> Box<dyn FeatureExtractor + Send + Sync> {
        match self {
            Self::Contour => Box::new(ContourExtractor::new()),
            Self::RidgeContour => Box::new(RidgeContourExtractor::new(ridge_cutoff)),
            Self::Centroid => Box::new(CentroidExtractor::new(ridge_cutoff)),
        }
    }

    /// Whether the strategy produces contours (kept in extraction order).
    pub fn yields_contours(self) -> bool {
        matches!(self, Self::Contour | Self::RidgeContour)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contour => "contour",
            Self::RidgeContour => "ridge",
            Self::Centroid => "centroid",
        }
    }
}

impl FeatureExtractor for ExtractorKind {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn extract(&self, canvas: &Canvas) -> Vec<Feature> {
        self.build(DEFAULT_RIDGE_CUTOFF).extract(canvas)
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractorKind {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contour" | "contours" => Ok(Self::Contour),
            "ridge" | "ridge-contour" => Ok(Self::RidgeContour),
            "centroid" | "centroids" | "skeleton" => Ok(Self::Centroid),
            other => Err(ExtractError::UnknownExtractor(other.to_string())),
        }
    }
}
