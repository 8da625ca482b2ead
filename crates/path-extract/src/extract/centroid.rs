//! Skeleton-style centroid extraction.
//!
//! The distance ridge is split into 8-connected blobs and each blob is
//! reduced to its center of mass from raw image moments.

use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use tracing::debug;

use super::ridge::ridge_mask;
use super::{Centroid, Feature, FeatureExtractor};
use crate::canvas::{BACKGROUND, Canvas};

/// Produces one [`Centroid`] per distance-ridge blob.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentroidExtractor {
    pub ridge_cutoff: f64,
}

impl CentroidExtractor {
    pub fn new(ridge_cutoff: f64) -> Self {
        Self { ridge_cutoff }
    }
}

impl FeatureExtractor for CentroidExtractor {
    fn name(&self) -> &str {
        "centroid"
    }

    fn extract(&self, canvas: &Canvas) -> Vec<Feature> {
        let ridge = ridge_mask(canvas, self.ridge_cutoff);
        blob_centroids(ridge.as_gray())
            .into_iter()
            .map(Feature::Centroid)
            .collect()
    }
}

/// Zeroth and first raw moments of a pixel set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawMoments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl RawMoments {
    pub fn accumulate(&mut self, x: u32, y: u32) {
        self.m00 += 1.0;
        self.m10 += f64::from(x);
        self.m01 += f64::from(y);
    }

    /// `None` for a zero-area pixel set.
    pub fn centroid(&self) -> Option<Centroid> {
        if self.m00 == 0.0 {
            return None;
        }
        Some(Centroid {
            x: self.m10 / self.m00,
            y: self.m01 / self.m00,
            area: self.m00,
        })
    }
}

/// Centroids of the 8-connected blobs of a binary mask, in label order
/// (raster order of each blob's first pixel).
pub fn blob_centroids(mask: &GrayImage) -> Vec<Centroid> {
    let labels = connected_components(mask, Connectivity::Eight, Luma([BACKGROUND]));

    let mut moments: Vec<RawMoments> = Vec::new();
    for (x, y, px) in labels.enumerate_pixels() {
        let label = px.0[0] as usize;
        if label == 0 {
            continue;
        }
        if moments.len() < label {
            moments.resize(label, RawMoments::default());
        }
        moments[label - 1].accumulate(x, y);
    }

    let centroids: Vec<Centroid> = moments.iter().filter_map(RawMoments::centroid).collect();
    debug!(
        blobs = moments.len(),
        centroids = centroids.len(),
        "Computed blob centroids"
    );
    centroids
}
