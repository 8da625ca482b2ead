//! Raster-to-path extraction for plotter output.
//!
//! Binarizes a drawing onto a fixed 1000x1000 canvas, extracts traversal
//! features (traced contours or ridge centroids) and puts them in a
//! deterministic order.

pub mod binarize;
pub mod canvas;
pub mod extract;
pub mod order;

// Re-exports for convenience
pub use binarize::{binarize, canvas_from_bytes, load_canvas};
pub use canvas::{CANVAS_SIZE, Canvas};
pub use extract::{Centroid, Contour, ExtractorKind, Feature, FeatureExtractor};
pub use order::{OrderPolicy, order_features};

/// Errors that can occur while building a canvas or selecting an extractor.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Input image unavailable ({source_name}): {reason}")]
    InputUnavailable { source_name: String, reason: String },

    #[error("Invalid canvas size: expected {expected}x{expected}, got {width}x{height}")]
    CanvasSize {
        expected: u32,
        width: u32,
        height: u32,
    },

    #[error("Unknown extraction mode: {0} (expected contour, ridge or centroid)")]
    UnknownExtractor(String),
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
