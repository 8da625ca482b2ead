//! Traversal ordering of extracted features.

use tracing::debug;

use crate::canvas::Canvas;
use crate::extract::{ExtractorKind, Feature};

/// How features are ordered before emission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderPolicy {
    /// Keep the extractor's discovery order.
    Extraction,
    /// Stable ascending sort by distance from `center` (canvas space).
    DistanceFromCenter { center: (f64, f64) },
}

impl OrderPolicy {
    /// Contours keep their order; centroids radiate out from the canvas center.
    pub fn for_extractor(kind: ExtractorKind) -> Self {
        if kind.yields_contours() {
            Self::Extraction
        } else {
            Self::DistanceFromCenter {
                center: Canvas::center(),
            }
        }
    }
}

/// Apply `policy` to `features`. Features at equal distance keep their
/// relative order.
pub fn order_features(mut features: Vec<Feature>, policy: &OrderPolicy) -> Vec<Feature> {
    match *policy {
        OrderPolicy::Extraction => features,
        OrderPolicy::DistanceFromCenter { center } => {
            debug!(count = features.len(), "Sorting features by distance to center");
            features.sort_by(|a, b| {
                distance_to(a, center).total_cmp(&distance_to(b, center))
            });
            features
        }
    }
}

fn distance_to(feature: &Feature, (cx, cy): (f64, f64)) -> f64 {
    feature
        .anchor()
        .map_or(f64::INFINITY, |(x, y)| (x - cx).hypot(y - cy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Centroid, Contour};
    use imageproc::point::Point;

    fn centroid(x: f64, y: f64) -> Feature {
        Feature::Centroid(Centroid { x, y, area: 1.0 })
    }

    #[test]
    fn test_policy_for_extractor() {
        assert_eq!(
            OrderPolicy::for_extractor(ExtractorKind::Contour),
            OrderPolicy::Extraction
        );
        assert_eq!(
            OrderPolicy::for_extractor(ExtractorKind::RidgeContour),
            OrderPolicy::Extraction
        );
        assert_eq!(
            OrderPolicy::for_extractor(ExtractorKind::Centroid),
            OrderPolicy::DistanceFromCenter {
                center: (500.0, 500.0)
            }
        );
    }

    #[test]
    fn test_extraction_order_is_identity() {
        let features = vec![centroid(900.0, 900.0), centroid(500.0, 500.0)];
        let ordered = order_features(features.clone(), &OrderPolicy::Extraction);
        assert_eq!(ordered, features);
    }

    #[test]
    fn test_sorts_by_distance_to_center() {
        let features = vec![
            centroid(900.0, 900.0),
            centroid(510.0, 500.0),
            centroid(300.0, 500.0),
        ];
        let ordered = order_features(features, &OrderPolicy::for_extractor(ExtractorKind::Centroid));
        let anchors: Vec<_> = ordered.iter().filter_map(Feature::anchor).collect();
        assert_eq!(anchors, vec![(510.0, 500.0), (300.0, 500.0), (900.0, 900.0)]);
    }

    #[test]
    fn test_equal_distance_keeps_extraction_order() {
        // All four lie 100px from the center.
        let features = vec![
            centroid(600.0, 500.0),
            centroid(500.0, 400.0),
            centroid(400.0, 500.0),
            centroid(500.0, 600.0),
        ];
        let mut with_near = features.clone();
        with_near.push(centroid(505.0, 500.0));

        let ordered = order_features(
            with_near,
            &OrderPolicy::DistanceFromCenter {
                center: (500.0, 500.0),
            },
        );
        assert_eq!(ordered[0], centroid(505.0, 500.0));
        assert_eq!(&ordered[1..], features.as_slice());
    }

    #[test]
    fn test_empty_contour_sorts_last() {
        let empty = Feature::Contour(Contour {
            points: Vec::new(),
            is_hole: false,
        });
        let near = Feature::Contour(Contour {
            points: vec![Point::new(500, 500)],
            is_hole: false,
        });
        let ordered = order_features(
            vec![empty.clone(), near.clone()],
            &OrderPolicy::DistanceFromCenter {
                center: (500.0, 500.0),
            },
        );
        assert_eq!(ordered, vec![near, empty]);
    }
}
