//! Counts point features (dams, gauges, ...) falling inside each catchment.

use crate::types::catchment::Catchment;
use geo::{Intersects, Point};
use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};
use std::collections::BTreeMap;

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Number of `points` intersecting each catchment, keyed by catchment id.
///
/// Points on a boundary count for every catchment they touch. Catchments
/// without any point report zero.
pub fn count_points_in_catchments(
    points: &[Point<f64>],
    catchments: &[Catchment],
) -> BTreeMap<String, usize> {
    let tree = RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .map(|(i, p)| IndexedPoint::new([p.x(), p.y()], i))
            .collect(),
    );

    catchments
        .iter()
        .map(|catchment| {
            let count = match catchment.bounding_rect() {
                Some(bbox) => {
                    let envelope = AABB::from_corners(
                        [bbox.min().x, bbox.min().y],
                        [bbox.max().x, bbox.max().y],
                    );
                    tree.locate_in_envelope_intersecting(&envelope)
                        .filter(|candidate| points[candidate.data].intersects(catchment.geometry()))
                        .count()
                }
                None => 0,
            };
            (catchment.id.clone(), count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Rect;

    #[test]
    fn test_counts_per_catchment() {
        let a = Catchment::from_polygon("A", Rect::new((0.0, 0.0), (1.0, 1.0)).to_polygon());
        let b = Catchment::from_polygon("B", Rect::new((2.0, 0.0), (3.0, 1.0)).to_polygon());
        let empty =
            Catchment::from_polygon("E", Rect::new((10.0, 10.0), (11.0, 11.0)).to_polygon());
        let points = vec![
            Point::new(0.5, 0.5),
            Point::new(0.2, 0.9),
            Point::new(2.5, 0.5),
            Point::new(5.0, 5.0),
        ];
        let counts = count_points_in_catchments(&points, &[a, b, empty]);
        assert_eq!(counts["A"], 2);
        assert_eq!(counts["B"], 1);
        assert_eq!(counts["E"], 0);
    }

    #[test]
    fn test_no_points() {
        let a = Catchment::from_polygon("A", Rect::new((0.0, 0.0), (1.0, 1.0)).to_polygon());
        let counts = count_points_in_catchments(&[], &[a]);
        assert_eq!(counts["A"], 0);
    }
}
