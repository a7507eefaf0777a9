//! Catchment shape descriptors: minimum rotated rectangle dimensions and the
//! elongation ratio of Schumm (1956).

use crate::types::catchment::Catchment;
use geo::{Area, ConvexHull, Coord, MinimumRotatedRect, MultiPolygon};
use polars::prelude::*;

/// Edge lengths of the minimum-area rotated rectangle enclosing a polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    /// The longer edge.
    pub length: f64,
    /// The shorter edge.
    pub width: f64,
}

/// Dimensions of the convex hull's minimum rotated rectangle, in the polygon's units.
///
/// `None` for an empty geometry.
pub fn dimensions(polygon: &MultiPolygon<f64>) -> Option<Dimensions> {
    let hull = polygon.convex_hull();
    let rect = hull.minimum_rotated_rect()?;
    let corners: Vec<Coord<f64>> = rect.exterior().coords().copied().collect();
    if corners.len() < 3 {
        return None;
    }
    let edge = |a: Coord<f64>, b: Coord<f64>| (b.x - a.x).hypot(b.y - a.y);
    let first = edge(corners[0], corners[1]);
    let second = edge(corners[1], corners[2]);
    Some(Dimensions {
        length: first.max(second),
        width: first.min(second),
    })
}

/// Elongation ratio `2·sqrt(A/π) / L`, with `A` in m² and `L` in m converted to km² and km.
///
/// A circle scores 1, longer shapes score less. `None` when either input is not
/// a positive finite number.
pub fn elongation_ratio(area_m2: f64, length_m: f64) -> Option<f64> {
    if !(area_m2.is_finite() && length_m.is_finite()) || area_m2 <= 0.0 || length_m <= 0.0 {
        return None;
    }
    let area_km2 = area_m2 / 1_000_000.0;
    let length_km = length_m / 1_000.0;
    Some(2.0 * (area_km2 / std::f64::consts::PI).sqrt() / length_km)
}

/// Shape descriptors of one catchment measured on the equal-area projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDescriptors {
    pub code: String,
    pub area_km2: f64,
    pub length_km: Option<f64>,
    pub width_km: Option<f64>,
    pub elongation_ratio: Option<f64>,
}

impl ShapeDescriptors {
    /// Length, width and elongation ratio are `None` when the boundary encloses
    /// no area in longitude/latitude, even if projecting it leaves a sliver.
    pub fn of(catchment: &Catchment) -> Self {
        let projected = catchment.projected();
        let area_m2 = projected.unsigned_area();
        let dims = if catchment.geometry().unsigned_area() > 0.0 {
            dimensions(&projected)
        } else {
            None
        };
        Self {
            code: catchment.id.clone(),
            area_km2: area_m2 / 1_000_000.0,
            length_km: dims.map(|d| d.length / 1_000.0),
            width_km: dims.map(|d| d.width / 1_000.0),
            elongation_ratio: dims.and_then(|d| elongation_ratio(area_m2, d.length)),
        }
    }
}

/// Collects descriptors into `code, area_km2, length_km, width_km, elongation_ratio`.
pub fn shape_frame(descriptors: &[ShapeDescriptors]) -> PolarsResult<DataFrame> {
    let codes: Vec<&str> = descriptors.iter().map(|d| d.code.as_str()).collect();
    let areas: Vec<f64> = descriptors.iter().map(|d| d.area_km2).collect();
    let lengths: Vec<Option<f64>> = descriptors.iter().map(|d| d.length_km).collect();
    let widths: Vec<Option<f64>> = descriptors.iter().map(|d| d.width_km).collect();
    let ratios: Vec<Option<f64>> = descriptors.iter().map(|d| d.elongation_ratio).collect();
    DataFrame::new(vec![
        Column::new("code".into(), codes),
        Column::new("area_km2".into(), areas),
        Column::new("length_km".into(), lengths),
        Column::new("width_km".into(), widths),
        Column::new("elongation_ratio".into(), ratios),
    ])
}
