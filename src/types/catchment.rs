//! Catchment boundaries.

use crate::geometry::projection::project_laea;
use geo::{Area, BooleanOps, BoundingRect, MultiPolygon, Polygon, Rect};
use log::debug;

/// A catchment with its boundary in geographic coordinates (x = longitude, y = latitude).
///
/// Multi-part boundaries are dissolved into a single geometry on construction, so
/// every intersection test sees the union of the parts.
#[derive(Debug, Clone, PartialEq)]
pub struct Catchment {
    pub id: String,
    geometry: MultiPolygon<f64>,
}

impl Catchment {
    pub fn new(id: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            id: id.into(),
            geometry: dissolve(geometry),
        }
    }

    pub fn from_polygon(id: impl Into<String>, polygon: Polygon<f64>) -> Self {
        Self::new(id, MultiPolygon::new(vec![polygon]))
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.geometry.bounding_rect()
    }

    /// Boundary projected to ETRS89 Lambert Azimuthal Equal-Area, in metres.
    pub fn projected(&self) -> MultiPolygon<f64> {
        project_laea(&self.geometry)
    }

    /// Area on the equal-area projection, in km².
    pub fn equal_area_km2(&self) -> f64 {
        self.projected().unsigned_area() / 1_000_000.0
    }

    /// Keeps a positive reported area and recomputes anything else on the equal-area projection.
    pub fn resolve_area_km2(&self, reported_km2: Option<f64>) -> f64 {
        match reported_km2 {
            Some(area) if area > 0.0 && area.is_finite() => area,
            _ => {
                let area = self.equal_area_km2();
                debug!(
                    "Recomputed area of catchment {} on equal-area projection: {:.3} km²",
                    self.id, area
                );
                area
            }
        }
    }
}

/// Unions the parts of a multi-polygon so overlapping parts are not counted twice.
fn dissolve(geometry: MultiPolygon<f64>) -> MultiPolygon<f64> {
    if geometry.0.len() < 2 {
        return geometry;
    }
    geometry
        .0
        .into_iter()
        .map(|part| MultiPolygon::new(vec![part]))
        .reduce(|acc, part| acc.union(&part))
        .unwrap_or_else(|| MultiPolygon::new(vec![]))
}
