//! ETRS89 Lambert Azimuthal Equal-Area (EPSG:3035) forward projection.
//!
//! Used wherever an area has to be measured on geographic boundaries.

use geo::{Coord, MapCoords, MultiPolygon};

const GRS80_A: f64 = 6_378_137.0;
const GRS80_INV_F: f64 = 298.257_222_101;
const ORIGIN_LAT_DEG: f64 = 52.0;
const ORIGIN_LON_DEG: f64 = 10.0;
const FALSE_EASTING: f64 = 4_321_000.0;
const FALSE_NORTHING: f64 = 3_210_000.0;

/// Constants of the projection that only depend on the ellipsoid and origin.
struct Laea {
    e: f64,
    e2: f64,
    qp: f64,
    rq: f64,
    d: f64,
    sin_beta1: f64,
    cos_beta1: f64,
    lon0: f64,
}

impl Laea {
    fn etrs89() -> Self {
        let f = 1.0 / GRS80_INV_F;
        let e2 = 2.0 * f - f * f;
        let e = e2.sqrt();
        let phi1 = ORIGIN_LAT_DEG.to_radians();
        let qp = q(std::f64::consts::FRAC_PI_2, e, e2);
        let q1 = q(phi1, e, e2);
        let beta1 = (q1 / qp).asin();
        let rq = GRS80_A * (qp / 2.0).sqrt();
        let m1 = phi1.cos() / (1.0 - e2 * phi1.sin().powi(2)).sqrt();
        let d = GRS80_A * m1 / (rq * beta1.cos());
        Self {
            e,
            e2,
            qp,
            rq,
            d,
            sin_beta1: beta1.sin(),
            cos_beta1: beta1.cos(),
            lon0: ORIGIN_LON_DEG.to_radians(),
        }
    }

    fn forward(&self, lon_deg: f64, lat_deg: f64) -> Coord<f64> {
        let phi = lat_deg.to_radians();
        let dlon = lon_deg.to_radians() - self.lon0;
        // Clamp guards against |q/qp| drifting past 1 at the poles.
        let beta = (q(phi, self.e, self.e2) / self.qp).clamp(-1.0, 1.0).asin();
        let (sin_beta, cos_beta) = beta.sin_cos();
        let denom = 1.0 + self.sin_beta1 * sin_beta + self.cos_beta1 * cos_beta * dlon.cos();
        let b = self.rq * (2.0 / denom).sqrt();
        Coord {
            x: FALSE_EASTING + b * self.d * cos_beta * dlon.sin(),
            y: FALSE_NORTHING
                + (b / self.d)
                    * (self.cos_beta1 * sin_beta - self.sin_beta1 * cos_beta * dlon.cos()),
        }
    }
}

/// Authalic latitude helper `q(φ)` for an ellipsoid with eccentricity `e`.
fn q(phi: f64, e: f64, e2: f64) -> f64 {
    let sin_phi = phi.sin();
    let e_sin = e * sin_phi;
    let log_term = ((1.0 - e_sin) / (1.0 + e_sin)).ln();
    (1.0 - e2) * (sin_phi / (1.0 - e2 * sin_phi * sin_phi) - (1.0 / (2.0 * e)) * log_term)
}

/// Projects a single longitude/latitude pair (degrees) to EPSG:3035 metres.
pub fn laea_point(lon: f64, lat: f64) -> Coord<f64> {
    Laea::etrs89().forward(lon, lat)
}

/// Projects a geographic multi-polygon to EPSG:3035 metres.
pub fn project_laea(geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    let projection = Laea::etrs89();
    geometry.map_coords(|c| projection.forward(c.x, c.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_false_origin() {
        let c = laea_point(10.0, 52.0);
        assert!((c.x - FALSE_EASTING).abs() < 1e-6);
        assert!((c.y - FALSE_NORTHING).abs() < 1e-6);
    }

    #[test]
    fn test_known_point() {
        // EPSG guidance note 7-2 example: 50°N 5°E -> E 3962799.45, N 2999718.85
        let c = laea_point(5.0, 50.0);
        assert!((c.x - 3_962_799.45).abs() < 0.5, "x = {}", c.x);
        assert!((c.y - 2_999_718.85).abs() < 0.5, "y = {}", c.y);
    }

    #[test]
    fn test_east_is_positive_x() {
        let west = laea_point(9.0, 52.0);
        let east = laea_point(11.0, 52.0);
        assert!(east.x > west.x);
        let south = laea_point(10.0, 51.0);
        let north = laea_point(10.0, 53.0);
        assert!(north.y > south.y);
    }
}
