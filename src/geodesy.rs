use crate::models::{Cartesian3, GeodeticPoint};

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// Points closer than this (squared metres) to the earth centre cannot be
/// projected onto the ellipsoid.
const CENTER_TOLERANCE_SQUARED: f64 = 0.1;
const MAX_ITERATIONS: usize = 10;

/// Converts world-space positions into geodetic coordinates.
pub trait GeodeticConverter: Send + Sync {
    fn to_geodetic(&self, cartesian: &Cartesian3) -> Option<GeodeticPoint>;
}

/// WGS84 ellipsoid conversion.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wgs84;

impl GeodeticConverter for Wgs84 {
    fn to_geodetic(&self, c: &Cartesian3) -> Option<GeodeticPoint> {
        if !(c.x.is_finite() && c.y.is_finite() && c.z.is_finite()) {
            return None;
        }
        if c.x * c.x + c.y * c.y + c.z * c.z < CENTER_TOLERANCE_SQUARED {
            return None;
        }

        let e2 = WGS84_F * (2.0 - WGS84_F);
        let b = WGS84_A * (1.0 - WGS84_F);
        let p = (c.x * c.x + c.y * c.y).sqrt();
        let longitude = c.y.atan2(c.x);

        if p < 1e-9 {
            let latitude = if c.z >= 0.0 { 90.0 } else { -90.0 };
            return Some(GeodeticPoint::new(
                longitude.to_degrees(),
                latitude,
                c.z.abs() - b,
            ));
        }

        let mut latitude = c.z.atan2(p * (1.0 - e2));
        let mut height = 0.0;
        for _ in 0..MAX_ITERATIONS {
            let sin_lat = latitude.sin();
            let n = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();
            height = p / latitude.cos() - n;
            let next = c.z.atan2(p * (1.0 - e2 * n / (n + height)));
            let converged = (next - latitude).abs() < 1e-12;
            latitude = next;
            if converged {
                break;
            }
        }

        Some(GeodeticPoint::new(
            longitude.to_degrees(),
            latitude.to_degrees(),
            height,
        ))
    }
}
