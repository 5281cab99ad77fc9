use serde::{Deserialize, Serialize};

/// Pixel position inside a viewer's rendering surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Earth-centred, earth-fixed world position in metres.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Cartesian3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Cartesian3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Cartesian3) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn rounded(&self, digits: u32) -> Self {
        Self {
            x: round_to(self.x, digits),
            y: round_to(self.y, digits),
            z: round_to(self.z, digits),
        }
    }
}

/// Longitude/latitude in degrees, height in metres above the ellipsoid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct GeodeticPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub height: f64,
}

impl GeodeticPoint {
    pub fn new(longitude: f64, latitude: f64, height: f64) -> Self {
        Self {
            longitude,
            latitude,
            height,
        }
    }

    /// Degrees keep 6 decimals (~0.1 m), height keeps centimetres.
    pub fn rounded(&self) -> Self {
        Self {
            longitude: round_to(self.longitude, 6),
            latitude: round_to(self.latitude, 6),
            height: round_to(self.height, 2),
        }
    }
}

/// Camera position plus heading/pitch/roll (radians) at capture time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ViewerPose {
    pub position: Cartesian3,
    pub heading: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl ViewerPose {
    pub fn rounded(&self) -> Self {
        Self {
            position: self.position.rounded(3),
            heading: round_to(self.heading, 6),
            pitch: round_to(self.pitch, 6),
            roll: round_to(self.roll, 6),
        }
    }
}

/// One recorded corner of the capture quadrilateral.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CapturePoint {
    pub index: u8,
    pub screen: ScreenPoint,
    pub geographic: GeodeticPoint,
    pub cartesian: Cartesian3,
}

pub fn round_to(v: f64, digits: u32) -> f64 {
    let factor = 10_f64.powi(digits as i32);
    (v * factor).round() / factor
}
