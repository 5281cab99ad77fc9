//! The JSON record written next to every captured image.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    error::CaptureError,
    models::{CapturePoint, ViewerPose},
};

use super::state::{CaptureSession, REQUIRED_POINTS};

/// Ground resolution used by the rectification step.
pub const DEFAULT_METRES_PER_PIXEL: f64 = 0.1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureMetadata {
    pub points: Vec<CapturePoint>,
    pub timestamp: String,
    pub viewer_position: ViewerPose,
}

/// Ground size of the captured quadrilateral in metres.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct QuadFootprint {
    pub width: f64,
    pub height: f64,
}

impl QuadFootprint {
    /// Output raster size at `metres_per_pixel`, truncated to whole pixels.
    pub fn pixel_size(&self, metres_per_pixel: f64) -> (u32, u32) {
        (
            (self.width / metres_per_pixel) as u32,
            (self.height / metres_per_pixel) as u32,
        )
    }
}

impl CaptureMetadata {
    pub fn from_session(session: &CaptureSession) -> Result<Self, CaptureError> {
        if session.points.len() != REQUIRED_POINTS {
            return Err(CaptureError::precondition(format!(
                "metadata needs {REQUIRED_POINTS} points, session has {}",
                session.points.len()
            )));
        }
        let timestamp = session
            .timestamp
            .clone()
            .ok_or_else(|| CaptureError::precondition("session has no capture timestamp"))?;
        let viewer_position = session
            .viewer_pose
            .ok_or_else(|| CaptureError::precondition("session has no viewer pose"))?;

        Ok(Self {
            points: session.points.clone(),
            timestamp,
            viewer_position,
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize capture metadata")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let metadata: Self =
            serde_json::from_str(json).context("failed to parse capture metadata")?;
        metadata.validate()?;
        Ok(metadata)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read metadata from {}", path.display()))?;
        Self::from_json(&contents).with_context(|| format!("invalid metadata in {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.points.len() != REQUIRED_POINTS {
            bail!(
                "metadata must contain {REQUIRED_POINTS} points, found {}",
                self.points.len()
            );
        }
        for (position, point) in self.points.iter().enumerate() {
            if point.index as usize != position + 1 {
                bail!(
                    "point {} has index {}, expected {}",
                    position,
                    point.index,
                    position + 1
                );
            }
        }
        Ok(())
    }

    /// Width averages edges AB and CD, height averages BC and DA.
    pub fn footprint(&self) -> Result<QuadFootprint> {
        self.validate()?;
        let [a, b, c, d] = [
            self.points[0].cartesian,
            self.points[1].cartesian,
            self.points[2].cartesian,
            self.points[3].cartesian,
        ];

        Ok(QuadFootprint {
            width: (a.distance_to(&b) + c.distance_to(&d)) / 2.0,
            height: (b.distance_to(&c) + d.distance_to(&a)) / 2.0,
        })
    }
}
