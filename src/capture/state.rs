use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    models::{CapturePoint, ScreenPoint, ViewerPose},
    viewer::ViewerSide,
};

pub const REQUIRED_POINTS: usize = 4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum CaptureStatus {
    #[default]
    Idle,
    Collecting,
    AwaitingFourth,
    Locked,
    Extracting,
    Done,
    Error,
}

impl CaptureStatus {
    pub fn for_point_count(count: usize) -> Self {
        if count + 1 >= REQUIRED_POINTS {
            CaptureStatus::AwaitingFourth
        } else {
            CaptureStatus::Collecting
        }
    }

    pub fn accepts_clicks(&self) -> bool {
        matches!(self, CaptureStatus::Collecting | CaptureStatus::AwaitingFourth)
    }
}

/// Points and capture-time context gathered for one quadrilateral.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureSession {
    pub points: Vec<CapturePoint>,
    /// Corner positions in the target viewer's surface, in click order.
    pub clip_path: Vec<ScreenPoint>,
    pub timestamp: Option<String>,
    pub viewer_pose: Option<ViewerPose>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.points.len() >= REQUIRED_POINTS
    }

    pub fn remaining(&self) -> usize {
        REQUIRED_POINTS.saturating_sub(self.points.len())
    }

    pub fn next_index(&self) -> u8 {
        (self.points.len() + 1) as u8
    }

    pub fn record(&mut self, point: CapturePoint, clip_vertex: ScreenPoint) {
        self.points.push(point);
        self.clip_path.push(clip_vertex);
    }

    /// Stamps the capture time and camera pose once the last corner lands.
    pub fn complete(&mut self, pose: ViewerPose) {
        self.timestamp = Some(iso_timestamp());
        self.viewer_pose = Some(pose.rounded());
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T08:30:00.123Z`.
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOutcome {
    pub success: bool,
    pub base_name: Option<String>,
    pub image_path: Option<String>,
    pub metadata_path: Option<String>,
    pub error: Option<String>,
}

/// Serializable view of the selector for the UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CaptureState {
    pub status: CaptureStatus,
    pub origin: Option<ViewerSide>,
    pub session_id: Option<String>,
    pub points_collected: usize,
    pub points_remaining: usize,
    pub last_outcome: Option<CaptureOutcome>,
}
