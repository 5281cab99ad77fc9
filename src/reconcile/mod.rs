pub mod controller;
pub mod loop_worker;
pub mod reconciler;

pub use controller::{RefreshController, RefreshHandle};
pub use reconciler::{group_entries, FileListReconciler};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::ArtifactGroup;

/// Latest view of the capture directory.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactListing {
    pub directory: Option<String>,
    pub groups: Vec<ArtifactGroup>,
    pub refreshed_at: DateTime<Utc>,
    pub error: Option<String>,
}
