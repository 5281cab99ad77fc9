use std::fmt;

/// Which half of an artifact a storage failure hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageStage {
    Image,
    Metadata,
    Listing,
}

impl fmt::Display for StorageStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StorageStage::Image => "image",
            StorageStage::Metadata => "metadata",
            StorageStage::Listing => "listing",
        };
        f.write_str(label)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// No world intersection under the given screen position.
    #[error("no surface under screen position ({x:.1}, {y:.1})")]
    PickFailure { x: f64, y: f64 },

    #[error("invalid capture state: {0}")]
    InvalidSessionPrecondition(String),

    #[error("{stage} write failed: {message}")]
    StorageFailure { stage: StorageStage, message: String },

    #[error("save path not configured")]
    ConfigurationMissing,

    #[error("clip extraction failed: {0}")]
    ExtractionFailed(String),
}

impl CaptureError {
    pub fn precondition(message: impl Into<String>) -> Self {
        CaptureError::InvalidSessionPrecondition(message.into())
    }

    pub fn storage(stage: StorageStage, message: impl Into<String>) -> Self {
        CaptureError::StorageFailure {
            stage,
            message: message.into(),
        }
    }
}
