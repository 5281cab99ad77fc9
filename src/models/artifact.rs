use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum FileKind {
    Image,
    Metadata,
}

impl FileKind {
    /// Maps a file extension (without the dot) to the artifact half it stores.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(FileKind::Image),
            "json" => Some(FileKind::Metadata),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Image => "png",
            FileKind::Metadata => "json",
        }
    }
}

/// One row of a directory listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    /// Modification time, epoch milliseconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GroupStatus {
    Ready,
    Pending,
}

/// Image and metadata files sharing one base name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactGroup {
    pub base_name: String,
    pub has_image: bool,
    pub has_metadata: bool,
    pub timestamp: i64,
    pub image_path: Option<String>,
    pub metadata_path: Option<String>,
}

impl ArtifactGroup {
    pub fn is_ready(&self) -> bool {
        self.has_image && self.has_metadata
    }

    pub fn status(&self) -> GroupStatus {
        if self.is_ready() {
            GroupStatus::Ready
        } else {
            GroupStatus::Pending
        }
    }
}

/// Base name shared by both files of a capture: `SC-<epoch millis>`.
pub fn artifact_base_name(epoch_millis: i64) -> String {
    format!("SC-{epoch_millis}")
}
