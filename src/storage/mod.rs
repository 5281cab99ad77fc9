//! Request/response surface of the storage collaborator.
//!
//! The shapes mirror the desktop shell's save/list calls so a host can forward
//! them over IPC unchanged; [`FsStorage`] implements them directly on disk.

mod fs;

pub use fs::FsStorage;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::FileEntry;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveImageRequest {
    /// Base64 raster with a `data:image/<fmt>;base64,` prefix.
    pub image_data: String,
    pub default_path: String,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveJsonRequest {
    pub json_data: String,
    pub default_path: String,
    pub filename: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveResponse {
    pub fn saved(file_path: impl Into<String>) -> Self {
        Self {
            success: true,
            file_path: Some(file_path.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            file_path: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFilesRequest {
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ListFilesResponse {
    pub fn listed(files: Vec<FileEntry>) -> Self {
        Self {
            success: true,
            files: Some(files),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            files: None,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait ArtifactStorage: Send + Sync {
    async fn save_image(&self, request: SaveImageRequest) -> SaveResponse;

    async fn save_json(&self, request: SaveJsonRequest) -> SaveResponse;

    async fn list_files(&self, request: ListFilesRequest) -> ListFilesResponse;
}
