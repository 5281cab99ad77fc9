use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use log::{error, info};

use crate::models::{FileEntry, FileKind};

use super::{
    ArtifactStorage, ListFilesRequest, ListFilesResponse, SaveImageRequest, SaveJsonRequest,
    SaveResponse,
};

/// Writes artifacts straight to the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }

    async fn write_file(&self, directory: &str, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let dir = normalize_directory(directory)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create directory {}", dir.display()))?;

        let file_path = dir.join(filename);
        tokio::fs::write(&file_path, bytes)
            .await
            .with_context(|| format!("failed to write {}", file_path.display()))?;
        Ok(file_path)
    }

    async fn read_listing(&self, directory: &str) -> Result<Vec<FileEntry>> {
        let dir = normalize_directory(directory)?;
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            bail!("directory does not exist: {}", dir.display());
        }

        let mut reader = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("failed to read directory {}", dir.display()))?;

        let mut files = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let path = entry.path();
            let Some(kind) = path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(FileKind::from_extension)
            else {
                continue;
            };

            let metadata = entry
                .metadata()
                .await
                .with_context(|| format!("failed to stat {}", path.display()))?;
            if !metadata.is_file() {
                continue;
            }
            let modified: DateTime<Utc> = metadata
                .modified()
                .with_context(|| format!("no modification time for {}", path.display()))?
                .into();

            files.push(FileEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: path.to_string_lossy().into_owned(),
                kind,
                timestamp: modified.timestamp_millis(),
            });
        }

        files.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(files)
    }
}

#[async_trait]
impl ArtifactStorage for FsStorage {
    async fn save_image(&self, request: SaveImageRequest) -> SaveResponse {
        let result = async {
            let bytes = decode_data_uri(&request.image_data)?;
            self.write_file(&request.default_path, &request.filename, &bytes)
                .await
        }
        .await;

        match result {
            Ok(path) => {
                info!("saved image {}", path.display());
                SaveResponse::saved(path.to_string_lossy())
            }
            Err(err) => {
                error!("failed to save image {}: {err:#}", request.filename);
                SaveResponse::failed(format!("{err:#}"))
            }
        }
    }

    async fn save_json(&self, request: SaveJsonRequest) -> SaveResponse {
        match self
            .write_file(
                &request.default_path,
                &request.filename,
                request.json_data.as_bytes(),
            )
            .await
        {
            Ok(path) => {
                info!("saved metadata {}", path.display());
                SaveResponse::saved(path.to_string_lossy())
            }
            Err(err) => {
                error!("failed to save metadata {}: {err:#}", request.filename);
                SaveResponse::failed(format!("{err:#}"))
            }
        }
    }

    async fn list_files(&self, request: ListFilesRequest) -> ListFilesResponse {
        match self.read_listing(&request.path).await {
            Ok(files) => ListFilesResponse::listed(files),
            Err(err) => {
                error!("failed to list {}: {err:#}", request.path);
                ListFilesResponse::failed(format!("{err:#}"))
            }
        }
    }
}

fn normalize_directory(directory: &str) -> Result<PathBuf> {
    let trimmed = directory.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("directory path is empty"));
    }
    Ok(Path::new(trimmed).to_path_buf())
}

/// Strips an optional `data:image/<fmt>;base64,` prefix and decodes the rest.
pub(crate) fn decode_data_uri(data: &str) -> Result<Vec<u8>> {
    let payload = match data.strip_prefix("data:image/") {
        Some(rest) => match rest.split_once(";base64,") {
            Some((format, payload))
                if !format.is_empty()
                    && format.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') =>
            {
                payload
            }
            _ => data,
        },
        None => data,
    };

    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .context("image data is not valid base64")
}
