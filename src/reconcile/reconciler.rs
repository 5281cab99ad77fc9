use std::{collections::HashMap, path::Path, sync::Arc};

use anyhow::{anyhow, Result};

use crate::{
    models::{ArtifactGroup, FileEntry, FileKind},
    storage::{ArtifactStorage, ListFilesRequest},
};

/// Pairs image and metadata files in a capture directory.
#[derive(Clone)]
pub struct FileListReconciler {
    storage: Arc<dyn ArtifactStorage>,
}

impl FileListReconciler {
    pub fn new(storage: Arc<dyn ArtifactStorage>) -> Self {
        Self { storage }
    }

    /// Lists `directory` and regroups it from scratch.
    pub async fn list(&self, directory: &str) -> Result<Vec<ArtifactGroup>> {
        let response = self
            .storage
            .list_files(ListFilesRequest {
                path: directory.to_string(),
            })
            .await;

        if !response.success {
            return Err(anyhow!(
                "failed to list {directory}: {}",
                response.error.unwrap_or_else(|| "unknown error".into())
            ));
        }

        Ok(group_entries(&response.files.unwrap_or_default()))
    }
}

/// Groups entries by base name, newest group first.
pub fn group_entries(entries: &[FileEntry]) -> Vec<ArtifactGroup> {
    let mut groups: HashMap<String, ArtifactGroup> = HashMap::new();

    for entry in entries {
        let path = Path::new(&entry.name);
        let Some(kind) = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(FileKind::from_extension)
        else {
            continue;
        };
        let Some(base_name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };

        let group = groups
            .entry(base_name.to_string())
            .or_insert_with(|| ArtifactGroup {
                base_name: base_name.to_string(),
                has_image: false,
                has_metadata: false,
                timestamp: entry.timestamp,
                image_path: None,
                metadata_path: None,
            });

        match kind {
            FileKind::Image => {
                group.has_image = true;
                group.image_path = Some(entry.path.clone());
            }
            FileKind::Metadata => {
                group.has_metadata = true;
                group.metadata_path = Some(entry.path.clone());
            }
        }
        group.timestamp = group.timestamp.max(entry.timestamp);
    }

    let mut groups: Vec<ArtifactGroup> = groups.into_values().collect();
    groups.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.base_name.cmp(&b.base_name))
    });
    groups
}
