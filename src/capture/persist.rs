use std::sync::Arc;

use chrono::Utc;
use log::{error, info, warn};

use crate::{
    error::{CaptureError, StorageStage},
    models::{artifact_base_name, FileKind},
    reconcile::RefreshHandle,
    storage::{ArtifactStorage, SaveImageRequest, SaveJsonRequest},
};

use super::{clip::ClippedRegion, metadata::CaptureMetadata, state::CaptureOutcome, CaptureSession};

/// Writes the image/metadata pair for a finished capture.
///
/// The image is written first and the metadata only after it succeeded. A
/// failed metadata write leaves the image on disk; nothing is rolled back.
#[derive(Clone)]
pub struct ArtifactPersister {
    storage: Arc<dyn ArtifactStorage>,
    refresh: Option<RefreshHandle>,
}

impl ArtifactPersister {
    pub fn new(storage: Arc<dyn ArtifactStorage>, refresh: Option<RefreshHandle>) -> Self {
        Self { storage, refresh }
    }

    pub async fn persist(
        &self,
        region: &ClippedRegion,
        session: &CaptureSession,
        save_path: Option<&str>,
    ) -> CaptureOutcome {
        let mut outcome = CaptureOutcome {
            success: false,
            base_name: None,
            image_path: None,
            metadata_path: None,
            error: None,
        };

        if let Err(err) = self.write_pair(region, session, save_path, &mut outcome).await {
            error!("capture persistence failed: {err}");
            outcome.error = Some(err.to_string());
            return outcome;
        }

        outcome.success = true;
        if let Some(refresh) = &self.refresh {
            refresh.request_refresh();
        }
        outcome
    }

    async fn write_pair(
        &self,
        region: &ClippedRegion,
        session: &CaptureSession,
        save_path: Option<&str>,
        outcome: &mut CaptureOutcome,
    ) -> Result<(), CaptureError> {
        let save_path = save_path
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .ok_or(CaptureError::ConfigurationMissing)?;

        let metadata = CaptureMetadata::from_session(session)?;
        let json_data = metadata
            .to_json_pretty()
            .map_err(|err| CaptureError::storage(StorageStage::Metadata, format!("{err:#}")))?;
        let image_data = region
            .to_data_uri()
            .map_err(|err| CaptureError::storage(StorageStage::Image, format!("{err:#}")))?;

        let base_name = artifact_base_name(Utc::now().timestamp_millis());
        outcome.base_name = Some(base_name.clone());

        let image_name = format!("{base_name}.{}", FileKind::Image.extension());
        let metadata_name = format!("{base_name}.{}", FileKind::Metadata.extension());

        let image = self
            .storage
            .save_image(SaveImageRequest {
                image_data,
                default_path: save_path.to_string(),
                filename: image_name.clone(),
            })
            .await;
        if !image.success {
            return Err(CaptureError::storage(
                StorageStage::Image,
                image.error.unwrap_or_else(|| "image save failed".into()),
            ));
        }
        outcome.image_path = Some(image.file_path.unwrap_or(image_name));

        let json = self
            .storage
            .save_json(SaveJsonRequest {
                json_data,
                default_path: save_path.to_string(),
                filename: metadata_name.clone(),
            })
            .await;
        if !json.success {
            warn!("image for {base_name} was written without its metadata");
            return Err(CaptureError::storage(
                StorageStage::Metadata,
                json.error.unwrap_or_else(|| "metadata save failed".into()),
            ));
        }
        outcome.metadata_path = Some(json.file_path.unwrap_or(metadata_name));

        info!("persisted capture {base_name} to {save_path}");
        Ok(())
    }
}
