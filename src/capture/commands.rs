use crate::{
    error::CaptureError,
    models::{ArtifactGroup, ScreenPoint},
    reconcile::ArtifactListing,
    viewer::ViewerSide,
    AppState,
};

use super::{ClickOutcome, CaptureState, CoordinateReadout};

pub async fn get_capture_state(state: &AppState) -> Result<CaptureState, String> {
    Ok(state.capture.lock().await.snapshot())
}

pub async fn begin_capture(state: &AppState, side: ViewerSide) -> Result<CaptureState, String> {
    state
        .capture
        .lock()
        .await
        .begin(side)
        .map_err(|e| e.to_string())
}

pub async fn capture_click(
    state: &AppState,
    side: ViewerSide,
    x: f64,
    y: f64,
) -> Result<ClickOutcome, String> {
    let mut selector = state.capture.lock().await;
    selector
        .on_click(side, ScreenPoint::new(x, y))
        .await
        .map_err(|e| e.to_string())
}

/// Hover readout. Returns `None` while a capture is being saved.
pub async fn capture_pointer_move(
    state: &AppState,
    side: ViewerSide,
    x: f64,
    y: f64,
) -> Result<Option<CoordinateReadout>, String> {
    match state.capture.try_lock() {
        Ok(selector) => Ok(selector.on_pointer_move(side, ScreenPoint::new(x, y))),
        Err(_) => Ok(None),
    }
}

pub async fn cancel_capture(state: &AppState) -> Result<CaptureState, String> {
    Ok(state.capture.lock().await.cancel())
}

/// Lists `path`, or the configured save path when none is given.
pub async fn list_artifacts(
    state: &AppState,
    path: Option<String>,
) -> Result<Vec<ArtifactGroup>, String> {
    let directory = path
        .filter(|p| !p.trim().is_empty())
        .or_else(|| state.settings.save_path())
        .ok_or_else(|| CaptureError::ConfigurationMissing.to_string())?;

    state
        .reconciler
        .list(&directory)
        .await
        .map_err(|e| format!("{e:#}"))
}

pub async fn get_artifact_listing(state: &AppState) -> Result<ArtifactListing, String> {
    Ok(state.refresh.lock().await.latest())
}

pub async fn refresh_artifacts(state: &AppState) -> Result<ArtifactListing, String> {
    let listing = state.refresh.lock().await.refresh_now().await;
    Ok(listing)
}

pub fn get_save_path(state: &AppState) -> Result<Option<String>, String> {
    Ok(state.settings.save_path())
}

pub async fn set_save_path(
    state: &AppState,
    path: Option<String>,
) -> Result<Option<String>, String> {
    state
        .settings
        .update_save_path(path.as_deref())
        .map_err(|e| e.to_string())?;

    state.refresh.lock().await.refresh_handle().request_refresh();
    Ok(state.settings.save_path())
}
