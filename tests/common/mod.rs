#![allow(dead_code)]

pub mod mocks;

use std::sync::Arc;

use geoclip_lib::{
    models::ScreenPoint,
    settings::SettingsStore,
    storage::ArtifactStorage,
    viewer::ViewerPair,
    AppState,
};
use tempfile::TempDir;

use mocks::{MockStorage, MockViewer, RecordingSink, ZeroConverter};

/// Corners of a 40x40 square inside the mock surface, clockwise from top-left.
pub fn square_corners() -> [ScreenPoint; 4] {
    [
        ScreenPoint::new(10.0, 10.0),
        ScreenPoint::new(50.0, 10.0),
        ScreenPoint::new(50.0, 50.0),
        ScreenPoint::new(10.0, 50.0),
    ]
}

pub struct Harness {
    pub state: AppState,
    pub primary: Arc<MockViewer>,
    pub secondary: Arc<MockViewer>,
    pub sink: Arc<RecordingSink>,
    pub settings: Arc<SettingsStore>,
    pub dir: TempDir,
}

impl Harness {
    /// Mock viewers and storage with the save path set to `/captures`.
    pub fn with_mock_storage(storage: Arc<MockStorage>) -> Self {
        let harness = Self::build(MockViewer::new(), MockViewer::new(), storage);
        harness
            .settings
            .update_save_path(Some("/captures"))
            .unwrap();
        harness
    }

    pub fn build(
        primary: MockViewer,
        secondary: MockViewer,
        storage: Arc<dyn ArtifactStorage>,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(SettingsStore::new(dir.path().join("settings.json")).unwrap());
        let primary = Arc::new(primary);
        let secondary = Arc::new(secondary);
        let sink = Arc::new(RecordingSink::default());

        let state = AppState::new(
            ViewerPair::new(primary.clone(), secondary.clone()),
            Arc::new(ZeroConverter),
            storage,
            settings.clone(),
            sink.clone(),
        );

        Self {
            state,
            primary,
            secondary,
            sink,
            settings,
            dir,
        }
    }
}
