pub mod capture;
pub mod error;
pub mod geodesy;
pub mod models;
pub mod reconcile;
pub mod settings;
pub mod status;
pub mod storage;
pub mod viewer;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::sync::Mutex;

use capture::{ArtifactPersister, CoordinateResolver, QuadrilateralSelector};
use geodesy::GeodeticConverter;
use reconcile::{FileListReconciler, RefreshController};
use settings::SettingsStore;
use status::StatusSink;
use storage::{ArtifactStorage, FsStorage};
use viewer::ViewerPair;

/// Everything a host needs to drive captures and browse saved artifacts.
pub struct AppState {
    pub(crate) capture: Mutex<QuadrilateralSelector>,
    pub(crate) settings: Arc<SettingsStore>,
    pub(crate) reconciler: FileListReconciler,
    pub(crate) refresh: Mutex<RefreshController>,
}

impl AppState {
    pub fn new(
        viewers: ViewerPair,
        converter: Arc<dyn GeodeticConverter>,
        storage: Arc<dyn ArtifactStorage>,
        settings: Arc<SettingsStore>,
        status_sink: Arc<dyn StatusSink>,
    ) -> Self {
        let reconciler = FileListReconciler::new(storage.clone());
        let refresh = RefreshController::new(reconciler.clone(), settings.clone());
        let persister = ArtifactPersister::new(storage, Some(refresh.refresh_handle()));
        let selector = QuadrilateralSelector::new(
            viewers,
            CoordinateResolver::new(converter),
            persister,
            settings.clone(),
            status_sink,
        );

        Self {
            capture: Mutex::new(selector),
            settings,
            reconciler,
            refresh: Mutex::new(refresh),
        }
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    /// Starts the background artifact refresh loop.
    pub async fn start(&self) -> Result<()> {
        self.refresh.lock().await.start()
    }

    /// Cancels any in-flight capture and stops the refresh loop.
    pub async fn shutdown(&self) -> Result<()> {
        self.capture.lock().await.cancel();
        self.refresh.lock().await.stop().await
    }
}

/// Headless artifact watcher: keeps the listing of the configured save
/// directory current and logs each refresh until interrupted.
pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("geoclip starting up...");

    let settings_path = SettingsStore::default_path();
    let settings = Arc::new(
        SettingsStore::new(settings_path.clone())
            .with_context(|| format!("failed to load settings from {}", settings_path.display()))?,
    );
    match settings.save_path() {
        Some(path) => info!("watching save path {path}"),
        None => warn!(
            "no save path configured in {}; listings will report an error",
            settings_path.display()
        ),
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(async move {
        let storage: Arc<dyn ArtifactStorage> = Arc::new(FsStorage::new());
        let mut refresh = RefreshController::new(FileListReconciler::new(storage), settings);
        let mut listings = refresh.subscribe();
        refresh.start()?;

        loop {
            tokio::select! {
                changed = listings.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let listing = listings.borrow_and_update().clone();
                    match &listing.error {
                        Some(err) => warn!("artifact listing error: {err}"),
                        None => {
                            let ready = listing.groups.iter().filter(|g| g.is_ready()).count();
                            info!(
                                "{} artifact group(s), {ready} ready, in {}",
                                listing.groups.len(),
                                listing.directory.as_deref().unwrap_or_default()
                            );
                        }
                    }
                }
                signal = tokio::signal::ctrl_c() => {
                    if let Err(err) = signal {
                        warn!("failed to listen for ctrl-c: {err}");
                    }
                    info!("shutting down");
                    break;
                }
            }
        }

        refresh.stop().await
    })
}
