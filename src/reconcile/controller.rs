use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::settings::SettingsStore;

use super::{
    loop_worker::{refresh_loop, refresh_once},
    reconciler::FileListReconciler,
    ArtifactListing,
};

/// Cheap handle used to ask for a listing refresh after a save.
#[derive(Clone)]
pub struct RefreshHandle {
    requests: Arc<Notify>,
}

impl RefreshHandle {
    pub fn request_refresh(&self) {
        self.requests.notify_one();
    }
}

/// Owns the background refresh loop and the latest listing.
pub struct RefreshController {
    reconciler: FileListReconciler,
    settings: Arc<SettingsStore>,
    requests: Arc<Notify>,
    listing_tx: Arc<watch::Sender<ArtifactListing>>,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl RefreshController {
    pub fn new(reconciler: FileListReconciler, settings: Arc<SettingsStore>) -> Self {
        let (listing_tx, _) = watch::channel(ArtifactListing::default());
        Self {
            reconciler,
            settings,
            requests: Arc::new(Notify::new()),
            listing_tx: Arc::new(listing_tx),
            handle: None,
            cancel_token: None,
        }
    }

    pub fn refresh_handle(&self) -> RefreshHandle {
        RefreshHandle {
            requests: self.requests.clone(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ArtifactListing> {
        self.listing_tx.subscribe()
    }

    pub fn latest(&self) -> ArtifactListing {
        self.listing_tx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            bail!("artifact refresh loop already running");
        }

        let timing = self.settings.refresh();
        info!(
            "starting artifact refresh loop (poll {}ms, settle {}ms)",
            timing.poll_interval_ms, timing.settle_delay_ms
        );

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(refresh_loop(
            self.reconciler.clone(),
            self.settings.clone(),
            timing,
            self.requests.clone(),
            self.listing_tx.clone(),
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Lists immediately, publishes and returns the result.
    pub async fn refresh_now(&self) -> ArtifactListing {
        let listing = refresh_once(&self.reconciler, &self.settings).await;
        self.listing_tx.send_replace(listing.clone());
        listing
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("artifact refresh loop failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}
