use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::{watch, Notify};
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    error::CaptureError,
    settings::{RefreshSettings, SettingsStore},
};

use super::{reconciler::FileListReconciler, ArtifactListing};

const LIST_TIMEOUT_SECS: u64 = 10;

/// Recomputes the artifact listing on a fixed interval and shortly after each
/// refresh request.
pub async fn refresh_loop(
    reconciler: FileListReconciler,
    settings: Arc<SettingsStore>,
    timing: RefreshSettings,
    requests: Arc<Notify>,
    listing_tx: Arc<watch::Sender<ArtifactListing>>,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(Duration::from_millis(timing.poll_interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let settle = Duration::from_millis(timing.settle_delay_ms);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                debug!("artifact listing poll");
            }
            _ = requests.notified() => {
                // Give the filesystem a moment to finish the writes.
                tokio::select! {
                    _ = tokio::time::sleep(settle) => {}
                    _ = cancel_token.cancelled() => {
                        info!("artifact refresh loop shutting down");
                        break;
                    }
                }
                debug!("artifact listing refresh requested");
            }
            _ = cancel_token.cancelled() => {
                info!("artifact refresh loop shutting down");
                break;
            }
        }

        let listing = refresh_once(&reconciler, &settings).await;
        listing_tx.send_replace(listing);
    }
}

/// Lists the configured save directory once.
pub async fn refresh_once(
    reconciler: &FileListReconciler,
    settings: &SettingsStore,
) -> ArtifactListing {
    let Some(directory) = settings.save_path() else {
        return ArtifactListing {
            directory: None,
            groups: Vec::new(),
            refreshed_at: Utc::now(),
            error: Some(CaptureError::ConfigurationMissing.to_string()),
        };
    };

    let result = tokio::time::timeout(
        Duration::from_secs(LIST_TIMEOUT_SECS),
        reconciler.list(&directory),
    )
    .await;

    let (groups, error) = match result {
        Ok(Ok(groups)) => (groups, None),
        Ok(Err(err)) => {
            warn!("artifact listing failed: {err:#}");
            (Vec::new(), Some(format!("{err:#}")))
        }
        Err(_) => {
            warn!("artifact listing timed out (> {LIST_TIMEOUT_SECS}s) for {directory}");
            (Vec::new(), Some("listing timed out".into()))
        }
    };

    ArtifactListing {
        directory: Some(directory),
        groups,
        refreshed_at: Utc::now(),
        error,
    }
}
