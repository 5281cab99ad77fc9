use std::sync::Arc;

use log::{debug, error, info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::CaptureError,
    models::{CapturePoint, ScreenPoint},
    settings::SettingsStore,
    status::{StatusEvent, StatusSink},
    viewer::{InputGuard, InteractionLock, ViewerPair, ViewerSide},
};

use super::{
    clip::ClipExtractor,
    persist::ArtifactPersister,
    resolver::{CoordinateReadout, CoordinateResolver},
    state::{CaptureOutcome, CaptureSession, CaptureState, CaptureStatus},
};

/// What a single click did to the session.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum ClickOutcome {
    /// Click came from another viewer or the session is already full.
    Ignored,
    /// Nothing was picked under the cursor; the session did not advance.
    Missed { remaining: usize },
    Recorded { index: u8, remaining: usize },
    Completed(CaptureOutcome),
}

struct ActiveCapture {
    id: String,
    origin: ViewerSide,
    target: ViewerSide,
    session: CaptureSession,
    lock: Option<InteractionLock>,
    // Dropping the guard unregisters the capture listeners.
    _input: InputGuard,
}

/// Collects four corner points per capture and drives extraction and
/// persistence once the last one lands.
///
/// Only one capture runs at a time. `begin`, `on_click` and `cancel` are the
/// only operations that mutate the session.
pub struct QuadrilateralSelector {
    viewers: ViewerPair,
    resolver: CoordinateResolver,
    extractor: ClipExtractor,
    persister: ArtifactPersister,
    settings: Arc<SettingsStore>,
    status_sink: Arc<dyn StatusSink>,
    status: CaptureStatus,
    active: Option<ActiveCapture>,
    last_outcome: Option<CaptureOutcome>,
}

impl QuadrilateralSelector {
    pub fn new(
        viewers: ViewerPair,
        resolver: CoordinateResolver,
        persister: ArtifactPersister,
        settings: Arc<SettingsStore>,
        status_sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            viewers,
            resolver,
            extractor: ClipExtractor::new(),
            persister,
            settings,
            status_sink,
            status: CaptureStatus::Idle,
            active: None,
            last_outcome: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn snapshot(&self) -> CaptureState {
        let (origin, session_id, collected, remaining) = match &self.active {
            Some(active) => (
                Some(active.origin),
                Some(active.id.clone()),
                active.session.len(),
                active.session.remaining(),
            ),
            None => (None, None, 0, 0),
        };

        CaptureState {
            status: self.status,
            origin,
            session_id,
            points_collected: collected,
            points_remaining: remaining,
            last_outcome: self.last_outcome.clone(),
        }
    }

    /// Points recorded so far in the active session.
    pub fn points(&self) -> &[CapturePoint] {
        self.active
            .as_ref()
            .map(|active| active.session.points.as_slice())
            .unwrap_or(&[])
    }

    pub fn begin(&mut self, side: ViewerSide) -> Result<CaptureState, CaptureError> {
        if let Some(active) = &self.active {
            warn!(
                "capture {} already active on {} viewer; ignoring begin",
                active.id,
                active.origin.as_str()
            );
            return Err(CaptureError::precondition(
                "a capture session is already active",
            ));
        }

        let input = InputGuard::install(self.viewers.get(side).as_ref(), side).map_err(|err| {
            CaptureError::precondition(format!("failed to install capture input: {err:#}"))
        })?;

        let id = Uuid::new_v4().to_string();
        self.active = Some(ActiveCapture {
            id: id.clone(),
            origin: side,
            target: ViewerPair::TARGET,
            session: CaptureSession::new(),
            lock: None,
            _input: input,
        });
        self.status = CaptureStatus::Collecting;
        self.last_outcome = None;

        info!("capture {id} started on {} viewer", side.as_str());
        self.status_sink
            .publish(StatusEvent::Started { session_id: id });
        Ok(self.snapshot())
    }

    pub async fn on_click(
        &mut self,
        side: ViewerSide,
        position: ScreenPoint,
    ) -> Result<ClickOutcome, CaptureError> {
        let Some(active) = self.active.as_mut() else {
            return Err(CaptureError::precondition("no capture session is active"));
        };
        if side != active.origin || !self.status.accepts_clicks() || active.session.is_full() {
            return Ok(ClickOutcome::Ignored);
        }

        let source = self.viewers.get(side).clone();
        let target = self.viewers.get(active.target).clone();
        let remap = side != active.target;

        let pick = match self
            .resolver
            .resolve_click(source.as_ref(), target.as_ref(), remap, position)
        {
            Ok(pick) => pick,
            Err(err) => {
                debug!("capture {}: ignoring click, {err}", active.id);
                return Ok(ClickOutcome::Missed {
                    remaining: active.session.remaining(),
                });
            }
        };

        let index = active.session.next_index();
        active.session.record(
            CapturePoint {
                index,
                screen: position,
                geographic: pick.geographic.rounded(),
                cartesian: pick.cartesian.rounded(3),
            },
            pick.target_screen,
        );
        debug!(
            "capture {}: point {index} at ({:.1}, {:.1})",
            active.id, position.x, position.y
        );

        if !active.session.is_full() {
            let collected = active.session.len();
            let remaining = active.session.remaining();
            self.status = CaptureStatus::for_point_count(collected);
            self.status_sink
                .publish(StatusEvent::PointsRemaining { collected, remaining });
            return Ok(ClickOutcome::Recorded { index, remaining });
        }

        active.session.complete(target.camera_pose());
        active.lock = Some(InteractionLock::acquire(target));
        self.status = CaptureStatus::Locked;
        info!("capture {}: all points collected, view locked", active.id);

        self.status_sink.publish(StatusEvent::Saving);
        let outcome = self.finish_capture().await;
        Ok(ClickOutcome::Completed(outcome))
    }

    /// Hover readout for the active capture's target viewer.
    pub fn on_pointer_move(
        &self,
        side: ViewerSide,
        position: ScreenPoint,
    ) -> Option<CoordinateReadout> {
        let active = self.active.as_ref()?;
        if side != active.origin {
            return None;
        }
        let source = self.viewers.get(side);
        let target = self.viewers.get(active.target);
        Some(self.resolver.readout(
            source.as_ref(),
            target.as_ref(),
            side != active.target,
            position,
        ))
    }

    /// Abandons the current session. No artifact is produced.
    pub fn cancel(&mut self) -> CaptureState {
        let Some(mut active) = self.active.take() else {
            return self.snapshot();
        };

        if let Some(lock) = active.lock.take() {
            lock.release();
        }
        info!(
            "capture {} cancelled with {} point(s)",
            active.id,
            active.session.len()
        );
        drop(active);

        self.status = CaptureStatus::Idle;
        self.status_sink.publish(StatusEvent::Cancelled);
        self.snapshot()
    }

    async fn finish_capture(&mut self) -> CaptureOutcome {
        let Some(mut active) = self.active.take() else {
            return failed_outcome("no capture session is active".into());
        };

        // Settles back to Idle even if this future is dropped mid-save.
        let mut status = StatusReset::enter(&mut self.status, CaptureStatus::Extracting);
        let target = self.viewers.get(active.target).clone();
        let outcome = match self
            .extractor
            .extract(target.as_ref(), &active.session.clip_path)
        {
            Ok(region) => {
                let save_path = self.settings.save_path();
                self.persister
                    .persist(&region, &active.session, save_path.as_deref())
                    .await
            }
            Err(err) => {
                error!("capture {}: {err}", active.id);
                failed_outcome(err.to_string())
            }
        };

        if let Some(lock) = active.lock.take() {
            lock.release();
        }
        let id = active.id.clone();
        drop(active);

        if outcome.success {
            status.set(CaptureStatus::Done);
            self.status_sink.publish(StatusEvent::Saved {
                base_name: outcome.base_name.clone().unwrap_or_default(),
            });
        } else {
            status.set(CaptureStatus::Error);
            self.status_sink.publish(StatusEvent::Failed {
                message: outcome.error.clone().unwrap_or_default(),
            });
        }
        info!("capture {id} finished with status {:?}", status.current());
        drop(status);

        self.last_outcome = Some(outcome.clone());
        outcome
    }
}

/// Holds the selector status during a save and resets it to `Idle` on drop.
struct StatusReset<'a> {
    status: &'a mut CaptureStatus,
}

impl<'a> StatusReset<'a> {
    fn enter(status: &'a mut CaptureStatus, next: CaptureStatus) -> Self {
        *status = next;
        Self { status }
    }

    fn set(&mut self, next: CaptureStatus) {
        *self.status = next;
    }

    fn current(&self) -> CaptureStatus {
        *self.status
    }
}

impl Drop for StatusReset<'_> {
    fn drop(&mut self) {
        *self.status = CaptureStatus::Idle;
    }
}

fn failed_outcome(message: String) -> CaptureOutcome {
    CaptureOutcome {
        success: false,
        base_name: None,
        image_path: None,
        metadata_path: None,
        error: Some(message),
    }
}
