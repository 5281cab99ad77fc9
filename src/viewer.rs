//! Boundary to the 3D scene viewers.
//!
//! The renderer, camera and ray picking live outside this crate. The capture
//! pipeline only needs the handful of operations on [`SceneViewer`].

use std::sync::Arc;

use anyhow::Result;
use image::RgbaImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::models::{Cartesian3, ScreenPoint, ViewerPose};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ViewerSide {
    Primary,
    Secondary,
}

impl ViewerSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewerSide::Primary => "primary",
            ViewerSide::Secondary => "secondary",
        }
    }
}

/// Listener registration returned by [`SceneViewer::install_capture_input`].
pub trait InputSubscription: Send {
    /// Unregisters every listener installed for the capture.
    fn dispose(&mut self);
}

pub trait SceneViewer: Send + Sync {
    /// World position under `screen`, or `None` when no surface is hit.
    fn pick_position(&self, screen: ScreenPoint) -> Option<Cartesian3>;

    /// Projects a world position into this viewer's surface.
    fn world_to_screen(&self, world: &Cartesian3) -> Option<ScreenPoint>;

    fn camera_pose(&self) -> ViewerPose;

    /// Snapshot of the current rendering surface.
    fn render_surface(&self) -> RgbaImage;

    /// Disables rotate/pan/zoom/tilt/look camera interaction.
    fn lock_interaction(&self);

    fn unlock_interaction(&self);

    /// Routes pointer input on this viewer to the capture controller.
    fn install_capture_input(&self) -> Result<Box<dyn InputSubscription>>;
}

/// The two side-by-side viewers. Coordinates are always resolved against the
/// primary viewer.
#[derive(Clone)]
pub struct ViewerPair {
    pub primary: Arc<dyn SceneViewer>,
    pub secondary: Arc<dyn SceneViewer>,
}

impl ViewerPair {
    pub fn new(primary: Arc<dyn SceneViewer>, secondary: Arc<dyn SceneViewer>) -> Self {
        Self { primary, secondary }
    }

    pub fn get(&self, side: ViewerSide) -> &Arc<dyn SceneViewer> {
        match side {
            ViewerSide::Primary => &self.primary,
            ViewerSide::Secondary => &self.secondary,
        }
    }

    /// Viewer whose surface and camera every capture uses, whichever side it
    /// started on.
    pub const TARGET: ViewerSide = ViewerSide::Primary;
}

/// Holds capture listeners for the lifetime of a session.
pub struct InputGuard {
    subscription: Option<Box<dyn InputSubscription>>,
    side: ViewerSide,
}

impl InputGuard {
    pub fn install(viewer: &dyn SceneViewer, side: ViewerSide) -> Result<Self> {
        let subscription = viewer.install_capture_input()?;
        debug!("capture input installed on {} viewer", side.as_str());
        Ok(Self {
            subscription: Some(subscription),
            side,
        })
    }
}

impl Drop for InputGuard {
    fn drop(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.dispose();
            debug!("capture input disposed on {} viewer", self.side.as_str());
        }
    }
}

/// Keeps a viewer's camera interaction disabled until dropped.
pub struct InteractionLock {
    viewer: Arc<dyn SceneViewer>,
    released: bool,
}

impl InteractionLock {
    pub fn acquire(viewer: Arc<dyn SceneViewer>) -> Self {
        viewer.lock_interaction();
        Self {
            viewer,
            released: false,
        }
    }

    pub fn release(mut self) {
        self.unlock();
    }

    fn unlock(&mut self) {
        if !self.released {
            self.viewer.unlock_interaction();
            self.released = true;
        }
    }
}

impl Drop for InteractionLock {
    fn drop(&mut self) {
        if !self.released {
            warn!("interaction lock dropped while held; restoring camera control");
            self.unlock();
        }
    }
}
