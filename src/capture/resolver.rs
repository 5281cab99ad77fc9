use std::sync::Arc;

use log::debug;
use serde::Serialize;

use crate::{
    error::CaptureError,
    geodesy::GeodeticConverter,
    models::{Cartesian3, GeodeticPoint, ScreenPoint},
    viewer::SceneViewer,
};

/// A click resolved against the target viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPick {
    /// Click position expressed in the target viewer's surface.
    pub target_screen: ScreenPoint,
    pub cartesian: Cartesian3,
    pub geographic: GeodeticPoint,
}

/// Pointer readout shown while hovering a viewer.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct CoordinateReadout {
    pub screen: ScreenPoint,
    pub geographic: GeodeticPoint,
    pub hit: bool,
}

#[derive(Clone)]
pub struct CoordinateResolver {
    converter: Arc<dyn GeodeticConverter>,
}

impl CoordinateResolver {
    pub fn new(converter: Arc<dyn GeodeticConverter>) -> Self {
        Self { converter }
    }

    pub fn pick(&self, viewer: &dyn SceneViewer, screen: ScreenPoint) -> Option<Cartesian3> {
        viewer.pick_position(screen)
    }

    pub fn resolve(&self, viewer: &dyn SceneViewer, screen: ScreenPoint) -> Option<GeodeticPoint> {
        let world = self.pick(viewer, screen)?;
        self.converter.to_geodetic(&world)
    }

    /// Maps `screen` from `source` into `target` through the world point under
    /// it. Falls back to the unmapped position when either step fails.
    pub fn remap_across_viewers(
        &self,
        source: &dyn SceneViewer,
        target: &dyn SceneViewer,
        screen: ScreenPoint,
    ) -> ScreenPoint {
        let Some(world) = source.pick_position(screen) else {
            debug!(
                "remap: no surface at ({:.1}, {:.1}) in source viewer, using raw position",
                screen.x, screen.y
            );
            return screen;
        };

        match target.world_to_screen(&world) {
            Some(mapped) => mapped,
            None => {
                debug!("remap: world point not visible in target viewer, using raw position");
                screen
            }
        }
    }

    /// Resolves a click on `source` against `target`. Pass the same viewer for
    /// both when no remap is needed.
    pub fn resolve_click(
        &self,
        source: &dyn SceneViewer,
        target: &dyn SceneViewer,
        remap: bool,
        screen: ScreenPoint,
    ) -> Result<ResolvedPick, CaptureError> {
        let target_screen = if remap {
            self.remap_across_viewers(source, target, screen)
        } else {
            screen
        };

        let miss = || CaptureError::PickFailure {
            x: target_screen.x,
            y: target_screen.y,
        };
        let cartesian = self.pick(target, target_screen).ok_or_else(miss)?;
        let geographic = self.converter.to_geodetic(&cartesian).ok_or_else(miss)?;

        Ok(ResolvedPick {
            target_screen,
            cartesian,
            geographic,
        })
    }

    /// Readout for the pointer at `screen`; zeros when nothing is hit.
    pub fn readout(
        &self,
        source: &dyn SceneViewer,
        target: &dyn SceneViewer,
        remap: bool,
        screen: ScreenPoint,
    ) -> CoordinateReadout {
        let target_screen = if remap {
            self.remap_across_viewers(source, target, screen)
        } else {
            screen
        };
        let resolved = self.resolve(target, target_screen);

        CoordinateReadout {
            screen: ScreenPoint::new(target_screen.x.round(), target_screen.y.round()),
            geographic: resolved.map(|g| g.rounded()).unwrap_or_default(),
            hit: resolved.is_some(),
        }
    }
}
