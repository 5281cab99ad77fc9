pub mod clip;
pub mod commands;
pub mod controller;
pub mod metadata;
pub mod persist;
pub mod resolver;
pub mod state;

pub use clip::{ClipExtractor, ClippedRegion};
pub use controller::{ClickOutcome, QuadrilateralSelector};
pub use metadata::{CaptureMetadata, QuadFootprint};
pub use persist::ArtifactPersister;
pub use resolver::{CoordinateReadout, CoordinateResolver, ResolvedPick};
pub use state::{CaptureOutcome, CaptureSession, CaptureState, CaptureStatus};
