pub mod artifact;
pub mod geometry;

pub use artifact::{artifact_base_name, ArtifactGroup, FileEntry, FileKind, GroupStatus};
pub use geometry::{round_to, CapturePoint, Cartesian3, GeodeticPoint, ScreenPoint, ViewerPose};
