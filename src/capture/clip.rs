use std::io::Cursor;

use anyhow::{Context, Result};
use base64::Engine as _;
use image::{ImageFormat, Rgba, RgbaImage};

use crate::{error::CaptureError, models::ScreenPoint, viewer::SceneViewer};

use super::state::REQUIRED_POINTS;

/// Pixel-aligned bounding box of the clip polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl ClipBounds {
    pub fn from_points(points: &[ScreenPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in &points[1..] {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x) as u32
    }

    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y) as u32
    }
}

/// Interior of the capture quadrilateral cut out of the viewer surface.
#[derive(Debug, Clone)]
pub struct ClippedRegion {
    pub image: RgbaImage,
    pub bounds: ClipBounds,
}

impl ClippedRegion {
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.image
            .write_to(&mut buffer, ImageFormat::Png)
            .context("failed to encode clipped region as PNG")?;
        Ok(buffer.into_inner())
    }

    pub fn to_data_uri(&self) -> Result<String> {
        let png = self.encode_png()?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png)
        ))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClipExtractor;

impl ClipExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Copies the pixels inside the polygon traced by `points` in the given
    /// order. A crossing click order yields a bowtie and both lobes are kept.
    pub fn extract(
        &self,
        viewer: &dyn SceneViewer,
        points: &[ScreenPoint],
    ) -> Result<ClippedRegion, CaptureError> {
        if points.len() != REQUIRED_POINTS {
            return Err(CaptureError::precondition(format!(
                "extraction needs {REQUIRED_POINTS} points, got {}",
                points.len()
            )));
        }
        let surface = viewer.render_surface();
        clip_polygon(&surface, points)
    }
}

/// Clips `surface` to the closed polygon `points` within its bounding box.
pub fn clip_polygon(surface: &RgbaImage, points: &[ScreenPoint]) -> Result<ClippedRegion, CaptureError> {
    let bounds = ClipBounds::from_points(points)
        .ok_or_else(|| CaptureError::ExtractionFailed("no clip points".into()))?;
    let (width, height) = (bounds.width(), bounds.height());
    if width == 0 || height == 0 {
        return Err(CaptureError::ExtractionFailed(format!(
            "clip region is empty ({width}x{height})"
        )));
    }

    let origin_x = bounds.min_x.floor() as i64;
    let origin_y = bounds.min_y.floor() as i64;
    // Output pixel (x, y) maps to surface pixel (origin + x, origin + y).
    let local: Vec<ScreenPoint> = points
        .iter()
        .map(|p| ScreenPoint::new(p.x - origin_x as f64, p.y - origin_y as f64))
        .collect();

    let mut image = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    let (x_range, y_range) = (
        overlap(origin_x, width, surface.width()),
        overlap(origin_y, height, surface.height()),
    );
    for y in y_range {
        for x in x_range.clone() {
            let centre = ScreenPoint::new(x as f64 + 0.5, y as f64 + 0.5);
            if polygon_contains(&local, centre) {
                let (src_x, src_y) = ((origin_x + x as i64) as u32, (origin_y + y as i64) as u32);
                image.put_pixel(x, y, *surface.get_pixel(src_x, src_y));
            }
        }
    }

    Ok(ClippedRegion { image, bounds })
}

/// Output indices in `0..len` whose source index `origin + i` lies in
/// `0..extent`.
fn overlap(origin: i64, len: u32, extent: u32) -> std::ops::Range<u32> {
    let start = (-origin).clamp(0, len as i64);
    let end = (extent as i64 - origin).clamp(start, len as i64);
    start as u32..end as u32
}

/// Even-odd ray casting test.
pub fn polygon_contains(vertices: &[ScreenPoint], point: ScreenPoint) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let vi = vertices[i];
        let vj = vertices[j];
        if (vi.y > point.y) != (vj.y > point.y)
            && point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cartesian3, ViewerPose};

    fn solid(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 200, 255]))
    }

    fn pts(coords: &[(f64, f64)]) -> Vec<ScreenPoint> {
        coords.iter().map(|&(x, y)| ScreenPoint::new(x, y)).collect()
    }

    struct FlatViewer(RgbaImage);

    impl SceneViewer for FlatViewer {
        fn pick_position(&self, _screen: ScreenPoint) -> Option<Cartesian3> {
            None
        }

        fn world_to_screen(&self, _world: &Cartesian3) -> Option<ScreenPoint> {
            None
        }

        fn camera_pose(&self) -> ViewerPose {
            ViewerPose::default()
        }

        fn render_surface(&self) -> RgbaImage {
            self.0.clone()
        }

        fn lock_interaction(&self) {}

        fn unlock_interaction(&self) {}

        fn install_capture_input(&self) -> anyhow::Result<Box<dyn crate::viewer::InputSubscription>> {
            anyhow::bail!("input not supported")
        }
    }

    #[test]
    fn rectangle_keeps_every_pixel() {
        let surface = solid(50, 50);
        let region = clip_polygon(
            &surface,
            &pts(&[(10.0, 10.0), (30.0, 10.0), (30.0, 20.0), (10.0, 20.0)]),
        )
        .unwrap();

        assert_eq!(region.image.dimensions(), (20, 10));
        assert!(region.image.pixels().all(|p| p[3] == 255));
        assert_eq!(*region.image.get_pixel(0, 0), Rgba([10, 10, 200, 255]));
    }

    #[test]
    fn fractional_corners_test_the_copied_pixel_centre() {
        let surface = solid(64, 64);
        let region = clip_polygon(
            &surface,
            &pts(&[(10.6, 10.6), (30.6, 10.6), (30.6, 30.6), (10.6, 30.6)]),
        )
        .unwrap();

        assert_eq!(region.image.dimensions(), (20, 20));
        // Column/row 0 copies surface 10, whose centre 10.5 is outside x >= 10.6.
        assert_eq!(region.image.get_pixel(0, 5)[3], 0);
        assert_eq!(region.image.get_pixel(5, 0)[3], 0);
        assert_eq!(*region.image.get_pixel(1, 1), Rgba([11, 11, 200, 255]));
        assert_eq!(*region.image.get_pixel(19, 19), Rgba([29, 29, 200, 255]));
    }

    #[test]
    fn extract_rejects_fewer_than_four_points() {
        let viewer = FlatViewer(solid(20, 20));
        let result = ClipExtractor::new().extract(
            &viewer,
            &pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]),
        );
        assert!(matches!(
            result,
            Err(CaptureError::InvalidSessionPrecondition(_))
        ));
    }

    #[test]
    fn extract_clips_the_viewer_surface() {
        let viewer = FlatViewer(solid(20, 20));
        let region = ClipExtractor::new()
            .extract(
                &viewer,
                &pts(&[(2.0, 2.0), (12.0, 2.0), (12.0, 8.0), (2.0, 8.0)]),
            )
            .unwrap();
        assert_eq!(region.image.dimensions(), (10, 6));
        assert_eq!(*region.image.get_pixel(0, 0), Rgba([2, 2, 200, 255]));
    }

    #[test]
    fn triangle_half_is_transparent_outside() {
        let surface = solid(40, 40);
        // Diamond: corners of the bounding box fall outside.
        let region = clip_polygon(
            &surface,
            &pts(&[(20.0, 0.0), (40.0, 20.0), (20.0, 40.0), (0.0, 20.0)]),
        )
        .unwrap();

        assert_eq!(region.image.get_pixel(0, 0)[3], 0);
        assert_eq!(region.image.get_pixel(39, 39)[3], 0);
        assert_eq!(region.image.get_pixel(20, 20)[3], 255);
    }

    #[test]
    fn bowtie_order_is_not_convexified() {
        let surface = solid(20, 20);
        // Crossing order: (0,0) -> (20,0) -> (0,20) -> (20,20).
        let region = clip_polygon(
            &surface,
            &pts(&[(0.0, 0.0), (20.0, 0.0), (0.0, 20.0), (20.0, 20.0)]),
        )
        .unwrap();

        // Top and bottom lobes are kept, left and right wedges are not.
        assert_eq!(region.image.get_pixel(10, 2)[3], 255);
        assert_eq!(region.image.get_pixel(10, 17)[3], 255);
        assert_eq!(region.image.get_pixel(1, 10)[3], 0);
        assert_eq!(region.image.get_pixel(18, 10)[3], 0);
    }

    #[test]
    fn pixels_outside_the_surface_stay_transparent() {
        let surface = solid(10, 10);
        let region = clip_polygon(
            &surface,
            &pts(&[(5.0, 5.0), (15.0, 5.0), (15.0, 15.0), (5.0, 15.0)]),
        )
        .unwrap();

        assert_eq!(region.image.get_pixel(1, 1)[3], 255);
        assert_eq!(region.image.get_pixel(8, 8)[3], 0);
    }

    #[test]
    fn corners_left_of_the_surface_stay_transparent() {
        let surface = solid(10, 10);
        let region = clip_polygon(
            &surface,
            &pts(&[(-5.0, 0.0), (5.0, 0.0), (5.0, 10.0), (-5.0, 10.0)]),
        )
        .unwrap();

        assert_eq!(region.image.dimensions(), (10, 10));
        assert_eq!(region.image.get_pixel(4, 4)[3], 0);
        assert_eq!(*region.image.get_pixel(5, 4), Rgba([0, 4, 200, 255]));
    }

    #[test]
    fn overlap_clamps_to_the_source_extent() {
        assert_eq!(overlap(0, 10, 64), 0..10);
        assert_eq!(overlap(-3, 10, 64), 3..10);
        assert_eq!(overlap(60, 10, 64), 0..4);
        assert_eq!(overlap(100, 10, 64), 0..0);
        assert_eq!(overlap(-20, 10, 64), 10..10);
    }

    #[test]
    fn collinear_points_fail() {
        let surface = solid(10, 10);
        let result = clip_polygon(
            &surface,
            &pts(&[(1.0, 5.0), (3.0, 5.0), (6.0, 5.0), (9.0, 5.0)]),
        );
        assert!(matches!(result, Err(CaptureError::ExtractionFailed(_))));
    }

    #[test]
    fn data_uri_carries_png_prefix() {
        let surface = solid(10, 10);
        let region = clip_polygon(
            &surface,
            &pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]),
        )
        .unwrap();
        assert!(region.to_data_uri().unwrap().starts_with("data:image/png;base64,"));
    }
}
