use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use anyhow::Result;
use async_trait::async_trait;
use image::{Rgba, RgbaImage};

use geoclip_lib::{
    geodesy::GeodeticConverter,
    models::{Cartesian3, FileEntry, FileKind, GeodeticPoint, ScreenPoint, ViewerPose},
    status::{StatusEvent, StatusSink},
    storage::{
        ArtifactStorage, ListFilesRequest, ListFilesResponse, SaveImageRequest, SaveJsonRequest,
        SaveResponse,
    },
    viewer::{InputSubscription, SceneViewer},
};

pub const SURFACE_SIZE: u32 = 64;

/// Maps every world point to 0°, 0°, 0 m.
pub struct ZeroConverter;

impl GeodeticConverter for ZeroConverter {
    fn to_geodetic(&self, _world: &Cartesian3) -> Option<GeodeticPoint> {
        Some(GeodeticPoint::default())
    }
}

#[derive(Clone, Copy)]
pub enum PickMode {
    /// World point is `(x, y, 0)` for screen `(x, y)`.
    Identity,
    Fixed(Cartesian3),
    Miss,
}

#[derive(Clone, Copy)]
pub enum Projection {
    Identity,
    /// Screen position is the world `(x, y)` times the factor.
    Scale(f64),
    Hidden,
}

pub struct MockViewer {
    pick_mode: PickMode,
    projection: Projection,
    scripted_picks: Mutex<VecDeque<Option<Cartesian3>>>,
    pose: ViewerPose,
    locked: AtomicBool,
    pub lock_calls: AtomicUsize,
    pub unlock_calls: AtomicUsize,
    pub installs: AtomicUsize,
    pub disposals: Arc<AtomicUsize>,
}

impl MockViewer {
    pub fn new() -> Self {
        Self {
            pick_mode: PickMode::Identity,
            projection: Projection::Identity,
            scripted_picks: Mutex::new(VecDeque::new()),
            pose: ViewerPose {
                position: Cartesian3::new(-2_178_000.1234, 4_388_000.5678, 4_070_000.9012),
                heading: 0.123_456_789,
                pitch: -0.785_398_163,
                roll: 0.0,
            },
            locked: AtomicBool::new(false),
            lock_calls: AtomicUsize::new(0),
            unlock_calls: AtomicUsize::new(0),
            installs: AtomicUsize::new(0),
            disposals: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_pick(mut self, mode: PickMode) -> Self {
        self.pick_mode = mode;
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    /// Queues pick results consumed before falling back to the pick mode.
    pub fn script_picks(&self, picks: impl IntoIterator<Item = Option<Cartesian3>>) {
        self.scripted_picks.lock().unwrap().extend(picks);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    pub fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }
}

impl SceneViewer for MockViewer {
    fn pick_position(&self, screen: ScreenPoint) -> Option<Cartesian3> {
        if let Some(scripted) = self.scripted_picks.lock().unwrap().pop_front() {
            return scripted;
        }
        match self.pick_mode {
            PickMode::Identity => Some(Cartesian3::new(screen.x, screen.y, 0.0)),
            PickMode::Fixed(world) => Some(world),
            PickMode::Miss => None,
        }
    }

    fn world_to_screen(&self, world: &Cartesian3) -> Option<ScreenPoint> {
        match self.projection {
            Projection::Identity => Some(ScreenPoint::new(world.x, world.y)),
            Projection::Scale(factor) => Some(ScreenPoint::new(world.x * factor, world.y * factor)),
            Projection::Hidden => None,
        }
    }

    fn camera_pose(&self) -> ViewerPose {
        self.pose
    }

    fn render_surface(&self) -> RgbaImage {
        RgbaImage::from_pixel(SURFACE_SIZE, SURFACE_SIZE, Rgba([40, 120, 200, 255]))
    }

    fn lock_interaction(&self) {
        self.lock_calls.fetch_add(1, Ordering::SeqCst);
        self.locked.store(true, Ordering::SeqCst);
    }

    fn unlock_interaction(&self) {
        self.unlock_calls.fetch_add(1, Ordering::SeqCst);
        self.locked.store(false, Ordering::SeqCst);
    }

    fn install_capture_input(&self) -> Result<Box<dyn InputSubscription>> {
        self.installs.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingSubscription {
            disposals: self.disposals.clone(),
        }))
    }
}

struct CountingSubscription {
    disposals: Arc<AtomicUsize>,
}

impl InputSubscription for CountingSubscription {
    fn dispose(&mut self) {
        self.disposals.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory storage that records every write.
#[derive(Default)]
pub struct MockStorage {
    pub fail_image: AtomicBool,
    pub fail_json: AtomicBool,
    /// Metadata writes never complete.
    pub stall_json: AtomicBool,
    images: Mutex<Vec<SaveImageRequest>>,
    documents: Mutex<Vec<SaveJsonRequest>>,
}

impl MockStorage {
    pub fn failing_metadata() -> Self {
        let storage = Self::default();
        storage.fail_json.store(true, Ordering::SeqCst);
        storage
    }

    pub fn images(&self) -> Vec<SaveImageRequest> {
        self.images.lock().unwrap().clone()
    }

    pub fn documents(&self) -> Vec<SaveJsonRequest> {
        self.documents.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactStorage for MockStorage {
    async fn save_image(&self, request: SaveImageRequest) -> SaveResponse {
        if self.fail_image.load(Ordering::SeqCst) {
            return SaveResponse::failed("disk full");
        }
        let path = format!("{}/{}", request.default_path, request.filename);
        self.images.lock().unwrap().push(request);
        SaveResponse::saved(path)
    }

    async fn save_json(&self, request: SaveJsonRequest) -> SaveResponse {
        if self.stall_json.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_json.load(Ordering::SeqCst) {
            return SaveResponse::failed("permission denied");
        }
        let path = format!("{}/{}", request.default_path, request.filename);
        self.documents.lock().unwrap().push(request);
        SaveResponse::saved(path)
    }

    async fn list_files(&self, request: ListFilesRequest) -> ListFilesResponse {
        let images = self.images().into_iter().map(|r| (r.filename, FileKind::Image));
        let documents = self
            .documents()
            .into_iter()
            .map(|r| (r.filename, FileKind::Metadata));
        let files = images
            .chain(documents)
            .map(|(name, kind)| FileEntry {
                path: format!("{}/{name}", request.path),
                name,
                kind,
                timestamp: 1,
            })
            .collect();
        ListFilesResponse::listed(files)
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<StatusEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<StatusEvent> {
        self.events.lock().unwrap().last().cloned()
    }
}

impl StatusSink for RecordingSink {
    fn publish(&self, event: StatusEvent) {
        self.events.lock().unwrap().push(event);
    }
}
