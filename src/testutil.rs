//! Shared test doubles for the tracking core
//!
//! Recording implementations of every external seam, plus helpers for
//! synthesizing candidates and references. Compiled for tests only.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

use crate::detect::DetectorService;
use crate::imagery::{
    ReferenceImage, ReferenceImageId, SourceImage, StyledImage, DEFAULT_PHYSICAL_WIDTH_M,
};
use crate::present::PresentationSink;
use crate::session::TrackingSessionHost;
use crate::style::{StyleRequest, StyleRequester};
use crate::track::timeout::TimeoutScheduler;
use crate::track::{PoolSettings, SlotPool};

/// Records every `(slot, epoch, deadline)` arm request.
#[derive(Default)]
pub struct RecordingScheduler {
    pub armed: Mutex<Vec<(usize, u64, Instant)>>,
}

impl TimeoutScheduler for RecordingScheduler {
    fn schedule(&self, slot: usize, epoch: u64, deadline: Instant) {
        self.armed.lock().push((slot, epoch, deadline));
    }
}

/// Records style generation requests instead of running them.
#[derive(Default)]
pub struct RecordingRequester {
    pub requests: Mutex<Vec<StyleRequest>>,
}

impl StyleRequester for RecordingRequester {
    fn request(&self, request: StyleRequest) {
        self.requests.lock().push(request);
    }
}

/// Records banners and visual updates.
#[derive(Default)]
pub struct RecordingSink {
    pub messages: Mutex<Vec<String>>,
    /// `(slot, style_index)` pairs in delivery order
    pub visuals: Mutex<Vec<(usize, u32)>>,
}

impl PresentationSink for RecordingSink {
    fn show_transient_message(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }

    fn update_visual(&self, slot: usize, image: &StyledImage) {
        self.visuals.lock().push((slot, image.style_index));
    }
}

/// Records re-acquisition requests.
#[derive(Default)]
pub struct RecordingDetector {
    pub requests: Mutex<Vec<usize>>,
}

impl DetectorService for RecordingDetector {
    fn request_candidates(&self, wanted: usize) {
        self.requests.lock().push(wanted);
    }
}

/// Records session restarts.
#[derive(Default)]
pub struct RecordingSession {
    /// `(image ids, reset_existing)` per start request
    pub starts: Mutex<Vec<(Vec<ReferenceImageId>, bool)>>,
}

impl TrackingSessionHost for RecordingSession {
    fn start_tracking(&self, images: Vec<ReferenceImage>, reset_existing: bool) {
        let ids = images.iter().map(|image| image.id).collect();
        self.starts.lock().push((ids, reset_existing));
    }

    fn stop_tracking(&self) {}
}

/// External seams of a pool built by `pool_fixture`.
pub struct PoolSeams {
    pub scheduler: Arc<RecordingScheduler>,
    pub requester: Arc<RecordingRequester>,
    pub sink: Arc<RecordingSink>,
    pub detector: Arc<RecordingDetector>,
}

/// Build a pool wired entirely to recording seams.
pub fn pool_fixture(capacity: usize) -> (SlotPool, PoolSeams) {
    let seams = PoolSeams {
        scheduler: Arc::new(RecordingScheduler::default()),
        requester: Arc::new(RecordingRequester::default()),
        sink: Arc::new(RecordingSink::default()),
        detector: Arc::new(RecordingDetector::default()),
    };
    let settings = PoolSettings {
        capacity,
        ..PoolSettings::default()
    };
    let pool = SlotPool::new(
        &settings,
        seams.scheduler.clone(),
        seams.requester.clone(),
        seams.sink.clone(),
        seams.detector.clone(),
    );
    (pool, seams)
}

/// A 16x16 gradient candidate; distinct seeds yield distinct digests and
/// every seed passes the default texture validation.
pub fn test_candidate(seed: u8) -> SourceImage {
    const SIDE: u32 = 16;
    let mut data = Vec::with_capacity((SIDE * SIDE * 4) as usize);
    for y in 0..SIDE {
        for x in 0..SIDE {
            let value = ((x * SIDE + y) as u8).wrapping_add(seed.wrapping_mul(7));
            data.extend_from_slice(&[value, value.wrapping_add(seed), value, 255]);
        }
    }
    SourceImage::new(data, SIDE, SIDE)
}

/// A reference image plus the candidate it was derived from.
pub fn test_reference(seed: u8) -> (ReferenceImage, Arc<SourceImage>) {
    let candidate = test_candidate(seed);
    let reference = ReferenceImage::from_candidate(&candidate, DEFAULT_PHYSICAL_WIDTH_M);
    (reference, Arc::new(candidate))
}

/// A 1x1 styled image carrying the given style index.
pub fn styled(style_index: u32) -> StyledImage {
    StyledImage {
        data: vec![0, 0, 0, 255],
        width: 1,
        height: 1,
        style_index,
    }
}
