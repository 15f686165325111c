//! Simulated collaborators for the demo binary
//!
//! Stand-ins for the camera-side detector and the platform tracking
//! session: the detector synthesizes rectangle candidates, the session
//! host answers `start_tracking` with scripted anchor events. Both feed
//! the same core event channel a real platform integration would.

use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::detect::DetectorService;
use crate::events::CoreEvent;
use crate::imagery::{AnchorHandle, ReferenceImage, SourceImage};
use crate::session::TrackingSessionHost;

/// How long the simulated camera "scans" before producing candidates.
const SCAN_DELAY: Duration = Duration::from_millis(300);

/// Detector that synthesizes textured candidates on request.
pub struct SimDetector {
    events: Sender<CoreEvent>,
    runtime: tokio::runtime::Handle,
    candidate_size: u32,
    next_seed: AtomicU32,
}

impl SimDetector {
    /// Create a detector emitting `candidate_size` square candidates.
    pub fn new(
        events: Sender<CoreEvent>,
        runtime: tokio::runtime::Handle,
        candidate_size: u32,
    ) -> Self {
        Self {
            events,
            runtime,
            candidate_size,
            next_seed: AtomicU32::new(0),
        }
    }
}

impl DetectorService for SimDetector {
    fn request_candidates(&self, wanted: usize) {
        let events = self.events.clone();
        let size = self.candidate_size;
        let base = self.next_seed.fetch_add(wanted as u32, Ordering::SeqCst);
        debug!(wanted, "simulated detector scanning");
        self.runtime.spawn(async move {
            tokio::time::sleep(SCAN_DELAY).await;
            let candidates = (0..wanted)
                .map(|offset| synthetic_candidate(base + offset as u32, size))
                .collect();
            let _ = events.send(CoreEvent::CandidatesDetected(candidates));
        });
    }
}

/// A textured square candidate; distinct seeds yield distinct content.
pub fn synthetic_candidate(seed: u32, size: u32) -> SourceImage {
    let side = size.max(1);
    let mut data = Vec::with_capacity((side * side * 4) as usize);
    for y in 0..side {
        for x in 0..side {
            let r = ((x * 255 / side) as u8).wrapping_add((seed.wrapping_mul(31)) as u8);
            let g = ((y * 255 / side) as u8).wrapping_add((seed.wrapping_mul(17)) as u8);
            let b = (((x ^ y) & 0xff) as u8).wrapping_add((seed.wrapping_mul(7)) as u8);
            data.extend_from_slice(&[r, g, b, 255]);
        }
    }
    SourceImage::new(data, side, side)
}

/// Scripts one tracked image to go silent, demonstrating isolated loss.
#[derive(Debug, Clone, Copy)]
pub struct LossScript {
    /// Position of the image in the `start_tracking` set
    pub image_index: usize,
    /// Silence begins this long after the anchor was added
    pub after: Duration,
}

/// Session host that echoes anchor events for every tracked image.
pub struct SimSessionHost {
    events: Sender<CoreEvent>,
    runtime: tokio::runtime::Handle,
    update_interval: Duration,
    acquire_delay: Duration,
    lose: Option<LossScript>,
    /// Bumped on every restart/stop; running echo tasks exit when their
    /// captured generation goes stale.
    generation: Arc<AtomicU64>,
    next_anchor: AtomicU64,
}

impl SimSessionHost {
    /// Create a host that adds anchors after `acquire_delay` and then
    /// refreshes them every `update_interval`.
    pub fn new(
        events: Sender<CoreEvent>,
        runtime: tokio::runtime::Handle,
        update_interval: Duration,
        acquire_delay: Duration,
        lose: Option<LossScript>,
    ) -> Self {
        Self {
            events,
            runtime,
            update_interval,
            acquire_delay,
            lose,
            generation: Arc::new(AtomicU64::new(0)),
            next_anchor: AtomicU64::new(1),
        }
    }
}

impl TrackingSessionHost for SimSessionHost {
    fn start_tracking(&self, images: Vec<ReferenceImage>, reset_existing: bool) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            images = images.len(),
            reset_existing, "simulated session restarted"
        );

        for (position, image) in images.into_iter().enumerate() {
            let anchor = AnchorHandle(self.next_anchor.fetch_add(1, Ordering::SeqCst));
            let reference = image.id;
            let events = self.events.clone();
            let generation_cell = self.generation.clone();
            let interval = self.update_interval;
            let acquire = self.acquire_delay * (position as u32 + 1);
            let silent_after_ticks = self.lose.and_then(|script| {
                (script.image_index == position)
                    .then(|| (script.after.as_millis() / interval.as_millis().max(1)) as u64)
            });

            self.runtime.spawn(async move {
                tokio::time::sleep(acquire).await;
                if generation_cell.load(Ordering::SeqCst) != generation {
                    return;
                }
                if events.send(CoreEvent::AnchorAdded { anchor, reference }).is_err() {
                    return;
                }

                let mut ticks = 0u64;
                loop {
                    tokio::time::sleep(interval).await;
                    if generation_cell.load(Ordering::SeqCst) != generation {
                        return;
                    }
                    if let Some(limit) = silent_after_ticks {
                        if ticks >= limit {
                            info!(?anchor, "simulated anchor went silent");
                            return;
                        }
                    }
                    let update = CoreEvent::AnchorUpdated {
                        anchor,
                        is_tracked: true,
                    };
                    if events.send(update).is_err() {
                        return;
                    }
                    ticks += 1;
                }
            });
        }
    }

    fn stop_tracking(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{DigestFactory, ReferenceImageFactory};
    use crate::imagery::DEFAULT_PHYSICAL_WIDTH_M;

    #[test]
    fn test_synthetic_candidates_are_distinct() {
        let a = synthetic_candidate(0, 64);
        let b = synthetic_candidate(1, 64);
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_synthetic_candidates_pass_validation() {
        let factory = DigestFactory::new(DEFAULT_PHYSICAL_WIDTH_M, 32, 8.0);
        let candidate = synthetic_candidate(3, 64);
        let reference = factory.convert(&candidate).unwrap();
        assert!(factory.validate(&reference, &candidate).is_ok());
    }
}
