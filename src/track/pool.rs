//! Slot pool manager
//!
//! Owns the fixed-capacity slot array and routes every incoming event to
//! the right slot. Matching is deterministic: slots are visited in index
//! order and the first claimant wins. Loss handling is isolated: one
//! slot's timeout never touches its neighbours; only a session-fatal
//! error resets the whole pool.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::detect::DetectorService;
use crate::error::StyleError;
use crate::imagery::{AnchorHandle, ImageDigest, ReferenceImage, ReferenceImageId, SourceImage,
    StyledImage};
use crate::present::PresentationSink;
use crate::session::SessionErrorKind;
use crate::style::StyleRequester;
use crate::track::slot::TrackedSlot;
use crate::track::timeout::{TimeoutScheduler, DEFAULT_TIMEOUT};

/// Banner shown whenever a slot frees up and detection should resume.
const SEARCH_MESSAGE: &str = "Look for a rectangular image.";

/// Pool-wide tuning knobs.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Number of slots, equal to the session host's tracked-image limit
    pub capacity: usize,
    /// Tracking-loss timeout per slot
    pub timeout: Duration,
    /// Initial fade state for every slot
    pub fade_by_default: bool,
    /// Pause between style generations while the fade loop runs
    pub style_cycle_delay: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            capacity: 2,
            timeout: DEFAULT_TIMEOUT,
            fade_by_default: true,
            style_cycle_delay: Duration::from_millis(400),
        }
    }
}

/// Fixed-capacity collection of tracked-image slots.
pub struct SlotPool {
    slots: Vec<TrackedSlot>,
    detector: Arc<dyn DetectorService>,
    sink: Arc<dyn PresentationSink>,
    losses: u64,
}

impl SlotPool {
    /// Create a pool of empty slots.
    pub fn new(
        settings: &PoolSettings,
        scheduler: Arc<dyn TimeoutScheduler>,
        style: Arc<dyn StyleRequester>,
        sink: Arc<dyn PresentationSink>,
        detector: Arc<dyn DetectorService>,
    ) -> Self {
        let slots = (0..settings.capacity)
            .map(|index| {
                TrackedSlot::new(
                    index,
                    settings.timeout,
                    settings.fade_by_default,
                    settings.style_cycle_delay,
                    scheduler.clone(),
                    style.clone(),
                    sink.clone(),
                )
            })
            .collect();
        Self {
            slots,
            detector,
            sink,
            losses: 0,
        }
    }

    /// Number of slots in the pool.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the pool has no slots at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Borrow a slot for inspection.
    pub fn slot(&self, index: usize) -> Option<&TrackedSlot> {
        self.slots.get(index)
    }

    /// Iterate slots in index order.
    pub fn slots(&self) -> impl Iterator<Item = &TrackedSlot> {
        self.slots.iter()
    }

    /// Index of the first empty slot, if any.
    pub fn first_empty(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.is_empty())
    }

    /// Whether some slot already tracks an image with this content digest.
    pub fn is_tracking_digest(&self, digest: &ImageDigest) -> bool {
        self.slots
            .iter()
            .filter_map(|slot| slot.reference())
            .any(|reference| &reference.digest == digest)
    }

    /// Assign a reference image to the first empty slot. Returns the slot
    /// index, or `None` when the pool is full or already tracks an image
    /// with the same content.
    pub fn assign(&mut self, reference: ReferenceImage, source: Arc<SourceImage>) -> Option<usize> {
        if self.is_tracking_digest(&reference.digest) {
            debug!(reference = %reference.id, "duplicate of a tracked image, skipped");
            return None;
        }
        let Some(index) = self.first_empty() else {
            debug!(reference = %reference.id, "no empty slot available, skipped");
            return None;
        };
        match self.slots[index].assign(reference, source) {
            Ok(()) => Some(index),
            Err(error) => {
                // first_empty just said the slot was free; never expected.
                warn!(%error, "assignment to empty slot refused");
                None
            }
        }
    }

    /// Reference images of all occupied slots, in index order.
    pub fn tracking_images(&self) -> Vec<ReferenceImage> {
        self.slots
            .iter()
            .filter_map(|slot| slot.reference().cloned())
            .collect()
    }

    /// Route an anchor-added event to the first slot holding the matched
    /// reference image. At most one slot claims an anchor.
    pub fn dispatch_anchor_added(&mut self, anchor: AnchorHandle, reference: ReferenceImageId) {
        for slot in &mut self.slots {
            if slot.bind_anchor(anchor, reference) {
                return;
            }
        }
        // Expected after a reset raced the host's event delivery.
        debug!(?anchor, %reference, "anchor added for unknown reference, ignored");
    }

    /// Route an anchor-updated event to the slot bound to that handle.
    pub fn dispatch_anchor_updated(&mut self, anchor: AnchorHandle, is_tracked: bool) {
        for slot in &mut self.slots {
            if slot.refresh_anchor(anchor, is_tracked) {
                return;
            }
        }
        debug!(?anchor, "anchor update matches no slot, ignored");
    }

    /// Handle a timeout fire. Stale epochs are dropped; a current fire
    /// frees exactly this slot and asks the detector for a replacement.
    pub fn dispatch_slot_timed_out(&mut self, slot: usize, epoch: u64) {
        let Some(tracked) = self.slots.get_mut(slot) else {
            warn!(slot, "timeout fired for slot outside the pool");
            return;
        };
        if !tracked.accepts_timeout(epoch) {
            debug!(slot, epoch, "superseded timeout fire dropped");
            return;
        }

        info!(slot, "tracking lost, freeing slot");
        tracked.reset();
        self.losses += 1;
        self.sink.show_transient_message(SEARCH_MESSAGE);
        self.detector.request_candidates(1);
    }

    /// Deliver a style completion to its slot.
    pub fn dispatch_style_ready(&mut self, slot: usize, cycle: u64, image: StyledImage) {
        let Some(tracked) = self.slots.get_mut(slot) else {
            warn!(slot, "style completion for slot outside the pool");
            return;
        };
        tracked.on_style_generated(cycle, image);
    }

    /// Handle a style-generation failure. A current failure means the
    /// slot cannot show anything useful; treat it like tracking loss.
    pub fn dispatch_style_failed(&mut self, slot: usize, cycle: u64, style_error: &StyleError) {
        let Some(tracked) = self.slots.get_mut(slot) else {
            warn!(slot, "style failure for slot outside the pool");
            return;
        };
        if !tracked.accepts_style(cycle) {
            debug!(slot, cycle, "stale style failure dropped");
            return;
        }

        error!(slot, %style_error, "style generation failed, freeing slot");
        tracked.reset();
        self.losses += 1;
        self.sink.show_transient_message(SEARCH_MESSAGE);
        self.detector.request_candidates(1);
    }

    /// Session-wide invalidation: every slot is reset and re-detection is
    /// requested for the whole pool. Only `Fatal` kinds are surfaced to
    /// the user.
    pub fn dispatch_session_fatal(&mut self, kind: &SessionErrorKind) {
        error!(%kind, "tracking session failed, resetting pool");
        for slot in &mut self.slots {
            slot.reset();
        }
        if kind.user_visible() {
            self.sink
                .show_transient_message(&format!("The tracking session failed: {kind}."));
        }
        self.sink.show_transient_message(SEARCH_MESSAGE);
        self.detector.request_candidates(self.slots.len());
    }

    /// Toggle fading for one slot, or for every slot when `target` is
    /// `None`.
    pub fn toggle_fade(&mut self, target: Option<usize>) {
        match target {
            Some(index) => {
                let Some(slot) = self.slots.get_mut(index) else {
                    warn!(index, "fade toggle for slot outside the pool");
                    return;
                };
                let enabled = slot.toggle_fade();
                self.sink.show_transient_message(fade_message(enabled));
            }
            None => {
                for slot in &mut self.slots {
                    let enabled = slot.toggle_fade();
                    self.sink.show_transient_message(fade_message(enabled));
                }
            }
        }
    }

    /// Number of isolated tracking losses handled so far.
    pub fn losses(&self) -> u64 {
        self.losses
    }
}

fn fade_message(enabled: bool) -> &'static str {
    if enabled {
        "Resume fading between styles."
    } else {
        "Pause fading between styles."
    }
}
