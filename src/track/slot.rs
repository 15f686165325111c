//! One tracked-image slot
//!
//! A slot walks `Empty -> Populated (assign) -> Active (bind_anchor) ->
//! Empty (timeout, style failure, fatal error, reset)`. All mutation
//! happens on the core event thread; asynchronous work (style generation,
//! timeout fires) re-enters through epoch- and cycle-checked events.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::error::SlotError;
use crate::imagery::{AnchorHandle, ReferenceImage, ReferenceImageId, SourceImage, StyledImage};
use crate::present::PresentationSink;
use crate::style::{StyleRequest, StyleRequester};
use crate::track::timeout::{TimeoutGuard, TimeoutScheduler};

/// One fixed position in the tracking pool.
pub struct TrackedSlot {
    index: usize,
    reference: Option<ReferenceImage>,
    /// Pixels style generation works from; retained alongside the
    /// descriptor for as long as the slot is occupied.
    source: Option<Arc<SourceImage>>,
    anchor: Option<AnchorHandle>,
    is_tracked: bool,
    latest_content: Option<StyledImage>,
    fade_enabled: bool,
    /// Assignment generation. Bumped on assign and reset; style
    /// completions carrying an older cycle are stale and dropped.
    cycle: u64,
    next_style: u32,
    cycle_delay: Duration,
    guard: TimeoutGuard,
    style: Arc<dyn StyleRequester>,
    sink: Arc<dyn PresentationSink>,
}

impl TrackedSlot {
    /// Create an empty slot.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: usize,
        timeout: Duration,
        fade_enabled: bool,
        cycle_delay: Duration,
        scheduler: Arc<dyn TimeoutScheduler>,
        style: Arc<dyn StyleRequester>,
        sink: Arc<dyn PresentationSink>,
    ) -> Self {
        Self {
            index,
            reference: None,
            source: None,
            anchor: None,
            is_tracked: false,
            latest_content: None,
            fade_enabled,
            cycle: 0,
            next_style: 0,
            cycle_delay,
            guard: TimeoutGuard::new(index, timeout, scheduler),
            style,
            sink,
        }
    }

    /// Populate the slot with a reference image. Starts the timeout right
    /// away so an image that never becomes trackable frees the slot, and
    /// kicks off the first style generation.
    pub fn assign(
        &mut self,
        reference: ReferenceImage,
        source: Arc<SourceImage>,
    ) -> Result<(), SlotError> {
        if self.reference.is_some() {
            return Err(SlotError::AlreadyOccupied { slot: self.index });
        }

        self.cycle += 1;
        debug!(slot = self.index, reference = %reference.id, "slot assigned");
        self.reference = Some(reference);
        self.source = Some(source);
        self.guard.arm();
        self.request_next_style(Duration::ZERO);
        Ok(())
    }

    /// Bind the first matching anchor. First match wins: a slot that
    /// already holds an anchor refuses further binds.
    pub fn bind_anchor(&mut self, anchor: AnchorHandle, reference: ReferenceImageId) -> bool {
        let matches = self
            .reference
            .as_ref()
            .is_some_and(|held| held.id == reference);
        if !matches || self.anchor.is_some() {
            return false;
        }

        debug!(slot = self.index, ?anchor, "anchor bound");
        self.anchor = Some(anchor);
        self.is_tracked = true;
        self.guard.arm();

        // If the first generation completed before the anchor arrived,
        // display it now and resume the fade loop from it.
        let had_content = if let Some(content) = &self.latest_content {
            self.sink.update_visual(self.index, content);
            true
        } else {
            false
        };
        if had_content && self.fade_enabled {
            self.request_next_style(self.cycle_delay);
        }
        true
    }

    /// Refresh an already bound anchor. The deadline is extended only
    /// while the host still reports the anchor as tracked; a present but
    /// untracked anchor must not silently keep the slot alive.
    pub fn refresh_anchor(&mut self, anchor: AnchorHandle, is_tracked: bool) -> bool {
        if self.anchor != Some(anchor) {
            return false;
        }

        self.is_tracked = is_tracked;
        if is_tracked {
            self.guard.arm();
        }
        true
    }

    /// Deliver a style completion. Stale cycles (the slot was reset since
    /// the request) and completions arriving while fading is paused are
    /// discarded; the check happens here, at delivery time.
    pub fn on_style_generated(&mut self, cycle: u64, image: StyledImage) {
        if !self.accepts_style(cycle) {
            trace!(slot = self.index, cycle, "stale style completion dropped");
            return;
        }
        if !self.fade_enabled {
            trace!(slot = self.index, "fading paused, style completion discarded");
            return;
        }

        // Only the completion of the most recent request continues the
        // loop; an older in-flight completion may still display, but
        // letting it chain as well would fork the loop.
        let continues_loop = image.style_index.wrapping_add(1) == self.next_style;

        if self.anchor.is_some() {
            self.sink.update_visual(self.index, &image);
        }
        self.latest_content = Some(image);

        // The fade loop: keep cycling styles while the slot is on screen.
        if self.anchor.is_some() && continues_loop {
            self.request_next_style(self.cycle_delay);
        }
    }

    /// Whether a style completion carrying `cycle` is still current.
    pub fn accepts_style(&self, cycle: u64) -> bool {
        self.reference.is_some() && self.cycle == cycle
    }

    /// Flip style fading. Re-enabling while active requests the next
    /// generation so visuals resume animating. Returns the new state.
    pub fn toggle_fade(&mut self) -> bool {
        self.fade_enabled = !self.fade_enabled;
        if self.fade_enabled && self.anchor.is_some() {
            self.request_next_style(Duration::ZERO);
        }
        self.fade_enabled
    }

    /// Return the slot to the empty state. Idempotent.
    pub fn reset(&mut self) {
        if self.reference.is_none() {
            return;
        }

        debug!(slot = self.index, "slot reset");
        self.reference = None;
        self.source = None;
        self.anchor = None;
        self.is_tracked = false;
        self.latest_content = None;
        self.next_style = 0;
        self.guard.cancel();
        // Invalidate style completions still in flight for the old
        // occupancy.
        self.cycle += 1;
    }

    /// Whether a timeout fire carrying `epoch` is still current.
    pub fn accepts_timeout(&self, epoch: u64) -> bool {
        self.guard.accepts(epoch)
    }

    fn request_next_style(&mut self, delay: Duration) {
        let Some(source) = self.source.clone() else {
            return;
        };
        let style_index = self.next_style;
        self.next_style = self.next_style.wrapping_add(1);
        self.style.request(StyleRequest {
            slot: self.index,
            cycle: self.cycle,
            style_index,
            source,
            delay,
        });
    }

    /// Stable position in the pool.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The reference image this slot is tracking, if any.
    pub fn reference(&self) -> Option<&ReferenceImage> {
        self.reference.as_ref()
    }

    /// The bound anchor, if tracking has started.
    pub fn anchor(&self) -> Option<AnchorHandle> {
        self.anchor
    }

    /// Last known tracking-health flag.
    pub fn is_tracked(&self) -> bool {
        self.is_tracked
    }

    /// Whether the slot holds no reference image.
    pub fn is_empty(&self) -> bool {
        self.reference.is_none()
    }

    /// Most recent styled output, if any was delivered.
    pub fn latest_content(&self) -> Option<&StyledImage> {
        self.latest_content.as_ref()
    }

    /// Whether style fading is on for this slot.
    pub fn fade_enabled(&self) -> bool {
        self.fade_enabled
    }

    /// Current assignment cycle.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Current timeout state.
    pub fn guard(&self) -> &TimeoutGuard {
        &self.guard
    }
}
