//! Event types delivered to the core mutation sequence
//!
//! Every slot mutation enters the core through exactly one of these events,
//! consumed by a single thread. Timer fires and style completions are
//! produced on other threads but never touch slot state directly; they are
//! marshalled here and validated against slot epochs at delivery time.

use crate::error::StyleError;
use crate::imagery::{AnchorHandle, ReferenceImageId, SourceImage, StyledImage};
use crate::session::SessionErrorKind;

/// Messages consumed by the tracking core's event loop.
#[derive(Debug)]
pub enum CoreEvent {
    /// The detector produced a batch of candidate images.
    CandidatesDetected(Vec<SourceImage>),
    /// The session host added an anchor for a tracked reference image.
    AnchorAdded {
        anchor: AnchorHandle,
        reference: ReferenceImageId,
    },
    /// The session host refreshed an existing anchor.
    AnchorUpdated {
        anchor: AnchorHandle,
        is_tracked: bool,
    },
    /// The session host reported an unrecoverable error.
    SessionFailed { kind: SessionErrorKind },
    /// A slot's timeout deadline elapsed. Honored only while `epoch`
    /// matches the slot's current arm epoch.
    SlotTimedOut { slot: usize, epoch: u64 },
    /// Style generation completed for a slot. Honored only while `cycle`
    /// matches the slot's current assignment cycle.
    StyleReady {
        slot: usize,
        cycle: u64,
        image: StyledImage,
    },
    /// Style generation failed for a slot.
    StyleFailed {
        slot: usize,
        cycle: u64,
        error: StyleError,
    },
    /// Toggle style fading for one slot, or for every slot when `None`.
    ToggleFade { slot: Option<usize> },
    /// Stop the event loop.
    Shutdown,
}
