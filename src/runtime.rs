//! Core runtime
//!
//! Owns the slot pool and consumes `CoreEvent`s on a dedicated thread:
//! the single logical sequence on which all slot state is mutated. Timer
//! fires, style completions, and host events all funnel through the same
//! channel, so no locking is needed around the pool itself. A read-only
//! status snapshot is published after every event for observers on other
//! threads.

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info};

use crate::detect::intake::DetectionIntake;
use crate::detect::{DetectorService, ReferenceImageFactory};
use crate::events::CoreEvent;
use crate::imagery::SourceImage;
use crate::present::PresentationSink;
use crate::session::TrackingSessionHost;
use crate::style::{StyleGenerator, StyleRelay};
use crate::track::{PoolSettings, SlotPool, TokioTimeoutScheduler};

/// External collaborators the core is wired to.
pub struct Collaborators {
    /// Rectangle detector
    pub detector: Arc<dyn DetectorService>,
    /// Candidate-to-reference conversion and validation
    pub factory: Arc<dyn ReferenceImageFactory>,
    /// Platform tracking session
    pub session: Arc<dyn TrackingSessionHost>,
    /// Style model
    pub generator: Arc<dyn StyleGenerator>,
    /// Message banners and visual overlay
    pub sink: Arc<dyn PresentationSink>,
}

/// Snapshot of one slot, for observers outside the core thread.
#[derive(Debug, Clone, Default)]
pub struct SlotStatus {
    /// Slot holds a reference image
    pub occupied: bool,
    /// Slot has a bound anchor
    pub active: bool,
    /// Last known tracking-health flag
    pub is_tracked: bool,
    /// Style fading enabled
    pub fade_enabled: bool,
    /// At least one styled image was delivered
    pub has_content: bool,
}

/// Snapshot of the whole core, published after every handled event.
#[derive(Debug, Clone, Default)]
pub struct CoreStatus {
    /// Per-slot snapshots in index order
    pub slots: Vec<SlotStatus>,
    /// Events consumed so far
    pub events_handled: u64,
    /// Isolated tracking losses so far
    pub losses: u64,
    /// Tracking session restarts requested so far
    pub session_restarts: u64,
}

/// The event loop that owns all slot state.
pub struct TrackingCore {
    pool: SlotPool,
    intake: DetectionIntake,
    session: Arc<dyn TrackingSessionHost>,
    events_rx: Receiver<CoreEvent>,
    status: Arc<RwLock<CoreStatus>>,
    events_handled: u64,
    session_restarts: u64,
}

impl TrackingCore {
    fn new(
        pool: SlotPool,
        intake: DetectionIntake,
        session: Arc<dyn TrackingSessionHost>,
        events_rx: Receiver<CoreEvent>,
        status: Arc<RwLock<CoreStatus>>,
    ) -> Self {
        Self {
            pool,
            intake,
            session,
            events_rx,
            status,
            events_handled: 0,
            session_restarts: 0,
        }
    }

    /// Consume events until the channel closes or `Shutdown` arrives.
    pub fn run(mut self) {
        info!("tracking core starting");
        while let Ok(event) = self.events_rx.recv() {
            if !self.handle_event(event) {
                break;
            }
        }
        info!("tracking core exiting");
    }

    /// Apply one event to the pool. Returns `false` on shutdown.
    fn handle_event(&mut self, event: CoreEvent) -> bool {
        self.events_handled += 1;
        match event {
            CoreEvent::CandidatesDetected(candidates) => self.on_candidates(candidates),
            CoreEvent::AnchorAdded { anchor, reference } => {
                self.pool.dispatch_anchor_added(anchor, reference);
            }
            CoreEvent::AnchorUpdated { anchor, is_tracked } => {
                self.pool.dispatch_anchor_updated(anchor, is_tracked);
            }
            CoreEvent::SessionFailed { kind } => {
                self.pool.dispatch_session_fatal(&kind);
                // The host session stays stopped after a failure; restart
                // it empty and wait for fresh candidates.
                self.session.start_tracking(Vec::new(), true);
                self.session_restarts += 1;
            }
            CoreEvent::SlotTimedOut { slot, epoch } => {
                self.pool.dispatch_slot_timed_out(slot, epoch);
            }
            CoreEvent::StyleReady { slot, cycle, image } => {
                self.pool.dispatch_style_ready(slot, cycle, image);
            }
            CoreEvent::StyleFailed { slot, cycle, error } => {
                self.pool.dispatch_style_failed(slot, cycle, &error);
            }
            CoreEvent::ToggleFade { slot } => self.pool.toggle_fade(slot),
            CoreEvent::Shutdown => {
                self.publish_status();
                return false;
            }
        }
        self.publish_status();
        true
    }

    fn on_candidates(&mut self, candidates: Vec<SourceImage>) {
        let batch = candidates.len();
        match self.intake.process(&mut self.pool, candidates) {
            Ok(images) if images.is_empty() => {
                debug!(batch, "intake assigned nothing, session left as-is");
            }
            Ok(images) => {
                info!(batch, tracking = images.len(), "restarting session with assigned images");
                self.session.start_tracking(images, true);
                self.session_restarts += 1;
            }
            Err(intake_error) => {
                error!(%intake_error, "detection intake aborted");
            }
        }
    }

    fn publish_status(&self) {
        let slots = self
            .pool
            .slots()
            .map(|slot| SlotStatus {
                occupied: !slot.is_empty(),
                active: slot.anchor().is_some(),
                is_tracked: slot.is_tracked(),
                fade_enabled: slot.fade_enabled(),
                has_content: slot.latest_content().is_some(),
            })
            .collect();
        *self.status.write() = CoreStatus {
            slots,
            events_handled: self.events_handled,
            losses: self.pool.losses(),
            session_restarts: self.session_restarts,
        };
    }
}

/// Handle to a running core thread.
pub struct CoreHandle {
    events: Sender<CoreEvent>,
    status: Arc<RwLock<CoreStatus>>,
    thread: Option<JoinHandle<()>>,
}

impl CoreHandle {
    /// Sender for feeding events into the core.
    pub fn events(&self) -> Sender<CoreEvent> {
        self.events.clone()
    }

    /// Latest published status snapshot.
    pub fn status(&self) -> CoreStatus {
        self.status.read().clone()
    }

    /// Stop the event loop and wait for the thread to finish.
    pub fn shutdown(mut self) {
        let _ = self.events.send(CoreEvent::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Wire up a core and start its event thread.
///
/// The channel pair is created by the caller so collaborators that feed
/// events back in (detector, session host) can be built around the same
/// sender.
pub fn spawn_core(
    settings: PoolSettings,
    collaborators: Collaborators,
    runtime: tokio::runtime::Handle,
    events: (Sender<CoreEvent>, Receiver<CoreEvent>),
) -> CoreHandle {
    let (events_tx, events_rx) = events;
    let scheduler = Arc::new(TokioTimeoutScheduler::new(
        runtime.clone(),
        events_tx.clone(),
    ));
    let style = Arc::new(StyleRelay::new(
        collaborators.generator,
        runtime,
        events_tx.clone(),
    ));
    let pool = SlotPool::new(
        &settings,
        scheduler,
        style,
        collaborators.sink,
        collaborators.detector,
    );
    let intake = DetectionIntake::new(settings.capacity, collaborators.factory);
    let status = Arc::new(RwLock::new(CoreStatus::default()));

    let core = TrackingCore::new(
        pool,
        intake,
        collaborators.session,
        events_rx,
        status.clone(),
    );
    let thread = std::thread::spawn(move || core.run());

    CoreHandle {
        events: events_tx,
        status,
        thread: Some(thread),
    }
}

/// Create the event channel a core and its collaborators share.
pub fn event_channel() -> (Sender<CoreEvent>, Receiver<CoreEvent>) {
    unbounded()
}
