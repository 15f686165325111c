//! Per-slot tracking timeout
//!
//! Each slot owns one re-armable deadline. Arming hands the deadline to a
//! scheduler together with the arm epoch; the fire callback travels back to
//! the core as an event and is honored only while the epoch still matches.
//! A cancel-then-reschedule therefore never delivers a stale fire, no
//! matter how the timer thread and the core thread interleave.

use crossbeam_channel::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

use crate::events::CoreEvent;

/// Default timeout after which a slot is declared lost.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Schedules a one-shot "slot may be lost" callback.
pub trait TimeoutScheduler: Send + Sync {
    /// Arrange for `CoreEvent::SlotTimedOut { slot, epoch }` to be
    /// delivered once `deadline` passes. Must not block the caller.
    fn schedule(&self, slot: usize, epoch: u64, deadline: Instant);
}

/// Scheduler backed by tokio timers.
pub struct TokioTimeoutScheduler {
    runtime: tokio::runtime::Handle,
    events: Sender<CoreEvent>,
}

impl TokioTimeoutScheduler {
    /// Create a scheduler that delivers fires through `events`.
    pub fn new(runtime: tokio::runtime::Handle, events: Sender<CoreEvent>) -> Self {
        Self { runtime, events }
    }
}

impl TimeoutScheduler for TokioTimeoutScheduler {
    fn schedule(&self, slot: usize, epoch: u64, deadline: Instant) {
        let events = self.events.clone();
        self.runtime.spawn(async move {
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
            // Stale epochs are filtered at delivery; sending one is harmless.
            let _ = events.send(CoreEvent::SlotTimedOut { slot, epoch });
        });
    }
}

/// Re-armable countdown owned by one tracked slot.
///
/// The epoch increments on every `arm` and `cancel`. A fire is only valid
/// while its captured epoch matches, so superseded deadlines never fire.
pub struct TimeoutGuard {
    slot: usize,
    timeout: Duration,
    epoch: u64,
    deadline: Option<Instant>,
    scheduler: Arc<dyn TimeoutScheduler>,
}

impl TimeoutGuard {
    /// Create a disarmed guard for `slot`.
    pub fn new(slot: usize, timeout: Duration, scheduler: Arc<dyn TimeoutScheduler>) -> Self {
        Self {
            slot,
            timeout,
            epoch: 0,
            deadline: None,
            scheduler,
        }
    }

    /// Start (or restart) the countdown. Any previously armed deadline is
    /// superseded.
    pub fn arm(&mut self) {
        self.epoch += 1;
        let deadline = Instant::now() + self.timeout;
        self.deadline = Some(deadline);
        trace!(slot = self.slot, epoch = self.epoch, "timeout armed");
        self.scheduler.schedule(self.slot, self.epoch, deadline);
    }

    /// Clear the pending deadline without firing.
    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            self.epoch += 1;
            trace!(slot = self.slot, epoch = self.epoch, "timeout canceled");
        }
    }

    /// Whether a fire carrying `epoch` is still current.
    pub fn accepts(&self, epoch: u64) -> bool {
        self.deadline.is_some() && self.epoch == epoch
    }

    /// The pending deadline, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The current arm epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RecordingScheduler;

    #[test]
    fn test_arm_schedules_with_fresh_epoch() {
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut guard = TimeoutGuard::new(3, Duration::from_secs(10), scheduler.clone());

        guard.arm();

        let armed = scheduler.armed.lock();
        assert_eq!(armed.len(), 1);
        assert_eq!(armed[0].0, 3);
        assert_eq!(armed[0].1, guard.epoch());
        assert!(guard.accepts(guard.epoch()));
    }

    #[test]
    fn test_rearm_supersedes_previous_deadline() {
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut guard = TimeoutGuard::new(0, Duration::from_secs(10), scheduler.clone());

        guard.arm();
        let first_epoch = guard.epoch();
        guard.arm();

        assert!(!guard.accepts(first_epoch));
        assert!(guard.accepts(guard.epoch()));
        assert_eq!(scheduler.armed.lock().len(), 2);
    }

    #[test]
    fn test_cancel_invalidates_pending_fire() {
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut guard = TimeoutGuard::new(0, Duration::from_secs(10), scheduler);

        guard.arm();
        let epoch = guard.epoch();
        guard.cancel();

        assert!(!guard.accepts(epoch));
        assert!(guard.deadline().is_none());
    }

    #[test]
    fn test_cancel_when_disarmed_is_a_noop() {
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut guard = TimeoutGuard::new(0, Duration::from_secs(10), scheduler);

        let epoch_before = guard.epoch();
        guard.cancel();
        guard.cancel();

        assert_eq!(guard.epoch(), epoch_before);
        assert!(guard.deadline().is_none());
    }

    #[test]
    fn test_deadline_is_in_the_future_when_armed() {
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut guard = TimeoutGuard::new(0, Duration::from_secs(10), scheduler);

        guard.arm();

        assert!(guard.deadline().unwrap() > Instant::now());
    }
}
