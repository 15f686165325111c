//! Multi-target tracking lifecycle
//!
//! The slot pool, the per-slot state machine, and the timeout guard that
//! detects tracking loss.

pub mod pool;
pub mod slot;
pub mod timeout;

pub use pool::{PoolSettings, SlotPool};
pub use slot::TrackedSlot;
pub use timeout::{TimeoutGuard, TimeoutScheduler, TokioTimeoutScheduler};
