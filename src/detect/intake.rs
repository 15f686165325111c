//! Detection intake
//!
//! Converts a batch of freshly detected candidates into reference images
//! and hands them to the pool. Conversion failures abort the remaining
//! batch; validation failures only drop the offending candidate. The
//! returned set is the full list of images the session should now track,
//! not an increment.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::detect::ReferenceImageFactory;
use crate::error::IntakeError;
use crate::imagery::{ReferenceImage, SourceImage};
use crate::track::SlotPool;

/// Glue between the detector and the slot pool.
pub struct DetectionIntake {
    capacity: usize,
    factory: Arc<dyn ReferenceImageFactory>,
}

impl DetectionIntake {
    /// Create an intake expecting a pool of `capacity` slots.
    pub fn new(capacity: usize, factory: Arc<dyn ReferenceImageFactory>) -> Self {
        Self { capacity, factory }
    }

    /// Process a detection batch. On success returns the reference images
    /// of every occupied slot, in index order; an empty result means
    /// there is nothing to track and the session should be left as-is.
    pub fn process(
        &self,
        pool: &mut SlotPool,
        candidates: Vec<SourceImage>,
    ) -> Result<Vec<ReferenceImage>, IntakeError> {
        if pool.len() != self.capacity {
            return Err(IntakeError::InvalidPoolState {
                expected: self.capacity,
                actual: pool.len(),
            });
        }

        for candidate in candidates {
            let reference = self.factory.convert(&candidate)?;
            if let Err(error) = self.factory.validate(&reference, &candidate) {
                warn!(%error, "candidate failed validation, dropped");
                continue;
            }
            // The pool refuses duplicates of already tracked content and
            // assigns first-empty; either refusal just skips this one.
            if let Some(slot) = pool.assign(reference, Arc::new(candidate)) {
                debug!(slot, "candidate assigned");
            }
        }

        Ok(pool.tracking_images())
    }
}
