//! Error taxonomy for the tracking core
//!
//! Nothing here is fatal to the process: intake errors abort a single
//! detection batch, slot errors surface misuse of the pool API, and style
//! errors are folded back into the per-slot loss path.

use thiserror::Error;

/// Errors that abort a detection intake batch.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The pool does not hold the configured number of slots.
    #[error("pool holds {actual} slots, expected {expected}")]
    InvalidPoolState { expected: usize, actual: usize },

    /// A candidate could not be turned into a reference image. Remaining
    /// candidates in the batch are not processed.
    #[error("could not convert candidate into a reference image: {0}")]
    CandidateConversion(#[from] ConvertError),
}

/// Per-candidate conversion failures.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The candidate carries no pixel data.
    #[error("candidate has no pixel data")]
    EmptyCandidate,

    /// The candidate buffer does not match its declared dimensions.
    #[error("candidate buffer is {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Validation failures for a freshly converted reference image. The
/// candidate is dropped; the rest of the batch continues.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// The image is too small to track reliably.
    #[error("reference image is {width}x{height}, minimum dimension is {min}")]
    TooSmall { width: u32, height: u32, min: u32 },

    /// The image does not carry enough texture to track.
    #[error("reference image contrast {stddev:.1} below minimum {min:.1}")]
    LowContrast { stddev: f32, min: f32 },
}

/// Errors returned by tracked-slot operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    /// The slot already holds a reference image.
    #[error("slot {slot} already holds a reference image")]
    AlreadyOccupied { slot: usize },
}

/// Errors reported by the asynchronous style generator.
#[derive(Debug, Error)]
pub enum StyleError {
    /// The source image could not be decoded into a styleable bitmap.
    #[error("style source is not a valid bitmap")]
    InvalidSource,

    /// The underlying style model failed.
    #[error("style model failed: {0}")]
    Model(String),
}
