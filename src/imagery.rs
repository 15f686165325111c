//! Image descriptors shared across the tracking core
//!
//! Pixel data only travels in `SourceImage` (a detected candidate) and
//! `StyledImage` (generated content). `ReferenceImage` is a pure descriptor:
//! once a candidate is registered for tracking, slots and session events
//! refer to it by id and content digest only.

use sha2::{Digest, Sha256};
use std::time::Instant;
use uuid::Uuid;

/// Physical width assumed for every detected rectangle, in meters.
pub const DEFAULT_PHYSICAL_WIDTH_M: f32 = 0.1;

/// Content digest used to deduplicate candidates against tracked images.
pub type ImageDigest = [u8; 32];

/// Opaque handle identifying a platform anchor bound to a tracked image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorHandle(pub u64);

/// Identity of a registered reference image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceImageId(Uuid);

impl ReferenceImageId {
    /// Mint a fresh id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReferenceImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReferenceImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A candidate image produced by the rectangle detector.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Raw RGBA pixel data
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// When the candidate was detected
    pub timestamp: Instant,
}

impl SourceImage {
    /// Create a new candidate image.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    /// Get image dimensions as (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Content digest over pixel data and dimensions.
    pub fn digest(&self) -> ImageDigest {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        hasher.update(&self.data);
        hasher.finalize().into()
    }
}

/// A validated, trackable image descriptor derived from a candidate.
#[derive(Debug, Clone)]
pub struct ReferenceImage {
    /// Stable identity, used to match anchor events to slots
    pub id: ReferenceImageId,
    /// Content digest of the originating candidate
    pub digest: ImageDigest,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Assumed physical width in meters
    pub physical_width_m: f32,
}

impl ReferenceImage {
    /// Build a descriptor for a candidate.
    pub fn from_candidate(candidate: &SourceImage, physical_width_m: f32) -> Self {
        Self {
            id: ReferenceImageId::new(),
            digest: candidate.digest(),
            width: candidate.width,
            height: candidate.height,
            physical_width_m,
        }
    }
}

/// Styled output produced for a tracked slot.
#[derive(Debug, Clone)]
pub struct StyledImage {
    /// Raw RGBA pixel data
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Index of the style that produced this image
    pub style_index: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(bytes: &[u8]) -> SourceImage {
        SourceImage::new(bytes.to_vec(), 1, bytes.len() as u32 / 4)
    }

    #[test]
    fn test_digest_is_stable() {
        let a = candidate(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let b = candidate(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn test_digest_differs_by_content() {
        let a = candidate(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let b = candidate(&[1, 2, 3, 4, 5, 6, 7, 9]);
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_digest_differs_by_dimensions() {
        let data = vec![0u8; 16];
        let a = SourceImage::new(data.clone(), 2, 2);
        let b = SourceImage::new(data, 4, 1);
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_reference_image_keeps_candidate_digest() {
        let source = candidate(&[9, 9, 9, 9]);
        let reference = ReferenceImage::from_candidate(&source, DEFAULT_PHYSICAL_WIDTH_M);
        assert_eq!(reference.digest, source.digest());
        assert_eq!(reference.width, source.width);
        assert_eq!(reference.height, source.height);
    }

    #[test]
    fn test_reference_ids_are_unique() {
        let source = candidate(&[0, 0, 0, 0]);
        let a = ReferenceImage::from_candidate(&source, DEFAULT_PHYSICAL_WIDTH_M);
        let b = ReferenceImage::from_candidate(&source, DEFAULT_PHYSICAL_WIDTH_M);
        assert_ne!(a.id, b.id);
    }
}
