//! Detection boundary
//!
//! Rectangle detection itself is an external collaborator; this module
//! holds the traits the core talks through plus the default
//! reference-image factory used by the demo: descriptor creation from
//! candidate pixels with size and texture validation.

pub mod intake;

use tracing::debug;

use crate::error::{ConvertError, ValidateError};
use crate::imagery::{ReferenceImage, SourceImage};

/// External rectangle detector, driven by the core only through
/// re-acquisition requests. Detected batches come back as
/// `CoreEvent::CandidatesDetected`.
pub trait DetectorService: Send + Sync {
    /// Ask the detector to look for up to `wanted` new rectangular
    /// candidates.
    fn request_candidates(&self, wanted: usize);
}

/// Turns candidates into trackable reference-image descriptors.
pub trait ReferenceImageFactory: Send + Sync {
    /// Convert a candidate into a reference image. A failure here aborts
    /// the rest of the intake batch.
    fn convert(&self, candidate: &SourceImage) -> Result<ReferenceImage, ConvertError>;

    /// Check that the converted image is worth tracking. A failure here
    /// only drops this candidate.
    fn validate(
        &self,
        reference: &ReferenceImage,
        candidate: &SourceImage,
    ) -> Result<(), ValidateError>;
}

/// Default factory: digests the candidate pixels into a descriptor and
/// rejects images that are too small or too flat to track.
pub struct DigestFactory {
    physical_width_m: f32,
    min_dimension: u32,
    min_contrast: f32,
}

impl DigestFactory {
    /// Create a factory with the given validation thresholds.
    pub fn new(physical_width_m: f32, min_dimension: u32, min_contrast: f32) -> Self {
        Self {
            physical_width_m,
            min_dimension,
            min_contrast,
        }
    }
}

impl ReferenceImageFactory for DigestFactory {
    fn convert(&self, candidate: &SourceImage) -> Result<ReferenceImage, ConvertError> {
        if candidate.data.is_empty() {
            return Err(ConvertError::EmptyCandidate);
        }
        let expected = (candidate.width as usize) * (candidate.height as usize) * 4;
        if candidate.data.len() != expected {
            return Err(ConvertError::BufferSize {
                expected,
                actual: candidate.data.len(),
            });
        }

        let reference = ReferenceImage::from_candidate(candidate, self.physical_width_m);
        debug!(reference = %reference.id, width = reference.width, height = reference.height,
            "candidate converted");
        Ok(reference)
    }

    fn validate(
        &self,
        reference: &ReferenceImage,
        candidate: &SourceImage,
    ) -> Result<(), ValidateError> {
        if reference.width < self.min_dimension || reference.height < self.min_dimension {
            return Err(ValidateError::TooSmall {
                width: reference.width,
                height: reference.height,
                min: self.min_dimension,
            });
        }

        let stddev = luminance_stddev(&candidate.data);
        if stddev < self.min_contrast {
            return Err(ValidateError::LowContrast {
                stddev,
                min: self.min_contrast,
            });
        }
        Ok(())
    }
}

/// Standard deviation of per-pixel luminance over RGBA data.
fn luminance_stddev(data: &[u8]) -> f32 {
    let pixels = data.len() / 4;
    if pixels == 0 {
        return 0.0;
    }

    let luminance = |chunk: &[u8]| -> f64 {
        0.299 * chunk[0] as f64 + 0.587 * chunk[1] as f64 + 0.114 * chunk[2] as f64
    };

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for chunk in data.chunks_exact(4) {
        let value = luminance(chunk);
        sum += value;
        sum_sq += value * value;
    }

    let count = pixels as f64;
    let mean = sum / count;
    let variance = (sum_sq / count - mean * mean).max(0.0);
    variance.sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_candidate;

    fn factory() -> DigestFactory {
        DigestFactory::new(0.1, 8, 8.0)
    }

    #[test]
    fn test_convert_builds_descriptor_from_pixels() {
        let candidate = test_candidate(1);
        let reference = factory().convert(&candidate).unwrap();

        assert_eq!(reference.digest, candidate.digest());
        assert_eq!(reference.width, candidate.width);
        assert_eq!(reference.height, candidate.height);
        assert!((reference.physical_width_m - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_convert_rejects_empty_candidate() {
        let candidate = SourceImage::new(Vec::new(), 16, 16);
        let result = factory().convert(&candidate);
        assert!(matches!(result, Err(ConvertError::EmptyCandidate)));
    }

    #[test]
    fn test_convert_rejects_truncated_buffer() {
        let candidate = SourceImage::new(vec![0u8; 10], 16, 16);
        let result = factory().convert(&candidate);
        assert!(matches!(result, Err(ConvertError::BufferSize { .. })));
    }

    #[test]
    fn test_validate_rejects_small_images() {
        let candidate = SourceImage::new(vec![0u8; 4 * 4 * 4], 4, 4);
        let reference = factory().convert(&candidate).unwrap();
        let result = factory().validate(&reference, &candidate);
        assert!(matches!(result, Err(ValidateError::TooSmall { .. })));
    }

    #[test]
    fn test_validate_rejects_flat_images() {
        let candidate = SourceImage::new(vec![128u8; 16 * 16 * 4], 16, 16);
        let reference = factory().convert(&candidate).unwrap();
        let result = factory().validate(&reference, &candidate);
        assert!(matches!(result, Err(ValidateError::LowContrast { .. })));
    }

    #[test]
    fn test_validate_accepts_textured_images() {
        let candidate = test_candidate(3);
        let reference = factory().convert(&candidate).unwrap();
        assert!(factory().validate(&reference, &candidate).is_ok());
    }

    #[test]
    fn test_luminance_stddev_of_flat_image_is_zero() {
        let data = vec![77u8; 8 * 4];
        assert!(luminance_stddev(&data) < f32::EPSILON);
    }
}
