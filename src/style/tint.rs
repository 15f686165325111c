//! Tint-cycling style generator
//!
//! Stands in for a neural style-transfer model: blends the source image
//! toward a palette color chosen by the style index. Cheap enough to run
//! in the demo, heavy enough to justify the async seam (a configurable
//! latency simulates model inference time).

use async_trait::async_trait;
use image::RgbaImage;
use std::time::Duration;

use crate::error::StyleError;
use crate::imagery::{SourceImage, StyledImage};
use crate::style::StyleGenerator;

/// Default palette the demo cycles through.
const DEFAULT_PALETTE: [[u8; 3]; 4] = [
    [214, 84, 58],  // vermillion
    [58, 128, 214], // cobalt
    [90, 190, 94],  // leaf
    [208, 170, 60], // ochre
];

/// Fraction of the tint color blended into every pixel.
const TINT_STRENGTH: f32 = 0.55;

/// Style generator that tints the source toward a cycling palette.
pub struct TintGenerator {
    palette: Vec<[u8; 3]>,
    latency: Duration,
}

impl TintGenerator {
    /// Create a generator with the default palette.
    pub fn new(latency: Duration) -> Self {
        Self {
            palette: DEFAULT_PALETTE.to_vec(),
            latency,
        }
    }

    /// Number of distinct styles before the palette wraps.
    pub fn style_count(&self) -> u32 {
        self.palette.len() as u32
    }
}

#[async_trait]
impl StyleGenerator for TintGenerator {
    async fn generate(
        &self,
        source: &SourceImage,
        style_index: u32,
    ) -> Result<StyledImage, StyleError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut bitmap = RgbaImage::from_raw(source.width, source.height, source.data.clone())
            .ok_or(StyleError::InvalidSource)?;

        let tint = self.palette[(style_index as usize) % self.palette.len()];
        for pixel in bitmap.pixels_mut() {
            for channel in 0..3 {
                let blended = pixel.0[channel] as f32 * (1.0 - TINT_STRENGTH)
                    + tint[channel] as f32 * TINT_STRENGTH;
                pixel.0[channel] = blended.round().clamp(0.0, 255.0) as u8;
            }
        }

        Ok(StyledImage {
            data: bitmap.into_raw(),
            width: source.width,
            height: source.height,
            style_index,
        })
    }
}
