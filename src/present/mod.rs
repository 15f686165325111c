//! Presentation sink interface
//!
//! Message banners and visual updates are fire-and-forget calls out of the
//! core; no return value is consumed. The default sink logs through
//! tracing, which is all the demo binary needs.

use crate::imagery::StyledImage;
use tracing::info;

/// Outbound presentation surface.
pub trait PresentationSink: Send + Sync {
    /// Show a short-lived message banner.
    fn show_transient_message(&self, message: &str);

    /// Replace the visual overlay content for a slot.
    fn update_visual(&self, slot: usize, image: &StyledImage);
}

/// Presentation sink that writes to the log.
pub struct LogPresentation;

impl PresentationSink for LogPresentation {
    fn show_transient_message(&self, message: &str) {
        info!("[banner] {message}");
    }

    fn update_visual(&self, slot: usize, image: &StyledImage) {
        info!(
            "[visual] slot {} now shows style {} ({}x{})",
            slot, image.style_index, image.width, image.height
        );
    }
}
