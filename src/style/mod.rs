//! Style generation adapter
//!
//! Style generation runs on the tokio runtime and may take arbitrarily
//! long. The relay wraps the generator so slot code can fire a request and
//! forget it: the completion is marshalled back onto the core sequence as a
//! `CoreEvent` carrying the slot index and the assignment cycle captured at
//! request time. Stale completions are filtered at delivery, not here.

pub mod tint;

use async_trait::async_trait;
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::error::StyleError;
use crate::events::CoreEvent;
use crate::imagery::{SourceImage, StyledImage};

/// Asynchronous "given a source image, produce a styled output" service.
#[async_trait]
pub trait StyleGenerator: Send + Sync {
    /// Produce a styled rendition of `source` using the given style index.
    async fn generate(
        &self,
        source: &SourceImage,
        style_index: u32,
    ) -> Result<StyledImage, StyleError>;
}

/// One style generation request issued by a slot.
#[derive(Debug, Clone)]
pub struct StyleRequest {
    /// Slot the result is destined for
    pub slot: usize,
    /// Assignment cycle captured at request time
    pub cycle: u64,
    /// Style to apply
    pub style_index: u32,
    /// Source pixels to restyle
    pub source: Arc<SourceImage>,
    /// Delay before generation starts (paces the fade loop)
    pub delay: Duration,
}

/// Fire-and-forget entry point slots use to request generation.
pub trait StyleRequester: Send + Sync {
    /// Queue a generation request. Must not block the caller.
    fn request(&self, request: StyleRequest);
}

/// Bridges the async generator to the core event sequence.
pub struct StyleRelay {
    generator: Arc<dyn StyleGenerator>,
    runtime: tokio::runtime::Handle,
    events: Sender<CoreEvent>,
}

impl StyleRelay {
    /// Create a relay that runs `generator` on `runtime` and delivers
    /// completions through `events`.
    pub fn new(
        generator: Arc<dyn StyleGenerator>,
        runtime: tokio::runtime::Handle,
        events: Sender<CoreEvent>,
    ) -> Self {
        Self {
            generator,
            runtime,
            events,
        }
    }
}

impl StyleRequester for StyleRelay {
    fn request(&self, request: StyleRequest) {
        let generator = self.generator.clone();
        let events = self.events.clone();
        self.runtime.spawn(async move {
            if !request.delay.is_zero() {
                tokio::time::sleep(request.delay).await;
            }
            let outcome = generator
                .generate(&request.source, request.style_index)
                .await;
            let event = match outcome {
                Ok(image) => CoreEvent::StyleReady {
                    slot: request.slot,
                    cycle: request.cycle,
                    image,
                },
                Err(error) => CoreEvent::StyleFailed {
                    slot: request.slot,
                    cycle: request.cycle,
                    error,
                },
            };
            if events.send(event).is_err() {
                warn!("core event channel closed, dropping style completion");
            }
        });
    }
}
