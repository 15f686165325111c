//! artrack - Augmented-reality image tracking and restyling
//!
//! Detects rectangular images, tracks several of them at once, and keeps a
//! continuously restyled visual on each. The core is the slot-based
//! tracking lifecycle: assignment, anchor matching, per-slot loss
//! detection, and isolated re-acquisition.

mod config;
mod detect;
mod error;
mod events;
mod imagery;
mod present;
mod runtime;
mod session;
mod sim;
mod style;
#[cfg(test)]
mod testutil;
mod track;

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::AppConfig;
use crate::detect::{DetectorService, DigestFactory};
use crate::events::CoreEvent;
use crate::present::{LogPresentation, PresentationSink};
use crate::runtime::{event_channel, spawn_core, Collaborators};
use crate::session::TrackingSessionHost;
use crate::sim::{LossScript, SimDetector, SimSessionHost};
use crate::style::tint::TintGenerator;
use crate::track::PoolSettings;

/// artrack - AR image tracking demo
#[derive(Parser, Debug)]
#[command(name = "artrack")]
#[command(about = "Track rectangular images and overlay restyled visuals")]
struct Args {
    /// Number of images to track simultaneously
    #[arg(short, long)]
    capacity: Option<usize>,

    /// Seconds without tracked updates before a slot is declared lost
    #[arg(long)]
    timeout_secs: Option<f64>,

    /// How long the demo runs before shutting down
    #[arg(long, default_value = "20")]
    duration_secs: u64,

    /// Script the image at this position to go silent, demonstrating
    /// isolated slot loss
    #[arg(long)]
    lose_slot: Option<usize>,

    /// Start with style fading paused
    #[arg(long)]
    no_fade: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("artrack starting...");

    // Load or create configuration
    let mut config = load_or_create_config();
    if let Some(capacity) = args.capacity {
        config.tracking.capacity = capacity;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.tracking.timeout_secs = timeout_secs;
    }
    if args.no_fade {
        config.style.fade_by_default = false;
    }

    run_demo(&config, &args)?;

    info!("artrack shutdown complete");

    Ok(())
}

/// Load configuration from file or create default
fn load_or_create_config() -> AppConfig {
    if let Ok(config_dir) = config::get_config_dir() {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            if let Ok(config) = config::load_config(&config_path) {
                info!("Loaded configuration from {:?}", config_path);
                return config;
            }
        } else {
            let config = AppConfig::default();
            if let Err(error) = config::save_config(&config, &config_path) {
                warn!(%error, "could not write default configuration");
            }
            return config;
        }
    }
    info!("Using default configuration");
    AppConfig::default()
}

/// Run the scripted end-to-end demo against simulated collaborators.
fn run_demo(config: &AppConfig, args: &Args) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let (events_tx, events_rx) = event_channel();

    let detector = Arc::new(SimDetector::new(
        events_tx.clone(),
        runtime.handle().clone(),
        config.detection.candidate_size,
    ));
    let lose = args.lose_slot.map(|index| LossScript {
        image_index: index,
        after: Duration::from_secs(2),
    });
    let session = Arc::new(SimSessionHost::new(
        events_tx.clone(),
        runtime.handle().clone(),
        Duration::from_millis(500),
        Duration::from_millis(200),
        lose,
    ));
    let generator = Arc::new(TintGenerator::new(Duration::from_millis(
        config.style.simulated_latency_ms,
    )));
    let factory = Arc::new(DigestFactory::new(
        config.tracking.physical_width_m,
        config.detection.min_dimension,
        config.detection.min_contrast,
    ));
    let sink = Arc::new(LogPresentation);

    let settings = PoolSettings {
        capacity: config.tracking.capacity,
        timeout: Duration::from_secs_f64(config.tracking.timeout_secs),
        fade_by_default: config.style.fade_by_default,
        style_cycle_delay: Duration::from_millis(config.style.cycle_delay_ms),
    };

    info!(
        capacity = settings.capacity,
        timeout_secs = config.tracking.timeout_secs,
        "starting tracking core"
    );

    let handle = spawn_core(
        settings,
        Collaborators {
            detector: detector.clone(),
            factory,
            session: session.clone(),
            generator,
            sink: sink.clone(),
        },
        runtime.handle().clone(),
        (events_tx, events_rx),
    );

    sink.show_transient_message("Look for a rectangular image.");
    detector.request_candidates(config.tracking.capacity);

    // Pause and resume fading partway through, like a user tapping the
    // screen.
    let demo_events = handle.events();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_secs(6));
        let _ = demo_events.send(CoreEvent::ToggleFade { slot: None });
        std::thread::sleep(Duration::from_secs(2));
        let _ = demo_events.send(CoreEvent::ToggleFade { slot: None });
    });

    std::thread::sleep(Duration::from_secs(args.duration_secs));

    let status = handle.status();
    info!(
        events = status.events_handled,
        losses = status.losses,
        restarts = status.session_restarts,
        "demo finished"
    );
    for (index, slot) in status.slots.iter().enumerate() {
        info!(
            "slot {}: occupied={} active={} tracked={} fade={}",
            index, slot.occupied, slot.active, slot.is_tracked, slot.fade_enabled
        );
    }

    session.stop_tracking();
    handle.shutdown();
    runtime.shutdown_timeout(Duration::from_secs(1));

    Ok(())
}
