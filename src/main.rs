// SPDX-License-Identifier: GPL-3.0-only

use picam::config::Config;
use picam::devices::{PowerGauge, SyntheticCamera, SysfsGauge, TerminalDisplay, TerminalInput};
use picam::pipeline::CapturePipeline;
use picam::state_machine::StateMachine;
use picam::thumbnails::{SharedCache, ThumbnailCache};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=picam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let config = Config::load();
    let save_dir = config.save_dir();
    std::fs::create_dir_all(&save_dir)?;
    info!(dir = %save_dir.display(), "Using save directory");

    let runtime = tokio::runtime::Runtime::new()?;
    let cache = SharedCache::new(ThumbnailCache::open(save_dir.clone())?);
    let pipeline = CapturePipeline::spawn(runtime.handle(), cache.clone(), save_dir);
    // Fill in durable thumbnails for images captured before this run
    pipeline.request_backfill();

    // Display and camera are required; failing either aborts before the loop
    let display = TerminalDisplay::init()?;
    let camera = SyntheticCamera::new()?;
    let input = TerminalInput::new();
    let gauge = config
        .gauge_voltage_path
        .clone()
        .map(|path| Box::new(SysfsGauge::new(path)) as Box<dyn PowerGauge>);

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })?;

    let mut machine = StateMachine::new(
        Box::new(camera),
        Box::new(display),
        Box::new(input),
        gauge,
        cache,
        pipeline,
        &config,
    );
    machine.run(&interrupted);
    machine.shutdown();

    info!("Shut down cleanly");
    Ok(())
}
