// In src/main.rs

// Declare modules
mod demos;

use drawframe::{Config, DrawingSession};

// Logging
use log::{error, info};

const DEFAULT_DEMO: &str = "shapes";

/// Main entry point for the `drawframe` demo launcher.
fn main() -> anyhow::Result<()> {
    // Initialize the logger. Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let demo = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DEMO.to_string());
    if demo == "-h" || demo == "--help" {
        println!("usage: drawframe [{}]", demos::DEMOS.join("|"));
        return Ok(());
    }

    info!("Starting drawframe demo '{}'...", demo);
    let mut session = DrawingSession::new(Config::from_env());

    if let Err(e) = demos::run(&demo, &mut session) {
        error!("Demo '{}' failed: {:#}", demo, e);
        return Err(e);
    }

    info!("drawframe exited successfully.");
    Ok(())
}
