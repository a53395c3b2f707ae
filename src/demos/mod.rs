// src/demos/mod.rs
//! Demo programs run by the `drawframe` binary.

pub mod animation;
pub mod lines;
pub mod shapes;

use anyhow::{anyhow, Result};
use drawframe::DrawingSession;

/// Names accepted on the command line.
pub const DEMOS: [&str; 3] = ["shapes", "animation", "lines"];

/// Runs the demo called `name` in `session`.
pub fn run(name: &str, session: &mut DrawingSession) -> Result<()> {
    match name {
        "shapes" => shapes::run(session),
        "animation" => animation::run(session),
        "lines" => lines::run(session),
        other => Err(anyhow!(
            "Unknown demo '{}', expected one of: {}",
            other,
            DEMOS.join(", ")
        )),
    }
}
