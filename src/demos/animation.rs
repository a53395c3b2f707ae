// src/demos/animation.rs
//! An oval drifting across the default canvas, one frame every 25 ms.

use anyhow::Result;
use drawframe::{Color, DrawingSession};

const FRAMES: u32 = 100;
const FRAME_MILLIS: u64 = 25;

pub fn run(session: &mut DrawingSession) -> Result<()> {
    let frame = session.create_default()?;
    frame.graphics().set_color(Color::BLUE);

    for i in 0..FRAMES {
        let i = i as f32;
        frame.clear();
        frame
            .graphics()
            .fill_oval(80.0 + 3.0 * i, 40.0 + 2.0 * i, 30.0, 30.0 + i);
        frame.refresh();
        frame.sleep(FRAME_MILLIS);
        if !frame.is_open() {
            return Ok(());
        }
    }

    log::info!("animation: done");
    frame.wait_for_close();
    Ok(())
}
