// src/demos/lines.rs
//! A fan of lines spanning an 800x600 canvas, plus an oval and a caption.

use anyhow::Result;
use drawframe::{Color, DrawingSession, Font, FontStyle};

const LINES: u32 = 50;

pub fn run(session: &mut DrawingSession) -> Result<()> {
    let frame = session.create("example3", 800, 600)?;
    let inc_x = frame.width() as f32 / LINES as f32;
    let inc_y = frame.height() as f32 / LINES as f32;

    {
        let mut g = frame.graphics();
        g.set_font(Font::new("Dialog", FontStyle::Plain, 16.0));
        g.draw_string("Some Text", 10.0, 20.0);

        g.set_stroke_width(1.0);
        g.set_color(Color::BLACK);
        g.draw_oval(50.0, 50.0, 200.0, 100.0);

        for i in 1..=LINES {
            let x1 = (i as f32 * inc_x).round();
            let x2 = (inc_x * (LINES - i) as f32).round();
            let y2 = (i as f32 * inc_y).round();
            g.draw_line(x1, 0.0, x2, y2);
        }
    }

    frame.refresh();
    frame.wait_for_close();
    Ok(())
}
