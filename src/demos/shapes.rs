// src/demos/shapes.rs
//! A gallery of every primitive on a 200x300 canvas.

use anyhow::Result;
use drawframe::{Color, DrawingSession, Font, FontStyle};

pub fn run(session: &mut DrawingSession) -> Result<()> {
    let frame = session.create("MyDrawing", 200, 300)?;
    let fill_color = Color::GREEN;
    let stroke_color = Color::BLUE;

    {
        let mut g = frame.graphics();
        g.set_stroke_width(5.0);
        g.set_color(stroke_color);

        g.draw_line(40.0, 10.0, 10.0, 40.0);
        g.draw_line(70.2, 10.3, 100.4, 40.5);
        g.fill_oval(10.0, 60.0, 30.0, 30.0);
        g.draw_oval(60.0, 60.0, 30.0, 30.0);
        g.fill_round_rect(110.0, 60.0, 30.0, 30.0, 10.0, 10.0);
        g.draw_round_rect(160.0, 60.0, 30.0, 30.0, 10.0, 10.0);

        g.set_color(fill_color);
        for x in [10.0, 60.0, 110.0] {
            g.fill_arc(x, 110.0, 30.0, 30.0, 45.0, 240.0);
        }

        g.set_color(Color::MAGENTA);
        for x in [10.0, 60.0, 110.0] {
            g.draw_arc(x, 160.0, 30.0, 30.0, 45.0, 240.0);
        }

        g.set_color(fill_color);
        g.fill_polygon(&[10.0, 40.0, 10.0, 40.0], &[210.0, 210.0, 240.0, 240.0]);
        g.set_color(stroke_color);
        g.draw_polygon(&[60.0, 90.0, 60.0, 90.0], &[210.0, 210.0, 240.0, 240.0]);
        g.draw_polyline(&[110.0, 140.0, 110.0, 140.0], &[210.0, 210.0, 240.0, 240.0]);

        g.set_color(Color::BLACK);
        g.set_font(Font::new("Monospaced", FontStyle::Plain, 12.0));
        g.draw_string("Drawn with drawframe", 10.0, 275.0);
    }

    frame.refresh();
    log::info!("shapes: done");
    frame.wait_for_close();
    Ok(())
}
