// src/lib.rs

//! `drawframe`: a single drawing window backed by an offscreen raster.
//!
//! Drawing calls go straight into a [`RasterSurface`]; nothing appears on
//! screen until [`DrawFrame::refresh`] publishes the buffer to the window.
//!
//! ```no_run
//! use drawframe::{Color, Config, DrawingSession};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut session = DrawingSession::new(Config::from_env());
//! let frame = session.create_default()?;
//! {
//!     let mut g = frame.graphics();
//!     g.set_stroke_width(5.0);
//!     g.set_color(Color::BLUE);
//!     g.draw_line(40.0, 10.0, 10.0, 40.0);
//!     g.fill_oval(10.0, 60.0, 30.0, 30.0);
//! }
//! frame.refresh();
//! frame.wait_for_close();
//! # Ok(())
//! # }
//! ```

pub mod color;
pub mod config;
pub mod display;
pub mod keys;
pub mod pacing;
pub mod raster;
pub mod save;
pub mod session;

pub use color::{Color, NamedColor};
pub use config::Config;
pub use pacing::SleepOutcome;
pub use raster::{Font, FontStyle, Graphics, RasterSurface};
pub use session::{DrawFrame, DrawingSession};
