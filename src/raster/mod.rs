// src/raster/mod.rs

//! The offscreen raster surface and its drawing context.
//!
//! A `RasterSurface` owns a fixed-size RGBA pixel buffer. Drawing through
//! [`Graphics`] changes the buffer immediately; nothing reaches the window
//! until the session publishes a [`RenderSnapshot`] of it.

pub mod encode;
pub mod geometry;
mod graphics;
mod text;


use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use std::io::Write;
use std::path::Path;
use tiny_skia::Pixmap;

use crate::color::Color;
use crate::config::DrawingConfig;
use crate::display::RenderSnapshot;

pub use encode::DecodedImage;
pub use graphics::Graphics;
pub use text::{Font, FontStyle};
pub use tiny_skia::{FillRule, LineCap, LineJoin, Path as VectorPath, PathBuilder, Stroke};

/// Miter limit applied to every new stroke.
const DEFAULT_MITER_LIMIT: f32 = 10.0;

/// Quality switches consulted by every drawing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderingHints {
    /// Antialias shape edges.
    pub antialias: bool,
    /// Antialias glyph edges.
    pub text_antialias: bool,
}

impl Default for RenderingHints {
    fn default() -> Self {
        RenderingHints {
            antialias: true,
            text_antialias: true,
        }
    }
}

/// Returns a solid stroke of `width` with square caps and mitered joins.
pub fn default_stroke(width: f32) -> Stroke {
    Stroke {
        width: width.max(0.0),
        miter_limit: DEFAULT_MITER_LIMIT,
        line_cap: LineCap::Square,
        line_join: LineJoin::Miter,
        dash: None,
    }
}

/// Drawing-context state. Lives with the surface so it persists across
/// `graphics()` borrows.
#[derive(Debug, Clone)]
pub(crate) struct DrawState {
    pub(crate) color: Color,
    pub(crate) stroke: Stroke,
    pub(crate) font: Font,
    pub(crate) hints: RenderingHints,
}

/// A fixed-size pixel buffer plus the drawing context bound to it.
pub struct RasterSurface {
    pixmap: Pixmap,
    state: DrawState,
    background: Color,
    foreground: Color,
}

impl RasterSurface {
    /// Allocates a `width` x `height` surface filled with the configured
    /// background, with the drawing color set to the configured foreground.
    pub fn new(width: u32, height: u32, config: &DrawingConfig) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!(
                "Surface size must be positive, got {}x{}",
                width,
                height
            ));
        }
        let pixmap = Pixmap::new(width, height)
            .with_context(|| format!("Failed to allocate a {}x{} pixel buffer", width, height))?;

        let mut surface = RasterSurface {
            pixmap,
            state: DrawState {
                color: config.foreground,
                stroke: default_stroke(config.stroke_width),
                font: config.font.clone(),
                hints: RenderingHints {
                    antialias: config.antialias,
                    text_antialias: config.text_antialias,
                },
            },
            background: config.background,
            foreground: config.foreground,
        };
        surface.clear();
        surface.state.color = config.foreground;

        info!(
            "RasterSurface: allocated {}x{} px, background {}, foreground {}",
            width, height, surface.background, surface.foreground
        );
        Ok(surface)
    }

    /// Borrows the drawing context.
    pub fn graphics(&mut self) -> Graphics<'_> {
        Graphics::new(&mut self.pixmap, &mut self.state)
    }

    /// Fills the whole buffer with the background color.
    ///
    /// The current drawing color is saved and restored around the fill, so
    /// it is unchanged when this returns.
    pub fn clear(&mut self) {
        let saved = self.state.color;
        self.state.color = self.background;
        self.graphics().cover();
        self.state.color = saved;
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn foreground(&self) -> Color {
        self.foreground
    }

    /// The current drawing color.
    pub fn color(&self) -> Color {
        self.state.color
    }

    /// Reads back one pixel with straight alpha.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Color::rgba(c.red(), c.green(), c.blue(), c.alpha()))
    }

    /// Raw premultiplied RGBA bytes of the buffer.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Copies the buffer out as straight-alpha RGBA, row-major from the top
    /// left.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect()
    }

    /// Copies the buffer for presentation.
    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot {
            framebuffer: self.pixmap.data().to_vec().into_boxed_slice(),
            width_px: self.width(),
            height_px: self.height(),
        }
    }

    /// Writes the buffer as PNG to `w`.
    pub fn encode_png(&self, w: impl Write) -> Result<()> {
        encode::write_png_rgba8(w, self.width(), self.height(), &self.to_rgba8())
            .context("Failed to encode surface as PNG")
    }

    /// Writes the buffer as a PNG file at `path`.
    pub fn encode_to_file(&self, path: &Path) -> Result<()> {
        debug!("Encoding {}x{} surface to {}", self.width(), self.height(), path.display());
        encode::save_png_rgba8(path, self.width(), self.height(), &self.to_rgba8())
    }
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("background", &self.background)
            .field("state", &self.state)
            .finish()
    }
}
