// src/raster/graphics.rs

//! The immediate-mode drawing context bound to a `RasterSurface`.

use log::trace;
use tiny_skia::{BlendMode, FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Transform};

use super::geometry::{self, ArcClosure};
use super::text;
use super::{DrawState, Font, RenderingHints, Stroke};
use crate::color::Color;

/// Mutable drawing context for one surface.
///
/// Every call rasterizes straight into the surface's pixel buffer; there is
/// no command queue. The current color, stroke, font and hints belong to the
/// surface, so they survive between calls to `RasterSurface::graphics`.
/// Shapes with non-positive size and polylines with fewer than two points
/// draw nothing.
pub struct Graphics<'a> {
    pixmap: &'a mut Pixmap,
    state: &'a mut DrawState,
}

impl<'a> Graphics<'a> {
    pub(super) fn new(pixmap: &'a mut Pixmap, state: &'a mut DrawState) -> Self {
        Graphics { pixmap, state }
    }

    // --- Context state ---

    pub fn set_color(&mut self, color: Color) {
        self.state.color = color;
    }

    pub fn color(&self) -> Color {
        self.state.color
    }

    pub fn set_stroke(&mut self, stroke: Stroke) {
        self.state.stroke = stroke;
    }

    pub fn stroke(&self) -> &Stroke {
        &self.state.stroke
    }

    /// Changes only the line width of the current stroke.
    pub fn set_stroke_width(&mut self, width: f32) {
        self.state.stroke.width = width.max(0.0);
    }

    pub fn set_font(&mut self, font: Font) {
        self.state.font = font;
    }

    pub fn font(&self) -> &Font {
        &self.state.font
    }

    pub fn set_hints(&mut self, hints: RenderingHints) {
        self.state.hints = hints;
    }

    pub fn hints(&self) -> RenderingHints {
        self.state.hints
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    // --- Lines and outlines ---

    pub fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        if let Some(path) = geometry::line(x1, y1, x2, y2) {
            self.stroke_path(&path);
        }
    }

    pub fn draw_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        if let Some(rect) = positive_rect(x, y, w, h) {
            self.stroke_path(&PathBuilder::from_rect(rect));
        }
    }

    pub fn draw_oval(&mut self, x: f32, y: f32, w: f32, h: f32) {
        if let Some(path) = positive_rect(x, y, w, h).and_then(PathBuilder::from_oval) {
            self.stroke_path(&path);
        }
    }

    pub fn draw_round_rect(&mut self, x: f32, y: f32, w: f32, h: f32, arc_w: f32, arc_h: f32) {
        if let Some(path) = geometry::round_rect(x, y, w, h, arc_w, arc_h) {
            self.stroke_path(&path);
        }
    }

    /// Strokes an open elliptical arc; see [`geometry::arc`] for the angle
    /// convention.
    pub fn draw_arc(&mut self, x: f32, y: f32, w: f32, h: f32, start_deg: f32, extent_deg: f32) {
        if let Some(path) = geometry::arc(x, y, w, h, start_deg, extent_deg, ArcClosure::Open) {
            self.stroke_path(&path);
        }
    }

    /// Strokes the closed polygon through the points `(xs[i], ys[i])`.
    pub fn draw_polygon(&mut self, xs: &[f32], ys: &[f32]) {
        if let Some(path) = geometry::poly(xs, ys, true) {
            self.stroke_path(&path);
        }
    }

    /// Strokes the open polyline through the points `(xs[i], ys[i])`.
    pub fn draw_polyline(&mut self, xs: &[f32], ys: &[f32]) {
        if let Some(path) = geometry::poly(xs, ys, false) {
            self.stroke_path(&path);
        }
    }

    /// Strokes an arbitrary path with the current stroke and color.
    pub fn draw_path(&mut self, path: &Path) {
        self.stroke_path(path);
    }

    // --- Fills ---

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        if let Some(rect) = positive_rect(x, y, w, h) {
            let paint = self.paint();
            self.pixmap
                .fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    pub fn fill_oval(&mut self, x: f32, y: f32, w: f32, h: f32) {
        if let Some(path) = positive_rect(x, y, w, h).and_then(PathBuilder::from_oval) {
            self.fill_path(&path, FillRule::Winding);
        }
    }

    pub fn fill_round_rect(&mut self, x: f32, y: f32, w: f32, h: f32, arc_w: f32, arc_h: f32) {
        if let Some(path) = geometry::round_rect(x, y, w, h, arc_w, arc_h) {
            self.fill_path(&path, FillRule::Winding);
        }
    }

    /// Fills the pie wedge between the arc and the ellipse center.
    pub fn fill_arc(&mut self, x: f32, y: f32, w: f32, h: f32, start_deg: f32, extent_deg: f32) {
        if let Some(path) = geometry::arc(x, y, w, h, start_deg, extent_deg, ArcClosure::Pie) {
            self.fill_path(&path, FillRule::Winding);
        }
    }

    /// Fills the polygon through `(xs[i], ys[i])` using the even-odd rule.
    pub fn fill_polygon(&mut self, xs: &[f32], ys: &[f32]) {
        if let Some(path) = geometry::poly(xs, ys, true) {
            self.fill_path(&path, FillRule::EvenOdd);
        }
    }

    /// Fills an arbitrary path with the current color.
    pub fn fill(&mut self, path: &Path, rule: FillRule) {
        self.fill_path(path, rule);
    }

    // --- Text ---

    /// Draws `text` in the current font with its baseline starting at `(x, y)`.
    pub fn draw_string(&mut self, text: &str, x: f32, y: f32) {
        let Some(face) = text::load_face(&self.state.font) else {
            trace!("draw_string skipped, no face for {:?}", self.state.font);
            return;
        };
        let paint = self.paint();
        text::draw_text(
            self.pixmap,
            &face,
            self.state.font.size,
            text,
            x,
            y,
            &paint,
            self.state.hints.text_antialias,
        );
    }

    // --- Internals ---

    /// Replaces every pixel with the current color, ignoring alpha blending.
    pub(super) fn cover(&mut self) {
        let mut paint = self.paint();
        paint.blend_mode = BlendMode::Source;
        paint.anti_alias = false;
        if let Some(rect) = Rect::from_xywh(
            0.0,
            0.0,
            self.pixmap.width() as f32,
            self.pixmap.height() as f32,
        ) {
            self.pixmap
                .fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    fn paint(&self) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(self.state.color.to_skia());
        paint.anti_alias = self.state.hints.antialias;
        paint
    }

    fn stroke_path(&mut self, path: &Path) {
        let paint = self.paint();
        self.pixmap.stroke_path(
            path,
            &paint,
            &self.state.stroke,
            Transform::identity(),
            None,
        );
    }

    fn fill_path(&mut self, path: &Path, rule: FillRule) {
        let paint = self.paint();
        self.pixmap
            .fill_path(path, &paint, rule, Transform::identity(), None);
    }
}

fn positive_rect(x: f32, y: f32, w: f32, h: f32) -> Option<Rect> {
    if w > 0.0 && h > 0.0 {
        Rect::from_xywh(x, y, w, h)
    } else {
        None
    }
}
