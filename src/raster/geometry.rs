// src/raster/geometry.rs

//! Path construction for the shapes tiny-skia does not build on its own:
//! elliptical arcs, rounded rectangles and coordinate-array polygons.

use tiny_skia::{Path, PathBuilder, Rect};

/// Control-point distance for a quarter ellipse drawn with one cubic.
const KAPPA: f32 = 0.552_284_75;

/// Largest sweep approximated by a single cubic segment, in degrees.
const MAX_SEGMENT_SWEEP_DEG: f32 = 90.0;

/// How an arc outline is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcClosure {
    /// Only the curve itself.
    Open,
    /// The curve plus two radii back to the center (a pie wedge).
    Pie,
}

/// Axis-aligned bounding box of an ellipse, the way all oval and arc
/// operations address their shape.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Ellipse {
    cx: f32,
    cy: f32,
    rx: f32,
    ry: f32,
}

impl Ellipse {
    fn from_bounds(x: f32, y: f32, w: f32, h: f32) -> Option<Self> {
        if !(w > 0.0 && h > 0.0) || !x.is_finite() || !y.is_finite() {
            return None;
        }
        Some(Ellipse {
            cx: x + w / 2.0,
            cy: y + h / 2.0,
            rx: w / 2.0,
            ry: h / 2.0,
        })
    }

    /// Point at parametric angle `t` (radians, counter-clockwise, y down).
    fn point(&self, t: f32) -> (f32, f32) {
        (self.cx + self.rx * t.cos(), self.cy - self.ry * t.sin())
    }

    /// Derivative of `point` with respect to `t`.
    fn tangent(&self, t: f32) -> (f32, f32) {
        (-self.rx * t.sin(), -self.ry * t.cos())
    }

    fn append_segment(&self, pb: &mut PathBuilder, t0: f32, t1: f32) {
        let k = 4.0 / 3.0 * ((t1 - t0) / 4.0).tan();
        let (x0, y0) = self.point(t0);
        let (dx0, dy0) = self.tangent(t0);
        let (x3, y3) = self.point(t1);
        let (dx3, dy3) = self.tangent(t1);
        pb.cubic_to(
            x0 + k * dx0,
            y0 + k * dy0,
            x3 - k * dx3,
            y3 - k * dy3,
            x3,
            y3,
        );
    }
}

/// Builds an elliptical arc inside the box `(x, y, w, h)`.
///
/// Angles are in degrees, counter-clockwise from the positive x axis. They
/// are measured on the ellipse, so 45° always lands on the line from the
/// center to the top-right corner of the box. Sweeps beyond a full turn are
/// clamped.
pub fn arc(
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    start_deg: f32,
    extent_deg: f32,
    closure: ArcClosure,
) -> Option<Path> {
    let ellipse = Ellipse::from_bounds(x, y, w, h)?;
    if extent_deg == 0.0 || !extent_deg.is_finite() || !start_deg.is_finite() {
        return None;
    }
    let extent = extent_deg.clamp(-360.0, 360.0);

    let segments = (extent.abs() / MAX_SEGMENT_SWEEP_DEG).ceil().max(1.0) as usize;
    let step = (extent / segments as f32).to_radians();
    let start = start_deg.to_radians();

    let mut pb = PathBuilder::new();
    let (sx, sy) = ellipse.point(start);
    match closure {
        ArcClosure::Open => pb.move_to(sx, sy),
        ArcClosure::Pie => {
            pb.move_to(ellipse.cx, ellipse.cy);
            pb.line_to(sx, sy);
        }
    }
    for i in 0..segments {
        let t0 = start + step * i as f32;
        ellipse.append_segment(&mut pb, t0, t0 + step);
    }
    if closure == ArcClosure::Pie {
        pb.close();
    }
    pb.finish()
}

/// Builds a rectangle with elliptical corners.
///
/// `arc_w`/`arc_h` are the full width and height of the corner ellipse; they
/// are clamped to the rectangle so oversized values produce an oval.
pub fn round_rect(x: f32, y: f32, w: f32, h: f32, arc_w: f32, arc_h: f32) -> Option<Path> {
    let rect = Rect::from_xywh(x, y, w, h)?;
    if !(w > 0.0 && h > 0.0) {
        return None;
    }
    let rx = (arc_w / 2.0).max(0.0).min(w / 2.0);
    let ry = (arc_h / 2.0).max(0.0).min(h / 2.0);
    if rx == 0.0 || ry == 0.0 {
        return Some(PathBuilder::from_rect(rect));
    }

    let (ox, oy) = (rx * KAPPA, ry * KAPPA);
    let (r, b) = (x + w, y + h);

    let mut pb = PathBuilder::new();
    pb.move_to(x + rx, y);
    pb.line_to(r - rx, y);
    pb.cubic_to(r - rx + ox, y, r, y + ry - oy, r, y + ry);
    pb.line_to(r, b - ry);
    pb.cubic_to(r, b - ry + oy, r - rx + ox, b, r - rx, b);
    pb.line_to(x + rx, b);
    pb.cubic_to(x + rx - ox, b, x, b - ry + oy, x, b - ry);
    pb.line_to(x, y + ry);
    pb.cubic_to(x, y + ry - oy, x + rx - ox, y, x + rx, y);
    pb.close();
    pb.finish()
}

/// Builds a polyline (or closed polygon) from parallel coordinate slices.
///
/// Extra entries in the longer slice are ignored; fewer than two points
/// yields `None`.
pub fn poly(xs: &[f32], ys: &[f32], closed: bool) -> Option<Path> {
    if xs.len().min(ys.len()) < 2 {
        return None;
    }
    let mut points = xs.iter().zip(ys.iter());
    let (&x0, &y0) = points.next()?;

    let mut pb = PathBuilder::new();
    pb.move_to(x0, y0);
    for (&x, &y) in points {
        pb.line_to(x, y);
    }
    if closed {
        pb.close();
    }
    pb.finish()
}

/// Builds a single line segment.
pub fn line(x1: f32, y1: f32, x2: f32, y2: f32) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(x1, y1);
    pb.line_to(x2, y2);
    pb.finish()
}
