// src/raster/text.rs

//! Font selection and glyph compositing for `Graphics::draw_string`.
//!
//! Font files are located through fontconfig (when the `fontconfig` feature
//! is enabled) and rasterized with fontdue. Loaded faces are cached for the
//! lifetime of the process.

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tiny_skia::{Mask, Paint, Pixmap, Rect, Transform};

/// Font families every installation can resolve, mirroring the usual
/// "logical" family names.
const LOGICAL_FAMILIES: &[(&str, &str)] = &[
    ("monospaced", "monospace"),
    ("dialoginput", "monospace"),
    ("dialog", "sans-serif"),
    ("sansserif", "sans-serif"),
    ("serif", "serif"),
];

/// Last-resort font files, tried in order when fontconfig is unavailable.
const FALLBACK_FONT_FILES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    #[default]
    Plain,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    pub fn is_bold(self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::BoldItalic)
    }
}

/// A font request: family name, style and pixel size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Font {
    pub family: String,
    pub style: FontStyle,
    /// Em size in pixels.
    pub size: f32,
}

impl Font {
    pub fn new(family: impl Into<String>, style: FontStyle, size: f32) -> Self {
        Font {
            family: family.into(),
            style,
            size,
        }
    }

    /// The fontconfig family this request resolves against.
    pub fn system_family(&self) -> &str {
        let folded = self.family.to_ascii_lowercase().replace(' ', "");
        LOGICAL_FAMILIES
            .iter()
            .find(|(logical, _)| *logical == folded)
            .map(|(_, generic)| *generic)
            .unwrap_or(self.family.as_str())
    }
}

impl Default for Font {
    fn default() -> Self {
        Font::new("Dialog", FontStyle::Plain, 12.0)
    }
}

type FaceKey = (String, FontStyle);

/// Process-wide cache of loaded faces. `None` records a failed lookup so it
/// is only attempted (and reported) once.
static FACES: Lazy<Mutex<HashMap<FaceKey, Option<Arc<fontdue::Font>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Returns the face for `font`, loading it on first use.
pub fn load_face(font: &Font) -> Option<Arc<fontdue::Font>> {
    let key = (font.system_family().to_string(), font.style);
    let mut faces = match FACES.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    faces
        .entry(key)
        .or_insert_with_key(|(family, style)| {
            let face = locate_font_file(family, *style).and_then(|path| read_face(&path));
            if face.is_none() {
                warn!(
                    "No usable font for family '{}' ({:?}); text will not be drawn",
                    family, style
                );
            }
            face
        })
        .clone()
}

fn read_face(path: &Path) -> Option<Arc<fontdue::Font>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read font file {}: {}", path.display(), e);
            return None;
        }
    };
    match fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default()) {
        Ok(face) => {
            info!("Loaded font {}", path.display());
            Some(Arc::new(face))
        }
        Err(e) => {
            warn!("Failed to parse font file {}: {}", path.display(), e);
            None
        }
    }
}

fn locate_font_file(family: &str, style: FontStyle) -> Option<PathBuf> {
    #[cfg(feature = "fontconfig")]
    if let Some(path) = fontconfig::match_file(family, style) {
        return Some(path);
    }

    debug!(
        "Falling back to well-known font files for '{}' ({:?})",
        family, style
    );
    FALLBACK_FONT_FILES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
}

#[cfg(feature = "fontconfig")]
mod fontconfig {
    use super::FontStyle;
    use fontconfig_sys::constants::FC_FILE;
    use fontconfig_sys::{
        FcConfigSubstitute, FcDefaultSubstitute, FcFontMatch, FcMatchPattern, FcNameParse,
        FcPatternDestroy, FcPatternGetString, FcResult,
    };
    use log::trace;
    use std::ffi::{CStr, CString};
    use std::os::raw::c_char;
    use std::path::PathBuf;
    use std::ptr;

    /// Escapes the characters fontconfig's name syntax treats as separators.
    pub(super) fn escape_family(family: &str) -> String {
        let mut escaped = String::with_capacity(family.len());
        for c in family.chars() {
            if matches!(c, '\\' | '-' | ':' | ',') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }

    pub(super) fn pattern_name(family: &str, style: FontStyle) -> String {
        format!(
            "{}:weight={}:slant={}",
            escape_family(family),
            if style.is_bold() { "bold" } else { "regular" },
            if style.is_italic() { "italic" } else { "roman" },
        )
    }

    /// Asks fontconfig for the best file matching `family` and `style`.
    pub(super) fn match_file(family: &str, style: FontStyle) -> Option<PathBuf> {
        let name = CString::new(pattern_name(family, style)).ok()?;

        // SAFETY: every pattern created here is destroyed before returning,
        // and the file string is copied out before its pattern is freed.
        unsafe {
            let pat = FcNameParse(name.as_ptr() as *const u8);
            if pat.is_null() {
                trace!("FcNameParse rejected {:?}", name);
                return None;
            }
            FcConfigSubstitute(ptr::null_mut(), pat, FcMatchPattern);
            FcDefaultSubstitute(pat);

            let mut result: FcResult = std::mem::zeroed();
            let matched = FcFontMatch(ptr::null_mut(), pat, &mut result);
            FcPatternDestroy(pat);
            if matched.is_null() {
                trace!("FcFontMatch found nothing for {:?}", name);
                return None;
            }

            let mut file: *mut u8 = ptr::null_mut();
            FcPatternGetString(matched, FC_FILE.as_ptr() as *const c_char, 0, &mut file);
            let path = if file.is_null() {
                None
            } else {
                Some(PathBuf::from(
                    CStr::from_ptr(file as *const c_char)
                        .to_string_lossy()
                        .into_owned(),
                ))
            };
            FcPatternDestroy(matched);
            trace!("fontconfig matched {:?} -> {:?}", name, path);
            path
        }
    }
}

/// Composites `text` into `pixmap` with its baseline origin at `(x, y)`,
/// painting glyph coverage with `paint`.
pub fn draw_text(
    pixmap: &mut Pixmap,
    face: &fontdue::Font,
    size: f32,
    text: &str,
    x: f32,
    y: f32,
    paint: &Paint<'_>,
    antialias: bool,
) {
    if size <= 0.0 {
        return;
    }
    let Some(mut coverage) = CoverageMask::new(pixmap.width(), pixmap.height()) else {
        return;
    };

    let mut pen_x = x;
    let mut previous: Option<char> = None;
    for ch in text.chars() {
        if ch.is_control() {
            previous = None;
            continue;
        }
        if let Some(kern) = previous.and_then(|p| face.horizontal_kern(p, ch, size)) {
            pen_x += kern;
        }
        previous = Some(ch);

        let (metrics, bitmap) = face.rasterize(ch, size);
        let left = (pen_x + metrics.xmin as f32).round() as i32;
        let top = (y - (metrics.ymin + metrics.height as i32) as f32).round() as i32;
        coverage.stamp(left, top, metrics.width, metrics.height, &bitmap, antialias);
        pen_x += metrics.advance_width;
    }

    coverage.fill(pixmap, paint);
}

/// Glyph coverage of one `draw_text` call, the size of the target pixmap.
struct CoverageMask {
    mask: Mask,
    /// Touched pixels as `(x0, y0, x1, y1)`, end exclusive.
    touched: Option<(u32, u32, u32, u32)>,
}

impl CoverageMask {
    fn new(width: u32, height: u32) -> Option<Self> {
        Some(CoverageMask {
            mask: Mask::new(width, height)?,
            touched: None,
        })
    }

    /// Adds a `w`×`h` coverage bitmap with its top-left corner at
    /// `(left, top)`. Overlapping glyphs keep the stronger coverage.
    fn stamp(
        &mut self,
        left: i32,
        top: i32,
        w: usize,
        h: usize,
        bitmap: &[u8],
        antialias: bool,
    ) {
        let (width, height) = (self.mask.width() as i32, self.mask.height() as i32);
        let stride = width as usize;
        let data = self.mask.data_mut();
        for row in 0..h {
            let py = top + row as i32;
            if py < 0 || py >= height {
                continue;
            }
            for col in 0..w {
                let px = left + col as i32;
                if px < 0 || px >= width {
                    continue;
                }
                let mut cov = bitmap.get(row * w + col).copied().unwrap_or(0);
                if !antialias {
                    cov = if cov >= 128 { 255 } else { 0 };
                }
                if cov == 0 {
                    continue;
                }
                let (px, py) = (px as u32, py as u32);
                let cell = &mut data[py as usize * stride + px as usize];
                *cell = (*cell).max(cov);
                self.touched = Some(match self.touched {
                    None => (px, py, px + 1, py + 1),
                    Some((x0, y0, x1, y1)) => {
                        (x0.min(px), y0.min(py), x1.max(px + 1), y1.max(py + 1))
                    }
                });
            }
        }
    }

    fn fill(&self, pixmap: &mut Pixmap, paint: &Paint<'_>) {
        let Some((x0, y0, x1, y1)) = self.touched else {
            return;
        };
        if let Some(rect) = Rect::from_ltrb(x0 as f32, y0 as f32, x1 as f32, y1 as f32) {
            pixmap.fill_rect(rect, paint, Transform::identity(), Some(&self.mask));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn logical_families_map_to_generic_ones() {
        assert_eq!(Font::new("Monospaced", FontStyle::Plain, 12.0).system_family(), "monospace");
        assert_eq!(Font::new("Dialog", FontStyle::Bold, 16.0).system_family(), "sans-serif");
        assert_eq!(Font::new("Sans Serif", FontStyle::Plain, 9.0).system_family(), "sans-serif");
        assert_eq!(Font::new("Fira Code", FontStyle::Plain, 9.0).system_family(), "Fira Code");
    }

    fn solid(color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        paint
    }

    fn white(width: u32, height: u32) -> Pixmap {
        let mut pixmap = Pixmap::new(width, height).unwrap();
        pixmap.fill(tiny_skia::Color::WHITE);
        pixmap
    }

    fn rgba(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let c = pixmap.pixel(x, y).unwrap().demultiply();
        [c.red(), c.green(), c.blue(), c.alpha()]
    }

    #[test]
    fn full_coverage_paints_the_color() {
        let mut pixmap = white(4, 4);
        let mut coverage = CoverageMask::new(4, 4).unwrap();
        coverage.stamp(1, 1, 2, 2, &[255; 4], true);
        coverage.fill(&mut pixmap, &solid(Color::BLUE));

        assert_eq!(rgba(&pixmap, 1, 1), [0, 0, 255, 255]);
        assert_eq!(rgba(&pixmap, 2, 2), [0, 0, 255, 255]);
        assert_eq!(rgba(&pixmap, 0, 0), [255, 255, 255, 255]);
        assert_eq!(rgba(&pixmap, 3, 3), [255, 255, 255, 255]);
    }

    #[test]
    fn partial_coverage_mixes_with_the_destination() {
        let mut pixmap = white(2, 1);
        let mut coverage = CoverageMask::new(2, 1).unwrap();
        coverage.stamp(0, 0, 1, 1, &[128], true);
        coverage.fill(&mut pixmap, &solid(Color::BLACK));

        let [r, _, _, a] = rgba(&pixmap, 0, 0);
        assert_eq!(a, 255);
        assert!(r > 120 && r < 135, "got {r}");
    }

    #[test]
    fn aliased_text_thresholds_coverage() {
        let mut pixmap = white(2, 1);
        let mut coverage = CoverageMask::new(2, 1).unwrap();
        coverage.stamp(0, 0, 2, 1, &[100, 200], false);
        coverage.fill(&mut pixmap, &solid(Color::BLACK));

        assert_eq!(rgba(&pixmap, 0, 0), [255, 255, 255, 255]);
        assert_eq!(rgba(&pixmap, 1, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn glyphs_outside_the_pixmap_are_clipped() {
        let mut pixmap = white(2, 2);
        let mut coverage = CoverageMask::new(2, 2).unwrap();
        coverage.stamp(-1, -1, 2, 2, &[255; 4], true);
        coverage.stamp(5, 5, 1, 1, &[255], true);
        coverage.fill(&mut pixmap, &solid(Color::RED));

        assert_eq!(rgba(&pixmap, 0, 0), [255, 0, 0, 255]);
        assert_eq!(rgba(&pixmap, 1, 1), [255, 255, 255, 255]);
    }

    #[cfg(feature = "fontconfig")]
    #[test]
    fn fontconfig_names_escape_separators() {
        assert_eq!(
            fontconfig::pattern_name("sans-serif", FontStyle::BoldItalic),
            "sans\\-serif:weight=bold:slant=italic"
        );
        assert_eq!(
            fontconfig::pattern_name("Mono", FontStyle::Plain),
            "Mono:weight=regular:slant=roman"
        );
    }
}
