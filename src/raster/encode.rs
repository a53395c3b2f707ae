// src/raster/encode.rs

//! PNG encoding and decoding of straight-alpha RGBA8 pixel data.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Writes `pixels` (row-major, 4 bytes per pixel, straight alpha) as a PNG.
pub fn write_png_rgba8(
    w: impl Write,
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(pixels)?;
    writer.finish()
}

/// Encodes `pixels` into a new file at `path`, replacing any existing file.
pub fn save_png_rgba8(path: &Path, width: u32, height: u32, pixels: &[u8]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Could not create file {}", path.display()))?;
    let mut w = BufWriter::new(file);
    write_png_rgba8(&mut w, width, height, pixels)
        .with_context(|| format!("Could not encode PNG to {}", path.display()))?;
    w.flush()
        .with_context(|| format!("Could not write file {}", path.display()))?;
    Ok(())
}

/// A decoded image, always expanded to straight-alpha RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// RGBA of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.pixels.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Reads an 8-bit PNG file back into RGBA8.
pub fn load_png_rgba8(path: &Path) -> Result<DecodedImage> {
    let file =
        File::open(path).with_context(|| format!("Could not open file {}", path.display()))?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder
        .read_info()
        .with_context(|| format!("Could not read PNG header of {}", path.display()))?;

    let (color_type, bit_depth) = reader.output_color_type();
    if bit_depth != png::BitDepth::Eight {
        bail!(
            "Unsupported PNG bit depth {:?} in {}",
            bit_depth,
            path.display()
        );
    }
    let (width, height) = {
        let info = reader.info();
        (info.width, info.height)
    };
    let samples = color_type.samples();
    let mut buf = vec![0u8; width as usize * height as usize * samples];
    reader
        .next_frame(&mut buf)
        .with_context(|| format!("Could not decode PNG data of {}", path.display()))?;

    let pixels = match color_type {
        png::ColorType::Rgba => buf,
        png::ColorType::Rgb => buf
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        png::ColorType::GrayscaleAlpha => buf
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        png::ColorType::Grayscale => buf.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        png::ColorType::Indexed => bail!(
            "PNG palette was not expanded while decoding {}",
            path.display()
        ),
    };

    Ok(DecodedImage {
        width,
        height,
        pixels,
    })
}
