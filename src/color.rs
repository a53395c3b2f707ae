// src/color.rs

//! Defines the straight-alpha `Color` used by the drawing context and the
//! configuration, plus the table of named colors.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The named colors available to configuration files and client code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedColor {
    Black,
    White,
    Gray,
    LightGray,
    DarkGray,
    Red,
    Green,
    Blue,
    Yellow,
    Cyan,
    Magenta,
    Orange,
    Pink,
}

impl NamedColor {
    /// Returns the sRGB value of this named color.
    pub fn to_color(self) -> Color {
        match self {
            NamedColor::Black => Color::rgb(0, 0, 0),
            NamedColor::White => Color::rgb(255, 255, 255),
            NamedColor::Gray => Color::rgb(128, 128, 128),
            NamedColor::LightGray => Color::rgb(192, 192, 192),
            NamedColor::DarkGray => Color::rgb(64, 64, 64),
            NamedColor::Red => Color::rgb(255, 0, 0),
            NamedColor::Green => Color::rgb(0, 255, 0),
            NamedColor::Blue => Color::rgb(0, 0, 255),
            NamedColor::Yellow => Color::rgb(255, 255, 0),
            NamedColor::Cyan => Color::rgb(0, 255, 255),
            NamedColor::Magenta => Color::rgb(255, 0, 255),
            NamedColor::Orange => Color::rgb(255, 200, 0),
            NamedColor::Pink => Color::rgb(255, 175, 175),
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        let named = match name.to_ascii_lowercase().replace(&['-', ' '][..], "_").as_str() {
            "black" => NamedColor::Black,
            "white" => NamedColor::White,
            "gray" | "grey" => NamedColor::Gray,
            "light_gray" | "light_grey" => NamedColor::LightGray,
            "dark_gray" | "dark_grey" => NamedColor::DarkGray,
            "red" => NamedColor::Red,
            "green" => NamedColor::Green,
            "blue" => NamedColor::Blue,
            "yellow" => NamedColor::Yellow,
            "cyan" => NamedColor::Cyan,
            "magenta" => NamedColor::Magenta,
            "orange" => NamedColor::Orange,
            "pink" => NamedColor::Pink,
            _ => return None,
        };
        Some(named)
    }
}

/// An RGBA color with straight (non-premultiplied) 8-bit components.
///
/// In configuration files a color is written as `"#rrggbb"`, `"#rrggbbaa"`
/// or one of the [`NamedColor`] names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const CYAN: Color = Color::rgb(0, 255, 255);
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);
    pub const ORANGE: Color = Color::rgb(255, 200, 0);

    /// An opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// Packs the color as `0xAARRGGBB`.
    pub fn to_argb(&self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    pub(crate) fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl From<NamedColor> for Color {
    fn from(named: NamedColor) -> Self {
        named.to_color()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_opaque() {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let Some(hex) = s.strip_prefix('#') else {
            return NamedColor::from_name(s)
                .map(NamedColor::to_color)
                .ok_or_else(|| anyhow!("Unknown color name '{}'", s));
        };

        if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
            return Err(anyhow!(
                "Invalid color '{}': expected #rrggbb or #rrggbbaa",
                s
            ));
        }
        let component = |idx: usize| -> Result<u8> {
            u8::from_str_radix(&hex[idx..idx + 2], 16)
                .map_err(|e| anyhow!("Invalid color '{}': {}", s, e))
        };
        let a = if hex.len() == 8 { component(6)? } else { 255 };
        Ok(Color::rgba(component(0)?, component(2)?, component(4)?, a))
    }
}

impl TryFrom<String> for Color {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_named_colors() {
        assert_eq!("#0000ff".parse::<Color>().unwrap(), Color::BLUE);
        assert_eq!(
            "#11223344".parse::<Color>().unwrap(),
            Color::rgba(0x11, 0x22, 0x33, 0x44)
        );
        assert_eq!("Magenta".parse::<Color>().unwrap(), Color::MAGENTA);
        assert_eq!("light-grey".parse::<Color>().unwrap(), Color::rgb(192, 192, 192));
    }

    #[test]
    fn rejects_malformed_colors() {
        assert!("#12345".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
        assert!("chartreuse".parse::<Color>().is_err());
    }

    #[test]
    fn serializes_as_hex_string() {
        let json = serde_json::to_string(&Color::rgb(255, 128, 0)).unwrap();
        assert_eq!(json, "\"#ff8000\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::rgb(255, 128, 0));
    }

    #[test]
    fn packs_argb() {
        assert_eq!(Color::rgba(1, 2, 3, 4).to_argb(), 0x0401_0203);
    }
}
