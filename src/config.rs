// src/config.rs

//! Defines the configuration structures for `drawframe`.
//!
//! Every value here is a default that client code can override before the
//! first window is created. The structs deserialize from JSON; missing fields
//! keep their defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::color::Color;
use crate::raster::Font;

/// Environment variable naming an optional JSON configuration file.
pub const CONFIG_ENV_VAR: &str = "DRAWFRAME_CONFIG";

pub const DEFAULT_TITLE: &str = "DrawFrame";
pub const DEFAULT_WIDTH: u32 = 600;
pub const DEFAULT_HEIGHT: u32 = 400;
pub const DEFAULT_STROKE_WIDTH: f32 = 2.0;

// --- Top-Level Configuration Structure ---

/// Represents the complete configuration of a drawing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Window defaults used by `create_default`.
    pub window: WindowConfig,
    /// Initial drawing-context state and surface colors.
    pub drawing: DrawingConfig,
    /// Which display driver to open.
    pub display: DisplayConfig,
}

/// Defines the window used when no explicit title or size is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Width of the drawing area (content region), in pixels.
    pub width: u32,
    /// Height of the drawing area (content region), in pixels.
    pub height: u32,
    /// If true, closing the window terminates the process.
    pub exit_on_close: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            title: DEFAULT_TITLE.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            exit_on_close: true,
        }
    }
}

/// Defines the state a fresh raster surface starts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingConfig {
    pub stroke_width: f32,
    /// Color the surface is filled with on creation and by `clear()`.
    pub background: Color,
    /// Initial drawing color.
    pub foreground: Color,
    pub font: Font,
    /// Antialiasing for shapes.
    pub antialias: bool,
    /// Antialiasing for text.
    pub text_antialias: bool,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        DrawingConfig {
            stroke_width: DEFAULT_STROKE_WIDTH,
            background: Color::WHITE,
            foreground: Color::BLACK,
            font: Font::default(),
            antialias: true,
            text_antialias: true,
        }
    }
}

/// Selects the display driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisplayBackend {
    /// X11 when it is compiled in and `DISPLAY` is set, headless otherwise.
    #[default]
    Auto,
    X11,
    Headless,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DisplayConfig {
    pub backend: DisplayBackend,
}

impl Config {
    /// Loads a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Loads the file named by `DRAWFRAME_CONFIG`, falling back to defaults.
    pub fn from_env() -> Self {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                let path = PathBuf::from(path);
                Config::load(&path).unwrap_or_else(|e| {
                    warn!("{:#}. Using default configuration.", e);
                    Config::default()
                })
            }
            None => {
                debug!("{} not set, using default configuration.", CONFIG_ENV_VAR);
                Config::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::FontStyle;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.window.title, "DrawFrame");
        assert_eq!(config.window.width, 600);
        assert_eq!(config.window.height, 400);
        assert!(config.window.exit_on_close);
        assert_eq!(config.drawing.stroke_width, 2.0);
        assert_eq!(config.drawing.background, Color::WHITE);
        assert_eq!(config.drawing.foreground, Color::BLACK);
        assert_eq!(config.display.backend, DisplayBackend::Auto);
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r##"{{
                "window": {{ "title": "sketch", "width": 320 }},
                "drawing": {{ "background": "#102030", "font": {{ "family": "Serif", "style": "bold", "size": 18.0 }} }},
                "display": {{ "backend": "headless" }}
            }}"##
        )?;

        let config = Config::load(file.path())?;
        assert_eq!(config.window.title, "sketch");
        assert_eq!(config.window.width, 320);
        assert_eq!(config.window.height, DEFAULT_HEIGHT);
        assert_eq!(config.drawing.background, Color::rgb(0x10, 0x20, 0x30));
        assert_eq!(config.drawing.foreground, Color::BLACK);
        assert_eq!(config.drawing.font.style, FontStyle::Bold);
        assert_eq!(config.display.backend, DisplayBackend::Headless);
        Ok(())
    }

    #[test]
    fn malformed_file_is_an_error() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, "{{ \"drawing\": {{ \"background\": \"#zz\" }} }}")?;
        assert!(Config::load(file.path()).is_err());
        Ok(())
    }
}
