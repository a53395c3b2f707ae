// src/display/messages.rs
//! Message types for communication between the window thread and its
//! DisplayDriver.
//!
//! All communication happens via ownership transfer - no shared state.

use crate::keys::{KeySymbol, Modifiers};
use std::fmt;

/// A copy of the raster buffer, handed to the driver for display.
///
/// `framebuffer` is premultiplied RGBA, row-major from the top left.
#[derive(Clone)]
pub struct RenderSnapshot {
    pub framebuffer: Box<[u8]>,
    pub width_px: u32,
    pub height_px: u32,
}

impl fmt::Debug for RenderSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderSnapshot")
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .field("bytes", &self.framebuffer.len())
            .finish()
    }
}

/// What the driver needs to create the window.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    pub title: String,
    /// Requested content-region size.
    pub width_px: u32,
    pub height_px: u32,
}

/// Requests sent from the window thread to the DisplayDriver.
#[derive(Debug)]
pub enum DriverRequest {
    /// Create and show the window. Driver responds with InitComplete
    /// carrying the realized content size.
    Init(DriverConfig),

    /// Request pending native events from the platform.
    PollEvents,

    /// Display the snapshot. The driver returns ownership with
    /// PresentComplete.
    Present(RenderSnapshot),

    /// Set the window title.
    SetTitle(String),
}

/// Responses sent from the DisplayDriver back to the window thread.
#[derive(Debug)]
pub enum DriverResponse {
    /// Window is visible; these are the realized content dimensions.
    InitComplete {
        width_px: u32,
        height_px: u32,
        scale_factor: f64,
        /// False for drivers that show nothing on screen.
        visible: bool,
    },

    /// Native events that occurred.
    Events(Vec<DisplayEvent>),

    /// Presentation complete, snapshot ownership returned for re-display.
    PresentComplete(RenderSnapshot),

    /// Window title was set.
    TitleSet,
}

/// Platform-agnostic window events.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    /// Key press event.
    Key {
        symbol: KeySymbol,
        modifiers: Modifiers,
        text: Option<String>,
    },

    /// Part of the window was uncovered and must be repainted.
    Expose,

    /// The content region changed size.
    Resize { width_px: u32, height_px: u32 },

    /// User requested window close.
    CloseRequested,

    /// Window gained focus.
    FocusGained,

    /// Window lost focus.
    FocusLost,
}

/// Errors returned by a DisplayDriver.
#[derive(Debug)]
pub enum DisplayError {
    /// Presentation failed; the snapshot is handed back so it is not lost.
    PresentationFailed(RenderSnapshot, String),
    /// Any other driver failure.
    Driver(anyhow::Error),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::PresentationFailed(snapshot, reason) => write!(
                f,
                "Failed to present {}x{} frame: {}",
                snapshot.width_px, snapshot.height_px, reason
            ),
            DisplayError::Driver(e) => write!(f, "Display driver error: {:#}", e),
        }
    }
}

impl std::error::Error for DisplayError {}

impl From<anyhow::Error> for DisplayError {
    fn from(e: anyhow::Error) -> Self {
        DisplayError::Driver(e)
    }
}
