// src/display/driver.rs
//! DisplayDriver trait - minimal interface for platform-specific window
//! primitives.
//!
//! ## Threading Model
//! - The driver lives on the window thread that created it; it never
//!   crosses threads, so raw platform handles are fine.
//! - The session talks to that thread through `PresentationWindow`.
//!
//! ## Lifecycle
//! 1. Construction - connect to the platform, no window yet
//! 2. `handle_request(Init)` - create and show the window, report its size
//! 3. Request/response loop - present, poll events, retitle
//! 4. `Drop` - cleanup (no explicit shutdown message)

use crate::display::messages::{DisplayError, DriverRequest, DriverResponse};
use anyhow::Result;

/// Minimal platform-specific display driver interface.
pub trait DisplayDriver {
    /// Connect to the platform. No window is created yet.
    fn new() -> Result<Self>
    where
        Self: Sized;

    /// Handle one request, returning its response.
    ///
    /// ## Request/Response Pairs
    /// - `Init` → `InitComplete`
    /// - `PollEvents` → `Events`
    /// - `Present(snapshot)` → `PresentComplete(snapshot)`
    /// - `SetTitle(s)` → `TitleSet`
    ///
    /// A failed `Present` returns the snapshot inside
    /// `DisplayError::PresentationFailed`.
    fn handle_request(&mut self, request: DriverRequest) -> Result<DriverResponse, DisplayError>;
}
