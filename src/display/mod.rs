// src/display/mod.rs
//! Message-based display system with Strategy Pattern.
//!
//! - DisplayDriver: Platform-specific primitives (X11, headless)
//! - PresentationWindow: Window thread, frame retention and event forwarding
//! - Messages: Request/Response protocol for communication

pub mod driver;
pub mod drivers;
pub mod messages;
pub mod window;

pub use driver::DisplayDriver;
pub use drivers::{HeadlessDisplayDriver, HeadlessProbe};
#[cfg(feature = "x11")]
pub use drivers::X11DisplayDriver;
pub use messages::{
    DisplayError, DisplayEvent, DriverConfig, DriverRequest, DriverResponse, RenderSnapshot,
};
pub use window::{DisplayMetrics, DriverFactory, PresentationWindow, WindowOptions};
