// src/session.rs

//! The drawing session: owns the one surface/window pair and exposes the
//! operations client code uses.
//!
//! A `DrawingSession` starts Uninitialized. The first `create` builds the
//! window and a surface sized to the window's realized content region and
//! moves the session to Active; later `create` calls log a warning and hand
//! back the same `DrawFrame`.

#[cfg(test)]
mod tests;

use crate::config::{Config, DisplayBackend};
use crate::display::{
    DisplayDriver, DisplayEvent, DriverFactory, HeadlessDisplayDriver, PresentationWindow,
    WindowOptions,
};
use crate::keys::{self, KeySymbol, Modifiers};
use crate::pacing::{self, SleepOutcome};
use crate::raster::{Graphics, RasterSurface};
use crate::save::{self, NativeSaveDialog, SaveDialog};
use anyhow::{anyhow, Result};
use log::{debug, error, info, trace, warn};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

/// How long `wait_for_close` blocks per event wait.
const CLOSE_WAIT_SLICE: Duration = Duration::from_millis(100);

/// Entry point for client code.
pub struct DrawingSession {
    config: Config,
    driver: Option<DriverFactory>,
    dialog: Option<Box<dyn SaveDialog>>,
    frame: Option<DrawFrame>,
}

impl DrawingSession {
    /// A session whose window backend is picked from `config.display`.
    pub fn new(config: Config) -> Self {
        DrawingSession {
            config,
            driver: None,
            dialog: None,
            frame: None,
        }
    }

    /// A session whose window is built by `factory` instead of the
    /// configured backend.
    pub fn with_driver(config: Config, factory: DriverFactory) -> Self {
        DrawingSession {
            driver: Some(factory),
            ..Self::new(config)
        }
    }

    /// Replaces the native file picker used by the save shortcut.
    pub fn with_save_dialog(mut self, dialog: Box<dyn SaveDialog>) -> Self {
        self.dialog = Some(dialog);
        self
    }

    /// The configuration, while it can still be changed.
    ///
    /// Returns `None` once the session is Active: defaults only apply to the
    /// first `create`.
    pub fn defaults_mut(&mut self) -> Option<&mut Config> {
        if self.frame.is_some() {
            None
        } else {
            Some(&mut self.config)
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.frame.is_some()
    }

    /// Returns the session's frame, opening the window on the first call.
    ///
    /// A repeated call is a usage mistake: it is logged and returns the
    /// existing frame unchanged, ignoring the new title and size.
    pub fn create(&mut self, title: &str, width: u32, height: u32) -> Result<&mut DrawFrame> {
        match self.frame {
            Some(ref mut frame) => {
                warn!("DrawingSession::create(): only one DrawFrame instance allowed");
                Ok(frame)
            }
            None => {
                let frame = self.open_frame(title, width, height)?;
                Ok(self.frame.insert(frame))
            }
        }
    }

    /// `create` with the configured title and size.
    pub fn create_default(&mut self) -> Result<&mut DrawFrame> {
        let window = self.config.window.clone();
        self.create(&window.title, window.width, window.height)
    }

    /// The active frame, if `create` has succeeded.
    pub fn frame(&mut self) -> Option<&mut DrawFrame> {
        self.frame.as_mut()
    }

    fn open_frame(&mut self, title: &str, width: u32, height: u32) -> Result<DrawFrame> {
        if width == 0 || height == 0 {
            return Err(anyhow!(
                "Drawing area must be at least 1x1, got {}x{}",
                width,
                height
            ));
        }

        let factory = match self.driver.take() {
            Some(factory) => factory,
            None => driver_factory(self.config.display.backend)?,
        };

        let window = PresentationWindow::open(
            WindowOptions {
                title: title.to_string(),
                width,
                height,
                exit_on_close: self.config.window.exit_on_close,
            },
            factory,
        )?;

        // The buffer follows the realized content region, not the request.
        let surface = RasterSurface::new(
            window.content_width(),
            window.content_height(),
            &self.config.drawing,
        )?;

        let dialog = self
            .dialog
            .take()
            .unwrap_or_else(|| Box::new(NativeSaveDialog::new()) as Box<dyn SaveDialog>);

        let mut frame = DrawFrame::new(window, surface, dialog);
        // Show the background right away instead of whatever the platform
        // paints into a fresh window.
        frame.window.publish(&frame.surface);
        Ok(frame)
    }
}

impl Default for DrawingSession {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn driver_factory(backend: DisplayBackend) -> Result<DriverFactory> {
    match backend {
        DisplayBackend::Headless => Ok(headless_factory()),
        DisplayBackend::X11 => x11_factory(),
        DisplayBackend::Auto => {
            if cfg!(feature = "x11") && std::env::var_os("DISPLAY").is_some() {
                x11_factory()
            } else {
                warn!("No display server available, drawing without a visible window");
                Ok(headless_factory())
            }
        }
    }
}

fn headless_factory() -> DriverFactory {
    Box::new(|| Ok(Box::new(HeadlessDisplayDriver::new()?) as Box<dyn DisplayDriver>))
}

#[cfg(feature = "x11")]
fn x11_factory() -> Result<DriverFactory> {
    use crate::display::X11DisplayDriver;
    Ok(Box::new(|| {
        Ok(Box::new(X11DisplayDriver::new()?) as Box<dyn DisplayDriver>)
    }))
}

#[cfg(not(feature = "x11"))]
fn x11_factory() -> Result<DriverFactory> {
    Err(anyhow!("This build has no X11 support"))
}

// --- DrawFrame ---

/// Work a key binding triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameAction {
    SaveInteractive,
}

struct KeyBinding {
    matches: fn(KeySymbol, Modifiers) -> bool,
    action: FrameAction,
}

type SharedDialog = Arc<Mutex<Box<dyn SaveDialog>>>;

fn lock_dialog(dialog: &SharedDialog) -> MutexGuard<'_, Box<dyn SaveDialog>> {
    dialog.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The active drawing window and its raster buffer.
///
/// Drawing goes to the buffer only. `refresh` publishes it to the window.
/// Window events (the save shortcut, close) are handled on the calling
/// thread during `refresh`, `sleep`, `pump_events` and `wait_for_close`.
/// The save shortcut opens the picker on a helper thread; the chosen file is
/// written from the buffer at the first of those calls after it answers.
pub struct DrawFrame {
    window: PresentationWindow,
    surface: RasterSurface,
    dialog: SharedDialog,
    /// Answer of the picker opened by the save shortcut, while it is open.
    pending_save: Option<Receiver<Option<PathBuf>>>,
    bindings: Vec<KeyBinding>,
}

impl DrawFrame {
    fn new(window: PresentationWindow, surface: RasterSurface, dialog: Box<dyn SaveDialog>) -> Self {
        let mut frame = DrawFrame {
            window,
            surface,
            dialog: Arc::new(Mutex::new(dialog)),
            pending_save: None,
            bindings: Vec::new(),
        };
        frame.bind_key(keys::is_save_shortcut, FrameAction::SaveInteractive);
        frame
    }

    fn bind_key(&mut self, matches: fn(KeySymbol, Modifiers) -> bool, action: FrameAction) {
        self.bindings.push(KeyBinding { matches, action });
    }

    /// The drawing context bound to the buffer.
    pub fn graphics(&mut self) -> Graphics<'_> {
        self.surface.graphics()
    }

    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    pub fn window(&self) -> &PresentationWindow {
        &self.window
    }

    /// Fills the buffer with the background color. The window keeps showing
    /// the old picture until the next `refresh`.
    pub fn clear(&mut self) {
        self.surface.clear();
    }

    /// Publishes the buffer to the window. The repaint happens
    /// asynchronously.
    pub fn refresh(&mut self) {
        self.window.publish(&self.surface);
        self.pump_events();
    }

    /// Width of the drawing area.
    pub fn width(&self) -> u32 {
        self.window.content_width()
    }

    /// Height of the drawing area.
    pub fn height(&self) -> u32 {
        self.window.content_height()
    }

    pub fn title(&self) -> &str {
        self.window.title()
    }

    /// Writes the buffer to `path` as PNG. Failures are logged, not raised.
    pub fn save_to(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match self.surface.encode_to_file(path) {
            Ok(()) => {
                let shown = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
                info!("Drawing saved to {}", shown.display());
                true
            }
            Err(e) => {
                error!("Could not write file {}: {:#}", path.display(), e);
                false
            }
        }
    }

    /// Asks for a destination with the save picker, suggesting
    /// `./<title>.png`, and saves there. Blocks until the picker answers.
    /// Returns false when no destination was chosen, the write failed, or a
    /// picker opened by the save shortcut is still showing.
    pub fn save_interactive(&mut self) -> bool {
        if self.is_saving() {
            debug!("Save dialog already open");
            return false;
        }
        let suggested = save::suggested_path(self.title());
        let choice = lock_dialog(&self.dialog).choose_destination(&suggested);
        match choice {
            Some(path) => self.save_to(path),
            None => {
                debug!("Save cancelled");
                false
            }
        }
    }

    /// True while a picker opened by the save shortcut awaits an answer.
    pub fn is_saving(&self) -> bool {
        self.pending_save.is_some()
    }

    /// Opens the save picker on a helper thread. The answer is collected by
    /// `finish_pending_save`.
    fn begin_save_dialog(&mut self) {
        if self.is_saving() {
            debug!("Save dialog already open");
            return;
        }
        let suggested = save::suggested_path(self.title());
        let dialog = Arc::clone(&self.dialog);
        let (answer_tx, answer_rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("drawframe-save".to_string())
            .spawn(move || {
                let choice = lock_dialog(&dialog).choose_destination(&suggested);
                let _ = answer_tx.send(choice);
            });
        match spawned {
            Ok(_) => self.pending_save = Some(answer_rx),
            Err(e) => error!("Failed to spawn save dialog thread: {}", e),
        }
    }

    /// Writes the buffer to the file chosen in the save picker, if it has
    /// answered.
    fn finish_pending_save(&mut self) {
        let answer = match self.pending_save.as_ref().map(Receiver::try_recv) {
            None | Some(Err(TryRecvError::Empty)) => return,
            Some(Ok(answer)) => answer,
            Some(Err(TryRecvError::Disconnected)) => {
                warn!("Save dialog ended without an answer");
                None
            }
        };
        self.pending_save = None;
        match answer {
            Some(path) => {
                self.save_to(path);
            }
            None => debug!("Save cancelled"),
        }
    }

    /// Sleeps the calling thread for about `millis` milliseconds, then
    /// handles any window events that arrived meanwhile.
    pub fn sleep(&mut self, millis: u64) -> SleepOutcome {
        let outcome = pacing::sleep(millis);
        self.pump_events();
        outcome
    }

    /// Handles pending window events. Returns how many were handled.
    pub fn pump_events(&mut self) -> usize {
        let events = self.window.poll_events();
        let count = events.len();
        for event in events {
            self.handle_event(event);
        }
        self.finish_pending_save();
        count
    }

    /// Keeps the window up, handling events, until the user closes it.
    /// Returns at once when nothing is shown on screen.
    pub fn wait_for_close(&mut self) {
        if !self.window.is_visible() {
            debug!("'{}' is not on screen, not waiting for close", self.title());
            return;
        }
        info!("Waiting for '{}' to be closed", self.title());
        while self.window.is_open() {
            if let Some(event) = self.window.next_event(CLOSE_WAIT_SLICE) {
                self.handle_event(event);
            }
            self.finish_pending_save();
        }
    }

    /// False once the window was closed.
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    fn handle_event(&mut self, event: DisplayEvent) {
        match event {
            DisplayEvent::Key {
                symbol, modifiers, ..
            } => {
                let action = self
                    .bindings
                    .iter()
                    .find(|binding| (binding.matches)(symbol, modifiers))
                    .map(|binding| binding.action);
                match action {
                    Some(FrameAction::SaveInteractive) => self.begin_save_dialog(),
                    None => trace!("Unbound key {:?} {:?}", symbol, modifiers),
                }
            }
            DisplayEvent::CloseRequested => info!("'{}' closed", self.title()),
            other => trace!("Ignoring window event {:?}", other),
        }
    }
}

impl std::fmt::Debug for DrawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawFrame")
            .field("title", &self.title())
            .field("width", &self.width())
            .field("height", &self.height())
            .field("open", &self.is_open())
            .field("saving", &self.is_saving())
            .finish()
    }
}
