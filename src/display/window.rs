// src/display/window.rs
//! PresentationWindow - the visible window that shows published frames.
//!
//! The platform driver lives on a dedicated window thread. The session
//! publishes snapshots of the raster buffer over a channel; the window thread
//! keeps the newest one and repaints from it whenever the platform asks.
//! Native events flow back over a second channel and are drained on the
//! caller's thread by `poll_events`.

use crate::display::driver::DisplayDriver;
use crate::display::messages::{
    DisplayError, DisplayEvent, DriverConfig, DriverRequest, DriverResponse, RenderSnapshot,
};
use crate::raster::RasterSurface;
use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, trace, warn};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long the window thread waits for a command before polling native
/// events again.
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Builds the driver on the window thread.
pub type DriverFactory = Box<dyn FnOnce() -> Result<Box<dyn DisplayDriver>> + Send>;

/// Window metrics discovered during initialization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMetrics {
    pub width_px: u32,
    pub height_px: u32,
    pub scale_factor: f64,
    /// Whether anything is shown on screen.
    pub visible: bool,
}

/// Window creation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Terminate the process when the user closes the window.
    pub exit_on_close: bool,
}

enum WindowCommand {
    Publish(RenderSnapshot),
    SetTitle(String),
    Sync(Sender<()>),
    Shutdown,
}

/// Handle to the on-screen window.
pub struct PresentationWindow {
    title: String,
    metrics: DisplayMetrics,
    commands: Sender<WindowCommand>,
    events: Receiver<DisplayEvent>,
    thread: Option<JoinHandle<()>>,
    open: bool,
}

impl PresentationWindow {
    /// Creates the window thread, builds the driver there and waits until
    /// the window is showing.
    ///
    /// The realized content size may differ from the requested one; read it
    /// back with `content_width`/`content_height`.
    pub fn open(options: WindowOptions, factory: DriverFactory) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let (init_tx, init_rx) = mpsc::channel::<Result<DisplayMetrics>>();

        let driver_config = DriverConfig {
            title: options.title.clone(),
            width_px: options.width,
            height_px: options.height,
        };
        let exit_on_close = options.exit_on_close;

        let thread = thread::Builder::new()
            .name("drawframe-window".to_string())
            .spawn(move || {
                let mut driver = match factory() {
                    Ok(driver) => driver,
                    Err(e) => {
                        let _ = init_tx.send(Err(e.context("Failed to create display driver")));
                        return;
                    }
                };
                match initialize(driver.as_mut(), driver_config) {
                    Ok(metrics) => {
                        let _ = init_tx.send(Ok(metrics));
                    }
                    Err(e) => {
                        let _ = init_tx.send(Err(e));
                        return;
                    }
                }
                WindowLoop {
                    driver,
                    commands: command_rx,
                    events: event_tx,
                    last_frame: None,
                    exit_on_close,
                }
                .run();
            })
            .context("Failed to spawn window thread")?;

        let metrics = init_rx
            .recv()
            .map_err(|_| anyhow!("Window thread exited during initialization"))??;

        info!(
            "PresentationWindow: '{}' open, content {}x{} px (requested {}x{})",
            options.title, metrics.width_px, metrics.height_px, options.width, options.height
        );

        Ok(PresentationWindow {
            title: options.title,
            metrics,
            commands: command_tx,
            events: event_rx,
            thread: Some(thread),
            open: true,
        })
    }

    /// Hands a copy of the surface to the window, replacing whatever it
    /// showed before. Returns without waiting for the repaint.
    pub fn publish(&self, surface: &RasterSurface) {
        self.send(WindowCommand::Publish(surface.snapshot()));
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        self.send(WindowCommand::SetTitle(title.to_string()));
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Width of the drawable region, excluding decorations.
    pub fn content_width(&self) -> u32 {
        self.metrics.width_px
    }

    /// Height of the drawable region, excluding decorations.
    pub fn content_height(&self) -> u32 {
        self.metrics.height_px
    }

    pub fn metrics(&self) -> DisplayMetrics {
        self.metrics
    }

    /// False when the driver shows nothing on screen.
    pub fn is_visible(&self) -> bool {
        self.metrics.visible
    }

    /// Blocks until every command sent so far has been handled by the window
    /// thread and pending native events have been forwarded. Returns false if
    /// the thread is gone.
    pub fn sync(&self) -> bool {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.commands.send(WindowCommand::Sync(ack_tx)).is_err() {
            return false;
        }
        ack_rx.recv().is_ok()
    }

    /// Drains the events forwarded by the window thread.
    pub fn poll_events(&mut self) -> Vec<DisplayEvent> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(self.observe(event)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.open = false;
                    break;
                }
            }
        }
        events
    }

    /// Waits up to `timeout` for the next event.
    pub fn next_event(&mut self, timeout: Duration) -> Option<DisplayEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(self.observe(event)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.open = false;
                None
            }
        }
    }

    /// False once the user closed the window or the window thread ended.
    pub fn is_open(&self) -> bool {
        self.open
    }

    fn observe(&mut self, event: DisplayEvent) -> DisplayEvent {
        match event {
            DisplayEvent::CloseRequested => self.open = false,
            DisplayEvent::Resize {
                width_px,
                height_px,
            } => {
                self.metrics.width_px = width_px;
                self.metrics.height_px = height_px;
            }
            _ => {}
        }
        event
    }

    fn send(&self, command: WindowCommand) {
        if self.commands.send(command).is_err() {
            debug!("PresentationWindow: window thread gone, command dropped");
        }
    }
}

impl Drop for PresentationWindow {
    fn drop(&mut self) {
        let _ = self.commands.send(WindowCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("PresentationWindow: window thread panicked");
            }
        }
        debug!("PresentationWindow: '{}' closed", self.title);
    }
}

fn initialize(driver: &mut dyn DisplayDriver, config: DriverConfig) -> Result<DisplayMetrics> {
    let response = driver
        .handle_request(DriverRequest::Init(config))
        .map_err(|e| anyhow!(e))
        .context("Failed to initialize display driver")?;

    match response {
        DriverResponse::InitComplete {
            width_px,
            height_px,
            scale_factor,
            visible,
        } => Ok(DisplayMetrics {
            width_px,
            height_px,
            scale_factor,
            visible,
        }),
        other => Err(anyhow!("Expected InitComplete response, got {:?}", other)),
    }
}

// --- Window thread ---

struct WindowLoop {
    driver: Box<dyn DisplayDriver>,
    commands: Receiver<WindowCommand>,
    events: Sender<DisplayEvent>,
    /// Newest published frame, kept for repaints.
    last_frame: Option<RenderSnapshot>,
    exit_on_close: bool,
}

impl WindowLoop {
    fn run(mut self) {
        debug!("Window loop started");
        loop {
            match self.commands.recv_timeout(EVENT_POLL_INTERVAL) {
                Ok(command) => {
                    if !self.handle_command(command) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            if !self.pump_native_events() {
                break;
            }
        }
        debug!("Window loop finished");
    }

    /// Returns false when the loop should stop.
    fn handle_command(&mut self, command: WindowCommand) -> bool {
        match command {
            WindowCommand::Publish(snapshot) => {
                // Only the newest of several queued frames is worth painting.
                let mut newest = snapshot;
                let mut deferred = None;
                while let Ok(next) = self.commands.try_recv() {
                    match next {
                        WindowCommand::Publish(s) => newest = s,
                        other => {
                            deferred = Some(other);
                            break;
                        }
                    }
                }
                self.present(newest);
                match deferred {
                    Some(command) => self.handle_command(command),
                    None => true,
                }
            }
            WindowCommand::SetTitle(title) => {
                match self.driver.handle_request(DriverRequest::SetTitle(title)) {
                    Ok(_) => {}
                    Err(e) => warn!("Failed to set window title: {}", e),
                }
                true
            }
            WindowCommand::Sync(ack) => {
                let alive = self.pump_native_events();
                let _ = ack.send(());
                alive
            }
            WindowCommand::Shutdown => false,
        }
    }

    fn present(&mut self, snapshot: RenderSnapshot) {
        trace!(
            "Presenting {}x{} frame",
            snapshot.width_px,
            snapshot.height_px
        );
        match self.driver.handle_request(DriverRequest::Present(snapshot)) {
            Ok(DriverResponse::PresentComplete(snapshot)) => self.last_frame = Some(snapshot),
            Ok(other) => warn!("Expected PresentComplete response, got {:?}", other),
            Err(DisplayError::PresentationFailed(snapshot, reason)) => {
                warn!("Presentation failed: {}", reason);
                self.last_frame = Some(snapshot);
            }
            Err(e) => warn!("{}", e),
        }
    }

    /// Returns false when the window is gone for good.
    fn pump_native_events(&mut self) -> bool {
        let events = match self.driver.handle_request(DriverRequest::PollEvents) {
            Ok(DriverResponse::Events(events)) => events,
            Ok(other) => {
                warn!("Expected Events response, got {:?}", other);
                return true;
            }
            Err(e) => {
                error!("Polling window events failed: {}", e);
                return true;
            }
        };

        for event in events {
            match event {
                DisplayEvent::Expose => {
                    if let Some(frame) = self.last_frame.take() {
                        self.present(frame);
                    }
                }
                DisplayEvent::CloseRequested => {
                    info!("Window close requested");
                    if self.exit_on_close {
                        info!("Exiting on window close");
                        std::process::exit(0);
                    }
                    let _ = self.events.send(DisplayEvent::CloseRequested);
                    return false;
                }
                other => {
                    let _ = self.events.send(other);
                }
            }
        }
        true
    }
}
