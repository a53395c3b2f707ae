//! Headless display driver implementation.
//!
//! Shows nothing. Frames and titles are recorded in a shared
//! [`HeadlessProbe`], which can also inject native events, so the rest of
//! the stack can be exercised without a display server.

use crate::display::driver::DisplayDriver;
use crate::display::messages::{
    DisplayError, DisplayEvent, DriverConfig, DriverRequest, DriverResponse, RenderSnapshot,
};
use crate::display::window::DriverFactory;
use anyhow::Result;
use log::{info, trace};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct ProbeState {
    title: Option<String>,
    requested: Option<(u32, u32)>,
    forced_size: Option<(u32, u32)>,
    last_frame: Option<RenderSnapshot>,
    present_count: usize,
    pending_events: VecDeque<DisplayEvent>,
}

/// Shared view into a `HeadlessDisplayDriver`, usable from any thread.
#[derive(Debug, Clone, Default)]
pub struct HeadlessProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl HeadlessProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the driver report this content size instead of the requested
    /// one, the way a window manager may override a size request.
    pub fn force_content_size(&self, width_px: u32, height_px: u32) {
        self.lock().forced_size = Some((width_px, height_px));
    }

    /// Queues an event for the next poll.
    pub fn push_event(&self, event: DisplayEvent) {
        self.lock().pending_events.push_back(event);
    }

    /// The most recently presented frame.
    pub fn last_frame(&self) -> Option<RenderSnapshot> {
        self.lock().last_frame.clone()
    }

    /// Number of Present requests handled, repaints included.
    pub fn present_count(&self) -> usize {
        self.lock().present_count
    }

    pub fn title(&self) -> Option<String> {
        self.lock().title.clone()
    }

    /// The content size requested at Init.
    pub fn requested_size(&self) -> Option<(u32, u32)> {
        self.lock().requested
    }

    fn lock(&self) -> MutexGuard<'_, ProbeState> {
        // A panicking test thread must not wedge the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct HeadlessDisplayDriver {
    probe: HeadlessProbe,
    width_px: u32,
    height_px: u32,
    scale_factor: f64,
}

impl HeadlessDisplayDriver {
    /// Creates a driver reporting into `probe`.
    pub fn with_probe(probe: HeadlessProbe) -> Self {
        HeadlessDisplayDriver {
            probe,
            width_px: 0,
            height_px: 0,
            scale_factor: 1.0,
        }
    }

    /// Driver factory for `PresentationWindow::open`, reporting into `probe`.
    pub fn factory(probe: HeadlessProbe) -> DriverFactory {
        Box::new(move || {
            Ok(Box::new(HeadlessDisplayDriver::with_probe(probe)) as Box<dyn DisplayDriver>)
        })
    }

    pub fn probe(&self) -> &HeadlessProbe {
        &self.probe
    }

    fn handle_init(&mut self, config: DriverConfig) -> DriverResponse {
        let mut state = self.probe.lock();
        state.requested = Some((config.width_px, config.height_px));
        state.title = Some(config.title);
        let (width_px, height_px) = state
            .forced_size
            .unwrap_or((config.width_px, config.height_px));
        self.width_px = width_px;
        self.height_px = height_px;
        info!(
            "HeadlessDisplayDriver: Init - {}x{} px",
            self.width_px, self.height_px
        );
        DriverResponse::InitComplete {
            width_px: self.width_px,
            height_px: self.height_px,
            scale_factor: self.scale_factor,
            visible: false,
        }
    }
}

impl DisplayDriver for HeadlessDisplayDriver {
    fn new() -> Result<Self> {
        info!("HeadlessDisplayDriver::new()");
        Ok(Self::with_probe(HeadlessProbe::new()))
    }

    fn handle_request(&mut self, request: DriverRequest) -> Result<DriverResponse, DisplayError> {
        match request {
            DriverRequest::Init(config) => Ok(self.handle_init(config)),
            DriverRequest::PollEvents => {
                let events = self.probe.lock().pending_events.drain(..).collect();
                Ok(DriverResponse::Events(events))
            }
            DriverRequest::Present(snapshot) => {
                trace!("HeadlessDisplayDriver: Present");
                let mut state = self.probe.lock();
                state.present_count += 1;
                state.last_frame = Some(snapshot.clone());
                Ok(DriverResponse::PresentComplete(snapshot))
            }
            DriverRequest::SetTitle(title) => {
                info!("HeadlessDisplayDriver: SetTitle '{}'", title);
                self.probe.lock().title = Some(title);
                Ok(DriverResponse::TitleSet)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn init(driver: &mut HeadlessDisplayDriver, w: u32, h: u32) -> (u32, u32) {
        let response = driver
            .handle_request(DriverRequest::Init(DriverConfig {
                title: "probe".to_string(),
                width_px: w,
                height_px: h,
            }))
            .unwrap();
        match response {
            DriverResponse::InitComplete {
                width_px,
                height_px,
                ..
            } => (width_px, height_px),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn reports_requested_or_forced_size() {
        let probe = HeadlessProbe::new();
        let mut driver = HeadlessDisplayDriver::with_probe(probe.clone());
        assert_eq!(init(&mut driver, 320, 200), (320, 200));

        probe.force_content_size(300, 180);
        let mut driver = HeadlessDisplayDriver::with_probe(probe.clone());
        assert_eq!(init(&mut driver, 320, 200), (300, 180));
        assert_eq!(probe.requested_size(), Some((320, 200)));
        assert_eq!(probe.title().as_deref(), Some("probe"));
    }

    #[test]
    fn present_returns_the_snapshot_and_records_it() {
        let probe = HeadlessProbe::new();
        let mut driver = HeadlessDisplayDriver::with_probe(probe.clone());
        let snapshot = RenderSnapshot {
            framebuffer: vec![7u8; 16].into_boxed_slice(),
            width_px: 2,
            height_px: 2,
        };
        match driver.handle_request(DriverRequest::Present(snapshot)).unwrap() {
            DriverResponse::PresentComplete(back) => assert_eq!(back.framebuffer.len(), 16),
            other => panic!("unexpected response {other:?}"),
        }
        assert_eq!(probe.present_count(), 1);
        assert_eq!(probe.last_frame().unwrap().framebuffer[0], 7);
    }

    #[test]
    fn injected_events_are_polled_once() {
        let probe = HeadlessProbe::new();
        let mut driver = HeadlessDisplayDriver::with_probe(probe.clone());
        probe.push_event(DisplayEvent::Expose);
        probe.push_event(DisplayEvent::FocusGained);

        let poll = |driver: &mut HeadlessDisplayDriver| match driver
            .handle_request(DriverRequest::PollEvents)
            .unwrap()
        {
            DriverResponse::Events(events) => events,
            other => panic!("unexpected response {other:?}"),
        };
        assert_eq!(
            poll(&mut driver),
            vec![DisplayEvent::Expose, DisplayEvent::FocusGained]
        );
        assert!(poll(&mut driver).is_empty());
    }
}
