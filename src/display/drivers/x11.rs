//! Minimal X11 DisplayDriver implementation using Xlib.
//!
//! Features:
//! - Fixed-size window whose content region matches the requested size
//!   unless the window manager insists otherwise
//! - Keyboard, focus, expose and close events
//! - Framebuffer presentation via XPutImage
//!
//! Only one native window may exist per process.

use crate::display::driver::DisplayDriver;
use crate::display::messages::{
    DisplayError, DisplayEvent, DriverConfig, DriverRequest, DriverResponse, RenderSnapshot,
};
use crate::keys::{KeySymbol, Modifiers};
use ::x11::keysym;
use ::x11::xlib::*;
use anyhow::{anyhow, Context, Result};
use log::{debug, info, trace, warn};
use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_uint};
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};

const BYTES_PER_PIXEL: usize = 4;

/// Set while an X11 window driver is alive.
static NATIVE_WINDOW_ACTIVE: AtomicBool = AtomicBool::new(false);

pub struct X11DisplayDriver {
    display: *mut Display,
    window: Window,
    gc: GC,
    visual: *mut Visual,
    depth: c_int,
    wm_delete_window: Atom,
    width_px: u32,
    height_px: u32,
    scale_factor: f64,
    /// BGRX staging buffer handed to XPutImage.
    staging: Vec<u8>,
}

impl DisplayDriver for X11DisplayDriver {
    fn new() -> Result<Self> {
        info!("X11DisplayDriver::new() - Initializing X11 display");

        if NATIVE_WINDOW_ACTIVE.swap(true, Ordering::SeqCst) {
            return Err(anyhow!("A native drawing window is already open in this process"));
        }

        unsafe {
            let display = XOpenDisplay(ptr::null());
            if display.is_null() {
                NATIVE_WINDOW_ACTIVE.store(false, Ordering::SeqCst);
                return Err(anyhow!("Failed to open X11 display. Is DISPLAY set?"));
            }

            let screen = XDefaultScreen(display);
            let visual = XDefaultVisual(display, screen);
            let depth = XDefaultDepth(display, screen);
            if depth < 24 {
                warn!("X11DisplayDriver: default depth is {}, colors may be wrong", depth);
            }

            Ok(Self {
                display,
                window: 0,
                gc: ptr::null_mut(),
                visual,
                depth,
                wm_delete_window: 0,
                width_px: 0,
                height_px: 0,
                scale_factor: 1.0,
                staging: Vec::new(),
            })
        }
    }

    fn handle_request(&mut self, request: DriverRequest) -> Result<DriverResponse, DisplayError> {
        match request {
            DriverRequest::Init(config) => Ok(self.handle_init(config)?),
            DriverRequest::PollEvents => Ok(self.handle_poll_events()),
            DriverRequest::Present(snapshot) => self.handle_present(snapshot),
            DriverRequest::SetTitle(title) => Ok(self.handle_set_title(&title)?),
        }
    }
}

impl X11DisplayDriver {
    fn handle_init(&mut self, config: DriverConfig) -> Result<DriverResponse> {
        if self.window != 0 {
            return Err(anyhow!("X11 window already initialized"));
        }
        let title = CString::new(config.title.as_str()).context("Window title contains NUL")?;

        unsafe {
            let screen = XDefaultScreen(self.display);
            let root = XRootWindow(self.display, screen);

            let window = XCreateSimpleWindow(
                self.display,
                root,
                0,
                0,
                config.width_px as c_uint,
                config.height_px as c_uint,
                0,
                XBlackPixel(self.display, screen),
                XWhitePixel(self.display, screen),
            );
            if window == 0 {
                return Err(anyhow!("Failed to create X11 window"));
            }
            self.window = window;

            XStoreName(self.display, window, title.as_ptr());

            // Ask the window manager to keep the content region fixed.
            let hints = XAllocSizeHints();
            if !hints.is_null() {
                (*hints).flags = PMinSize | PMaxSize;
                (*hints).min_width = config.width_px as c_int;
                (*hints).max_width = config.width_px as c_int;
                (*hints).min_height = config.height_px as c_int;
                (*hints).max_height = config.height_px as c_int;
                XSetWMNormalHints(self.display, window, hints);
                XFree(hints as *mut _);
            }

            XSelectInput(
                self.display,
                window,
                ExposureMask | KeyPressMask | StructureNotifyMask | FocusChangeMask,
            );

            self.gc = XCreateGC(self.display, window, 0, ptr::null_mut());

            let mut wm_delete_window = XInternAtom(
                self.display,
                b"WM_DELETE_WINDOW\0".as_ptr() as *const c_char,
                False,
            );
            XSetWMProtocols(self.display, window, &mut wm_delete_window, 1);
            self.wm_delete_window = wm_delete_window;

            XMapWindow(self.display, window);
            self.wait_for_map();

            let mut attributes: XWindowAttributes = std::mem::zeroed();
            if XGetWindowAttributes(self.display, window, &mut attributes) != 0 {
                self.width_px = attributes.width.max(1) as u32;
                self.height_px = attributes.height.max(1) as u32;
            } else {
                self.width_px = config.width_px;
                self.height_px = config.height_px;
            }
        }

        info!(
            "X11DisplayDriver: Initialized {}x{} px (requested {}x{})",
            self.width_px, self.height_px, config.width_px, config.height_px
        );

        Ok(DriverResponse::InitComplete {
            width_px: self.width_px,
            height_px: self.height_px,
            scale_factor: self.scale_factor,
            visible: true,
        })
    }

    /// Blocks until the server reports the window as mapped.
    unsafe fn wait_for_map(&mut self) {
        let mut event: XEvent = std::mem::zeroed();
        loop {
            XWindowEvent(self.display, self.window, StructureNotifyMask, &mut event);
            match event.get_type() {
                MapNotify => break,
                ConfigureNotify => {
                    let configure = event.configure;
                    self.width_px = configure.width.max(1) as u32;
                    self.height_px = configure.height.max(1) as u32;
                }
                _ => {}
            }
        }
    }

    fn handle_poll_events(&mut self) -> DriverResponse {
        let mut events = Vec::new();

        unsafe {
            while XPending(self.display) > 0 {
                let mut event: XEvent = std::mem::zeroed();
                XNextEvent(self.display, &mut event);

                if let Some(display_event) = self.convert_event(&mut event) {
                    events.push(display_event);
                }
            }
        }

        DriverResponse::Events(events)
    }

    unsafe fn convert_event(&mut self, event: &mut XEvent) -> Option<DisplayEvent> {
        match event.get_type() {
            KeyPress => {
                let mut key_event = event.key;
                let keysym = XLookupKeysym(&mut key_event, 0);

                let symbol = map_keysym_to_symbol(keysym);
                let modifiers = extract_modifiers(key_event.state);

                let mut buffer = [0u8; 32];
                let count = XLookupString(
                    &mut key_event,
                    buffer.as_mut_ptr() as *mut c_char,
                    buffer.len() as c_int,
                    ptr::null_mut(),
                    ptr::null_mut(),
                );
                let text = if count > 0 {
                    Some(String::from_utf8_lossy(&buffer[..count as usize]).to_string())
                } else {
                    None
                };

                trace!("X11DisplayDriver: key {:?} {:?}", symbol, modifiers);
                Some(DisplayEvent::Key {
                    symbol,
                    modifiers,
                    text,
                })
            }
            Expose => {
                // Only the last of a burst of exposes needs a repaint.
                if event.expose.count == 0 {
                    Some(DisplayEvent::Expose)
                } else {
                    None
                }
            }
            ConfigureNotify => {
                let configure = event.configure;
                let (width_px, height_px) =
                    (configure.width.max(1) as u32, configure.height.max(1) as u32);
                if (width_px, height_px) == (self.width_px, self.height_px) {
                    return None;
                }
                debug!(
                    "X11DisplayDriver: content resized to {}x{}",
                    width_px, height_px
                );
                self.width_px = width_px;
                self.height_px = height_px;
                Some(DisplayEvent::Resize {
                    width_px,
                    height_px,
                })
            }
            FocusIn => Some(DisplayEvent::FocusGained),
            FocusOut => Some(DisplayEvent::FocusLost),
            ClientMessage => {
                let atom = event.client_message.data.get_long(0) as Atom;
                if atom == self.wm_delete_window {
                    Some(DisplayEvent::CloseRequested)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn handle_present(&mut self, snapshot: RenderSnapshot) -> Result<DriverResponse, DisplayError> {
        trace!("X11DisplayDriver: Presenting frame");

        if self.window == 0 {
            return Err(DisplayError::PresentationFailed(
                snapshot,
                "Window not initialized".to_string(),
            ));
        }

        let expected = snapshot.width_px as usize * snapshot.height_px as usize * BYTES_PER_PIXEL;
        if snapshot.framebuffer.len() != expected {
            let reason = format!(
                "Framebuffer holds {} bytes, expected {}",
                snapshot.framebuffer.len(),
                expected
            );
            return Err(DisplayError::PresentationFailed(snapshot, reason));
        }

        fill_staging(&mut self.staging, &snapshot.framebuffer);

        unsafe {
            let image = XCreateImage(
                self.display,
                self.visual,
                self.depth as c_uint,
                ZPixmap,
                0,
                self.staging.as_mut_ptr() as *mut c_char,
                snapshot.width_px,
                snapshot.height_px,
                32,
                0,
            );

            if image.is_null() {
                return Err(DisplayError::PresentationFailed(
                    snapshot,
                    "Failed to create XImage".to_string(),
                ));
            }
            // The staging buffer is laid out B, G, R, X in memory.
            (*image).byte_order = LSBFirst;

            XPutImage(
                self.display,
                self.window,
                self.gc,
                image,
                0,
                0,
                0,
                0,
                snapshot.width_px,
                snapshot.height_px,
            );

            // The staging buffer is ours; keep XDestroyImage from freeing it.
            (*image).data = ptr::null_mut();
            XDestroyImage(image);

            XFlush(self.display);
        }

        Ok(DriverResponse::PresentComplete(snapshot))
    }

    fn handle_set_title(&mut self, title: &str) -> Result<DriverResponse> {
        let c_title = CString::new(title).context("Window title contains NUL")?;
        unsafe {
            XStoreName(self.display, self.window, c_title.as_ptr());
            XFlush(self.display);
        }
        Ok(DriverResponse::TitleSet)
    }
}

impl Drop for X11DisplayDriver {
    fn drop(&mut self) {
        info!("X11DisplayDriver::drop() - Cleaning up");
        unsafe {
            if !self.gc.is_null() {
                XFreeGC(self.display, self.gc);
            }
            if self.window != 0 {
                XDestroyWindow(self.display, self.window);
            }
            if !self.display.is_null() {
                XCloseDisplay(self.display);
            }
        }
        NATIVE_WINDOW_ACTIVE.store(false, Ordering::SeqCst);
    }
}

/// Converts premultiplied RGBA into the BGRX layout of a 24-bit TrueColor
/// visual, composited over black.
fn fill_staging(staging: &mut Vec<u8>, rgba: &[u8]) {
    staging.clear();
    staging.reserve(rgba.len());
    for px in rgba.chunks_exact(BYTES_PER_PIXEL) {
        staging.extend_from_slice(&[px[2], px[1], px[0], 0xFF]);
    }
}

fn map_keysym_to_symbol(keysym: KeySym) -> KeySymbol {
    match keysym as c_uint {
        keysym::XK_BackSpace => KeySymbol::Backspace,
        keysym::XK_Tab => KeySymbol::Tab,
        keysym::XK_Return | keysym::XK_KP_Enter => KeySymbol::Enter,
        keysym::XK_Escape => KeySymbol::Escape,
        keysym::XK_Delete => KeySymbol::Delete,
        keysym::XK_Shift_L | keysym::XK_Shift_R => KeySymbol::Shift,
        keysym::XK_Control_L | keysym::XK_Control_R => KeySymbol::Control,
        keysym::XK_Alt_L | keysym::XK_Alt_R => KeySymbol::Alt,
        keysym::XK_Super_L | keysym::XK_Super_R => KeySymbol::Super,
        code if (0x20..0x7f).contains(&code) => KeySymbol::Char(code as u8 as char),
        _ => KeySymbol::Unknown,
    }
}

fn extract_modifiers(state: c_uint) -> Modifiers {
    let mut modifiers = Modifiers::empty();

    if state & ShiftMask != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if state & ControlMask != 0 {
        modifiers |= Modifiers::CONTROL;
    }
    if state & Mod1Mask != 0 {
        modifiers |= Modifiers::ALT;
    }
    if state & Mod4Mask != 0 {
        modifiers |= Modifiers::SUPER;
    }
    if state & LockMask != 0 {
        modifiers |= Modifiers::CAPS_LOCK;
    }
    if state & Mod2Mask != 0 {
        modifiers |= Modifiers::NUM_LOCK;
    }

    modifiers
}
