// src/session/tests.rs

use super::*;
use crate::color::Color;
use crate::display::HeadlessProbe;
use crate::raster::encode;
use crate::save::{FixedDestination, NativeSaveDialog};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use test_log::test;

/// Picker that records what it was offered and answers with a fixed path.
struct RecordingDialog {
    answer: Option<PathBuf>,
    offered: Arc<Mutex<Vec<PathBuf>>>,
}

impl SaveDialog for RecordingDialog {
    fn choose_destination(&mut self, suggested: &Path) -> Option<PathBuf> {
        self.offered.lock().unwrap().push(suggested.to_path_buf());
        self.answer.clone()
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.window.exit_on_close = false;
    config
}

fn headless_session(probe: &HeadlessProbe) -> DrawingSession {
    DrawingSession::with_driver(test_config(), HeadlessDisplayDriver::factory(probe.clone()))
        .with_save_dialog(Box::new(FixedDestination::cancelled()))
}

fn ctrl_s() -> DisplayEvent {
    DisplayEvent::Key {
        symbol: KeySymbol::Char('s'),
        modifiers: Modifiers::CONTROL,
        text: None,
    }
}

/// Picker that takes a while to answer.
struct SlowDialog {
    delay: Duration,
    answer: PathBuf,
}

impl SaveDialog for SlowDialog {
    fn choose_destination(&mut self, _suggested: &Path) -> Option<PathBuf> {
        std::thread::sleep(self.delay);
        Some(self.answer.clone())
    }
}

/// Lets the window thread forward injected events, then handles them.
fn deliver(frame: &mut DrawFrame) -> usize {
    assert!(frame.window().sync());
    frame.pump_events()
}

/// Pumps events until the picker opened by the save shortcut has answered
/// and its save is done.
fn settle_save(frame: &mut DrawFrame) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while frame.is_saving() {
        assert!(Instant::now() < deadline, "save dialog never answered");
        std::thread::sleep(Duration::from_millis(5));
        frame.pump_events();
    }
}

#[test]
fn first_create_opens_window_and_surface() -> Result<()> {
    let probe = HeadlessProbe::new();
    let mut session = headless_session(&probe);
    assert!(!session.is_active());
    assert!(session.frame().is_none());

    let frame = session.create("Shapes", 200, 300)?;
    assert_eq!(frame.title(), "Shapes");
    assert_eq!((frame.width(), frame.height()), (200, 300));
    assert_eq!(
        (frame.surface().width(), frame.surface().height()),
        (200, 300)
    );
    assert!(frame.is_open());

    assert!(session.is_active());
    assert_eq!(probe.title().as_deref(), Some("Shapes"));
    assert_eq!(probe.requested_size(), Some((200, 300)));
    Ok(())
}

#[test]
fn surface_follows_realized_content_size() -> Result<()> {
    let probe = HeadlessProbe::new();
    probe.force_content_size(590, 380);
    let mut session = headless_session(&probe);

    let frame = session.create_default()?;
    assert_eq!((frame.width(), frame.height()), (590, 380));
    assert_eq!(
        (frame.surface().width(), frame.surface().height()),
        (590, 380)
    );
    Ok(())
}

#[test]
fn second_create_returns_the_same_frame() -> Result<()> {
    let probe = HeadlessProbe::new();
    let mut session = headless_session(&probe);

    let buffer = {
        let frame = session.create("First", 120, 80)?;
        frame.graphics().fill_rect(0.0, 0.0, 10.0, 10.0);
        frame.surface().data().as_ptr()
    };

    let frame = session.create("Second", 640, 480)?;
    assert_eq!(frame.title(), "First");
    assert_eq!((frame.width(), frame.height()), (120, 80));
    assert_eq!(frame.surface().data().as_ptr(), buffer);
    assert_eq!(frame.surface().pixel(5, 5), Some(Color::BLACK));

    let again = session.create_default()?;
    assert_eq!(again.surface().data().as_ptr(), buffer);
    Ok(())
}

#[test]
fn zero_sized_create_fails_and_leaves_session_uninitialized() -> Result<()> {
    let probe = HeadlessProbe::new();
    let mut session = headless_session(&probe);

    assert!(session.create("Empty", 0, 100).is_err());
    assert!(!session.is_active());
    assert!(session.defaults_mut().is_some());

    // The injected driver was not consumed by the rejected call.
    session.create("Recovered", 10, 10)?;
    assert_eq!(probe.title().as_deref(), Some("Recovered"));
    Ok(())
}

#[test]
fn defaults_apply_until_the_first_create() -> Result<()> {
    let probe = HeadlessProbe::new();
    let mut session = headless_session(&probe);

    {
        let defaults = session.defaults_mut().expect("uninitialized session");
        defaults.window.title = "Configured".to_string();
        defaults.window.width = 64;
        defaults.window.height = 32;
        defaults.drawing.background = Color::YELLOW;
        defaults.drawing.foreground = Color::RED;
        defaults.drawing.stroke_width = 3.5;
    }

    let frame = session.create_default()?;
    assert_eq!(frame.title(), "Configured");
    assert_eq!((frame.width(), frame.height()), (64, 32));
    assert_eq!(frame.surface().pixel(0, 0), Some(Color::YELLOW));
    assert_eq!(frame.surface().color(), Color::RED);
    assert_eq!(frame.graphics().stroke().width, 3.5);

    assert!(session.defaults_mut().is_none());
    Ok(())
}

#[test]
fn refresh_of_cleared_surface_shows_background() -> Result<()> {
    let probe = HeadlessProbe::new();
    let mut session = headless_session(&probe);
    let frame = session.create("Blank", 200, 300)?;

    frame.clear();
    frame.refresh();
    assert!(frame.window().sync());

    let shown = probe.last_frame().expect("a published frame");
    assert_eq!((shown.width_px, shown.height_px), (200, 300));
    assert!(shown.framebuffer.chunks_exact(4).all(|p| p == [255, 255, 255, 255]));
    assert_eq!(&shown.framebuffer[..], frame.surface().data());
    Ok(())
}

#[test]
fn drawing_stays_offscreen_until_refresh() -> Result<()> {
    let probe = HeadlessProbe::new();
    let mut session = headless_session(&probe);
    let frame = session.create("Batch", 50, 50)?;

    frame.refresh();
    frame.graphics().fill_oval(10.0, 10.0, 30.0, 30.0);
    assert!(frame.window().sync());
    let before = probe.last_frame().expect("initial frame");
    assert_ne!(&before.framebuffer[..], frame.surface().data());

    frame.refresh();
    assert!(frame.window().sync());
    let after = probe.last_frame().expect("second frame");
    assert_eq!(&after.framebuffer[..], frame.surface().data());

    // Clearing changes the buffer but not the window.
    frame.clear();
    assert!(frame.window().sync());
    assert_eq!(probe.last_frame().unwrap().framebuffer, after.framebuffer);
    Ok(())
}

#[test]
fn expose_repaints_the_last_published_frame() -> Result<()> {
    let probe = HeadlessProbe::new();
    let mut session = headless_session(&probe);
    let frame = session.create("Expose", 20, 20)?;

    frame.refresh();
    assert!(frame.window().sync());
    let presented = probe.present_count();

    probe.push_event(DisplayEvent::Expose);
    assert!(frame.window().sync());
    assert_eq!(probe.present_count(), presented + 1);
    Ok(())
}

#[test]
fn save_to_writes_a_decodable_png() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("oval.png");

    let probe = HeadlessProbe::new();
    let mut session = headless_session(&probe);
    let frame = session.create_default()?;
    {
        let mut g = frame.graphics();
        g.set_color(Color::BLUE);
        g.fill_oval(10.0, 60.0, 30.0, 30.0);
    }

    assert!(frame.save_to(&path));
    let decoded = encode::load_png_rgba8(&path)?;
    assert_eq!((decoded.width, decoded.height), (600, 400));
    assert_eq!(decoded.pixel(25, 75), Some([0, 0, 255, 255]));
    Ok(())
}

#[test]
fn save_to_unwritable_path_reports_failure() -> Result<()> {
    let probe = HeadlessProbe::new();
    let mut session = headless_session(&probe);
    let frame = session.create("Nowhere", 8, 8)?;
    assert!(!frame.save_to("/nonexistent-dir/for/sure/out.png"));
    Ok(())
}

#[test]
fn save_shortcut_offers_title_and_saves_choice() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let target = dir.path().join("chosen.png");
    let offered = Arc::new(Mutex::new(Vec::new()));

    let probe = HeadlessProbe::new();
    let mut session =
        DrawingSession::with_driver(test_config(), HeadlessDisplayDriver::factory(probe.clone()))
            .with_save_dialog(Box::new(RecordingDialog {
                answer: Some(target.clone()),
                offered: Arc::clone(&offered),
            }));
    let frame = session.create("Sketch", 40, 30)?;
    frame.graphics().fill_rect(0.0, 0.0, 20.0, 30.0);

    probe.push_event(ctrl_s());
    assert_eq!(deliver(frame), 1);
    settle_save(frame);

    assert_eq!(*offered.lock().unwrap(), vec![PathBuf::from("./Sketch.png")]);
    let decoded = encode::load_png_rgba8(&target)?;
    assert_eq!(decoded.pixels, frame.surface().to_rgba8());
    Ok(())
}

#[test]
fn other_keys_do_not_save() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let target = dir.path().join("never.png");

    let probe = HeadlessProbe::new();
    let mut session =
        DrawingSession::with_driver(test_config(), HeadlessDisplayDriver::factory(probe.clone()))
            .with_save_dialog(Box::new(FixedDestination::new(&target)));
    let frame = session.create("Keys", 10, 10)?;

    probe.push_event(DisplayEvent::Key {
        symbol: KeySymbol::Char('s'),
        modifiers: Modifiers::empty(),
        text: Some("s".to_string()),
    });
    probe.push_event(DisplayEvent::Key {
        symbol: KeySymbol::Char('x'),
        modifiers: Modifiers::CONTROL,
        text: None,
    });
    assert_eq!(deliver(frame), 2);
    assert!(!frame.is_saving());
    assert!(!target.exists());
    Ok(())
}

#[test]
fn cancelled_picker_skips_the_save() -> Result<()> {
    let probe = HeadlessProbe::new();
    let mut session = headless_session(&probe);
    let frame = session.create("Cancel", 10, 10)?;
    assert!(!frame.save_interactive());

    probe.push_event(ctrl_s());
    assert_eq!(deliver(frame), 1);
    settle_save(frame);
    assert!(frame.is_open());
    Ok(())
}

#[test]
fn refresh_does_not_wait_for_the_save_dialog() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let target = dir.path().join("later.png");

    let probe = HeadlessProbe::new();
    let mut session =
        DrawingSession::with_driver(test_config(), HeadlessDisplayDriver::factory(probe.clone()))
            .with_save_dialog(Box::new(SlowDialog {
                delay: Duration::from_millis(800),
                answer: target.clone(),
            }));
    let frame = session.create("Slow", 20, 20)?;

    probe.push_event(ctrl_s());
    deliver(frame);
    assert!(frame.is_saving());
    assert!(!target.exists());

    let start = Instant::now();
    frame.graphics().fill_rect(0.0, 0.0, 20.0, 20.0);
    frame.refresh();
    assert!(
        start.elapsed() < Duration::from_millis(400),
        "refresh blocked for {:?}",
        start.elapsed()
    );

    // A second shortcut while the picker is up opens nothing new.
    probe.push_event(ctrl_s());
    deliver(frame);
    assert!(!frame.save_interactive());

    settle_save(frame);
    let decoded = encode::load_png_rgba8(&target)?;
    assert_eq!(decoded.pixels, frame.surface().to_rgba8());
    Ok(())
}

#[test]
fn missing_file_picker_skips_the_save() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let probe = HeadlessProbe::new();
    let mut session =
        DrawingSession::with_driver(test_config(), HeadlessDisplayDriver::factory(probe.clone()))
            .with_save_dialog(Box::new(NativeSaveDialog::with_programs(
                dir.path().join("no-zenity"),
                dir.path().join("no-kdialog"),
            )));
    let frame = session.create("Unsupported", 10, 10)?;

    assert!(!frame.save_interactive());
    probe.push_event(ctrl_s());
    assert_eq!(deliver(frame), 1);
    settle_save(frame);

    assert!(frame.is_open());
    assert!(!Path::new("./Unsupported.png").exists());
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn new_window_shows_the_background_before_any_refresh() -> Result<()> {
    let probe = HeadlessProbe::new();
    let mut config = test_config();
    config.drawing.background = Color::YELLOW;
    let mut session =
        DrawingSession::with_driver(config, HeadlessDisplayDriver::factory(probe.clone()))
            .with_save_dialog(Box::new(FixedDestination::cancelled()));
    let frame = session.create("Fresh", 12, 8)?;
    assert!(frame.window().sync());

    let shown = probe.last_frame().expect("initial frame");
    assert_eq!(&shown.framebuffer[..], frame.surface().data());
    assert_eq!(frame.surface().pixel(3, 3), Some(Color::YELLOW));
    Ok(())
}

#[test]
fn close_is_reported_when_not_exiting() -> Result<()> {
    let probe = HeadlessProbe::new();
    let mut session = headless_session(&probe);
    let frame = session.create("Closable", 10, 10)?;

    probe.push_event(DisplayEvent::CloseRequested);
    deliver(frame);
    assert!(!frame.is_open());

    // Already closed, so this returns at once.
    frame.wait_for_close();
    Ok(())
}

#[test]
fn sleep_paces_and_handles_events() -> Result<()> {
    let probe = HeadlessProbe::new();
    let mut session = headless_session(&probe);
    let frame = session.create("Pacing", 10, 10)?;

    probe.push_event(DisplayEvent::CloseRequested);
    assert!(frame.window().sync());
    let start = std::time::Instant::now();
    assert_eq!(frame.sleep(20), SleepOutcome::Completed);
    assert!(start.elapsed() >= Duration::from_millis(20));
    assert!(!frame.is_open());
    Ok(())
}

#[test]
fn configured_headless_backend_needs_no_driver() -> Result<()> {
    let mut config = test_config();
    config.display.backend = DisplayBackend::Headless;
    let mut session = DrawingSession::new(config);
    let frame = session.create("Plain", 30, 20)?;
    assert_eq!((frame.width(), frame.height()), (30, 20));
    Ok(())
}
