use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use aimex_core::Point;
use aimex_report::{ReportError, ReportSummary};
use aimex_session::{Session, SessionConfig, SessionEvent};
use aimex_timing::{FrameLimiter, MonotonicClock};
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::ThreadRng;
use tiny_skia::Pixmap;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalPosition;
use winit::event::{KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowId};

use crate::scene::{SceneRenderer, SceneView};

const TARGET_FPS: u32 = 60;

/// Top-level input mode; every key event is routed through exactly one arm.
pub enum UiMode {
    Running,
    AwaitingFilename { input: String },
    Popup { message: String },
}

enum KeyAction {
    None,
    Exit,
    ResetSession,
    OpenFilenameDialog,
    ConfirmFilename(String),
    CancelDialog,
    DismissPopup,
}

pub struct App {
    base_config: SessionConfig,
    out_dir: PathBuf,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    canvas: Option<Pixmap>,
    scene: Option<SceneRenderer>,
    session: Option<Session<MonotonicClock, ThreadRng>>,
    raw_cursor: Point,
    mode: UiMode,
    limiter: FrameLimiter<MonotonicClock>,
    export_rx: Option<Receiver<Result<ReportSummary, ReportError>>>,
    should_exit: bool,
}

impl App {
    pub fn new(config: SessionConfig, out_dir: PathBuf) -> Self {
        Self {
            base_config: config,
            out_dir,
            window: None,
            pixels: None,
            canvas: None,
            scene: None,
            session: None,
            raw_cursor: Point::new(0.0, 0.0),
            mode: UiMode::Running,
            limiter: FrameLimiter::new(MonotonicClock::new(), TARGET_FPS),
            export_rx: None,
            should_exit: false,
        }
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!("aimex starting on {} ({})", std::env::consts::OS, std::env::consts::ARCH);
        event_loop.run_app(&mut self).map_err(Into::into)
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .context("no monitor available")?;

        let window_attributes = Window::default_attributes()
            .with_title("Aimex")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor))))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let size = window.inner_size();
        info!("display: {}×{}", size.width, size.height);

        // The configuration snapshot is fixed to the actual screen here,
        // validated, and then owned by the session until the next restart.
        let config = self
            .base_config
            .clone()
            .derive_for_screen(size.width, size.height);
        config.validate().context("invalid session configuration")?;

        let center = config.circle_center;
        let session = Session::new(config, MonotonicClock::new(), rand::rng());

        let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface_texture)?);
        self.canvas = Pixmap::new(size.width, size.height);
        self.scene = Some(SceneRenderer::new(size.width, size.height));
        self.session = Some(session);

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);
        self.warp_pointer(center);

        Ok(())
    }

    fn warp_pointer(&mut self, to: Point) {
        self.raw_cursor = to;
        if let Some(window) = &self.window {
            if let Err(e) = window.set_cursor_position(PhysicalPosition::new(to.x, to.y)) {
                warn!("could not warp pointer: {e}");
            }
        }
    }

    fn update(&mut self) {
        self.poll_export();

        if !matches!(self.mode, UiMode::Running) {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let events = session.update(self.raw_cursor);
        for event in events {
            match event {
                SessionEvent::Crossed { .. } => {}
                SessionEvent::TrialStarted { cursor, .. } => self.warp_pointer(cursor),
                SessionEvent::SessionEnded => {
                    info!("session complete: E exports the report, R replays, Esc quits");
                }
            }
        }
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(canvas), Some(scene), Some(session)) = (
            self.pixels.as_mut(),
            self.canvas.as_mut(),
            self.scene.as_mut(),
            self.session.as_ref(),
        ) else {
            return Ok(());
        };

        let view = SceneView {
            phase: session.phase(),
            circle_center: session.config().circle_center,
            orbit_radius: session.config().orbit_radius,
            target_center: session.target().center(),
            target_radius: session.target().radius(),
            ghost_target: session.ghost_target(),
            crossing_point: session.crossing_point(),
            cursor: session.effective_cursor(),
            progress: session.progress(),
            filename_len: match &self.mode {
                UiMode::AwaitingFilename { input } => Some(input.chars().count()),
                _ => None,
            },
            popup: matches!(self.mode, UiMode::Popup { .. }),
        };
        scene.render(canvas, &view);

        pixels.frame_mut().copy_from_slice(canvas.data());
        pixels.render()?;
        Ok(())
    }

    fn handle_key(&mut self, event: KeyEvent, event_loop: &ActiveEventLoop) {
        let code = match event.physical_key {
            PhysicalKey::Code(code) => Some(code),
            _ => None,
        };

        let action = match &mut self.mode {
            UiMode::Running => match code {
                Some(KeyCode::Escape) => KeyAction::Exit,
                Some(KeyCode::KeyR) => KeyAction::ResetSession,
                Some(KeyCode::KeyE) => KeyAction::OpenFilenameDialog,
                _ => KeyAction::None,
            },
            UiMode::AwaitingFilename { input } => match code {
                Some(KeyCode::Enter) | Some(KeyCode::NumpadEnter) => {
                    KeyAction::ConfirmFilename(std::mem::take(input))
                }
                Some(KeyCode::Escape) => KeyAction::CancelDialog,
                Some(KeyCode::Backspace) => {
                    input.pop();
                    KeyAction::None
                }
                _ => {
                    if let Some(text) = &event.text {
                        input.extend(text.chars().filter(|c| !c.is_control()));
                    }
                    KeyAction::None
                }
            },
            UiMode::Popup { message } => {
                debug!("popup acknowledged: {message}");
                KeyAction::DismissPopup
            }
        };

        match action {
            KeyAction::None => {}
            KeyAction::Exit => self.cleanup_and_exit(event_loop),
            KeyAction::ResetSession => {
                if let Some(session) = self.session.as_mut() {
                    session.reset();
                    let center = session.config().circle_center;
                    self.warp_pointer(center);
                }
            }
            KeyAction::OpenFilenameDialog => {
                let ready = self
                    .session
                    .as_ref()
                    .is_some_and(|s| s.phase().is_ended() && !s.store().is_empty());
                if ready {
                    self.mode = UiMode::AwaitingFilename {
                        input: String::new(),
                    };
                    info!("type a report name, Enter to confirm, Esc to cancel");
                }
            }
            KeyAction::ConfirmFilename(name) => self.start_export(name),
            KeyAction::CancelDialog => self.mode = UiMode::Running,
            KeyAction::DismissPopup => {
                // The popup stays up while the export worker is running.
                if self.export_rx.is_none() {
                    self.mode = UiMode::Running;
                }
            }
        }
    }

    fn start_export(&mut self, requested: String) {
        let Some(session) = &self.session else {
            return;
        };
        let records = session.store().snapshot();
        let config = session.config().clone();
        let out_dir = self.out_dir.clone();

        // Report generation is slow for long sessions; keep it off the
        // frame loop and poll the channel once per frame.
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = aimex_report::generate(&records, &config, &out_dir, &requested);
            let _ = tx.send(result);
        });

        self.export_rx = Some(rx);
        self.mode = UiMode::Popup {
            message: "Generating report...".into(),
        };
    }

    fn poll_export(&mut self) {
        let Some(rx) = &self.export_rx else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                Err(ReportError::Draw("export worker disappeared".into()))
            }
        };
        self.export_rx = None;

        let message = match outcome {
            Ok(summary) => {
                info!(
                    "report written: {} pages in {}",
                    summary.pages,
                    summary.directory.display()
                );
                format!("Report ready: {}", summary.directory.display())
            }
            Err(e) => {
                error!("export failed: {e}");
                format!("Export failed: {e}")
            }
        };
        self.mode = UiMode::Popup { message };
    }

    fn handle_resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                error!("failed to resize surface: {e}");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                error!("failed to resize buffer: {e}");
            }
        }
        self.canvas = Pixmap::new(new_size.width, new_size.height);
        if let Some(scene) = &mut self.scene {
            scene.resize(new_size.width, new_size.height);
        }
        // The session keeps the geometry snapshot it started with; a new
        // snapshot is derived at the next restart.
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        // Records survive the quit even when no report was exported.
        if let Some(session) = &self.session {
            if !session.store().is_empty() {
                let path = self.out_dir.join("last-session-records.json");
                let saved = fs::create_dir_all(&self.out_dir)
                    .map_err(aimex_session::StoreError::from)
                    .and_then(|_| session.store().save_json(&path));
                match saved {
                    Ok(()) => info!("trial records saved to {}", path.display()),
                    Err(e) => error!("could not save trial records: {e}"),
                }
            }
        }
        let stats = self.limiter.stats();
        info!(
            "frame loop: {:.1} fps effective, {:.2} ms jitter",
            stats.effective_fps,
            stats.jitter_ns / 1e6
        );
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!("failed to create window and surface: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                self.update();
                if let Err(e) = self.render() {
                    error!("render failed: {e}");
                }
                self.limiter.wait();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.raw_cursor = Point::new(position.x, position.y);
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                self.handle_key(event, event_loop);
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}
