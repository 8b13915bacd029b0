//! Window management via winit.
//!
//! Implements [`winit::application::ApplicationHandler`] to drive the event
//! loop. Window events are translated into [`InputEvent`]s and queued on the
//! [`Viewer`]; nothing here touches game state directly. Each redraw runs one
//! viewer frame and requests the next.
//!
//! Camera drags hide and grab the cursor. Platforms that only support
//! [`CursorGrabMode::Locked`] stop reporting cursor positions while locked, so
//! in that mode the drag is fed from raw device motion instead.

use std::sync::Arc;

use glam::UVec2;
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::asset::FsDecoder;
use crate::board::ChessBoard;
use crate::config::ViewerConfig;
use crate::controller::CursorMode;
use crate::error::StartupError;
use crate::input::InputEvent;
use crate::render::WgpuBackend;
use crate::time::Time;
use crate::viewer::Viewer;

/// Pixel-precise scroll deltas (touchpads) are converted to lines at this rate.
const PIXELS_PER_LINE: f64 = 20.0;

const QUIT_KEY: KeyCode = KeyCode::Escape;

/// Open the window and run the viewer until it is closed.
pub fn run(config: ViewerConfig) -> Result<(), StartupError> {
    let board = match &config.start_fen {
        Some(fen) => ChessBoard::from_fen(fen)?,
        None => ChessBoard::new(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = WinitApp::new(config, board);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// The application state that winit drives.
struct WinitApp {
    config: ViewerConfig,
    /// Moved into the viewer once the window exists.
    board: Option<ChessBoard>,
    time: Time,
    window: Option<Arc<Window>>,
    viewer: Option<Viewer<WgpuBackend, ChessBoard>>,
    /// Cursor mode currently applied to the OS cursor.
    applied_cursor: CursorMode,
    /// The grab fell back to a locked cursor: drags come from device motion.
    raw_motion: bool,
    error: Option<StartupError>,
}

impl WinitApp {
    fn new(config: ViewerConfig, board: ChessBoard) -> Self {
        let time = Time::new(config.animation.max_frame_delta);
        Self {
            config,
            board: Some(board),
            time,
            window: None,
            viewer: None,
            applied_cursor: CursorMode::Normal,
            raw_motion: false,
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), StartupError> {
        let attrs = Window::default_attributes()
            .with_title(&self.config.window.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width as f64,
                self.config.window.height as f64,
            ));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let backend = WgpuBackend::new(window.clone())?;
        let viewport = backend.surface_size();

        let board = self.board.take().unwrap_or_default();
        let mut viewer = Viewer::new(
            self.config.clone(),
            backend,
            board,
            Box::new(FsDecoder),
            viewport,
        );
        viewer.initialize()?;
        log::info!("Viewer ready at {}x{}", viewport.x, viewport.y);

        window.request_redraw();
        self.window = Some(window);
        self.viewer = Some(viewer);
        Ok(())
    }

    /// Mirror the controller's cursor mode onto the OS cursor.
    fn apply_cursor_mode(&mut self) {
        let (Some(window), Some(viewer)) = (&self.window, &self.viewer) else {
            return;
        };
        let mode = viewer.cursor_mode();
        if mode == self.applied_cursor {
            return;
        }
        match mode {
            CursorMode::Normal => {
                window.set_cursor_visible(true);
                if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
                    log::warn!("Failed to release cursor: {e}");
                }
                self.raw_motion = false;
            }
            CursorMode::Disabled => {
                window.set_cursor_visible(false);
                if window.set_cursor_grab(CursorGrabMode::Confined).is_ok() {
                    self.raw_motion = false;
                } else {
                    match window.set_cursor_grab(CursorGrabMode::Locked) {
                        Ok(()) => {
                            log::debug!("Cursor locked, orbiting from device motion");
                            self.raw_motion = true;
                        }
                        Err(e) => log::warn!("Failed to grab cursor: {e}"),
                    }
                }
            }
        }
        self.applied_cursor = mode;
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.time.update();
        let Some(viewer) = &mut self.viewer else {
            return;
        };

        match viewer.run_frame(self.time.delta_secs()) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = viewer.viewport();
                viewer.on_resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory!");
                event_loop.exit();
            }
            Err(e) => {
                log::warn!("Surface error: {e:?}");
            }
        }

        self.apply_cursor_mode();
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for WinitApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.error.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            self.error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Window close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput { event, .. }
                if event.physical_key == PhysicalKey::Code(QUIT_KEY)
                    && event.state == ElementState::Pressed =>
            {
                log::info!("Escape pressed, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.on_resize(UVec2::new(size.width, size.height));
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            // Positions stall or jump while locked; device motion drives the drag.
            WindowEvent::CursorMoved { .. } if self.raw_motion => {}

            other => {
                if let (Some(viewer), Some(input)) = (&mut self.viewer, translate(&other)) {
                    viewer.push_event(input);
                }
            }
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if !self.raw_motion {
            return;
        }
        if let (Some(viewer), Some(input)) = (&mut self.viewer, raw_motion(&event)) {
            viewer.push_event(input);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("Exiting after {} frames", self.time.frame_count());
        // Release GPU resources while the window (and its surface) still exist.
        self.viewer = None;
    }
}

/// Window event to viewer input, or `None` for events the viewer ignores.
fn translate(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::CursorMoved {
            x: position.x as f32,
            y: position.y as f32,
        }),
        WindowEvent::MouseInput { button, state, .. } => Some(InputEvent::MouseButton {
            button: *button,
            pressed: state.is_pressed(),
        }),
        WindowEvent::MouseWheel { delta, .. } => Some(InputEvent::Scroll {
            delta: scroll_lines(*delta),
        }),
        WindowEvent::KeyboardInput { event, .. } if !event.repeat => match event.physical_key {
            PhysicalKey::Code(code) => Some(InputEvent::Key {
                code,
                pressed: event.state.is_pressed(),
            }),
            PhysicalKey::Unidentified(_) => None,
        },
        _ => None,
    }
}

fn raw_motion(event: &DeviceEvent) -> Option<InputEvent> {
    match event {
        DeviceEvent::MouseMotion { delta: (dx, dy) } => Some(InputEvent::MouseMotion {
            dx: *dx as f32,
            dy: *dy as f32,
        }),
        _ => None,
    }
}

fn scroll_lines(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(position) => (position.y / PIXELS_PER_LINE) as f32,
    }
}
