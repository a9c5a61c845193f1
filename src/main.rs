use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{CursorGrabMode, Window, WindowAttributes, WindowId},
};

use thirdperson::{
    config::ControllerConfig,
    controller::{input, FrameDriver, InputEvent},
    logging,
    model::assets,
    ui,
    view::{GpuContext, RenderState},
};

/// Everything that only exists once a window does.
struct Session {
    window: Arc<Window>,
    render: RenderState,
    driver: FrameDriver,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    last_frame: Instant,
}

impl Session {
    fn new(window: Arc<Window>) -> Result<Self, thirdperson::view::RenderError> {
        let gpu = pollster::block_on(GpuContext::new_native(window.clone()))?;
        let render = RenderState::new(gpu);
        let (width, height) = render.size();

        let driver = FrameDriver::new(ControllerConfig::default(), assets::load_character(), width, height);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        Ok(Self {
            window,
            render,
            driver,
            egui_ctx,
            egui_state,
            last_frame: Instant::now(),
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.render.resize(width, height);
        self.driver.camera.set_aspect(width, height);
    }

    /// Capture or release the cursor. Locked is unsupported on some
    /// platforms (X11), so fall back to confining it to the window.
    fn set_pointer_lock(&mut self, locked: bool) {
        let granted = if locked {
            self.window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined))
                .is_ok()
        } else {
            let _ = self.window.set_cursor_grab(CursorGrabMode::None);
            false
        };
        self.window.set_cursor_visible(!granted);
        self.driver.handle_event(&InputEvent::PointerLockChanged { locked: granted });
    }

    fn handle_window_event(&mut self, event: &WindowEvent) {
        let captured = self.driver.input.pointer_locked;
        // The overlay only gets input while the cursor is free
        if !captured && self.egui_state.on_window_event(&self.window, event).consumed {
            return;
        }

        let input = match event {
            WindowEvent::KeyboardInput {
                event: KeyEvent { physical_key, state, .. },
                ..
            } => input::native::key_to_input(*physical_key, *state),
            WindowEvent::MouseInput { state, button, .. } => {
                input::native::mouse_button_to_input(*button, *state)
            }
            WindowEvent::Focused(false) => Some(InputEvent::FocusLost),
            WindowEvent::Occluded(occluded) => Some(InputEvent::VisibilityChanged { visible: !occluded }),
            _ => None,
        };

        if let Some(input) = input {
            self.driver.handle_event(&input);
        }
        if let Some(locked) = self.driver.input.take_pointer_lock_request() {
            self.set_pointer_lock(locked);
        }
        // Losing focus drops the grab without telling us
        if matches!(event, WindowEvent::Focused(false)) && self.driver.input.pointer_locked {
            self.set_pointer_lock(false);
        }
    }

    /// Returns false when the session should end.
    fn redraw(&mut self) -> bool {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        if let Err(e) = self.driver.tick(dt) {
            tracing::error!(error = %e, "character failed to load");
            return false;
        }
        self.render.prepare(&self.driver);

        let raw_input = self.egui_state.take_egui_input(&self.window);
        let output = ui::build_ui(&self.egui_ctx, raw_input, &self.driver);
        let (ui_frame, platform_output) = ui::tessellate(&self.egui_ctx, output);
        self.egui_state.handle_platform_output(&self.window, platform_output);

        match self.render.draw_frame(Some(ui_frame)) {
            Ok(()) => true,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.render.gpu.reconfigure();
                true
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("surface out of memory");
                false
            }
            Err(e) => {
                tracing::warn!(error = ?e, "dropped frame");
                true
            }
        }
    }
}

#[derive(Default)]
struct App {
    session: Option<Session>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }
        let attributes = WindowAttributes::default()
            .with_title("Third Person")
            .with_inner_size(winit::dpi::LogicalSize::new(1280.0, 720.0));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!(error = %e, "failed to create window");
                event_loop.exit();
                return;
            }
        };

        match Session::new(window) {
            Ok(session) => {
                session.window.request_redraw();
                self.session = Some(session);
            }
            Err(e) => {
                tracing::error!(error = %e, "GPU init failed");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(session) = &mut self.session else { return };
        if session.window.id() != window_id {
            return;
        }
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => session.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                if !session.redraw() {
                    event_loop.exit();
                }
            }
            other => session.handle_window_event(&other),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(session) = &mut self.session else { return };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            session.driver.handle_event(&InputEvent::MouseMove { dx: dx as f32, dy: dy as f32 });
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(session) = &self.session {
            session.window.request_redraw();
        }
    }
}

fn main() {
    logging::init();
    tracing::info!("starting");

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            tracing::error!(error = %e, "failed to create event loop");
            std::process::exit(1);
        }
    };

    let mut app = App::default();
    if let Err(e) = event_loop.run_app(&mut app) {
        tracing::error!(error = %e, "event loop terminated");
        std::process::exit(1);
    }
}
