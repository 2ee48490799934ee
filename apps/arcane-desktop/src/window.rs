//! winit window driven from the application loop thread.
//!
//! The event loop is created on the loop thread and pumped without blocking
//! once per frame, so the loop keeps ownership of timing.

use arcane_common::AppSettings;
use arcane_gfx::{GfxError, GraphicsBackend};
use arcane_input::InputSnapshot;
use arcane_render_wgpu::WgpuBackend;
use arcane_runtime::{Window, WindowError, WindowFactory};
use std::sync::Arc;
use std::time::Duration;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{WindowAttributes, WindowId};

/// Pumps allowed for the platform to deliver `resumed`.
const STARTUP_PUMPS: usize = 16;

/// Collects events between pumps.
struct Shell {
    attributes: WindowAttributes,
    window: Option<Arc<winit::window::Window>>,
    error: Option<String>,
    pending: Vec<WindowEvent>,
}

impl ApplicationHandler for Shell {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);
        if self.window.is_some() {
            return;
        }
        match event_loop.create_window(self.attributes.clone()) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.pending.push(event);
    }
}

pub struct WinitWindow {
    // Declared first so the surface is released before the window.
    backend: WgpuBackend,
    window: Arc<winit::window::Window>,
    shell: Shell,
    event_loop: EventLoop<()>,
    closed: bool,
}

impl WinitWindow {
    fn pump(&mut self) {
        if let PumpStatus::Exit(code) = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.shell)
        {
            tracing::info!(code, "event loop exited");
            self.closed = true;
        }
    }
}

impl Window for WinitWindow {
    fn show(&mut self) {
        self.window.set_visible(true);
    }

    fn poll_events(&mut self, input: &InputSnapshot) {
        self.pump();
        for event in std::mem::take(&mut self.shell.pending) {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    tracing::info!("window close requested");
                    self.closed = true;
                }
                WindowEvent::Resized(size) => self.backend.resize(size.width, size.height),
                other => {
                    input.handle_window_event(&other);
                }
            }
        }
    }

    fn should_close(&self) -> bool {
        self.closed
    }

    fn graphics(&mut self) -> &mut dyn GraphicsBackend {
        &mut self.backend
    }

    fn present(&mut self) -> Result<(), GfxError> {
        self.backend.end_frame()
    }

    fn destroy(self: Box<Self>) {
        tracing::info!(title = %self.window.title(), "destroying window");
        let WinitWindow {
            backend,
            window,
            shell,
            event_loop,
            ..
        } = *self;
        drop(backend);
        drop(shell);
        drop(window);
        drop(event_loop);
    }
}

/// Opens a [`WinitWindow`] with a [`WgpuBackend`] on the calling thread.
#[derive(Debug, Default)]
pub struct WinitWindowFactory;

impl WinitWindowFactory {
    pub fn new() -> Self {
        Self
    }
}

impl WindowFactory for WinitWindowFactory {
    fn create(&mut self, settings: &AppSettings) -> Result<Box<dyn Window>, WindowError> {
        settings.validate()?;
        let mut event_loop = build_event_loop()?;

        let mut shell = Shell {
            attributes: attributes(settings),
            window: None,
            error: None,
            pending: Vec::new(),
        };
        for _ in 0..STARTUP_PUMPS {
            if shell.window.is_some() || shell.error.is_some() {
                break;
            }
            if let PumpStatus::Exit(code) =
                event_loop.pump_app_events(Some(Duration::ZERO), &mut shell)
            {
                return Err(WindowError::Create(format!(
                    "event loop exited during startup with code {code}"
                )));
            }
        }
        if let Some(err) = shell.error.take() {
            return Err(WindowError::Create(err));
        }
        let window = shell
            .window
            .clone()
            .ok_or_else(|| WindowError::Create("platform never resumed the event loop".into()))?;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| WindowError::Create(e.to_string()))?;
        let size = window.inner_size();
        let backend = WgpuBackend::new(&instance, surface, size.width, size.height, settings.vsync)?;

        tracing::info!(
            title = %settings.name,
            width = size.width,
            height = size.height,
            "window created"
        );
        Ok(Box::new(WinitWindow {
            backend,
            window,
            shell,
            event_loop,
            closed: false,
        }))
    }
}

fn attributes(settings: &AppSettings) -> WindowAttributes {
    winit::window::Window::default_attributes()
        .with_title(settings.name.clone())
        .with_inner_size(PhysicalSize::new(settings.width, settings.height))
        .with_resizable(settings.resizable)
        .with_visible(false)
}

#[cfg(target_os = "linux")]
fn build_event_loop() -> Result<EventLoop<()>, WindowError> {
    use winit::platform::wayland::EventLoopBuilderExtWayland;
    use winit::platform::x11::EventLoopBuilderExtX11;

    let mut builder = EventLoop::builder();
    EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
    EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
    builder.build().map_err(|e| WindowError::Create(e.to_string()))
}

#[cfg(target_os = "windows")]
fn build_event_loop() -> Result<EventLoop<()>, WindowError> {
    use winit::platform::windows::EventLoopBuilderExtWindows;

    EventLoop::builder()
        .with_any_thread(true)
        .build()
        .map_err(|e| WindowError::Create(e.to_string()))
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn build_event_loop() -> Result<EventLoop<()>, WindowError> {
    Err(WindowError::Create(
        "this platform only runs an event loop on the main thread".into(),
    ))
}
