//! # GPU Backend — winit Window, wgpu Renderer
//!
//! [`WinitWindow`] implements [`Window`] on a real OS window. The application
//! owns the frame loop, so instead of handing control to
//! `EventLoop::run_app`, the window pumps pending platform events once per
//! frame with winit's `pump_app_events`:
//!
//! ```text
//! Application::run                WinitWindow
//!   poll_events()        ──►   pump_app_events(0ms, &mut handler)
//!                                 Resized        → surface.configure
//!                                 CloseRequested → close_requested = true
//!                                 other events   → egui (feature `egui`)
//!   upload_* / clear     ──►   Renderer: buffers, draw queue reset
//!   draw(..) × N         ──►   Renderer: queue
//!   ui().begin/end_pass  ──►   EguiOverlay or a bracket-only stub
//!   present()            ──►   Renderer: one scene pass + overlay, submit
//! ```
//!
//! ## Comparison
//!
//! - **winit `run_app`**: the event loop owns control and calls back into
//!   the app on `RedrawRequested`. Simpler, but the frame loop can't be
//!   driven (or tested) from outside.
//! - **Our approach**: pumping keeps [`Application::run`](crate::app::Application::run)
//!   backend-agnostic, so the same loop drives [`HeadlessWindow`](super::HeadlessWindow).

mod context;
#[cfg(feature = "egui")]
mod overlay;
mod pipeline;
mod renderer;

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use glam::Mat4;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window as OsWindow, WindowId};

use super::{RenderTarget, UiBackend, Window};
use crate::config::AppConfig;
use crate::error::BackendError;
use crate::logging::ENGINE_TARGET;
use crate::math::Color;
use crate::mesh::{Material, MaterialHandle, MeshData, MeshHandle};

pub use context::GpuContext;
#[cfg(feature = "egui")]
pub use overlay::EguiOverlay;
pub use renderer::Camera;

use renderer::Renderer;

/// How long [`WinitWindow::new`] waits for the platform to hand out a window.
const OPEN_TIMEOUT: Duration = Duration::from_secs(5);

/// UI backend used when no overlay is compiled in: checks bracketing only.
#[derive(Debug, Default)]
struct PassBrackets {
    in_pass: bool,
}

impl UiBackend for PassBrackets {
    fn begin_pass(&mut self) -> Result<(), BackendError> {
        if std::mem::replace(&mut self.in_pass, true) {
            return Err(BackendError::UiPass("begin_pass called twice"));
        }
        Ok(())
    }

    fn end_pass(&mut self) -> Result<(), BackendError> {
        if !std::mem::replace(&mut self.in_pass, false) {
            return Err(BackendError::UiPass("end_pass without begin_pass"));
        }
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The state winit calls back into while events are pumped.
struct Handler {
    title: String,
    size: (u32, u32),
    vsync: bool,
    window: Option<Arc<OsWindow>>,
    renderer: Option<Renderer>,
    #[cfg(feature = "egui")]
    overlay: Option<EguiOverlay>,
    brackets: PassBrackets,
    close_requested: bool,
    init_error: Option<BackendError>,
}

impl Handler {
    fn open(&mut self, event_loop: &ActiveEventLoop) -> Result<(), BackendError> {
        let attrs = OsWindow::default_attributes()
            .with_title(&self.title)
            .with_inner_size(LogicalSize::new(self.size.0 as f64, self.size.1 as f64));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| BackendError::Init(format!("window: {e}")))?,
        );

        let gpu = GpuContext::new(Arc::clone(&window), self.vsync)?;

        #[cfg(feature = "egui")]
        {
            self.overlay = Some(EguiOverlay::new(&gpu, Arc::clone(&window)));
        }

        self.renderer = Some(Renderer::new(gpu));
        self.window = Some(window);
        Ok(())
    }
}

impl ApplicationHandler for Handler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.init_error.is_some() {
            return;
        }
        if let Err(err) = self.open(event_loop) {
            self.init_error = Some(err);
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "egui")]
        if let Some(overlay) = &mut self.overlay {
            if overlay.on_window_event(&event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!(target: ENGINE_TARGET, "window close requested");
                self.close_requested = true;
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.gpu.resize(size.width, size.height);
                }
            }
            _ => {}
        }
    }
}

/// A winit window rendering through wgpu.
pub struct WinitWindow {
    event_loop: EventLoop<()>,
    handler: Handler,
}

impl WinitWindow {
    /// Open a window titled and sized from `config`, and set up the GPU.
    pub fn new(config: &AppConfig) -> Result<Self, BackendError> {
        let mut event_loop =
            EventLoop::new().map_err(|e| BackendError::Init(format!("event loop: {e}")))?;
        let mut handler = Handler {
            title: config.title.clone(),
            size: (config.width, config.height),
            vsync: config.vsync,
            window: None,
            renderer: None,
            #[cfg(feature = "egui")]
            overlay: None,
            brackets: PassBrackets::default(),
            close_requested: false,
            init_error: None,
        };

        // The window is created from `resumed`, which arrives on the first
        // pumps.
        let started = std::time::Instant::now();
        while handler.renderer.is_none() {
            if let Some(err) = handler.init_error.take() {
                return Err(err);
            }
            if started.elapsed() > OPEN_TIMEOUT {
                return Err(BackendError::Init("platform never resumed the app".into()));
            }
            if let PumpStatus::Exit(code) =
                event_loop.pump_app_events(Some(Duration::from_millis(10)), &mut handler)
            {
                return Err(BackendError::Init(format!(
                    "event loop exited with {code} before the window opened"
                )));
            }
        }

        Ok(Self {
            event_loop,
            handler,
        })
    }

    /// Camera used for every subsequent frame.
    pub fn set_camera(&mut self, camera: Camera) {
        if let Some(renderer) = &mut self.handler.renderer {
            renderer.camera = camera;
        }
    }

    pub fn camera(&self) -> Option<Camera> {
        self.handler.renderer.as_ref().map(|r| r.camera)
    }

    fn renderer(&mut self) -> Result<&mut Renderer, BackendError> {
        self.handler
            .renderer
            .as_mut()
            .ok_or_else(|| BackendError::Surface("window has no renderer".into()))
    }
}

impl RenderTarget for WinitWindow {
    fn draw(&mut self, mesh: MeshHandle, material: MaterialHandle, transform: &Mat4) {
        if let Some(renderer) = &mut self.handler.renderer {
            renderer.queue_draw(mesh, material, *transform);
        }
    }
}

impl Window for WinitWindow {
    fn poll_events(&mut self) {
        if let PumpStatus::Exit(_) = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.handler)
        {
            self.handler.close_requested = true;
        }
    }

    fn close_requested(&self) -> bool {
        self.handler.close_requested
    }

    fn surface_size(&self) -> (u32, u32) {
        self.handler
            .renderer
            .as_ref()
            .map_or((0, 0), |r| r.gpu.surface_size())
    }

    fn clear(&mut self, color: Color) -> Result<(), BackendError> {
        self.renderer()?.begin_frame(color);
        Ok(())
    }

    fn present(&mut self) -> Result<(), BackendError> {
        let handler = &mut self.handler;
        let renderer = handler
            .renderer
            .as_mut()
            .ok_or_else(|| BackendError::Surface("window has no renderer".into()))?;

        #[cfg(feature = "egui")]
        let result = {
            let overlay = &mut handler.overlay;
            renderer.present(|gpu, encoder, view| {
                if let Some(overlay) = overlay {
                    overlay.paint(gpu, encoder, view);
                }
            })
        };
        #[cfg(not(feature = "egui"))]
        let result = renderer.present(|_, _, _| {});

        if let Some(window) = &handler.window {
            window.request_redraw();
        }
        result
    }

    fn ui(&mut self) -> &mut dyn UiBackend {
        #[cfg(feature = "egui")]
        if let Some(overlay) = &mut self.handler.overlay {
            return overlay;
        }
        &mut self.handler.brackets
    }

    fn upload_mesh(&mut self, handle: MeshHandle, data: &MeshData) -> Result<(), BackendError> {
        self.renderer()?.upload_mesh(handle, data);
        Ok(())
    }

    fn upload_material(
        &mut self,
        handle: MaterialHandle,
        material: &Material,
    ) -> Result<(), BackendError> {
        self.renderer()?.upload_material(handle, material.base_color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brackets_reject_unbalanced_passes() {
        let mut ui = PassBrackets::default();
        assert_eq!(
            ui.end_pass(),
            Err(BackendError::UiPass("end_pass without begin_pass"))
        );
        ui.begin_pass().unwrap();
        assert!(ui.begin_pass().is_err());
        ui.end_pass().unwrap();
        ui.begin_pass().unwrap();
    }
}
