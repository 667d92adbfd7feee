//! # Application — The Frame Loop
//!
//! [`Application`] owns the [`LayerStack`], the shared [`Assets`], frame
//! [`Time`] and the log channels, and drives a [`Window`] one frame at a
//! time:
//!
//! ```text
//! run(window)
//!   loop
//!     window.poll_events()
//!     stop if close requested or a layer called request_exit()
//!     run_frame(window)
//!       1. time.update(), upload changed meshes/materials
//!       2. window.clear(clear_color)
//!       3. update phase   for layer in stack: layer.on_update(FrameContext)
//!       4. render phase   ui.begin_pass()
//!                         for layer in stack: layer.on_ui(UiContext)
//!                         ui.end_pass()
//!                         window.present()
//!   shutdown(): detach layers back to front
//! ```
//!
//! ## Failure handling
//!
//! A layer hook returning `Err` is logged on the engine channel with the
//! layer's name, counted in [`FrameStats`], and skipped; later layers and
//! later frames run normally. A lost surface skips the rest of the frame.
//! Any other backend error ends [`run`](Application::run) with
//! [`AppError::Backend`]. Panics are not caught.
//!
//! ## Example
//!
//! ```ignore
//! let mut app = Application::new(AppConfig::default());
//! app.push_layer(GameLayer::new())?;
//! app.push_overlay(StatsOverlay::default())?;
//! app.run(&mut HeadlessWindow::default().close_after(60))?;
//! ```

mod layer;

use glam::Mat4;

use crate::backend::{RenderTarget, UiBackend, Window};
use crate::config::AppConfig;
use crate::error::{AppError, BackendError};
use crate::logging::Logs;
use crate::mesh::{Assets, MaterialHandle, MeshHandle};
use crate::time::Time;

pub use layer::{Layer, LayerId, LayerStack};

// ── Contexts ─────────────────────────────────────────────────────────────

/// Handed to [`Layer::on_attach`].
pub struct AttachContext<'a> {
    pub assets: &'a mut Assets,
    pub config: &'a AppConfig,
    pub logs: Logs,
}

/// Handed to [`Layer::on_update`]. Draw calls go straight to the window, so
/// a scene is drawn with `scene.render(ctx)`.
pub struct FrameContext<'a> {
    window: &'a mut dyn Window,
    pub time: &'a Time,
    pub assets: &'a mut Assets,
    pub logs: Logs,
    exit: &'a mut bool,
    draws: usize,
}

impl FrameContext<'_> {
    /// Stop the application at the next frame boundary. The current frame
    /// still completes.
    pub fn request_exit(&mut self) {
        *self.exit = true;
    }

    pub fn exit_requested(&self) -> bool {
        *self.exit
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.window.surface_size()
    }

    /// Draw calls issued so far this frame.
    pub fn draw_calls(&self) -> usize {
        self.draws
    }
}

impl RenderTarget for FrameContext<'_> {
    fn draw(&mut self, mesh: MeshHandle, material: MaterialHandle, transform: &Mat4) {
        self.window.draw(mesh, material, transform);
        self.draws += 1;
    }
}

/// Handed to [`Layer::on_ui`], inside the frame's UI pass.
pub struct UiContext<'a> {
    ui: &'a mut dyn UiBackend,
    pub time: &'a Time,
    pub assets: &'a Assets,
    /// Stats of the previous frame.
    pub stats: &'a FrameStats,
    pub logs: Logs,
    exit: &'a mut bool,
}

impl UiContext<'_> {
    pub fn ui(&mut self) -> &mut dyn UiBackend {
        &mut *self.ui
    }

    /// The concrete UI backend, if it is a `T`.
    pub fn backend<T: UiBackend>(&mut self) -> Option<&mut T> {
        self.ui.as_any_mut().downcast_mut::<T>()
    }

    pub fn request_exit(&mut self) {
        *self.exit = true;
    }
}

// ── Application ──────────────────────────────────────────────────────────

/// What happened during one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub draw_calls: usize,
    pub update_failures: usize,
    pub ui_failures: usize,
    /// The backend lost its surface and the frame was dropped.
    pub skipped: bool,
}

pub struct Application {
    config: AppConfig,
    logs: Logs,
    layers: LayerStack,
    assets: Assets,
    time: Time,
    exit_requested: bool,
    stats: FrameStats,
    /// Stats of the frame in progress, published to `stats` when it ends.
    current: FrameStats,
}

impl Application {
    /// Create an application with wall-clock timing. Channels are named from
    /// `config.log`; install a sink with [`logging::init`](crate::logging::init).
    pub fn new(config: AppConfig) -> Self {
        Self {
            logs: Logs::from_config(&config.log),
            config,
            layers: LayerStack::new(),
            assets: Assets::new(),
            time: Time::new(),
            exit_requested: false,
            stats: FrameStats::default(),
            current: FrameStats::default(),
        }
    }

    pub fn with_logs(mut self, logs: Logs) -> Self {
        self.logs = logs;
        self
    }

    /// Replace the clock, e.g. with [`Time::fixed`] for reproducible runs.
    pub fn with_time(mut self, time: Time) -> Self {
        self.time = time;
        self
    }

    // ── Layers ───────────────────────────────────────────────────────

    fn attach(&mut self, layer: &mut dyn Layer) -> Result<(), AppError> {
        let mut ctx = AttachContext {
            assets: &mut self.assets,
            config: &self.config,
            logs: self.logs,
        };
        match layer.on_attach(&mut ctx) {
            Ok(()) => {
                self.logs.engine.debug(format_args!("attached layer `{}`", layer.name()));
                Ok(())
            }
            Err(source) => {
                self.logs
                    .engine
                    .error(format_args!("layer `{}` failed to attach: {source:#}", layer.name()));
                Err(AppError::LayerAttach {
                    layer: layer.name().to_string(),
                    source,
                })
            }
        }
    }

    /// Attach `layer` and insert it after the other normal layers.
    pub fn push_layer<L: Layer>(&mut self, layer: L) -> Result<LayerId, AppError> {
        let mut layer: Box<dyn Layer> = Box::new(layer);
        self.attach(layer.as_mut())?;
        Ok(self.layers.push_layer(layer))
    }

    /// Attach `layer` and append it after every other layer.
    pub fn push_overlay<L: Layer>(&mut self, layer: L) -> Result<LayerId, AppError> {
        let mut layer: Box<dyn Layer> = Box::new(layer);
        self.attach(layer.as_mut())?;
        Ok(self.layers.push_overlay(layer))
    }

    /// Detach and remove a layer.
    pub fn pop_layer(&mut self, id: LayerId) -> Option<Box<dyn Layer>> {
        let layer = self.layers.pop(id)?;
        self.logs.engine.debug(format_args!("detached layer `{}`", layer.name()));
        Some(layer)
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn logs(&self) -> Logs {
        self.logs
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut Assets {
        &mut self.assets
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    /// Stats of the last completed (or skipped) frame.
    pub fn frame_stats(&self) -> FrameStats {
        self.stats
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    // ── Frame loop ───────────────────────────────────────────────────

    /// Run frames until the window closes or a layer requests exit, then
    /// detach every layer.
    pub fn run(&mut self, window: &mut dyn Window) -> Result<(), AppError> {
        let (w, h) = window.surface_size();
        self.logs.engine.info(format_args!(
            "running `{}` ({w}x{h}, {} layers)",
            self.config.title,
            self.layers.len()
        ));

        let result = loop {
            window.poll_events();
            if window.close_requested() || self.exit_requested {
                break Ok(());
            }
            match self.run_frame(window) {
                Ok(()) => {}
                Err(BackendError::SurfaceLost) => {
                    self.logs.engine.warn("surface lost; frame skipped");
                }
                Err(err) => {
                    self.logs.engine.critical(format_args!("backend failure: {err}"));
                    break Err(AppError::Backend(err));
                }
            }
        };

        self.shutdown();
        result
    }

    /// Run exactly one frame. Layer failures are absorbed; backend errors are
    /// returned.
    pub fn run_frame(&mut self, window: &mut dyn Window) -> Result<(), BackendError> {
        self.time.update();
        self.current = FrameStats {
            frame: self.time.frame_count(),
            ..FrameStats::default()
        };

        let result = self.frame_phases(window);
        self.current.skipped = matches!(result, Err(BackendError::SurfaceLost));
        self.stats = self.current;
        result
    }

    fn frame_phases(&mut self, window: &mut dyn Window) -> Result<(), BackendError> {
        self.upload_pending(window)?;
        window.clear(self.config.clear_color)?;

        // Update phase.
        let mut ctx = FrameContext {
            window: &mut *window,
            time: &self.time,
            assets: &mut self.assets,
            logs: self.logs,
            exit: &mut self.exit_requested,
            draws: 0,
        };
        for layer in self.layers.iter_mut() {
            if let Err(err) = layer.on_update(&mut ctx) {
                self.current.update_failures += 1;
                self.logs
                    .engine
                    .error(format_args!("layer `{}` update failed: {err:#}", layer.name()));
            }
        }
        self.current.draw_calls = ctx.draws;

        // Render phase.
        window.ui().begin_pass()?;
        let mut ctx = UiContext {
            ui: window.ui(),
            time: &self.time,
            assets: &self.assets,
            stats: &self.stats,
            logs: self.logs,
            exit: &mut self.exit_requested,
        };
        for layer in self.layers.iter_mut() {
            if let Err(err) = layer.on_ui(&mut ctx) {
                self.current.ui_failures += 1;
                self.logs
                    .engine
                    .error(format_args!("layer `{}` ui failed: {err:#}", layer.name()));
            }
        }
        window.ui().end_pass()?;
        window.present()
    }

    fn upload_pending(&mut self, window: &mut dyn Window) -> Result<(), BackendError> {
        for handle in self.assets.meshes.take_pending() {
            if let Some(data) = self.assets.meshes.get(handle) {
                window.upload_mesh(handle, data)?;
            }
        }
        for handle in self.assets.materials.take_pending() {
            if let Some(material) = self.assets.materials.get(handle) {
                window.upload_material(handle, material)?;
            }
        }
        Ok(())
    }

    /// Detach every layer, back to front.
    pub fn shutdown(&mut self) {
        if self.layers.is_empty() {
            return;
        }
        self.logs
            .engine
            .info(format_args!("shutting down {} layers", self.layers.len()));
        self.layers.detach_all();
    }
}
