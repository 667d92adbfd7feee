//! egui overlay, painted after the scene pass.
//!
//! [`EguiOverlay`] is the window's [`UiBackend`] when the `egui` feature is
//! on. Layers reach it from [`UiContext`](crate::app::UiContext):
//!
//! ```ignore
//! fn on_ui(&mut self, ctx: &mut UiContext<'_>) -> anyhow::Result<()> {
//!     if let Some(overlay) = ctx.backend::<EguiOverlay>() {
//!         egui::Window::new("stats").show(overlay.context(), |ui| {
//!             ui.label(format!("{:.0} fps", ctx.time.smoothed_fps()));
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use std::any::Any;
use std::sync::Arc;

use super::context::GpuContext;
use crate::backend::UiBackend;
use crate::error::BackendError;

pub struct EguiOverlay {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    window: Arc<winit::window::Window>,
    in_pass: bool,
    paint_jobs: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
    frame_ready: bool,
}

impl EguiOverlay {
    pub(crate) fn new(gpu: &GpuContext, window: Arc<winit::window::Window>) -> Self {
        let ctx = egui::Context::default();

        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window.as_ref(),
            Some(window.scale_factor() as f32),
            None,
            Some(gpu.device.limits().max_texture_dimension_2d as usize),
        );

        let renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.surface_format(),
            egui_wgpu::RendererOptions::default(),
        );

        Self {
            ctx,
            state,
            renderer,
            window,
            in_pass: false,
            paint_jobs: Vec::new(),
            textures_delta: egui::TexturesDelta::default(),
            frame_ready: false,
        }
    }

    /// The egui context. Only build UI with it between `begin_pass` and
    /// `end_pass`, i.e. from a layer's `on_ui`.
    pub fn context(&self) -> &egui::Context {
        &self.ctx
    }

    /// Forward a winit event. Returns `true` if egui consumed it.
    pub(crate) fn on_window_event(&mut self, event: &winit::event::WindowEvent) -> bool {
        self.state.on_window_event(&self.window, event).consumed
    }

    /// Record the tessellated overlay into `encoder`, on top of `view`.
    pub(crate) fn paint(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) {
        if !self.frame_ready {
            return;
        }
        self.frame_ready = false;

        let (sw, sh) = gpu.surface_size();
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [sw, sh],
            pixels_per_point: self.ctx.pixels_per_point(),
        };

        for (id, delta) in &self.textures_delta.set {
            self.renderer
                .update_texture(&gpu.device, &gpu.queue, *id, delta);
        }

        let extra = self.renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            encoder,
            &self.paint_jobs,
            &screen,
        );
        if !extra.is_empty() {
            gpu.queue.submit(extra);
        }

        {
            let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui overlay"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.renderer
                .render(&mut pass.forget_lifetime(), &self.paint_jobs, &screen);
        }

        for id in &self.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

impl UiBackend for EguiOverlay {
    fn begin_pass(&mut self) -> Result<(), BackendError> {
        if self.in_pass {
            return Err(BackendError::UiPass("begin_pass called twice"));
        }
        let input = self.state.take_egui_input(&self.window);
        self.ctx.begin_pass(input);
        self.in_pass = true;
        Ok(())
    }

    fn end_pass(&mut self) -> Result<(), BackendError> {
        if !self.in_pass {
            return Err(BackendError::UiPass("end_pass without begin_pass"));
        }
        self.in_pass = false;

        let output = self.ctx.end_pass();
        self.state
            .handle_platform_output(&self.window, output.platform_output);
        self.paint_jobs = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        self.textures_delta = output.textures_delta;
        self.frame_ready = true;
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
