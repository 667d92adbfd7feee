//! # Backend — The Seams to Window, GPU and UI
//!
//! The core never talks to a graphics API directly. Three traits describe
//! everything the frame loop needs:
//!
//! ```text
//! RenderTarget   draw(mesh, material, &model)       ← Scene::render
//!     ▲
//! Window         poll_events / clear / present      ← Application::run
//!                upload_mesh / upload_material
//!                ui() ──► UiBackend                 begin_pass / end_pass
//! ```
//!
//! Two implementations ship with the crate:
//!
//! - [`headless::HeadlessWindow`]: records every call as a [`BackendEvent`].
//!   No GPU needed; used by tests and `--headless` runs.
//! - `gpu::WinitWindow` (feature `window`): a winit window with a wgpu
//!   flat-shaded mesh renderer, plus an egui overlay under feature `egui`.

use std::any::Any;

use glam::Mat4;

use crate::error::BackendError;
use crate::math::Color;
use crate::mesh::{Material, MaterialHandle, MeshData, MeshHandle};

#[cfg(feature = "window")]
pub mod gpu;
pub mod headless;

pub use headless::{HeadlessUi, HeadlessWindow};

/// Anything that accepts mesh draw calls.
pub trait RenderTarget {
    fn draw(&mut self, mesh: MeshHandle, material: MaterialHandle, transform: &Mat4);
}

/// Bracket for one immediate-mode UI pass per frame.
pub trait UiBackend: Any {
    fn begin_pass(&mut self) -> Result<(), BackendError>;

    fn end_pass(&mut self) -> Result<(), BackendError>;

    /// Reach the concrete backend, e.g. to get at an egui context.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn UiBackend {
    /// Downcast to a concrete UI backend.
    pub fn downcast_mut<T: UiBackend>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// A presentation surface driven once per frame by the application.
pub trait Window: RenderTarget {
    /// Pump platform events. Called once at the top of every frame.
    fn poll_events(&mut self);

    /// `true` once the user (or platform) asked to close.
    fn close_requested(&self) -> bool;

    /// Drawable size in physical pixels.
    fn surface_size(&self) -> (u32, u32);

    /// Start a frame by clearing to `color`.
    fn clear(&mut self, color: Color) -> Result<(), BackendError>;

    /// Finish the frame and show it. May block on vsync.
    fn present(&mut self) -> Result<(), BackendError>;

    fn ui(&mut self) -> &mut dyn UiBackend;

    /// Make `data` available under `handle`, replacing earlier data.
    fn upload_mesh(&mut self, handle: MeshHandle, data: &MeshData) -> Result<(), BackendError>;

    fn upload_material(
        &mut self,
        handle: MaterialHandle,
        material: &Material,
    ) -> Result<(), BackendError>;
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    Clear(Color),
    Draw {
        mesh: MeshHandle,
        material: MaterialHandle,
        transform: Mat4,
    },
    UploadMesh {
        mesh: MeshHandle,
        vertices: usize,
        indices: usize,
    },
    UploadMaterial {
        material: MaterialHandle,
        base_color: Color,
    },
    BeginUi,
    EndUi,
    Present,
}
