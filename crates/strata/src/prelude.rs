//! Convenience re-exports: `use strata::prelude::*` for the common items.

// Core
pub use crate::app::{
    Application, AttachContext, FrameContext, FrameStats, Layer, LayerId, LayerStack, UiContext,
};
pub use crate::config::AppConfig;
pub use crate::ecs::{Component, EntityId};
pub use crate::error::{AppError, BackendError, SceneError, TransformError};
pub use crate::logging::{Channel, LogConfig, Logs};
pub use crate::math::{Color, Mat3, Mat4, Quat, Transform, Vec2, Vec3, Vec4};
pub use crate::scene::{Entity, EntityMut, MeshRenderer, Name, Scene};
pub use crate::time::Time;

// Meshes
pub use crate::mesh::{
    Assets, Material, MaterialHandle, MeshData, MeshHandle, MeshSource, MeshVertex,
    PrimitiveShape,
};

// Backends
pub use crate::backend::{HeadlessWindow, RenderTarget, UiBackend, Window};
#[cfg(feature = "window")]
pub use crate::backend::gpu::WinitWindow;
#[cfg(feature = "egui")]
pub use crate::backend::gpu::EguiOverlay;
