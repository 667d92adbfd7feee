//! # Mesh — CPU-Side Geometry, Materials and Handles
//!
//! Scenes never hold geometry directly. A
//! [`MeshRenderer`](crate::scene::MeshRenderer) stores a [`MeshHandle`] and a
//! [`MaterialHandle`], cheap `Copy` indices into the [`MeshLibrary`] and
//! [`MaterialLibrary`] owned by the application's [`Assets`]. The backend
//! receives the data once per change through
//! [`Window::upload_mesh`](crate::backend::Window::upload_mesh) and from then
//! on only sees handles.
//!
//! ```text
//! Assets
//!   meshes:    [Cube{1.0}, Sphere{..}, Custom]  ──► MeshHandle(0..3)
//!   materials: [red, grey]                      ──► MaterialHandle(0..2)
//!   pending uploads drained once per frame by the application
//! ```
//!
//! ## Comparison
//!
//! - **Bevy**: `Handle<Mesh>` into `Assets<Mesh>`, with a render-world
//!   extraction step doing the upload.
//! - **three.js**: geometry objects upload lazily on first render.

mod library;
pub mod shapes;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::math::Color;

pub use library::{Assets, MaterialLibrary, MeshLibrary};
pub use shapes::generate;

/// Per-corner vertex data: 32 bytes, tightly packed for GPU upload.
///
/// ```text
/// ┌──────────────┬──────────────┬──────────────┐
/// │ position     │ normal       │ uv           │
/// │ [f32; 3]     │ [f32; 3]     │ [f32; 2]     │
/// │ offset 0     │ offset 12    │ offset 24    │
/// └──────────────┴──────────────┴──────────────┘
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Indexed triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Parameters for a generated mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrimitiveShape {
    /// Axis-aligned cube with side length `size`.
    Cube { size: f32 },
    /// UV sphere: `rings` latitude bands, `slices` longitude columns.
    Sphere { radius: f32, rings: u32, slices: u32 },
    /// Flat quad on the XZ plane facing +Y.
    Plane { width: f32, length: f32 },
    /// Capped cylinder along Y.
    Cylinder { radius: f32, height: f32, slices: u32 },
}

impl PrimitiveShape {
    pub const UNIT_CUBE: Self = Self::Cube { size: 1.0 };
    pub const UNIT_SPHERE: Self = Self::Sphere {
        radius: 0.5,
        rings: 16,
        slices: 32,
    };
    pub const UNIT_PLANE: Self = Self::Plane {
        width: 1.0,
        length: 1.0,
    };
    pub const UNIT_CYLINDER: Self = Self::Cylinder {
        radius: 0.5,
        height: 1.0,
        slices: 32,
    };
}

/// Where a mesh's data came from. Only primitives can be regenerated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeshSource {
    Primitive(PrimitiveShape),
    Custom,
}

/// Handle to a mesh in a [`MeshLibrary`]. Lightweight and `Copy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(pub(crate) usize);

impl MeshHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to a material in a [`MaterialLibrary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialHandle(pub(crate) usize);

impl MaterialHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Surface appearance. Flat-shaded base color only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Material {
    pub base_color: Color,
}

impl Material {
    pub fn new(base_color: Color) -> Self {
        Self { base_color }
    }
}
