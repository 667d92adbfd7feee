//! # Transform — Position, Rotation, Scale with a Cached Matrix
//!
//! A [`Transform`] stores its three components plus the composite model
//! matrix built from them. Every setter marks the cache dirty; the next call
//! to [`matrix`](Transform::matrix) rebuilds it once and clears the flag, so
//! any number of reads between writes cost one rebuild.
//!
//! ```text
//! set_position ─┐
//! rotate ───────┼─► dirty = true ──► matrix() ──► rebuild, dirty = false
//! set_scale ────┘                    matrix() ──► cached
//! ```
//!
//! ## Conventions
//!
//! - **Composition**: points are scaled, then rotated, then translated. With
//!   glam's column vectors that is `T · R · S`, so
//!   `p' = position + rotation * (scale * p)`.
//! - **Rotation deltas** compose in world space: `rotate(d)` sets
//!   `rotation = normalize(d * rotation)`.
//! - **Euler angles** are degrees in `(pitch, yaw, roll)` order, converted
//!   with [`EULER_ORDER`](super::EULER_ORDER).
//! - **Forward** is `-Z`, **right** is `+X`, **up** is `+Y`.
//!
//! Because reading the cache needs `&mut self`, a transform shared between
//! threads must be wrapped by the caller; the borrow checker enforces it.

use glam::{Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::EULER_ORDER;
use crate::error::TransformError;

/// A 3D transform with a lazily rebuilt model matrix.
///
/// Serializes as `{ "position": {x,y,z}, "rotation": {x,y,z,w}, "scale":
/// {x,y,z} }`. The cache is never written out; a deserialized transform
/// starts dirty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transform {
    #[serde(with = "super::serde_fields::vec3")]
    position: Vec3,
    #[serde(with = "super::serde_fields::quat")]
    rotation: Quat,
    #[serde(with = "super::serde_fields::vec3")]
    scale: Vec3,
    #[serde(skip)]
    cached: Mat4,
    #[serde(skip, default = "starts_dirty")]
    dirty: bool,
}

fn starts_dirty() -> bool {
    true
}

impl Transform {
    /// Origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
        cached: Mat4::IDENTITY,
        dirty: false,
    };

    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::from_position(Vec3::new(x, y, z))
    }

    pub fn from_position(position: Vec3) -> Self {
        let mut t = Self::IDENTITY;
        t.set_position(position);
        t
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.set_rotation(rotation);
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.set_scale(scale);
        self
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.set_uniform_scale(scale);
        self
    }

    /// Orient so [`forward`](Self::forward) points at `target`.
    ///
    /// Leaves the rotation unchanged if `target` coincides with the position
    /// or the view direction is parallel to `up`.
    pub fn looking_at(mut self, target: Vec3, up: Vec3) -> Self {
        let back = (self.position - target).normalize_or_zero();
        let right = up.cross(back).normalize_or_zero();
        if back == Vec3::ZERO || right == Vec3::ZERO {
            return self;
        }
        let up = back.cross(right);
        self.set_rotation(Quat::from_mat3(&Mat3::from_cols(right, up, back)));
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Current rotation as `(pitch, yaw, roll)` degrees.
    pub fn rotation_euler(&self) -> Vec3 {
        let (yaw, pitch, roll) = self.rotation.to_euler(EULER_ORDER);
        Vec3::new(pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // ── Mutators ─────────────────────────────────────────────────────

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.dirty = true;
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
        self.dirty = true;
    }

    /// Set the absolute orientation. The quaternion is normalized.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
        self.dirty = true;
    }

    /// Set the orientation from `(pitch, yaw, roll)` degrees.
    pub fn set_rotation_euler(&mut self, degrees: Vec3) {
        self.set_rotation(Quat::from_euler(
            EULER_ORDER,
            degrees.y.to_radians(),
            degrees.x.to_radians(),
            degrees.z.to_radians(),
        ));
    }

    /// Apply `delta` on top of the current orientation, in world space.
    pub fn rotate(&mut self, delta: Quat) {
        self.rotation = (delta * self.rotation).normalize();
        self.dirty = true;
    }

    /// Rotate `degrees` about `axis` (normalized here), in world space.
    pub fn rotate_axis_angle(&mut self, degrees: f32, axis: Vec3) {
        self.rotate(Quat::from_axis_angle(axis.normalize(), degrees.to_radians()));
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.dirty = true;
    }

    pub fn set_uniform_scale(&mut self, scale: f32) {
        self.set_scale(Vec3::splat(scale));
    }

    // ── Matrices ─────────────────────────────────────────────────────

    /// The model matrix, rebuilt first if any setter ran since the last read.
    pub fn matrix(&mut self) -> Mat4 {
        if self.dirty {
            self.cached = self.compute_matrix();
            self.dirty = false;
        }
        self.cached
    }

    /// Build the model matrix from scratch. Leaves the cache alone.
    pub fn compute_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Inverse of [`matrix`](Self::matrix), or [`TransformError::Singular`]
    /// when some scale axis is zero.
    pub fn try_inverse_matrix(&mut self) -> Result<Mat4, TransformError> {
        let m = self.matrix();
        // Rotation is unit length, so only a collapsed scale axis (or one so
        // small the inverse overflows) makes the matrix singular.
        let inverse = m.inverse();
        if self.scale.cmpeq(Vec3::ZERO).any() || !inverse.is_finite() {
            return Err(TransformError::Singular {
                determinant: m.determinant(),
            });
        }
        Ok(inverse)
    }

    /// Inverse of [`matrix`](Self::matrix). Never cached.
    ///
    /// A singular matrix is a caller bug: debug builds assert, release builds
    /// return the identity.
    pub fn inverse_matrix(&mut self) -> Mat4 {
        match self.try_inverse_matrix() {
            Ok(inverse) => inverse,
            Err(err) => {
                debug_assert!(false, "{err}");
                Mat4::IDENTITY
            }
        }
    }

    // ── Direction vectors ────────────────────────────────────────────

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Two transforms are equal when their components are; cache state is ignored.
impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
            && self.rotation == other.rotation
            && self.scale == other.scale
    }
}
