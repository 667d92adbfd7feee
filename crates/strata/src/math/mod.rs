//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. [`Transform`] holds position, rotation and scale
//! with a lazily cached model matrix; [`Color`] is the linear RGBA color used
//! for clear colors and materials.

pub mod serde_fields;
pub mod transform;

pub use glam::{EulerRot, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

pub use transform::Transform;

/// Axis order used by every Euler-angle conversion in the crate: yaw about
/// Y, then pitch about X, then roll about Z. Angles are in degrees and laid
/// out in a `Vec3` as `(pitch, yaw, roll)`.
pub const EULER_ORDER: EulerRot = EulerRot::YXZ;

/// Linear RGBA color. Serializes as `{ "r", "g", "b", "a" }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    /// The default clear color: a dark blue.
    pub const MIDNIGHT: Self = Self::rgb(0.1, 0.1, 0.15);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build from 8-bit sRGB-style channel values, mapped linearly to 0..1.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        let c = |v: u8| f32::from(v) / 255.0;
        Self::rgba(c(r), c(g), c(b), c(a))
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 4]> for Color {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self::rgba(r, g, b, a)
    }
}

impl From<Color> for Vec4 {
    fn from(c: Color) -> Self {
        Vec4::from_array(c.to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_serializes_with_named_channels() {
        let json = serde_json::to_string(&Color::rgba(0.5, 0.25, 1.0, 0.75)).unwrap();
        assert_eq!(json, r#"{"r":0.5,"g":0.25,"b":1.0,"a":0.75}"#);
    }

    #[test]
    fn color_alpha_defaults_to_opaque() {
        let c: Color = serde_json::from_str(r#"{"r":1.0,"g":0.0,"b":0.0}"#).unwrap();
        assert_eq!(c, Color::RED);
    }

    #[test]
    fn from_rgba8_maps_full_range() {
        assert_eq!(Color::from_rgba8(255, 0, 255, 255), Color::rgb(1.0, 0.0, 1.0));
        assert_eq!(Color::from_rgba8(0, 0, 0, 0), Color::TRANSPARENT);
    }
}
