//! # Shapes — Parametric Primitive Meshes
//!
//! [`generate`] turns a [`PrimitiveShape`] into CPU-side [`MeshData`]. All
//! shapes are centered on the origin, wound counter-clockwise when seen from
//! outside (wgpu's default `FrontFace::Ccw`), and carry outward unit normals.
//!
//! Flat faces get their own vertices even where positions coincide, because a
//! corner shared by two faces needs a different normal for each. So a cube is
//! 24 vertices rather than 8, and a cylinder's caps don't reuse the side ring.
//!
//! UVs map each flat face onto the full unit square. The sphere uses
//! equirectangular mapping (longitude → U, latitude → V), which pinches at
//! the poles but needs no seams beyond the duplicated meridian.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use super::{MeshData, MeshVertex, PrimitiveShape};

/// Build vertex and index data for `shape`.
pub fn generate(shape: &PrimitiveShape) -> MeshData {
    match *shape {
        PrimitiveShape::Cube { size } => cube(size),
        PrimitiveShape::Sphere {
            radius,
            rings,
            slices,
        } => sphere(radius, rings, slices),
        PrimitiveShape::Plane { width, length } => plane(width, length),
        PrimitiveShape::Cylinder {
            radius,
            height,
            slices,
        } => cylinder(radius, height, slices),
    }
}

impl MeshData {
    fn push(&mut self, position: Vec3, normal: Vec3, uv: Vec2) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(MeshVertex {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        });
        index
    }

    /// Append a quad given corners in CCW order.
    fn quad(&mut self, corners: [u32; 4]) {
        let [a, b, c, d] = corners;
        self.indices.extend_from_slice(&[a, b, c, a, c, d]);
    }
}

/// A face's outward normal and the in-plane axes that U and V grow along.
struct Face {
    normal: Vec3,
    u: Vec3,
    v: Vec3,
}

const CUBE_FACES: [Face; 6] = [
    Face { normal: Vec3::X, u: Vec3::NEG_Z, v: Vec3::Y },
    Face { normal: Vec3::NEG_X, u: Vec3::Z, v: Vec3::Y },
    Face { normal: Vec3::Y, u: Vec3::X, v: Vec3::NEG_Z },
    Face { normal: Vec3::NEG_Y, u: Vec3::X, v: Vec3::Z },
    Face { normal: Vec3::Z, u: Vec3::X, v: Vec3::Y },
    Face { normal: Vec3::NEG_Z, u: Vec3::NEG_X, v: Vec3::Y },
];

fn cube(size: f32) -> MeshData {
    let h = size * 0.5;
    let mut mesh = MeshData::with_capacity(24, 36);
    for face in &CUBE_FACES {
        let center = face.normal * h;
        let corner = |su: f32, sv: f32| center + face.u * (su * h) + face.v * (sv * h);
        let quad = [
            mesh.push(corner(-1.0, -1.0), face.normal, Vec2::new(0.0, 1.0)),
            mesh.push(corner(1.0, -1.0), face.normal, Vec2::new(1.0, 1.0)),
            mesh.push(corner(1.0, 1.0), face.normal, Vec2::new(1.0, 0.0)),
            mesh.push(corner(-1.0, 1.0), face.normal, Vec2::new(0.0, 0.0)),
        ];
        mesh.quad(quad);
    }
    mesh
}

fn plane(width: f32, length: f32) -> MeshData {
    let (hw, hl) = (width * 0.5, length * 0.5);
    let mut mesh = MeshData::with_capacity(4, 6);
    let quad = [
        mesh.push(Vec3::new(-hw, 0.0, hl), Vec3::Y, Vec2::new(0.0, 0.0)),
        mesh.push(Vec3::new(hw, 0.0, hl), Vec3::Y, Vec2::new(1.0, 0.0)),
        mesh.push(Vec3::new(hw, 0.0, -hl), Vec3::Y, Vec2::new(1.0, 1.0)),
        mesh.push(Vec3::new(-hw, 0.0, -hl), Vec3::Y, Vec2::new(0.0, 1.0)),
    ];
    mesh.quad(quad);
    mesh
}

/// Latitude bands top to bottom (`rings`), longitude columns around Y
/// (`slices`). One extra column duplicates the seam meridian so U reaches 1.
fn sphere(radius: f32, rings: u32, slices: u32) -> MeshData {
    let rings = rings.max(2);
    let slices = slices.max(3);
    let columns = slices + 1;
    let mut mesh = MeshData::with_capacity(
        ((rings + 1) * columns) as usize,
        (rings * slices * 6) as usize,
    );

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let (sin_phi, cos_phi) = (v * PI).sin_cos();
        for slice in 0..=slices {
            let u = slice as f32 / slices as f32;
            let (sin_theta, cos_theta) = (u * TAU).sin_cos();
            let normal = Vec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta);
            mesh.push(normal * radius, normal, Vec2::new(u, v));
        }
    }

    for ring in 0..rings {
        for slice in 0..slices {
            let top = ring * columns + slice;
            let bottom = top + columns;
            mesh.quad([top, top + 1, bottom + 1, bottom]);
        }
    }
    mesh
}

/// Y-axis cylinder of total `height`, with fan-triangulated caps.
fn cylinder(radius: f32, height: f32, slices: u32) -> MeshData {
    let slices = slices.max(3);
    let half = height * 0.5;
    let mut mesh = MeshData::with_capacity(
        ((slices + 1) * 2 + (slices + 1) * 2) as usize,
        (slices * 12) as usize,
    );
    let rim = |i: u32| {
        let (sin, cos) = (i as f32 / slices as f32 * TAU).sin_cos();
        Vec3::new(cos, 0.0, sin)
    };

    // Side: a top and a bottom vertex per column, seam duplicated.
    for i in 0..=slices {
        let dir = rim(i);
        let u = i as f32 / slices as f32;
        mesh.push(dir * radius + Vec3::Y * half, dir, Vec2::new(u, 0.0));
        mesh.push(dir * radius - Vec3::Y * half, dir, Vec2::new(u, 1.0));
    }
    for i in 0..slices {
        let top = i * 2;
        mesh.quad([top, top + 2, top + 3, top + 1]);
    }

    for (normal, y) in [(Vec3::Y, half), (Vec3::NEG_Y, -half)] {
        let center = mesh.push(Vec3::Y * y, normal, Vec2::splat(0.5));
        for i in 0..slices {
            let dir = rim(i);
            mesh.push(
                dir * radius + Vec3::Y * y,
                normal,
                Vec2::new(0.5 + dir.x * 0.5, 0.5 + dir.z * 0.5),
            );
        }
        for i in 0..slices {
            let current = center + 1 + i;
            let next = center + 1 + (i + 1) % slices;
            // Seen from outside, the bottom cap winds the other way.
            if y > 0.0 {
                mesh.indices.extend_from_slice(&[center, next, current]);
            } else {
                mesh.indices.extend_from_slice(&[center, current, next]);
            }
        }
    }
    mesh
}
