//! # Renderer — Queued Draws, One Pass per Frame
//!
//! ```text
//! clear(color)      reset the draw queue, remember the clear color
//! draw(..) × N      push (mesh, material, model) onto the queue
//! present(overlay)
//!   ├─ 1. acquire the surface texture (Lost/Outdated → reconfigure, skip)
//!   ├─ 2. resize depth if needed, write camera uniform
//!   ├─ 3. write one DrawUniform per queued draw into the dynamic buffer
//!   ├─ 4. render pass: clear color+depth, draw_indexed per draw
//!   ├─ 5. overlay(encoder, view), e.g. the egui pass
//!   └─ 6. submit, present
//! ```

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use super::context::GpuContext;
use super::pipeline::{CameraUniform, DrawUniform, MeshPipeline};
use crate::error::BackendError;
use crate::logging::ENGINE_TARGET;
use crate::math::Color;
use crate::mesh::{MaterialHandle, MeshData, MeshHandle};

/// A perspective camera plus the scene's single directional light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Direction the light travels.
    pub light_direction: Vec3,
    /// Fraction of the base color visible on faces turned away from the light.
    pub ambient: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 3.0, 8.0),
            target: Vec3::ZERO,
            fov_y: 45.0,
            near: 0.1,
            far: 100.0,
            light_direction: Vec3::new(-0.5, -1.0, -0.3),
            ambient: 0.2,
        }
    }
}

impl Camera {
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        let projection = Mat4::perspective_rh(self.fov_y.to_radians(), aspect, self.near, self.far);
        projection * Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct QueuedDraw {
    mesh: MeshHandle,
    material: MaterialHandle,
    model: Mat4,
}

pub(crate) struct Renderer {
    pub gpu: GpuContext,
    pipeline: MeshPipeline,
    meshes: Vec<Option<GpuMesh>>,
    materials: Vec<Color>,
    queue: Vec<QueuedDraw>,
    clear_color: Color,
    pub camera: Camera,
}

impl Renderer {
    pub fn new(gpu: GpuContext) -> Self {
        let pipeline = MeshPipeline::new(&gpu);
        Self {
            gpu,
            pipeline,
            meshes: Vec::new(),
            materials: Vec::new(),
            queue: Vec::new(),
            clear_color: Color::BLACK,
            camera: Camera::default(),
        }
    }

    pub fn upload_mesh(&mut self, handle: MeshHandle, data: &MeshData) {
        let slot = handle.index();
        if slot >= self.meshes.len() {
            self.meshes.resize_with(slot + 1, || None);
        }
        if data.indices.is_empty() {
            self.meshes[slot] = None;
            return;
        }
        let device = &self.gpu.device;
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh vertex buffer"),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh index buffer"),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.meshes[slot] = Some(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        });
    }

    pub fn upload_material(&mut self, handle: MaterialHandle, base_color: Color) {
        let slot = handle.index();
        if slot >= self.materials.len() {
            self.materials.resize(slot + 1, Color::WHITE);
        }
        self.materials[slot] = base_color;
    }

    pub fn begin_frame(&mut self, clear_color: Color) {
        self.queue.clear();
        self.clear_color = clear_color;
    }

    pub fn queue_draw(&mut self, mesh: MeshHandle, material: MaterialHandle, model: Mat4) {
        self.queue.push(QueuedDraw {
            mesh,
            material,
            model,
        });
    }

    pub fn present(
        &mut self,
        overlay: impl FnOnce(&GpuContext, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    ) -> Result<(), BackendError> {
        // ── 1. Acquire ──────────────────────────────────────────────────
        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                self.queue.clear();
                return Err(BackendError::SurfaceLost);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                self.queue.clear();
                return Err(BackendError::SurfaceLost);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(BackendError::OutOfMemory),
            Err(err) => return Err(BackendError::Surface(err.to_string())),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // ── 2. Depth + camera ───────────────────────────────────────────
        let (w, h) = self.gpu.surface_size();
        self.pipeline.resize_depth_if_needed(&self.gpu.device, w, h);
        let camera = CameraUniform {
            view_proj: self
                .camera
                .view_projection(w as f32 / h.max(1) as f32)
                .to_cols_array_2d(),
            light: self
                .camera
                .light_direction
                .normalize_or(Vec3::NEG_Y)
                .extend(self.camera.ambient)
                .to_array(),
        };
        self.gpu
            .queue
            .write_buffer(&self.pipeline.camera_buffer, 0, bytemuck::bytes_of(&camera));

        // ── 3. Draw uniforms ────────────────────────────────────────────
        let draws: Vec<(&GpuMesh, DrawUniform)> = self
            .queue
            .iter()
            .filter_map(|draw| {
                let Some(Some(mesh)) = self.meshes.get(draw.mesh.index()) else {
                    log::trace!(target: ENGINE_TARGET, "skipping draw of unuploaded {:?}", draw.mesh);
                    return None;
                };
                let color = self
                    .materials
                    .get(draw.material.index())
                    .copied()
                    .unwrap_or(Color::WHITE);
                Some((mesh, draw_uniform(&draw.model, color)))
            })
            .collect();

        let stride = self
            .pipeline
            .ensure_draw_capacity(&self.gpu.device, draws.len().max(1));
        if !draws.is_empty() {
            let mut data = vec![0u8; stride as usize * draws.len()];
            for (i, (_, uniform)) in draws.iter().enumerate() {
                let offset = i * stride as usize;
                let bytes = bytemuck::bytes_of(uniform);
                data[offset..offset + bytes.len()].copy_from_slice(bytes);
            }
            self.gpu
                .queue
                .write_buffer(&self.pipeline.draw_buffer, 0, &data);
        }

        // ── 4. Scene pass ───────────────────────────────────────────────
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("strata frame encoder"),
            });
        {
            let c = self.clear_color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mesh pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(c.r),
                            g: f64::from(c.g),
                            b: f64::from(c.b),
                            a: f64::from(c.a),
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.pipeline.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if !draws.is_empty() {
                pass.set_pipeline(&self.pipeline.pipeline);
                pass.set_bind_group(0, &self.pipeline.camera_bind_group, &[]);
                for (i, (mesh, _)) in draws.iter().enumerate() {
                    pass.set_bind_group(1, &self.pipeline.draw_bind_group, &[i as u32 * stride]);
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }
        }

        // ── 5. Overlay ──────────────────────────────────────────────────
        overlay(&self.gpu, &mut encoder, &view);

        // ── 6. Submit ───────────────────────────────────────────────────
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        self.queue.clear();
        Ok(())
    }
}

fn draw_uniform(model: &Mat4, color: Color) -> DrawUniform {
    let inverse = model.inverse();
    let normal_matrix = if model.determinant() != 0.0 && inverse.is_finite() {
        inverse.transpose()
    } else {
        *model
    };
    DrawUniform {
        model: model.to_cols_array_2d(),
        normal_matrix: normal_matrix.to_cols_array_2d(),
        color: color.to_array(),
    }
}
