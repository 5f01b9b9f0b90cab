// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! wgpu implementation of [`RenderBackend`]: shadowed forward pass, cube
//! face capture and the egui overlay.

use crate::gpu::{CubeTarget, Globals, Gpu, Instance, MAX_INSTANCES};
use crate::mesh::MeshKey;
use atrium_core::{
    Color, CubeFace, Mesh, PerspectiveCamera, RenderBackend, RenderTarget, ResourceError, Scene,
    TextureHandle, Viewport,
};
use egui_wgpu::wgpu;
use egui_winit::winit::dpi::PhysicalSize;
use glam::{Mat3, Mat4, Vec3};
use std::collections::HashMap;
use std::ops::Range;
use tracing::{debug, warn};

/// egui output waiting for the next presented frame.
pub struct Overlay {
    pub paint_jobs: Vec<egui::epaint::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub screen_desc: egui_wgpu::ScreenDescriptor,
}

/// Consecutive instances sharing a mesh and environment binding.
#[derive(Clone, Debug, PartialEq)]
struct Batch {
    mesh: MeshKey,
    env: Option<TextureHandle>,
    cast_shadow: bool,
    range: Range<u32>,
}

/// One mesh ready for upload.
struct Prepared {
    mesh: MeshKey,
    env: Option<TextureHandle>,
    cast_shadow: bool,
    instance: Instance,
}

pub struct WgpuBackend {
    gpu: Gpu,
    egui_renderer: egui_wgpu::Renderer,
    targets: HashMap<TextureHandle, CubeTarget>,
    next_texture: u64,
    overlay: Option<Overlay>,
}

impl WgpuBackend {
    pub fn new(gpu: Gpu) -> Self {
        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.config.format,
            egui_wgpu::RendererOptions::default(),
        );
        Self {
            gpu,
            egui_renderer,
            targets: HashMap::new(),
            next_texture: 0,
            overlay: None,
        }
    }

    pub fn set_vsync(&mut self, on: bool) {
        self.gpu.set_vsync(on);
    }

    /// Surface size in pixels.
    pub fn surface_size(&self) -> [u32; 2] {
        [self.gpu.config.width, self.gpu.config.height]
    }

    /// Queues egui output for the next surface frame. Texture updates from
    /// an overlay that never reached the screen are carried over.
    pub fn set_overlay(&mut self, mut overlay: Overlay) {
        if let Some(stale) = self.overlay.take() {
            let mut delta = stale.textures_delta;
            delta.append(overlay.textures_delta);
            overlay.textures_delta = delta;
        }
        self.overlay = Some(overlay);
    }

    /// Clears to `background` and draws only the overlay. Used while the
    /// frame loop is stopped so the HUD stays interactive.
    pub fn present_overlay(&mut self, background: Color) -> Result<(), ResourceError> {
        let Some(frame) = self.acquire()? else {
            return Ok(());
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("overlay-encoder"),
            });
        {
            let _clear = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(background)),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }
        let cmd_ui = self.encode_overlay(&view);
        self.gpu.queue.submit([encoder.finish()].into_iter().chain(cmd_ui));
        frame.present();
        Ok(())
    }

    /// Next swapchain image. `None` when the acquire timed out and the frame
    /// should be skipped.
    fn acquire(&mut self) -> Result<Option<wgpu::SurfaceTexture>, ResourceError> {
        match self.gpu.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost; reconfiguring");
                self.gpu.reconfigure();
                self.gpu
                    .surface
                    .get_current_texture()
                    .map(Some)
                    .map_err(|_| ResourceError::SurfaceLost)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(ResourceError::OutOfMemory),
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface acquire timed out; skipping frame");
                Ok(None)
            }
            Err(other) => Err(ResourceError::Backend(other.to_string())),
        }
    }

    /// Uploads instances for `scene` and returns the draw batches. Materials
    /// bound to `writing` sample the fallback environment instead, since a
    /// texture cannot be read while it is being rendered.
    fn prepare(
        &mut self,
        scene: &Scene,
        writing: Option<TextureHandle>,
    ) -> Result<Vec<Batch>, ResourceError> {
        let mut prepared = Vec::new();
        let mut unknown = None;
        scene.for_each_mesh(|item| {
            let env = item.mesh.material.env_map.map(|e| e.texture);
            if let Some(texture) = env {
                if !self.targets.contains_key(&texture) {
                    unknown = Some(texture);
                }
            }
            let (mesh, model) = MeshKey::model(&item.mesh.geometry, item.world);
            prepared.push(Prepared {
                mesh,
                env: env.filter(|t| Some(*t) != writing),
                cast_shadow: item.mesh.shadows.cast,
                instance: instance(item.mesh, model),
            });
        });
        if let Some(texture) = unknown {
            return Err(ResourceError::UnknownTexture(texture.id()));
        }
        if prepared.len() > MAX_INSTANCES {
            return Err(ResourceError::Backend(format!(
                "{} meshes exceed the instance buffer ({MAX_INSTANCES})",
                prepared.len()
            )));
        }
        let (batches, instances) = batch(prepared);
        for b in &batches {
            self.gpu.ensure_mesh(b.mesh);
        }
        self.gpu.ensure_shadow_map(scene.lighting().key.shadow.map_size);
        self.gpu
            .queue
            .write_buffer(&self.gpu.instance_buf, 0, bytemuck::cast_slice(&instances));
        Ok(batches)
    }

    fn write_globals(&self, scene: &Scene, view_proj: Mat4, eye: Vec3) {
        let globals = globals(scene, view_proj, eye);
        self.gpu
            .queue
            .write_buffer(&self.gpu.globals_buf, 0, bytemuck::bytes_of(&globals));
    }

    fn encode_shadow(&self, encoder: &mut wgpu::CommandEncoder, batches: &[Batch]) {
        let Some(shadow) = &self.gpu.shadow else {
            return;
        };
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shadow"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &shadow.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        rpass.set_pipeline(&self.gpu.pipelines.shadow);
        rpass.set_bind_group(0, &self.gpu.shadow_bind_group, &[]);
        rpass.set_vertex_buffer(1, self.gpu.instance_buf.slice(..));
        for b in batches.iter().filter(|b| b.cast_shadow) {
            let Some(mesh) = self.gpu.meshes.get(&b.mesh) else {
                continue;
            };
            rpass.set_vertex_buffer(0, mesh.vbuf.slice(..));
            rpass.set_index_buffer(mesh.ibuf.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..mesh.count, 0, b.range.clone());
        }
    }

    fn draw_lit(&self, rpass: &mut wgpu::RenderPass<'_>, batches: &[Batch]) {
        let Some(shadow) = &self.gpu.shadow else {
            return;
        };
        rpass.set_bind_group(0, &shadow.globals_bind_group, &[]);
        rpass.set_vertex_buffer(1, self.gpu.instance_buf.slice(..));
        for b in batches {
            let Some(mesh) = self.gpu.meshes.get(&b.mesh) else {
                continue;
            };
            let env = b
                .env
                .and_then(|t| self.targets.get(&t))
                .map_or(&self.gpu.fallback_env, |t| &t.env_bind_group);
            rpass.set_bind_group(1, env, &[]);
            rpass.set_vertex_buffer(0, mesh.vbuf.slice(..));
            rpass.set_index_buffer(mesh.ibuf.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..mesh.count, 0, b.range.clone());
        }
    }

    /// Encodes the pending overlay onto `view`, if any.
    fn encode_overlay(&mut self, view: &wgpu::TextureView) -> Option<wgpu::CommandBuffer> {
        let Overlay {
            paint_jobs,
            textures_delta,
            screen_desc,
        } = self.overlay.take()?;
        let gpu = &self.gpu;
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui-encoder"),
            });
        for (id, delta) in textures_delta.set {
            self.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, id, &delta);
        }
        self.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_desc,
        );
        {
            let rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui"),
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
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            let mut rpass = rpass.forget_lifetime();
            self.egui_renderer
                .render(&mut rpass, &paint_jobs, &screen_desc);
        }
        for id in textures_delta.free {
            self.egui_renderer.free_texture(&id);
        }
        Some(encoder.finish())
    }

    fn render_surface(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
    ) -> Result<(), ResourceError> {
        let batches = self.prepare(scene, None)?;
        self.write_globals(scene, camera.view_proj(), camera.position);
        let Some(frame) = self.acquire()? else {
            return Ok(());
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("main-encoder"),
            });
        self.encode_shadow(&mut encoder, &batches);
        {
            let (color_view, resolve_view) = match &self.gpu.msaa_view {
                Some(msaa) => (msaa, Some(&view)),
                None => (&view, None),
            };
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: resolve_view,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(scene.background())),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.gpu.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            rpass.set_pipeline(&self.gpu.pipelines.surface);
            self.draw_lit(&mut rpass, &batches);
        }
        let cmd_main = encoder.finish();
        let cmd_ui = self.encode_overlay(&view);
        self.gpu.queue.submit([cmd_main].into_iter().chain(cmd_ui));
        frame.present();
        Ok(())
    }

    fn render_face(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        texture: TextureHandle,
        face: CubeFace,
    ) -> Result<(), ResourceError> {
        let resolution = self
            .targets
            .get(&texture)
            .map(|t| t.resolution)
            .ok_or(ResourceError::UnknownTexture(texture.id()))?;
        let batches = self.prepare(scene, Some(texture))?;
        self.write_globals(scene, cube_face_view_proj(camera), camera.position);
        self.gpu.ensure_cube_depth(resolution);

        let (Some(target), Some((_, depth))) = (self.targets.get(&texture), &self.gpu.cube_depth)
        else {
            return Err(ResourceError::UnknownTexture(texture.id()));
        };
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("cube-face-encoder"),
            });
        self.encode_shadow(&mut encoder, &batches);
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("cube-face"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.face_views[face.index() as usize],
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(scene.background())),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            rpass.set_pipeline(&self.gpu.pipelines.cube);
            self.draw_lit(&mut rpass, &batches);
        }
        // Globals and instances are rewritten per call, so each face is its
        // own submission.
        self.gpu.queue.submit([encoder.finish()]);
        Ok(())
    }
}

impl RenderBackend for WgpuBackend {
    fn create_cube_target(&mut self, resolution: u32) -> Result<TextureHandle, ResourceError> {
        if resolution == 0 || resolution > self.gpu.max_tex {
            return Err(ResourceError::Backend(format!(
                "cube resolution {resolution} outside 1..={}",
                self.gpu.max_tex
            )));
        }
        self.next_texture += 1;
        let handle = TextureHandle::new(self.next_texture);
        self.targets
            .insert(handle, self.gpu.create_cube_target(resolution));
        debug!(texture = handle.id(), resolution, "allocated cube texture");
        Ok(handle)
    }

    fn resize(&mut self, viewport: Viewport) -> Result<(), ResourceError> {
        self.gpu
            .resize(PhysicalSize::new(viewport.width, viewport.height));
        Ok(())
    }

    fn render(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        target: RenderTarget,
    ) -> Result<(), ResourceError> {
        match target {
            RenderTarget::Surface => self.render_surface(scene, camera),
            RenderTarget::CubeFace { texture, face } => {
                self.render_face(scene, camera, texture, face)
            }
        }
    }

    fn release_cube_target(&mut self, texture: TextureHandle) {
        if self.targets.remove(&texture).is_some() {
            debug!(texture = texture.id(), "cube target released");
        }
    }
}

/// Sorts meshes into batches: shadow casters first, then by mesh and
/// environment so each batch is one instanced draw.
fn batch(mut prepared: Vec<Prepared>) -> (Vec<Batch>, Vec<Instance>) {
    prepared.sort_by_key(|p| (!p.cast_shadow, p.mesh, p.env.map(TextureHandle::id)));
    let mut batches: Vec<Batch> = Vec::new();
    let mut instances = Vec::with_capacity(prepared.len());
    for p in prepared {
        let index = instances.len() as u32;
        instances.push(p.instance);
        match batches.last_mut() {
            Some(b) if b.mesh == p.mesh && b.env == p.env && b.cast_shadow == p.cast_shadow => {
                b.range.end = index + 1;
            }
            _ => batches.push(Batch {
                mesh: p.mesh,
                env: p.env,
                cast_shadow: p.cast_shadow,
                range: index..index + 1,
            }),
        }
    }
    (batches, instances)
}

fn instance(mesh: &Mesh, model: Mat4) -> Instance {
    let normal = Mat3::from_mat4(model).inverse().transpose();
    let material = &mesh.material;
    let env_intensity = material.env_map.map_or(0.0, |e| e.intensity);
    Instance {
        model: model.to_cols_array_2d(),
        normal: [
            normal.x_axis.extend(0.0).to_array(),
            normal.y_axis.extend(0.0).to_array(),
            normal.z_axis.extend(0.0).to_array(),
        ],
        color: linear(material.color).extend(1.0).to_array(),
        material: [
            material.metalness,
            material.roughness,
            env_intensity,
            if mesh.shadows.receive { 1.0 } else { 0.0 },
        ],
    }
}

fn globals(scene: &Scene, view_proj: Mat4, eye: Vec3) -> Globals {
    let rig = scene.lighting();
    let key = &rig.key;
    let up = if key.to_light().abs().y > 0.99 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let he = key.shadow.half_extent;
    let light_view_proj = Mat4::orthographic_rh(-he, he, -he, he, key.shadow.near, key.shadow.far)
        * Mat4::look_at_rh(key.position, key.target, up);
    Globals {
        view_proj: view_proj.to_cols_array_2d(),
        light_view_proj: light_view_proj.to_cols_array_2d(),
        camera_pos: eye.extend(1.0).to_array(),
        light_dir: key.to_light().extend(key.shadow.bias).to_array(),
        light_color: (linear(key.color) * key.intensity).extend(1.0).to_array(),
        ambient: (linear(rig.ambient.color) * rig.ambient.intensity)
            .extend(1.0)
            .to_array(),
        sky: (linear(rig.hemisphere.sky) * rig.hemisphere.intensity)
            .extend(1.0)
            .to_array(),
        ground: (linear(rig.hemisphere.ground) * rig.hemisphere.intensity)
            .extend(1.0)
            .to_array(),
    }
}

/// World-to-clip for one cube face, laid out the way wgpu samples cube
/// maps: +Y at row 0 of the side faces and the image mirrored in X.
fn cube_face_view_proj(camera: &PerspectiveCamera) -> Mat4 {
    let view = Mat4::look_at_rh(camera.position, camera.target, -camera.up);
    Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0)) * camera.projection() * view
}

/// sRGB colour to linear light.
fn linear(c: Color) -> Vec3 {
    let f = |v: f32| {
        if v <= 0.04045 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    };
    Vec3::new(f(c.r), f(c.g), f(c.b))
}

fn clear_color(c: Color) -> wgpu::Color {
    let l = linear(c);
    wgpu::Color {
        r: f64::from(l.x),
        g: f64::from(l.y),
        b: f64::from(l.z),
        a: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use atrium_core::node::Shadows;
    use atrium_core::{Geometry, Material, Mesh, SceneConfig};

    fn ndc(m: Mat4, p: Vec3) -> Vec3 {
        m.project_point3(p)
    }

    #[test]
    fn cube_faces_match_wgpu_sampling_layout() {
        let origin = Vec3::ZERO;
        let px = ndc(
            cube_face_view_proj(&CubeFace::PositiveX.camera(origin, 0.1, 10.0)),
            Vec3::new(1.0, 0.2, 0.3),
        );
        // +X face: +Y at the top, +Z on the left.
        assert!(px.y > 0.0 && px.x < 0.0, "{px:?}");

        let py = ndc(
            cube_face_view_proj(&CubeFace::PositiveY.camera(origin, 0.1, 10.0)),
            Vec3::new(0.3, 1.0, -0.2),
        );
        // +Y face: -Z at the top, +X on the right.
        assert!(py.y > 0.0 && py.x > 0.0, "{py:?}");

        let centre = ndc(
            cube_face_view_proj(&CubeFace::NegativeZ.camera(origin, 0.1, 10.0)),
            Vec3::NEG_Z,
        );
        assert_relative_eq!(centre.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(centre.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn linear_matches_srgb_endpoints() {
        assert_eq!(linear(Color::hex(0x000000)), Vec3::ZERO);
        assert_relative_eq!(linear(Color::hex(0xffffff)).x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(linear(Color::hex(0x808080)).x, 0.2158, epsilon = 1e-3);
    }

    #[test]
    fn batches_group_instances_and_put_casters_first() {
        let scene = SceneConfig::default();
        let scene = Scene::new(scene.scene_setup()).unwrap();
        let mut prepared = Vec::new();
        scene.for_each_mesh(|item| {
            let (mesh, model) = MeshKey::model(&item.mesh.geometry, item.world);
            prepared.push(Prepared {
                mesh,
                env: item.mesh.material.env_map.map(|e| e.texture),
                cast_shadow: item.mesh.shadows.cast,
                instance: instance(item.mesh, model),
            });
        });
        let total = prepared.len() as u32;
        let (batches, instances) = batch(prepared);

        assert_eq!(instances.len() as u32, total);
        assert_eq!(batches.first().map(|b| b.range.start), Some(0));
        assert_eq!(batches.last().map(|b| b.range.end), Some(total));
        for pair in batches.windows(2) {
            assert_eq!(pair[0].range.end, pair[1].range.start);
            assert!(pair[0].cast_shadow >= pair[1].cast_shadow);
        }
        assert!(batches.len() < total as usize);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let mesh = Mesh {
            geometry: Geometry::cuboid(1.0, 1.0, 1.0),
            material: Material::standard(Color::hex(0xffffff), 0.5),
            shadows: Shadows::BOTH,
        };
        let inst = instance(&mesh, Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0)));
        assert_relative_eq!(inst.normal[0][0], 0.5);
        assert_relative_eq!(inst.normal[1][1], 1.0);
        assert_eq!(inst.material[3], 1.0);
    }
}
