// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Render backend fake that records every call.

use atrium_core::{
    PerspectiveCamera, RenderBackend, RenderTarget, ResourceError, Scene, TextureHandle, Viewport,
};
use glam::Vec3;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Snapshot of what one `render` call saw.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderCall {
    /// Surface or cube face.
    pub target: RenderTarget,
    /// Camera as passed in.
    pub camera: PerspectiveCamera,
    /// Number of meshes in the scene.
    pub mesh_count: usize,
    /// Environment handle bound on the sphere.
    pub sphere_env: Option<TextureHandle>,
    /// Sphere world position.
    pub sphere_position: Vec3,
    /// Door size at render time.
    pub door_size: (f32, f32),
}

/// One recorded backend interaction.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    /// `create_cube_target`.
    CreateCubeTarget {
        /// Requested resolution.
        resolution: u32,
        /// Handle returned.
        texture: TextureHandle,
    },
    /// `resize`.
    Resize(Viewport),
    /// `render`.
    Render(RenderCall),
    /// `release_cube_target`.
    Release(TextureHandle),
}

#[derive(Default)]
struct Inner {
    calls: Vec<BackendCall>,
    live: BTreeSet<TextureHandle>,
    next_texture: u64,
    renders: usize,
    fail_render_at: Option<(usize, ResourceError)>,
    fail_resize: Option<ResourceError>,
    fail_create: Option<ResourceError>,
}

/// [`RenderBackend`] that draws nothing and remembers everything.
///
/// Clones share one log, so a test keeps a handle after moving the backend
/// into a driver.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingBackend {
    /// Fresh backend; texture ids start at 1.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Makes the `n`th render call from now (0-based) fail with `err`.
    pub fn fail_render_after(&self, n: usize, err: ResourceError) {
        let mut inner = self.lock();
        let at = inner.renders + n;
        inner.fail_render_at = Some((at, err));
    }

    /// Makes the next `resize` fail with `err`.
    pub fn fail_next_resize(&self, err: ResourceError) {
        self.lock().fail_resize = Some(err);
    }

    /// Makes the next `create_cube_target` fail with `err`.
    pub fn fail_next_create(&self, err: ResourceError) {
        self.lock().fail_create = Some(err);
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Render calls only.
    pub fn renders(&self) -> Vec<RenderCall> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::Render(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    /// Surface render calls only.
    pub fn surface_renders(&self) -> Vec<RenderCall> {
        self.renders()
            .into_iter()
            .filter(|r| r.target == RenderTarget::Surface)
            .collect()
    }

    /// Number of render calls attempted.
    pub fn render_count(&self) -> usize {
        self.lock().renders
    }

    /// Cube targets created and not yet released.
    pub fn live_textures(&self) -> Vec<TextureHandle> {
        self.lock().live.iter().copied().collect()
    }

    /// Forgets recorded calls; textures stay allocated.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

impl RenderBackend for RecordingBackend {
    fn create_cube_target(&mut self, resolution: u32) -> Result<TextureHandle, ResourceError> {
        let mut inner = self.lock();
        if let Some(err) = inner.fail_create.take() {
            return Err(err);
        }
        inner.next_texture += 1;
        let texture = TextureHandle::new(inner.next_texture);
        inner.live.insert(texture);
        inner.calls.push(BackendCall::CreateCubeTarget {
            resolution,
            texture,
        });
        Ok(texture)
    }

    fn resize(&mut self, viewport: Viewport) -> Result<(), ResourceError> {
        let mut inner = self.lock();
        inner.calls.push(BackendCall::Resize(viewport));
        match inner.fail_resize.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn render(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        target: RenderTarget,
    ) -> Result<(), ResourceError> {
        let mut inner = self.lock();
        let index = inner.renders;
        inner.renders += 1;
        if let RenderTarget::CubeFace { texture, .. } = target {
            if !inner.live.contains(&texture) {
                return Err(ResourceError::UnknownTexture(texture.id()));
            }
        }
        let sphere = scene.shapes().sphere();
        let door = scene.door().spec();
        inner.calls.push(BackendCall::Render(RenderCall {
            target,
            camera: *camera,
            mesh_count: scene.draw_list().len(),
            sphere_env: sphere
                .as_mesh()
                .and_then(|m| m.material.env_map)
                .map(|e| e.texture),
            sphere_position: sphere.transform.translation,
            door_size: (door.width, door.height),
        }));
        match &inner.fail_render_at {
            Some((at, err)) if *at == index => {
                let err = err.clone();
                inner.fail_render_at = None;
                Err(err)
            }
            _ => Ok(()),
        }
    }

    fn release_cube_target(&mut self, texture: TextureHandle) {
        let mut inner = self.lock();
        if inner.live.remove(&texture) {
            inner.calls.push(BackendCall::Release(texture));
        }
    }
}
