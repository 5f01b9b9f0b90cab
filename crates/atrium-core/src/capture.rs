// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Cube reflection capture.
//!
//! Renders the whole scene from a fixed point into the six faces of an
//! off-screen cube texture. The reflective shapes sample that texture, so a
//! capture must finish before the main render of the same frame. The shapes
//! are included in their own capture; they see a one-frame-old copy of
//! themselves, which is accepted.

use crate::backend::{CubeFace, RenderBackend, RenderTarget};
use crate::error::{ConfigurationError, FrameError, ResourceError};
use crate::node::TextureHandle;
use crate::scene::Scene;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Capture rig parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// World-space capture point.
    pub position: [f32; 3],
    /// Near clip distance of the face cameras.
    pub near: f32,
    /// Far clip distance of the face cameras.
    pub far: f32,
    /// Texels per face edge.
    pub resolution: u32,
    /// Reflection weight applied to bound materials.
    pub intensity: f32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            position: [0.0, 0.75, 0.5],
            near: 0.1,
            far: 1000.0,
            resolution: 256,
            intensity: 1.0,
        }
    }
}

impl CaptureSettings {
    /// Rejects a zero resolution and non-increasing clip planes.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.resolution == 0 {
            return Err(ConfigurationError::InvalidCaptureResolution(
                self.resolution,
            ));
        }
        validate_clip_planes(self.near, self.far)
    }
}

/// `0 < near < far`, both finite.
pub(crate) fn validate_clip_planes(near: f32, far: f32) -> Result<(), ConfigurationError> {
    if near.is_finite() && far.is_finite() && near > 0.0 && far > near {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidClipPlanes { near, far })
    }
}

/// Owns one cube target and refreshes it on demand.
#[derive(Debug)]
pub struct ReflectionCapture {
    settings: CaptureSettings,
    texture: TextureHandle,
    generation: u64,
}

impl ReflectionCapture {
    /// Validates `settings` and allocates the cube target on `backend`.
    pub fn new<B: RenderBackend + ?Sized>(
        settings: CaptureSettings,
        backend: &mut B,
    ) -> Result<Self, FrameError> {
        settings.validate()?;
        let texture = backend.create_cube_target(settings.resolution)?;
        debug!(
            texture = texture.id(),
            resolution = settings.resolution,
            "cube target created"
        );
        Ok(Self {
            settings,
            texture,
            generation: 0,
        })
    }

    /// Renders all six faces in [`CubeFace::ALL`] order, then advances the
    /// generation. A failing face aborts the capture and leaves the
    /// generation unchanged.
    #[instrument(level = "trace", skip_all, fields(generation = self.generation))]
    pub fn capture<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        scene: &Scene,
    ) -> Result<(), ResourceError> {
        let position = self.position();
        for face in CubeFace::ALL {
            let camera = face.camera(position, self.settings.near, self.settings.far);
            backend.render(
                scene,
                &camera,
                RenderTarget::CubeFace {
                    texture: self.texture,
                    face,
                },
            )?;
        }
        self.generation += 1;
        Ok(())
    }

    /// Fails if the capture point lies inside any opaque mesh's bounds.
    pub fn validate_placement(&self, scene: &Scene) -> Result<(), ConfigurationError> {
        let position = self.position();
        match scene
            .opaque_bounds()
            .into_iter()
            .find(|(_, b)| b.contains_point(position))
        {
            Some((node, _)) => Err(ConfigurationError::CaptureEnclosed {
                position: self.settings.position,
                node,
            }),
            None => Ok(()),
        }
    }

    /// Cube texture the reflective materials sample.
    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    /// Number of completed captures.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Active settings.
    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Capture point.
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.settings.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(CaptureSettings::default().validate().is_ok());
    }

    #[test]
    fn zero_resolution_rejected() {
        let s = CaptureSettings {
            resolution: 0,
            ..CaptureSettings::default()
        };
        assert_eq!(
            s.validate(),
            Err(ConfigurationError::InvalidCaptureResolution(0))
        );
    }

    #[test]
    fn inverted_clip_planes_rejected() {
        assert!(validate_clip_planes(1.0, 0.5).is_err());
        assert!(validate_clip_planes(0.0, 10.0).is_err());
        assert!(validate_clip_planes(0.1, f32::INFINITY).is_err());
        assert!(validate_clip_planes(0.1, 1000.0).is_ok());
    }
}
