// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Render backend port.
//!
//! The core never touches a GPU. It hands a [`Scene`] and a camera to a
//! [`RenderBackend`] and names the target. Backends own every texture and
//! refer to them by [`TextureHandle`].

use crate::camera::{PerspectiveCamera, Viewport};
use crate::error::ResourceError;
use crate::node::TextureHandle;
use crate::scene::Scene;
use glam::Vec3;

/// One face of a cube texture, in upload order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CubeFace {
    /// +X
    PositiveX,
    /// -X
    NegativeX,
    /// +Y
    PositiveY,
    /// -Y
    NegativeY,
    /// +Z
    PositiveZ,
    /// -Z
    NegativeZ,
}

impl CubeFace {
    /// All faces in layer order.
    pub const ALL: [Self; 6] = [
        Self::PositiveX,
        Self::NegativeX,
        Self::PositiveY,
        Self::NegativeY,
        Self::PositiveZ,
        Self::NegativeZ,
    ];

    /// Array layer index in a cube texture.
    pub const fn index(self) -> u32 {
        match self {
            Self::PositiveX => 0,
            Self::NegativeX => 1,
            Self::PositiveY => 2,
            Self::NegativeY => 3,
            Self::PositiveZ => 4,
            Self::NegativeZ => 5,
        }
    }

    /// View direction for this face.
    pub const fn direction(self) -> Vec3 {
        match self {
            Self::PositiveX => Vec3::X,
            Self::NegativeX => Vec3::NEG_X,
            Self::PositiveY => Vec3::Y,
            Self::NegativeY => Vec3::NEG_Y,
            Self::PositiveZ => Vec3::Z,
            Self::NegativeZ => Vec3::NEG_Z,
        }
    }

    /// Up vector for this face (cubemap convention).
    pub const fn up(self) -> Vec3 {
        match self {
            Self::PositiveY => Vec3::Z,
            Self::NegativeY => Vec3::NEG_Z,
            _ => Vec3::NEG_Y,
        }
    }

    /// Square 90 degree camera at `position` looking through this face.
    pub fn camera(self, position: Vec3, near: f32, far: f32) -> PerspectiveCamera {
        PerspectiveCamera {
            position,
            target: position + self.direction(),
            up: self.up(),
            fov_y: std::f32::consts::FRAC_PI_2,
            aspect: 1.0,
            near,
            far,
        }
    }
}

/// Where a render call draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderTarget {
    /// The presentation surface.
    Surface,
    /// One face of an off-screen cube texture.
    CubeFace {
        /// Cube texture created by [`RenderBackend::create_cube_target`].
        texture: TextureHandle,
        /// Face to draw into.
        face: CubeFace,
    },
}

/// Render backend contract.
///
/// Implementors draw; they hold no scene logic and own no clock.
pub trait RenderBackend {
    /// Allocates a cube render target with `resolution` texels per face edge.
    fn create_cube_target(&mut self, resolution: u32) -> Result<TextureHandle, ResourceError>;

    /// Resizes the presentation surface.
    fn resize(&mut self, viewport: Viewport) -> Result<(), ResourceError>;

    /// Draws every mesh of `scene` as seen by `camera` into `target`.
    fn render(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        target: RenderTarget,
    ) -> Result<(), ResourceError>;

    /// Frees a cube target. Unknown handles are ignored.
    fn release_cube_target(&mut self, _texture: TextureHandle) {}
}
