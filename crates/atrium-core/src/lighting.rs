// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Three-light rig: key directional light with a shadow map, ambient fill,
//! and a sky/ground hemisphere light. Fixed after construction.

use crate::node::Color;
use glam::Vec3;

/// Orthographic shadow camera parameters for the key light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowParams {
    /// Shadow map edge length in texels.
    pub map_size: u32,
    /// Near plane of the shadow camera.
    pub near: f32,
    /// Far plane of the shadow camera.
    pub far: f32,
    /// Half-extent of the orthographic shadow frustum.
    pub half_extent: f32,
    /// Depth bias against acne.
    pub bias: f32,
}

/// Key light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    /// Light colour.
    pub color: Color,
    /// Scalar intensity.
    pub intensity: f32,
    /// Light position; the light shines from here toward `target`.
    pub position: Vec3,
    /// Aim point.
    pub target: Vec3,
    /// Shadow map settings.
    pub shadow: ShadowParams,
}

impl DirectionalLight {
    /// Unit vector pointing from the surface toward the light.
    pub fn to_light(&self) -> Vec3 {
        (self.position - self.target).normalize_or_zero()
    }
}

/// Uniform fill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    /// Light colour.
    pub color: Color,
    /// Scalar intensity.
    pub intensity: f32,
}

/// Sky/ground gradient keyed on surface normal Y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HemisphereLight {
    /// Colour for normals facing +Y.
    pub sky: Color,
    /// Colour for normals facing -Y.
    pub ground: Color,
    /// Scalar intensity.
    pub intensity: f32,
}

/// The scene's lights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightingRig {
    /// Shadow-casting key light.
    pub key: DirectionalLight,
    /// Ambient fill.
    pub ambient: AmbientLight,
    /// Hemisphere light.
    pub hemisphere: HemisphereLight,
}

impl Default for LightingRig {
    fn default() -> Self {
        Self {
            key: DirectionalLight {
                color: Color::hex(0xffffff),
                intensity: 1.0,
                position: Vec3::new(5.0, 10.0, 7.5),
                target: Vec3::ZERO,
                shadow: ShadowParams {
                    map_size: 2048,
                    near: 0.5,
                    far: 50.0,
                    half_extent: 10.0,
                    bias: -0.0005,
                },
            },
            ambient: AmbientLight {
                color: Color::hex(0x404040),
                intensity: 0.6,
            },
            hemisphere: HemisphereLight {
                sky: Color::hex(0xffffbb),
                ground: Color::hex(0x080820),
                intensity: 0.4,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_light_points_down_toward_origin() {
        let rig = LightingRig::default();
        let l = rig.key.to_light();
        assert!((l.length() - 1.0).abs() < 1e-6);
        assert!(l.y > 0.0);
        assert!(rig.key.shadow.map_size.is_power_of_two());
    }
}
