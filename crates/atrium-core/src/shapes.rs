// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The two reflective primitives and their motion.
//!
//! Motion is a closed-form function of the clock: [`ReflectiveShapes::animate`]
//! overwrites the animated fields from `t` alone and keeps no state between
//! calls, so any frame can be reproduced by passing the same `t`.

use crate::node::{Color, EnvMap, Geometry, Material, Node, TextureHandle};
use glam::Vec3;
use tracing::debug;

/// Cube spin about Y, radians per second.
pub const CUBE_SPIN_Y: f32 = 0.5;
/// Cube spin about X, radians per second.
pub const CUBE_SPIN_X: f32 = 0.3;
/// Sphere bob amplitude.
pub const SPHERE_BOB_AMPLITUDE: f32 = 0.3;
/// Sphere bob angular frequency, radians per second.
pub const SPHERE_BOB_FREQUENCY: f32 = 2.0;

/// Placement and look of the reflective pair.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeSetup {
    /// Cube edge length.
    pub cube_size: f32,
    /// Cube centre.
    pub cube_position: Vec3,
    /// Cube surface.
    pub cube_material: Material,
    /// Sphere radius.
    pub sphere_radius: f32,
    /// Sphere rest centre; Y is the bob baseline.
    pub sphere_position: Vec3,
    /// Sphere surface.
    pub sphere_material: Material,
}

impl Default for ShapeSetup {
    fn default() -> Self {
        Self {
            cube_size: 1.0,
            cube_position: Vec3::new(-1.5, 0.75, 0.5),
            cube_material: Material::metal(Color::hex(0xc0c0c0), 0.1),
            sphere_radius: 0.5,
            sphere_position: Vec3::new(1.5, 0.75, 0.5),
            sphere_material: Material::metal(Color::hex(0xffd700), 0.15),
        }
    }
}

/// Metallic cube and gold sphere.
#[derive(Clone, Debug)]
pub struct ReflectiveShapes {
    cube: Node,
    sphere: Node,
    base_y: f32,
}

impl ReflectiveShapes {
    /// Builds both meshes with unbound environment slots.
    pub fn new(setup: ShapeSetup) -> Self {
        let cube = Node::mesh(
            "reflective-cube",
            Geometry::cuboid(setup.cube_size, setup.cube_size, setup.cube_size),
            setup.cube_material,
        )
        .at(setup.cube_position);
        let sphere = Node::mesh(
            "reflective-sphere",
            Geometry::Sphere {
                radius: setup.sphere_radius,
            },
            setup.sphere_material,
        )
        .at(setup.sphere_position);
        Self {
            cube,
            sphere,
            base_y: setup.sphere_position.y,
        }
    }

    /// Poses both shapes for clock value `t` (seconds).
    pub fn animate(&mut self, t: f64) {
        let cube = &mut self.cube.transform;
        cube.rotation.x = wrap_angle(f64::from(CUBE_SPIN_X) * t);
        cube.rotation.y = wrap_angle(f64::from(CUBE_SPIN_Y) * t);

        let bob = (f64::from(SPHERE_BOB_FREQUENCY) * t).sin() as f32;
        let sphere = &mut self.sphere.transform;
        sphere.translation.y = self.base_y + SPHERE_BOB_AMPLITUDE * bob;
        sphere.rotation.y = wrap_angle(t);
    }

    /// Points both materials' reflective input at `texture`.
    ///
    /// Rebinding the same handle only updates intensity. Returns `true` if
    /// either material changed.
    pub fn bind_environment(&mut self, texture: TextureHandle, intensity: f32) -> bool {
        let wanted = EnvMap { texture, intensity };
        let mut changed = false;
        for node in [&mut self.cube, &mut self.sphere] {
            if let Some(material) = node.material_mut() {
                if material.env_map != Some(wanted) {
                    material.env_map = Some(wanted);
                    changed = true;
                }
            }
        }
        if changed {
            debug!(texture = texture.id(), intensity, "environment bound");
        }
        changed
    }

    /// Handle currently bound to the cube (both shapes share it).
    pub fn environment(&self) -> Option<TextureHandle> {
        self.cube
            .as_mesh()
            .and_then(|m| m.material.env_map)
            .map(|e| e.texture)
    }

    /// Cube node.
    pub fn cube(&self) -> &Node {
        &self.cube
    }

    /// Sphere node.
    pub fn sphere(&self) -> &Node {
        &self.sphere
    }

    /// Sphere bob baseline.
    pub fn base_y(&self) -> f32 {
        self.base_y
    }

    /// Both nodes, cube first.
    pub fn nodes(&self) -> [&Node; 2] {
        [&self.cube, &self.sphere]
    }
}

impl Default for ReflectiveShapes {
    fn default() -> Self {
        Self::new(ShapeSetup::default())
    }
}

/// Reduces an angle to `[0, 2pi)` before narrowing, so hours of wall-clock
/// time keep sub-millisecond resolution.
fn wrap_angle(radians: f64) -> f32 {
    radians.rem_euclid(std::f64::consts::TAU) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rest_pose_at_zero() {
        let mut shapes = ReflectiveShapes::default();
        shapes.animate(0.0);
        assert_eq!(shapes.sphere().transform.translation.y, shapes.base_y());
        assert_eq!(shapes.cube().transform.rotation, Vec3::ZERO);
    }

    #[test]
    fn same_clock_twice_is_idempotent() {
        let mut shapes = ReflectiveShapes::default();
        shapes.animate(3.25);
        let cube = shapes.cube().transform;
        let sphere = shapes.sphere().transform;
        shapes.animate(3.25);
        assert_eq!(shapes.cube().transform, cube);
        assert_eq!(shapes.sphere().transform, sphere);
    }

    #[test]
    fn long_running_clock_keeps_precision() {
        let t = 10.0 * 3600.0 + 0.0005;
        let mut shapes = ReflectiveShapes::default();
        shapes.animate(t);
        let expected_y = f64::from(shapes.base_y())
            + f64::from(SPHERE_BOB_AMPLITUDE) * (f64::from(SPHERE_BOB_FREQUENCY) * t).sin();
        assert_relative_eq!(
            f64::from(shapes.sphere().transform.translation.y),
            expected_y,
            epsilon = 1e-5
        );
        let expected_spin = (f64::from(CUBE_SPIN_Y) * t).rem_euclid(std::f64::consts::TAU);
        assert_relative_eq!(
            f64::from(shapes.cube().transform.rotation.y),
            expected_spin,
            epsilon = 1e-5
        );
    }

    #[test]
    fn binding_same_handle_twice_is_a_noop() {
        let mut shapes = ReflectiveShapes::default();
        let tex = TextureHandle::new(7);
        assert!(shapes.bind_environment(tex, 1.0));
        assert!(!shapes.bind_environment(tex, 1.0));
        assert!(shapes.bind_environment(tex, 0.5));
        assert_eq!(shapes.environment(), Some(tex));
        let sphere_env = shapes.sphere().as_mesh().unwrap().material.env_map;
        assert_eq!(sphere_env.map(|e| e.intensity), Some(0.5));
    }

    #[test]
    fn unbound_until_bound() {
        let shapes = ReflectiveShapes::default();
        assert_eq!(shapes.environment(), None);
    }
}
