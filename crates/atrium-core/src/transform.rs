// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Local transform of a scene node.
///
/// Conventions:
/// - `translation` in world units relative to the parent.
/// - `rotation` as XYZ Euler angles in radians. Angles are stored as given and
///   never wrapped, so animation code can write `0.5 * t` directly and read it
///   back unchanged.
/// - `scale` is non-uniform and applied before rotation/translation.
///
/// `to_mat4` builds `M = T * R * S`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    /// Offset from the parent origin.
    pub translation: Vec3,
    /// XYZ Euler rotation in radians.
    pub rotation: Vec3,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Identity transform (no translation, no rotation, unit scale).
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    /// Pure translation.
    #[must_use]
    pub const fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    /// Replaces the rotation.
    #[must_use]
    pub const fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Rotation as a unit quaternion.
    #[must_use]
    pub fn quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    /// Column-major local matrix.
    #[must_use]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_maps_points_to_themselves() {
        let p = Vec3::new(1.0, -2.0, 3.0);
        assert_eq!(Transform::identity().to_mat4().transform_point3(p), p);
    }

    #[test]
    fn scale_applies_before_translation() {
        let mut t = Transform::from_translation(Vec3::new(10.0, 0.0, 0.0));
        t.scale = Vec3::splat(2.0);
        let p = t.to_mat4().transform_point3(Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(p, Vec3::new(12.0, 2.0, 2.0));
    }

    #[test]
    fn rotation_is_stored_unwrapped() {
        let t = Transform::identity().with_rotation(Vec3::new(0.0, 40.0, 0.0));
        assert_eq!(t.rotation.y, 40.0);
    }
}
