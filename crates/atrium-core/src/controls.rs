// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Damped orbit controls.
//!
//! Input calls (`rotate_left`, `rotate_up`, `dolly`, `pan`) only add to a
//! velocity. [`OrbitControls::update`] applies a `damping` fraction of that
//! velocity to the camera and decays the rest, so motion eases out over
//! several frames. Distance and polar angle are clamped on every update.

use crate::camera::PerspectiveCamera;
use crate::error::ConfigurationError;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

/// Keeps the polar angle off the exact pole where azimuth is undefined.
const POLE_EPSILON: f32 = 1e-6;
/// Velocities below this are snapped to zero.
const REST_EPSILON: f32 = 1e-6;
/// Camera displacement below this does not count as movement.
const MOVE_EPSILON: f32 = 1e-4;

/// Tunables for [`OrbitControls`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitSettings {
    /// Point orbited around.
    pub target: [f32; 3],
    /// Fraction of pending velocity applied per update, in `(0, 1]`.
    pub damping: f32,
    /// Closest allowed distance to the target.
    pub min_distance: f32,
    /// Farthest allowed distance to the target.
    pub max_distance: f32,
    /// Smallest polar angle (0 = straight down from above).
    pub min_polar: f32,
    /// Largest polar angle (pi/2 = level with the target).
    pub max_polar: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            target: [0.0, 1.0, 0.0],
            damping: 0.05,
            min_distance: 2.0,
            max_distance: 20.0,
            min_polar: 0.0,
            max_polar: FRAC_PI_2,
        }
    }
}

impl OrbitSettings {
    /// Rejects empty clamp ranges and damping outside `(0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(ConfigurationError::InvalidOrbitSettings(
                "damping must be in (0, 1]",
            ));
        }
        if !(self.min_distance > 0.0
            && self.min_distance <= self.max_distance
            && self.max_distance.is_finite())
        {
            return Err(ConfigurationError::InvalidOrbitSettings(
                "distance range must satisfy 0 < min <= max",
            ));
        }
        if !(self.min_polar >= 0.0 && self.min_polar <= self.max_polar && self.max_polar <= PI) {
            return Err(ConfigurationError::InvalidOrbitSettings(
                "polar range must satisfy 0 <= min <= max <= pi",
            ));
        }
        if !self.target.iter().all(|v| v.is_finite()) {
            return Err(ConfigurationError::InvalidOrbitSettings(
                "target must be finite",
            ));
        }
        Ok(())
    }
}

/// Spherical coordinates about the target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spherical {
    /// Distance from the target.
    pub radius: f32,
    /// Polar angle from +Y.
    pub phi: f32,
    /// Azimuth about +Y, measured from +Z toward +X.
    pub theta: f32,
}

impl Spherical {
    /// Decomposes an offset from the target.
    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return Self {
                radius: 0.0,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            theta: offset.x.atan2(offset.z),
        }
    }

    /// Offset from the target.
    pub fn to_offset(self) -> Vec3 {
        let s = self.phi.sin() * self.radius;
        Vec3::new(
            s * self.theta.sin(),
            self.phi.cos() * self.radius,
            s * self.theta.cos(),
        )
    }
}

/// Orbit/pan/zoom around a target point with velocity damping.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitControls {
    settings: OrbitSettings,
    target: Vec3,
    d_theta: f32,
    d_phi: f32,
    d_zoom: f32,
    d_pan: Vec3,
}

impl OrbitControls {
    /// New controls with no pending motion.
    pub fn new(settings: OrbitSettings) -> Self {
        Self {
            target: Vec3::from_array(settings.target),
            settings,
            d_theta: 0.0,
            d_phi: 0.0,
            d_zoom: 0.0,
            d_pan: Vec3::ZERO,
        }
    }

    /// Current tunables.
    pub fn settings(&self) -> &OrbitSettings {
        &self.settings
    }

    /// Current orbit target (moves with panning).
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Adds azimuth velocity; positive orbits the camera to the left.
    pub fn rotate_left(&mut self, angle: f32) {
        self.d_theta -= angle;
    }

    /// Adds polar velocity; positive raises the camera.
    pub fn rotate_up(&mut self, angle: f32) {
        self.d_phi -= angle;
    }

    /// Adds zoom velocity in log-distance units; positive moves closer.
    pub fn dolly(&mut self, amount: f32) {
        self.d_zoom += amount;
    }

    /// Adds pan velocity along the camera's right/up axes, in world units.
    pub fn pan(&mut self, camera: &PerspectiveCamera, right: f32, up: f32) {
        let forward = camera.forward();
        let x_axis = forward.cross(camera.up).normalize_or_zero();
        let y_axis = x_axis.cross(forward).normalize_or_zero();
        self.d_pan += x_axis * right + y_axis * up;
    }

    /// `true` while any velocity is still decaying.
    pub fn is_moving(&self) -> bool {
        self.d_theta != 0.0 || self.d_phi != 0.0 || self.d_zoom != 0.0 || self.d_pan != Vec3::ZERO
    }

    /// Applies one damping step to `camera`. Call once per frame before the
    /// main render. Returns `true` if the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let s = &self.settings;
        let k = s.damping;

        self.target += self.d_pan * k;

        let mut sph = Spherical::from_offset(camera.position - self.target);
        sph.theta += self.d_theta * k;
        sph.phi += self.d_phi * k;
        sph.phi = sph
            .phi
            .clamp(s.min_polar.max(POLE_EPSILON), s.max_polar.max(POLE_EPSILON));
        sph.radius = (sph.radius * (-self.d_zoom * k).exp()).clamp(s.min_distance, s.max_distance);

        let position = self.target + sph.to_offset();
        let moved = position.distance(camera.position) > MOVE_EPSILON
            || camera.target != self.target;
        camera.position = position;
        camera.target = self.target;

        let decay = 1.0 - k;
        let settle = |v: f32| if (v * decay).abs() < REST_EPSILON { 0.0 } else { v * decay };
        self.d_theta = settle(self.d_theta);
        self.d_phi = settle(self.d_phi);
        self.d_zoom = settle(self.d_zoom);
        self.d_pan = if (self.d_pan * decay).length() < REST_EPSILON {
            Vec3::ZERO
        } else {
            self.d_pan * decay
        };
        moved
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(OrbitSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn spherical_round_trip() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let back = Spherical::from_offset(v).to_offset();
        assert_relative_eq!(back.x, v.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, v.y, epsilon = 1e-5);
        assert_relative_eq!(back.z, v.z, epsilon = 1e-5);
    }

    #[test]
    fn rotation_eases_out_over_frames() {
        let mut controls = OrbitControls::default();
        let mut cam = PerspectiveCamera::default();
        controls.update(&mut cam);
        controls.rotate_left(1.0);
        let mut steps = Vec::new();
        for _ in 0..5 {
            let before = Spherical::from_offset(cam.position - controls.target()).theta;
            controls.update(&mut cam);
            let after = Spherical::from_offset(cam.position - controls.target()).theta;
            steps.push((after - before).abs());
        }
        assert!(steps.windows(2).all(|w| w[1] < w[0]));
        assert!(controls.is_moving());
    }

    #[test]
    fn dolly_is_clamped_to_distance_range() {
        let mut controls = OrbitControls::default();
        let mut cam = PerspectiveCamera::default();
        controls.dolly(500.0);
        controls.update(&mut cam);
        assert_relative_eq!(cam.position.distance(controls.target()), 2.0, epsilon = 1e-4);
        controls.dolly(-5000.0);
        controls.update(&mut cam);
        assert_relative_eq!(cam.position.distance(controls.target()), 20.0, epsilon = 1e-3);
    }

    #[test]
    fn camera_never_dips_below_target() {
        let mut controls = OrbitControls::default();
        let mut cam = PerspectiveCamera::default();
        controls.rotate_up(-100.0);
        for _ in 0..10 {
            controls.update(&mut cam);
        }
        assert!(cam.position.y >= controls.target().y - 1e-4);
    }

    #[test]
    fn settles_to_rest() {
        let mut controls = OrbitControls::default();
        let mut cam = PerspectiveCamera::default();
        controls.rotate_left(0.1);
        for _ in 0..2000 {
            controls.update(&mut cam);
        }
        assert!(!controls.is_moving());
        assert!(!controls.update(&mut cam));
    }
}
