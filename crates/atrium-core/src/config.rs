// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Serializable scene configuration.
//!
//! Every field has a default, so a partial document (or `{}`) deserializes
//! to a working scene. Parsing never validates; call
//! [`SceneConfig::validate`] before use.

use crate::camera::PerspectiveCamera;
use crate::capture::{validate_clip_planes, CaptureSettings};
use crate::controls::OrbitSettings;
use crate::door::DoorSpec;
use crate::error::ConfigurationError;
use crate::scene::SceneSetup;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Main camera parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Initial eye position.
    pub position: [f32; 3],
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: [0.0, 2.0, 6.0],
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraSettings {
    /// Rejects a degenerate projection.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let fov = self.fov_y_degrees;
        if !(fov.is_finite() && fov > 0.0 && fov < 180.0) {
            return Err(ConfigurationError::InvalidFieldOfView(fov));
        }
        validate_clip_planes(self.near, self.far)
    }
}

/// Everything needed to stand up a scene and its driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Initial door size.
    pub door: DoorSpec,
    /// Reflection capture rig.
    pub capture: CaptureSettings,
    /// Main camera.
    pub camera: CameraSettings,
    /// Orbit controls.
    pub controls: OrbitSettings,
}

impl SceneConfig {
    /// Applies the same checks the runtime API applies.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.door.validate()?;
        self.capture.validate()?;
        self.camera.validate()?;
        self.controls.validate()
    }

    /// Scene construction parameters with this config's door.
    pub fn scene_setup(&self) -> SceneSetup {
        SceneSetup {
            door: self.door,
            ..SceneSetup::default()
        }
    }

    /// Main camera looking at the orbit target.
    pub fn camera(&self) -> PerspectiveCamera {
        PerspectiveCamera {
            position: Vec3::from_array(self.camera.position),
            target: Vec3::from_array(self.controls.target),
            fov_y: self.camera.fov_y_degrees.to_radians(),
            near: self.camera.near,
            far: self.camera.far,
            ..PerspectiveCamera::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg: SceneConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, SceneConfig::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_door_section_keeps_other_defaults() {
        let cfg: SceneConfig =
            serde_json::from_str(r#"{"door":{"width":2.0,"height":3.0}}"#).unwrap();
        assert_eq!(cfg.door, DoorSpec::new(2.0, 3.0).unwrap());
        assert_eq!(cfg.capture, CaptureSettings::default());
    }

    #[test]
    fn default_camera_matches_runtime_default() {
        let cam = SceneConfig::default().camera();
        assert_eq!(cam, PerspectiveCamera::default());
    }
}
