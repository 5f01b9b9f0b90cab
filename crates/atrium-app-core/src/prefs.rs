// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted viewer preferences: the scene config plus HUD toggles.

use atrium_core::{ConfigurationError, SceneConfig};
use serde::{Deserialize, Serialize};

/// Everything the viewer remembers between runs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerPrefs {
    /// Door, capture, camera and orbit settings.
    pub scene: SceneConfig,
    /// Overlay and presentation toggles.
    pub hud: HudPrefs,
}

impl ViewerPrefs {
    /// Validates the scene section. HUD toggles cannot be invalid.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.scene.validate()
    }
}

/// HUD and presentation toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudPrefs {
    /// Draw the egui overlay at all.
    pub show_hud: bool,
    /// Frame time readout.
    pub show_frame_stats: bool,
    /// Door size sliders.
    pub show_door_controls: bool,
    /// Present with vsync.
    pub vsync: bool,
}

impl Default for HudPrefs {
    fn default() -> Self {
        Self {
            show_hud: true,
            show_frame_stats: true,
            show_door_controls: true,
            vsync: true,
        }
    }
}
