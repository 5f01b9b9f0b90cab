// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Input handling: map winit mouse and keyboard events onto orbit control
//! input and viewer actions.

use atrium_core::{OrbitControls, PerspectiveCamera};
use egui_winit::winit::{
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};
use std::f32::consts::TAU;

/// Wheel notches to log-distance dolly.
const DOLLY_PER_NOTCH: f32 = 0.1;
/// Pixels per wheel notch for touchpads.
const PIXELS_PER_NOTCH: f32 = 50.0;

/// One gesture, in screen pixels or wheel notches.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OrbitInput {
    Rotate { dx: f32, dy: f32 },
    Pan { dx: f32, dy: f32 },
    Dolly(f32),
}

/// Keyboard shortcuts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    ToggleHud,
    Restart,
    Quit,
}

/// Drag state between cursor events.
#[derive(Debug, Default)]
pub struct PointerState {
    rotating: bool,
    panning: bool,
    last: Option<(f32, f32)>,
}

impl PointerState {
    /// Feeds a window event. `ui_wants_pointer` suppresses new drags and
    /// wheel input while the cursor is over the HUD.
    pub fn on_event(&mut self, event: &WindowEvent, ui_wants_pointer: bool) -> Option<OrbitInput> {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = *state == ElementState::Pressed;
                if pressed && ui_wants_pointer {
                    return None;
                }
                self.button(*button, pressed);
                None
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.moved(position.x as f32, position.y as f32)
            }
            WindowEvent::CursorLeft { .. } => {
                self.last = None;
                None
            }
            WindowEvent::MouseWheel { delta, .. } if !ui_wants_pointer => {
                Some(OrbitInput::Dolly(wheel_notches(*delta)))
            }
            _ => None,
        }
    }

    pub fn button(&mut self, button: MouseButton, pressed: bool) {
        match button {
            MouseButton::Left => self.rotating = pressed,
            MouseButton::Right | MouseButton::Middle => self.panning = pressed,
            _ => {}
        }
    }

    pub fn moved(&mut self, x: f32, y: f32) -> Option<OrbitInput> {
        let last = self.last.replace((x, y))?;
        let (dx, dy) = (x - last.0, y - last.1);
        if self.rotating {
            Some(OrbitInput::Rotate { dx, dy })
        } else if self.panning {
            Some(OrbitInput::Pan { dx, dy })
        } else {
            None
        }
    }
}

pub fn wheel_notches(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_NOTCH,
    }
}

/// Turns one gesture into control velocity. A drag across the full window
/// height orbits one full turn; panning keeps the target under the cursor.
pub fn apply(
    controls: &mut OrbitControls,
    camera: &PerspectiveCamera,
    input: OrbitInput,
    viewport_height: f32,
) {
    let h = viewport_height.max(1.0);
    match input {
        OrbitInput::Rotate { dx, dy } => {
            controls.rotate_left(TAU * dx / h);
            controls.rotate_up(TAU * dy / h);
        }
        OrbitInput::Pan { dx, dy } => {
            let distance = (camera.position - controls.target()).length();
            let world_per_pixel = 2.0 * distance * (camera.fov_y * 0.5).tan() / h;
            controls.pan(camera, -dx * world_per_pixel, dy * world_per_pixel);
        }
        OrbitInput::Dolly(notches) => controls.dolly(notches * DOLLY_PER_NOTCH),
    }
}

pub fn key_action(event: &WindowEvent) -> Option<KeyAction> {
    let WindowEvent::KeyboardInput { event, .. } = event else {
        return None;
    };
    if event.state != ElementState::Pressed || event.repeat {
        return None;
    }
    match event.physical_key {
        PhysicalKey::Code(KeyCode::KeyH) => Some(KeyAction::ToggleHud),
        PhysicalKey::Code(KeyCode::KeyR) => Some(KeyAction::Restart),
        PhysicalKey::Code(KeyCode::Escape) => Some(KeyAction::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use atrium_core::OrbitSettings;

    #[test]
    fn drag_needs_a_button_and_a_previous_position() {
        let mut pointer = PointerState::default();
        assert_eq!(pointer.moved(10.0, 10.0), None);
        pointer.button(MouseButton::Left, true);
        assert_eq!(
            pointer.moved(14.0, 7.0),
            Some(OrbitInput::Rotate { dx: 4.0, dy: -3.0 })
        );
        pointer.button(MouseButton::Left, false);
        pointer.button(MouseButton::Right, true);
        assert_eq!(
            pointer.moved(15.0, 7.0),
            Some(OrbitInput::Pan { dx: 1.0, dy: 0.0 })
        );
    }

    #[test]
    fn touchpad_pixels_scale_to_notches() {
        let delta = MouseScrollDelta::PixelDelta((0.0, 100.0).into());
        assert_relative_eq!(wheel_notches(delta), 2.0);
        assert_relative_eq!(wheel_notches(MouseScrollDelta::LineDelta(0.0, -1.0)), -1.0);
    }

    #[test]
    fn full_height_drag_orbits_one_turn() {
        let settings = OrbitSettings {
            damping: 1.0,
            ..OrbitSettings::default()
        };
        let mut camera = PerspectiveCamera {
            position: glam::Vec3::new(0.0, 1.0, 6.0),
            ..PerspectiveCamera::default()
        };
        let mut controls = OrbitControls::new(settings);
        apply(
            &mut controls,
            &camera,
            OrbitInput::Rotate { dx: 360.0, dy: 0.0 },
            720.0,
        );
        controls.update(&mut camera);
        // Half a turn around the target at (0, 1, 0).
        assert_relative_eq!(camera.position.z, -6.0, epsilon = 1e-4);
        assert_relative_eq!(camera.position.x, 0.0, epsilon = 1e-4);
    }
}
