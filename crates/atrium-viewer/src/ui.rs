// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stateless egui helpers for the HUD. Drawing emits [`UiEvent`]s; the app
//! applies them after the pass.

use atrium_app_core::HudPrefs;
use atrium_core::DriverState;
use egui::{self, Context};

/// Door slider bounds, world units.
pub const DOOR_WIDTH_RANGE: std::ops::RangeInclusive<f32> = 0.3..=3.0;
pub const DOOR_HEIGHT_RANGE: std::ops::RangeInclusive<f32> = 0.5..=4.0;

#[derive(Clone, Debug, PartialEq)]
pub enum UiEvent {
    SetDoorSize { width: f32, height: f32 },
    UpdateHud(HudPrefs),
    Restart,
    SavePrefs,
    DismissError,
}

/// Snapshot of what the HUD shows this frame.
pub struct HudView<'a> {
    pub fps: f32,
    pub average_ms: f32,
    pub worst_ms: f32,
    pub frames: u64,
    pub captures: u64,
    pub state: DriverState,
    pub door: (f32, f32),
    pub hud: HudPrefs,
    pub error: Option<&'a str>,
}

pub fn draw_hud(ctx: &Context, view: &HudView<'_>, events: &mut Vec<UiEvent>) {
    if let Some(msg) = view.error {
        draw_error_panel(ctx, msg, events);
    }
    if !view.hud.show_hud {
        return;
    }
    egui::Window::new("Atrium")
        .default_pos(egui::pos2(12.0, 12.0))
        .resizable(false)
        .show(ctx, |ui| {
            if view.hud.show_frame_stats {
                ui.label(format!(
                    "{:.0} fps  {:.2} ms avg  {:.2} ms worst",
                    view.fps, view.average_ms, view.worst_ms
                ));
                ui.label(format!(
                    "frames {}  captures {}  {:?}",
                    view.frames, view.captures, view.state
                ));
                ui.separator();
            }
            if view.hud.show_door_controls {
                let (mut width, mut height) = view.door;
                let changed = ui
                    .add(egui::Slider::new(&mut width, DOOR_WIDTH_RANGE).text("door width"))
                    .changed()
                    | ui.add(egui::Slider::new(&mut height, DOOR_HEIGHT_RANGE).text("door height"))
                        .changed();
                if changed {
                    events.push(UiEvent::SetDoorSize { width, height });
                }
                ui.separator();
            }
            let mut hud = view.hud;
            ui.checkbox(&mut hud.show_frame_stats, "frame stats");
            ui.checkbox(&mut hud.show_door_controls, "door controls");
            ui.checkbox(&mut hud.vsync, "vsync");
            if hud != view.hud {
                events.push(UiEvent::UpdateHud(hud));
            }
            ui.horizontal(|ui| {
                if ui.button("Save prefs").clicked() {
                    events.push(UiEvent::SavePrefs);
                }
                if view.state == DriverState::Stopped && ui.button("Restart").clicked() {
                    events.push(UiEvent::Restart);
                }
            });
            ui.small("drag: orbit  right-drag: pan  wheel: dolly  H: hide");
        });
}

fn draw_error_panel(ctx: &Context, msg: &str, events: &mut Vec<UiEvent>) {
    egui::Window::new("Rendering stopped")
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.colored_label(egui::Color32::from_rgb(230, 90, 80), msg);
            ui.horizontal(|ui| {
                if ui.button("Restart").clicked() {
                    events.push(UiEvent::Restart);
                }
                if ui.button("Dismiss").clicked() {
                    events.push(UiEvent::DismissError);
                }
            });
        });
}
