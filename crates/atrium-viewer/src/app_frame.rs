// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-frame tick and window-event handling for the App.

use crate::app::App;
use crate::input::{self, KeyAction};
use crate::render::Overlay;
use crate::ui::{self, HudView, UiEvent};
use atrium_core::{DriverState, RenderBackend, TickOutcome, Viewport as SurfaceSize};
use egui_winit::winit::event::WindowEvent;
use egui_winit::winit::event_loop::ActiveEventLoop;
use egui_winit::winit::window::WindowId;
use std::time::Instant;
use tracing::{error, info, warn};

impl App {
    pub fn handle_window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(vp) = self.viewport.as_mut() else {
            return;
        };
        if vp.window.id() != window_id {
            return;
        }
        let response = vp.egui_state.on_window_event(vp.window, &event);
        let running = vp.driver.state() == DriverState::Running;
        if response.repaint && !running {
            vp.window.request_redraw();
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.shutdown(event_loop);
                return;
            }
            WindowEvent::Resized(size) => {
                vp.driver.resize(size.width, size.height);
                if !running {
                    // The loop is not there to apply it; keep the HUD surface in step.
                    if let Ok(viewport) = SurfaceSize::new(size.width, size.height) {
                        if let Err(err) = vp.driver.backend_mut().resize(viewport) {
                            warn!(error = %err, "surface resize failed while stopped");
                        }
                    }
                }
                return;
            }
            WindowEvent::RedrawRequested => {
                self.frame();
                return;
            }
            _ => {}
        }

        if !response.consumed {
            match input::key_action(&event) {
                Some(KeyAction::ToggleHud) => {
                    let mut hud = self.prefs.hud;
                    hud.show_hud = !hud.show_hud;
                    self.apply_ui_event(UiEvent::UpdateHud(hud));
                }
                Some(KeyAction::Restart) => self.apply_ui_event(UiEvent::Restart),
                Some(KeyAction::Quit) => {
                    self.shutdown(event_loop);
                    return;
                }
                None => {}
            }
        }

        let wants_pointer = self.egui_ctx.wants_pointer_input();
        if let Some(gesture) = self.pointer.on_event(&event, wants_pointer) {
            if let Some(vp) = self.viewport.as_mut() {
                let height = vp.window.inner_size().height as f32;
                let camera = *vp.driver.camera();
                input::apply(vp.driver.controls_mut(), &camera, gesture, height);
            }
        }
    }

    /// Runs the HUD, applies its events, then hands the pending frame token
    /// to the driver. Without a token (loop stopped) only the HUD is drawn.
    pub fn frame(&mut self) {
        let now = Instant::now();
        let frame_ms = now.duration_since(self.last_frame).as_secs_f32() * 1000.0;
        self.last_frame = now;

        let events = self.run_hud();
        for ev in events {
            self.apply_ui_event(ev);
        }

        let Some(vp) = self.viewport.as_mut() else {
            return;
        };
        match vp.signal.take() {
            Some(token) => match vp.driver.on_frame(token) {
                Ok(TickOutcome::Rendered) => self.perf.push(frame_ms),
                Ok(TickOutcome::Ignored) => {}
                Err(err) => {
                    error!(error = %err, "frame loop stopped");
                    self.last_error = Some(err.to_string());
                    vp.window.request_redraw();
                }
            },
            None => {
                let background = vp.driver.scene().background();
                if let Err(err) = vp.driver.backend_mut().present_overlay(background) {
                    warn!(error = %err, "overlay present failed");
                }
            }
        }
    }

    fn run_hud(&mut self) -> Vec<UiEvent> {
        let Some(vp) = self.viewport.as_mut() else {
            return Vec::new();
        };
        let raw_input = vp.egui_state.take_egui_input(vp.window);
        let door = vp.driver.door().spec();
        let view = HudView {
            fps: self.perf.fps(),
            average_ms: self.perf.average_ms(),
            worst_ms: self.perf.worst_ms(),
            frames: vp.driver.frames_rendered(),
            captures: vp.driver.capture().generation(),
            state: vp.driver.state(),
            door: (door.width, door.height),
            hud: self.prefs.hud,
            error: self.last_error.as_deref(),
        };
        let mut events = Vec::new();
        let full_output = self
            .egui_ctx
            .run(raw_input, |ctx| ui::draw_hud(ctx, &view, &mut events));
        vp.egui_state
            .handle_platform_output(vp.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_desc = egui_wgpu::ScreenDescriptor {
            size_in_pixels: vp.driver.backend().surface_size(),
            pixels_per_point: vp.window.scale_factor() as f32,
        };
        vp.driver.backend_mut().set_overlay(Overlay {
            paint_jobs,
            textures_delta: full_output.textures_delta,
            screen_desc,
        });
        events
    }

    pub fn apply_ui_event(&mut self, ev: UiEvent) {
        let Some(vp) = self.viewport.as_mut() else {
            return;
        };
        match ev {
            UiEvent::SetDoorSize { width, height } => {
                match vp.driver.update_door_size(width, height) {
                    Ok(()) => self.prefs.scene.door = vp.driver.door().spec(),
                    Err(err) => {
                        warn!(error = %err, width, height, "door size rejected");
                        self.last_error = Some(err.to_string());
                    }
                }
            }
            UiEvent::UpdateHud(hud) => {
                if hud.vsync != self.prefs.hud.vsync {
                    vp.driver.backend_mut().set_vsync(hud.vsync);
                }
                self.prefs.hud = hud;
            }
            UiEvent::Restart => {
                self.last_error = None;
                self.perf.clear();
                match vp.driver.start() {
                    Ok(()) => info!("frame loop restarted"),
                    Err(err) => {
                        error!(error = %err, "restart failed");
                        self.last_error = Some(err.to_string());
                    }
                }
            }
            UiEvent::SavePrefs => match &self.config {
                Some(cfg) => cfg.save_prefs(&self.prefs),
                None => warn!("no config store; prefs not saved"),
            },
            UiEvent::DismissError => self.last_error = None,
        }
        vp.window.request_redraw();
    }
}
