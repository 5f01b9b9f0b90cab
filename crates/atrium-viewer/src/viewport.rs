// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bundle of window, frame driver and egui state for the single viewport.

use crate::render::WgpuBackend;
use crate::render_port::{FrameSignal, WinitFrameScheduler};
use atrium_core::{FrameDriver, WallClock};
use egui_winit::winit::window::Window;
use egui_winit::State as EguiWinitState;

/// Driver wired to the GPU backend and the window's redraw loop.
pub type ViewerDriver = FrameDriver<WgpuBackend, WinitFrameScheduler, WallClock>;

pub struct Viewport {
    pub window: &'static Window,
    pub driver: ViewerDriver,
    pub egui_state: EguiWinitState,
    pub signal: FrameSignal,
}
