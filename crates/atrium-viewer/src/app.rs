// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Viewer application state and winit integration.

use crate::gpu::Gpu;
use crate::input::PointerState;
use crate::perf::PerfStats;
use crate::render::WgpuBackend;
use crate::render_port::WinitFrameScheduler;
use crate::viewport::Viewport;
use anyhow::{Context, Result};
use atrium_app_core::{ConfigPort, ViewerPrefs};
use atrium_core::{FrameDriver, WallClock};
use egui_winit::winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    window::{Window, WindowAttributes},
};
use egui_winit::State as EguiWinitState;
use std::time::Instant;
use tracing::{error, info};

pub struct App {
    pub viewport: Option<Viewport>,
    pub egui_ctx: egui::Context,
    pub config: Option<Box<dyn ConfigPort>>,
    pub prefs: ViewerPrefs,
    pub perf: PerfStats,
    pub pointer: PointerState,
    /// Message shown in the error panel after the loop stopped.
    pub last_error: Option<String>,
    pub last_frame: Instant,
    fatal: Option<anyhow::Error>,
}

impl App {
    pub fn new(prefs: ViewerPrefs, config: Option<Box<dyn ConfigPort>>) -> Self {
        Self {
            viewport: None,
            egui_ctx: egui::Context::default(),
            config,
            prefs,
            perf: PerfStats::default(),
            pointer: PointerState::default(),
            last_error: None,
            last_frame: Instant::now(),
            fatal: None,
        }
    }

    /// Startup failure that ended the event loop, if any.
    pub fn into_result(self) -> Result<()> {
        match self.fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn open_viewport(&self, event_loop: &ActiveEventLoop) -> Result<Viewport> {
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title("Atrium")
                    .with_inner_size(LogicalSize::new(1280.0, 720.0))
                    .with_visible(true),
            )
            .context("create window")?;
        let window: &'static Window = Box::leak(Box::new(window));
        let gpu = pollster::block_on(Gpu::new(window, self.prefs.hud.vsync))?;
        let scheduler = WinitFrameScheduler::new(window);
        let signal = scheduler.signal();
        let mut driver = FrameDriver::new(
            &self.prefs.scene,
            WgpuBackend::new(gpu),
            scheduler,
            WallClock::new(),
        )
        .context("build scene")?;
        let size = window.inner_size();
        driver.resize(size.width, size.height);
        driver.start()?;
        let egui_state = EguiWinitState::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            event_loop,
            None,
            None,
            None,
        );
        info!(
            width = size.width,
            height = size.height,
            resolution = self.prefs.scene.capture.resolution,
            "viewer started"
        );
        Ok(Viewport {
            window,
            driver,
            egui_state,
            signal,
        })
    }

    /// Persists prefs, disposes the driver and leaves the event loop.
    pub fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(cfg) = &self.config {
            cfg.save_prefs(&self.prefs);
        }
        if let Some(vp) = self.viewport.as_mut() {
            vp.driver.dispose();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewport.is_some() {
            return;
        }
        match self.open_viewport(event_loop) {
            Ok(vp) => self.viewport = Some(vp),
            Err(err) => {
                error!(error = %format!("{err:#}"), "viewer failed to start");
                self.fatal = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: egui_winit::winit::window::WindowId,
        event: WindowEvent,
    ) {
        self.handle_window_event(event_loop, window_id, event);
    }
}
