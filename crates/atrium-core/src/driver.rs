// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Frame driver: the per-frame loop as an explicit state machine.
//!
//! ```text
//!            start()               stop() / backend error
//!  Stopped ----------> Running ------------------------> Stopped
//!     |                   |
//!     +---- dispose() ----+----> Disposed (terminal)
//! ```
//!
//! While running, exactly one [`FrameToken`] is outstanding. Each accepted
//! token runs one tick in a fixed order:
//!
//! 1. request the successor frame,
//! 2. apply the latest pending resize,
//! 3. update orbit controls,
//! 4. sample the clock once and animate the shapes,
//! 5. refresh the reflection capture (six faces),
//! 6. render the main surface.
//!
//! Tokens that are not the outstanding one, or that arrive while stopped or
//! disposed, are dropped without touching the backend.

use crate::backend::{RenderBackend, RenderTarget};
use crate::camera::{PerspectiveCamera, Viewport};
use crate::capture::ReflectionCapture;
use crate::clock::Clock;
use crate::config::SceneConfig;
use crate::controls::OrbitControls;
use crate::door::Door;
use crate::error::{ConfigurationError, FrameError, ResourceError};
use crate::lighting::LightingRig;
use crate::scene::Scene;
use crate::shapes::ReflectiveShapes;
use tracing::{debug, error, info, warn};

/// Ticket for one scheduled frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

impl FrameToken {
    /// Wraps a scheduler-assigned id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id.
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Source of frame callbacks (vsync, redraw requests, a test harness).
pub trait FrameScheduler {
    /// Asks for one future frame callback carrying the returned token.
    fn request_frame(&mut self) -> FrameToken;

    /// Withdraws a request. Cancelling an already delivered or unknown token
    /// is a no-op.
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    /// Idle; no frame requested.
    Stopped,
    /// A frame is outstanding and each tick schedules the next.
    Running,
    /// Terminal. Resources released.
    Disposed,
}

/// What [`FrameDriver::on_frame`] did with a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// A full tick ran.
    Rendered,
    /// The token was stale or the driver was not running.
    Ignored,
}

/// Owns the scene, camera and capture rig and advances them once per frame.
#[derive(Debug)]
pub struct FrameDriver<B, S, C> {
    backend: B,
    scheduler: S,
    clock: C,
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    capture: ReflectionCapture,
    viewport: Option<Viewport>,
    pending_resize: Option<Viewport>,
    pending_frame: Option<FrameToken>,
    state: DriverState,
    frames: u64,
}

impl<B, S, C> FrameDriver<B, S, C>
where
    B: RenderBackend,
    S: FrameScheduler,
    C: Clock,
{
    /// Builds the scene, allocates the capture target and binds it to the
    /// reflective materials. Starts in [`DriverState::Stopped`].
    pub fn new(
        config: &SceneConfig,
        mut backend: B,
        scheduler: S,
        clock: C,
    ) -> Result<Self, FrameError> {
        config.validate()?;
        let mut scene = Scene::new(config.scene_setup())?;
        let capture = ReflectionCapture::new(config.capture, &mut backend)?;
        if let Err(err) = capture.validate_placement(&scene) {
            backend.release_cube_target(capture.texture());
            return Err(err.into());
        }
        scene
            .shapes_mut()
            .bind_environment(capture.texture(), config.capture.intensity);
        scene.shapes_mut().animate(clock.elapsed_seconds());
        Ok(Self {
            backend,
            scheduler,
            clock,
            scene,
            camera: config.camera(),
            controls: OrbitControls::new(config.controls),
            capture,
            viewport: None,
            pending_resize: None,
            pending_frame: None,
            state: DriverState::Stopped,
            frames: 0,
        })
    }

    /// Begins the loop. No-op while running.
    pub fn start(&mut self) -> Result<(), FrameError> {
        match self.state {
            DriverState::Disposed => Err(FrameError::Disposed),
            DriverState::Running => Ok(()),
            DriverState::Stopped => {
                self.pending_frame = Some(self.scheduler.request_frame());
                self.state = DriverState::Running;
                info!("frame driver started");
                Ok(())
            }
        }
    }

    /// Cancels the outstanding frame. Idempotent.
    pub fn stop(&mut self) {
        if self.state != DriverState::Running {
            return;
        }
        if let Some(token) = self.pending_frame.take() {
            self.scheduler.cancel_frame(token);
        }
        self.state = DriverState::Stopped;
        info!(frames = self.frames, "frame driver stopped");
    }

    /// Stops and releases the capture target. Safe in any state; after this
    /// no render call is ever issued and `start` fails.
    pub fn dispose(&mut self) {
        if self.state == DriverState::Disposed {
            return;
        }
        self.stop();
        self.backend.release_cube_target(self.capture.texture());
        self.state = DriverState::Disposed;
        info!("frame driver disposed");
    }

    /// Runs one tick for `token` if it is the outstanding frame.
    ///
    /// On a backend failure the driver stops, the successor request is
    /// cancelled and the error is returned.
    pub fn on_frame(&mut self, token: FrameToken) -> Result<TickOutcome, FrameError> {
        if self.state != DriverState::Running || self.pending_frame != Some(token) {
            debug!(token = token.id(), state = ?self.state, "frame token ignored");
            return Ok(TickOutcome::Ignored);
        }
        let next = self.scheduler.request_frame();
        self.pending_frame = Some(next);
        match self.tick() {
            Ok(()) => {
                self.frames += 1;
                Ok(TickOutcome::Rendered)
            }
            Err(err) => {
                error!(error = %err, frame = self.frames, "render failed; stopping");
                self.scheduler.cancel_frame(next);
                self.pending_frame = None;
                self.state = DriverState::Stopped;
                Err(err.into())
            }
        }
    }

    fn tick(&mut self) -> Result<(), ResourceError> {
        if let Some(viewport) = self.pending_resize.take() {
            if let Err(err) = self.backend.resize(viewport) {
                // Kept for the first tick after a restart.
                self.pending_resize = self.pending_resize.or(Some(viewport));
                return Err(err);
            }
            self.camera.set_viewport(viewport);
            self.viewport = Some(viewport);
            debug!(
                width = viewport.width,
                height = viewport.height,
                "viewport applied"
            );
        }
        self.controls.update(&mut self.camera);
        let t = self.clock.elapsed_seconds();
        self.scene.shapes_mut().animate(t);
        self.capture.capture(&mut self.backend, &self.scene)?;
        self.backend
            .render(&self.scene, &self.camera, RenderTarget::Surface)
    }

    /// Queues a resize for the start of the next tick. Later calls replace
    /// earlier ones. Zero-area sizes are dropped.
    pub fn resize(&mut self, width: u32, height: u32) {
        match Viewport::new(width, height) {
            Ok(viewport) => self.pending_resize = Some(viewport),
            Err(_) => debug!(width, height, "zero-area resize ignored"),
        }
    }

    /// Rebuilds the door. Rejected sizes leave the current door in place.
    pub fn update_door_size(&mut self, width: f32, height: f32) -> Result<(), ConfigurationError> {
        let previous = self.scene.door().clone();
        if let Err(err) = self.scene.update_door_size(width, height) {
            warn!(width, height, "door size rejected");
            return Err(err);
        }
        if let Err(err) = self.capture.validate_placement(&self.scene) {
            warn!(width, height, "door would enclose the capture point");
            self.scene.restore_door(previous);
            return Err(err);
        }
        Ok(())
    }

    /// Orbit input sink.
    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    /// Orbit controls.
    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    /// The scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Main camera.
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// The door.
    pub fn door(&self) -> &Door {
        self.scene.door()
    }

    /// The reflective pair.
    pub fn shapes(&self) -> &ReflectiveShapes {
        self.scene.shapes()
    }

    /// Lights.
    pub fn lighting(&self) -> &LightingRig {
        self.scene.lighting()
    }

    /// Capture rig.
    pub fn capture(&self) -> &ReflectionCapture {
        &self.capture
    }

    /// Last applied viewport; `None` until the first resize lands.
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Lifecycle state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Outstanding frame, if running.
    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.pending_frame
    }

    /// Completed ticks.
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Render backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable render backend (e.g. for overlay passes).
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Frame scheduler.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Mutable clock, for seeking.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}
