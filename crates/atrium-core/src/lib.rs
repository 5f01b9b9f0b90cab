// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! atrium-core: a procedural door scene with live cube-map reflections.
//!
//! The crate owns the scene model and the per-frame loop; it never touches a
//! GPU or a window. Hosts plug in three ports:
//!
//! - [`RenderBackend`] draws a [`Scene`] into the surface or a cube face,
//! - [`FrameScheduler`] delivers frame callbacks as [`FrameToken`]s,
//! - [`Clock`] supplies the animation time.
//!
//! [`FrameDriver`] ties them together: each accepted token updates the orbit
//! camera, animates the reflective shapes, refreshes the six-face reflection
//! capture and then renders the main view.
#![forbid(unsafe_code)]

pub mod backend;
/// Axis-aligned bounds.
pub mod bounds;
pub mod camera;
pub mod capture;
pub mod clock;
pub mod config;
pub mod controls;
pub mod door;
pub mod driver;
pub mod error;
pub mod lighting;
pub mod node;
pub mod scene;
pub mod shapes;
/// Local transforms.
pub mod transform;

pub use backend::{CubeFace, RenderBackend, RenderTarget};
pub use bounds::Aabb;
pub use camera::{PerspectiveCamera, Viewport};
pub use capture::{CaptureSettings, ReflectionCapture};
pub use clock::{Clock, ManualClock, WallClock};
pub use config::{CameraSettings, SceneConfig};
pub use controls::{OrbitControls, OrbitSettings};
pub use door::{Door, DoorLayout, DoorSpec};
pub use driver::{DriverState, FrameDriver, FrameScheduler, FrameToken, TickOutcome};
pub use error::{ConfigurationError, FrameError, ResourceError};
pub use lighting::LightingRig;
pub use node::{Color, Geometry, Material, Mesh, Node, NodeKind, TextureHandle};
pub use scene::{DrawItem, Scene, SceneSetup};
pub use shapes::{ReflectiveShapes, ShapeSetup};
pub use transform::Transform;
