// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for the scene core.
//!
//! - [`ConfigurationError`]: invalid parameters, rejected at construction or
//!   update time. Values are never clamped into range.
//! - [`ResourceError`]: the render backend or its surface is gone. The frame
//!   driver stops and hands the error to the host. A resize that failed
//!   is re-applied on the first tick after a restart.
//! - [`FrameError`]: what the host sees from driver calls.

use thiserror::Error;

/// Rejected parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// Door width and height must both be finite and strictly positive.
    #[error("invalid door size {width}x{height}: both dimensions must be finite and > 0")]
    InvalidDoorSize {
        /// Requested width.
        width: f32,
        /// Requested height.
        height: f32,
    },
    /// Cube capture resolution must be at least one texel per face edge.
    #[error("invalid capture resolution {0}: must be > 0")]
    InvalidCaptureResolution(u32),
    /// Near/far clip planes must satisfy `0 < near < far`.
    #[error("invalid clip planes near={near} far={far}")]
    InvalidClipPlanes {
        /// Near plane distance.
        near: f32,
        /// Far plane distance.
        far: f32,
    },
    /// Vertical field of view must lie strictly between 0 and 180 degrees.
    #[error("invalid field of view {0} degrees: must be in (0, 180)")]
    InvalidFieldOfView(f32),
    /// The capture position sits inside opaque geometry and would only see
    /// that geometry's interior.
    #[error("capture position {position:?} is enclosed by `{node}`")]
    CaptureEnclosed {
        /// World-space capture position.
        position: [f32; 3],
        /// Name of the enclosing node.
        node: String,
    },
    /// Orbit limits are empty or the damping factor is outside `(0, 1]`.
    #[error("invalid orbit settings: {0}")]
    InvalidOrbitSettings(&'static str),
    /// Viewport dimensions must be non-zero.
    #[error("invalid viewport {width}x{height}")]
    InvalidViewport {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
}

/// Failures reported by a render backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// The presentation surface was lost and could not be reacquired.
    #[error("render surface lost")]
    SurfaceLost,
    /// The device ran out of memory.
    #[error("render device out of memory")]
    OutOfMemory,
    /// A texture handle was used that the backend never created.
    #[error("unknown texture handle {0}")]
    UnknownTexture(u64),
    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by [`crate::driver::FrameDriver`] to the host.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    /// A backend failure stopped the frame loop.
    #[error(transparent)]
    Resource(#[from] ResourceError),
    /// Rejected parameters.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// The driver was disposed and cannot be restarted.
    #[error("frame driver disposed")]
    Disposed,
}
