// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for Atrium crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`backend`] - Recording render backend with failure injection
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`scheduler`] - Hand-cranked frame scheduler
//! - [`fixtures`] - Driver construction helpers

pub mod backend;
pub mod config;
pub mod fixtures;
pub mod scheduler;

pub use backend::{BackendCall, RecordingBackend, RenderCall};
pub use config::InMemoryConfigStore;
pub use fixtures::{default_driver, driver_with, pump, TestDriver};
pub use scheduler::ManualScheduler;
