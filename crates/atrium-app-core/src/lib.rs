// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Host-side services for Atrium: a config service over a storage port and
//! the persisted viewer preferences. Framework-agnostic; windowing and GPU
//! code stays in the viewer.
#![forbid(unsafe_code)]

pub mod config;
pub mod config_port;
pub mod prefs;

pub use config::{ConfigError, ConfigService, ConfigStore};
pub use config_port::{ConfigPort, PrefsStore, PREFS_KEY};
pub use prefs::{HudPrefs, ViewerPrefs};
