// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Preference port used by the viewer, and its [`ConfigService`] adapter.

use crate::config::{ConfigService, ConfigStore};
use crate::prefs::ViewerPrefs;
use tracing::warn;

/// Store key for [`ViewerPrefs`].
pub const PREFS_KEY: &str = "viewer_prefs";

/// Load/save viewer preferences without surfacing storage errors.
pub trait ConfigPort {
    /// Stored prefs, seeding defaults on first run. Falls back to defaults
    /// when the stored document is unreadable or invalid.
    fn load_prefs(&self) -> ViewerPrefs;
    /// Persists prefs; failures are logged.
    fn save_prefs(&self, prefs: &ViewerPrefs);
}

/// [`ConfigPort`] backed by a [`ConfigService`].
#[derive(Debug, Clone)]
pub struct PrefsStore<S> {
    service: ConfigService<S>,
}

impl<S: ConfigStore> PrefsStore<S> {
    /// Wraps a store.
    pub fn new(store: S) -> Self {
        Self {
            service: ConfigService::new(store),
        }
    }

    /// Underlying service.
    pub fn service(&self) -> &ConfigService<S> {
        &self.service
    }
}

impl<S: ConfigStore> ConfigPort for PrefsStore<S> {
    fn load_prefs(&self) -> ViewerPrefs {
        let prefs = match self.service.load_or_seed::<ViewerPrefs>(PREFS_KEY) {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!(error = %err, "viewer prefs unreadable; using defaults");
                return ViewerPrefs::default();
            }
        };
        match prefs.validate() {
            Ok(()) => prefs,
            Err(err) => {
                warn!(error = %err, "viewer prefs invalid; using defaults");
                ViewerPrefs::default()
            }
        }
    }

    fn save_prefs(&self, prefs: &ViewerPrefs) {
        if let Err(err) = self.service.save(PREFS_KEY, prefs) {
            warn!(error = %err, "failed to save viewer prefs");
        }
    }
}
