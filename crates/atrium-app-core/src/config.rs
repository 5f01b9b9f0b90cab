// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Keyed JSON config service over a pluggable byte store.

use atrium_core::ConfigurationError;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Byte storage for config documents, addressed by logical key.
pub trait ConfigStore {
    /// Reads the blob for `key`; [`ConfigError::NotFound`] when absent.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Writes the blob for `key`, replacing any previous one.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Config load/save failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No document stored under the key.
    #[error("not found")]
    NotFound,
    /// Storage I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The document is not valid JSON for the requested type.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The document parsed but describes an unusable scene.
    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigurationError),
    /// Anything else a store wants to report.
    #[error("other: {0}")]
    Other(String),
}

/// Serializes values to pretty JSON and hands the bytes to a [`ConfigStore`].
#[derive(Debug, Clone)]
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Unwraps the store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Loads `key`. Missing or empty documents give `Ok(None)`.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        match self.store.load_raw(key) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Stores `value` under `key`.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)?;
        debug!(key, bytes = data.len(), "config saved");
        Ok(())
    }

    /// Loads `key`, writing `T::default()` first if nothing is stored yet.
    pub fn load_or_seed<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Serialize + Default,
    {
        if let Some(value) = self.load(key)? {
            return Ok(value);
        }
        let value = T::default();
        self.save(key, &value)?;
        info!(key, "seeded default config");
        Ok(value)
    }
}
