//! Synchronizer Configuration
//!
//! Hosts usually keep this next to their other editor settings and load it
//! from JSON. Every field has a default, so an empty object is valid.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Behavior switches for the [`Synchronizer`](crate::sync::Synchronizer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Run an update even when a connect/disconnect event was dropped
    /// because one of its endpoints is not mirrored.
    pub update_on_unresolved_connection: bool,

    /// Ask the preview builder for a new artifact after every update.
    /// Turn off for headless batch evaluation.
    pub rebuild_preview: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            update_on_unresolved_connection: true,
            rebuild_preview: true,
        }
    }
}

impl SyncConfig {
    /// Parse a config from JSON. Missing fields fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the config to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = SyncConfig::from_json("{}").unwrap();
        assert_eq!(config, SyncConfig::default());
        assert!(config.update_on_unresolved_connection);
        assert!(config.rebuild_preview);
    }

    #[test]
    fn partial_override() {
        let config = SyncConfig::from_json(r#"{"rebuild_preview": false}"#).unwrap();
        assert!(!config.rebuild_preview);
        assert!(config.update_on_unresolved_connection);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = SyncConfig::from_json("{not json").unwrap_err();
        assert!(err.to_string().starts_with("invalid sync config"));
    }

    #[test]
    fn survives_json_round_trip() {
        let config = SyncConfig {
            update_on_unresolved_connection: false,
            rebuild_preview: true,
        };
        let json = config.to_json().unwrap();
        assert_eq!(SyncConfig::from_json(&json).unwrap(), config);
    }
}
