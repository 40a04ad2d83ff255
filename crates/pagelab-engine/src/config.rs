//! Engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine configuration
///
/// Deserializable from host config; every knob also has a `with_*` builder
/// for embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds to wait for the flag source connection
    pub connect_timeout_secs: u64,
    /// Seconds to wait for the flag source readiness signal
    pub ready_timeout_secs: u64,
    /// Page paths the pipeline activates on; everything else is a no-op
    pub allowed_paths: Vec<String>,
    /// Visual-editor preview: disables all mutation and tracking
    pub preview_mode: bool,
}

impl EngineConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connect timeout
    #[inline]
    #[must_use]
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Set the readiness timeout
    #[inline]
    #[must_use]
    pub fn with_ready_timeout_secs(mut self, secs: u64) -> Self {
        self.ready_timeout_secs = secs;
        self
    }

    /// Replace the page allowlist
    #[must_use]
    pub fn with_allowed_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Set preview mode
    #[inline]
    #[must_use]
    pub fn with_preview_mode(mut self, preview: bool) -> Self {
        self.preview_mode = preview;
        self
    }

    /// Connect timeout as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Readiness timeout as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            ready_timeout_secs: 5,
            allowed_paths: vec!["/chargeperks".to_string(), "/drivers".to_string()],
            preview_mode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_observed_system() {
        let config = EngineConfig::new();
        assert_eq!(config.ready_timeout_secs, 5);
        assert_eq!(config.allowed_paths, vec!["/chargeperks", "/drivers"]);
        assert!(!config.preview_mode);
    }

    #[test]
    fn builders_compose() {
        let config = EngineConfig::new()
            .with_ready_timeout_secs(2)
            .with_allowed_paths(["/drivers"])
            .with_preview_mode(true);
        assert_eq!(config.ready_timeout(), Duration::from_secs(2));
        assert_eq!(config.allowed_paths, vec!["/drivers"]);
        assert!(config.preview_mode);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = EngineConfig::new().with_connect_timeout_secs(3);
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.connect_timeout_secs, 3);
    }
}
