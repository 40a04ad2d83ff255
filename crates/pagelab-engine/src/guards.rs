//! Activation guards
//!
//! Policy is decided once, up front; applicators and the click tracker
//! never re-check it. Two gates: the page-path allowlist and the
//! visual-editor preview predicate. Preview is a full no-op path — no
//! mutation and no tracking, not just suppressed analytics.

use crate::config::EngineConfig;

/// Outcome of the activation check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Pipeline may run
    Active,
    /// Current path is not on the allowlist
    PathNotAllowed(String),
    /// Visual-editor preview; everything stays untouched
    PreviewMode,
}

impl Activation {
    /// Whether the pipeline may run
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Evaluates whether the pipeline activates for the current page
#[derive(Debug, Clone)]
pub struct ActivationGuard {
    allowed_paths: Vec<String>,
    preview_mode: bool,
}

impl ActivationGuard {
    /// Build from engine configuration
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            allowed_paths: config.allowed_paths.clone(),
            preview_mode: config.preview_mode,
        }
    }

    /// Evaluate for a page path
    #[must_use]
    pub fn evaluate(&self, path: &str) -> Activation {
        if self.preview_mode {
            return Activation::PreviewMode;
        }
        if self.allowed_paths.iter().any(|allowed| allowed == path) {
            Activation::Active
        } else {
            Activation::PathNotAllowed(path.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlisted_paths_activate() {
        let guard = ActivationGuard::from_config(&EngineConfig::new());
        assert!(guard.evaluate("/chargeperks").is_active());
        assert!(guard.evaluate("/drivers").is_active());
    }

    #[test]
    fn other_paths_do_not() {
        let guard = ActivationGuard::from_config(&EngineConfig::new());
        assert_eq!(
            guard.evaluate("/about"),
            Activation::PathNotAllowed("/about".to_string())
        );
    }

    #[test]
    fn preview_wins_over_the_allowlist() {
        let config = EngineConfig::new().with_preview_mode(true);
        let guard = ActivationGuard::from_config(&config);
        assert_eq!(guard.evaluate("/chargeperks"), Activation::PreviewMode);
    }
}
