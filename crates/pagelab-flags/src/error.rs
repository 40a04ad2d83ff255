//! Error types for the flag boundary
//!
//! The split that matters downstream: connection and readiness failures are
//! fatal for the page load (the control experience stands), tracking
//! failures never are.

/// Errors reported by flag sources and the analytics channel
#[derive(Debug, thiserror::Error)]
pub enum FlagError {
    /// Connection to the flag service could not be established
    #[error("flag source connection failed: {0}")]
    ConnectFailed(String),

    /// A lookup or subscription was attempted before readiness
    #[error("flag source not ready")]
    NotReady,

    /// The source shut down; no further changes will arrive
    #[error("flag source closed")]
    Closed,

    /// An analytics track call failed
    #[error("track call failed: {0}")]
    Track(String),
}

impl FlagError {
    /// Whether this error ends initialization for the page load
    ///
    /// Tracking failures are logged and swallowed; everything else means the
    /// pipeline cannot run and the page keeps its default content.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Track(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_failures_are_not_fatal() {
        assert!(!FlagError::Track("offline".into()).is_fatal());
        assert!(FlagError::ConnectFailed("dns".into()).is_fatal());
        assert!(FlagError::NotReady.is_fatal());
        assert!(FlagError::Closed.is_fatal());
    }
}
