//! Error types for the engine
//!
//! Taxonomy: initialization failures (connect/readiness timeout, flag
//! source down) are fatal for the page load; DOM failures are contained at
//! the applicator boundary; tracking failures never surface here at all.
//! Nothing propagates far enough to crash a host page — the worst outcome
//! is the control experience.

use pagelab_dom::DomError;
use pagelab_flags::FlagError;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Flag source connection did not complete in time
    #[error("flag source connect timed out after {duration_secs}s")]
    ConnectTimeout { duration_secs: u64 },

    /// Flag source readiness did not arrive in time
    #[error("initialization timed out after {duration_secs}s")]
    InitTimeout { duration_secs: u64 },

    /// Flag source failure
    #[error("flag source error: {0}")]
    Flags(#[from] FlagError),

    /// DOM mutation failure, contained per applicator
    #[error("dom error: {0}")]
    Dom(#[from] DomError),
}

impl EngineError {
    /// Whether this error abandons the pipeline for the page load
    ///
    /// Fatal errors leave the page untouched (control experience). Non-fatal
    /// ones are isolated to a single applicator.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::ConnectTimeout { .. } | Self::InitTimeout { .. } => true,
            Self::Flags(e) => e.is_fatal(),
            Self::Dom(_) => false,
        }
    }
}
