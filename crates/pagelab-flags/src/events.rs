//! Outbound analytics channel
//!
//! View and conversion events leave the engine through an [`EventSink`].
//! The stock sink forwards to the flag source's `track` call. Emission is
//! fire-and-forget for callers: a failed emit is logged here and must never
//! roll back or block the DOM mutation it describes.

use crate::error::FlagError;
use crate::source::FlagSource;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// A structured analytics event: name plus contextual payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEvent {
    /// Event name (e.g. `cta-button-view`)
    pub name: String,
    /// JSON payload with test name, variation, and state transition
    pub payload: Value,
}

impl PageEvent {
    /// Create an event
    #[inline]
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Destination for page events
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Forward one event; errors are informational only
    async fn emit(&self, event: PageEvent) -> Result<(), FlagError>;
}

/// Sink forwarding events to a flag source's analytics channel
pub struct FlagSourceSink {
    source: Arc<dyn FlagSource>,
}

impl FlagSourceSink {
    /// Create a sink over a source
    #[inline]
    #[must_use]
    pub fn new(source: Arc<dyn FlagSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl EventSink for FlagSourceSink {
    async fn emit(&self, event: PageEvent) -> Result<(), FlagError> {
        match self.source.track(&event.name, event.payload).await {
            Ok(()) => {
                tracing::debug!(event = %event.name, "event emitted");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(event = %event.name, error = %e, "event emission failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalFlagSource;

    #[tokio::test]
    async fn sink_forwards_to_track() {
        let source = Arc::new(LocalFlagSource::new());
        let sink = FlagSourceSink::new(source.clone());

        sink.emit(PageEvent::new(
            "banner-message-view",
            serde_json::json!({"variation": "B"}),
        ))
        .await
        .unwrap();

        let tracked = source.tracked();
        assert_eq!(tracked.len(), 1);
        assert_eq!(tracked[0].name, "banner-message-view");
    }

    #[tokio::test]
    async fn sink_surfaces_but_does_not_panic_on_failure() {
        let source = Arc::new(LocalFlagSource::new());
        source.fail_tracking(true);
        let sink = FlagSourceSink::new(source);

        let result = sink
            .emit(PageEvent::new("cta-button-view", serde_json::json!({})))
            .await;
        assert!(matches!(result, Err(FlagError::Track(_))));
    }
}
