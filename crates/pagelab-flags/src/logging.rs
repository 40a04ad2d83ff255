//! Structured logging around a flag source
//!
//! Composed once at construction instead of patching client methods after
//! the fact. The decorator implements [`FlagSource`] itself, so everything
//! downstream takes the same trait object either way.

use crate::error::FlagError;
use crate::snapshot::FlagSnapshot;
use crate::source::{FlagChange, FlagSource};
use crate::variation::{FlagKey, Variation};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Decorator that logs every lookup and track call on the wrapped source
pub struct LoggingFlagSource<S> {
    inner: S,
}

impl<S: FlagSource> LoggingFlagSource<S> {
    /// Wrap a source
    #[inline]
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// The wrapped source
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: FlagSource> FlagSource for LoggingFlagSource<S> {
    async fn connect(&self) -> Result<(), FlagError> {
        tracing::info!("connecting flag source");
        match self.inner.connect().await {
            Ok(()) => {
                tracing::info!("flag source connected");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "flag source connection failed");
                Err(e)
            }
        }
    }

    async fn wait_ready(&self) -> Result<(), FlagError> {
        let result = self.inner.wait_ready().await;
        match &result {
            Ok(()) => tracing::info!("flag source ready"),
            Err(e) => tracing::error!(error = %e, "flag source readiness failed"),
        }
        result
    }

    fn subscribe(&self) -> broadcast::Receiver<FlagChange> {
        self.inner.subscribe()
    }

    fn snapshot(&self) -> FlagSnapshot {
        let snapshot = self.inner.snapshot();
        tracing::debug!(flags = snapshot.len(), "snapshot taken");
        snapshot
    }

    fn variation(&self, key: &FlagKey, default: &Variation) -> Variation {
        let value = self.inner.variation(key, default);
        tracing::debug!(%key, %default, resolved = %value, "variation lookup");
        value
    }

    async fn track(&self, event: &str, payload: serde_json::Value) -> Result<(), FlagError> {
        match self.inner.track(event, payload).await {
            Ok(()) => {
                tracing::debug!(event, "tracked");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(event, error = %e, "track failed");
                Err(e)
            }
        }
    }
}
