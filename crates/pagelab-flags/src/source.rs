//! The flag source trait
//!
//! Shape of the external experimentation service, reduced to what the
//! engine needs: connect, one readiness signal, a change stream, snapshot
//! or single-flag reads, and a fire-and-forget track call.

use crate::error::FlagError;
use crate::snapshot::FlagSnapshot;
use crate::variation::{FlagKey, Variation};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// One flag update, fanned out to subscribers
#[derive(Debug, Clone)]
pub struct FlagChange {
    /// Which experiment changed
    pub key: FlagKey,
    /// Its new value
    pub variation: Variation,
}

/// An asynchronous key/value store of experiment variations
///
/// Implementations own their transport entirely. The engine only assumes:
/// readiness fires once, changes fire per update after readiness, snapshots
/// are atomic, and `track` may fail without consequence for the page.
#[async_trait]
pub trait FlagSource: Send + Sync {
    /// Establish the connection (e.g. load the vendor client)
    ///
    /// Default is an immediate success for sources with nothing to set up.
    async fn connect(&self) -> Result<(), FlagError> {
        Ok(())
    }

    /// Resolve once the source has its first full flag set
    async fn wait_ready(&self) -> Result<(), FlagError>;

    /// Subscribe to flag updates arriving after readiness
    fn subscribe(&self) -> broadcast::Receiver<FlagChange>;

    /// Atomic view of all current flags
    fn snapshot(&self) -> FlagSnapshot;

    /// Current value for one key, falling back to the given default
    fn variation(&self, key: &FlagKey, default: &Variation) -> Variation;

    /// Send an analytics event; fire-and-forget from the caller's view
    async fn track(&self, event: &str, payload: serde_json::Value) -> Result<(), FlagError>;
}
