//! In-process flag source
//!
//! Serves flags from a plain table with readiness and change fan-out over
//! tokio channels. Used by embedders that resolve flags themselves (e.g.
//! server-side bucketing) and by every test in the workspace. Tracked
//! events are recorded for inspection, and tracking can be made to fail for
//! fault injection.

use crate::error::FlagError;
use crate::snapshot::FlagSnapshot;
use crate::source::{FlagChange, FlagSource};
use crate::variation::{FlagKey, Variation};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, watch};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// An analytics event recorded by [`LocalFlagSource`]
#[derive(Debug, Clone)]
pub struct TrackedEvent {
    /// Event name
    pub name: String,
    /// Contextual payload
    pub payload: serde_json::Value,
}

/// Flag source backed by an in-memory table
pub struct LocalFlagSource {
    flags: RwLock<HashMap<FlagKey, Variation>>,
    ready_tx: watch::Sender<bool>,
    changes_tx: broadcast::Sender<FlagChange>,
    tracked: Mutex<Vec<TrackedEvent>>,
    fail_tracking: AtomicBool,
}

impl LocalFlagSource {
    /// Create an empty, not-yet-ready source
    #[must_use]
    pub fn new() -> Self {
        let (ready_tx, _) = watch::channel(false);
        let (changes_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            flags: RwLock::new(HashMap::new()),
            ready_tx,
            changes_tx,
            tracked: Mutex::new(Vec::new()),
            fail_tracking: AtomicBool::new(false),
        }
    }

    /// Create a source that is immediately ready with the given flags
    #[must_use]
    pub fn ready_with(snapshot: FlagSnapshot) -> Self {
        let source = Self::new();
        {
            let mut flags = source.flags.write();
            for (key, variation) in snapshot.iter() {
                flags.insert(key.clone(), variation.clone());
            }
        }
        source.mark_ready();
        source
    }

    /// Signal readiness; idempotent
    pub fn mark_ready(&self) {
        let _ = self.ready_tx.send_replace(true);
    }

    /// Set one flag and notify subscribers
    pub fn set(&self, key: impl Into<FlagKey>, value: impl Into<Variation>) {
        let key = key.into();
        let variation = value.into();
        self.flags.write().insert(key.clone(), variation.clone());
        // Nobody subscribed yet is fine; send just reports zero receivers.
        let _ = self.changes_tx.send(FlagChange { key, variation });
    }

    /// Events recorded by `track` so far
    #[must_use]
    pub fn tracked(&self) -> Vec<TrackedEvent> {
        self.tracked.lock().clone()
    }

    /// Make every subsequent `track` call fail (fault injection)
    pub fn fail_tracking(&self, fail: bool) {
        self.fail_tracking.store(fail, Ordering::SeqCst);
    }
}

impl Default for LocalFlagSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlagSource for LocalFlagSource {
    async fn wait_ready(&self) -> Result<(), FlagError> {
        let mut rx = self.ready_tx.subscribe();
        loop {
            if *rx.borrow() {
                return Ok(());
            }
            rx.changed().await.map_err(|_| FlagError::Closed)?;
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<FlagChange> {
        self.changes_tx.subscribe()
    }

    fn snapshot(&self) -> FlagSnapshot {
        self.flags
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn variation(&self, key: &FlagKey, default: &Variation) -> Variation {
        self.flags
            .read()
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.clone())
    }

    async fn track(&self, event: &str, payload: serde_json::Value) -> Result<(), FlagError> {
        if self.fail_tracking.load(Ordering::SeqCst) {
            return Err(FlagError::Track(format!("injected failure for {event}")));
        }
        self.tracked.lock().push(TrackedEvent {
            name: event.to_string(),
            payload,
        });
        Ok(())
    }
}
