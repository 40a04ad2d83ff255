//! Atomic flag snapshots
//!
//! One snapshot per orchestration pass. The orchestrator never mixes values
//! from two points in time: it takes a snapshot at readiness or on a change
//! notification and hands the same one to every applicator.

use crate::variation::{FlagKey, Variation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Immutable view of every flag at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSnapshot {
    flags: HashMap<FlagKey, Variation>,
}

impl FlagSnapshot {
    /// Empty snapshot
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for a key, if the service knows it
    #[inline]
    #[must_use]
    pub fn get(&self, key: &FlagKey) -> Option<&Variation> {
        self.flags.get(key)
    }

    /// Value for a key, or the experiment's declared default
    #[must_use]
    pub fn variation_or(&self, key: &FlagKey, default: &Variation) -> Variation {
        self.flags.get(key).cloned().unwrap_or_else(|| default.clone())
    }

    /// Add or replace a flag value (builder style)
    #[must_use]
    pub fn with(mut self, key: impl Into<FlagKey>, value: impl Into<Variation>) -> Self {
        self.flags.insert(key.into(), value.into());
        self
    }

    /// Add or replace a flag value in place
    pub fn set(&mut self, key: impl Into<FlagKey>, value: impl Into<Variation>) {
        self.flags.insert(key.into(), value.into());
    }

    /// Iterate over all known flags
    pub fn iter(&self) -> impl Iterator<Item = (&FlagKey, &Variation)> {
        self.flags.iter()
    }

    /// Number of known flags
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether the snapshot is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl FromIterator<(FlagKey, Variation)> for FlagSnapshot {
    fn from_iter<I: IntoIterator<Item = (FlagKey, Variation)>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().collect(),
        }
    }
}
