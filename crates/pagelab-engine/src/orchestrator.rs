//! The orchestrator
//!
//! Drives the whole pipeline: activation check, flag source connection and
//! readiness (both bounded), a first full pass over the registry, then one
//! pass per change notification. Passes run applicators in registration
//! order and isolate individual failures; a pass is synchronous relative to
//! the snapshot it was given.

use crate::applicator::{Applicator, ApplyContext, ApplyOutcome, AppliedRecord, BaselineStore};
use crate::clicks::ClickTracker;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::guards::{Activation, ActivationGuard};
use crate::registry::ExperimentRegistry;
use pagelab_dom::{Document, ElementCache};
use pagelab_flags::{EventSink, FlagSnapshot, FlagSource, FlagSourceSink};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::timeout;

/// Counts and records from one full pass
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Applicators that mutated the page
    pub applied: usize,
    /// Applicators that had nothing to do
    pub skipped: usize,
    /// Applicators that failed (isolated, logged)
    pub failed: usize,
    /// Records of every successful application
    pub records: Vec<AppliedRecord>,
}

/// Result of driving initialization
#[derive(Debug)]
pub enum StartOutcome {
    /// First pass completed
    Ran(RunSummary),
    /// Guards kept the pipeline off; page untouched
    Inactive(Activation),
}

/// Owns the wiring and drives passes
pub struct Orchestrator {
    flags: Arc<dyn FlagSource>,
    registry: ExperimentRegistry,
    guard: ActivationGuard,
    config: EngineConfig,
    ctx: ApplyContext,
}

impl Orchestrator {
    /// Create an orchestrator; events flow to the flag source's analytics
    /// channel
    #[must_use]
    pub fn new(
        doc: Arc<dyn Document>,
        flags: Arc<dyn FlagSource>,
        registry: ExperimentRegistry,
        config: EngineConfig,
    ) -> Self {
        let sink: Arc<dyn EventSink> = Arc::new(FlagSourceSink::new(flags.clone()));
        Self::with_sink(doc, flags, sink, registry, config)
    }

    /// Create an orchestrator with an explicit event sink
    #[must_use]
    pub fn with_sink(
        doc: Arc<dyn Document>,
        flags: Arc<dyn FlagSource>,
        sink: Arc<dyn EventSink>,
        registry: ExperimentRegistry,
        config: EngineConfig,
    ) -> Self {
        let guard = ActivationGuard::from_config(&config);
        let ctx = ApplyContext {
            cache: ElementCache::new(doc),
            sink,
            baselines: Arc::new(BaselineStore::new()),
        };
        Self {
            flags,
            registry,
            guard,
            config,
            ctx,
        }
    }

    /// The element cache backing this orchestrator
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &ElementCache {
        &self.ctx.cache
    }

    /// Click tracker wired to the same flags, document, and sink
    ///
    /// Attach after the first successful pass; it reads flags at click
    /// time, so later change notifications need no re-attachment.
    #[must_use]
    pub fn click_tracker(&self) -> ClickTracker {
        ClickTracker::new(
            self.ctx.cache.document().clone(),
            self.flags.clone(),
            self.ctx.sink.clone(),
        )
    }

    /// Run every applicator once against a snapshot, in fixed order
    ///
    /// A failing applicator is logged and the rest still run. Re-running
    /// with the same snapshot is a no-op on page state.
    pub async fn run_all(&self, snapshot: &FlagSnapshot) -> RunSummary {
        let mut summary = RunSummary::default();
        for experiment in self.registry.iter() {
            let applicator = Applicator::new(experiment.clone());
            match applicator.apply(&self.ctx, snapshot).await {
                Ok(ApplyOutcome::Applied(record)) => {
                    tracing::info!(test = %record.test, variation = %record.variation, "variant applied");
                    summary.applied += 1;
                    summary.records.push(record);
                }
                Ok(ApplyOutcome::Skipped(reason)) => {
                    tracing::debug!(test = %experiment.key(), ?reason, "variant skipped");
                    summary.skipped += 1;
                }
                Err(e) => {
                    tracing::error!(test = %experiment.key(), error = %e, "applicator failed; continuing");
                    summary.failed += 1;
                }
            }
        }
        tracing::info!(
            applied = summary.applied,
            skipped = summary.skipped,
            failed = summary.failed,
            "pass complete"
        );
        summary
    }

    /// Check guards, bring the flag source up, and run the first pass
    ///
    /// Both the connection and the readiness wait are bounded; hitting
    /// either deadline abandons initialization for this page load with no
    /// retry, leaving the control experience in place.
    pub async fn start(&self) -> Result<StartOutcome, EngineError> {
        let activation = self.guard.evaluate(&self.ctx.cache.document().path());
        if !activation.is_active() {
            tracing::info!(?activation, "pipeline inactive");
            return Ok(StartOutcome::Inactive(activation));
        }

        timeout(self.config.connect_timeout(), self.flags.connect())
            .await
            .map_err(|_| EngineError::ConnectTimeout {
                duration_secs: self.config.connect_timeout_secs,
            })??;

        timeout(self.config.ready_timeout(), self.flags.wait_ready())
            .await
            .map_err(|_| EngineError::InitTimeout {
                duration_secs: self.config.ready_timeout_secs,
            })??;

        let snapshot = self.flags.snapshot();
        Ok(StartOutcome::Ran(self.run_all(&snapshot).await))
    }

    /// Drive the pipeline for the page lifetime
    ///
    /// First pass on readiness, then one pass per change notification, in
    /// arrival order. Returns when the flag source closes its change
    /// stream. Errors out only on fatal initialization failure.
    pub async fn run(&self) -> Result<(), EngineError> {
        // Subscribe before the first pass so changes arriving during it are
        // not lost; the single consumer serializes passes naturally.
        let mut changes = self.flags.subscribe();

        match self.start().await? {
            StartOutcome::Inactive(_) => return Ok(()),
            StartOutcome::Ran(_) => {}
        }

        loop {
            match changes.recv().await {
                Ok(change) => {
                    tracing::debug!(key = %change.key, variation = %change.variation, "flag changed");
                    let snapshot = self.flags.snapshot();
                    let _ = self.run_all(&snapshot).await;
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "change stream lagged; re-running on fresh snapshot");
                    let snapshot = self.flags.snapshot();
                    let _ = self.run_all(&snapshot).await;
                }
                Err(RecvError::Closed) => {
                    tracing::info!("change stream closed; orchestrator done");
                    return Ok(());
                }
            }
        }
    }
}
