//! pagelab engine - flag-driven page-variant application
//!
//! The orchestration core that:
//! - Holds a fixed-order registry of experiment definitions
//! - Applies each experiment's current variant to the page on readiness
//!   and on every flag change, idempotently
//! - Emits view and conversion events through the analytics channel
//! - Gates everything behind a page allowlist and a preview-mode predicate
//!
//! # Example
//!
//! ```rust,ignore
//! use pagelab_engine::{EngineConfig, ExperimentRegistry, Orchestrator};
//!
//! # async fn example(doc: std::sync::Arc<dyn pagelab_dom::Document>,
//! #                  flags: std::sync::Arc<dyn pagelab_flags::FlagSource>)
//! #                  -> Result<(), pagelab_engine::EngineError> {
//! let orchestrator = Orchestrator::new(
//!     doc,
//!     flags,
//!     ExperimentRegistry::chargeperks(),
//!     EngineConfig::new(),
//! );
//! orchestrator.run().await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod applicator;
pub mod clicks;
pub mod config;
pub mod error;
pub mod experiment;
pub mod guards;
pub mod orchestrator;
pub mod registry;

// Re-exports for convenience
pub use applicator::{
    Applicator, ApplyContext, ApplyOutcome, AppliedRecord, BaselineStore, ChangeKind,
    ChangeRecord, SkipReason,
};
pub use clicks::ClickTracker;
pub use config::EngineConfig;
pub use error::EngineError;
pub use experiment::{Experiment, MutationOp, Step};
pub use guards::{Activation, ActivationGuard};
pub use orchestrator::{Orchestrator, RunSummary, StartOutcome};
pub use registry::{ExperimentRegistry, CTA_CLASS, ORIGINAL_URL_ATTR, PROGRAM_LINK_CLASS};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the pagelab engine
    pub use crate::{
        Applicator, ApplyOutcome, EngineConfig, EngineError, Experiment, ExperimentRegistry,
        MutationOp, Orchestrator, RunSummary, StartOutcome, Step,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
