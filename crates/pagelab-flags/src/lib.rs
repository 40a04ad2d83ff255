//! pagelab flag source boundary
//!
//! Everything the engine knows about experiments comes through here:
//! - [`FlagSource`]: readiness, change notifications, snapshots, lookups,
//!   and the analytics `track` channel
//! - [`Variation`]: canonical variant values (string letters, `"A"` control;
//!   booleans coerce at the boundary)
//! - [`FlagSnapshot`]: atomic view of all flags for one orchestration pass
//! - [`LocalFlagSource`]: in-process source for embedding and tests
//! - [`LoggingFlagSource`]: decorator adding structured logs around
//!   `variation`/`track`, composed once at construction
//! - [`EventSink`]: the outbound analytics adapter

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod events;
pub mod local;
pub mod logging;
pub mod snapshot;
pub mod source;
pub mod variation;

// Re-exports for convenience
pub use error::FlagError;
pub use events::{EventSink, FlagSourceSink, PageEvent};
pub use local::{LocalFlagSource, TrackedEvent};
pub use logging::LoggingFlagSource;
pub use snapshot::FlagSnapshot;
pub use source::{FlagChange, FlagSource};
pub use variation::{FlagKey, Variation};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
