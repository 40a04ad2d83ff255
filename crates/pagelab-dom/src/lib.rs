//! pagelab DOM boundary
//!
//! The engine never touches a live page directly. It talks to a [`Document`]
//! trait object that a host adapter implements:
//! - Element lookup by stable id or class selector
//! - Text, attribute, and visibility reads/writes
//! - Explicit child reordering
//! - Current page path and navigation requests
//!
//! [`ElementCache`] sits in front of a document and memoizes lookups for the
//! page lifetime, including failed ones.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cache;
pub mod document;
pub mod error;

// Re-exports for convenience
pub use cache::ElementCache;
pub use document::{Document, ElementHandle, Selector};
pub use error::DomError;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
