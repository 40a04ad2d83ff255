//! Error types for the DOM boundary

use crate::document::ElementHandle;

/// Errors reported by [`Document`](crate::Document) implementations
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    /// Handle no longer refers to a live element
    #[error("stale element handle: {0}")]
    StaleHandle(ElementHandle),

    /// A reorder request did not cover the container's children
    #[error("invalid child order: container has {expected} children, order lists {got}")]
    InvalidChildOrder { expected: usize, got: usize },

    /// A reorder request referenced a handle that is not a child of the container
    #[error("element {child} is not a child of {container}")]
    NotAChild {
        container: ElementHandle,
        child: ElementHandle,
    },

    /// The host does not support navigation (e.g. a detached fragment)
    #[error("navigation not supported by this document")]
    NavigationUnsupported,
}
