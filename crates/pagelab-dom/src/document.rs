//! The abstract page a host adapter implements
//!
//! Handles are opaque and assigned by the implementation. They stay valid for
//! the page lifetime; a full page reload invalidates everything, including
//! every cache built on top.

use crate::error::DomError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a live element, assigned by the [`Document`] impl
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementHandle(pub u64);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How an element is addressed: stable id or CSS class
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// Stable element identifier (`id="..."`)
    Id(String),
    /// CSS class name, no leading dot
    Class(String),
}

impl Selector {
    /// Selector by element id
    #[inline]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Selector by class name
    #[inline]
    pub fn class(class: impl Into<String>) -> Self {
        Self::Class(class.into())
    }

    /// Stable key used by the element cache
    #[must_use]
    pub fn cache_key(&self) -> String {
        match self {
            Self::Id(id) => format!("#{id}"),
            Self::Class(class) => format!(".{class}"),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}

/// Read/write access to the live page
///
/// Everything the engine does to a page goes through this trait: the engine
/// owns no rendering and no event loop. Implementations must be cheap to
/// query; the engine still caches lookups on top.
pub trait Document: Send + Sync {
    /// First element matching the selector, if any
    fn query(&self, selector: &Selector) -> Option<ElementHandle>;

    /// All elements matching the selector, in document order
    fn query_all(&self, selector: &Selector) -> Vec<ElementHandle>;

    /// The element's stable id attribute, if it has one
    fn element_id(&self, handle: ElementHandle) -> Result<Option<String>, DomError>;

    /// Whether the element matches the selector (id equality or class membership)
    fn matches(&self, handle: ElementHandle, selector: &Selector) -> Result<bool, DomError>;

    /// Text content
    fn text(&self, handle: ElementHandle) -> Result<String, DomError>;

    /// Replace text content
    fn set_text(&self, handle: ElementHandle, text: &str) -> Result<(), DomError>;

    /// Attribute value, `None` when absent
    fn attribute(&self, handle: ElementHandle, name: &str) -> Result<Option<String>, DomError>;

    /// Set an attribute, creating it when absent
    fn set_attribute(&self, handle: ElementHandle, name: &str, value: &str)
        -> Result<(), DomError>;

    /// Whether the element is currently visible
    fn visible(&self, handle: ElementHandle) -> Result<bool, DomError>;

    /// Show or hide the element
    fn set_visible(&self, handle: ElementHandle, visible: bool) -> Result<(), DomError>;

    /// Current child handles of a container, in document order
    fn children(&self, handle: ElementHandle) -> Result<Vec<ElementHandle>, DomError>;

    /// Reorder a container's children to exactly the given sequence
    ///
    /// The sequence must be a permutation of the current children; anything
    /// else is rejected without touching the page.
    fn set_children(
        &self,
        handle: ElementHandle,
        order: &[ElementHandle],
    ) -> Result<(), DomError>;

    /// Current page path (e.g. `/chargeperks`)
    fn path(&self) -> String;

    /// Request navigation to another path; the host performs the actual move
    fn navigate(&self, path: &str) -> Result<(), DomError>;
}
