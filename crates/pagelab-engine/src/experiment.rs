//! Experiment definitions
//!
//! One experiment = one flag key, a control value, and a table mapping each
//! treatment variant to the mutation steps it performs. Definitions are
//! immutable after construction; the four divergent hand-written copies of
//! this logic in the original page scripts collapse into data here.

use indexmap::IndexMap;
use pagelab_dom::Selector;
use pagelab_flags::{FlagKey, Variation};
use serde::{Deserialize, Serialize};

/// One DOM mutation within a variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationOp {
    /// Replace text content
    SetText {
        /// New text
        text: String,
    },
    /// Set an attribute, optionally recording the prior value into another
    /// attribute (e.g. `data-original-url` for rewritten links)
    SetAttribute {
        /// Attribute name (notably `href`)
        name: String,
        /// New value
        value: String,
        /// Attribute to store the original value in, if any
        #[serde(default, skip_serializing_if = "Option::is_none")]
        record_original_in: Option<String>,
    },
    /// Show or hide the element
    SetVisibility {
        /// Target visibility
        visible: bool,
    },
    /// Permute a container's children relative to their original order
    ///
    /// `order[i]` is the original index of the child that ends up in
    /// position `i`. Always applied against the order captured on first
    /// application, never the current one, so re-application is a no-op.
    Reorder {
        /// Target permutation over original indices
        order: Vec<usize>,
    },
}

/// One step of a variant: a targeted mutation or a page redirect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Mutate the element(s) matching `target`
    Mutate {
        /// Element address
        target: Selector,
        /// What to do to it
        op: MutationOp,
    },
    /// Ask the host to navigate away (split-traffic page version)
    Redirect {
        /// Destination path
        to: String,
        /// Only redirect when the current path equals this, if set
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
    },
}

impl Step {
    /// Targeted mutation step
    #[inline]
    pub fn mutate(target: Selector, op: MutationOp) -> Self {
        Self::Mutate { target, op }
    }
}

/// Immutable definition of one experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    key: FlagKey,
    /// Base name for emitted events (`{event_name}-view`, `{event_name}-click`)
    event_name: String,
    control: Variation,
    /// Canonical variant letter → steps, in declaration order
    table: IndexMap<String, Vec<Step>>,
}

impl Experiment {
    /// New experiment with the shared `"A"` control
    #[must_use]
    pub fn new(key: impl Into<FlagKey>, event_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            event_name: event_name.into(),
            control: Variation::control(),
            table: IndexMap::new(),
        }
    }

    /// Override the control value (some flags serve booleans; `false` is
    /// already coerced to `"A"`, so this is rarely needed)
    #[must_use]
    pub fn with_control(mut self, control: impl Into<Variation>) -> Self {
        self.control = control.into();
        self
    }

    /// Declare a treatment variant and its steps
    #[must_use]
    pub fn with_variant(mut self, letter: impl Into<String>, steps: Vec<Step>) -> Self {
        self.table.insert(letter.into(), steps);
        self
    }

    /// Flag key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &FlagKey {
        &self.key
    }

    /// Event base name
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Declared default/control value
    #[inline]
    #[must_use]
    pub fn control(&self) -> &Variation {
        &self.control
    }

    /// Steps for a canonical variant letter, if declared
    #[must_use]
    pub fn steps_for(&self, canonical: &str) -> Option<&[Step]> {
        self.table.get(canonical).map(Vec::as_slice)
    }

    /// Declared treatment variant letters, in declaration order
    pub fn variants(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }
}
