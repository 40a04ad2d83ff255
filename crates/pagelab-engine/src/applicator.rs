//! Variant application
//!
//! An applicator takes one experiment and one flag snapshot and turns them
//! into DOM mutations. Two rules keep re-application safe:
//! - Every mutation is computed from the baseline captured on first
//!   application, never from current page state. Running the same snapshot
//!   twice is a fixed point.
//! - Event emission happens after the mutation and its failure never rolls
//!   the mutation back.

use crate::error::EngineError;
use crate::experiment::{Experiment, MutationOp, Step};
use dashmap::DashMap;
use pagelab_dom::{Document, ElementCache, ElementHandle, Selector};
use pagelab_flags::{EventSink, FlagSnapshot, PageEvent};
use serde_json::json;
use std::sync::Arc;

/// What an element looked like before its first mutation
#[derive(Debug, Clone)]
enum Baseline {
    Text(String),
    /// Attribute value; `None` means the attribute was absent
    Attribute(Option<String>),
    Visibility(bool),
    ChildOrder(Vec<ElementHandle>),
}

/// Which aspect of an element a baseline covers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Aspect {
    Text,
    Attribute(String),
    Visibility,
    ChildOrder,
}

/// Captured pre-mutation state, shared across passes
///
/// Lives as long as the page. Entries are written once, on the first
/// mutation of a given element aspect, and only read afterwards.
#[derive(Debug, Default)]
pub struct BaselineStore {
    entries: DashMap<(ElementHandle, Aspect), Baseline>,
}

impl BaselineStore {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn capture<F>(&self, element: ElementHandle, aspect: Aspect, read: F) -> Result<Baseline, EngineError>
    where
        F: FnOnce() -> Result<Baseline, EngineError>,
    {
        if let Some(existing) = self.entries.get(&(element, aspect.clone())) {
            return Ok(existing.clone());
        }
        let current = read()?;
        self.entries.insert((element, aspect), current.clone());
        Ok(current)
    }
}

/// One recorded element transition
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    /// Element label for payloads: its id if it has one, otherwise the handle
    pub element: String,
    /// Payload field names depend on what changed
    pub kind: ChangeKind,
    /// State before the first application
    pub original: String,
    /// State after this application
    pub new: String,
}

/// Kind of change, drives event payload field naming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Text,
    Attribute,
    Visibility,
    Order,
    Redirect,
}

impl ChangeKind {
    fn payload_fields(self) -> (&'static str, &'static str) {
        match self {
            Self::Text => ("originalText", "newText"),
            Self::Attribute => ("originalUrl", "newUrl"),
            Self::Visibility => ("originalVisibility", "newVisibility"),
            Self::Order => ("originalOrder", "newOrder"),
            Self::Redirect => ("fromPath", "toPath"),
        }
    }
}

/// Result of a successful application
#[derive(Debug, Clone)]
pub struct AppliedRecord {
    /// Experiment key
    pub test: String,
    /// Canonical variant applied
    pub variation: String,
    /// Every element transition performed
    pub changes: Vec<ChangeRecord>,
}

/// Why an applicator did nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Snapshot value equals the control value
    Control,
    /// Value is neither control nor a declared treatment
    UnknownVariation(String),
    /// No target element resolved
    MissingElement(String),
    /// Steps exist but none apply on this page (e.g. a redirect scoped to
    /// another path)
    NotApplicable,
}

/// Outcome of one apply call
#[derive(Debug, Clone)]
pub enum ApplyOutcome {
    /// Mutations performed, view event emitted
    Applied(AppliedRecord),
    /// Nothing done, page untouched
    Skipped(SkipReason),
}

/// Shared wiring an applicator needs
#[derive(Clone)]
pub struct ApplyContext {
    /// Element resolution with memoization
    pub cache: ElementCache,
    /// Outbound analytics
    pub sink: Arc<dyn EventSink>,
    /// Pre-mutation state, shared across passes
    pub baselines: Arc<BaselineStore>,
}

/// Applies one experiment's variant to the page
#[derive(Debug, Clone)]
pub struct Applicator {
    experiment: Experiment,
}

impl Applicator {
    /// Wrap an experiment definition
    #[inline]
    #[must_use]
    pub fn new(experiment: Experiment) -> Self {
        Self { experiment }
    }

    /// The wrapped experiment
    #[inline]
    #[must_use]
    pub fn experiment(&self) -> &Experiment {
        &self.experiment
    }

    /// Apply the current variant from the snapshot
    ///
    /// Control and unknown values skip without touching the page. Missing
    /// elements skip with a warning. DOM failures surface as errors for the
    /// orchestrator to isolate; they never partially roll back.
    pub async fn apply(
        &self,
        ctx: &ApplyContext,
        snapshot: &FlagSnapshot,
    ) -> Result<ApplyOutcome, EngineError> {
        let key = self.experiment.key();
        let value = snapshot.variation_or(key, self.experiment.control());
        let canonical = value.canonical().to_string();

        if value.same_as(self.experiment.control()) {
            tracing::debug!(test = %key, "control variant; nothing to do");
            return Ok(ApplyOutcome::Skipped(SkipReason::Control));
        }

        let Some(steps) = self.experiment.steps_for(&canonical) else {
            tracing::warn!(test = %key, variation = %canonical, "unknown variation; treating as control");
            return Ok(ApplyOutcome::Skipped(SkipReason::UnknownVariation(canonical)));
        };

        let mut changes = Vec::new();
        let mut redirect_to: Option<String> = None;
        for step in steps {
            match step {
                Step::Mutate { target, op } => {
                    self.apply_mutation(ctx, target, op, &mut changes)?;
                }
                Step::Redirect { to, from } => {
                    let here = ctx.cache.document().path();
                    if from.as_deref().is_some_and(|expected| expected != here) {
                        tracing::debug!(test = %key, path = %here, "redirect does not apply here");
                        continue;
                    }
                    changes.push(ChangeRecord {
                        element: "page".to_string(),
                        kind: ChangeKind::Redirect,
                        original: here,
                        new: to.clone(),
                    });
                    redirect_to = Some(to.clone());
                }
            }
        }

        if changes.is_empty() {
            if steps.iter().all(|s| matches!(s, Step::Redirect { .. })) {
                tracing::debug!(test = %key, variation = %canonical, "no step applies on this page");
                return Ok(ApplyOutcome::Skipped(SkipReason::NotApplicable));
            }
            tracing::warn!(test = %key, variation = %canonical, "no target elements resolved; skipping");
            return Ok(ApplyOutcome::Skipped(SkipReason::MissingElement(
                key.to_string(),
            )));
        }

        let record = AppliedRecord {
            test: key.to_string(),
            variation: canonical,
            changes,
        };

        // Emission is fire-and-forget: the sink logs failures and the
        // mutation stands either way.
        let _ = ctx.sink.emit(self.view_event(&record, redirect_to.is_some())).await;

        // Redirect last, after tracking, mirroring track-before-navigate.
        if let Some(to) = redirect_to {
            ctx.cache.document().navigate(&to)?;
        }

        Ok(ApplyOutcome::Applied(record))
    }

    fn apply_mutation(
        &self,
        ctx: &ApplyContext,
        target: &Selector,
        op: &MutationOp,
        changes: &mut Vec<ChangeRecord>,
    ) -> Result<(), EngineError> {
        let elements = match target {
            Selector::Id(_) => ctx.cache.resolve(target).into_iter().collect::<Vec<_>>(),
            Selector::Class(_) => ctx.cache.resolve_all(target),
        };

        for element in elements {
            let change = self.apply_to_element(ctx, element, op)?;
            changes.push(change);
        }
        Ok(())
    }

    fn apply_to_element(
        &self,
        ctx: &ApplyContext,
        element: ElementHandle,
        op: &MutationOp,
    ) -> Result<ChangeRecord, EngineError> {
        let doc = ctx.cache.document().clone();
        let label = element_label(doc.as_ref(), element)?;

        match op {
            MutationOp::SetText { text } => {
                let baseline = ctx.baselines.capture(element, Aspect::Text, || {
                    Ok(Baseline::Text(doc.text(element)?))
                })?;
                let Baseline::Text(original) = baseline else {
                    unreachable!("text aspect stores text baselines");
                };
                doc.set_text(element, text)?;
                Ok(ChangeRecord {
                    element: label,
                    kind: ChangeKind::Text,
                    original,
                    new: text.clone(),
                })
            }
            MutationOp::SetAttribute {
                name,
                value,
                record_original_in,
            } => {
                let baseline = ctx
                    .baselines
                    .capture(element, Aspect::Attribute(name.clone()), || {
                        Ok(Baseline::Attribute(doc.attribute(element, name)?))
                    })?;
                let Baseline::Attribute(original) = baseline else {
                    unreachable!("attribute aspect stores attribute baselines");
                };
                let original = original.unwrap_or_default();
                if let Some(attr) = record_original_in {
                    doc.set_attribute(element, attr, &original)?;
                }
                doc.set_attribute(element, name, value)?;
                Ok(ChangeRecord {
                    element: label,
                    kind: ChangeKind::Attribute,
                    original,
                    new: value.clone(),
                })
            }
            MutationOp::SetVisibility { visible } => {
                let baseline = ctx.baselines.capture(element, Aspect::Visibility, || {
                    Ok(Baseline::Visibility(doc.visible(element)?))
                })?;
                let Baseline::Visibility(original) = baseline else {
                    unreachable!("visibility aspect stores visibility baselines");
                };
                doc.set_visible(element, *visible)?;
                Ok(ChangeRecord {
                    element: label,
                    kind: ChangeKind::Visibility,
                    original: original.to_string(),
                    new: visible.to_string(),
                })
            }
            MutationOp::Reorder { order } => {
                let baseline = ctx.baselines.capture(element, Aspect::ChildOrder, || {
                    Ok(Baseline::ChildOrder(doc.children(element)?))
                })?;
                let Baseline::ChildOrder(original) = baseline else {
                    unreachable!("child-order aspect stores child-order baselines");
                };
                let permuted = permute(&original, order).ok_or_else(|| {
                    EngineError::Dom(pagelab_dom::DomError::InvalidChildOrder {
                        expected: original.len(),
                        got: order.len(),
                    })
                })?;
                doc.set_children(element, &permuted)?;
                Ok(ChangeRecord {
                    element: label,
                    kind: ChangeKind::Order,
                    original: order_label(doc.as_ref(), &original)?,
                    new: order_label(doc.as_ref(), &permuted)?,
                })
            }
        }
    }

    fn view_event(&self, record: &AppliedRecord, redirected: bool) -> PageEvent {
        let suffix = if redirected { "redirect" } else { "view" };
        let name = format!("{}-{suffix}", self.experiment.event_name());

        let mut payload = json!({
            "test": record.test,
            "variation": record.variation,
        });
        if let Some(first) = record.changes.first() {
            let (original_field, new_field) = first.kind.payload_fields();
            payload[original_field] = json!(first.original);
            payload[new_field] = json!(first.new);
        }
        if record.changes.len() > 1 {
            payload["elements"] = json!(record.changes.len());
        }
        PageEvent::new(name, payload)
    }
}

/// `order[i]` is the original index placed at position `i`; `None` when the
/// order is not a permutation of `0..original.len()`
fn permute(original: &[ElementHandle], order: &[usize]) -> Option<Vec<ElementHandle>> {
    if order.len() != original.len() {
        return None;
    }
    let mut seen = vec![false; original.len()];
    let mut out = Vec::with_capacity(original.len());
    for &index in order {
        if index >= original.len() || seen[index] {
            return None;
        }
        seen[index] = true;
        out.push(original[index]);
    }
    Some(out)
}

fn element_label(doc: &dyn Document, element: ElementHandle) -> Result<String, EngineError> {
    Ok(doc
        .element_id(element)?
        .unwrap_or_else(|| element.to_string()))
}

fn order_label(doc: &dyn Document, order: &[ElementHandle]) -> Result<String, EngineError> {
    let mut labels = Vec::with_capacity(order.len());
    for &child in order {
        labels.push(element_label(doc, child)?);
    }
    Ok(labels.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permute_rejects_non_permutations() {
        let children = vec![ElementHandle(1), ElementHandle(2), ElementHandle(3)];
        assert!(permute(&children, &[0, 1]).is_none());
        assert!(permute(&children, &[0, 1, 1]).is_none());
        assert!(permute(&children, &[0, 1, 5]).is_none());

        let swapped = permute(&children, &[1, 0, 2]).unwrap();
        assert_eq!(
            swapped,
            vec![ElementHandle(2), ElementHandle(1), ElementHandle(3)]
        );
    }
}
