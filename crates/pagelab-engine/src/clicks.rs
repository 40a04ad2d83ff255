//! Click tracking
//!
//! Attached once, after the first successful pass. The host forwards every
//! document click target here; qualifying targets produce exactly one
//! conversion event per matching condition. Flag values are re-queried at
//! click time, so the payload reflects the variant the visitor actually
//! saw, not the one from page load.

use crate::registry::{CTA_CLASS, ORIGINAL_URL_ATTR, PROGRAM_LINK_CLASS};
use pagelab_dom::{Document, ElementHandle, Selector};
use pagelab_flags::{EventSink, FlagKey, FlagSource, PageEvent, Variation};
use serde_json::json;
use std::sync::Arc;

/// Emits conversion events for CTA buttons and program links
pub struct ClickTracker {
    doc: Arc<dyn Document>,
    flags: Arc<dyn FlagSource>,
    sink: Arc<dyn EventSink>,
    cta: Selector,
    program_link: Selector,
}

impl ClickTracker {
    /// Tracker with the stock ChargePerks selectors
    #[must_use]
    pub fn new(
        doc: Arc<dyn Document>,
        flags: Arc<dyn FlagSource>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            doc,
            flags,
            sink,
            cta: Selector::class(CTA_CLASS),
            program_link: Selector::class(PROGRAM_LINK_CLASS),
        }
    }

    /// Inspect one click target; returns how many events were emitted
    ///
    /// Never escalates: DOM and tracking failures are logged and swallowed,
    /// matching the rule that nothing from this pipeline reaches the host
    /// page as an error.
    pub async fn handle_click(&self, target: ElementHandle) -> usize {
        let mut emitted = 0;

        match self.cta_event(target) {
            Ok(Some(event)) => {
                if self.sink.emit(event).await.is_ok() {
                    emitted += 1;
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(%target, error = %e, "cta click inspection failed"),
        }

        match self.program_link_event(target) {
            Ok(Some(event)) => {
                if self.sink.emit(event).await.is_ok() {
                    emitted += 1;
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(%target, error = %e, "link click inspection failed"),
        }

        emitted
    }

    fn cta_event(&self, target: ElementHandle) -> Result<Option<PageEvent>, pagelab_dom::DomError> {
        if !self.doc.matches(target, &self.cta)? {
            return Ok(None);
        }
        let variation = self
            .flags
            .variation(&FlagKey::from("chargeperk-cta-text"), &Variation::control());
        let text = self.doc.text(target)?;
        let id = self.doc.element_id(target)?;
        Ok(Some(PageEvent::new(
            "cta-button-click",
            json!({
                "variation": variation.canonical(),
                "text": text,
                "id": id,
            }),
        )))
    }

    fn program_link_event(
        &self,
        target: ElementHandle,
    ) -> Result<Option<PageEvent>, pagelab_dom::DomError> {
        if !self.doc.matches(target, &self.program_link)? {
            return Ok(None);
        }
        let current = self.doc.attribute(target, "href")?.unwrap_or_default();
        // Links the applicator never rewrote have no recorded original; the
        // current URL doubles as it.
        let original = self
            .doc
            .attribute(target, ORIGINAL_URL_ATTR)?
            .unwrap_or_else(|| current.clone());
        let variation = self
            .flags
            .variation(&FlagKey::from("program-destination"), &Variation::control());
        Ok(Some(PageEvent::new(
            "program-link-click",
            json!({
                "variation": variation.canonical(),
                "originalUrl": original,
                "newUrl": current,
            }),
        )))
    }
}
