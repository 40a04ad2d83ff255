//! Testing utilities for the pagelab workspace
//!
//! Shared fixtures: a scripted in-memory document that counts lookups, a
//! recording event sink, and the stock ChargePerks page layout used by the
//! engine's scenario tests.

#![allow(missing_docs)]

use pagelab_dom::{Document, DomError, ElementHandle, Selector};
use pagelab_flags::{EventSink, FlagError, PageEvent};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Declarative element for building a [`FakeDocument`]
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub visible: bool,
}

impl ElementSpec {
    pub fn new() -> Self {
        Self {
            visible: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    #[must_use]
    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    #[must_use]
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

#[derive(Debug)]
struct Node {
    spec: ElementSpec,
    children: Vec<u64>,
}

#[derive(Debug, Default)]
struct Inner {
    next: u64,
    elements: HashMap<u64, Node>,
    order: Vec<u64>,
    path: String,
    navigations: Vec<String>,
}

/// In-memory [`Document`] that counts underlying lookups
///
/// `lookup_count` increments once per `query`/`query_all`, which is how the
/// element-cache memoization tests observe that the DOM was hit exactly
/// once per selector.
#[derive(Debug)]
pub struct FakeDocument {
    inner: RwLock<Inner>,
    lookups: AtomicUsize,
}

impl FakeDocument {
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            inner: RwLock::new(Inner {
                path: path.to_string(),
                ..Inner::default()
            }),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Add a top-level element in document order
    pub fn insert(&self, spec: ElementSpec) -> ElementHandle {
        let mut inner = self.inner.write();
        let handle = inner.next;
        inner.next += 1;
        inner.elements.insert(
            handle,
            Node {
                spec,
                children: Vec::new(),
            },
        );
        inner.order.push(handle);
        ElementHandle(handle)
    }

    /// Add an element as the last child of `parent`
    pub fn insert_child(&self, parent: ElementHandle, spec: ElementSpec) -> ElementHandle {
        let handle = self.insert(spec);
        let mut inner = self.inner.write();
        if let Some(node) = inner.elements.get_mut(&parent.0) {
            node.children.push(handle.0);
        }
        handle
    }

    /// How many times `query`/`query_all` hit this document
    #[must_use]
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Navigation requests received, in order
    #[must_use]
    pub fn navigations(&self) -> Vec<String> {
        self.inner.read().navigations.clone()
    }

    fn spec_matches(spec: &ElementSpec, selector: &Selector) -> bool {
        match selector {
            Selector::Id(id) => spec.id.as_deref() == Some(id.as_str()),
            Selector::Class(class) => spec.classes.iter().any(|c| c == class),
        }
    }
}

impl Document for FakeDocument {
    fn query(&self, selector: &Selector) -> Option<ElementHandle> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .find(|h| {
                inner
                    .elements
                    .get(h)
                    .is_some_and(|n| Self::spec_matches(&n.spec, selector))
            })
            .map(|&h| ElementHandle(h))
    }

    fn query_all(&self, selector: &Selector) -> Vec<ElementHandle> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter(|h| {
                inner
                    .elements
                    .get(h)
                    .is_some_and(|n| Self::spec_matches(&n.spec, selector))
            })
            .map(|&h| ElementHandle(h))
            .collect()
    }

    fn element_id(&self, handle: ElementHandle) -> Result<Option<String>, DomError> {
        let inner = self.inner.read();
        let node = inner
            .elements
            .get(&handle.0)
            .ok_or(DomError::StaleHandle(handle))?;
        Ok(node.spec.id.clone())
    }

    fn matches(&self, handle: ElementHandle, selector: &Selector) -> Result<bool, DomError> {
        let inner = self.inner.read();
        let node = inner
            .elements
            .get(&handle.0)
            .ok_or(DomError::StaleHandle(handle))?;
        Ok(Self::spec_matches(&node.spec, selector))
    }

    fn text(&self, handle: ElementHandle) -> Result<String, DomError> {
        let inner = self.inner.read();
        let node = inner
            .elements
            .get(&handle.0)
            .ok_or(DomError::StaleHandle(handle))?;
        Ok(node.spec.text.clone())
    }

    fn set_text(&self, handle: ElementHandle, text: &str) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        let node = inner
            .elements
            .get_mut(&handle.0)
            .ok_or(DomError::StaleHandle(handle))?;
        node.spec.text = text.to_string();
        Ok(())
    }

    fn attribute(&self, handle: ElementHandle, name: &str) -> Result<Option<String>, DomError> {
        let inner = self.inner.read();
        let node = inner
            .elements
            .get(&handle.0)
            .ok_or(DomError::StaleHandle(handle))?;
        Ok(node.spec.attrs.get(name).cloned())
    }

    fn set_attribute(
        &self,
        handle: ElementHandle,
        name: &str,
        value: &str,
    ) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        let node = inner
            .elements
            .get_mut(&handle.0)
            .ok_or(DomError::StaleHandle(handle))?;
        node.spec.attrs.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn visible(&self, handle: ElementHandle) -> Result<bool, DomError> {
        let inner = self.inner.read();
        let node = inner
            .elements
            .get(&handle.0)
            .ok_or(DomError::StaleHandle(handle))?;
        Ok(node.spec.visible)
    }

    fn set_visible(&self, handle: ElementHandle, visible: bool) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        let node = inner
            .elements
            .get_mut(&handle.0)
            .ok_or(DomError::StaleHandle(handle))?;
        node.spec.visible = visible;
        Ok(())
    }

    fn children(&self, handle: ElementHandle) -> Result<Vec<ElementHandle>, DomError> {
        let inner = self.inner.read();
        let node = inner
            .elements
            .get(&handle.0)
            .ok_or(DomError::StaleHandle(handle))?;
        Ok(node.children.iter().map(|&h| ElementHandle(h)).collect())
    }

    fn set_children(&self, handle: ElementHandle, order: &[ElementHandle]) -> Result<(), DomError> {
        let mut inner = self.inner.write();
        let node = inner
            .elements
            .get(&handle.0)
            .ok_or(DomError::StaleHandle(handle))?;
        if order.len() != node.children.len() {
            return Err(DomError::InvalidChildOrder {
                expected: node.children.len(),
                got: order.len(),
            });
        }
        for &child in order {
            if !node.children.contains(&child.0) {
                return Err(DomError::NotAChild {
                    container: handle,
                    child,
                });
            }
        }
        let new_order: Vec<u64> = order.iter().map(|h| h.0).collect();
        let node = inner
            .elements
            .get_mut(&handle.0)
            .ok_or(DomError::StaleHandle(handle))?;
        node.children = new_order;
        Ok(())
    }

    fn path(&self) -> String {
        self.inner.read().path.clone()
    }

    fn navigate(&self, path: &str) -> Result<(), DomError> {
        self.inner.write().navigations.push(path.to_string());
        Ok(())
    }
}

/// Event sink that records everything and can be made to fail
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PageEvent>>,
    fail: AtomicBool,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events emitted so far
    #[must_use]
    pub fn events(&self) -> Vec<PageEvent> {
        self.events.lock().clone()
    }

    /// Events with the given name
    #[must_use]
    pub fn named(&self, name: &str) -> Vec<PageEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.name == name)
            .cloned()
            .collect()
    }

    /// Make every subsequent emit fail
    pub fn fail_emission(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: PageEvent) -> Result<(), FlagError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(FlagError::Track(format!("injected failure for {}", event.name)));
        }
        self.events.lock().push(event);
        Ok(())
    }
}

/// Handles into the stock ChargePerks page fixture
pub struct ChargeperksPage {
    pub doc: std::sync::Arc<FakeDocument>,
    pub headline: ElementHandle,
    pub hero_image: ElementHandle,
    pub hero_video: ElementHandle,
    pub cta: ElementHandle,
    pub banner: ElementHandle,
    pub sections_container: ElementHandle,
    pub sections: Vec<ElementHandle>,
    pub pge_link: ElementHandle,
    pub sce_link: ElementHandle,
    pub smud_link: ElementHandle,
}

/// Build the ChargePerks landing page as the engine expects to find it
#[must_use]
pub fn chargeperks_page() -> ChargeperksPage {
    chargeperks_page_at("/chargeperks")
}

/// Same fixture, at an arbitrary path (for guard tests)
#[must_use]
pub fn chargeperks_page_at(path: &str) -> ChargeperksPage {
    let doc = std::sync::Arc::new(FakeDocument::new(path));

    let headline = doc.insert(
        ElementSpec::new()
            .with_class("chargeperks-hero-headline")
            .with_text("Earn rewards for smart charging"),
    );
    let hero_image = doc.insert(ElementSpec::new().with_class("chargeperks-hero-image"));
    let hero_video = doc.insert(
        ElementSpec::new()
            .with_class("chargeperks-hero-video")
            .hidden(),
    );
    let cta = doc.insert(
        ElementSpec::new()
            .with_id("chargeperk-cta-button")
            .with_class("chargeperk-cta-button")
            .with_text("ENROLL NOW"),
    );
    let banner = doc.insert(
        ElementSpec::new()
            .with_class("chargeperks-banner-text")
            .with_text("ChargePerks rewards EV drivers for charging off-peak"),
    );

    let sections_container =
        doc.insert(ElementSpec::new().with_class("chargeperks-sections-container"));
    let sections = ["how-it-works", "benefits", "faq", "signup"]
        .iter()
        .map(|name| {
            doc.insert_child(
                sections_container,
                ElementSpec::new().with_id(&format!("section-{name}")),
            )
        })
        .collect();

    let pge_link = doc.insert(
        ElementSpec::new()
            .with_id("PG&E")
            .with_class("program-link")
            .with_attr("href", "https://old.example/"),
    );
    let sce_link = doc.insert(
        ElementSpec::new()
            .with_id("SCE")
            .with_class("program-link")
            .with_attr("href", "https://old.example/sce"),
    );
    let smud_link = doc.insert(
        ElementSpec::new()
            .with_id("SMUD")
            .with_class("program-link")
            .with_attr("href", "https://old.example/smud"),
    );

    ChargeperksPage {
        doc,
        headline,
        hero_image,
        hero_video,
        cta,
        banner,
        sections_container,
        sections,
        pge_link,
        sce_link,
        smud_link,
    }
}
