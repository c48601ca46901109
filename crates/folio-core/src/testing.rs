//! Headless harness for exercising roots in tests.
//!
//! `TestRule` owns an in-memory document and a [`Root`] mounted into it, and
//! exposes helpers for re-rendering, pumping scheduled work, dispatching
//! events, and asserting on the produced document, without a windowing or
//! browser backend.

use folio_dom::{MemoryDom, NodeId};

use crate::element::Element;
use crate::root::{RenderError, Root};
use crate::runtime::RuntimeHandle;

pub struct TestRule {
    root: Root<MemoryDom>,
}

impl TestRule {
    pub fn new() -> Self {
        let (dom, container) = MemoryDom::with_container();
        Self {
            root: Root::new(dom, container),
        }
    }

    /// Mount or re-render `element` and settle all synchronous work.
    pub fn render(&mut self, element: Element) -> Result<(), RenderError> {
        self.root.render(element)
    }

    pub fn unmount(&mut self) -> Result<(), RenderError> {
        self.root.unmount()
    }

    /// Drive queued passes and the resource pump until idle.
    pub fn pump(&mut self) -> Result<(), RenderError> {
        self.root.update()
    }

    /// Text content of the whole mounted tree.
    pub fn text(&self) -> String {
        self.root.dom().text_content(self.root.container())
    }

    /// Serialized contents of the container (the container element itself is
    /// not part of the mounted tree).
    pub fn html(&self) -> String {
        self.root
            .dom()
            .children(self.root.container())
            .iter()
            .map(|&child| self.root.dom().to_html(child))
            .collect()
    }

    /// First element with `tag`, in document order.
    pub fn find_tag(&self, tag: &str) -> Option<NodeId> {
        self.root.dom().find_tag(self.root.container(), tag)
    }

    /// Dispatch `event` on the first element with `tag`; returns whether a
    /// listener ran. The pass the handler schedules is *not* pumped, so
    /// tests can observe coalescing before calling [`TestRule::pump`].
    pub fn dispatch(&self, tag: &str, event: &str) -> bool {
        match self.find_tag(tag) {
            Some(id) => self.root.dom().dispatch(id, event),
            None => false,
        }
    }

    pub fn dom(&self) -> &MemoryDom {
        self.root.dom()
    }

    pub fn container(&self) -> NodeId {
        self.root.container()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.root.runtime_handle()
    }

    pub fn root(&self) -> &Root<MemoryDom> {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Root<MemoryDom> {
        &mut self.root
    }
}

impl Default for TestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience for tests that only need temporary access to a `TestRule`.
pub fn run_test_root<R>(f: impl FnOnce(&mut TestRule) -> R) -> R {
    let mut rule = TestRule::new();
    f(&mut rule)
}
