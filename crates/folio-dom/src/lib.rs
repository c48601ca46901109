//! Narrow document interface consumed by the folio runtime.
//!
//! The runtime never touches a concrete document type; it drives a
//! [`DomBackend`] through handle-valued [`NodeId`]s. Any conforming
//! document model works — this crate ships [`MemoryDom`], an in-memory
//! implementation used by tests and headless hosts.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

mod memory;

pub use memory::{MemoryDom, MemoryNodeKind};

/// Handle to a node owned by a [`DomBackend`]. Handles are never reused
/// within one document, so a stale handle surfaces as [`DomError::Missing`]
/// rather than silently addressing a new node.
pub type NodeId = usize;

/// An event callback attached to a document element.
///
/// Cloning is shallow; two clones of the same handler compare equal under
/// [`EventHandler::ptr_eq`], which is what prop diffing uses to decide
/// whether a listener needs replacing.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn()>);

impl EventHandler {
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn invoke(&self) {
        (self.0)();
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventHandler")
    }
}

/// Inline style: either raw CSS text or an ordered property map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StyleValue {
    Text(String),
    Map(IndexMap<String, String>),
}

impl StyleValue {
    /// Serialize to CSS text, the form a document ultimately stores.
    pub fn to_css_text(&self) -> String {
        match self {
            StyleValue::Text(text) => text.clone(),
            StyleValue::Map(map) => {
                let mut out = String::new();
                for (name, value) in map {
                    if !out.is_empty() {
                        out.push_str("; ");
                    }
                    out.push_str(name);
                    out.push_str(": ");
                    out.push_str(value);
                }
                out
            }
        }
    }
}

impl From<&str> for StyleValue {
    fn from(text: &str) -> Self {
        StyleValue::Text(text.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    Missing { id: NodeId },
    NotAnElement { id: NodeId },
    NotAText { id: NodeId },
    NotAChild { parent: NodeId, child: NodeId },
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::Missing { id } => write!(f, "node {id} missing"),
            DomError::NotAnElement { id } => write!(f, "node {id} is not an element"),
            DomError::NotAText { id } => write!(f, "node {id} is not a text node"),
            DomError::NotAChild { parent, child } => {
                write!(f, "node {child} is not a child of node {parent}")
            }
        }
    }
}

impl std::error::Error for DomError {}

/// The document operations the runtime needs.
///
/// Creation returns fresh handles; every mutator addresses existing handles
/// and fails with a [`DomError`] when the handle or relationship does not
/// hold. `add_listener` replaces any previous listener registered for the
/// same event type on the same element.
pub trait DomBackend {
    fn create_text(&mut self, text: &str) -> NodeId;
    fn create_element(&mut self, tag: &str) -> NodeId;
    /// A grouping host: a node with no visual identity of its own whose only
    /// purpose is to give a subtree a single replaceable handle.
    fn create_group(&mut self) -> NodeId;

    fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), DomError>;
    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError>;
    fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), DomError>;
    fn set_style(&mut self, id: NodeId, style: &StyleValue) -> Result<(), DomError>;
    fn clear_style(&mut self, id: NodeId) -> Result<(), DomError>;
    fn add_listener(
        &mut self,
        id: NodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<(), DomError>;
    fn remove_listener(&mut self, id: NodeId, event: &str) -> Result<(), DomError>;

    fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError>;
    fn replace(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), DomError>;
    fn remove(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError>;
}
