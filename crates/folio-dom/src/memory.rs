//! In-memory document backing tests and headless hosts.

use indexmap::IndexMap;
use log::debug;

use crate::{DomBackend, DomError, EventHandler, NodeId, StyleValue};

pub enum MemoryNodeKind {
    Text(String),
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
        style: Option<StyleValue>,
        listeners: IndexMap<String, EventHandler>,
    },
    Group,
}

struct MemoryNode {
    kind: MemoryNodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl MemoryNode {
    fn new(kind: MemoryNodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Arena-backed document. Removed nodes leave their arena slot empty so
/// handles are never reused within one document's lifetime.
#[derive(Default)]
pub struct MemoryDom {
    nodes: Vec<Option<MemoryNode>>,
    mutations: usize,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for tests: a fresh document plus a container element to
    /// mount into.
    pub fn with_container() -> (Self, NodeId) {
        let mut dom = Self::new();
        let container = dom.create_element("root");
        (dom, container)
    }

    fn alloc(&mut self, kind: MemoryNodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Some(MemoryNode::new(kind)));
        id
    }

    fn node(&self, id: NodeId) -> Result<&MemoryNode, DomError> {
        self.nodes
            .get(id)
            .and_then(|slot| slot.as_ref())
            .ok_or(DomError::Missing { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, DomError> {
        self.nodes
            .get_mut(id)
            .and_then(|slot| slot.as_mut())
            .ok_or(DomError::Missing { id })
    }

    fn element_mut(
        &mut self,
        id: NodeId,
    ) -> Result<
        (
            &mut IndexMap<String, String>,
            &mut Option<StyleValue>,
            &mut IndexMap<String, EventHandler>,
        ),
        DomError,
    > {
        match &mut self.node_mut(id)?.kind {
            MemoryNodeKind::Element {
                attributes,
                style,
                listeners,
                ..
            } => Ok((attributes, style, listeners)),
            _ => Err(DomError::NotAnElement { id }),
        }
    }

    fn drop_subtree(&mut self, id: NodeId) {
        let children = match self.nodes.get_mut(id).and_then(|slot| slot.take()) {
            Some(node) => node.children,
            None => return,
        };
        for child in children {
            self.drop_subtree(child);
        }
    }

    /// Number of live nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the handle still addresses a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(id).map_or(false, |slot| slot.is_some())
    }

    /// Count of attribute/style/listener/text mutations performed so far.
    /// Tests use the delta across a re-render to assert that an unchanged
    /// tree touches nothing.
    pub fn mutation_count(&self) -> usize {
        self.mutations
    }

    pub fn kind(&self, id: NodeId) -> Option<&MemoryNodeKind> {
        self.nodes.get(id).and_then(|slot| slot.as_ref()).map(|n| &n.kind)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            MemoryNodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.kind(id)? {
            MemoryNodeKind::Element { attributes, .. } => {
                attributes.get(name).map(|s| s.as_str())
            }
            _ => None,
        }
    }

    pub fn style(&self, id: NodeId) -> Option<&StyleValue> {
        match self.kind(id)? {
            MemoryNodeKind::Element { style, .. } => style.as_ref(),
            _ => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .and_then(|slot| slot.as_ref())
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Depth-first search for the first element with the given tag.
    pub fn find_tag(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        if self.tag(root) == Some(tag) {
            return Some(root);
        }
        for &child in self.children(root) {
            if let Some(found) = self.find_tag(child, tag) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated text content of the subtree, document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id).and_then(|slot| slot.as_ref()) else {
            return;
        };
        if let MemoryNodeKind::Text(text) = &node.kind {
            out.push_str(text);
        }
        for &child in &node.children {
            self.collect_text(child, out);
        }
    }

    /// Stable HTML-ish serialization for assertions. Grouping hosts are
    /// layout-transparent and serialize as their children.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id).and_then(|slot| slot.as_ref()) else {
            return;
        };
        match &node.kind {
            MemoryNodeKind::Text(text) => out.push_str(text),
            MemoryNodeKind::Group => {
                for &child in &node.children {
                    self.write_html(child, out);
                }
            }
            MemoryNodeKind::Element {
                tag,
                attributes,
                style,
                ..
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(value);
                    out.push('"');
                }
                if let Some(style) = style {
                    out.push_str(" style=\"");
                    out.push_str(&style.to_css_text());
                    out.push('"');
                }
                out.push('>');
                for &child in &node.children {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    /// Invoke the listener registered for `event` on `id`, if any. Returns
    /// whether a listener ran. Handlers are cloned out before invocation so
    /// they are free to mutate application state that re-enters the document.
    pub fn dispatch(&self, id: NodeId, event: &str) -> bool {
        let handler = match self.kind(id) {
            Some(MemoryNodeKind::Element { listeners, .. }) => listeners.get(event).cloned(),
            _ => None,
        };
        match handler {
            Some(handler) => {
                handler.invoke();
                true
            }
            None => false,
        }
    }
}

impl DomBackend for MemoryDom {
    fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(MemoryNodeKind::Text(text.to_owned()))
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(MemoryNodeKind::Element {
            tag: tag.to_owned(),
            attributes: IndexMap::new(),
            style: None,
            listeners: IndexMap::new(),
        })
    }

    fn create_group(&mut self) -> NodeId {
        self.alloc(MemoryNodeKind::Group)
    }

    fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        self.mutations += 1;
        match &mut self.node_mut(id)?.kind {
            MemoryNodeKind::Text(current) => {
                *current = text.to_owned();
                Ok(())
            }
            _ => Err(DomError::NotAText { id }),
        }
    }

    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.mutations += 1;
        let (attributes, _, _) = self.element_mut(id)?;
        attributes.insert(name.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        self.mutations += 1;
        let (attributes, _, _) = self.element_mut(id)?;
        attributes.shift_remove(name);
        Ok(())
    }

    fn set_style(&mut self, id: NodeId, style: &StyleValue) -> Result<(), DomError> {
        self.mutations += 1;
        let (_, slot, _) = self.element_mut(id)?;
        *slot = Some(style.clone());
        Ok(())
    }

    fn clear_style(&mut self, id: NodeId) -> Result<(), DomError> {
        self.mutations += 1;
        let (_, slot, _) = self.element_mut(id)?;
        *slot = None;
        Ok(())
    }

    fn add_listener(
        &mut self,
        id: NodeId,
        event: &str,
        handler: EventHandler,
    ) -> Result<(), DomError> {
        self.mutations += 1;
        let (_, _, listeners) = self.element_mut(id)?;
        listeners.insert(event.to_owned(), handler);
        Ok(())
    }

    fn remove_listener(&mut self, id: NodeId, event: &str) -> Result<(), DomError> {
        self.mutations += 1;
        let (_, _, listeners) = self.element_mut(id)?;
        listeners.shift_remove(event);
        Ok(())
    }

    fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.node(parent)?;
        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    fn replace(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), DomError> {
        let index = self
            .node(parent)?
            .children
            .iter()
            .position(|&c| c == old_child)
            .ok_or(DomError::NotAChild {
                parent,
                child: old_child,
            })?;
        self.node_mut(new_child)?.parent = Some(parent);
        self.node_mut(parent)?.children[index] = new_child;
        debug!("replace node {old_child} with {new_child} under {parent}");
        self.drop_subtree(old_child);
        Ok(())
    }

    fn remove(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let index = self
            .node(parent)?
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(DomError::NotAChild { parent, child })?;
        self.node_mut(parent)?.children.remove(index);
        debug!("remove node {child} from {parent}");
        self.drop_subtree(child);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/memory_tests.rs"]
mod tests;
