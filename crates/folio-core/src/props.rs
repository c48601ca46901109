//! Property bags carried by elements.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use folio_dom::{EventHandler, NodeId, StyleValue};

use crate::element::Element;

/// Mutable cell with stable identity across renders; the shape `use_ref`
/// hands out and the shape the `ref` prop writes document handles into.
pub type Ref<T> = Rc<RefCell<T>>;

/// A single prop value. Handlers and refs compare by pointer identity,
/// everything else by value.
#[derive(Clone)]
pub enum PropValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Style(StyleValue),
    Handler(EventHandler),
    NodeRef(Ref<Option<NodeId>>),
}

impl PropValue {
    /// Equality as prop diffing sees it.
    pub(crate) fn same(&self, other: &PropValue) -> bool {
        match (self, other) {
            (PropValue::Text(a), PropValue::Text(b)) => a == b,
            (PropValue::Number(a), PropValue::Number(b)) => a == b,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Style(a), PropValue::Style(b)) => a == b,
            (PropValue::Handler(a), PropValue::Handler(b)) => a.ptr_eq(b),
            (PropValue::NodeRef(a), PropValue::NodeRef(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Text(text) => write!(f, "{text:?}"),
            PropValue::Number(n) => write!(f, "{n}"),
            PropValue::Bool(b) => write!(f, "{b}"),
            PropValue::Style(style) => write!(f, "style({})", style.to_css_text()),
            PropValue::Handler(_) => f.write_str("handler"),
            PropValue::NodeRef(_) => f.write_str("ref"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Text(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Text(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Number(value as f64)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<StyleValue> for PropValue {
    fn from(value: StyleValue) -> Self {
        PropValue::Style(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        PropValue::Handler(value)
    }
}

/// Ordered prop map plus the child list and optional sibling key.
///
/// Built with a consuming chain:
///
/// ```ignore
/// Props::new()
///     .set("className", "toolbar")
///     .on("click", || { .. })
///     .child(Element::text("go"))
/// ```
#[derive(Clone, Default, Debug)]
pub struct Props {
    values: IndexMap<String, PropValue>,
    children: Vec<Element>,
    key: Option<String>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        self.values.insert(name.to_owned(), value.into());
        self
    }

    /// Attach an event handler; `event` is the document event name
    /// (`"click"`), stored under the `on`-prefixed prop name.
    pub fn on(mut self, event: &str, handler: impl Fn() + 'static) -> Self {
        self.values.insert(
            format!("on{event}"),
            PropValue::Handler(EventHandler::new(handler)),
        );
        self
    }

    /// Receive the document handle once the element is live.
    pub fn node_ref(mut self, target: Ref<Option<NodeId>>) -> Self {
        self.values
            .insert("ref".to_owned(), PropValue::NodeRef(target));
        self
    }

    pub fn key(mut self, key: impl ToString) -> Self {
        self.key = Some(key.to_string());
        self
    }

    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: Vec<Element>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        match self.values.get(name)? {
            PropValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn get_number(&self, name: &str) -> Option<f64> {
        match self.values.get(name)? {
            PropValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn child_elements(&self) -> &[Element] {
        &self.children
    }

    pub fn key_value(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// The effective prop map alone: values and key, no children. This is
    /// what virtual nodes carry.
    pub(crate) fn detached(&self) -> Props {
        Props {
            values: self.values.clone(),
            children: Vec::new(),
            key: self.key.clone(),
        }
    }
}
