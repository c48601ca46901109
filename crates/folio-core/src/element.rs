//! Author-facing element values.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::context::ContextProvider;
use crate::props::Props;
use crate::suspense::Suspend;

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

/// What a component body produces: a child tree, or the pending-resource
/// signal propagated with `?` from a suspending hook.
pub type Render = Result<Element, Suspend>;

type ComponentFn = Rc<dyn Fn(&Props) -> Render>;

/// A user component: a named function from a prop bag to a child tree.
///
/// Construction assigns a process-unique discriminator, so a `Component`
/// value identifies one logical component for the lifetime of the process.
/// Create it once and clone the handle into the elements that use it;
/// constructing a fresh `Component` from the same closure every render
/// creates a new identity and discards the old instance's state.
#[derive(Clone)]
pub struct Component {
    name: Rc<str>,
    discriminator: u64,
    render: ComponentFn,
}

impl Component {
    pub fn new(name: &str, render: impl Fn(&Props) -> Render + 'static) -> Self {
        Self {
            name: Rc::from(name),
            discriminator: NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed),
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn discriminator(&self) -> u64 {
        self.discriminator
    }

    pub(crate) fn invoke(&self, props: &Props) -> Render {
        (self.render)(props)
    }

    /// An element invoking this component with `props`.
    pub fn el(&self, props: Props) -> Element {
        Element::Composite {
            component: self.clone(),
            props,
        }
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.discriminator == other.discriminator
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name)
    }
}

/// A declarative description of UI. Pure data: building an element never
/// invokes a component.
#[derive(Clone, Debug)]
pub enum Element {
    /// Renders nothing.
    None,
    /// A text node.
    Text(String),
    /// A tagged document element; children travel inside `props`.
    Intrinsic { tag: String, props: Props },
    /// A user component invocation.
    Composite { component: Component, props: Props },
    /// An unkeyed grouping of children.
    Fragment { children: Vec<Element> },
    /// A suspense boundary guarding `children` with `fallback`.
    Suspense {
        fallback: Box<Element>,
        children: Vec<Element>,
        key: Option<String>,
    },
    /// A context provider publishing a value to its descendants.
    Provider {
        provider: ContextProvider,
        children: Vec<Element>,
        key: Option<String>,
    },
    /// An array of elements produced by application code (e.g. a mapped
    /// list); expands like a fragment.
    List(Vec<Element>),
}

impl Element {
    /// A text node from anything displayable; numbers render as text.
    pub fn text(value: impl ToString) -> Element {
        Element::Text(value.to_string())
    }

    pub fn fragment(children: Vec<Element>) -> Element {
        Element::Fragment { children }
    }

    pub fn suspense(fallback: Element, children: Vec<Element>) -> Element {
        Element::Suspense {
            fallback: Box::new(fallback),
            children,
            key: None,
        }
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Element::Text(value.to_owned())
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        Element::Text(value)
    }
}

impl From<i64> for Element {
    fn from(value: i64) -> Self {
        Element::text(value)
    }
}

/// The element factory: an intrinsic element with `children` merged into
/// the prop bag's child list. Never invokes components.
pub fn create_element(tag: &str, props: Props, children: Vec<Element>) -> Element {
    Element::Intrinsic {
        tag: tag.to_owned(),
        props: props.children(children),
    }
}
