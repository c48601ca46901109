//! Ambient values flowing down the component tree.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::element::Element;
use crate::tree::{self, HookCell};

/// Identifier of one context object, unique within the process.
pub type ContextId = u64;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A context: a default value plus a provider constructor. Descendants of a
/// provider read the provided value; everything else reads the default.
pub struct Context<T> {
    id: ContextId,
    default: Rc<T>,
}

impl<T> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            default: Rc::clone(&self.default),
        }
    }
}

impl<T> Context<T> {
    pub fn id(&self) -> ContextId {
        self.id
    }
}

impl<T: Clone + 'static> Context<T> {
    /// An element publishing `value` to every descendant in `children`.
    pub fn provider(&self, value: T, children: Vec<Element>) -> Element {
        Element::Provider {
            provider: ContextProvider {
                context: self.id,
                value: Rc::new(value),
            },
            children,
            key: None,
        }
    }

    /// As [`Context::provider`], keyed for sibling identity.
    pub fn keyed_provider(&self, key: impl ToString, value: T, children: Vec<Element>) -> Element {
        match self.provider(value, children) {
            Element::Provider {
                provider, children, ..
            } => Element::Provider {
                provider,
                children,
                key: Some(key.to_string()),
            },
            other => other,
        }
    }

    pub(crate) fn default_value(&self) -> T {
        (*self.default).clone()
    }
}

pub fn create_context<T: 'static>(default: T) -> Context<T> {
    Context {
        id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
        default: Rc::new(default),
    }
}

/// The payload a provider element carries: which context, and the value to
/// publish into the provider's hook node.
#[derive(Clone)]
pub struct ContextProvider {
    pub(crate) context: ContextId,
    pub(crate) value: Rc<dyn Any>,
}

impl fmt::Debug for ContextProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextProvider({})", self.context)
    }
}

/// Read the nearest provided value for `context`, or its default when no
/// ancestor provider exists.
pub fn use_context<T: Clone + 'static>(context: &Context<T>) -> T {
    let id = context.id;
    tree::with_current(|tree| {
        let node = tree.current();
        let index = node.alloc_cursor();
        if index == node.cell_count() {
            node.push_cell(HookCell::ContextRead { context: id });
        } else {
            node.with_cell(index, |cell| match cell {
                HookCell::ContextRead { context } if *context == id => {}
                other => panic!(
                    "context read bound to a {} cell; the hook call order changed between renders",
                    other.kind()
                ),
            });
        }
        match node.lookup_context(id) {
            Some(value) => value
                .downcast_ref::<T>()
                .cloned()
                .unwrap_or_else(|| panic!("context value has an unexpected type")),
            None => context.default_value(),
        }
    })
}
