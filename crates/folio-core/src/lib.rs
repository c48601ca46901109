//! Declarative UI runtime for browser-like documents.
//!
//! Application code describes UI as a tree of [`Element`]s: tagged document
//! intrinsics at the leaves, [`Component`]s — functions from a [`Props`] bag
//! to a child tree — in the interior. The runtime expands that description
//! into a virtual tree, diffs it against the previous pass, and mutates a
//! live document through the narrow [`folio_dom::DomBackend`] interface.
//! Per-instance state survives re-renders via hooks backed by a tree of hook
//! nodes that mirrors the component tree; contexts flow values down that
//! tree; subtrees waiting on asynchronous resources render a fallback until
//! the resource settles.

mod build;
mod context;
mod element;
mod hooks;
mod props;
mod reconcile;
mod root;
mod runtime;
mod suspense;
pub mod testing;
mod tree;
mod vnode;

pub use context::{create_context, use_context, Context, ContextId};
pub use element::{create_element, Component, Element, Render};
pub use hooks::{
    dep_hash, use_callback, use_effect, use_imperative_handle, use_memo, use_reducer, use_ref,
    use_state, Cleanup, Deps, Dispatch, SetState,
};
pub use props::{PropValue, Props, Ref};
pub use root::{RenderError, Root};
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle, RuntimeScheduler};
pub use suspense::{use_resource, Suspend};
pub use tree::{HookId, HookTree};
pub use vnode::{VKind, VNode};

pub use folio_dom::{
    DomBackend, DomError, EventHandler, MemoryDom, NodeId, StyleValue,
};
