//! Element-to-virtual-tree expansion.
//!
//! Runs inside a pass with the hook tree and runtime installed. Composite
//! elements are invoked with the tree entered at their instance's hook node,
//! so the hooks they call bind to the right cells; providers publish into
//! their node on the way down; suspense nodes catch pending signals from
//! their guarded children and substitute the fallback.

use log::{debug, trace};

use crate::context::ContextProvider;
use crate::element::Element;
use crate::runtime;
use crate::suspense::Suspend;
use crate::tree::{self, HookId, HookNode};
use crate::vnode::{VKind, VNode};

/// Expand the mounted element. The currently-entered pointer must already
/// sit at the root hook node (`start_pass`).
pub(crate) fn build_root(element: &Element) -> Result<Option<VNode>, Suspend> {
    build(element)
}

fn build(element: &Element) -> Result<Option<VNode>, Suspend> {
    match element {
        Element::None => Ok(None),

        Element::Text(text) => Ok(Some(VNode::text(text))),

        Element::Fragment { children } | Element::List(children) => {
            let mut node = VNode::new(VKind::Fragment);
            node.children = build_children(children)?;
            Ok(Some(node))
        }

        Element::Intrinsic { tag, props } => {
            let children = build_children(props.child_elements())?;
            let mut node = VNode::new(VKind::Element(tag.clone()));
            node.props = props.detached();
            node.key = props.key_value().map(str::to_owned);
            node.children = children;
            Ok(Some(node))
        }

        Element::Provider {
            provider,
            children,
            key,
        } => build_provider(provider, children, key.as_deref()),

        Element::Suspense {
            fallback,
            children,
            key,
        } => build_suspense(fallback, children, key.as_deref()),

        Element::Composite { component, props } => {
            let scope = enter_scope(component.name(), props.key_value(), component.discriminator());
            trace!("rendering <{}> under node {}", component.name(), scope.id());
            let result = component
                .invoke(props)
                .and_then(|rendered| build(&rendered));
            exit_scope();
            match result? {
                Some(mut node) => {
                    node.component_id = Some(scope.id());
                    if let Some(key) = props.key_value() {
                        node.key = Some(key.to_owned());
                    }
                    Ok(Some(node))
                }
                None => Ok(None),
            }
        }
    }
}

fn build_provider(
    provider: &ContextProvider,
    children: &[Element],
    key: Option<&str>,
) -> Result<Option<VNode>, Suspend> {
    let scope = enter_scope("context.provider", key, provider.context);
    scope.publish_context(provider.context, provider.value.clone());
    let result = build_children(children);
    exit_scope();
    let mut node = VNode::new(VKind::Provider);
    node.children = result?;
    node.component_id = Some(scope.id());
    node.key = key.map(str::to_owned);
    Ok(Some(node))
}

fn build_suspense(
    fallback: &Element,
    children: &[Element],
    key: Option<&str>,
) -> Result<Option<VNode>, Suspend> {
    let scope = enter_scope("suspense", key, 0);
    runtime::with_current(|handle| handle.ensure_resource_cache(scope.id()));
    let built = match build_children(children) {
        Ok(children) => Ok(children),
        Err(Suspend::Pending { key }) => {
            // Partial children are discarded wholesale; the boundary shows
            // either the full guarded subtree or the full fallback.
            debug!("boundary {} suspended on {key}; rendering fallback", scope.id());
            build(fallback).map(|fallback| fallback.into_iter().collect())
        }
        Err(other) => Err(other),
    };
    exit_scope();
    let mut node = VNode::new(VKind::Suspense);
    node.children = built?;
    node.component_id = Some(scope.id());
    node.key = key.map(str::to_owned);
    Ok(Some(node))
}

fn build_children(children: &[Element]) -> Result<Vec<VNode>, Suspend> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        if let Some(node) = build(child)? {
            out.push(node);
        }
    }
    Ok(out)
}

/// Enter the hook node for a child slot of the current node, creating it on
/// first reach. Unkeyed repeats of the same slot are told apart by their
/// per-pass occurrence index.
fn enter_scope(tag: &str, key: Option<&str>, discriminator: u64) -> HookNode {
    tree::with_current(|tree| {
        let parent = tree.current();
        let slot = tree::slot_hash(tag, key, discriminator);
        let occurrence = if key.is_some() {
            0
        } else {
            parent.next_occurrence(slot)
        };
        let id: HookId = tree::child_id(parent.id(), slot, occurrence);
        tree.enter(id)
    })
}

fn exit_scope() {
    tree::with_current(|tree| tree.exit());
}

#[cfg(test)]
#[path = "tests/build_tests.rs"]
mod tests;
