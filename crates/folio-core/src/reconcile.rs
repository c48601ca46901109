//! Diffing the new virtual tree against the previous pass and mutating the
//! document to match.

use log::{debug, trace};

use folio_dom::{DomBackend, DomError, NodeId, StyleValue};

use crate::props::{PropValue, Props};
use crate::vnode::{VKind, VNode};

pub(crate) struct Reconciler<'d, D: DomBackend> {
    pub dom: &'d mut D,
}

impl<'d, D: DomBackend> Reconciler<'d, D> {
    /// Reconcile one position: `new` against `old` inside `container`.
    /// Records the resulting document handle on `new`.
    pub(crate) fn reconcile(
        &mut self,
        new: Option<&mut VNode>,
        old: Option<&VNode>,
        container: NodeId,
    ) -> Result<(), DomError> {
        match (new, old) {
            (None, None) => Ok(()),

            (None, Some(old)) => {
                if let Some(handle) = old.dom {
                    debug!("removing {:?} node {handle}", old.kind);
                    self.dom.remove(container, handle)?;
                }
                release_ref(old);
                Ok(())
            }

            (Some(new), None) => {
                let handle = self.materialize(new)?;
                self.dom.append(container, handle)
            }

            (Some(new), Some(old)) if new.can_reuse(old) => {
                self.update_in_place(new, old, container)
            }

            (Some(new), Some(old)) => {
                trace!("replacing {:?} with {:?}", old.kind, new.kind);
                let handle = self.materialize(new)?;
                match old.dom {
                    Some(old_handle) => self.dom.replace(container, handle, old_handle)?,
                    None => self.dom.append(container, handle)?,
                }
                release_ref(old);
                Ok(())
            }
        }
    }

    fn update_in_place(
        &mut self,
        new: &mut VNode,
        old: &VNode,
        container: NodeId,
    ) -> Result<(), DomError> {
        let Some(handle) = old.dom else {
            // The old node was never committed; materialize afresh.
            let handle = self.materialize(new)?;
            return self.dom.append(container, handle);
        };
        new.dom = Some(handle);
        match new.kind {
            VKind::Text => {
                if new.text_value() != old.text_value() {
                    self.dom.set_text(handle, new.text_value().unwrap_or(""))?;
                }
                Ok(())
            }
            VKind::Element(_) => {
                self.diff_props(handle, &new.props, &old.props)?;
                self.reconcile_children(new, old, handle)
            }
            // Grouping hosts carry no props of their own.
            VKind::Fragment | VKind::Suspense | VKind::Provider => {
                self.reconcile_children(new, old, handle)
            }
        }
    }

    /// Index-aligned pairwise recursion. Keys do not reorder: they only gate
    /// reuse, so a keyed insertion or removal at position `i` replaces the
    /// subtree at `i` instead of silently mutating an unrelated one.
    fn reconcile_children(
        &mut self,
        new: &mut VNode,
        old: &VNode,
        container: NodeId,
    ) -> Result<(), DomError> {
        let count = new.children.len().max(old.children.len());
        for index in 0..count {
            self.reconcile(
                new.children.get_mut(index),
                old.children.get(index),
                container,
            )?;
        }
        Ok(())
    }

    /// Create the document subtree for `new`, recording handles on the way.
    fn materialize(&mut self, new: &mut VNode) -> Result<NodeId, DomError> {
        let handle = match &new.kind {
            VKind::Text => self.dom.create_text(new.text_value().unwrap_or("")),
            VKind::Element(tag) => {
                let handle = self.dom.create_element(tag);
                self.apply_props(handle, &new.props)?;
                handle
            }
            VKind::Fragment | VKind::Suspense | VKind::Provider => self.dom.create_group(),
        };
        new.dom = Some(handle);
        for child in &mut new.children {
            let child_handle = self.materialize(child)?;
            self.dom.append(handle, child_handle)?;
        }
        Ok(handle)
    }

    fn apply_props(&mut self, handle: NodeId, props: &Props) -> Result<(), DomError> {
        for (name, value) in props.iter() {
            self.apply_prop(handle, name, value)?;
        }
        Ok(())
    }

    /// Remove props the new tree dropped, then set added or changed ones.
    /// Unchanged values are skipped; re-application would be idempotent.
    fn diff_props(&mut self, handle: NodeId, new: &Props, old: &Props) -> Result<(), DomError> {
        for (name, old_value) in old.iter() {
            if new.get(name).is_none() {
                self.remove_prop(handle, name, old_value)?;
            }
        }
        for (name, new_value) in new.iter() {
            match old.get(name) {
                Some(previous) if previous.same(new_value) => {}
                _ => self.apply_prop(handle, name, new_value)?,
            }
        }
        Ok(())
    }

    fn apply_prop(&mut self, handle: NodeId, name: &str, value: &PropValue) -> Result<(), DomError> {
        if matches!(name, "__self" | "__source") {
            return Ok(());
        }
        if let (Some(event), PropValue::Handler(handler)) = (listener_event(name), value) {
            return self.dom.add_listener(handle, &event, handler.clone());
        }
        match (name, value) {
            ("style", PropValue::Style(style)) => self.dom.set_style(handle, style),
            ("style", PropValue::Text(text)) => self
                .dom
                .set_style(handle, &StyleValue::Text(text.clone())),
            ("className", PropValue::Text(class)) => {
                self.dom.set_attribute(handle, "class", class)
            }
            ("ref", PropValue::NodeRef(target)) => {
                *target.borrow_mut() = Some(handle);
                Ok(())
            }
            (_, PropValue::Text(text)) => self.dom.set_attribute(handle, name, text),
            (_, PropValue::Number(number)) => {
                self.dom.set_attribute(handle, name, &format_number(*number))
            }
            (_, PropValue::Bool(true)) => self.dom.set_attribute(handle, name, ""),
            (_, PropValue::Bool(false)) => self.dom.remove_attribute(handle, name),
            (_, value) => {
                debug!("prop {name} has unroutable value {value:?}; skipped");
                Ok(())
            }
        }
    }

    fn remove_prop(
        &mut self,
        handle: NodeId,
        name: &str,
        old_value: &PropValue,
    ) -> Result<(), DomError> {
        if matches!(name, "__self" | "__source") {
            return Ok(());
        }
        if let (Some(event), PropValue::Handler(_)) = (listener_event(name), old_value) {
            return self.dom.remove_listener(handle, &event);
        }
        match (name, old_value) {
            ("style", _) => self.dom.clear_style(handle),
            ("className", _) => self.dom.set_attribute(handle, "class", ""),
            ("ref", PropValue::NodeRef(target)) => {
                let mut current = target.borrow_mut();
                if *current == Some(handle) {
                    *current = None;
                }
                Ok(())
            }
            _ => self.dom.remove_attribute(handle, name),
        }
    }
}

/// Release a dropped subtree's `ref` bindings, leaving refs that have
/// already been claimed by a newer node untouched.
fn release_ref(old: &VNode) {
    if let Some(PropValue::NodeRef(target)) = old.props.get("ref") {
        let mut current = target.borrow_mut();
        if *current == old.dom {
            *current = None;
        }
    }
    for child in &old.children {
        release_ref(child);
    }
}

/// Attribute-bound event props: `onClick` → `click`.
fn listener_event(name: &str) -> Option<String> {
    name.strip_prefix("on")
        .filter(|rest| !rest.is_empty())
        .map(|rest| rest.to_ascii_lowercase())
}

fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.is_finite() && number.abs() < i64::MAX as f64 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
