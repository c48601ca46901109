use std::cell::{Cell, RefCell};
use std::rc::Rc;

use folio_dom::{MemoryDom, NodeId, StyleValue};

use super::*;
use crate::props::Props;

fn velement(tag: &str, props: Props, children: Vec<VNode>) -> VNode {
    let mut node = VNode::new(VKind::Element(tag.to_owned()));
    node.props = props;
    node.children = children;
    node
}

fn commit(
    dom: &mut MemoryDom,
    container: NodeId,
    new: Option<&mut VNode>,
    old: Option<&VNode>,
) {
    Reconciler { dom }
        .reconcile(new, old, container)
        .expect("reconcile succeeds");
}

#[test]
fn materializes_elements_with_routed_props() {
    let (mut dom, container) = MemoryDom::with_container();
    let clicked = Rc::new(Cell::new(false));
    let target = Rc::new(RefCell::new(None));

    let flag = Rc::clone(&clicked);
    let props = Props::new()
        .set("id", "go")
        .set("className", "big")
        .set("style", StyleValue::Text("color: red".to_owned()))
        .set("disabled", true)
        .on("click", move || flag.set(true))
        .node_ref(Rc::clone(&target));
    let mut new = velement("button", props, vec![VNode::text("run")]);
    commit(&mut dom, container, Some(&mut new), None);

    let button = dom.find_tag(container, "button").expect("button exists");
    assert_eq!(new.dom, Some(button));
    assert_eq!(*target.borrow(), Some(button));
    assert_eq!(dom.attribute(button, "id"), Some("go"));
    assert_eq!(dom.attribute(button, "class"), Some("big"));
    assert_eq!(dom.attribute(button, "disabled"), Some(""));
    assert_eq!(dom.style(button), Some(&StyleValue::Text("color: red".to_owned())));
    assert_eq!(dom.text_content(button), "run");

    assert!(dom.dispatch(button, "click"));
    assert!(clicked.get());
}

#[test]
fn text_updates_reuse_the_node() {
    let (mut dom, container) = MemoryDom::with_container();
    let mut old = VNode::text("1");
    commit(&mut dom, container, Some(&mut old), None);
    let first_handle = old.dom.expect("committed");

    let mut new = VNode::text("2");
    commit(&mut dom, container, Some(&mut new), Some(&old));
    assert_eq!(new.dom, Some(first_handle));
    assert_eq!(dom.text_content(container), "2");
}

#[test]
fn prop_diff_removes_applies_and_skips_unchanged() {
    let (mut dom, container) = MemoryDom::with_container();
    let handler = crate::EventHandler::new(|| {});

    let old_props = Props::new()
        .set("id", "a")
        .set("className", "x")
        .set("title", "keep")
        .set("style", StyleValue::Text("margin: 0".to_owned()))
        .set("onclick", handler.clone());
    let mut old = velement("div", old_props, vec![]);
    commit(&mut dom, container, Some(&mut old), None);
    let div = old.dom.unwrap();

    // `id` changes, `className`/`style`/listener disappear, `title` stays.
    let before = dom.mutation_count();
    let mut new = velement("div", Props::new().set("id", "b").set("title", "keep"), vec![]);
    commit(&mut dom, container, Some(&mut new), Some(&old));

    assert_eq!(dom.attribute(div, "id"), Some("b"));
    assert_eq!(dom.attribute(div, "class"), Some(""));
    assert_eq!(dom.style(div), None);
    assert!(!dom.dispatch(div, "click"));
    assert_eq!(dom.attribute(div, "title"), Some("keep"));
    // class clear + style clear + listener removal + id write; nothing else.
    assert_eq!(dom.mutation_count() - before, 4);
}

#[test]
fn unchanged_props_touch_nothing() {
    let (mut dom, container) = MemoryDom::with_container();
    let handler = crate::EventHandler::new(|| {});
    let props = Props::new().set("id", "a").set("onclick", handler);

    let mut old = velement("div", props.clone(), vec![VNode::text("t")]);
    commit(&mut dom, container, Some(&mut old), None);

    let before = dom.mutation_count();
    let mut new = velement("div", props, vec![VNode::text("t")]);
    commit(&mut dom, container, Some(&mut new), Some(&old));
    assert_eq!(dom.mutation_count(), before);
    assert_eq!(new.dom, old.dom);
}

#[test]
fn tag_changes_replace_in_position() {
    let (mut dom, container) = MemoryDom::with_container();
    let mut old = velement("span", Props::new(), vec![VNode::text("x")]);
    commit(&mut dom, container, Some(&mut old), None);
    let old_handle = old.dom.unwrap();

    let mut new = velement("em", Props::new(), vec![VNode::text("x")]);
    commit(&mut dom, container, Some(&mut new), Some(&old));

    assert!(!dom.contains(old_handle));
    assert_eq!(dom.children(container).len(), 1);
    assert_eq!(dom.to_html(container), "<root><em>x</em></root>");
}

#[test]
fn key_changes_replace_even_with_the_same_tag() {
    let (mut dom, container) = MemoryDom::with_container();
    let mut old = velement("li", Props::new(), vec![]);
    old.key = Some("1".to_owned());
    commit(&mut dom, container, Some(&mut old), None);
    let old_handle = old.dom.unwrap();

    let mut new = velement("li", Props::new(), vec![]);
    new.key = Some("2".to_owned());
    commit(&mut dom, container, Some(&mut new), Some(&old));
    assert_ne!(new.dom, Some(old_handle));
    assert!(!dom.contains(old_handle));
}

#[test]
fn children_align_by_index() {
    let (mut dom, container) = MemoryDom::with_container();
    let mut old = velement(
        "ul",
        Props::new(),
        vec![VNode::text("a"), VNode::text("b"), VNode::text("c")],
    );
    commit(&mut dom, container, Some(&mut old), None);

    // Shrinks: the extra tail child is removed.
    let mut shorter = velement("ul", Props::new(), vec![VNode::text("a"), VNode::text("b")]);
    commit(&mut dom, container, Some(&mut shorter), Some(&old));
    assert_eq!(dom.text_content(container), "ab");

    // Grows: the new tail child is appended.
    let mut longer = velement(
        "ul",
        Props::new(),
        vec![VNode::text("a"), VNode::text("b"), VNode::text("d")],
    );
    commit(&mut dom, container, Some(&mut longer), Some(&shorter));
    assert_eq!(dom.text_content(container), "abd");
}

#[test]
fn groups_own_a_single_replaceable_handle() {
    let (mut dom, container) = MemoryDom::with_container();
    let mut fragment = VNode::new(VKind::Fragment);
    fragment.children = vec![VNode::text("a"), VNode::text("b")];
    commit(&mut dom, container, Some(&mut fragment), None);

    let host = fragment.dom.expect("group host");
    assert_eq!(dom.children(container), &[host]);
    assert_eq!(dom.children(host).len(), 2);
    assert_eq!(dom.to_html(container), "<root>ab</root>");

    // Replacing the group with an element swaps the one host handle.
    let mut replacement = velement("p", Props::new(), vec![VNode::text("z")]);
    commit(&mut dom, container, Some(&mut replacement), Some(&fragment));
    assert!(!dom.contains(host));
    assert_eq!(dom.to_html(container), "<root><p>z</p></root>");
}

#[test]
fn removal_releases_the_ref() {
    let (mut dom, container) = MemoryDom::with_container();
    let target = Rc::new(RefCell::new(None));
    let mut old = velement("div", Props::new().node_ref(Rc::clone(&target)), vec![]);
    commit(&mut dom, container, Some(&mut old), None);
    assert!(target.borrow().is_some());

    commit(&mut dom, container, None, Some(&old));
    assert!(target.borrow().is_none());
}
