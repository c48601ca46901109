use std::cell::Cell;
use std::rc::Rc;

use super::*;

#[test]
fn handles_are_never_reused() {
    let mut dom = MemoryDom::new();
    let parent = dom.create_element("div");
    let child = dom.create_text("hi");
    dom.append(parent, child).unwrap();
    dom.remove(parent, child).unwrap();
    assert!(!dom.contains(child));

    let fresh = dom.create_text("again");
    assert_ne!(fresh, child);
    assert!(dom.contains(fresh));
}

#[test]
fn removal_drops_the_whole_subtree() {
    let mut dom = MemoryDom::new();
    let root = dom.create_element("div");
    let list = dom.create_element("ul");
    let item = dom.create_element("li");
    let label = dom.create_text("one");
    dom.append(root, list).unwrap();
    dom.append(list, item).unwrap();
    dom.append(item, label).unwrap();

    dom.remove(root, list).unwrap();
    assert!(!dom.contains(list));
    assert!(!dom.contains(item));
    assert!(!dom.contains(label));
    assert!(dom.contains(root));
}

#[test]
fn replace_swaps_in_place() {
    let mut dom = MemoryDom::new();
    let root = dom.create_element("div");
    let first = dom.create_text("a");
    let second = dom.create_text("b");
    let third = dom.create_text("c");
    dom.append(root, first).unwrap();
    dom.append(root, second).unwrap();

    dom.replace(root, third, first).unwrap();
    assert_eq!(dom.children(root), &[third, second]);
    assert!(!dom.contains(first));
    assert_eq!(dom.text_content(root), "cb");
}

#[test]
fn remove_requires_the_parent_child_relation() {
    let mut dom = MemoryDom::new();
    let a = dom.create_element("div");
    let b = dom.create_element("div");
    let child = dom.create_text("x");
    dom.append(a, child).unwrap();
    assert_eq!(
        dom.remove(b, child),
        Err(DomError::NotAChild { parent: b, child })
    );
}

#[test]
fn groups_serialize_transparently() {
    let mut dom = MemoryDom::new();
    let root = dom.create_element("div");
    let group = dom.create_group();
    let text = dom.create_text("inner");
    dom.append(root, group).unwrap();
    dom.append(group, text).unwrap();
    assert_eq!(dom.to_html(root), "<div>inner</div>");
    assert_eq!(dom.text_content(root), "inner");
}

#[test]
fn styles_serialize_from_text_and_map() {
    let mut dom = MemoryDom::new();
    let el = dom.create_element("span");
    dom.set_style(el, &StyleValue::Text("color: red".into()))
        .unwrap();
    assert_eq!(dom.to_html(el), "<span style=\"color: red\"></span>");

    let mut map = IndexMap::new();
    map.insert("color".to_owned(), "blue".to_owned());
    map.insert("margin".to_owned(), "4px".to_owned());
    dom.set_style(el, &StyleValue::Map(map)).unwrap();
    assert_eq!(
        dom.to_html(el),
        "<span style=\"color: blue; margin: 4px\"></span>"
    );

    dom.clear_style(el).unwrap();
    assert_eq!(dom.to_html(el), "<span></span>");
}

#[test]
fn add_listener_replaces_the_previous_one() {
    let mut dom = MemoryDom::new();
    let button = dom.create_element("button");
    let first_hits = Rc::new(Cell::new(0));
    let second_hits = Rc::new(Cell::new(0));

    let hits = Rc::clone(&first_hits);
    dom.add_listener(button, "click", EventHandler::new(move || hits.set(hits.get() + 1)))
        .unwrap();
    let hits = Rc::clone(&second_hits);
    dom.add_listener(button, "click", EventHandler::new(move || hits.set(hits.get() + 1)))
        .unwrap();

    assert!(dom.dispatch(button, "click"));
    assert_eq!(first_hits.get(), 0);
    assert_eq!(second_hits.get(), 1);

    dom.remove_listener(button, "click").unwrap();
    assert!(!dom.dispatch(button, "click"));
}

#[test]
fn mutation_counter_tracks_writes() {
    let mut dom = MemoryDom::new();
    let el = dom.create_element("div");
    let before = dom.mutation_count();
    dom.set_attribute(el, "id", "x").unwrap();
    dom.remove_attribute(el, "id").unwrap();
    assert_eq!(dom.mutation_count(), before + 2);
}
