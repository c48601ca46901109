use std::cell::RefCell;
use std::rc::Rc;

use folio_core::testing::TestRule;
use folio_core::{
    create_element, use_ref, use_state, Component, Element, NodeId, Props, Ref,
};

#[test]
fn rendering_the_same_tree_twice_touches_nothing() {
    let element = create_element(
        "section",
        Props::new().set("id", "home").set("className", "page"),
        vec![
            create_element("h1", Props::new(), vec![Element::text("title")]),
            Element::text("body"),
        ],
    );

    let mut rule = TestRule::new();
    rule.render(element.clone()).unwrap();
    let html = rule.html();
    let mutations = rule.dom().mutation_count();
    let nodes = rule.dom().len();

    rule.render(element).unwrap();
    assert_eq!(rule.html(), html);
    assert_eq!(rule.dom().mutation_count(), mutations);
    assert_eq!(rule.dom().len(), nodes);
}

#[test]
fn refs_reach_the_live_document_node() {
    thread_local! {
        static TARGETS: RefCell<Vec<Ref<Option<NodeId>>>> =
            const { RefCell::new(Vec::new()) };
    }

    let focusable = Component::new("Focusable", |_props| {
        let target = use_ref(|| None::<NodeId>);
        TARGETS.with(|slot| slot.borrow_mut().push(Rc::clone(&target)));
        Ok(create_element(
            "input",
            Props::new().node_ref(Rc::clone(&target)),
            vec![],
        ))
    });

    let mut rule = TestRule::new();
    rule.render(focusable.el(Props::new())).unwrap();
    rule.render(focusable.el(Props::new())).unwrap();

    let (first, second) = TARGETS.with(|slot| {
        let targets = slot.borrow();
        (Rc::clone(&targets[0]), Rc::clone(&targets[1]))
    });
    // The ref hook handed out the same cell on both renders, and it points
    // at the committed input element.
    assert!(Rc::ptr_eq(&first, &second));
    let input = rule.find_tag("input").expect("input mounted");
    assert_eq!(*first.borrow(), Some(input));
}

#[test]
fn the_document_mirrors_the_committed_tree() {
    fn check(rule: &TestRule, node: &folio_core::VNode) {
        let handle = node.dom.expect("committed node has a handle");
        if let folio_core::VKind::Element(tag) = &node.kind {
            assert_eq!(rule.dom().tag(handle), Some(tag.as_str()));
        }
        let child_handles: Vec<NodeId> = node
            .children
            .iter()
            .map(|child| child.dom.expect("committed child"))
            .collect();
        assert_eq!(rule.dom().children(handle), child_handles.as_slice());
        for child in &node.children {
            check(rule, child);
        }
    }

    let tree = create_element(
        "article",
        Props::new().set("id", "a"),
        vec![
            Element::fragment(vec![Element::text("x"), Element::text("y")]),
            create_element("footer", Props::new(), vec![Element::text("z")]),
        ],
    );
    let mut rule = TestRule::new();
    rule.render(tree).unwrap();

    let committed = rule.root().committed_tree().expect("committed");
    check(&rule, committed);
    assert_eq!(rule.html(), "<article id=\"a\">xy<footer>z</footer></article>");
}

#[test]
fn unmounting_empties_the_document() {
    let widget = Component::new("Widget", |_props| {
        let (label, _set) = use_state(|| "alive".to_owned());
        Ok(create_element("div", Props::new(), vec![Element::text(label)]))
    });

    let mut rule = TestRule::new();
    rule.render(widget.el(Props::new())).unwrap();
    assert_eq!(rule.text(), "alive");

    rule.unmount().unwrap();
    assert_eq!(rule.text(), "");
    assert_eq!(rule.dom().children(rule.container()).len(), 0);
}

#[test]
fn conditional_subtrees_drop_their_state_when_unmounted() {
    thread_local! {
        static TOGGLE: RefCell<Option<folio_core::SetState<bool>>> = const { RefCell::new(None) };
        static BUMP: RefCell<Option<folio_core::SetState<i64>>> = const { RefCell::new(None) };
    }

    let inner = Component::new("Inner", |_props| {
        let (n, set_n) = use_state(|| 0i64);
        BUMP.with(|slot| *slot.borrow_mut() = Some(set_n.clone()));
        Ok(Element::text(format!("inner:{n}")))
    });
    let outer = {
        let inner = inner.clone();
        Component::new("Outer", move |_props| {
            let (shown, set_shown) = use_state(|| true);
            TOGGLE.with(|slot| *slot.borrow_mut() = Some(set_shown.clone()));
            Ok(if shown {
                inner.el(Props::new())
            } else {
                Element::text("hidden")
            })
        })
    };

    let mut rule = TestRule::new();
    rule.render(outer.el(Props::new())).unwrap();
    BUMP.with(|slot| slot.borrow().clone().unwrap()).set(9);
    rule.pump().unwrap();
    assert_eq!(rule.text(), "inner:9");

    // Hide, then show again: the inner instance was swept and restarts.
    TOGGLE.with(|slot| slot.borrow().clone().unwrap()).set(false);
    rule.pump().unwrap();
    assert_eq!(rule.text(), "hidden");
    TOGGLE.with(|slot| slot.borrow().clone().unwrap()).set(true);
    rule.pump().unwrap();
    assert_eq!(rule.text(), "inner:0");
}
