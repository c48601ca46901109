use std::cell::RefCell;
use std::rc::Rc;

use folio_core::testing::TestRule;
use folio_core::{create_context, use_context, use_state, Component, Element, Props, SetState};

fn reader(theme: folio_core::Context<String>) -> Component {
    Component::new("Reader", move |_props| Ok(Element::text(use_context(&theme))))
}

#[test]
fn descendants_see_the_provided_value_or_the_default() {
    let theme = create_context("d".to_owned());
    let inner = reader(theme.clone());

    let mut rule = TestRule::new();
    rule.render(theme.provider("x".to_owned(), vec![inner.el(Props::new())]))
        .unwrap();
    assert_eq!(rule.text(), "x");

    rule.render(inner.el(Props::new())).unwrap();
    assert_eq!(rule.text(), "d");
}

#[test]
fn the_nearest_provider_wins() {
    let theme = create_context("default".to_owned());
    let inner = reader(theme.clone());

    let tree = theme.provider(
        "outer".to_owned(),
        vec![
            inner.el(Props::new()),
            theme.provider("inner".to_owned(), vec![inner.el(Props::new())]),
        ],
    );
    let mut rule = TestRule::new();
    rule.render(tree).unwrap();
    assert_eq!(rule.text(), "outerinner");
}

#[test]
fn provider_value_updates_reach_readers_on_the_next_pass() {
    thread_local! {
        static HANDLE: RefCell<Option<SetState<i64>>> = RefCell::new(None);
    }

    let version = create_context("v0".to_owned());
    let inner = reader(version.clone());
    let app = {
        let version = version.clone();
        let inner = inner.clone();
        Component::new("App", move |_props| {
            let (revision, set_revision) = use_state(|| 0i64);
            HANDLE.with(|slot| *slot.borrow_mut() = Some(set_revision.clone()));
            Ok(version.provider(format!("v{revision}"), vec![inner.el(Props::new())]))
        })
    };

    let mut rule = TestRule::new();
    rule.render(app.el(Props::new())).unwrap();
    assert_eq!(rule.text(), "v0");

    HANDLE.with(|slot| slot.borrow().clone().unwrap()).set(3);
    rule.pump().unwrap();
    assert_eq!(rule.text(), "v3");
}

#[test]
fn contexts_with_distinct_ids_do_not_collide() {
    let first = create_context(1i64);
    let second = create_context(2i64);
    let probe = {
        let first = first.clone();
        let second = second.clone();
        Component::new("Probe", move |_props| {
            let a = use_context(&first);
            let b = use_context(&second);
            Ok(Element::text(format!("{a},{b}")))
        })
    };

    let tree = first.provider(10, vec![second.provider(20, vec![probe.el(Props::new())])]);
    let mut rule = TestRule::new();
    rule.render(tree).unwrap();
    assert_eq!(rule.text(), "10,20");
}
