use folio_core::testing::TestRule;
use folio_core::{use_effect, use_state, Component, Element, Props, RenderError};

#[test]
fn a_panicking_component_aborts_the_pass_and_keeps_the_document() {
    let stable = Component::new("Stable", |_props| Ok(Element::text("before")));
    let faulty = Component::new("Faulty", |_props| panic!("boom"));

    let mut rule = TestRule::new();
    rule.render(stable.el(Props::new())).unwrap();
    assert_eq!(rule.text(), "before");

    let result = rule.render(faulty.el(Props::new()));
    match result {
        Err(RenderError::User(message)) => assert!(message.contains("boom")),
        other => panic!("expected a contained component panic, got {other:?}"),
    }
    // The failed pass rolled nothing out: the previous document stands.
    assert_eq!(rule.text(), "before");

    // The root still works afterwards.
    rule.render(stable.el(Props::new())).unwrap();
    assert_eq!(rule.text(), "before");
}

#[test]
fn a_panicking_effect_is_contained_and_the_commit_stands() {
    let risky = Component::new("Risky", |_props| {
        use_effect(None, || panic!("effect exploded"));
        Ok(Element::text("rendered"))
    });

    let mut rule = TestRule::new();
    rule.render(risky.el(Props::new())).unwrap();
    // The pass committed before the effect ran; the panic was contained.
    assert_eq!(rule.text(), "rendered");
}

#[test]
fn effects_after_a_panicking_one_still_run() {
    use std::cell::Cell;
    use std::rc::Rc;

    let later_ran = Rc::new(Cell::new(false));
    let component = {
        let later_ran = Rc::clone(&later_ran);
        Component::new("Pair", move |_props| {
            use_effect(None, || panic!("first effect exploded"));
            let flag = Rc::clone(&later_ran);
            use_effect(None, move || {
                flag.set(true);
                None
            });
            Ok(Element::text("x"))
        })
    };

    let mut rule = TestRule::new();
    rule.render(component.el(Props::new())).unwrap();
    assert!(later_ran.get());
}

#[test]
fn a_failed_pass_keeps_prior_component_state() {
    thread_local! {
        static HANDLE: std::cell::RefCell<Option<folio_core::SetState<i64>>> =
            const { std::cell::RefCell::new(None) };
    }

    let counter = Component::new("Counter", |_props| {
        let (count, set_count) = use_state(|| 0i64);
        HANDLE.with(|slot| *slot.borrow_mut() = Some(set_count.clone()));
        Ok(Element::text(count))
    });
    let faulty = Component::new("Faulty", |_props| panic!("down"));

    let mut rule = TestRule::new();
    rule.render(counter.el(Props::new())).unwrap();
    HANDLE.with(|slot| slot.borrow().clone().unwrap()).set(4);
    rule.pump().unwrap();
    assert_eq!(rule.text(), "4");

    assert!(rule.render(faulty.el(Props::new())).is_err());
    assert_eq!(rule.text(), "4");

    // Remounting the counter finds its hook node where it left off.
    rule.render(counter.el(Props::new())).unwrap();
    assert_eq!(rule.text(), "4");
}
