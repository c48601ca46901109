//! The hook library.
//!
//! Every hook binds to the next cell of the currently-rendering component's
//! hook node, so a component must call its hooks in the same order on every
//! render. Violations surface as panics naming the mismatched cell shapes.
//!
//! Dependency arrays are per-element hashes built with [`deps!`]:
//! `None` means run on every render, `deps![]` means run once, and a
//! non-empty array re-runs when any element's hash differs from the
//! previous render.

use std::cell::RefCell;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::rc::Rc;

use crate::props::Ref;
use crate::runtime::{self, RuntimeHandle};
use crate::tree::{self, HookCell, HookNode, StateThunk};

/// Hashed dependency array.
pub type Deps = Vec<u64>;

/// Teardown returned by an effect, invoked before the effect re-runs and
/// when its component unmounts.
pub type Cleanup = Box<dyn FnOnce()>;

/// Hash one dependency element. Used by the [`deps!`] macro.
pub fn dep_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = seahash::SeaHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Build a dependency array from hashable values: `deps![count, name]`.
/// `deps![]` is the run-once array; pass `None` instead of the macro to run
/// on every render.
#[macro_export]
macro_rules! deps {
    () => {
        Some($crate::Deps::new())
    };
    ($($dep:expr),+ $(,)?) => {
        Some(vec![$($crate::dep_hash(&$dep)),+])
    };
}

/// Element-wise comparison with the missing/empty policy applied. `previous`
/// is the array stored by the last run (`None` when the last run had no
/// array, which forces a re-run).
fn deps_changed(previous: Option<&Deps>, next: Option<&Deps>) -> bool {
    match (previous, next) {
        (_, None) => true,
        (None, Some(_)) => true,
        (Some(previous), Some(next)) => {
            previous.len() != next.len()
                || previous.iter().zip(next.iter()).any(|(a, b)| a != b)
        }
    }
}

/// Advance the current component's hook cursor and return the bound slot.
pub(crate) fn current_slot() -> (HookNode, usize) {
    tree::with_current(|tree| {
        let node = tree.current();
        let index = node.alloc_cursor();
        (node, index)
    })
}

fn shape_panic(found: &HookCell, requested: &str) -> ! {
    panic!(
        "{requested} hook bound to a {} cell; the hook call order changed between renders",
        found.kind()
    )
}

/// Writer half of [`use_state`]. Carries the owning hook node and cell
/// index, so clones captured in event handlers or async completions write to
/// the right instance regardless of what is currently rendering.
pub struct SetState<T> {
    node: HookNode,
    index: usize,
    runtime: RuntimeHandle,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            index: self.index,
            runtime: self.runtime.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: 'static> SetState<T> {
    /// Replace the value. Consecutive `set` calls before the next pass
    /// coalesce; the last writer wins.
    pub fn set(&self, value: T) {
        self.push(Box::new(move |_previous| Box::new(value)));
    }

    /// Transform the value. Updaters queued before the next pass compose in
    /// FIFO order, each seeing the previous one's result.
    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) {
        self.push(Box::new(move |previous| {
            let previous = previous
                .downcast::<T>()
                .unwrap_or_else(|_| panic!("state cell holds a different type"));
            Box::new(f(&previous))
        }));
    }

    fn push(&self, thunk: StateThunk) {
        self.node.enqueue(self.index, thunk);
        self.runtime.request_render();
    }
}

/// Local state surviving re-renders. `init` runs only when the cell is
/// first created.
pub fn use_state<T: Clone + 'static>(init: impl FnOnce() -> T) -> (T, SetState<T>) {
    let (node, index) = current_slot();
    if index == node.cell_count() {
        node.push_cell(HookCell::State {
            value: Box::new(init()),
        });
    }
    let value = node.with_cell(index, |cell| match cell {
        HookCell::State { value } => value.downcast_ref::<T>().cloned().unwrap_or_else(|| {
            panic!("state cell holds a different type; the hook call order changed between renders")
        }),
        other => shape_panic(other, "state"),
    });
    let runtime = runtime::with_current(|handle| handle.clone());
    (
        value,
        SetState {
            node,
            index,
            runtime,
            _marker: PhantomData,
        },
    )
}

/// Action dispatcher half of [`use_reducer`].
pub struct Dispatch<T, A> {
    set: SetState<T>,
    reducer: Rc<dyn Fn(&T, A) -> T>,
}

impl<T, A> Clone for Dispatch<T, A> {
    fn clone(&self) -> Self {
        Self {
            set: self.set.clone(),
            reducer: Rc::clone(&self.reducer),
        }
    }
}

impl<T: Clone + 'static, A: 'static> Dispatch<T, A> {
    pub fn dispatch(&self, action: A) {
        let reducer = Rc::clone(&self.reducer);
        self.set.update(move |previous| reducer(previous, action));
    }
}

/// State evolved by a reducer: dispatched actions queue
/// `previous → reducer(previous, action)` updates.
pub fn use_reducer<T, A, R>(reducer: R, init: impl FnOnce() -> T) -> (T, Dispatch<T, A>)
where
    T: Clone + 'static,
    A: 'static,
    R: Fn(&T, A) -> T + 'static,
{
    let (value, set) = use_state(init);
    (
        value,
        Dispatch {
            set,
            reducer: Rc::new(reducer),
        },
    )
}

/// Run `effect` after the pass commits whenever `deps` changed. The effect
/// may return a cleanup, which runs before the next execution and on
/// unmount.
pub fn use_effect(deps: Option<Deps>, effect: impl FnOnce() -> Option<Cleanup> + 'static) {
    let (node, index) = current_slot();
    let changed = if index == node.cell_count() {
        node.push_cell(HookCell::Effect {
            deps: deps.clone(),
            cleanup: None,
        });
        true
    } else {
        node.with_cell(index, |cell| match cell {
            HookCell::Effect { deps: stored, .. } => {
                let changed = deps_changed(stored.as_ref(), deps.as_ref());
                *stored = deps.clone();
                changed
            }
            other => shape_panic(other, "effect"),
        })
    };
    if !changed {
        return;
    }
    let node_for_effect = node;
    runtime::with_current(|handle| {
        handle.register_side_effect(Box::new(move || {
            let previous = node_for_effect.with_cell(index, |cell| match cell {
                HookCell::Effect { cleanup, .. } => cleanup.take(),
                other => shape_panic(other, "effect"),
            });
            if let Some(cleanup) = previous {
                cleanup();
            }
            let next = effect();
            node_for_effect.with_cell(index, |cell| {
                if let HookCell::Effect { cleanup, .. } = cell {
                    *cleanup = next;
                }
            });
        }));
    });
}

/// A mutable cell whose identity is stable across renders of this instance.
pub fn use_ref<T: 'static>(init: impl FnOnce() -> T) -> Ref<T> {
    let (node, index) = current_slot();
    if index == node.cell_count() {
        let value: Rc<RefCell<T>> = Rc::new(RefCell::new(init()));
        node.push_cell(HookCell::Anchor { value });
    }
    let erased = node.with_cell(index, |cell| match cell {
        HookCell::Anchor { value } => Rc::clone(value),
        other => shape_panic(other, "ref"),
    });
    erased.downcast::<RefCell<T>>().unwrap_or_else(|_| {
        panic!("ref cell holds a different type; the hook call order changed between renders")
    })
}

/// Recompute `factory` only when `deps` changed; otherwise return the value
/// from the previous render.
pub fn use_memo<T: Clone + 'static>(deps: Option<Deps>, factory: impl FnOnce() -> T) -> T {
    let (node, index) = current_slot();
    if index == node.cell_count() {
        let value = factory();
        node.push_cell(HookCell::Memo {
            deps,
            value: Box::new(value.clone()),
        });
        return value;
    }
    let changed = node.with_cell(index, |cell| match cell {
        HookCell::Memo { deps: stored, .. } => {
            let changed = deps_changed(stored.as_ref(), deps.as_ref());
            *stored = deps;
            changed
        }
        other => shape_panic(other, "memo"),
    });
    if changed {
        let value = factory();
        let stored = value.clone();
        node.with_cell(index, |cell| {
            if let HookCell::Memo { value: slot, .. } = cell {
                *slot = Box::new(stored);
            }
        });
        value
    } else {
        node.with_cell(index, |cell| match cell {
            HookCell::Memo { value, .. } => value.downcast_ref::<T>().cloned().unwrap_or_else(
                || {
                    panic!(
                        "memo cell holds a different type; the hook call order changed between renders"
                    )
                },
            ),
            other => shape_panic(other, "memo"),
        })
    }
}

/// Memoized callback: the deps-gated identity contract of [`use_memo`]
/// applied to a closure.
pub fn use_callback<F: Clone + 'static>(deps: Option<Deps>, callback: F) -> F {
    use_memo(deps, move || callback)
}

/// Publish an imperative handle through `target` whenever `deps` changed.
pub fn use_imperative_handle<T: 'static>(
    target: &Ref<Option<T>>,
    deps: Option<Deps>,
    build: impl FnOnce() -> T,
) {
    let (node, index) = current_slot();
    let changed = if index == node.cell_count() {
        node.push_cell(HookCell::Handle { deps: deps.clone() });
        true
    } else {
        node.with_cell(index, |cell| match cell {
            HookCell::Handle { deps: stored } => {
                let changed = deps_changed(stored.as_ref(), deps.as_ref());
                *stored = deps;
                changed
            }
            other => shape_panic(other, "imperative handle"),
        })
    };
    if changed {
        *target.borrow_mut() = Some(build());
    }
}

#[cfg(test)]
#[path = "tests/hooks_tests.rs"]
mod tests;
