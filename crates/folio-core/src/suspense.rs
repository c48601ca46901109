//! The resource protocol behind suspense boundaries.
//!
//! A component reads asynchronous data with [`use_resource`], which either
//! returns the settled value or signals [`Suspend`]. The signal propagates
//! out of the component body via `?` and is caught by the nearest enclosing
//! suspense boundary, which shows its fallback until the resource resolves
//! and the ensuing pass re-renders the guarded subtree.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use futures_util::Future;

use crate::hooks::current_slot;
use crate::runtime::{self, ResourceState};
use crate::tree::HookCell;

/// Signal that a subtree cannot render yet. Not an error: the suspense
/// builder case consumes `Pending`; only a signal that escapes every
/// boundary aborts the pass.
#[derive(Clone, PartialEq, Eq)]
pub enum Suspend {
    /// A resource keyed `"<hook node>:<cell>"` is still in flight.
    Pending { key: String },
    /// `use_resource` ran with no suspense boundary above it.
    MissingBoundary,
}

impl fmt::Debug for Suspend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Suspend::Pending { key } => write!(f, "Suspend::Pending({key})"),
            Suspend::MissingBoundary => f.write_str("Suspend::MissingBoundary"),
        }
    }
}

/// Read an asynchronous resource.
///
/// The first call at this hook position invokes `factory`, parks the future
/// on the runtime, and suspends. Later renders suspend while the future is
/// in flight and return the value once it resolves; `factory` is never
/// invoked a second time for the same position. The resource lives in the
/// nearest enclosing suspense boundary's cache and is dropped when that
/// boundary unmounts.
pub fn use_resource<T, F, Fut>(factory: F) -> Result<T, Suspend>
where
    T: Clone + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = T> + 'static,
{
    let (node, index) = current_slot();
    if index == node.cell_count() {
        node.push_cell(HookCell::Resource);
    } else {
        node.with_cell(index, |cell| match cell {
            HookCell::Resource => {}
            other => panic!(
                "resource hook bound to a {} cell; the hook call order changed between renders",
                other.kind()
            ),
        });
    }

    runtime::with_current(|handle| {
        let mut boundary = None;
        let mut cursor = Some(node.clone());
        while let Some(current) = cursor {
            if handle.has_resource_cache(current.id()) {
                boundary = Some(current.id());
                break;
            }
            cursor = current.parent();
        }
        let Some(boundary) = boundary else {
            return Err(Suspend::MissingBoundary);
        };

        let key = format!("{}:{}", node.id(), index);
        match handle.resource_state(boundary, &key) {
            ResourceState::Ready(value) => Ok(value
                .downcast_ref::<T>()
                .cloned()
                .unwrap_or_else(|| panic!("resource value has an unexpected type"))),
            ResourceState::Pending => Err(Suspend::Pending { key }),
            ResourceState::Absent => {
                let future = factory();
                handle.spawn_resource(
                    boundary,
                    key.clone(),
                    Box::pin(async move { Rc::new(future.await) as Rc<dyn Any> }),
                );
                Err(Suspend::Pending { key })
            }
        }
    })
}
