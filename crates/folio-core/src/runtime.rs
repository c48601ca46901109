//! The runtime core: pass scheduling, deferred effects, and the resource
//! pump backing suspense.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use futures_util::task::noop_waker;
use futures_util::Future;
use log::{debug, trace};

use crate::tree::HookId;

/// Hook for the host event loop: called whenever the runtime wants a render
/// pass at the next safe point. Hosts typically wake their frame loop here.
pub trait RuntimeScheduler: Send + Sync {
    fn schedule_frame(&self);
}

/// Scheduler for hosts that poll `should_render` themselves.
#[derive(Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_frame(&self) {}
}

type ResourceFuture = Pin<Box<dyn Future<Output = Rc<dyn Any>>>>;

struct ResourceTask {
    boundary: HookId,
    key: String,
    future: ResourceFuture,
}

#[derive(Default)]
struct ResourceCache {
    entries: HashMap<String, ResourceSlot>,
}

enum ResourceSlot {
    Pending,
    Ready(Rc<dyn Any>),
}

/// What a resource lookup found.
pub(crate) enum ResourceState {
    Absent,
    Pending,
    Ready(Rc<dyn Any>),
}

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    needs_pass: Cell<bool>,
    pass_in_flight: Cell<bool>,
    side_effects: RefCell<Vec<Box<dyn FnOnce()>>>,
    caches: RefCell<HashMap<HookId, ResourceCache>>,
    tasks: RefCell<Vec<ResourceTask>>,
}

/// Owns the scheduling state for one mounted root.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                scheduler,
                needs_pass: Cell::new(false),
                pass_in_flight: Cell::new(false),
                side_effects: RefCell::new(Vec::new()),
                caches: RefCell::new(HashMap::new()),
                tasks: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn needs_pass(&self) -> bool {
        self.inner.needs_pass.get()
    }
}

/// Weak handle to a [`Runtime`]; every operation is a no-op once the
/// runtime is gone, so handles captured in long-lived closures stay safe.
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    /// Request a render pass. Requests coalesce: any number of calls before
    /// the next pass boundary produce one pass.
    pub fn request_render(&self) {
        if let Some(inner) = self.0.upgrade() {
            if !inner.needs_pass.replace(true) {
                trace!("render pass requested");
            }
            inner.scheduler.schedule_frame();
        }
    }

    pub fn needs_pass(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.needs_pass.get())
            .unwrap_or(false)
    }

    pub(crate) fn clear_needs_pass(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.needs_pass.set(false);
        }
    }

    /// Serialize passes: returns false when one is already in flight.
    pub(crate) fn begin_pass(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| !inner.pass_in_flight.replace(true))
            .unwrap_or(false)
    }

    pub(crate) fn finish_pass(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.pass_in_flight.set(false);
        }
    }

    /// Defer work to the end of the current pass, after the document has
    /// been reconciled. Deferred work runs in registration order.
    pub(crate) fn register_side_effect(&self, effect: Box<dyn FnOnce()>) {
        if let Some(inner) = self.0.upgrade() {
            inner.side_effects.borrow_mut().push(effect);
        }
    }

    pub(crate) fn take_side_effects(&self) -> Vec<Box<dyn FnOnce()>> {
        self.0
            .upgrade()
            .map(|inner| std::mem::take(&mut *inner.side_effects.borrow_mut()))
            .unwrap_or_default()
    }

    /// Make `boundary` a suspense boundary by giving it a resource cache.
    pub(crate) fn ensure_resource_cache(&self, boundary: HookId) {
        if let Some(inner) = self.0.upgrade() {
            inner.caches.borrow_mut().entry(boundary).or_default();
        }
    }

    pub(crate) fn has_resource_cache(&self, boundary: HookId) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.caches.borrow().contains_key(&boundary))
            .unwrap_or(false)
    }

    /// Drop a boundary's cache when its hook node unmounts. In-flight
    /// futures for that boundary are abandoned; their resolutions would land
    /// in a cache nothing can reach.
    pub(crate) fn drop_resource_cache(&self, boundary: HookId) {
        if let Some(inner) = self.0.upgrade() {
            if inner.caches.borrow_mut().remove(&boundary).is_some() {
                debug!("dropped resource cache for boundary {boundary}");
            }
            inner.tasks.borrow_mut().retain(|task| task.boundary != boundary);
        }
    }

    pub(crate) fn resource_state(&self, boundary: HookId, key: &str) -> ResourceState {
        let Some(inner) = self.0.upgrade() else {
            return ResourceState::Absent;
        };
        let caches = inner.caches.borrow();
        match caches.get(&boundary).and_then(|cache| cache.entries.get(key)) {
            None => ResourceState::Absent,
            Some(ResourceSlot::Pending) => ResourceState::Pending,
            Some(ResourceSlot::Ready(value)) => ResourceState::Ready(Rc::clone(value)),
        }
    }

    /// Record a freshly created resource: mark its cache entry pending and
    /// queue the future on the resource pump.
    pub(crate) fn spawn_resource(&self, boundary: HookId, key: String, future: ResourceFuture) {
        let Some(inner) = self.0.upgrade() else {
            return;
        };
        debug!("resource {key} pending under boundary {boundary}");
        inner
            .caches
            .borrow_mut()
            .entry(boundary)
            .or_default()
            .entries
            .insert(key.clone(), ResourceSlot::Pending);
        inner.tasks.borrow_mut().push(ResourceTask {
            boundary,
            key,
            future,
        });
    }

    pub fn has_pending_resources(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| !inner.tasks.borrow().is_empty())
            .unwrap_or(false)
    }

    /// Poll every in-flight resource once. Completed resources write their
    /// value into the owning boundary's cache and request a re-render.
    /// Returns whether anything completed.
    pub fn poll_resources(&self) -> bool {
        let Some(inner) = self.0.upgrade() else {
            return false;
        };
        let mut tasks = std::mem::take(&mut *inner.tasks.borrow_mut());
        if tasks.is_empty() {
            return false;
        }
        let waker = noop_waker();
        let mut cx = TaskContext::from_waker(&waker);
        let mut completed = false;
        let mut still_pending = Vec::with_capacity(tasks.len());
        for mut task in tasks.drain(..) {
            match task.future.as_mut().poll(&mut cx) {
                Poll::Ready(value) => {
                    let mut caches = inner.caches.borrow_mut();
                    if let Some(cache) = caches.get_mut(&task.boundary) {
                        debug!("resource {} resolved", task.key);
                        cache.entries.insert(task.key, ResourceSlot::Ready(value));
                        completed = true;
                    }
                    // A resolved resource whose boundary unmounted mid-flight
                    // is dropped on the floor.
                }
                Poll::Pending => still_pending.push(task),
            }
        }
        inner.tasks.borrow_mut().extend(still_pending);
        if completed {
            self.request_render();
        }
        completed
    }
}

thread_local! {
    static ACTIVE_RUNTIMES: RefCell<Vec<RuntimeHandle>> = RefCell::new(Vec::new());
}

pub(crate) struct RuntimeGuard;

impl Drop for RuntimeGuard {
    fn drop(&mut self) {
        ACTIVE_RUNTIMES.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Install `handle` as the ambient runtime for the duration of the guard;
/// hooks reach the scheduler and resource registry through it.
pub(crate) fn install(handle: &RuntimeHandle) -> RuntimeGuard {
    ACTIVE_RUNTIMES.with(|stack| stack.borrow_mut().push(handle.clone()));
    RuntimeGuard
}

pub(crate) fn with_current<R>(f: impl FnOnce(&RuntimeHandle) -> R) -> R {
    ACTIVE_RUNTIMES.with(|stack| {
        let stack = stack.borrow();
        let handle = stack
            .last()
            .unwrap_or_else(|| panic!("hook used outside of a component render"));
        f(handle)
    })
}
