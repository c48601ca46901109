//! The pass driver: owns the document, the mounted element, the previous
//! virtual tree, and the hook tree, and turns render requests into
//! flush → build → reconcile → sweep → effects cycles.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use log::{debug, error};

use folio_dom::{DomBackend, DomError, NodeId};

use crate::build;
use crate::element::Element;
use crate::reconcile::Reconciler;
use crate::runtime::{self, DefaultScheduler, Runtime, RuntimeHandle, RuntimeScheduler};
use crate::suspense::Suspend;
use crate::tree::{self, HookTree};
use crate::vnode::VNode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A resource suspended with no boundary willing to catch it.
    NoSuspenseBoundary,
    Dom(DomError),
    /// A component body or resource factory panicked during the build; the
    /// pass was abandoned and the payload captured here.
    User(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NoSuspenseBoundary => {
                f.write_str("a resource suspended outside of any suspense boundary")
            }
            RenderError::Dom(err) => write!(f, "document mutation failed: {err}"),
            RenderError::User(message) => write!(f, "a component failed: {message}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Dom(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DomError> for RenderError {
    fn from(err: DomError) -> Self {
        RenderError::Dom(err)
    }
}

/// A mounted application root.
pub struct Root<D: DomBackend> {
    dom: D,
    container: NodeId,
    element: Option<Element>,
    prev: Option<VNode>,
    tree: HookTree,
    runtime: Runtime,
}

struct PassGuard(RuntimeHandle);

impl Drop for PassGuard {
    fn drop(&mut self) {
        self.0.finish_pass();
    }
}

impl<D: DomBackend> Root<D> {
    /// A root rendering into `container` of `dom`, polled by the host
    /// through [`Root::should_render`] and [`Root::update`].
    pub fn new(dom: D, container: NodeId) -> Self {
        Self::with_scheduler(dom, container, Arc::new(DefaultScheduler))
    }

    /// A root wired to a host scheduler that is woken on every render
    /// request.
    pub fn with_scheduler(
        dom: D,
        container: NodeId,
        scheduler: Arc<dyn RuntimeScheduler>,
    ) -> Self {
        Self {
            dom,
            container,
            element: None,
            prev: None,
            tree: HookTree::new(),
            runtime: Runtime::new(scheduler),
        }
    }

    /// Mount `element` and run the initial pass (plus any follow-up work it
    /// schedules synchronously).
    pub fn mount(&mut self, element: Element) -> Result<(), RenderError> {
        self.render(element)
    }

    /// Replace the mounted element and re-render. State at stable logical
    /// positions survives.
    pub fn render(&mut self, element: Element) -> Result<(), RenderError> {
        self.element = Some(element);
        self.runtime.handle().request_render();
        self.update()
    }

    /// Render the tree away: the document empties and every component
    /// unmounts, running its effect cleanups.
    pub fn unmount(&mut self) -> Result<(), RenderError> {
        self.element = None;
        self.runtime.handle().request_render();
        self.update()
    }

    /// Whether a pass has been requested and not yet run.
    pub fn should_render(&self) -> bool {
        self.runtime.needs_pass()
    }

    /// Drive passes and the resource pump until no more synchronous work
    /// remains. Resources still in flight are left for the next call.
    pub fn update(&mut self) -> Result<(), RenderError> {
        loop {
            let mut progressed = false;
            if self.runtime.needs_pass() {
                self.render_pass()?;
                progressed = true;
            }
            if self.runtime.handle().poll_resources() {
                progressed = true;
            }
            if !progressed {
                return Ok(());
            }
        }
    }

    /// One flush → build → reconcile → sweep → effects cycle. Re-entrant
    /// calls while a pass is in flight are no-ops; a failed build leaves the
    /// previous document untouched.
    pub fn render_pass(&mut self) -> Result<(), RenderError> {
        let handle = self.runtime.handle();
        if !handle.begin_pass() {
            return Ok(());
        }
        let _pass = PassGuard(handle.clone());
        handle.clear_needs_pass();

        self.tree.flush();
        self.tree.start_pass();
        debug!("render pass started");

        let built = {
            let _tree = tree::install(&self.tree);
            let _runtime = runtime::install(&handle);
            match &self.element {
                // A panicking component body is the analogue of an arbitrary
                // throw; contain it here so the previous document survives.
                Some(element) => {
                    catch_unwind(AssertUnwindSafe(|| build::build_root(element)))
                }
                None => Ok(Ok(None)),
            }
        };

        let mut next = match built {
            Ok(Ok(next)) => next,
            Ok(Err(Suspend::Pending { .. })) | Ok(Err(Suspend::MissingBoundary)) => {
                // Abort: drop work deferred by the dead pass and keep the
                // previous document.
                handle.take_side_effects();
                return Err(RenderError::NoSuspenseBoundary);
            }
            Err(payload) => {
                handle.take_side_effects();
                return Err(RenderError::User(panic_message(payload.as_ref()).to_owned()));
            }
        };

        Reconciler { dom: &mut self.dom }.reconcile(
            next.as_mut(),
            self.prev.as_ref(),
            self.container,
        )?;
        self.prev = next;

        for swept in self.tree.end_pass() {
            handle.drop_resource_cache(swept);
        }

        let effects = handle.take_side_effects();
        debug!("pass committed; running {} deferred effects", effects.len());
        for effect in effects {
            // The document is already committed; a misbehaving effect must
            // not take the pass down with it.
            if let Err(payload) = catch_unwind(AssertUnwindSafe(effect)) {
                error!("deferred effect panicked: {}", panic_message(payload.as_ref()));
            }
        }
        Ok(())
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    /// The previous pass's virtual tree, for hosts that want to inspect the
    /// committed shape.
    pub fn committed_tree(&self) -> Option<&VNode> {
        self.prev.as_ref()
    }
}

/// Best-effort text of a caught panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        text
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text
    } else {
        "non-string panic payload"
    }
}
