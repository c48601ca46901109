//! The hook tree: per-component-instance storage that mirrors the component
//! tree and survives re-renders.
//!
//! Each live component instance owns one [`HookNode`] holding its hook
//! cells, context publications, and queued state updates. Nodes are keyed by
//! a stable id derived from the component's logical position, so the same
//! instance finds the same node on every pass. A pass brackets the tree with
//! `start_pass`/`end_pass`; nodes not re-entered during the pass are swept
//! at the end, running their effect cleanups.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::mem;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use log::trace;

use crate::context::ContextId;
use crate::hooks::{Cleanup, Deps};

/// Stable identifier of a hook node.
pub type HookId = u64;

const ROOT_ID: HookId = 0;

/// A queued state write: previous cell value in, next value out.
pub(crate) type StateThunk = Box<dyn FnOnce(Box<dyn Any>) -> Box<dyn Any>>;

/// One hook cell. The variant is the cell's shape; a cursor landing on the
/// wrong variant means the component changed its hook call order.
pub(crate) enum HookCell {
    State { value: Box<dyn Any> },
    Effect { deps: Option<Deps>, cleanup: Option<Cleanup> },
    Memo { deps: Option<Deps>, value: Box<dyn Any> },
    Anchor { value: Rc<dyn Any> },
    Handle { deps: Option<Deps> },
    ContextRead { context: ContextId },
    Resource,
}

impl HookCell {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            HookCell::State { .. } => "state",
            HookCell::Effect { .. } => "effect",
            HookCell::Memo { .. } => "memo",
            HookCell::Anchor { .. } => "ref",
            HookCell::Handle { .. } => "imperative handle",
            HookCell::ContextRead { .. } => "context",
            HookCell::Resource => "resource",
        }
    }
}

struct NodeInner {
    id: HookId,
    parent: Weak<NodeInner>,
    children: RefCell<IndexMap<HookId, HookNode>>,
    cells: RefCell<Vec<HookCell>>,
    cursor: Cell<usize>,
    contexts: RefCell<HashMap<ContextId, Rc<dyn Any>>>,
    queue: RefCell<Vec<(usize, StateThunk)>>,
    // Per-pass counts of unkeyed child slots, folded into child ids so
    // identical siblings get distinct nodes.
    occurrences: RefCell<HashMap<u64, u32>>,
}

/// Shared handle to one hook node. Setters captured in closures hold one of
/// these, so asynchronous writes stay bound to their instance no matter
/// which node is currently entered.
#[derive(Clone)]
pub struct HookNode {
    inner: Rc<NodeInner>,
}

impl HookNode {
    fn root() -> Self {
        Self::with_parent(ROOT_ID, Weak::new())
    }

    fn with_parent(id: HookId, parent: Weak<NodeInner>) -> Self {
        Self {
            inner: Rc::new(NodeInner {
                id,
                parent,
                children: RefCell::new(IndexMap::new()),
                cells: RefCell::new(Vec::new()),
                cursor: Cell::new(0),
                contexts: RefCell::new(HashMap::new()),
                queue: RefCell::new(Vec::new()),
                occurrences: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub fn id(&self) -> HookId {
        self.inner.id
    }

    pub(crate) fn parent(&self) -> Option<HookNode> {
        self.inner.parent.upgrade().map(|inner| HookNode { inner })
    }

    fn ensure_child(&self, id: HookId) -> HookNode {
        let mut children = self.inner.children.borrow_mut();
        children
            .entry(id)
            .or_insert_with(|| HookNode::with_parent(id, Rc::downgrade(&self.inner)))
            .clone()
    }

    /// Reset the per-render bookkeeping before this node's component runs.
    fn begin_render(&self) {
        self.inner.cursor.set(0);
        self.inner.occurrences.borrow_mut().clear();
    }

    /// Post-increment the hook cursor, binding the caller to a cell index.
    pub(crate) fn alloc_cursor(&self) -> usize {
        let index = self.inner.cursor.get();
        self.inner.cursor.set(index + 1);
        index
    }

    pub(crate) fn cell_count(&self) -> usize {
        self.inner.cells.borrow().len()
    }

    pub(crate) fn push_cell(&self, cell: HookCell) {
        self.inner.cells.borrow_mut().push(cell);
    }

    /// Direct access to the cell at `index`. `f` runs under the cell
    /// borrow and must not re-enter this node's cells.
    pub(crate) fn with_cell<R>(&self, index: usize, f: impl FnOnce(&mut HookCell) -> R) -> R {
        let mut cells = self.inner.cells.borrow_mut();
        let len = cells.len();
        let cell = cells.get_mut(index).unwrap_or_else(|| {
            panic!("hook cursor {index} out of bounds: node has {len} cells")
        });
        f(cell)
    }

    /// Append a state write for the cell at `index`; drained FIFO by the
    /// next flush.
    pub(crate) fn enqueue(&self, index: usize, thunk: StateThunk) {
        self.inner.queue.borrow_mut().push((index, thunk));
    }

    /// Apply a state write immediately, bypassing the queue. The flush path
    /// drains queued writes through this; synchronous writers may call it
    /// directly.
    pub(crate) fn apply_now(&self, index: usize, thunk: StateThunk) {
        apply_thunk(&mut self.inner.cells.borrow_mut(), index, thunk);
    }

    pub(crate) fn publish_context(&self, context: ContextId, value: Rc<dyn Any>) {
        self.inner.contexts.borrow_mut().insert(context, value);
    }

    /// Walk from this node through its ancestors for the nearest published
    /// value.
    pub(crate) fn lookup_context(&self, context: ContextId) -> Option<Rc<dyn Any>> {
        let mut node = Some(self.clone());
        while let Some(current) = node {
            if let Some(value) = current.inner.contexts.borrow().get(&context) {
                return Some(Rc::clone(value));
            }
            node = current.parent();
        }
        None
    }

    pub(crate) fn next_occurrence(&self, slot: u64) -> u32 {
        let mut occurrences = self.inner.occurrences.borrow_mut();
        let counter = occurrences.entry(slot).or_insert(0);
        let occurrence = *counter;
        *counter += 1;
        occurrence
    }

    fn flush_recursive(&self) {
        let queue = mem::take(&mut *self.inner.queue.borrow_mut());
        if !queue.is_empty() {
            trace!("flushing {} queued updates on node {}", queue.len(), self.id());
            for (index, thunk) in queue {
                self.apply_now(index, thunk);
            }
        }
        self.inner.cursor.set(0);
        let children: Vec<HookNode> = self.inner.children.borrow().values().cloned().collect();
        for child in children {
            child.flush_recursive();
        }
    }

    /// Tear down this node and everything below it, deepest first. Effect
    /// cleanups run here; cells, queues, and contexts are released.
    fn destroy(&self, removed: &mut Vec<HookId>) {
        let children: Vec<HookNode> = {
            let mut map = self.inner.children.borrow_mut();
            map.drain(..).map(|(_, child)| child).collect()
        };
        for child in children {
            child.destroy(removed);
        }
        let cells = mem::take(&mut *self.inner.cells.borrow_mut());
        for cell in cells {
            if let HookCell::Effect {
                cleanup: Some(cleanup),
                ..
            } = cell
            {
                cleanup();
            }
        }
        self.inner.queue.borrow_mut().clear();
        self.inner.contexts.borrow_mut().clear();
        removed.push(self.inner.id);
    }

    fn sweep(&self, active: &HashSet<HookId>, removed: &mut Vec<HookId>) {
        let children: Vec<HookNode> = self.inner.children.borrow().values().cloned().collect();
        for child in children {
            if active.contains(&child.id()) {
                child.sweep(active, removed);
            } else {
                self.inner.children.borrow_mut().shift_remove(&child.id());
                child.destroy(removed);
            }
        }
    }
}

fn apply_thunk(cells: &mut [HookCell], index: usize, thunk: StateThunk) {
    let len = cells.len();
    let cell = cells
        .get_mut(index)
        .unwrap_or_else(|| panic!("state write to cell {index} of {len}"));
    match cell {
        HookCell::State { value } => {
            let previous = mem::replace(value, Box::new(()));
            *value = thunk(previous);
        }
        other => panic!(
            "state write bound to a {} cell; the hook call order changed between renders",
            other.kind()
        ),
    }
}

struct TreeInner {
    root: HookNode,
    stack: RefCell<Vec<HookNode>>,
    active: RefCell<HashSet<HookId>>,
}

/// The process-wide tree of hook nodes, one per mounted root.
#[derive(Clone)]
pub struct HookTree {
    inner: Rc<TreeInner>,
}

impl HookTree {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(TreeInner {
                root: HookNode::root(),
                stack: RefCell::new(Vec::new()),
                active: RefCell::new(HashSet::new()),
            }),
        }
    }

    pub(crate) fn root(&self) -> HookNode {
        self.inner.root.clone()
    }

    /// The node whose component is currently executing.
    pub fn current(&self) -> HookNode {
        self.try_current().unwrap_or_else(|| {
            panic!("hook used outside of a component render")
        })
    }

    pub(crate) fn try_current(&self) -> Option<HookNode> {
        self.inner.stack.borrow().last().cloned()
    }

    /// Descend into the child with `id` (creating it if absent), resetting
    /// its cursor and marking it live for this pass.
    pub(crate) fn enter(&self, id: HookId) -> HookNode {
        let child = self.current().ensure_child(id);
        child.begin_render();
        self.inner.active.borrow_mut().insert(id);
        self.inner.stack.borrow_mut().push(child.clone());
        child
    }

    pub(crate) fn exit(&self) {
        self.inner.stack.borrow_mut().pop();
    }

    /// Drain every node's update queue in FIFO order, then reset every
    /// cursor. Runs at the top of a pass, before the build.
    pub fn flush(&self) {
        self.inner.root.flush_recursive();
    }

    pub(crate) fn start_pass(&self) {
        let mut active = self.inner.active.borrow_mut();
        active.clear();
        active.insert(ROOT_ID);
        drop(active);
        let mut stack = self.inner.stack.borrow_mut();
        stack.clear();
        stack.push(self.inner.root.clone());
        drop(stack);
        self.inner.root.begin_render();
    }

    /// Sweep nodes that were not entered during the pass, running their
    /// cleanups. Returns the ids of every removed node so callers can drop
    /// per-node registrations (resource caches).
    pub(crate) fn end_pass(&self) -> Vec<HookId> {
        self.inner.stack.borrow_mut().clear();
        let active = self.inner.active.borrow().clone();
        let mut removed = Vec::new();
        self.inner.root.sweep(&active, &mut removed);
        if !removed.is_empty() {
            trace!("swept {} hook nodes", removed.len());
        }
        removed
    }
}

impl Default for HookTree {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static CURRENT_TREE: RefCell<Vec<HookTree>> = RefCell::new(Vec::new());
}

pub(crate) struct TreeGuard;

impl Drop for TreeGuard {
    fn drop(&mut self) {
        CURRENT_TREE.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Install `tree` as the ambient hook tree for the duration of the guard.
pub(crate) fn install(tree: &HookTree) -> TreeGuard {
    CURRENT_TREE.with(|stack| stack.borrow_mut().push(tree.clone()));
    TreeGuard
}

/// Run against the ambient tree; panics when called outside a render pass.
pub(crate) fn with_current<R>(f: impl FnOnce(&HookTree) -> R) -> R {
    CURRENT_TREE.with(|stack| {
        let stack = stack.borrow();
        let tree = stack
            .last()
            .unwrap_or_else(|| panic!("hook used outside of a component render"));
        f(tree)
    })
}

/// Stable hash of a child slot: the component's tag, its sibling key, and
/// the discriminator separating distinct component functions.
pub(crate) fn slot_hash(tag: &str, key: Option<&str>, discriminator: u64) -> u64 {
    let mut hasher = seahash::SeaHasher::new();
    tag.hash(&mut hasher);
    key.hash(&mut hasher);
    discriminator.hash(&mut hasher);
    hasher.finish()
}

/// Final child id: the slot hash scoped by the parent's id, plus the
/// occurrence index disambiguating unkeyed repeats of the same slot.
pub(crate) fn child_id(parent: HookId, slot: u64, occurrence: u32) -> HookId {
    let mut hasher = seahash::SeaHasher::new();
    parent.hash(&mut hasher);
    slot.hash(&mut hasher);
    occurrence.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
#[path = "tests/tree_tests.rs"]
mod tests;
