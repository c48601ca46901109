//! Virtual nodes: the runtime tree the reconciler diffs.

use folio_dom::NodeId;

use crate::props::{PropValue, Props};
use crate::tree::HookId;

/// What a virtual node projects into the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VKind {
    Text,
    Fragment,
    Suspense,
    Provider,
    /// An intrinsic document element with this tag.
    Element(String),
}

/// One node of the virtual tree. Rebuilt from scratch every pass; the
/// previous pass's tree survives only as the reconciler's diff partner,
/// carrying the document handles recorded the last time it was committed.
#[derive(Debug)]
pub struct VNode {
    pub kind: VKind,
    /// Effective props, children excluded. Text nodes carry their content
    /// under `nodeValue`.
    pub props: Props,
    pub children: Vec<VNode>,
    pub key: Option<String>,
    /// Hook node of the owning component instance, for composite-produced
    /// nodes; reuse requires it to match.
    pub component_id: Option<HookId>,
    /// Live document handle, recorded by the reconciler.
    pub dom: Option<NodeId>,
}

impl VNode {
    pub(crate) fn new(kind: VKind) -> Self {
        Self {
            kind,
            props: Props::new(),
            children: Vec::new(),
            key: None,
            component_id: None,
            dom: None,
        }
    }

    pub(crate) fn text(value: &str) -> Self {
        let mut node = Self::new(VKind::Text);
        node.props = Props::new().set("nodeValue", value);
        node
    }

    pub fn text_value(&self) -> Option<&str> {
        match self.props.get("nodeValue")? {
            PropValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether the document node recorded on `old` can be adopted for
    /// `self`: same projection, same sibling key, same owning instance.
    pub(crate) fn can_reuse(&self, old: &VNode) -> bool {
        self.kind == old.kind && self.key == old.key && self.component_id == old.component_id
    }
}
