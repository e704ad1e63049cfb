use std::fmt::Debug;
use std::hash::Hash;

/// Structural failures reported by a real tree.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("node is not a child of the parent")]
    NotAChild,
    #[error("reference node is not a child of the parent")]
    ReferenceNotAChild,
    #[error("insertion would break the hierarchy")]
    HierarchyRequest,
    #[error("node no longer exists")]
    StaleNode,
}

/// The real tree a replayer drives.
///
/// Primitives mirror the operation vocabulary one to one; id resolution and
/// event wiring de-duplication stay in the replayer.
pub trait TargetTree {
    type Node: Copy + Eq + Hash + Debug;

    fn root(&self) -> Self::Node;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    fn create_element(&mut self, tag: &str) -> Self::Node;

    fn set_attribute(&mut self, node: Self::Node, key: &str, value: &str) -> Result<(), TreeError>;

    fn remove_attribute(&mut self, node: Self::Node, key: &str) -> Result<(), TreeError>;

    fn set_style_property(
        &mut self,
        node: Self::Node,
        property: &str,
        value: &str,
        important: bool,
    ) -> Result<(), TreeError>;

    fn remove_style_property(&mut self, node: Self::Node, property: &str) -> Result<(), TreeError>;

    /// Replace the node's content with raw markup text.
    fn set_inner_html(&mut self, node: Self::Node, text: &str) -> Result<(), TreeError>;

    /// Append one child, detaching it from its old parent first.
    fn append(&mut self, parent: Self::Node, child: Self::Node) -> Result<(), TreeError>;

    fn insert_before(
        &mut self,
        parent: Self::Node,
        child: Self::Node,
        reference: Option<Self::Node>,
    ) -> Result<(), TreeError>;

    /// Detach from the parent; a no-op on a detached node.
    fn remove(&mut self, node: Self::Node) -> Result<(), TreeError>;

    fn remove_child(&mut self, parent: Self::Node, child: Self::Node) -> Result<(), TreeError>;

    fn replace_with(&mut self, old: Self::Node, nodes: &[Self::Node]) -> Result<(), TreeError>;

    /// Register a passive per-node listener for `event_type`.
    fn add_passive_listener(&mut self, node: Self::Node, event_type: &str)
    -> Result<(), TreeError>;

    /// Register the single forwarding listener for `event_type` on the root.
    fn add_root_listener(&mut self, event_type: &str);

    /// Called after a batch applied cleanly. Returns nodes the tree dropped,
    /// whose uids become dead.
    fn end_batch(&mut self) -> Vec<Self::Node> {
        Vec::new()
    }
}
