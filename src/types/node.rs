//! Resource node types for the dependency graph.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ROOT_PATH;

/// Handle to a node in the graph arena.
///
/// Handles stay valid for the lifetime of the graph that issued them; nodes
/// are never removed while a graph is being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Handle of the synthetic root node.
    pub const ROOT: NodeId = NodeId(0);

    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Arena slot of this node.
    pub fn index(&self) -> usize {
        self.0
    }

    /// Whether this is the synthetic root.
    pub fn is_root(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mutable build state of a node, recorded before a build step touches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeState {
    use_count: u32,
    exclude_count: u32,
    excluded: bool,
    child_count: usize,
}

/// A vertex of the resource graph.
///
/// Counters are per reference, not per node: `use_count` counts every place
/// in the traversal that reaches this resource and `exclude_count` counts the
/// subset reached from inside an exclusion scope. The invariant
/// `exclude_count <= use_count` holds for every node at all times.
#[derive(Debug, Clone)]
pub struct ResourceNode<R> {
    resource: Option<R>,
    path: String,
    hex_digest: Option<String>,
    use_count: u32,
    exclude_count: u32,
    excluded: bool,
    children: Vec<NodeId>,
}

impl<R> ResourceNode<R> {
    pub(crate) fn root() -> Self {
        Self {
            resource: None,
            path: ROOT_PATH.to_string(),
            hex_digest: None,
            use_count: 0,
            exclude_count: 0,
            excluded: false,
            children: Vec::new(),
        }
    }

    pub(crate) fn new(resource: R, path: String) -> Self {
        Self {
            resource: Some(resource),
            path,
            hex_digest: None,
            use_count: 0,
            exclude_count: 0,
            excluded: false,
            children: Vec::new(),
        }
    }

    /// The backing resource, `None` for the synthetic root.
    pub fn resource(&self) -> Option<&R> {
        self.resource.as_ref()
    }

    /// Canonical path of this node.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Hex digest assigned after traversal, if any.
    pub fn hex_digest(&self) -> Option<&str> {
        self.hex_digest.as_deref()
    }

    /// Number of references to this node.
    pub fn use_count(&self) -> u32 {
        self.use_count
    }

    /// Number of references made from inside an exclusion scope.
    pub fn exclude_count(&self) -> u32 {
        self.exclude_count
    }

    /// Whether this node is itself an excluded collection reference.
    pub fn excluded(&self) -> bool {
        self.excluded
    }

    /// Child handles in the order they were attached.
    ///
    /// A child appears once per attaching reference.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Every reference to this node happened inside an exclusion scope.
    pub fn is_fully_excluded(&self) -> bool {
        self.use_count > 0 && self.use_count == self.exclude_count
    }

    /// Whether this is the synthetic root.
    pub fn is_root(&self) -> bool {
        self.resource.is_none()
    }

    pub(crate) fn add_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(crate) fn increase_counters(&mut self, in_exclusion_scope: bool) {
        self.use_count += 1;
        if in_exclusion_scope {
            self.exclude_count += 1;
        }
    }

    /// Count the reference that is currently being visited as excluded.
    pub(crate) fn exclude_current_reference(&mut self) {
        if self.exclude_count < self.use_count {
            self.exclude_count += 1;
        }
    }

    pub(crate) fn set_excluded(&mut self) {
        self.excluded = true;
    }

    pub(crate) fn state(&self) -> NodeState {
        NodeState {
            use_count: self.use_count,
            exclude_count: self.exclude_count,
            excluded: self.excluded,
            child_count: self.children.len(),
        }
    }

    /// Return to a recorded state. Children attached since are dropped.
    pub(crate) fn restore(&mut self, state: NodeState) {
        self.use_count = state.use_count;
        self.exclude_count = state.exclude_count;
        self.excluded = state.excluded;
        self.children.truncate(state.child_count);
    }

    pub(crate) fn set_hex_digest(&mut self, hex_digest: Option<String>) {
        self.hex_digest = hex_digest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_node() {
        let root: ResourceNode<String> = ResourceNode::root();
        assert!(root.is_root());
        assert_eq!(root.path(), ROOT_PATH);
        assert_eq!(root.use_count(), 0);
        assert!(!root.is_fully_excluded());
    }

    #[test]
    fn test_counters() {
        let mut node = ResourceNode::new("a.go".to_string(), "/a.go".to_string());

        node.increase_counters(false);
        assert_eq!((node.use_count(), node.exclude_count()), (1, 0));
        assert!(!node.is_fully_excluded());

        node.increase_counters(true);
        assert_eq!((node.use_count(), node.exclude_count()), (2, 1));

        node.exclude_current_reference();
        assert!(node.is_fully_excluded());

        // Never exceeds use_count
        node.exclude_current_reference();
        assert_eq!(node.exclude_count(), 2);
    }

    #[test]
    fn test_restore_state() {
        let mut node = ResourceNode::new("a.go".to_string(), "/a.go".to_string());
        node.increase_counters(false);
        node.add_child(NodeId::new(1));
        let state = node.state();

        node.increase_counters(true);
        node.set_excluded();
        node.add_child(NodeId::new(2));
        node.restore(state);

        assert_eq!((node.use_count(), node.exclude_count()), (1, 0));
        assert!(!node.excluded());
        assert_eq!(node.children(), &[NodeId::new(1)]);
    }

    #[test]
    fn test_node_id() {
        assert!(NodeId::ROOT.is_root());
        assert!(!NodeId::new(3).is_root());
        assert_eq!(NodeId::new(3).to_string(), "#3");
    }
}
