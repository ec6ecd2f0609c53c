//! Node arena with identity and path lookup tables.

use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use crate::error::GraphError;
use crate::types::{canonical_path, NodeId, Resource, ResourceNode};

/// Owner of every node in a graph.
///
/// Nodes live in a single arena in creation order; slot 0 is the synthetic
/// root. Parents refer to children by [`NodeId`], so a shared child is stored
/// once no matter how many parents reference it.
#[derive(Debug, Clone)]
pub struct GraphIndex<R: Resource> {
    /// Arena, root first, then nodes in insertion order.
    nodes: Vec<ResourceNode<R>>,
    /// Resource identity -> node.
    by_resource: HashMap<R, NodeId>,
    /// Canonical path -> node.
    by_path: HashMap<String, NodeId>,
}

impl<R: Resource> GraphIndex<R> {
    /// Create an index holding only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![ResourceNode::root()],
            by_resource: HashMap::new(),
            by_path: HashMap::new(),
        }
    }

    /// The synthetic root node.
    pub fn root(&self) -> &ResourceNode<R> {
        &self.nodes[NodeId::ROOT.index()]
    }

    /// Get a node by handle.
    pub fn node(&self, id: NodeId) -> Option<&ResourceNode<R>> {
        self.nodes.get(id.index())
    }

    /// Find the node for a resource.
    pub fn lookup(&self, resource: &R) -> Option<NodeId> {
        self.by_resource.get(resource).copied()
    }

    /// Find the node registered under a canonical path.
    pub fn lookup_path(&self, path: &str) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    /// Create a node for a resource and register it in both lookup tables.
    ///
    /// Callers must check [`lookup`](Self::lookup) first. A second resource
    /// with the same canonical path is rejected and the index is unchanged.
    pub(crate) fn insert(&mut self, resource: R) -> Result<NodeId, GraphError> {
        let path = canonical_path(resource.path());
        if self.by_path.contains_key(&path) {
            return Err(GraphError::PathCollision(path));
        }

        let id = NodeId::new(self.nodes.len());
        self.by_path.insert(path.clone(), id);
        self.by_resource.insert(resource.clone(), id);
        self.nodes.push(ResourceNode::new(resource, path));

        Ok(id)
    }

    /// Arena length, root included.
    pub(crate) fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Drop every node created at or after arena slot `arena_len`.
    pub(crate) fn truncate(&mut self, arena_len: usize) {
        for node in self.nodes.drain(arena_len.max(1)..) {
            if let Some(resource) = node.resource() {
                self.by_resource.remove(resource);
            }
            self.by_path.remove(node.path());
        }
    }

    /// Number of resource nodes, not counting the root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Whether no resource has been added yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of parent -> child references, root edges included.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.children().len()).sum()
    }

    /// Iterate resource nodes in insertion order, root excluded.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ResourceNode<R>)> {
        self.nodes
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, node)| (NodeId::new(i), node))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ResourceNode<R>> {
        self.nodes.iter_mut().skip(1)
    }
}

impl<R: Resource> Default for GraphIndex<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> Index<NodeId> for GraphIndex<R> {
    type Output = ResourceNode<R>;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.index()]
    }
}

impl<R: Resource> IndexMut<NodeId> for GraphIndex<R> {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        &mut self.nodes[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileResource;

    #[test]
    fn test_insert_and_lookup() {
        let mut index = GraphIndex::new();
        assert!(index.is_empty());

        let a = FileResource::new("main/a.go");
        let id = index.insert(a.clone()).unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup(&a), Some(id));
        assert_eq!(index.lookup_path("/main/a.go"), Some(id));
        assert_eq!(index[id].path(), "/main/a.go");
        assert_eq!(index[id].resource(), Some(&a));
    }

    #[test]
    fn test_iteration_order_skips_root() {
        let mut index = GraphIndex::new();
        for name in ["c.go", "a.go", "b.go"] {
            index.insert(FileResource::new(name)).unwrap();
        }

        let paths: Vec<_> = index.iter().map(|(_, n)| n.path().to_string()).collect();
        assert_eq!(paths, vec!["/c.go", "/a.go", "/b.go"]);
        assert!(index.root().is_root());
    }

    #[test]
    fn test_edge_count() {
        let mut index = GraphIndex::new();
        let a = index.insert(FileResource::new("a.go")).unwrap();
        let b = index.insert(FileResource::new("b.go")).unwrap();
        index[NodeId::ROOT].add_child(a);
        index[a].add_child(b);
        index[NodeId::ROOT].add_child(b);

        assert_eq!(index.edge_count(), 3);
    }

    /// Distinct resources that normalize to the same path.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Variant {
        path: &'static str,
        tag: u8,
    }

    impl Resource for Variant {
        type Output = u8;

        fn path(&self) -> &str {
            self.path
        }

        fn output(&self) -> u8 {
            self.tag
        }
    }

    #[test]
    fn test_path_collision_rejected() {
        let mut index = GraphIndex::new();
        let first = index.insert(Variant { path: "a.go", tag: 1 }).unwrap();

        let err = index.insert(Variant { path: "//a.go", tag: 2 }).unwrap_err();
        assert!(matches!(err, GraphError::PathCollision(ref path) if path == "/a.go"));

        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup_path("/a.go"), Some(first));
        assert_eq!(index.lookup(&Variant { path: "//a.go", tag: 2 }), None);
    }

    #[test]
    fn test_truncate_unregisters_nodes() {
        let mut index = GraphIndex::new();
        let a = FileResource::new("a.go");
        let b = FileResource::new("b.go");
        index.insert(a.clone()).unwrap();
        let mark = index.arena_len();
        index.insert(b.clone()).unwrap();

        index.truncate(mark);

        assert_eq!(index.len(), 1);
        assert!(index.lookup(&a).is_some());
        assert_eq!(index.lookup(&b), None);
        assert_eq!(index.lookup_path("/b.go"), None);

        // Root is never dropped
        index.truncate(0);
        assert!(index.is_empty());
        assert!(index.root().is_root());
    }
}
