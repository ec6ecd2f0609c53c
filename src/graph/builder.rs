//! Graph construction driven by the walker's visitor callbacks.

use std::collections::{HashMap, HashSet};

use super::index::GraphIndex;
use super::scope::ExclusionScope;
use crate::error::GraphError;
use crate::types::node::NodeState;
use crate::types::{canonical_path, Message, NodeId, Resource, ResourceNode};
use crate::walker::ResourceVisitor;

/// Undo log for one build step.
///
/// Nodes created during the step are dropped by arena length; nodes that
/// existed before it are restored from the state recorded on first touch.
#[derive(Debug, Clone)]
struct Journal<R: Resource> {
    arena_len: usize,
    scope: ExclusionScope,
    touched: HashMap<NodeId, NodeState>,
    outputs: Vec<R::Output>,
}

/// Builds a deduplicated resource graph from visitor callbacks.
///
/// ## Counting
///
/// Every reference the walker reports increments `use_count` on the target
/// node, and `exclude_count` as well when the reference is made from inside
/// an exclusion scope. A resource reached again after its first visit reuses
/// its node: the node gains another parent, and the node plus its
/// *immediate* children are counted once more. Deeper descendants are not
/// recounted, so a grandchild reached both through an excluded collection
/// and, later, through a non-excluded path via an already expanded node can
/// still end up fully excluded.
///
/// ## Checkpoints
///
/// [`checkpoint`](Self::checkpoint) starts recording an undo log;
/// [`rollback`](Self::rollback) replays it and [`commit`](Self::commit)
/// discards it. The cost of a rollback is proportional to the work done
/// since the checkpoint, not to the size of the graph.
#[derive(Debug, Clone)]
pub struct GraphBuilder<R: Resource> {
    index: GraphIndex<R>,
    scope: ExclusionScope,
    resources: HashSet<R::Output>,
    journal: Option<Journal<R>>,
}

impl<R: Resource> GraphBuilder<R> {
    /// Create a builder with an empty graph.
    pub fn new() -> Self {
        Self {
            index: GraphIndex::new(),
            scope: ExclusionScope::new(),
            resources: HashSet::new(),
            journal: None,
        }
    }

    /// The node arena built so far.
    pub fn index(&self) -> &GraphIndex<R> {
        &self.index
    }

    pub(crate) fn index_mut(&mut self) -> &mut GraphIndex<R> {
        &mut self.index
    }

    /// Current exclusion scope.
    pub fn scope(&self) -> ExclusionScope {
        self.scope
    }

    /// Output identities of every visited resource.
    pub fn resources(&self) -> &HashSet<R::Output> {
        &self.resources
    }

    /// Start recording changes so they can be undone.
    ///
    /// An earlier uncommitted checkpoint is replaced.
    pub fn checkpoint(&mut self) {
        self.journal = Some(Journal {
            arena_len: self.index.arena_len(),
            scope: self.scope,
            touched: HashMap::new(),
            outputs: Vec::new(),
        });
    }

    /// Keep every change made since the last checkpoint.
    pub fn commit(&mut self) {
        self.journal = None;
    }

    /// Undo every change made since the last checkpoint.
    ///
    /// Without a checkpoint this does nothing.
    pub fn rollback(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };

        self.index.truncate(journal.arena_len);
        for (id, state) in journal.touched {
            self.index[id].restore(state);
        }
        for output in &journal.outputs {
            self.resources.remove(output);
        }
        self.scope = journal.scope;
    }

    /// Check that the traversal closed every scope it opened.
    pub(crate) fn finish(&self) -> Result<(), GraphError> {
        if self.scope.is_active() {
            return Err(GraphError::UnbalancedScope(self.scope.depth()));
        }
        Ok(())
    }

    fn node_id(&self, resource: &R) -> Result<NodeId, GraphError> {
        self.index
            .lookup(resource)
            .ok_or_else(|| GraphError::NodeNotFound(canonical_path(resource.path())))
    }

    fn parent_id(&self, parent: Option<&R>) -> Result<NodeId, GraphError> {
        match parent {
            Some(parent) => self.node_id(parent),
            None => Ok(NodeId::ROOT),
        }
    }

    /// Mutable access that records the node's state on first touch.
    fn node_mut(&mut self, id: NodeId) -> &mut ResourceNode<R> {
        if let Some(journal) = &mut self.journal {
            if id.index() < journal.arena_len {
                let node = &self.index[id];
                journal.touched.entry(id).or_insert_with(|| node.state());
            }
        }
        &mut self.index[id]
    }

    fn increase_counters(&mut self, id: NodeId) {
        let in_scope = self.scope.is_active();
        self.node_mut(id).increase_counters(in_scope);
    }
}

impl<R: Resource> Default for GraphBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> ResourceVisitor<R> for GraphBuilder<R> {
    fn should_visit(&mut self, resource: &R, parent: Option<&R>) -> Result<bool, GraphError> {
        let Some(current) = self.index.lookup(resource) else {
            return Ok(true);
        };

        // Already expanded elsewhere: share the node and recount one level
        let parent = self.parent_id(parent)?;
        self.node_mut(parent).add_child(current);
        self.increase_counters(current);
        let children = self.index[current].children().to_vec();
        for child in children {
            self.increase_counters(child);
        }

        tracing::trace!(
            path = %self.index[current].path(),
            use_count = self.index[current].use_count(),
            exclude_count = self.index[current].exclude_count(),
            "Reusing shared resource node"
        );
        Ok(false)
    }

    fn visit(&mut self, resource: &R, parent: Option<&R>) -> Result<(), GraphError> {
        let parent = self.parent_id(parent)?;
        let current = self.index.insert(resource.clone())?;

        let output = resource.output();
        if self.resources.insert(output.clone()) {
            if let Some(journal) = &mut self.journal {
                journal.outputs.push(output);
            }
        }
        self.node_mut(parent).add_child(current);
        self.increase_counters(current);

        tracing::debug!(
            path = %self.index[current].path(),
            parent = %self.index[parent].path(),
            in_exclusion_scope = self.scope.is_active(),
            "Created resource node"
        );
        Ok(())
    }

    fn visit_message(
        &mut self,
        message: &dyn Message,
        resource: &R,
        _parent: Option<&R>,
    ) -> Result<(), GraphError> {
        if !message.excludes_collection() {
            return Ok(());
        }

        let current = self.node_id(resource)?;
        if self.index[current].excluded() {
            // Scope already opened for this resource
            return Ok(());
        }

        let in_scope = self.scope.is_active();
        let node = self.node_mut(current);
        node.set_excluded();
        // The reference that reached the excluded collection lies inside its own scope
        if !in_scope {
            node.exclude_current_reference();
        }
        self.scope.enter();

        tracing::debug!(
            path = %self.index[current].path(),
            message = message.type_name(),
            depth = self.scope.depth(),
            "Entered exclusion scope"
        );
        Ok(())
    }

    fn leave(&mut self, resource: &R, _parent: Option<&R>) -> Result<(), GraphError> {
        let current = self.node_id(resource)?;
        if !self.index[current].excluded() {
            return Ok(());
        }

        if !self.scope.leave() {
            return Err(GraphError::ScopeUnderflow(self.index[current].path().to_string()));
        }

        tracing::debug!(
            path = %self.index[current].path(),
            depth = self.scope.depth(),
            "Left exclusion scope"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CollectionProxyDesc, FileResource};

    fn res(path: &str) -> FileResource {
        FileResource::new(path)
    }

    fn counts(builder: &GraphBuilder<FileResource>, path: &str) -> (u32, u32) {
        let id = builder.index().lookup_path(path).unwrap();
        let node = &builder.index()[id];
        (node.use_count(), node.exclude_count())
    }

    #[test]
    fn test_first_visit_creates_node() {
        let mut builder = GraphBuilder::new();
        let main = res("main.collection");

        assert!(builder.should_visit(&main, None).unwrap());
        builder.visit(&main, None).unwrap();
        builder.leave(&main, None).unwrap();

        assert_eq!(builder.index().len(), 1);
        assert_eq!(builder.index().root().children().len(), 1);
        assert_eq!(counts(&builder, "/main.collection"), (1, 0));
        assert!(builder.resources().contains(&res("main.collectionc")));
    }

    #[test]
    fn test_revisit_counts_node_and_immediate_children() {
        let mut builder = GraphBuilder::new();
        let (main, a) = (res("main.collection"), res("a.go"));
        let (b, c) = (res("b.sprite"), res("c.atlas"));

        builder.visit(&main, None).unwrap();
        builder.visit(&a, Some(&main)).unwrap();
        builder.visit(&b, Some(&a)).unwrap();
        builder.visit(&c, Some(&b)).unwrap();

        // Second reference to `a` from main
        assert!(!builder.should_visit(&a, Some(&main)).unwrap());

        assert_eq!(counts(&builder, "/a.go"), (2, 0));
        assert_eq!(counts(&builder, "/b.sprite"), (2, 0));
        // Grandchild is not recounted
        assert_eq!(counts(&builder, "/c.atlas"), (1, 0));
        assert_eq!(builder.index().len(), 4);

        let main_id = builder.index().lookup(&main).unwrap();
        assert_eq!(builder.index()[main_id].children().len(), 2);
    }

    #[test]
    fn test_exclusion_scope() {
        let mut builder = GraphBuilder::new();
        let main = res("main.collection");
        let proxy = res("level.collectionproxy");
        let level = res("level.collection");
        let desc = CollectionProxyDesc::new("/level.collection", true);

        builder.visit(&main, None).unwrap();
        builder.visit(&proxy, Some(&main)).unwrap();
        builder.visit_message(&desc, &proxy, Some(&main)).unwrap();
        assert!(builder.scope().is_active());

        builder.visit(&level, Some(&proxy)).unwrap();
        builder.leave(&level, Some(&proxy)).unwrap();
        builder.leave(&proxy, Some(&main)).unwrap();
        assert!(!builder.scope().is_active());
        builder.finish().unwrap();

        assert_eq!(counts(&builder, "/level.collectionproxy"), (1, 1));
        assert_eq!(counts(&builder, "/level.collection"), (1, 1));
        assert_eq!(counts(&builder, "/main.collection"), (1, 0));
    }

    #[test]
    fn test_repeated_exclusion_message_opens_one_scope() {
        let mut builder = GraphBuilder::new();
        let proxy = res("level.collectionproxy");
        let desc = CollectionProxyDesc::new("/level.collection", true);

        builder.visit(&proxy, None).unwrap();
        builder.visit_message(&desc, &proxy, None).unwrap();
        builder.visit_message(&desc, &proxy, None).unwrap();
        assert_eq!(builder.scope().depth(), 1);

        builder.leave(&proxy, None).unwrap();
        assert!(!builder.scope().is_active());
    }

    #[test]
    fn test_non_excluding_message_is_ignored() {
        let mut builder = GraphBuilder::new();
        let proxy = res("level.collectionproxy");

        builder.visit(&proxy, None).unwrap();
        builder
            .visit_message(&CollectionProxyDesc::new("/level.collection", false), &proxy, None)
            .unwrap();

        assert!(!builder.scope().is_active());
        let id = builder.index().lookup(&proxy).unwrap();
        assert!(!builder.index()[id].excluded());
    }

    #[test]
    fn test_unknown_parent_is_an_error() {
        let mut builder = GraphBuilder::new();
        let err = builder.visit(&res("a.go"), Some(&res("never.collection"))).unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound(path) if path == "/never.collection"));
    }

    #[test]
    fn test_leave_unknown_resource_is_an_error() {
        let mut builder: GraphBuilder<FileResource> = GraphBuilder::new();
        let err = builder.leave(&res("a.go"), None).unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound(_)));
    }

    #[test]
    fn test_unbalanced_scope_detected() {
        let mut builder = GraphBuilder::new();
        let proxy = res("level.collectionproxy");

        builder.visit(&proxy, None).unwrap();
        builder
            .visit_message(&CollectionProxyDesc::new("/level.collection", true), &proxy, None)
            .unwrap();

        assert!(matches!(builder.finish(), Err(GraphError::UnbalancedScope(1))));
    }

    #[test]
    fn test_rollback_restores_touched_nodes() {
        let mut builder = GraphBuilder::new();
        let (main, a, b) = (res("main.collection"), res("a.go"), res("b.sprite"));
        builder.visit(&main, None).unwrap();
        builder.visit(&a, Some(&main)).unwrap();
        builder.visit(&b, Some(&a)).unwrap();

        builder.checkpoint();
        let proxy = res("level.collectionproxy");
        builder.visit(&proxy, None).unwrap();
        builder
            .visit_message(&CollectionProxyDesc::new("/level.collection", true), &proxy, None)
            .unwrap();
        assert!(!builder.should_visit(&a, Some(&proxy)).unwrap());
        assert_eq!(counts(&builder, "/a.go"), (2, 1));

        builder.rollback();

        assert_eq!(builder.index().len(), 3);
        assert!(builder.index().lookup(&proxy).is_none());
        assert!(!builder.resources().contains(&res("level.collectionproxyc")));
        assert_eq!(builder.index().root().children().len(), 1);
        assert_eq!(counts(&builder, "/a.go"), (1, 0));
        assert_eq!(counts(&builder, "/b.sprite"), (1, 0));
        assert!(!builder.scope().is_active());
        builder.finish().unwrap();
    }

    #[test]
    fn test_commit_keeps_changes() {
        let mut builder = GraphBuilder::new();
        builder.checkpoint();
        builder.visit(&res("a.go"), None).unwrap();
        builder.commit();

        // Nothing left to undo
        builder.rollback();
        assert_eq!(builder.index().len(), 1);
    }
}
