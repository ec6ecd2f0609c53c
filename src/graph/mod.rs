//! The resource graph and its builder.
//!
//! ## Architecture
//!
//! ```text
//! ResourceGraph::add(root)
//!        │
//!        ▼
//! ResourceWalker ──callbacks──▶ GraphBuilder ──▶ GraphIndex (arena + lookups)
//!                                    │
//!                                    └──▶ ExclusionScope (depth counter)
//! ```
//!
//! After traversal the graph is queried directly, given digests with
//! [`ResourceGraph::set_hex_digests`], or flattened with
//! [`ResourceGraph::to_document`].

pub mod builder;
pub mod index;
pub mod scope;

pub use builder::GraphBuilder;
pub use index::GraphIndex;
pub use scope::ExclusionScope;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;

use crate::canonical::canonical_hash_hex;
use crate::error::GraphError;
use crate::serializer::{GraphDocument, SerializeOptions};
use crate::types::{canonical_path, NodeId, ResourceNode};
use crate::walker::ResourceWalker;

/// Summary statistics for a built graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    /// Number of resource nodes, root excluded.
    pub node_count: usize,
    /// Number of parent -> child references, root edges included.
    pub edge_count: usize,
    /// Nodes only ever referenced from inside an exclusion scope.
    pub excluded_count: usize,
    /// Nodes that are themselves excluded collection references.
    pub excluded_collection_count: usize,
    /// Nodes referenced more than once.
    pub shared_count: usize,
}

/// Dependency graph of every resource reachable from the added roots.
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
/// use resource_graph::{FileResource, InMemoryProject, ProjectEntry, ProjectWalker, ResourceGraph};
///
/// let project = InMemoryProject::new()
///     .with("main.collection", ProjectEntry::new("").with_reference("level.collectionproxy"))
///     .with("level.collectionproxy", ProjectEntry::collection_proxy("level.collection", true))
///     .with("level.collection", ProjectEntry::new(""));
///
/// let mut graph = ResourceGraph::new(ProjectWalker::new(Arc::new(project)));
/// graph.add(&FileResource::new("main.collection")).unwrap();
///
/// assert_eq!(
///     graph.create_excluded_resources_list(),
///     vec!["/level.collectionproxy", "/level.collection"],
/// );
/// ```
pub struct ResourceGraph<W: ResourceWalker> {
    walker: W,
    builder: GraphBuilder<W::Resource>,
    options: SerializeOptions,
}

impl<W: ResourceWalker> ResourceGraph<W> {
    /// Create an empty graph that resolves resources through `walker`.
    pub fn new(walker: W) -> Self {
        Self {
            walker,
            builder: GraphBuilder::new(),
            options: SerializeOptions::default(),
        }
    }

    /// Set serialization options.
    pub fn with_options(mut self, options: SerializeOptions) -> Self {
        self.options = options;
        self
    }

    /// The traversal driver.
    pub fn walker(&self) -> &W {
        &self.walker
    }

    /// Serialization options in effect.
    pub fn options(&self) -> &SerializeOptions {
        &self.options
    }

    /// Add a resource and everything it transitively references.
    ///
    /// The resource becomes a child of the root node. On error nothing from
    /// this call is kept: the graph is exactly as it was before. Undoing a
    /// failed call costs as much as the work it did, independent of how large
    /// the graph already is.
    pub fn add(&mut self, root: &W::Resource) -> Result<(), GraphError> {
        self.builder.checkpoint();

        let result = self
            .walker
            .walk(root, &mut self.builder)
            .and_then(|()| self.builder.finish());

        match result {
            Ok(()) => {
                self.builder.commit();
                let index = self.builder.index();
                tracing::info!(
                    root = ?root,
                    node_count = index.len(),
                    edge_count = index.edge_count(),
                    "Added resource to graph"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    root = ?root,
                    error = %e,
                    "Resource graph build failed, discarding partial graph"
                );
                self.builder.rollback();
                Err(e)
            }
        }
    }

    /// The synthetic root node. Every added resource is one of its children.
    pub fn root_node(&self) -> &ResourceNode<W::Resource> {
        self.builder.index().root()
    }

    /// Output identities of every resource in the graph.
    pub fn resources(&self) -> &HashSet<<W::Resource as crate::Resource>::Output> {
        self.builder.resources()
    }

    /// Look up a node by path. The path is canonicalized first.
    pub fn resource_node_from_path(&self, path: &str) -> Option<&ResourceNode<W::Resource>> {
        let index = self.builder.index();
        index.lookup_path(&canonical_path(path)).map(|id| &index[id])
    }

    /// Get a node by handle.
    pub fn node(&self, id: NodeId) -> Option<&ResourceNode<W::Resource>> {
        self.builder.index().node(id)
    }

    /// Iterate resource nodes in insertion order, root excluded.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &ResourceNode<W::Resource>)> {
        self.builder.index().iter()
    }

    /// Children of a node, in attachment order.
    pub fn children_of(&self, id: NodeId) -> impl Iterator<Item = &ResourceNode<W::Resource>> {
        let index = self.builder.index();
        index
            .node(id)
            .map(|node| node.children())
            .unwrap_or_default()
            .iter()
            .map(move |&child| &index[child])
    }

    /// Number of resource nodes, root excluded.
    pub fn node_count(&self) -> usize {
        self.builder.index().len()
    }

    /// Number of parent -> child references.
    pub fn edge_count(&self) -> usize {
        self.builder.index().edge_count()
    }

    /// Assign digests keyed by canonical path.
    ///
    /// Nodes without an entry in `hex_digests` are cleared. Calling this
    /// again with the same map leaves the graph unchanged.
    pub fn set_hex_digests(&mut self, hex_digests: &HashMap<String, String>) {
        let mut assigned = 0usize;
        for node in self.builder.index_mut().iter_mut() {
            let hex_digest = hex_digests.get(node.path()).cloned();
            assigned += usize::from(hex_digest.is_some());
            node.set_hex_digest(hex_digest);
        }
        tracing::debug!(assigned, node_count = self.node_count(), "Assigned hex digests");
    }

    /// Paths of every fully excluded node, in insertion order.
    ///
    /// A node referenced both from an excluded collection and from anywhere
    /// else is not fully excluded and is not listed.
    pub fn create_excluded_resources_list(&self) -> Vec<String> {
        self.nodes()
            .filter(|(_, node)| node.is_fully_excluded())
            .map(|(_, node)| node.path().to_string())
            .collect()
    }

    /// Summary statistics.
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            ..GraphStats::default()
        };
        for (_, node) in self.nodes() {
            stats.excluded_count += usize::from(node.is_fully_excluded());
            stats.excluded_collection_count += usize::from(node.excluded());
            stats.shared_count += usize::from(node.use_count() > 1);
        }
        stats
    }

    /// Flatten the graph into its serializable document.
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument::from_index(self.builder.index())
    }

    /// Render the graph as JSON using the configured options.
    pub fn to_json(&self) -> Result<String, GraphError> {
        self.to_document().to_json_string(&self.options)
    }

    /// Write the graph as JSON to `writer`.
    pub fn write_json<Wr: Write>(&self, writer: Wr) -> Result<(), GraphError> {
        self.to_document().to_writer(writer, &self.options)
    }

    /// Write the graph as JSON to a file, replacing it only on success.
    pub fn write_json_file(&self, path: impl AsRef<Path>) -> Result<(), GraphError> {
        self.to_document().write_file(path.as_ref(), &self.options)
    }

    /// Deterministic fingerprint of the graph document.
    ///
    /// Same traversal and digests yield the same fingerprint, independent of
    /// serialization options.
    pub fn fingerprint(&self) -> Result<String, GraphError> {
        Ok(canonical_hash_hex(&self.to_document())?)
    }
}

impl<W: ResourceWalker + std::fmt::Debug> std::fmt::Debug for ResourceGraph<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceGraph")
            .field("walker", &self.walker)
            .field("node_count", &self.node_count())
            .field("edge_count", &self.edge_count())
            .finish()
    }
}
