//! # resource-graph
//!
//! Deduplicated dependency graphs for build artifacts.
//!
//! The graph answers one question:
//!
//! > Which resources does this build need, and which are only needed by
//! > collections that are excluded from the main bundle?
//!
//! ## Core Contract
//!
//! 1. A [`ResourceWalker`] drives a depth-first traversal from a root resource
//! 2. The graph records every reachable resource exactly once, with use and
//!    exclude counters per reference
//! 3. Nodes whose every reference comes from inside an excluded collection are
//!    listed by [`ResourceGraph::create_excluded_resources_list`]
//! 4. The graph exports as a flat JSON document with children by path
//!
//! ## Architecture
//!
//! ```text
//! root ──▶ ResourceWalker ──callbacks──▶ GraphBuilder ──▶ GraphIndex
//!                                                             │
//!                      excluded list ◀── ResourceGraph ◀──────┘
//!                                             │
//!                                             ▼
//!                                       GraphDocument (JSON)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Node order is insertion order, root first
//! - Same roots + same project → identical document and fingerprint

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod graph;
pub mod walker;
pub mod serializer;
pub mod canonical;
pub mod error;

/// Path of the synthetic root node.
pub const ROOT_PATH: &str = "<AnonymousRoot>";

// Re-exports
pub use types::{NodeId, ResourceNode, Resource, FileResource, canonical_path};
pub use types::{Message, CollectionProxyDesc, Descriptor};
pub use graph::{ResourceGraph, GraphStats, GraphBuilder, GraphIndex, ExclusionScope};
pub use walker::{ResourceVisitor, ResourceWalker};
pub use walker::{InMemoryProject, ProjectEntry, ProjectError, ProjectWalker};
pub use serializer::{GraphDocument, NodeEntry, DocumentError, SerializeOptions, JsonStyle};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex, content_digest};
pub use error::{GraphError, BoxError};
