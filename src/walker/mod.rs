//! Traversal protocol between a resource walker and the graph builder.
//!
//! The walker owns traversal order: it resolves each resource's declared
//! references and drives a [`ResourceVisitor`] depth-first. The visitor owns
//! graph construction. For every reference the walker calls:
//!
//! ```text
//! should_visit ──false──▶ (skip, subtree already expanded)
//!      │ true
//!      ▼
//!    visit ─▶ visit_message* ─▶ (recurse into references) ─▶ leave
//! ```

pub mod project;

use crate::error::GraphError;
use crate::types::{Message, Resource};

/// Callbacks invoked by a [`ResourceWalker`] during depth-first traversal.
///
/// `parent` is `None` for the root resource handed to the walker.
pub trait ResourceVisitor<R: Resource> {
    /// Decide whether to descend into `resource`.
    ///
    /// Returning `false` tells the walker to skip the resource and its
    /// subtree; `visit`, `visit_message` and `leave` are not called for it.
    fn should_visit(&mut self, resource: &R, parent: Option<&R>) -> Result<bool, GraphError>;

    /// First visit of `resource`.
    fn visit(&mut self, resource: &R, parent: Option<&R>) -> Result<(), GraphError>;

    /// A sub-structure found inside `resource`, reported after `visit` and
    /// before its references are walked.
    fn visit_message(
        &mut self,
        message: &dyn Message,
        resource: &R,
        parent: Option<&R>,
    ) -> Result<(), GraphError>;

    /// The walker finished descending into `resource`.
    fn leave(&mut self, resource: &R, parent: Option<&R>) -> Result<(), GraphError>;
}

/// Depth-first traversal driver.
///
/// Implementations carry their own project context and must call the visitor
/// callbacks in balanced pairs. Errors returned by the visitor are propagated
/// unchanged; resolution failures are reported as [`GraphError::Traversal`].
pub trait ResourceWalker {
    /// Resource type this walker resolves.
    type Resource: Resource;

    /// Walk everything reachable from `root`.
    fn walk(
        &self,
        root: &Self::Resource,
        visitor: &mut dyn ResourceVisitor<Self::Resource>,
    ) -> Result<(), GraphError>;
}

pub use project::{InMemoryProject, ProjectEntry, ProjectError, ProjectWalker};
