//! Core types for the resource graph.

pub mod node;
pub mod resource;
pub mod message;

pub use node::{NodeId, ResourceNode};
pub use resource::{Resource, FileResource, canonical_path};
pub use message::{Message, CollectionProxyDesc, Descriptor};
