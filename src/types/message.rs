//! Descriptor messages surfaced by the walker during descent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An artifact-internal sub-structure reported through
/// [`ResourceVisitor::visit_message`](crate::ResourceVisitor::visit_message).
///
/// The graph only cares whether a message opens an exclusion scope; every
/// other message is inspected and ignored.
pub trait Message: fmt::Debug {
    /// Name of the message type, used in logs.
    fn type_name(&self) -> &str;

    /// Whether this message is a reference to an excluded collection.
    fn excludes_collection(&self) -> bool {
        false
    }
}

/// Collection proxy descriptor.
///
/// A proxy references a collection that is loaded on demand. When `exclude`
/// is set, the collection and everything only it references are candidates
/// for removal from the main bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionProxyDesc {
    /// Path of the referenced collection.
    pub collection: String,
    /// Exclude the referenced collection from the main bundle.
    #[serde(default)]
    pub exclude: bool,
}

impl CollectionProxyDesc {
    /// Create a new collection proxy descriptor.
    pub fn new(collection: impl Into<String>, exclude: bool) -> Self {
        Self {
            collection: collection.into(),
            exclude,
        }
    }
}

impl Message for CollectionProxyDesc {
    fn type_name(&self) -> &str {
        "CollectionProxyDesc"
    }

    fn excludes_collection(&self) -> bool {
        self.exclude
    }
}

/// Messages understood by the in-memory project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Descriptor {
    /// A collection proxy.
    CollectionProxy(CollectionProxyDesc),
    /// Any other descriptor; carried for completeness, never excludes.
    Opaque {
        /// Message type name.
        name: String,
    },
}

impl Message for Descriptor {
    fn type_name(&self) -> &str {
        match self {
            Self::CollectionProxy(desc) => desc.type_name(),
            Self::Opaque { name } => name,
        }
    }

    fn excludes_collection(&self) -> bool {
        match self {
            Self::CollectionProxy(desc) => desc.excludes_collection(),
            Self::Opaque { .. } => false,
        }
    }
}

impl From<CollectionProxyDesc> for Descriptor {
    fn from(desc: CollectionProxyDesc) -> Self {
        Self::CollectionProxy(desc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_proxy_exclusion() {
        assert!(CollectionProxyDesc::new("/level.collection", true).excludes_collection());
        assert!(!CollectionProxyDesc::new("/level.collection", false).excludes_collection());
    }

    #[test]
    fn test_descriptor_json() {
        let json = r#"{"type":"collection_proxy","collection":"/level.collection","exclude":true}"#;
        let desc: Descriptor = serde_json::from_str(json).unwrap();
        assert!(desc.excludes_collection());
        assert_eq!(desc.type_name(), "CollectionProxyDesc");

        let opaque: Descriptor =
            serde_json::from_str(r#"{"type":"opaque","name":"SpriteDesc"}"#).unwrap();
        assert!(!opaque.excludes_collection());
        assert_eq!(opaque.type_name(), "SpriteDesc");
    }
}
