//! In-memory project and walker.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::{ResourceVisitor, ResourceWalker};
use crate::canonical::content_digest;
use crate::error::GraphError;
use crate::types::{canonical_path, CollectionProxyDesc, Descriptor, FileResource, Resource};

/// Error type for in-memory project lookups.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProjectError {
    /// No entry exists for the referenced path.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),
}

/// Declared content of one project resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    /// Raw content, used for digests.
    #[serde(default)]
    pub content: String,
    /// Referenced resource paths, walked in this order.
    #[serde(default)]
    pub references: Vec<String>,
    /// Descriptor messages reported before the references are walked.
    #[serde(default)]
    pub messages: Vec<Descriptor>,
}

impl ProjectEntry {
    /// Create an entry with the given content and no references.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// A collection proxy pointing at `collection`.
    pub fn collection_proxy(collection: impl Into<String>, exclude: bool) -> Self {
        let collection = collection.into();
        Self {
            content: format!("collection: \"{}\"\nexclude: {}\n", collection, exclude),
            references: vec![collection.clone()],
            messages: vec![CollectionProxyDesc::new(collection, exclude).into()],
        }
    }

    /// Add a reference.
    pub fn with_reference(mut self, path: impl Into<String>) -> Self {
        self.references.push(path.into());
        self
    }

    /// Add several references.
    pub fn with_references<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Add a descriptor message.
    pub fn with_message(mut self, message: impl Into<Descriptor>) -> Self {
        self.messages.push(message.into());
        self
    }
}

/// A project held entirely in memory.
///
/// Entries are keyed by canonical path, so `"a.go"` and `"/a.go"` name the
/// same resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryProject {
    entries: BTreeMap<String, ProjectEntry>,
}

impl InMemoryProject {
    /// Create an empty project.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a project manifest: a JSON object of path -> entry.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let raw: BTreeMap<String, ProjectEntry> = serde_json::from_str(json)?;
        let mut project = Self::new();
        for (path, entry) in raw {
            project.insert(path, entry);
        }
        Ok(project)
    }

    /// Add or replace a resource entry.
    pub fn insert(&mut self, path: impl AsRef<str>, entry: ProjectEntry) {
        self.entries.insert(canonical_path(path.as_ref()), entry);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, path: impl AsRef<str>, entry: ProjectEntry) -> Self {
        self.insert(path, entry);
        self
    }

    /// Resolve a resource to its entry.
    pub fn entry(&self, resource: &FileResource) -> Result<&ProjectEntry, ProjectError> {
        let path = canonical_path(resource.path());
        self.entries
            .get(&path)
            .ok_or(ProjectError::ResourceNotFound(path))
    }

    /// Get a resource handle for a path, if the project contains it.
    pub fn resource(&self, path: &str) -> Option<FileResource> {
        let path = canonical_path(path);
        self.entries
            .contains_key(&path)
            .then(|| FileResource::new(&path))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the project has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// SHA-256 hex digests of every entry's content, keyed by canonical path.
    pub fn hex_digests(&self) -> HashMap<String, String> {
        self.entries
            .iter()
            .map(|(path, entry)| (path.clone(), content_digest(entry.content.as_bytes())))
            .collect()
    }
}

/// Depth-first walker over an [`InMemoryProject`].
///
/// Resolution happens before `should_visit`, so a dangling reference fails
/// the walk even when it would otherwise be deduplicated.
#[derive(Debug, Clone)]
pub struct ProjectWalker {
    project: Arc<InMemoryProject>,
}

impl ProjectWalker {
    /// Create a walker over a shared project.
    pub fn new(project: Arc<InMemoryProject>) -> Self {
        Self { project }
    }

    /// The project being walked.
    pub fn project(&self) -> &InMemoryProject {
        &self.project
    }

    fn walk_resource(
        &self,
        resource: &FileResource,
        parent: Option<&FileResource>,
        visitor: &mut dyn ResourceVisitor<FileResource>,
    ) -> Result<(), GraphError> {
        let entry = self
            .project
            .entry(resource)
            .map_err(|e| GraphError::traversal(canonical_path(resource.path()), e))?;

        if !visitor.should_visit(resource, parent)? {
            return Ok(());
        }

        visitor.visit(resource, parent)?;
        for message in &entry.messages {
            visitor.visit_message(message, resource, parent)?;
        }
        for reference in &entry.references {
            let child = FileResource::new(reference);
            self.walk_resource(&child, Some(resource), visitor)?;
        }
        visitor.leave(resource, parent)
    }
}

impl ResourceWalker for ProjectWalker {
    type Resource = FileResource;

    fn walk(
        &self,
        root: &FileResource,
        visitor: &mut dyn ResourceVisitor<FileResource>,
    ) -> Result<(), GraphError> {
        self.walk_resource(root, None, visitor)
    }
}
