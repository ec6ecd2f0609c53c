//! Flat JSON export of a resource graph.
//!
//! The document is an array: the root first, then every resource node in
//! insertion order. Children are listed by path, never embedded, so a node
//! shared by many parents is written exactly once and the document grows with
//! the node count rather than with the number of paths through the graph.
//!
//! ```text
//! [
//!   { "path": "<AnonymousRoot>", "hexDigest": null, "excluded": false,
//!     "useCount": 0, "excludeCount": 0, "children": ["/main.collection"] },
//!   { "path": "/main.collection", "hexDigest": "9f86…", "excluded": false,
//!     "useCount": 1, "excludeCount": 0, "children": ["/player.go"] },
//!   ...
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::GraphError;
use crate::graph::GraphIndex;
use crate::types::{Resource, ResourceNode};
use crate::ROOT_PATH;

/// JSON layout of the written document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonStyle {
    /// Indented output.
    #[default]
    Pretty,
    /// Single line output.
    Compact,
}

/// Options for writing graph documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializeOptions {
    /// JSON layout.
    #[serde(default)]
    pub style: JsonStyle,
}

impl SerializeOptions {
    /// Compact single-line output.
    pub fn compact() -> Self {
        Self {
            style: JsonStyle::Compact,
        }
    }

    /// Set the JSON layout.
    pub fn with_style(mut self, style: JsonStyle) -> Self {
        self.style = style;
        self
    }
}

/// Serialized form of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeEntry {
    /// Canonical path, or the root sentinel.
    pub path: String,
    /// Assigned digest, `null` when unset.
    pub hex_digest: Option<String>,
    /// Whether the node is an excluded collection reference.
    pub excluded: bool,
    /// Number of references.
    pub use_count: u32,
    /// Number of references made inside an exclusion scope.
    pub exclude_count: u32,
    /// Child paths in attachment order.
    pub children: Vec<String>,
}

impl NodeEntry {
    fn from_node<R: Resource>(node: &ResourceNode<R>, index: &GraphIndex<R>) -> Self {
        Self {
            path: node.path().to_string(),
            hex_digest: node.hex_digest().map(str::to_string),
            excluded: node.excluded(),
            use_count: node.use_count(),
            exclude_count: node.exclude_count(),
            children: node
                .children()
                .iter()
                .map(|&child| index[child].path().to_string())
                .collect(),
        }
    }

    /// Every reference to this node happened inside an exclusion scope.
    pub fn is_fully_excluded(&self) -> bool {
        self.use_count > 0 && self.use_count == self.exclude_count
    }
}

/// Structural problems found in a decoded document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// The first entry is not the root sentinel.
    #[error("First entry must be the root sentinel, found {0:?}")]
    MissingRoot(Option<String>),
    /// Two entries share a path.
    #[error("Duplicate entry for {0}")]
    DuplicatePath(String),
    /// A child path has no entry of its own.
    #[error("Entry {parent} references unknown child {child}")]
    DanglingChild {
        /// Entry holding the reference.
        parent: String,
        /// Unresolved child path.
        child: String,
    },
    /// Counters violate `useCount >= 1` or `excludeCount <= useCount`.
    #[error("Entry {path} has invalid counters: useCount={use_count}, excludeCount={exclude_count}")]
    InvalidCounters {
        /// Offending entry.
        path: String,
        /// Its use count.
        use_count: u32,
        /// Its exclude count.
        exclude_count: u32,
    },
}

/// The flat graph document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphDocument {
    entries: Vec<NodeEntry>,
}

impl GraphDocument {
    /// Flatten an index: root first, then nodes in insertion order.
    pub fn from_index<R: Resource>(index: &GraphIndex<R>) -> Self {
        let entries = std::iter::once(NodeEntry::from_node(index.root(), index))
            .chain(index.iter().map(|(_, node)| NodeEntry::from_node(node, index)))
            .collect();
        Self { entries }
    }

    /// Decode and validate a document.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let document: Self = serde_json::from_str(json)?;
        document.validate()?;
        Ok(document)
    }

    /// All entries, root first.
    pub fn entries(&self) -> &[NodeEntry] {
        &self.entries
    }

    /// The root entry.
    pub fn root(&self) -> Option<&NodeEntry> {
        self.entries.first().filter(|e| e.path == ROOT_PATH)
    }

    /// Find an entry by path.
    pub fn entry(&self, path: &str) -> Option<&NodeEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Number of entries, root included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the document has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check structural invariants.
    ///
    /// The root comes first, paths are unique, every child path resolves to
    /// an entry, and every non-root entry has `useCount >= 1` and
    /// `excludeCount <= useCount`.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.root().is_none() {
            return Err(DocumentError::MissingRoot(
                self.entries.first().map(|e| e.path.clone()),
            ));
        }

        let mut paths = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !paths.insert(entry.path.as_str()) {
                return Err(DocumentError::DuplicatePath(entry.path.clone()));
            }
        }

        for entry in self.entries.iter().skip(1) {
            if entry.use_count == 0 || entry.exclude_count > entry.use_count {
                return Err(DocumentError::InvalidCounters {
                    path: entry.path.clone(),
                    use_count: entry.use_count,
                    exclude_count: entry.exclude_count,
                });
            }
        }

        for entry in &self.entries {
            if let Some(child) = entry.children.iter().find(|c| !paths.contains(c.as_str())) {
                return Err(DocumentError::DanglingChild {
                    parent: entry.path.clone(),
                    child: child.clone(),
                });
            }
        }

        Ok(())
    }

    /// Write the document to `writer`.
    ///
    /// The document is encoded in full before anything is written, so an
    /// encoding error leaves `writer` untouched.
    pub fn to_writer<W: Write>(
        &self,
        mut writer: W,
        options: &SerializeOptions,
    ) -> Result<(), GraphError> {
        let bytes = match options.style {
            JsonStyle::Pretty => serde_json::to_vec_pretty(self)?,
            JsonStyle::Compact => serde_json::to_vec(self)?,
        };
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Render the document as a string.
    pub fn to_json_string(&self, options: &SerializeOptions) -> Result<String, GraphError> {
        let json = match options.style {
            JsonStyle::Pretty => serde_json::to_string_pretty(self)?,
            JsonStyle::Compact => serde_json::to_string(self)?,
        };
        Ok(json)
    }

    /// Write the document to `path`.
    ///
    /// The document goes to a sibling temporary file that is renamed over
    /// `path` only after a complete write; a failed write removes it.
    pub fn write_file(&self, path: &Path, options: &SerializeOptions) -> Result<(), GraphError> {
        let tmp_path = temp_path(path);
        let result = fs::File::create(&tmp_path)
            .map_err(GraphError::from)
            .and_then(|file| {
                self.to_writer(&file, options)?;
                file.sync_all()?;
                Ok(())
            })
            .and_then(|()| fs::rename(&tmp_path, path).map_err(GraphError::from));

        if let Err(e) = &result {
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        path = %tmp_path.display(),
                        error = %cleanup,
                        "Failed to remove partial graph document"
                    );
                }
            }
            tracing::error!(path = %path.display(), error = %e, "Failed to write graph document");
        }
        result
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
