//! Resource identity and path normalization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::sync::OnceLock;

/// A content artifact that can become a graph node.
///
/// Equality and hashing define node identity: two values that compare equal
/// always map to the same node.
pub trait Resource: Clone + Eq + Hash + fmt::Debug {
    /// Identity recorded for the packaged form of this resource.
    type Output: Clone + Eq + Hash + fmt::Debug;

    /// Project-relative path of the resource.
    ///
    /// Distinct resources must have distinct canonical paths; a build that
    /// reaches two resources sharing one fails with
    /// [`GraphError::PathCollision`](crate::GraphError::PathCollision).
    fn path(&self) -> &str;

    /// The resolved output form of this resource.
    fn output(&self) -> Self::Output;
}

/// Normalize a resource path to its canonical absolute form.
///
/// Backslashes become `/`, repeated separators collapse and exactly one
/// leading `/` is kept.
///
/// ```rust
/// use resource_graph::canonical_path;
///
/// assert_eq!(canonical_path("main//main.collection"), "/main/main.collection");
/// assert_eq!(canonical_path("/logic\\player.script"), "/logic/player.script");
/// ```
pub fn canonical_path(path: &str) -> String {
    static SEPARATORS: OnceLock<regex_lite::Regex> = OnceLock::new();
    let separators = SEPARATORS
        .get_or_init(|| regex_lite::Regex::new(r"/{2,}").expect("separator pattern is valid"));

    let unified = path.replace('\\', "/");
    let collapsed = separators.replace_all(&unified, "/");
    format!("/{}", collapsed.trim_start_matches('/'))
}

/// A resource identified by its project-relative file path.
///
/// The output form appends `c` to the extension, the way compiled build
/// artifacts are named (`main.collection` becomes `main.collectionc`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileResource {
    path: String,
}

impl FileResource {
    /// Create a resource from a path, relative or absolute.
    pub fn new(path: impl AsRef<str>) -> Self {
        let canonical = canonical_path(path.as_ref());
        Self {
            path: canonical.trim_start_matches('/').to_string(),
        }
    }

    /// Path of the compiled output.
    pub fn output_path(&self) -> String {
        let file_name = self.path.rsplit('/').next().unwrap_or(&self.path);
        match file_name.rfind('.') {
            Some(dot) if dot + 1 < file_name.len() => format!("{}c", self.path),
            _ => self.path.clone(),
        }
    }
}

impl Resource for FileResource {
    type Output = FileResource;

    fn path(&self) -> &str {
        &self.path
    }

    fn output(&self) -> Self::Output {
        Self {
            path: self.output_path(),
        }
    }
}

impl fmt::Display for FileResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path)
    }
}
