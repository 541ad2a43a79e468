/// One directory visited by the traverser.
///
/// Entries are produced one per directory and never mutated afterwards.
/// Names are stored without their parent path; the full path of a child
/// is `folder.join(name)`.
use compact_str::CompactString;
use std::path::PathBuf;

/// A folder together with the names of its direct subfolders and files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalEntry {
    /// Path of the folder. For the root this is the path exactly as the
    /// user supplied it.
    pub folder: PathBuf,

    /// Names of direct subfolders, in listing order.
    pub subfolders: Vec<CompactString>,

    /// Names of direct non-directory children, in listing order.
    pub files: Vec<CompactString>,
}

impl TraversalEntry {
    /// Create an entry with no children.
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            subfolders: Vec::new(),
            files: Vec::new(),
        }
    }
}

